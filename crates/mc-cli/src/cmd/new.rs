use crate::progress::with_spinner;
use anyhow::Context;
use mc_core::config::Config;
use mc_core::fetch::{self, ArchiveFetcher};
use mc_core::pipeline::{self, ScaffoldRequest};
use mc_core::shell::SystemShell;
use mc_core::{paths, template};
use std::path::Path;

pub fn run(
    base: &Path,
    template_or_url: &str,
    app_name: &str,
    path: Option<&Path>,
    sudo: bool,
    json: bool,
) -> anyhow::Result<()> {
    let target_dir = base.join(path.unwrap_or(Path::new(app_name)));
    fetch::validate_target(&target_dir)?;

    let config = Config::load(base).context("failed to load config")?;
    let templates = template::fetch_list(&config.templates_url);
    let req = ScaffoldRequest {
        template_or_url: template_or_url.to_string(),
        app_name: app_name.to_string(),
        target_dir,
        sudo,
        registry_path: paths::registry_path()?,
    };

    println!("Creating '{app_name}' from {template_or_url} ...");
    let result = with_spinner("Downloading and installing dependencies", !json, || {
        pipeline::scaffold(
            &req,
            &templates,
            &ArchiveFetcher::new(),
            &config,
            &SystemShell::new(),
        )
    })?;

    let dir = result.target_dir.display();
    println!("Created {dir}");
    println!("\nNext steps:\n  cd {dir}\n  mobilecaddy serve");
    Ok(())
}
