use crate::login::{self, OrgArgs};
use crate::output::print_json;
use mc_core::config::Config;
use mc_core::manifest::ProjectManifest;
use mc_core::{paths, publish};
use std::path::Path;

/// Report this project's versions to the org and show what it answers.
pub fn run(root: &Path, org: &OrgArgs, json: bool) -> anyhow::Result<()> {
    let manifest = ProjectManifest::load(root)?;
    let config = Config::load(root)?;
    let (session, instance_url) = login::open_session(org, &config, &paths::registry_path()?)?;
    let info = publish::version_info(&session, root, &manifest, &config)?;

    if json {
        return print_json(&info);
    }
    println!("Org: {instance_url}");
    match info.as_object() {
        Some(fields) => {
            for (k, v) in fields {
                let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                println!("  {k}: {v}");
            }
        }
        None => println!("  {info}"),
    }
    Ok(())
}
