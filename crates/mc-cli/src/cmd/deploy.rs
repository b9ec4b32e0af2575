use crate::login::{self, OrgArgs};
use crate::output::print_json;
use anyhow::Context;
use mc_core::config::Config;
use mc_core::manifest::ProjectManifest;
use mc_core::paths;
use mc_core::pipeline::{self, DeployRequest};
use mc_core::publish::ArtifactAction;
use mc_core::shell::SystemShell;
use std::path::Path;

pub fn run(root: &Path, prod: bool, org: &OrgArgs, json: bool) -> anyhow::Result<()> {
    let manifest = ProjectManifest::load(root)?;
    // Fail on missing sf_app_name / sf_app_vsn before asking for a password.
    let names = manifest.resource_names()?;
    let config = Config::load(root).context("failed to load config")?;
    let registry_path = paths::registry_path()?;

    let (session, instance_url) = login::open_session(org, &config, &registry_path)?;
    if !json {
        println!("Deploying {} to {instance_url}", names.app);
    }

    let req = DeployRequest {
        root: root.to_path_buf(),
        prod,
        org: Some(instance_url),
        registry_path: Some(registry_path),
    };
    let result = pipeline::deploy(&req, &manifest, &config, &session, &SystemShell::new())
        .with_context(|| format!("deploy of {} failed", names.app))?;

    if json {
        return print_json(&result);
    }

    let action = match result.report.bundle_action {
        ArtifactAction::Created => "created",
        ArtifactAction::Updated => "updated",
    };
    println!(
        "Bundle {} {action} ({} bytes)",
        result.report.bundle, result.bundle.size
    );
    for page in &result.report.pages {
        println!("Page {page} deployed");
    }
    println!("Deploy complete.");
    Ok(())
}
