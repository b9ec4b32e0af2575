//! End-to-end flows the CLI drives: scaffold a new app, deploy an existing
//! one. Inputs arrive as values; nothing here reads global state.

use crate::bootstrap::{self, BootstrapOptions};
use crate::bundle::{self, BundleOptions, BundleOutput};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{self, ArchiveFetcher};
use crate::manifest::ProjectManifest;
use crate::publish::{self, PublishReport};
use crate::registry::Registry;
use crate::remote::RemoteSession;
use crate::shell::ShellRunner;
use crate::template::{ArchiveSource, Template};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub template_or_url: String,
    pub app_name: String,
    pub target_dir: PathBuf,
    pub sudo: bool,
    pub registry_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ScaffoldResult {
    pub target_dir: PathBuf,
    pub source: ArchiveSource,
}

pub fn scaffold(
    req: &ScaffoldRequest,
    templates: &[Template],
    fetcher: &ArchiveFetcher,
    config: &Config,
    shell: &dyn ShellRunner,
) -> Result<ScaffoldResult> {
    fetch::validate_target(&req.target_dir)?;
    let source = fetcher.fetch(templates, &req.template_or_url, &req.target_dir, &req.app_name)?;
    bootstrap::bootstrap(
        &req.target_dir,
        &req.app_name,
        &BootstrapOptions {
            sudo: req.sudo,
            registry_path: req.registry_path.clone(),
        },
        &config.bootstrap,
        shell,
    )?;
    Ok(ScaffoldResult {
        target_dir: req.target_dir.clone(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub root: PathBuf,
    pub prod: bool,
    /// Instance URL the session is bound to; recorded against the app.
    pub org: Option<String>,
    pub registry_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployResult {
    #[serde(flatten)]
    pub bundle: BundleOutput,
    pub report: PublishReport,
}

pub fn deploy(
    req: &DeployRequest,
    manifest: &ProjectManifest,
    config: &Config,
    session: &dyn RemoteSession,
    shell: &dyn ShellRunner,
) -> Result<DeployResult> {
    let bundle = bundle::bundle(
        &req.root,
        manifest,
        config,
        BundleOptions { prod: req.prod },
        shell,
    )?;
    let report = publish::publish(session, manifest, config, &bundle.bundle, &bundle.pages)?;

    if let (Some(org), Some(registry)) = (&req.org, &req.registry_path) {
        record_deploy(registry, &req.root, org)?;
    }
    Ok(DeployResult { bundle, report })
}

fn record_deploy(registry: &Path, root: &Path, org: &str) -> Result<()> {
    let dir = std::fs::canonicalize(root)?;
    let changed = Registry::update(registry, |reg| Ok(reg.record_org(&dir, org)))?;
    if changed {
        tracing::debug!(org, dir = %dir.display(), "deploy recorded");
    }
    Ok(())
}
