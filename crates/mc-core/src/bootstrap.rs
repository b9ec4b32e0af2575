//! Bring a freshly unpacked template to a runnable state.
//!
//! Steps run strictly in order and the first failure aborts the chain.
//! Nothing is cleaned up on failure; the half-initialised directory is
//! left in place for inspection.

use crate::config::BootstrapConfig;
use crate::error::{McError, Result};
use crate::manifest::{self, Framework, ProjectManifest};
use crate::registry::Registry;
use crate::shell::{ShellRunner, ShellTask};
use crate::{paths, render};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Run the primary install through `sudo` (ignored on Windows).
    pub sudo: bool,
    pub registry_path: PathBuf,
}

pub fn bootstrap(
    target_dir: &Path,
    app_name: &str,
    opts: &BootstrapOptions,
    config: &BootstrapConfig,
    shell: &dyn ShellRunner,
) -> Result<()> {
    install_dependencies(target_dir, opts, config, shell)?;
    install_legacy_dependencies(target_dir, config, shell)?;
    initialize_project(target_dir, config, shell)?;
    rewrite_placeholders(target_dir, app_name)?;
    register_app(target_dir, app_name, &opts.registry_path)?;
    tracing::info!(app = app_name, dir = %target_dir.display(), "bootstrap complete");
    Ok(())
}

fn quiet(task: ShellTask) -> ShellTask {
    task.mirror_output(false)
}

pub fn install_dependencies(
    target_dir: &Path,
    opts: &BootstrapOptions,
    config: &BootstrapConfig,
    shell: &dyn ShellRunner,
) -> Result<()> {
    let elevate = opts.sudo && !cfg!(windows);
    let task = quiet(config.install.task(target_dir)).elevate(elevate);
    tracing::info!(task = %task.display(), "installing dependencies");
    shell.run(&task).map_err(|e| match e {
        McError::ToolFailed { exit_code, .. } => McError::DependencyInstallFailed { exit_code },
        other => other,
    })
}

/// Only projects that still carry a `bower.json` need the legacy install.
pub fn install_legacy_dependencies(
    target_dir: &Path,
    config: &BootstrapConfig,
    shell: &dyn ShellRunner,
) -> Result<()> {
    if !target_dir.join(paths::LEGACY_MANIFEST_FILE).exists() {
        tracing::debug!("no bower.json, skipping legacy install");
        return Ok(());
    }
    let task = quiet(config.legacy_install.task(target_dir));
    tracing::info!(task = %task.display(), "installing legacy dependencies");
    shell.run(&task).map_err(|e| match e {
        McError::ToolFailed { exit_code, .. } => McError::DependencyInstallFailed { exit_code },
        other => other,
    })
}

/// Pick the init command from the Ionic/Angular major version.
pub fn initialize_project(
    target_dir: &Path,
    config: &BootstrapConfig,
    shell: &dyn ShellRunner,
) -> Result<()> {
    let manifest = ProjectManifest::load(target_dir)?;
    let framework = manifest.framework();
    let command = match framework {
        Framework::Modern { .. } => &config.modern_init,
        Framework::Legacy => &config.legacy_init,
    };
    let task = quiet(command.task(target_dir));
    tracing::info!(?framework, task = %task.display(), "initializing project");
    shell.run(&task)
}

/// Name the project after the app: `package.json` name plus the page
/// titles in the entry HTML and the start-page template.
pub fn rewrite_placeholders(target_dir: &Path, app_name: &str) -> Result<()> {
    manifest::set_name(target_dir, app_name)?;
    render::replace_titles(target_dir, app_name)
}

pub fn register_app(target_dir: &Path, app_name: &str, registry_path: &Path) -> Result<()> {
    let dir = std::fs::canonicalize(target_dir)?;
    Registry::update(registry_path, |reg| {
        reg.add_app(app_name, &dir);
        Ok(())
    })?;
    tracing::debug!(app = app_name, registry = %registry_path.display(), "app registered");
    Ok(())
}
