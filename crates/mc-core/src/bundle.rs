//! Build the project and package it for upload.
//!
//! ```text
//! retitle ─► reset mc-tmp/ ─► build ─► copy www/ ─► drop mock/
//!         ─► uppercase fonts ─► zip mc-tmp/ ─► render apex pages
//! ```
//!
//! The zip is written before the pages are rendered, so the rendered
//! `.apex` files never end up inside the bundle.

use crate::config::Config;
use crate::error::{McError, Result};
use crate::manifest::{self, ProjectManifest, ResourceNames};
use crate::render::{self, RenderedPage};
use crate::shell::ShellRunner;
use crate::{archive, fonts, io, paths};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct BundleOptions {
    /// Production build (`--prod --release`).
    pub prod: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BundleOutput {
    pub names: ResourceNames,
    pub bundle: PathBuf,
    pub size: u64,
    pub staging: PathBuf,
    pub pages: Vec<RenderedPage>,
}

pub fn bundle(
    root: &Path,
    manifest: &ProjectManifest,
    config: &Config,
    opts: BundleOptions,
    shell: &dyn ShellRunner,
) -> Result<BundleOutput> {
    let names = manifest.resource_names()?;

    render::replace_titles(root, &manifest.name)?;

    let staging = paths::staging_dir(root);
    io::recreate_dir(&staging)?;

    tracing::info!(prod = opts.prod, "building project");
    let mut task = config.build.command.task(root);
    if opts.prod {
        task = task.args(config.build.prod_args.iter().cloned());
    }
    shell.run(&task)?;

    let output = root.join(&config.build.output_dir);
    if !output.is_dir() {
        return Err(McError::InvalidInput(format!(
            "build output directory {} does not exist",
            output.display()
        )));
    }
    let copied = io::copy_tree(&output, &staging, &exclude_from_bundle)?;
    tracing::debug!(copied, "build output staged");

    if io::remove_dir_if_exists(&staging.join(paths::STAGED_MOCK_DIR))? {
        tracing::debug!("mock data removed from staging");
    }

    let sheets = fonts::stylesheets(&staging)?;
    fonts::uppercase_fonts(&staging.join(paths::STAGED_FONTS_DIR), &sheets)?;

    let bundle = paths::bundle_path(root, &names.app);
    io::remove_file_if_exists(&bundle)?;
    let size = archive::zip_dir(&staging, &bundle)?;
    tracing::info!(bundle = %bundle.display(), size, "bundle created");

    let scripts = render::build_scripts(&staging.join(paths::STAGED_BUILD_DIR))?;
    let installed = manifest::installed_versions(root)?;
    let pages = render::render(
        &staging,
        &render::deploy_pages(root, &names),
        &render::deploy_substitutions(&names, &installed, &scripts),
    )?;

    Ok(BundleOutput {
        names,
        bundle,
        size,
        staging,
        pages,
    })
}

/// Minified app sources and source maps stay out of the bundle.
fn exclude_from_bundle(rel: &Path) -> bool {
    rel == Path::new("assets/js") || rel.extension().is_some_and(|e| e == "map")
}
