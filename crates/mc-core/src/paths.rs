use crate::error::{McError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Project layout
// ---------------------------------------------------------------------------

pub const MANIFEST_FILE: &str = "package.json";
pub const LEGACY_MANIFEST_FILE: &str = "bower.json";
pub const STAGING_DIR: &str = "mc-tmp";
pub const BUILD_LOG: &str = "mc-build.log";
pub const NODE_MODULES_DIR: &str = "node_modules";

pub const TEMPLATES_DIR: &str = "apex-templates";
pub const START_PAGE_TEMPLATE: &str = "apex-templates/startpage-template.apex";
pub const CACHE_PAGE_TEMPLATE: &str = "apex-templates/cachepage-template.apex";
pub const SW_PAGE_TEMPLATE: &str = "apex-templates/swpage-template.apex";

pub const SRC_INDEX_HTML: &str = "src/index.html";
pub const WWW_INDEX_HTML: &str = "www/index.html";

/// Subdirectories of the staging tree touched by the bundler.
pub const STAGED_BUILD_DIR: &str = "build";
pub const STAGED_FONTS_DIR: &str = "assets/fonts";
pub const STAGED_MOCK_DIR: &str = "mock";

pub const CONFIG_DIR: &str = ".mobilecaddy";
pub const CONFIG_FILE: &str = ".mobilecaddy/config.yaml";

pub const REGISTRY_FILE: &str = "registry.json";
pub const HOME_ENV: &str = "MOBILECADDY_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn staging_dir(root: &Path) -> PathBuf {
    root.join(STAGING_DIR)
}

pub fn build_log_path(root: &Path) -> PathBuf {
    root.join(BUILD_LOG)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// The project's HTML entry point: `src/index.html` for webpack-era
/// projects, `www/index.html` for older ones.
pub fn entry_html(root: &Path) -> PathBuf {
    let src = root.join(SRC_INDEX_HTML);
    if src.exists() {
        src
    } else {
        root.join(WWW_INDEX_HTML)
    }
}

pub fn bundle_path(root: &Path, resource_name: &str) -> PathBuf {
    root.join(format!("{resource_name}.zip"))
}

pub fn staged_page(staging: &Path, page_name: &str) -> PathBuf {
    staging.join(format!("{page_name}.apex"))
}

/// Directory holding the app registry: `$MOBILECADDY_HOME` if set,
/// otherwise `~/.mobilecaddy`.
pub fn user_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }
    home::home_dir()
        .map(|h| h.join(CONFIG_DIR))
        .ok_or(McError::HomeNotFound)
}

pub fn registry_path() -> Result<PathBuf> {
    Ok(user_dir()?.join(REGISTRY_FILE))
}
