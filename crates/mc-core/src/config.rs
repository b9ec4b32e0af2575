use crate::error::Result;
use crate::paths;
use crate::shell::ShellTask;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TEMPLATES_URL: &str =
    "https://raw.githubusercontent.com/MobileCaddy/mobilecaddy-cli/master/templates.json";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "login.salesforce.com";
pub const DEFAULT_API_VERSION: u32 = 41;
pub const DEFAULT_START_PAGE_CONTROLLER_VERSION: &str = "001";
/// Largest bundle the org accepts as a static resource.
pub const DEFAULT_MAX_BUNDLE_BYTES: u64 = 5 * 1024 * 1024;

pub const TEMPLATES_URL_ENV: &str = "MOBILECADDY_TEMPLATES_URL";

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A program plus its fixed arguments, as written in config.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Command {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn task(&self, cwd: &Path) -> ShellTask {
        ShellTask::new(&self.program, cwd).args(self.args.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// Section configs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_command")]
    pub command: Command,
    #[serde(default = "default_prod_args")]
    pub prod_args: Vec<String>,
    /// Directory the build writes into, relative to the project root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_build_command() -> Command {
    Command::new("ionic", &["build"])
}

fn default_prod_args() -> Vec<String> {
    vec!["--prod".to_string(), "--release".to_string()]
}

fn default_output_dir() -> String {
    "www".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            prod_args: default_prod_args(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_install")]
    pub install: Command,
    #[serde(default = "default_legacy_install")]
    pub legacy_install: Command,
    #[serde(default = "default_modern_init")]
    pub modern_init: Command,
    #[serde(default = "default_legacy_init")]
    pub legacy_init: Command,
}

fn default_install() -> Command {
    Command::new("npm", &["install"])
}

fn default_legacy_install() -> Command {
    Command::new("bower", &["install"])
}

fn default_modern_init() -> Command {
    Command::new("npm", &["run", "build"])
}

fn default_legacy_init() -> Command {
    Command::new("grunt", &["devsetup"])
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            install: default_install(),
            legacy_install: default_legacy_install(),
            modern_init: default_modern_init(),
            legacy_init: default_legacy_init(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_serve_command")]
    pub command: Command,
    #[serde(default = "default_serve_url")]
    pub url: String,
}

fn default_serve_command() -> Command {
    Command::new("npm", &["run", "serve"])
}

fn default_serve_url() -> String {
    "http://localhost:3030/www".to_string()
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            command: default_serve_command(),
            url: default_serve_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_templates_url")]
    pub templates_url: String,
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    #[serde(default = "default_controller_version")]
    pub start_page_controller_version: String,
    #[serde(default = "default_max_bundle_bytes")]
    pub max_bundle_bytes: u64,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

fn default_templates_url() -> String {
    DEFAULT_TEMPLATES_URL.to_string()
}

fn default_login_endpoint() -> String {
    DEFAULT_LOGIN_ENDPOINT.to_string()
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

fn default_controller_version() -> String {
    DEFAULT_START_PAGE_CONTROLLER_VERSION.to_string()
}

fn default_max_bundle_bytes() -> u64 {
    DEFAULT_MAX_BUNDLE_BYTES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_url: default_templates_url(),
            login_endpoint: default_login_endpoint(),
            api_version: default_api_version(),
            start_page_controller_version: default_controller_version(),
            max_bundle_bytes: default_max_bundle_bytes(),
            build: BuildConfig::default(),
            bootstrap: BootstrapConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl Config {
    /// Load `.mobilecaddy/config.yaml` under `root`; a missing file yields
    /// the defaults. Env overrides are applied on top.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            Config::default()
        };
        if let Ok(url) = std::env::var(TEMPLATES_URL_ENV) {
            config.templates_url = url;
        }
        Ok(config)
    }
}
