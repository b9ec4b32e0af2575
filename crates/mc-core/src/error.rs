use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McError {
    #[error("invalid target path '{0}': must not be '.' or an existing directory")]
    InvalidTarget(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown template '{0}': run 'mobilecaddy templates' to list known templates")]
    UnknownTemplate(String),

    #[error("manifest field '{0}' is missing from package.json")]
    ManifestField(String),

    #[error("no package.json found in {0}")]
    ManifestNotFound(PathBuf),

    #[error("app not found in registry: {0}")]
    AppNotFound(String),

    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("substitution failed for pattern '{pattern}': {reason}")]
    SubstitutionFailed { pattern: String, reason: String },

    #[error("failed to download {url}: {cause}")]
    Download { url: String, cause: String },

    #[error("failed to extract archive: {0}")]
    Extract(String),

    #[error("failed to rename extracted template: {0}")]
    Rename(String),

    #[error("dependency install failed with exit code {exit_code}")]
    DependencyInstallFailed { exit_code: i32 },

    #[error("'{program}' exited with code {exit_code}")]
    ToolFailed { program: String, exit_code: i32 },

    #[error("'{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("bundle is {size} bytes, over the {limit} byte limit")]
    BundleTooLarge { size: u64, limit: u64 },

    #[error("remote site settings are not enabled for the MobileCaddy endpoint on this org")]
    RemoteSiteNotEnabled,

    #[error("MobileCaddy on the org must be at least version {required}, currently running {actual}")]
    IncompatiblePlatformVersion { required: String, actual: String },

    #[error("remote call failed ({code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("upload of '{artifact}' failed: {detail}")]
    UploadFailed { artifact: String, detail: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("home directory not found: set HOME or MOBILECADDY_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// Coarse failure classes, one per process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    ExternalToolFailure,
    NetworkFailure,
    RemoteIncompatible,
    SizeLimitExceeded,
    RemoteUploadFailure,
    Internal,
}

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::InvalidInput => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::ExternalToolFailure => 4,
            ErrorKind::NetworkFailure => 5,
            ErrorKind::RemoteIncompatible => 6,
            ErrorKind::SizeLimitExceeded => 7,
            ErrorKind::RemoteUploadFailure => 8,
        }
    }
}

impl McError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            McError::InvalidTarget(_) | McError::InvalidInput(_) => ErrorKind::InvalidInput,
            McError::UnknownTemplate(_)
            | McError::ManifestField(_)
            | McError::ManifestNotFound(_)
            | McError::AppNotFound(_)
            | McError::TemplateNotFound(_)
            | McError::HomeNotFound => ErrorKind::NotFound,
            McError::DependencyInstallFailed { .. }
            | McError::ToolFailed { .. }
            | McError::ToolNotFound(_) => ErrorKind::ExternalToolFailure,
            McError::Download { .. } | McError::Network(_) | McError::LoginFailed(_) => {
                ErrorKind::NetworkFailure
            }
            McError::RemoteSiteNotEnabled | McError::IncompatiblePlatformVersion { .. } => {
                ErrorKind::RemoteIncompatible
            }
            McError::BundleTooLarge { .. } => ErrorKind::SizeLimitExceeded,
            McError::UploadFailed { .. } | McError::Rpc { .. } => ErrorKind::RemoteUploadFailure,
            McError::SubstitutionFailed { .. }
            | McError::Extract(_)
            | McError::Rename(_)
            | McError::Io(_)
            | McError::Yaml(_)
            | McError::Json(_)
            | McError::Zip(_) => ErrorKind::Internal,
        }
    }
}

impl From<reqwest::Error> for McError {
    fn from(e: reqwest::Error) -> Self {
        McError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, McError>;
