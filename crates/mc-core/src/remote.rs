//! The narrow interface the publisher needs from a remote org.
//!
//! `mc-platform` implements it over HTTP; tests use an in-memory stub.

use crate::error::{McError, Result};
use serde::{Deserialize, Serialize};

/// Apex REST path of the MobileCaddy platform utilities endpoint.
pub const RPC_PATH: &str = "/mobilecaddy1/PlatformDevUtilsR001/";

/// `errorNo` the platform returns when the org's remote site settings
/// do not allow the utilities endpoint.
pub const REMOTE_SITE_NOT_ENABLED: i64 = 49;

/// Username/password login against a login endpoint such as
/// `login.salesforce.com` or `test.salesforce.com`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub endpoint: String,
}

/// What a successful login yields; cached in the registry as `StoredCreds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub instance_url: String,
    pub access_token: String,
    /// Identity URL of the logged-in user.
    pub id: String,
}

/// Body of an RPC call. `json_params` is itself a JSON document carrying
/// the `function` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(rename = "startPageControllerVersion")]
    pub start_page_controller_version: String,
    #[serde(rename = "jsonParams")]
    pub json_params: String,
}

impl RpcRequest {
    pub fn new(controller_version: &str, params: &serde_json::Value) -> Result<Self> {
        Ok(Self {
            start_page_controller_version: controller_version.to_string(),
            json_params: serde_json::to_string(params)?,
        })
    }

    pub fn params(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.json_params)?)
    }

    /// The `function` the call invokes, if present.
    pub fn function(&self) -> Option<String> {
        self.params()
            .ok()?
            .get("function")?
            .as_str()
            .map(str::to_string)
    }
}

/// An existing named resource on the org.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
}

/// A binary static resource; `body` is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticResource {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
    #[serde(rename = "CacheControl")]
    pub cache_control: String,
}

impl StaticResource {
    pub fn zip(name: &str, description: &str, body: String) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            body,
            content_type: "application/zip".to_string(),
            cache_control: "Public".to_string(),
        }
    }
}

pub trait RemoteSession {
    fn login(&mut self, creds: &Credentials) -> Result<SessionInfo>;

    /// POST to the utilities endpoint. Responses that arrive as a JSON
    /// string holding JSON are decoded before being returned.
    fn post_rpc(&self, request: &RpcRequest) -> Result<serde_json::Value>;

    fn find_resource_by_name(&self, name: &str) -> Result<Option<ResourceRecord>>;

    /// Returns the new resource id.
    fn create_resource(&self, resource: &StaticResource) -> Result<String>;

    fn update_resource(&self, id: &str, resource: &StaticResource) -> Result<()>;
}

/// Map an RPC response carrying `errorNo` to its error.
pub fn check_rpc_error(response: &serde_json::Value) -> Result<()> {
    let Some(code) = response.get("errorNo").and_then(error_code) else {
        return Ok(());
    };
    if code == REMOTE_SITE_NOT_ENABLED {
        return Err(McError::RemoteSiteNotEnabled);
    }
    let message = response
        .get("errorMessage")
        .and_then(|m| m.as_str())
        .unwrap_or("no message")
        .to_string();
    Err(McError::Rpc { code, message })
}

/// `errorNo` arrives as a number or a numeric string.
fn error_code(v: &serde_json::Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Decode a response body that may be a JSON string wrapping JSON.
pub fn decode_rpc_body(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => {
            serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s))
        }
        other => other,
    }
}
