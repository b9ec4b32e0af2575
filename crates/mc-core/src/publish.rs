//! Push a bundle and its rendered pages to the org.
//!
//! Order: platform version check, bundle (create or update by name), then
//! each page through `createApexPage`. The first failure stops the run and
//! nothing already uploaded is rolled back.

use crate::config::Config;
use crate::error::{McError, Result};
use crate::manifest::{self, ProjectManifest};
use crate::remote::{self, RemoteSession, RpcRequest, StaticResource};
use crate::render::{PageKind, RenderedPage};
use crate::version;
use base64::Engine;
use serde::Serialize;
use serde_json::json;
use std::cmp::Ordering;
use std::path::Path;

const BUNDLE_DESCRIPTION: &str = "App Bundle - auto-uploaded by MobileCaddy deployment tooling";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// `packageVersion` reported by the org.
    pub platform_version: Option<String>,
    pub bundle: String,
    pub bundle_action: ArtifactAction,
    pub pages: Vec<String>,
}

/// Invoke a platform utility `function` and surface any `errorNo` it returns.
pub fn call(
    session: &dyn RemoteSession,
    config: &Config,
    params: &serde_json::Value,
) -> Result<serde_json::Value> {
    let request = RpcRequest::new(&config.start_page_controller_version, params)?;
    tracing::debug!(function = ?request.function(), "rpc");
    let response = session.post_rpc(&request)?;
    remote::check_rpc_error(&response)?;
    Ok(response)
}

/// Check the org runs at least `min_mobilecaddy_version`. Returns the
/// version the org reported, if any.
pub fn check_compatibility(
    session: &dyn RemoteSession,
    manifest: &ProjectManifest,
    config: &Config,
) -> Result<Option<String>> {
    let response = call(session, config, &json!({ "function": "versionInfo" }))?;
    let actual = response
        .get("packageVersion")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let Some(required) = manifest.min_mobilecaddy_version.as_deref() else {
        tracing::warn!("min_mobilecaddy_version not set in package.json, skipping platform version check");
        return Ok(actual);
    };

    let ok = actual
        .as_deref()
        .and_then(|a| version::compare_versions(a, required))
        .is_some_and(|o| o != Ordering::Less);
    if !ok {
        return Err(McError::IncompatiblePlatformVersion {
            required: required.to_string(),
            actual: actual.unwrap_or_else(|| "unknown".to_string()),
        });
    }
    tracing::info!(platform = ?actual, required, "platform version ok");
    Ok(actual)
}

/// Base64 body of the bundle at `path`, refusing anything over `limit` bytes.
pub fn encode_bundle(path: &Path, limit: u64) -> Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(McError::BundleTooLarge { size, limit });
    }
    let data = std::fs::read(path)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(data))
}

/// Create the static resource `name` from the bundle, or update it in
/// place when one with that name already exists.
pub fn publish_bundle(
    session: &dyn RemoteSession,
    name: &str,
    bundle: &Path,
    limit: u64,
) -> Result<ArtifactAction> {
    let body = encode_bundle(bundle, limit)?;
    let resource = StaticResource::zip(name, BUNDLE_DESCRIPTION, body);
    let upload_err = |e: McError| match e {
        McError::Network(detail) => McError::UploadFailed {
            artifact: name.to_string(),
            detail,
        },
        other => other,
    };

    match session.find_resource_by_name(name)? {
        Some(existing) => {
            session
                .update_resource(&existing.id, &resource)
                .map_err(upload_err)?;
            tracing::info!(name, id = %existing.id, "bundle updated");
            Ok(ArtifactAction::Updated)
        }
        None => {
            let id = session.create_resource(&resource).map_err(upload_err)?;
            tracing::info!(name, %id, "bundle created");
            Ok(ArtifactAction::Created)
        }
    }
}

pub fn publish_page(
    session: &dyn RemoteSession,
    config: &Config,
    page: &RenderedPage,
) -> Result<()> {
    let contents = std::fs::read_to_string(&page.path)?;
    let response = call(
        session,
        config,
        &json!({
            "function": "createApexPage",
            "pageApiName": page.name,
            "pageLabel": page.name,
            "pageContents": contents,
            "apiVersion": config.api_version,
            "pageDescription": page.kind.description(),
        }),
    )?;
    match response.get("status").and_then(|s| s.as_str()) {
        Some("success") => {
            tracing::info!(page = %page.name, "page deployed");
            Ok(())
        }
        _ => Err(McError::UploadFailed {
            artifact: page.name.clone(),
            detail: response.to_string(),
        }),
    }
}

/// Cache page first, then the start page, then the service-worker page.
fn upload_order(kind: PageKind) -> u8 {
    match kind {
        PageKind::Cache => 0,
        PageKind::Start => 1,
        PageKind::ServiceWorker => 2,
    }
}

pub fn publish(
    session: &dyn RemoteSession,
    manifest: &ProjectManifest,
    config: &Config,
    bundle: &Path,
    pages: &[RenderedPage],
) -> Result<PublishReport> {
    let names = manifest.resource_names()?;
    let platform_version = check_compatibility(session, manifest, config)?;
    let bundle_action = publish_bundle(session, &names.app, bundle, config.max_bundle_bytes)?;

    let mut ordered: Vec<&RenderedPage> = pages.iter().collect();
    ordered.sort_by_key(|p| upload_order(p.kind));
    let mut deployed = Vec::with_capacity(ordered.len());
    for page in ordered {
        publish_page(session, config, page)?;
        deployed.push(page.name.clone());
    }

    Ok(PublishReport {
        platform_version,
        bundle: names.app,
        bundle_action,
        pages: deployed,
    })
}

/// Full `versionInfo` exchange: reports this project's framework versions
/// to the org and returns its raw answer.
pub fn version_info(
    session: &dyn RemoteSession,
    root: &Path,
    manifest: &ProjectManifest,
    config: &Config,
) -> Result<serde_json::Value> {
    let installed = manifest::installed_versions(root)?;
    let params = json!({
        "function": "versionInfo",
        "mc_utils_resource": manifest.mc_utils_resource,
        "sf_mobile_application": manifest.sf_mobile_application,
        "targeted_dv": manifest.sf_app_vsn,
        "mobilecaddy_codeflow_vsn": installed.get("mobilecaddy-codeflow"),
        "mobilecaddy_codeflow_utils_vsn": installed.get("mobilecaddy-utils"),
        "device_app_name": manifest::device_app_name(root)?,
    });
    call(session, config, &params)
}
