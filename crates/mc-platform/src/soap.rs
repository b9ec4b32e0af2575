//! Username/password login through the partner SOAP API.

use crate::error::PlatformError;
use mc_core::config::DEFAULT_LOGIN_ENDPOINT;
use mc_core::remote::{Credentials, SessionInfo};
use regex::Regex;

/// `https://<host>` for a login endpoint given as a bare host or a URL.
/// An empty endpoint means the production login host.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return format!("https://{DEFAULT_LOGIN_ENDPOINT}");
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        return trimmed.to_string();
    }
    format!("https://{trimmed}")
}

pub fn login_url(endpoint: &str, api_version: u32) -> String {
    format!("{}/services/Soap/u/{api_version}.0", normalize_endpoint(endpoint))
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        escape_xml(username),
        escape_xml(password)
    )
}

/// Text content of the first `<name>` element, namespace prefix allowed.
fn element(body: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r"<(?:\w+:)?{name}>([^<]*)</(?:\w+:)?{name}>")).ok()?;
    re.captures(body).map(|c| c[1].to_string())
}

pub fn login(
    client: &reqwest::blocking::Client,
    creds: &Credentials,
    api_version: u32,
) -> Result<SessionInfo, PlatformError> {
    let url = login_url(&creds.endpoint, api_version);
    tracing::debug!(%url, username = %creds.username, "soap login");
    let resp = client
        .post(&url)
        .header("Content-Type", "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(envelope(&creds.username, &creds.password))
        .send()?;
    let status = resp.status();
    let body = resp.text()?;

    if let Some(fault) = element(&body, "faultstring") {
        return Err(PlatformError::Login(fault));
    }
    if !status.is_success() {
        return Err(PlatformError::Api {
            method: "POST",
            url,
            status: status.as_u16(),
            body,
        });
    }

    let session_id = element(&body, "sessionId")
        .ok_or_else(|| PlatformError::Response("login response has no sessionId".into()))?;
    let server_url = element(&body, "serverUrl")
        .ok_or_else(|| PlatformError::Response("login response has no serverUrl".into()))?;
    let instance_url = reqwest::Url::parse(&server_url)
        .map(|u| u.origin().ascii_serialization())
        .map_err(|e| PlatformError::Response(format!("bad serverUrl '{server_url}': {e}")))?;
    let id = match (element(&body, "organizationId"), element(&body, "userId")) {
        (Some(org), Some(user)) => format!("{}/id/{org}/{user}", normalize_endpoint(&creds.endpoint)),
        _ => String::new(),
    };

    tracing::info!(%instance_url, "logged in");
    Ok(SessionInfo {
        instance_url,
        access_token: session_id,
        id,
    })
}
