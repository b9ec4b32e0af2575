use anyhow::Context;
use clap::Args;
use mc_core::config::Config;
use mc_core::registry::{Registry, StoredCreds};
use mc_core::remote::{Credentials, RemoteSession, SessionInfo};
use mc_core::McError;
use mc_platform::HttpSession;
use std::path::Path;

/// Read instead of prompting when set; for scripted use.
const PASSWORD_ENV: &str = "MOBILECADDY_PASSWORD";

/// How a command reaches an org.
#[derive(Args, Debug, Clone)]
pub struct OrgArgs {
    /// Username to log in with (the password is prompted for)
    #[arg(long, short = 'u', conflicts_with = "org")]
    pub username: Option<String>,

    /// Login endpoint, e.g. test.salesforce.com for sandboxes
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Instance URL of an org with stored credentials (see `mobilecaddy creds`)
    #[arg(long)]
    pub org: Option<String>,
}

fn prompt_password(username: &str) -> anyhow::Result<String> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(pw);
    }
    let pw = dialoguer::Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()
        .context("failed to read password")?;
    Ok(pw)
}

/// Log in with a username and prompted password.
pub fn login(
    username: &str,
    endpoint: Option<&str>,
    config: &Config,
) -> anyhow::Result<(HttpSession, SessionInfo)> {
    let creds = Credentials {
        username: username.to_string(),
        password: prompt_password(username)?,
        endpoint: endpoint.unwrap_or(&config.login_endpoint).to_string(),
    };
    let mut session = HttpSession::new(config.api_version);
    let info = session.login(&creds)?;
    Ok((session, info))
}

/// A ready session plus the instance URL it is bound to.
pub fn open_session(
    args: &OrgArgs,
    config: &Config,
    registry_path: &Path,
) -> anyhow::Result<(HttpSession, String)> {
    if let Some(org) = &args.org {
        let registry = Registry::load(registry_path)?;
        let stored = registry.creds(org).ok_or_else(|| {
            McError::InvalidInput(format!(
                "no stored credentials for {org}: run 'mobilecaddy store-creds' first"
            ))
        })?;
        let info = SessionInfo {
            instance_url: stored.instance_url.clone(),
            access_token: stored.access_token,
            id: stored.id,
        };
        tracing::debug!(org = %stored.instance_url, "using stored credentials");
        return Ok((HttpSession::from_token(info, config.api_version), stored.instance_url));
    }

    let Some(username) = &args.username else {
        return Err(McError::InvalidInput("pass --username <user> or --org <instance url>".into()).into());
    };
    let (session, info) = login(username, args.endpoint.as_deref(), config)?;
    Ok((session, info.instance_url))
}

pub fn stored(info: &SessionInfo) -> StoredCreds {
    StoredCreds {
        access_token: info.access_token.clone(),
        refresh_token: String::new(),
        id: info.id.clone(),
        instance_url: info.instance_url.clone(),
    }
}
