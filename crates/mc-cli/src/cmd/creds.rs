use crate::login;
use crate::output::{print_json, print_table};
use mc_core::config::Config;
use mc_core::paths;
use mc_core::registry::Registry;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CredsRow<'a> {
    instance_url: &'a str,
    id: &'a str,
}

/// List orgs with stored credentials. Tokens are never printed.
pub fn list(json: bool) -> anyhow::Result<()> {
    let registry = Registry::load(&paths::registry_path()?)?;
    let creds = registry.all_creds();

    if json {
        let rows: Vec<CredsRow> = creds
            .iter()
            .map(|c| CredsRow {
                instance_url: &c.instance_url,
                id: &c.id,
            })
            .collect();
        return print_json(&rows);
    }
    if creds.is_empty() {
        println!("No stored credentials. Add some with: mobilecaddy store-creds --username <user>");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = creds
        .iter()
        .map(|c| vec![c.instance_url.clone(), c.id.clone()])
        .collect();
    print_table(&["ORG", "IDENTITY"], &rows);
    Ok(())
}

/// Log in once and keep the session token for later `--org` use.
pub fn store(root: &Path, username: &str, endpoint: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let (_, info) = login::login(username, endpoint, &config)?;
    let registry_path = paths::registry_path()?;
    Registry::update(&registry_path, |reg| reg.set_creds(&login::stored(&info)))?;
    println!("Stored credentials for {}", info.instance_url);
    println!("Use them with: --org {}", info.instance_url);
    Ok(())
}
