use crate::output::{print_json, print_table};
use mc_core::paths;
use mc_core::registry::Registry;

pub fn list(json: bool) -> anyhow::Result<()> {
    let registry = Registry::load(&paths::registry_path()?)?;

    if json {
        return print_json(&registry.apps);
    }
    if registry.apps.is_empty() {
        println!("No apps registered. Create one with: mobilecaddy new <template> <app-name>");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = registry
        .apps
        .iter()
        .map(|a| vec![a.name.clone(), a.dir.display().to_string(), a.orgs.len().to_string()])
        .collect();
    print_table(&["NAME", "DIR", "ORGS"], &rows);
    Ok(())
}

pub fn info(name: &str, json: bool) -> anyhow::Result<()> {
    let registry = Registry::load(&paths::registry_path()?)?;
    let app = registry.app(name)?;

    if json {
        return print_json(app);
    }
    println!("Name: {}", app.name);
    println!("Dir:  {}", app.dir.display());
    if app.orgs.is_empty() {
        println!("Orgs: (never deployed)");
    } else {
        println!("Orgs:");
        for org in &app.orgs {
            println!("  {org}");
        }
    }
    Ok(())
}
