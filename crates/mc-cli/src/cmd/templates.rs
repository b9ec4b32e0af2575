use crate::output::{print_json, print_table};
use mc_core::config::Config;
use mc_core::template;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let templates = template::fetch_list(&config.templates_url);

    if json {
        return print_json(&templates);
    }

    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| vec![t.id.clone(), t.desc.clone()])
        .collect();
    print_table(&["TEMPLATE", "DESCRIPTION"], &rows);
    println!("\nCreate an app with: mobilecaddy new <template> <app-name>");
    Ok(())
}
