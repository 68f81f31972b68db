//! Effective configuration output.

use console::style;

use hymnal::config::Settings;

/// Print the merged settings (file, environment, flags) as JSON.
pub fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);

    let default_id = settings
        .registry
        .default_category()
        .map(|c| c.id.as_str())
        .unwrap_or("-");
    eprintln!(
        "  {} {} categories, default {}",
        style("→").dim(),
        settings.registry.len(),
        default_id
    );
    Ok(())
}
