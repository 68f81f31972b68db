//! Category listing and candidate inspection.

use anyhow::Context;
use console::style;

use hymnal::config::Settings;
use hymnal::models::Category;
use hymnal::SessionError;

/// Look up a category or fail with the list of known IDs.
pub(super) fn find_category<'a>(settings: &'a Settings, id: &str) -> anyhow::Result<&'a Category> {
    settings.registry.get(id).with_context(|| {
        let known: Vec<&str> = settings.registry.iter().map(|c| c.id.as_str()).collect();
        format!("Unknown category '{}' (known: {})", id, known.join(", "))
    })
}

pub fn cmd_categories(settings: &Settings) -> anyhow::Result<()> {
    let default_id = settings.registry.default_category().map(|c| c.id.clone());

    println!("{}", style("Categories").bold());
    for category in settings.registry.iter() {
        let marker = if default_id.as_deref() == Some(category.id.as_str()) {
            style("*").green()
        } else {
            style(" ").dim()
        };
        println!(
            "  {} {:<12} {:<10} 1-{:<5} {}",
            marker,
            category.id,
            category.name,
            category.total,
            style(format!("{}/", category.folder)).dim()
        );
        for range in settings.registry.irregular_in(&category.id) {
            println!("      fixed range {}-{}", range.first, range.last);
        }
    }
    Ok(())
}

pub fn cmd_candidates(settings: &Settings, category_id: &str, number: &str) -> anyhow::Result<()> {
    let category = find_category(settings, category_id)?;
    let number = parse_number(category, number)?;

    let probe = settings.build_probe()?;
    let candidates = settings.pattern_generator().generate(category, number);

    println!(
        "{} {} #{}: {} candidates ({} policy)",
        style("→").cyan(),
        category.name,
        number,
        candidates.len(),
        settings.pattern_policy.as_str()
    );
    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "  {:>3}. {:<9} {:<9} {}",
            i + 1,
            candidate.kind.as_str(),
            candidate.label(),
            probe.locate(&candidate.path)
        );
    }
    Ok(())
}

/// Parse and range-check a number typed on the command line.
pub(super) fn parse_number(category: &Category, input: &str) -> Result<u32, SessionError> {
    match input.trim().parse::<u32>() {
        Ok(n) if category.contains(n) => Ok(n),
        Ok(n) => Err(SessionError::OutOfRange {
            number: n,
            name: category.name.clone(),
            total: category.total,
        }),
        Err(_) => Err(SessionError::InvalidInput {
            input: input.to_string(),
            name: category.name.clone(),
            total: category.total,
        }),
    }
}
