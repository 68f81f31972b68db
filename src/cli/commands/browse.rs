//! Targeted search and full-category load.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use hymnal::config::Settings;
use hymnal::models::DisplaySlot;
use hymnal::{Session, SessionEvent};

use super::registry::find_category;
use crate::cli::helpers::{print_slot, truncate};

fn open_session(settings: &Settings, category_id: &str) -> anyhow::Result<Session> {
    let resolver = settings.build_resolver()?;
    let mut session = Session::new(
        settings.registry.clone(),
        Arc::new(resolver),
        settings.session_options(),
    )?;
    session.start(category_id)?;
    Ok(session)
}

pub async fn cmd_search(
    settings: &Settings,
    category_id: &str,
    number: &str,
    json: bool,
) -> anyhow::Result<()> {
    let category = find_category(settings, category_id)?;
    let probe = settings.build_probe()?;
    let mut session = open_session(settings, &category.id)?;

    let report = match session.search_input(number).await {
        Ok(report) => report,
        Err(e) if e.is_validation() => {
            eprintln!("{} {}", style("✗").red(), e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        let slots: Vec<&DisplaySlot> = session.slots().collect();
        let output = serde_json::json!({
            "report": report,
            "slots": slots,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} #{} ({} candidates, {}ms)",
        style("→").cyan(),
        category.name,
        report.number,
        report.resolution.candidates,
        report.resolution.elapsed_ms
    );
    for slot in session.slots() {
        print_slot(slot, probe.as_ref());
    }
    if report.key != report.number {
        println!(
            "  {} #{} is shown in the slot starting at #{}",
            style("→").dim(),
            report.number,
            report.key
        );
    }
    Ok(())
}

pub async fn cmd_load(
    settings: &Settings,
    category_id: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let category = match category_id {
        Some(id) => find_category(settings, id)?.clone(),
        None => settings
            .registry
            .default_category()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No categories are configured"))?,
    };
    let probe = settings.build_probe()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let mut session = open_session(settings, &category.id)?.with_events(event_tx);

    let progress = ProgressBar::new(category.total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );
    progress.set_message(format!("Loading {}...", category.name));

    let pb = progress.clone();
    let event_handler = tokio::spawn(async move {
        let mut settled = HashSet::new();
        while let Some(event) = event_rx.recv().await {
            match event {
                SessionEvent::SlotResolved { slot } => {
                    let label = slot
                        .images()
                        .first()
                        .map(|image| image.path.file.clone())
                        .unwrap_or_else(|| format!("#{} not found", slot.number));
                    pb.set_message(truncate(&label, 40));
                    if settled.insert(slot.number) {
                        pb.inc(1);
                    }
                }
                SessionEvent::SlotSuppressed { number, .. } => {
                    if settled.insert(number) {
                        pb.inc(1);
                    }
                }
                _ => {}
            }
        }
    });

    let start = Instant::now();
    let summary = session.load_category_fully().await;
    let slots: Vec<DisplaySlot> = session.slots().cloned().collect();
    drop(session);
    let _ = event_handler.await;
    progress.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }

    for slot in &slots {
        print_slot(slot, probe.as_ref());
    }
    println!(
        "{} Loaded {} ({} numbers) in {:.1}s: {} images, {} not found, {} shown with a neighbour",
        style("✓").green(),
        summary.category,
        summary.total,
        start.elapsed().as_secs_f64(),
        summary.images,
        summary.not_found,
        summary.suppressed
    );
    Ok(())
}
