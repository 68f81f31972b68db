//! Shared console output for CLI commands.

use console::style;

use hymnal::models::{DisplaySlot, SlotContent};
use hymnal::probe::Probe;

/// Print one display slot with every image's resolved location.
pub fn print_slot(slot: &DisplaySlot, probe: &dyn Probe) {
    if let Some(by) = slot.suppressed_by {
        println!(
            "  {} #{} {}",
            style("·").dim(),
            slot.number,
            style(format!("shown with #{}", by)).dim()
        );
        return;
    }

    match &slot.content {
        SlotContent::Images { images } => {
            for (i, image) in images.iter().enumerate() {
                let marker = if i == 0 {
                    style("✓").green()
                } else {
                    style("+").cyan()
                };
                println!(
                    "  {} {:<12} {}",
                    marker,
                    image.label,
                    probe.locate(&image.path)
                );
            }
        }
        SlotContent::NotFound => {
            println!("  {} #{} no image found", style("✗").red(), slot.number);
        }
        SlotContent::Placeholder => {
            println!("  {} #{} pending", style("…").yellow(), slot.number);
        }
    }
}

/// Shorten `s` to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("찬송가 100", 20), "찬송가 100");
        assert_eq!(truncate("chansongga/100-101.jpeg", 10), "chanson...");
    }
}
