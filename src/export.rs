//! Plain-text export of one event's reports.
//!
//! The document is meant to be pasted into a shared doc or email, so the
//! layout is fixed: an event header, then one block per report separated by
//! a dashed line.

use sqlx::SqlitePool;

use crate::error::ScoutResult;
use crate::models::Report;
use crate::reports;

const RULE_WIDTH: usize = 50;

/// Fetch the reports for `event_name` on `event_date` and render them.
pub async fn export_event_text(
    pool: &SqlitePool,
    event_name: &str,
    event_date: &str,
) -> ScoutResult<String> {
    let rows = reports::reports_for_export(pool, event_name, event_date).await?;
    Ok(format_event_text(event_name, event_date, &rows))
}

/// Render the export document. Missing values print as empty.
pub fn format_event_text(event_name: &str, event_date: &str, reports: &[Report]) -> String {
    let mut text = format!("{} - {}\n", event_name, event_date);
    text.push_str(&"=".repeat(RULE_WIDTH));
    text.push_str("\n\n");

    for report in reports {
        text.push_str(&format_report(report));
    }
    text
}

fn format_report(r: &Report) -> String {
    let v = |field: &Option<String>| field.clone().unwrap_or_default();
    let grade = r
        .overall_grade
        .as_ref()
        .map(|g| g.to_string())
        .unwrap_or_default();

    let mut block = format!(
        "PLAYER: {} ({})\nSCOUT: {}\nGRADE: {}/10\n",
        r.player_name,
        v(&r.player_school),
        v(&r.scout_name),
        grade
    );
    block.push_str(&format!(
        "\nMechanics:\n  Stance: {}\n  Load: {}\n  Swing Path: {}\n  Barrel Feel: {}\n",
        v(&r.stance),
        v(&r.load),
        v(&r.swing_path),
        v(&r.barrel_feel)
    ));
    block.push_str(&format!(
        "\nVelocity:\n  Bat Speed: {}\n  Avg EV: {}\n  Max EV: {}\n  Max Distance: {}\n",
        v(&r.bat_speed),
        v(&r.avg_ev),
        v(&r.max_ev),
        v(&r.max_dist)
    ));
    block.push_str(&format!("\nNotes:\n{}\n", v(&r.scout_notes)));
    block.push_str(&"-".repeat(RULE_WIDTH));
    block.push_str("\n\n");
    block
}
