//! Scouting report storage and the read queries behind the report endpoints.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{ScoutError, ScoutResult};
use crate::models::{EventSummary, Grade, NewReport, Report};

pub const DEFAULT_REPORT_TYPE: &str = "showcase";

// `overallGrade` has INTEGER affinity but may hold REAL or TEXT values, so it
// is read as two typed columns.
const REPORT_COLUMNS: &str = "id, playerName, playerSchool, eventDate, eventName, scoutName, \
     CASE WHEN typeof(overallGrade) IN ('integer', 'real') \
          THEN CAST(overallGrade AS REAL) END AS gradeNumber, \
     CASE WHEN typeof(overallGrade) = 'text' THEN overallGrade END AS gradeText, \
     stance, load, swingPath, barrelFeel, batSpeed, avgEV, maxEV, maxDist, \
     scoutNotes, reportType, gameNotes, formattedAtBats, atBatsJson, createdAt, updatedAt";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Persist a report submission and return its id.
pub async fn create_report(pool: &SqlitePool, report: NewReport) -> ScoutResult<i64> {
    let player_name = non_empty(report.player_name)
        .ok_or_else(|| ScoutError::validation("playerName is required"))?;

    let at_bats_json = match report.at_bats {
        Some(value) if !value.is_null() => Some(serde_json::to_string(&value)?),
        _ => None,
    };
    let report_type =
        non_empty(report.report_type).unwrap_or_else(|| DEFAULT_REPORT_TYPE.to_string());
    let scout_notes = non_empty(report.scout_notes)
        .or(non_empty(report.body_notes))
        .unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO reports (
            playerName, playerSchool, eventDate, eventName, scoutName, overallGrade,
            stance, load, swingPath, barrelFeel, batSpeed, avgEV, maxEV, maxDist,
            reportType, scoutNotes, gameNotes, formattedAtBats, atBatsJson
        ) VALUES (?, ?, ?, ?, ?, COALESCE(?, ?), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&player_name)
    .bind(&report.player_school)
    .bind(&report.event_date)
    .bind(&report.event_name)
    .bind(&report.scout_name)
    .bind(report.overall_grade.as_ref().and_then(Grade::as_f64))
    .bind(report.overall_grade.as_ref().and_then(Grade::as_text))
    .bind(&report.stance)
    .bind(&report.load)
    .bind(&report.swing_path)
    .bind(&report.barrel_feel)
    .bind(&report.bat_speed)
    .bind(&report.avg_ev)
    .bind(&report.max_ev)
    .bind(&report.max_dist)
    .bind(&report_type)
    .bind(&scout_notes)
    .bind(non_empty(report.game_notes))
    .bind(non_empty(report.formatted_at_bats))
    .bind(&at_bats_json)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All reports, newest first.
pub async fn list_reports(pool: &SqlitePool) -> ScoutResult<Vec<Report>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM reports ORDER BY createdAt DESC, id DESC",
        REPORT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(report_from_row).collect()
}

/// Reports for one event name, newest first.
pub async fn list_reports_by_event(pool: &SqlitePool, event_name: &str) -> ScoutResult<Vec<Report>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM reports WHERE eventName = ? ORDER BY createdAt DESC, id DESC",
        REPORT_COLUMNS
    ))
    .bind(event_name)
    .fetch_all(pool)
    .await?;
    rows.iter().map(report_from_row).collect()
}

/// Reports for one event occurrence, ordered by player name for export.
pub async fn reports_for_export(
    pool: &SqlitePool,
    event_name: &str,
    event_date: &str,
) -> ScoutResult<Vec<Report>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM reports WHERE eventName = ? AND eventDate = ? ORDER BY playerName, id",
        REPORT_COLUMNS
    ))
    .bind(event_name)
    .bind(event_date)
    .fetch_all(pool)
    .await?;
    rows.iter().map(report_from_row).collect()
}

/// Distinct (eventName, eventDate) pairs, most recent date first.
pub async fn list_events(pool: &SqlitePool) -> ScoutResult<Vec<EventSummary>> {
    let rows = sqlx::query(
        "SELECT DISTINCT eventName, eventDate FROM reports ORDER BY eventDate DESC, eventName",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| EventSummary {
            event_name: row.get("eventName"),
            event_date: row.get("eventDate"),
        })
        .collect())
}

fn report_from_row(row: &SqliteRow) -> ScoutResult<Report> {
    let grade_number: Option<f64> = row.try_get("gradeNumber")?;
    let grade_text: Option<String> = row.try_get("gradeText")?;

    Ok(Report {
        id: row.get("id"),
        player_name: row.get("playerName"),
        player_school: row.get("playerSchool"),
        event_date: row.get("eventDate"),
        event_name: row.get("eventName"),
        scout_name: row.get("scoutName"),
        overall_grade: grade_number
            .and_then(Grade::from_f64)
            .or(grade_text.map(Grade::Text)),
        stance: row.get("stance"),
        load: row.get("load"),
        swing_path: row.get("swingPath"),
        barrel_feel: row.get("barrelFeel"),
        bat_speed: row.get("batSpeed"),
        avg_ev: row.get("avgEV"),
        max_ev: row.get("maxEV"),
        max_dist: row.get("maxDist"),
        scout_notes: row.get("scoutNotes"),
        report_type: row.get("reportType"),
        game_notes: row.get("gameNotes"),
        formatted_at_bats: row.get("formattedAtBats"),
        at_bats_json: row.get("atBatsJson"),
        created_at: row.get("createdAt"),
        updated_at: row.get("updatedAt"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrate};
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("scout.sqlite"))
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        (tmp, pool)
    }

    fn report(value: serde_json::Value) -> NewReport {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_report_applies_defaults() {
        let (_tmp, pool) = setup().await;

        let id = create_report(
            &pool,
            report(json!({
                "playerName": "Cal Ortiz",
                "eventName": "Fall Classic",
                "eventDate": "2024-09-01",
                "overallGrade": 7,
                "bodyNotes": "Projectable frame"
            })),
        )
        .await
        .unwrap();

        let reports = list_reports(&pool).await.unwrap();
        assert_eq!(reports.len(), 1);
        let r = &reports[0];
        assert_eq!(r.id, id);
        assert_eq!(r.report_type.as_deref(), Some("showcase"));
        assert_eq!(r.scout_notes.as_deref(), Some("Projectable frame"));
        assert_eq!(r.overall_grade, Some(Grade::Number(7.into())));
        assert_eq!(r.game_notes, None);
        assert_eq!(r.at_bats_json, None);
    }

    #[tokio::test]
    async fn test_grades_round_trip_without_rewriting() {
        let (_tmp, pool) = setup().await;
        for (name, grade) in [("Half", json!(6.5)), ("Word", json!("55/60")), ("Whole", json!("8"))] {
            create_report(&pool, report(json!({"playerName": name, "overallGrade": grade})))
                .await
                .unwrap();
        }
        sqlx::query("INSERT INTO reports (playerName, overallGrade) VALUES ('Legacy', 7.5)")
            .execute(&pool)
            .await
            .unwrap();

        let stored: Vec<(String, String)> = sqlx::query_as(
            "SELECT playerName, typeof(overallGrade) FROM reports ORDER BY id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(stored[0], ("Half".to_string(), "real".to_string()));
        assert_eq!(stored[1], ("Word".to_string(), "text".to_string()));
        assert_eq!(stored[2], ("Whole".to_string(), "integer".to_string()));

        let grades: Vec<(String, Option<Grade>)> = list_reports(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.player_name, r.overall_grade))
            .collect();
        let grade_of = |name: &str| {
            grades
                .iter()
                .find(|(n, _)| n == name)
                .and_then(|(_, g)| g.clone())
        };
        assert_eq!(grade_of("Half").and_then(|g| g.as_f64()), Some(6.5));
        assert_eq!(grade_of("Word"), Some(Grade::Text("55/60".into())));
        assert_eq!(grade_of("Whole"), Some(Grade::Number(8.into())));
        assert_eq!(grade_of("Legacy").and_then(|g| g.as_f64()), Some(7.5));
    }

    #[tokio::test]
    async fn test_create_game_report_serializes_at_bats() {
        let (_tmp, pool) = setup().await;

        create_report(
            &pool,
            report(json!({
                "playerName": "Eli Park",
                "reportType": "game",
                "scoutNotes": "Primary notes",
                "bodyNotes": "ignored",
                "gameNotes": "Two hard outs",
                "atBats": [{"pitch": "FB", "result": "1B"}, {"pitch": "CB", "result": "K"}]
            })),
        )
        .await
        .unwrap();

        let r = &list_reports(&pool).await.unwrap()[0];
        assert_eq!(r.report_type.as_deref(), Some("game"));
        assert_eq!(r.scout_notes.as_deref(), Some("Primary notes"));
        assert_eq!(r.game_notes.as_deref(), Some("Two hard outs"));
        let at_bats: serde_json::Value =
            serde_json::from_str(r.at_bats_json.as_deref().unwrap()).unwrap();
        assert_eq!(at_bats[1]["result"], "K");
    }

    #[tokio::test]
    async fn test_create_report_requires_player_name() {
        let (_tmp, pool) = setup().await;
        let err = create_report(&pool, report(json!({"scoutName": "Kim"})))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_listing_order_and_event_filter() {
        let (_tmp, pool) = setup().await;
        for (name, event, date) in [
            ("A One", "Spring Open", "2024-03-10"),
            ("B Two", "Fall Classic", "2024-09-01"),
            ("C Three", "Fall Classic", "2024-09-01"),
        ] {
            create_report(
                &pool,
                report(json!({"playerName": name, "eventName": event, "eventDate": date})),
            )
            .await
            .unwrap();
        }

        let all = list_reports(&pool).await.unwrap();
        assert_eq!(all[0].player_name, "C Three");
        assert_eq!(all[2].player_name, "A One");

        let fall = list_reports_by_event(&pool, "Fall Classic").await.unwrap();
        assert_eq!(fall.len(), 2);
        assert_eq!(fall[0].player_name, "C Three");

        let events = list_events(&pool).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_name.as_deref(), Some("Fall Classic"));
        assert_eq!(events[1].event_date.as_deref(), Some("2024-03-10"));
    }

    #[tokio::test]
    async fn test_reports_for_export_sorted_by_player() {
        let (_tmp, pool) = setup().await;
        for name in ["Zane Hill", "Abe Ford"] {
            create_report(
                &pool,
                report(json!({"playerName": name, "eventName": "Fall Classic", "eventDate": "2024-09-01"})),
            )
            .await
            .unwrap();
        }
        create_report(
            &pool,
            report(json!({"playerName": "Other Day", "eventName": "Fall Classic", "eventDate": "2024-09-02"})),
        )
        .await
        .unwrap();

        let rows = reports_for_export(&pool, "Fall Classic", "2024-09-01")
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, vec!["Abe Ford", "Zane Hill"]);
    }
}
