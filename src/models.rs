//! Record types stored in SQLite and exchanged over the JSON API.
//!
//! Field names on the wire match the column names (`firstName`,
//! `overallGrade`, ...), so a serialized row reads the same as the table.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// A roster entry as stored in the `players` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: Option<String>,
    pub grad_year: Option<String>,
    pub state: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub commitment: Option<String>,
    pub bat_hand: Option<String>,
    pub throw_hand: Option<String>,
    pub position: Option<String>,
    pub created_at: Option<String>,
}

/// A player about to be inserted, either reconciled from a CSV row or
/// posted by hand. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPlayer {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub school: String,
    #[serde(deserialize_with = "lenient_string")]
    pub grad_year: String,
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub height: String,
    #[serde(deserialize_with = "lenient_string")]
    pub weight: String,
    #[serde(deserialize_with = "lenient_string")]
    pub commitment: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bat_hand: String,
    #[serde(deserialize_with = "lenient_string")]
    pub throw_hand: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
}

/// Projection returned by the player search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub school: Option<String>,
    pub position: Option<String>,
}

/// A scouting report row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub player_name: String,
    pub player_school: Option<String>,
    pub event_date: Option<String>,
    pub event_name: Option<String>,
    pub scout_name: Option<String>,
    pub overall_grade: Option<Grade>,
    pub stance: Option<String>,
    pub load: Option<String>,
    pub swing_path: Option<String>,
    pub barrel_feel: Option<String>,
    pub bat_speed: Option<String>,
    #[serde(rename = "avgEV")]
    pub avg_ev: Option<String>,
    #[serde(rename = "maxEV")]
    pub max_ev: Option<String>,
    pub max_dist: Option<String>,
    pub scout_notes: Option<String>,
    pub report_type: Option<String>,
    pub game_notes: Option<String>,
    pub formatted_at_bats: Option<String>,
    pub at_bats_json: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Report submission body.
///
/// Showcase reports carry notes and mechanics; game reports carry
/// `gameNotes`, `formattedAtBats`, and the structured `atBats` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReport {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub player_name: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub player_school: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub event_date: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub event_name: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub scout_name: Option<String>,
    #[serde(deserialize_with = "grade")]
    pub overall_grade: Option<Grade>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub report_type: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub stance: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub load: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub swing_path: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub barrel_feel: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub bat_speed: Option<String>,
    #[serde(rename = "avgEV", deserialize_with = "lenient_opt_string")]
    pub avg_ev: Option<String>,
    #[serde(rename = "maxEV", deserialize_with = "lenient_opt_string")]
    pub max_ev: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub max_dist: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub scout_notes: Option<String>,
    /// Older showcase forms send their free text here.
    #[serde(deserialize_with = "lenient_opt_string")]
    pub body_notes: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub game_notes: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub formatted_at_bats: Option<String>,
    pub at_bats: Option<Value>,
}

/// An overall grade as the scout entered it.
///
/// Grades are not range-checked. Numbers keep their fractional part, and a
/// value that does not parse as a number is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Grade {
    Number(Number),
    Text(String),
}

impl Grade {
    /// Whole values come back as integers, so `7.0` reads as `7`.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Some(Grade::Number(Number::from(value as i64)))
        } else {
            Number::from_f64(value).map(Grade::Number)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Grade::Number(n) => n.as_f64(),
            Grade::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Grade::Number(_) => None,
            Grade::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Number(n) => write!(f, "{}", n),
            Grade::Text(s) => f.write_str(s),
        }
    }
}

/// A distinct event seen in the reports table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_name: Option<String>,
    pub event_date: Option<String>,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Accept strings, numbers, and booleans; `null` becomes an empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

/// Numbers and numeric strings become [`Grade::Number`]; other text is kept
/// as [`Grade::Text`]. `null`, blank strings, and non-scalars mean no grade.
fn grade<'de, D>(deserializer: D) -> Result<Option<Grade>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => Some(Grade::Number(n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if let Ok(i) = trimmed.parse::<i64>() {
                Some(Grade::Number(Number::from(i)))
            } else {
                match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                    Some(n) => Some(Grade::Number(n)),
                    None => Some(Grade::Text(s)),
                }
            }
        }
        _ => None,
    })
}
