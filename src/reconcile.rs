//! Header reconciliation for roster spreadsheets.
//!
//! Roster exports name their columns inconsistently (`First`, `First Name`,
//! `FirstName`, `Player First`...). Each target field has an ordered list of
//! header candidates, most specific first. For every candidate the row is
//! searched for a case-insensitive exact header match, then for a header
//! that contains the candidate; the first non-empty value wins.
//!
//! Everything in this module is pure and never fails: a field with no
//! usable column resolves to an empty string.

use crate::models::NewPlayer;

/// One decoded spreadsheet row, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

const FIRST_NAME: &[&str] = &["first name", "first", "firstname"];
const LAST_NAME: &[&str] = &["last name", "last", "lastname"];
const SCHOOL: &[&str] = &["high school", "school", "team"];
const GRAD_YEAR: &[&str] = &["grad class", "grad year", "grad", "year"];
const STATE: &[&str] = &["state"];
const HEIGHT: &[&str] = &["height"];
const WEIGHT: &[&str] = &["weight"];
const COMMITMENT: &[&str] = &["commitment"];
/// Combined handedness such as `Bats/Throws: R/L`.
const BATS_THROWS: &[&str] = &["bats/throws", "bats", "throw"];
const BAT_HAND: &[&str] = &["bat hand", "bat"];
const THROW_HAND: &[&str] = &["throw hand", "throw"];
const POSITION: &[&str] = &["primary", "position", "pos"];

/// Header keys are compared trimmed and lowercased.
fn header_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Resolve one field from `row` by trying `candidates` in order.
pub fn find_column(row: &RawRow, candidates: &[&str]) -> String {
    for candidate in candidates {
        let wanted = candidate.to_lowercase();

        let exact = row
            .fields
            .iter()
            .filter(|(key, _)| header_key(key) == wanted)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty());
        if let Some(value) = exact {
            return value.to_string();
        }

        let partial = row
            .fields
            .iter()
            .filter(|(key, _)| header_key(key).contains(&wanted))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty());
        if let Some(value) = partial {
            return value.to_string();
        }
    }
    String::new()
}

/// Split a combined `bat/throw` value such as `"R/L"` or `"S / R"`.
///
/// Returns `None` when the value has no `/`.
pub fn split_hands(combined: &str) -> Option<(String, String)> {
    let (bat, throw) = combined.split_once('/')?;
    Some((bat.trim().to_string(), throw.trim().to_string()))
}

/// Resolve batting and throwing hands.
///
/// A combined column wins for whichever side it fills; the dedicated
/// `bat`/`throw` columns cover the rest.
pub fn resolve_hands(row: &RawRow) -> (String, String) {
    let (mut bat, mut throw) = split_hands(&find_column(row, BATS_THROWS)).unwrap_or_default();
    if bat.is_empty() {
        bat = find_column(row, BAT_HAND);
    }
    if throw.is_empty() {
        throw = find_column(row, THROW_HAND);
    }
    (bat, throw)
}

/// Build a player record from one spreadsheet row.
pub fn reconcile_row(row: &RawRow) -> NewPlayer {
    let (bat_hand, throw_hand) = resolve_hands(row);
    NewPlayer {
        first_name: find_column(row, FIRST_NAME),
        last_name: find_column(row, LAST_NAME),
        school: find_column(row, SCHOOL),
        grad_year: find_column(row, GRAD_YEAR),
        state: find_column(row, STATE),
        height: find_column(row, HEIGHT),
        weight: find_column(row, WEIGHT),
        commitment: find_column(row, COMMITMENT),
        bat_hand,
        throw_hand,
        position: find_column(row, POSITION),
    }
}
