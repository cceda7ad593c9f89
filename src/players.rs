//! Player storage: manual entry, batch import, listing, and name search.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{ScoutError, ScoutResult};
use crate::models::{NewPlayer, Player, PlayerMatch};

/// Queries shorter than this return no matches without touching the store.
pub const MIN_SEARCH_LEN: usize = 2;
pub const MAX_SEARCH_RESULTS: i64 = 20;

const INSERT_PLAYER: &str = r#"
    INSERT INTO players (firstName, lastName, school, gradYear, state, height, weight,
                         commitment, batHand, throwHand, position)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Insert one player and return its id. No field validation happens here.
pub async fn insert_player(pool: &SqlitePool, player: &NewPlayer) -> ScoutResult<i64> {
    let result = sqlx::query(INSERT_PLAYER)
        .bind(&player.first_name)
        .bind(&player.last_name)
        .bind(&player.school)
        .bind(&player.grad_year)
        .bind(&player.state)
        .bind(&player.height)
        .bind(&player.weight)
        .bind(&player.commitment)
        .bind(&player.bat_hand)
        .bind(&player.throw_hand)
        .bind(&player.position)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Insert every player independently and report one outcome per input.
///
/// There is no enclosing transaction: rows inserted before a failure stay
/// committed, and a failure never stops the rows after it. The returned
/// vector is index-aligned with `players`.
pub async fn insert_batch(pool: &SqlitePool, players: &[NewPlayer]) -> Vec<ScoutResult<i64>> {
    let mut outcomes = Vec::with_capacity(players.len());
    for (i, player) in players.iter().enumerate() {
        let outcome = insert_player(pool, player).await;
        if let Err(ref e) = outcome {
            log::warn!(
                "player insert failed for batch row {} ({} {}): {}",
                i + 1,
                player.first_name,
                player.last_name,
                e
            );
        }
        outcomes.push(outcome);
    }
    outcomes
}

/// Manual quick-add. `firstName`, `lastName`, and `school` are required.
pub async fn add_player(pool: &SqlitePool, player: &NewPlayer) -> ScoutResult<i64> {
    let missing: Vec<&str> = [
        ("firstName", &player.first_name),
        ("lastName", &player.last_name),
        ("school", &player.school),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(ScoutError::validation(format!(
            "firstName, lastName, and school are required (missing: {})",
            missing.join(", ")
        )));
    }

    insert_player(pool, player).await
}

pub async fn list_players(pool: &SqlitePool) -> ScoutResult<Vec<Player>> {
    let rows = sqlx::query(
        "SELECT id, firstName, lastName, school, gradYear, state, height, weight, commitment, \
         batHand, throwHand, position, createdAt \
         FROM players ORDER BY lastName, firstName",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(player_from_row).collect())
}

/// Substring search over first and last names.
///
/// Matching follows SQLite's `LIKE`, which ignores ASCII case. Wildcard
/// characters in `query` are matched literally.
pub async fn search_players(pool: &SqlitePool, query: &str) -> ScoutResult<Vec<PlayerMatch>> {
    if query.chars().count() < MIN_SEARCH_LEN {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(query));
    let rows = sqlx::query(
        r"SELECT firstName, lastName, school, position FROM players
          WHERE firstName LIKE ?1 ESCAPE '\' OR lastName LIKE ?1 ESCAPE '\'
          LIMIT ?2",
    )
    .bind(&pattern)
    .bind(MAX_SEARCH_RESULTS)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PlayerMatch {
            first_name: row.get("firstName"),
            last_name: row.get("lastName"),
            school: row.get("school"),
            position: row.get("position"),
        })
        .collect())
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn player_from_row(row: &SqliteRow) -> Player {
    Player {
        id: row.get("id"),
        first_name: row.get("firstName"),
        last_name: row.get("lastName"),
        school: row.get("school"),
        grad_year: row.get("gradYear"),
        state: row.get("state"),
        height: row.get("height"),
        weight: row.get("weight"),
        commitment: row.get("commitment"),
        bat_hand: row.get("batHand"),
        throw_hand: row.get("throwHand"),
        position: row.get("position"),
        created_at: row.get("createdAt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrate};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("scout.sqlite"))
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        (tmp, pool)
    }

    fn player(first: &str, last: &str, school: &str) -> NewPlayer {
        NewPlayer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            school: school.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_player_requires_name_and_school() {
        let (_tmp, pool) = setup().await;

        let err = add_player(&pool, &player("A", "", "")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("lastName"));

        let err = add_player(&pool, &player("A", "B", "  ")).await.unwrap_err();
        assert!(err.is_validation());

        assert!(list_players(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_player_defaults_optional_fields() {
        let (_tmp, pool) = setup().await;

        let id = add_player(&pool, &player("Ava", "Lind", "North HS"))
            .await
            .unwrap();
        assert!(id > 0);

        let players = list_players(&pool).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].position.as_deref(), Some(""));
        assert!(players[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_list_players_sorted_by_last_then_first() {
        let (_tmp, pool) = setup().await;
        for (f, l) in [("Zed", "Adams"), ("Amy", "Young"), ("Bea", "Adams")] {
            add_player(&pool, &player(f, l, "X")).await.unwrap();
        }

        let names: Vec<String> = list_players(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| format!("{} {}", p.first_name.unwrap(), p.last_name.unwrap()))
            .collect();
        assert_eq!(names, vec!["Bea Adams", "Zed Adams", "Amy Young"]);
    }

    #[tokio::test]
    async fn test_search_short_query_skips_store() {
        let (_tmp, pool) = setup().await;
        pool.close().await;

        // A closed pool would fail any query.
        assert!(search_players(&pool, "a").await.unwrap().is_empty());
        assert!(search_players(&pool, "").await.unwrap().is_empty());
        assert!(search_players(&pool, "ab").await.is_err());
    }

    #[tokio::test]
    async fn test_search_matches_either_name_case_insensitively() {
        let (_tmp, pool) = setup().await;
        add_player(&pool, &player("John", "Smith", "A")).await.unwrap();
        add_player(&pool, &player("Mike", "Jones", "B")).await.unwrap();
        add_player(&pool, &player("Ted", "Baker", "C")).await.unwrap();

        let hits = search_players(&pool, "jo").await.unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            let first = hit.first_name.clone().unwrap().to_lowercase();
            let last = hit.last_name.clone().unwrap().to_lowercase();
            assert!(first.contains("jo") || last.contains("jo"));
        }
    }

    #[tokio::test]
    async fn test_search_caps_results() {
        let (_tmp, pool) = setup().await;
        let batch: Vec<NewPlayer> = (0..30)
            .map(|i| player(&format!("Jo{}", i), "Doe", "Same HS"))
            .collect();
        let outcomes = insert_batch(&pool, &batch).await;
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let hits = search_players(&pool, "Jo").await.unwrap();
        assert_eq!(hits.len(), MAX_SEARCH_RESULTS as usize);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let (_tmp, pool) = setup().await;
        add_player(&pool, &player("Anna", "Bell", "A")).await.unwrap();
        add_player(&pool, &player("Al_x", "Gray", "B")).await.unwrap();

        assert!(search_players(&pool, "%%").await.unwrap().is_empty());
        let hits = search_players(&pool, "l_").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name.as_deref(), Some("Al_x"));
    }

    #[tokio::test]
    async fn test_insert_batch_isolates_failures() {
        let (_tmp, pool) = setup().await;
        sqlx::query(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON players WHEN NEW.firstName = 'BAD' \
             BEGIN SELECT RAISE(ABORT, 'rejected row'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let outcomes = insert_batch(
            &pool,
            &[player("A", "One", "S"), player("BAD", "Two", "S"), player("C", "Three", "S")],
        )
        .await;

        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].as_ref().unwrap_err().to_string().contains("rejected row"));
        assert!(outcomes[2].is_ok());
        assert_eq!(list_players(&pool).await.unwrap().len(), 2);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"a%b_c\d"), r"a\%b\_c\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
