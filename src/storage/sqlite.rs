use super::error::{StoreError, StoreResult};
use super::review::{NewReview, Review, ReviewPatch};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params, Row};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS Reviews(
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Country TEXT NOT NULL,
    Brand TEXT NOT NULL,
    Type TEXT NOT NULL,
    Package TEXT NOT NULL,
    Rating REAL NOT NULL
);";

const REVIEW_SELECT_SQL: &str = "SELECT ID, Country, Brand, Type, Package, Rating FROM Reviews";

const INSERT_REVIEW_SQL: &str =
    "INSERT INTO Reviews (Country, Brand, Type, Package, Rating) VALUES (?1, ?2, ?3, ?4, ?5)";

/// SQLite-backed review store.
///
/// Holds only the database path. Every operation opens its own connection
/// and drops it before returning, so no connection outlives a call.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    path: PathBuf,
}

impl ReviewStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Create the `Reviews` table if it does not exist yet
    pub fn initialize(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(CREATE_TABLE_SQL)?;
        info!(path = ?self.path, "Review table ready");
        Ok(())
    }

    /// Drop the table, recreate it and insert `reviews`, all in one transaction
    pub fn replace_all(&self, reviews: &[NewReview]) -> StoreResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute_batch("DROP TABLE IF EXISTS Reviews;")?;
        tx.execute_batch(CREATE_TABLE_SQL)?;
        {
            let mut stmt = tx.prepare(INSERT_REVIEW_SQL)?;
            for review in reviews {
                stmt.execute(params![
                    review.country,
                    review.brand,
                    review.kind,
                    review.package,
                    review.rating,
                ])?;
            }
        }
        tx.commit()?;

        Ok(reviews.len())
    }

    /// Validate a JSON body and insert it as a new review
    pub fn create_review(&self, fields: &Value) -> StoreResult<Review> {
        let review = NewReview::from_json(fields)?;
        self.insert_review(&review)
    }

    /// Insert a review and read it back by the ID SQLite assigned
    pub fn insert_review(&self, review: &NewReview) -> StoreResult<Review> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            INSERT_REVIEW_SQL,
            params![
                review.country,
                review.brand,
                review.kind,
                review.package,
                review.rating,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = fetch_review(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.commit()?;

        debug!(id, "Inserted review");
        Ok(created)
    }

    pub fn get_all_reviews(&self) -> StoreResult<Vec<Review>> {
        let conn = self.connect()?;
        query_reviews(&conn, &format!("{REVIEW_SELECT_SQL} ORDER BY ID"), [])
    }

    pub fn get_review(&self, id: i64) -> StoreResult<Review> {
        let conn = self.connect()?;
        fetch_review(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    /// Validate a partial JSON body and apply it to review `id`
    ///
    /// An unknown ID is reported as `NotFound` even when the body is invalid.
    pub fn update_review(&self, id: i64, fields: &Value) -> StoreResult<Review> {
        let patch = match ReviewPatch::from_json(fields) {
            Ok(patch) => patch,
            Err(err) => {
                self.get_review(id)?;
                return Err(err);
            }
        };
        self.apply_patch(id, &patch)
    }

    /// Apply every column of `patch` in a single statement, then read the row back
    pub fn apply_patch(&self, id: i64, patch: &ReviewPatch) -> StoreResult<Review> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let assignments = patch.assignments();
        if !assignments.is_empty() {
            let set_clause = assignments
                .iter()
                .enumerate()
                .map(|(i, (field, _))| format!("{} = ?{}", field.column(), i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE Reviews SET {set_clause} WHERE ID = ?{}",
                assignments.len() + 1
            );

            let values = assignments
                .into_iter()
                .map(|(_, value)| value)
                .chain(std::iter::once(SqlValue::Integer(id)));

            let changed = tx.execute(&sql, params_from_iter(values))?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
        }

        let updated = fetch_review(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.commit()?;

        debug!(id, "Updated review");
        Ok(updated)
    }

    /// Delete review `id`; a missing row is reported as `NotFound`
    pub fn delete_review(&self, id: i64) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let changed = tx.execute("DELETE FROM Reviews WHERE ID = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;

        debug!(id, "Deleted review");
        Ok(())
    }

    /// Reviews whose country equals `country` exactly
    pub fn filter_by_country(&self, country: &str) -> StoreResult<Vec<Review>> {
        let conn = self.connect()?;
        query_reviews(
            &conn,
            &format!("{REVIEW_SELECT_SQL} WHERE Country = ?1 ORDER BY ID"),
            params![country],
        )
    }

    /// Reviews whose type contains `text`, using SQLite's `LIKE` case rules
    pub fn search_by_partial_type(&self, text: &str) -> StoreResult<Vec<Review>> {
        let conn = self.connect()?;
        let pattern = format!("%{}%", escape_like(text));
        query_reviews(
            &conn,
            &format!("{REVIEW_SELECT_SQL} WHERE Type LIKE ?1 ESCAPE '\\' ORDER BY ID"),
            params![pattern],
        )
    }

    pub fn count_reviews(&self) -> StoreResult<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Reviews", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn fetch_review(conn: &Connection, id: i64) -> StoreResult<Option<Review>> {
    let review = conn
        .query_row(
            &format!("{REVIEW_SELECT_SQL} WHERE ID = ?1"),
            params![id],
            parse_review_row,
        )
        .optional()?;
    Ok(review)
}

fn query_reviews<P: Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<Review>> {
    let mut stmt = conn.prepare(sql)?;
    let reviews = stmt
        .query_map(params, parse_review_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reviews)
}

fn parse_review_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        country: row.get(1)?,
        brand: row.get(2)?,
        kind: row.get(3)?,
        package: row.get(4)?,
        rating: row.get(5)?,
    })
}

/// Escape `LIKE` wildcards so user text only ever matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn wai_wai() -> NewReview {
        NewReview {
            country: "Thailand".into(),
            brand: "Wai Wai".into(),
            kind: "Pack".into(),
            package: "Bag".into(),
            rating: 5.0,
        }
    }

    fn seeded_store(rows: &[NewReview]) -> (TempDir, ReviewStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::new(dir.path().join("reviews.db"));
        store.replace_all(rows).unwrap();
        (dir, store)
    }

    #[test]
    fn create_then_get_returns_submitted_fields() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let created = store
            .create_review(&json!({
                "Country": "USA",
                "Brand": "X",
                "Type": "Cup",
                "Package": "Box",
                "Rating": 3.5
            }))
            .unwrap();

        assert_eq!(created.id, 2);
        assert_eq!(created.country, "USA");
        assert_eq!(created.brand, "X");
        assert_eq!(created.kind, "Cup");
        assert_eq!(created.package, "Box");
        assert_eq!(created.rating, 3.5);
        assert_eq!(store.get_review(created.id).unwrap(), created);
    }

    #[test]
    fn create_with_missing_field_is_validation_error() {
        let (_dir, store) = seeded_store(&[]);
        let result = store.create_review(&json!({"Country": "USA"}));
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.count_reviews().unwrap(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, store) = seeded_store(&[wai_wai(), wai_wai()]);
        store.delete_review(2).unwrap();

        let created = store.insert_review(&wai_wai()).unwrap();
        assert_eq!(created.id, 3);
    }

    #[test]
    fn get_all_is_in_insertion_order() {
        let mut second = wai_wai();
        second.brand = "Mama".into();
        let (_dir, store) = seeded_store(&[wai_wai(), second]);

        let all = store.get_all_reviews().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].brand, "Wai Wai");
        assert_eq!(all[1].brand, "Mama");
        assert!(all[0].id < all[1].id);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_dir, store) = seeded_store(&[]);
        assert!(store.get_all_reviews().unwrap().is_empty());
    }

    #[test]
    fn missing_id_is_not_found_everywhere() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        assert!(matches!(store.get_review(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.update_review(42, &json!({"Rating": 1.0})),
            Err(StoreError::NotFound(42))
        ));
        assert!(matches!(store.delete_review(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.update_review(42, &json!({})),
            Err(StoreError::NotFound(42))
        ));
    }

    #[test]
    fn partial_update_changes_only_given_fields() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let updated = store.update_review(1, &json!({"Rating": 4.5})).unwrap();
        assert_eq!(updated.rating, 4.5);
        assert_eq!(updated.country, "Thailand");
        assert_eq!(updated.brand, "Wai Wai");
        assert_eq!(updated.kind, "Pack");
        assert_eq!(updated.package, "Bag");
    }

    #[test]
    fn update_applies_several_fields_and_ignores_unknown_keys() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let updated = store
            .update_review(1, &json!({"Brand": "Mama", "Package": "Cup", "Variety": "Tom Yum"}))
            .unwrap();
        assert_eq!(updated.brand, "Mama");
        assert_eq!(updated.package, "Cup");
        assert_eq!(updated.rating, 5.0);
    }

    #[test]
    fn mistyped_update_writes_nothing() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let result = store.update_review(1, &json!({"Brand": "Mama", "Rating": "high"}));
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.get_review(1).unwrap().brand, "Wai Wai");
    }

    #[test]
    fn delete_twice_reports_not_found_the_second_time() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        store.delete_review(1).unwrap();
        assert!(matches!(store.get_review(1), Err(StoreError::NotFound(1))));
        assert!(matches!(store.delete_review(1), Err(StoreError::NotFound(1))));
        assert!(matches!(store.delete_review(1), Err(StoreError::NotFound(1))));
    }

    #[test]
    fn filter_by_country_matches_exactly() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let thai = store.filter_by_country("Thailand").unwrap();
        assert_eq!(thai.len(), 1);
        assert_eq!(thai[0].brand, "Wai Wai");

        assert!(store.filter_by_country("Japan").unwrap().is_empty());
        assert!(store.filter_by_country("Thai").unwrap().is_empty());
    }

    #[test]
    fn search_matches_substring_of_type() {
        let mut bowl = wai_wai();
        bowl.kind = "Big Bowl".into();
        let (_dir, store) = seeded_store(&[wai_wai(), bowl]);

        let found = store.search_by_partial_type("Bow").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "Big Bowl");

        assert_eq!(store.search_by_partial_type("").unwrap().len(), 2);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let (_dir, store) = seeded_store(&[wai_wai()]);
        assert!(store.search_by_partial_type("%").unwrap().is_empty());
        assert!(store.search_by_partial_type("P_ck").unwrap().is_empty());
    }

    #[test]
    fn search_input_cannot_alter_schema() {
        let (_dir, store) = seeded_store(&[wai_wai()]);

        let found = store
            .search_by_partial_type("x'; DROP TABLE Reviews; --")
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(store.count_reviews().unwrap(), 1);
        assert_eq!(store.get_review(1).unwrap().brand, "Wai Wai");
    }

    #[test]
    fn initialize_keeps_existing_rows() {
        let (_dir, store) = seeded_store(&[wai_wai()]);
        store.initialize().unwrap();
        assert_eq!(store.count_reviews().unwrap(), 1);
    }

    #[test]
    fn mistyped_update_of_missing_id_is_not_found() {
        let (_dir, store) = seeded_store(&[wai_wai()]);
        assert!(matches!(
            store.update_review(42, &json!({"Rating": "x"})),
            Err(StoreError::NotFound(42))
        ));
    }

    #[test]
    fn concurrent_inserts_get_unique_ids() {
        let (_dir, store) = seeded_store(&[]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.insert_review(&wai_wai()).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 200);
        assert_eq!(store.count_reviews().unwrap(), 200);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Pack"), "Pack");
    }
}
