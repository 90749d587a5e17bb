//! Startup seeding of the `Reviews` table from a CSV file.

use super::error::{StoreError, StoreResult};
use super::review::{NewReview, ReviewField};
use super::sqlite::ReviewStore;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Replace the contents of `store` with the rows of the CSV file at `path`.
///
/// The whole file is parsed before the database is touched, so a missing or
/// malformed file leaves any existing table as it was.
pub fn load_seed(store: &ReviewStore, path: &Path) -> StoreResult<usize> {
    let started_at = Instant::now();
    info!(path = ?path, "Loading seed data");

    let reviews = match read_seed_file(path) {
        Ok(reviews) => reviews,
        Err(err) => {
            error!(path = ?path, error = %err, "Seed data rejected");
            return Err(err);
        }
    };

    let loaded = store.replace_all(&reviews)?;
    info!(
        loaded,
        duration_ms = started_at.elapsed().as_millis() as u64,
        "Seed data loaded"
    );
    Ok(loaded)
}

pub fn read_seed_file(path: &Path) -> StoreResult<Vec<NewReview>> {
    let file = std::fs::File::open(path).map_err(|err| {
        StoreError::Seed(format!("cannot open seed file {}: {}", path.display(), err))
    })?;
    read_seed(file)
}

/// Parse seed rows; extra columns are ignored, missing ones are an error
pub fn read_seed<R: Read>(source: R) -> StoreResult<Vec<NewReview>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader.headers()?.clone();
    for field in ReviewField::ALL {
        if !headers.iter().any(|header| header == field.column()) {
            return Err(StoreError::Seed(format!(
                "seed file is missing column {}",
                field.column()
            )));
        }
    }

    let mut reviews = Vec::new();
    for (n, row) in reader.deserialize::<NewReview>().enumerate() {
        let review = row?;
        if !review.rating.is_finite() {
            return Err(StoreError::Seed(format!(
                "row {}: Rating must be a finite number",
                n + 1
            )));
        }
        reviews.push(review);
    }
    Ok(reviews)
}
