pub mod error;
pub mod review;
pub mod seed;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use review::{CREATE_SCHEMA_HINT, Review};
pub use sqlite::ReviewStore;
