use super::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status message returned when a create body does not carry every column
pub const CREATE_SCHEMA_HINT: &str = "review creation unsuccessful, please check that JSON contains Country(Text), Brand(Text), Type(Text), Package(Text), Rating(Real)";

/// Status message returned when an update body carries a mistyped column
pub const UPDATE_SCHEMA_HINT: &str = "update unsuccessful, Country, Brand, Type and Package must be text and Rating must be a number";

/// A stored ramen review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
}

/// A review that has not been assigned an ID yet.
///
/// Also the row shape of the seed CSV, so the header names double as
/// column names there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewReview {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
}

/// The writable columns of the `Reviews` table.
///
/// Column names in SQL text only ever come from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    Country,
    Brand,
    Type,
    Package,
    Rating,
}

impl ReviewField {
    pub const ALL: [ReviewField; 5] = [
        ReviewField::Country,
        ReviewField::Brand,
        ReviewField::Type,
        ReviewField::Package,
        ReviewField::Rating,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ReviewField::Country => "Country",
            ReviewField::Brand => "Brand",
            ReviewField::Type => "Type",
            ReviewField::Package => "Package",
            ReviewField::Rating => "Rating",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == key)
    }
}

impl NewReview {
    /// Build a review from a JSON object, requiring all five columns
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let map = value.as_object().ok_or_else(create_validation_error)?;

        Ok(Self {
            country: required_text(map, ReviewField::Country)?,
            brand: required_text(map, ReviewField::Brand)?,
            kind: required_text(map, ReviewField::Type)?,
            package: required_text(map, ReviewField::Package)?,
            rating: map
                .get(ReviewField::Rating.column())
                .and_then(Value::as_f64)
                .ok_or_else(create_validation_error)?,
        })
    }
}

fn required_text(map: &Map<String, Value>, field: ReviewField) -> StoreResult<String> {
    map.get(field.column())
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(create_validation_error)
}

fn create_validation_error() -> StoreError {
    StoreError::Validation(CREATE_SCHEMA_HINT.to_string())
}

/// A partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub country: Option<String>,
    pub brand: Option<String>,
    pub kind: Option<String>,
    pub package: Option<String>,
    pub rating: Option<f64>,
}

impl ReviewPatch {
    /// Collect the recognized columns of a JSON object; other keys are ignored
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| StoreError::Validation(UPDATE_SCHEMA_HINT.to_string()))?;

        let mut patch = Self::default();
        for (key, value) in map {
            let Some(field) = ReviewField::from_key(key) else {
                continue;
            };

            let mistyped = || StoreError::Validation(UPDATE_SCHEMA_HINT.to_string());
            let text = || value.as_str().map(str::to_owned).ok_or_else(mistyped);
            match field {
                ReviewField::Country => patch.country = Some(text()?),
                ReviewField::Brand => patch.brand = Some(text()?),
                ReviewField::Type => patch.kind = Some(text()?),
                ReviewField::Package => patch.package = Some(text()?),
                ReviewField::Rating => patch.rating = Some(value.as_f64().ok_or_else(mistyped)?),
            }
        }

        Ok(patch)
    }

    /// Column/value pairs to write, in table column order
    pub fn assignments(&self) -> Vec<(ReviewField, rusqlite::types::Value)> {
        use rusqlite::types::Value as SqlValue;

        let mut assignments = Vec::new();
        let text_columns = [
            (ReviewField::Country, &self.country),
            (ReviewField::Brand, &self.brand),
            (ReviewField::Type, &self.kind),
            (ReviewField::Package, &self.package),
        ];
        for (field, value) in text_columns {
            if let Some(text) = value {
                assignments.push((field, SqlValue::Text(text.clone())));
            }
        }
        if let Some(rating) = self.rating {
            assignments.push((ReviewField::Rating, SqlValue::Real(rating)));
        }
        assignments
    }
}
