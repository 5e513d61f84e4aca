use polars::prelude::*;

/// Column layout of cached auction records
pub struct AuctionSchema;

impl AuctionSchema {
    /// Get the canonical auction schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("cusip".into(), DataType::String),
            Field::new("security_type".into(), DataType::String),
            Field::new("issue_date".into(), DataType::Date),
            Field::new("original_issue_date".into(), DataType::Date),
            Field::new("maturity_date".into(), DataType::Date),
            Field::new("interest_rate".into(), DataType::Float64),
            Field::new("total_accepted".into(), DataType::Float64),
            Field::new("is_reopening".into(), DataType::Boolean),
            Field::new("is_inflation_indexed".into(), DataType::Boolean),
            Field::new("is_floating_rate".into(), DataType::Boolean),
            Field::new("announcement_date".into(), DataType::Date),
            Field::new("announced_cusip".into(), DataType::String),
            Field::new("auction_date".into(), DataType::Date),
        ])
    }

    /// Validate DataFrame against schema
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Structural problems in auction data, upstream or cached.
///
/// Identity and date fields never degrade to null: a missing or unparseable
/// value is one of these errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required field '{field}' (cusip {cusip})")]
    MissingField { field: &'static str, cusip: String },

    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
