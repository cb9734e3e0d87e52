//! Randomized test fixtures.
//!
//! A [`TestFixture`] is bound to one table and produces records that conform to
//! its schema: every column gets a value drawn from its type's randomizer, then
//! caller overrides are applied last (an override wins over the generated value
//! and may introduce fields outside the schema). The generator itself is
//! stateless; the save/remove helpers go through the bound table.

use crate::Record;
use crate::db::QueryOutcome;
use crate::db::params::SqlParam;
use crate::error::{DbError, DbResult};
use crate::table::Table;
use crate::types::ColumnType;
use chrono::Local;
use rand::Rng;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Alphabet for random character data.
const CHARACTERS: &str = "abcdefghijklmnopqrstuvwxyz!@#$%^&*() ";

/// Schema-driven random record generator for one table.
#[derive(Debug, Clone)]
pub struct TestFixture {
    table: Arc<Table>,
}

impl TestFixture {
    /// Bind a fixture generator to a table.
    pub fn new(table: Arc<Table>) -> Self {
        Self { table }
    }

    fn create_record(&self) -> Record {
        self.table
            .schema()
            .columns()
            .iter()
            .map(|column| {
                (
                    column.external_name.clone(),
                    random_value(column.column_type),
                )
            })
            .collect()
    }

    /// Generate one record, with overrides applied last.
    pub fn generate_one(&self, overrides: &Record) -> Record {
        let mut record = self.create_record();
        for (key, value) in overrides {
            record.insert(key.clone(), value.clone());
        }
        record
    }

    /// Generate `amount` independent records, each with overrides applied last.
    pub fn generate_many(&self, amount: usize, overrides: &Record) -> Vec<Record> {
        (0..amount).map(|_| self.generate_one(overrides)).collect()
    }

    /// Generate one record and insert it; returns the record itself.
    pub async fn generate_and_save_one(&self, overrides: &Record) -> DbResult<Record> {
        let record = self.generate_one(overrides);
        self.table.insert(&record).await?;
        Ok(record)
    }

    /// Generate `amount` records and insert them in one batch; returns the records.
    pub async fn generate_and_save_many(
        &self,
        amount: usize,
        overrides: &Record,
    ) -> DbResult<Vec<Record>> {
        let records = self.generate_many(amount, overrides);
        self.table.insert_many(&records).await?;
        Ok(records)
    }

    /// Delete rows where `column` equals `value`.
    pub async fn remove_one(&self, column: &str, value: SqlParam) -> DbResult<QueryOutcome> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", self.table.name(), column);
        self.table.query(&sql, &[value]).await
    }

    /// Delete rows where `column` is one of `values`.
    pub async fn remove_many(
        &self,
        column: &str,
        values: Vec<SqlParam>,
    ) -> DbResult<QueryOutcome> {
        if values.is_empty() {
            return Err(DbError::precondition(
                "remove_many requires at least one value",
            ));
        }

        let placeholders = (1..=values.len())
            .map(|n| format!("${}", n))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE {} in ({})",
            self.table.name(),
            column,
            placeholders
        );
        self.table.query(&sql, &values).await
    }

    /// Delete every row in the table.
    pub async fn remove_all(&self) -> DbResult<QueryOutcome> {
        let sql = format!("DELETE FROM {}", self.table.name());
        self.table.query(&sql, &[]).await
    }
}

/// Draw a random value for a column type.
///
/// Ranges: bigint in [10000, 1000000]; integer in [0, 1000]; double precision in
/// [0, 5000] (trimmed to 4 decimal places); character is one alphabet char;
/// character varying is an alphabet string of length [5, 50]; date is today,
/// date-only, so round-tripped values compare equal.
fn random_value(column_type: ColumnType) -> JsonValue {
    let mut rng = rand::thread_rng();

    match column_type {
        ColumnType::BigInt => JsonValue::from(rng.gen_range(10_000i64..=1_000_000)),
        ColumnType::Integer => JsonValue::from(rng.gen_range(0i64..=1_000)),
        ColumnType::Boolean => JsonValue::from(rng.gen_bool(0.5)),
        ColumnType::DoublePrecision => {
            let value: f64 = rng.gen_range(0.0..5_000.0);
            JsonValue::from((value * 10_000.0).round() / 10_000.0)
        }
        ColumnType::Date => {
            JsonValue::from(Local::now().date_naive().format("%Y-%m-%d").to_string())
        }
        ColumnType::Character => JsonValue::from(random_characters(1)),
        ColumnType::CharacterVarying => {
            let length = rng.gen_range(5..=50);
            JsonValue::from(random_characters(length))
        }
    }
}

fn random_characters(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let alphabet = CHARACTERS.as_bytes();

    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> TestFixture {
        let table = Table::new(
            "games",
            &json!({
                "title": "character varying",
                "homeId": "bigint",
                "score": "integer",
                "ratio": "double precision",
                "playedOn": "date",
                "finished": "boolean",
                "grade": "character",
            }),
        )
        .unwrap();
        TestFixture::new(Arc::new(table))
    }

    #[test]
    fn test_generated_record_validates() {
        let fixture = fixture();
        let record = fixture.generate_one(&Record::new());
        assert!(fixture.table.validate(&record));
    }

    #[test]
    fn test_randomizer_ranges() {
        let fixture = fixture();
        for _ in 0..50 {
            let record = fixture.generate_one(&Record::new());

            let home_id = record["homeId"].as_i64().unwrap();
            assert!((10_000..=1_000_000).contains(&home_id));

            let score = record["score"].as_i64().unwrap();
            assert!((0..=1_000).contains(&score));

            let ratio = record["ratio"].as_f64().unwrap();
            assert!((0.0..=5_000.0).contains(&ratio));

            assert_eq!(record["grade"].as_str().unwrap().chars().count(), 1);

            let title_len = record["title"].as_str().unwrap().chars().count();
            assert!((5..=50).contains(&title_len));
        }
    }

    #[test]
    fn test_override_wins_and_extends() {
        let fixture = fixture();
        let overrides = json!({"homeId": 42, "extra": "kept"});
        let record = fixture.generate_one(overrides.as_object().unwrap());

        assert_eq!(record["homeId"], json!(42));
        assert_eq!(record["extra"], json!("kept"));
        assert!(record.contains_key("title"));
    }

    #[test]
    fn test_generate_many_length_and_overrides() {
        let fixture = fixture();
        let overrides = json!({"finished": true});
        let records = fixture.generate_many(3, overrides.as_object().unwrap());

        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record["finished"], json!(true));
        }

        assert!(fixture.generate_many(0, &Record::new()).is_empty());
    }

    #[tokio::test]
    async fn test_remove_many_requires_values() {
        let err = fixture().remove_many("id", vec![]).await.unwrap_err();
        assert!(err.is_precondition());
    }
}
