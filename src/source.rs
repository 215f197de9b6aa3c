use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Client, ProgressRecord};

/// One row of a progress export. Client identity travels with every row.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRow {
    pub client_code: String,
    pub full_name: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub staff_id: Option<Uuid>,
    pub assessment_date: NaiveDate,
    pub progress_score: f64,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub quality_score: Option<i32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_key: Option<String>,
}

impl CsvRow {
    /// Rows without an explicit id get one derived from the client code, so
    /// repeated loads of the same file agree.
    pub fn resolved_client_id(&self) -> Uuid {
        self.client_id
            .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, self.client_code.as_bytes()))
    }
}

/// Clients in order of first appearance plus all their records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub clients: Vec<Client>,
    pub records: Vec<ProgressRecord>,
}

pub fn read_rows<R: Read>(reader: R) -> anyhow::Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let row = result.with_context(|| format!("invalid progress row at line {}", index + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn into_record_set(rows: Vec<CsvRow>) -> RecordSet {
    let mut set = RecordSet::default();
    let mut seen: HashMap<String, Uuid> = HashMap::new();

    for row in rows {
        let client_id = *seen.entry(row.client_code.clone()).or_insert_with(|| {
            let client_id = row.resolved_client_id();
            set.clients.push(Client {
                client_id,
                client_code: row.client_code.clone(),
                full_name: row.full_name.clone(),
            });
            client_id
        });

        set.records.push(ProgressRecord {
            client_id,
            staff_id: row.staff_id,
            assessment_date: row.assessment_date,
            progress_score: row.progress_score,
            sentiment_score: row.sentiment_score,
            quality_score: row.quality_score,
            notes: row.notes,
        });
    }

    set
}

pub fn load_csv(path: &Path) -> anyhow::Result<RecordSet> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let rows = read_rows(file).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(into_record_set(rows))
}
