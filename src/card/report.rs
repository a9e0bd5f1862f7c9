//! Cardinality probe reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use super::probe::{Bucket, ProbeMode};
use crate::metrics::Metrics;
use crate::table;

const HEADERS: [&str; 8] = ["Table", "Column", "Bucket", "<= 2", "<= 3", "<= 4", "> 4", "max q-error"];

/// Q-error samples by table, column and bucket.
#[derive(Debug, Clone, Serialize)]
pub struct CardinalityReport {
    pub session: Ulid,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    pub mode: ProbeMode,
    pub tables: BTreeMap<String, BTreeMap<String, BTreeMap<Bucket, Metrics>>>,
}

impl CardinalityReport {
    pub fn new(mode: ProbeMode) -> Self {
        Self {
            session: Ulid::new(),
            generated_at: Utc::now(),
            mode,
            tables: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, table: &str, column: &str, buckets: BTreeMap<Bucket, Metrics>) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), buckets);
    }

    /// One row per bucket with q-error counts in `(0,2]`, `(2,3]`, `(3,4]`
    /// and above 4.
    pub fn to_table(&self) -> String {
        let mut rows = Vec::new();
        for (table, columns) in &self.tables {
            for (column, buckets) in columns {
                for (bucket, metrics) in buckets {
                    let [c2, c3, c4, rest] = histogram(metrics.values());
                    rows.push(vec![
                        table.clone(),
                        column.clone(),
                        bucket.to_string(),
                        c2.to_string(),
                        c3.to_string(),
                        c4.to_string(),
                        rest.to_string(),
                        format!("{:.2}", metrics.quantile(1.0)),
                    ]);
                }
            }
        }
        table::render(&HEADERS, &rows)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn histogram(values: &[f64]) -> [usize; 4] {
    let mut counts = [0; 4];
    for &v in values {
        let slot = match v {
            v if v <= 2.0 => 0,
            v if v <= 3.0 => 1,
            v if v <= 4.0 => 2,
            _ => 3,
        };
        counts[slot] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_edges() {
        assert_eq!(histogram(&[1.0, 2.0, 2.5, 3.0, 4.0, 4.01, 100.0]), [2, 2, 1, 2]);
        assert_eq!(histogram(&[]), [0; 4]);
    }

    #[test]
    fn test_table_and_json() {
        let mut report = CardinalityReport::new(ProbeMode::Emq);
        report.insert(
            "t",
            "c",
            BTreeMap::from([
                (Bucket::All, Metrics::record(vec![1.0, 2.5, 10.0])),
                (Bucket::MostCommon, Metrics::record(vec![1.0])),
            ]),
        );

        let table = report.to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Table | Column | Bucket"));
        assert!(lines[2].starts_with("t     | c      | all"));
        assert!(lines[2].ends_with("10.00"));
        assert!(lines[3].contains("most_common_10%"));
        assert_eq!(lines[4], "(2 rows)");

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "emq");
        assert_eq!(json["tables"]["t"]["c"]["all"]["values"][2], 10.0);
        assert!(json["tables"]["t"]["c"]["most_common_10%"].is_object());
    }
}
