//! Feature matrix encoder
//!
//! Turns enriched rows into the exact numeric column layout the classifier
//! was trained on. Training and inference share this one code path; the
//! canonical column list frozen at training time is the single mechanism
//! that keeps the classifier input fixed-shape no matter which categories
//! happen to appear in a live batch.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chamber::{BehavioralFeatures, Bloc, EnrichedVote};
use crate::errors::{EngineError, EngineResult};

/// Numeric column carrying the deputy's age verbatim
pub const AGE_COLUMN: &str = "age";

/// The four behavioral rate columns, in their fixed order
pub const RATE_COLUMNS: [&str; 4] = [
    "deputy_yes_rate",
    "session_party_yes_rate",
    "region_yes_rate",
    "session_bloc_yes_rate",
];

/// Age bands, right-closed: (lo, hi] with the label used in column names.
/// Ages above the last band produce no band column at all.
const AGE_BANDS: [(u32, u32, &str); 5] = [
    (0, 30, "18-30"),
    (30, 40, "31-40"),
    (40, 50, "41-50"),
    (50, 60, "51-60"),
    (60, 100, "60+"),
];

fn age_band(age: u32) -> Option<&'static str> {
    AGE_BANDS
        .iter()
        .find(|(lo, hi, _)| age > *lo && age <= *hi)
        .map(|(_, _, label)| *label)
}

/// One row of raw encoder input: the categorical and numeric attributes a
/// prediction needs, independent of whether a real vote exists for it
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub party: String,
    pub bloc: Bloc,
    pub region: String,
    pub education: String,
    pub age: u32,
    pub behavioral: BehavioralFeatures,
}

impl From<&EnrichedVote> for FeatureRow {
    fn from(row: &EnrichedVote) -> Self {
        Self {
            party: row.party.clone(),
            bloc: row.bloc,
            region: row.region.clone(),
            education: row.education.clone(),
            age: row.age,
            behavioral: row.behavioral,
        }
    }
}

impl FeatureRow {
    /// The one-hot columns this row turns on, before any alignment.
    /// Every observed category emits a dummy; the training-time reference
    /// category disappears at reindex because it is not in the canonical
    /// list.
    fn dummy_columns(&self) -> Vec<String> {
        let mut columns = vec![
            format!("party_{}", self.party),
            format!("bloc_{}", self.bloc.as_str()),
            format!("region_{}", self.region),
            format!("education_{}", self.education),
        ];
        if let Some(band) = age_band(self.age) {
            columns.push(format!("age_band_{}", band));
        }
        columns
    }

    fn require_fields(&self) -> EngineResult<()> {
        if self.party.trim().is_empty() {
            return Err(EngineError::shape("row is missing its party code"));
        }
        if self.region.trim().is_empty() {
            return Err(EngineError::shape("row is missing its region code"));
        }
        if self.education.trim().is_empty() {
            return Err(EngineError::shape("row is missing its education level"));
        }
        if self.age == 0 {
            return Err(EngineError::shape("row is missing its age"));
        }
        Ok(())
    }

    fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            AGE_COLUMN => Some(self.age as f64),
            "deputy_yes_rate" => Some(self.behavioral.deputy_yes_rate),
            "session_party_yes_rate" => Some(self.behavioral.session_party_yes_rate),
            "region_yes_rate" => Some(self.behavioral.region_yes_rate),
            "session_bloc_yes_rate" => Some(self.behavioral.session_bloc_yes_rate),
            _ => None,
        }
    }
}

/// A classifier-ready fixed-width numeric matrix
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Alignment audit for one encode call. The unseen-category zero-fill rule
/// never raises an error, so drift between live data and the trained
/// schema is counted here instead of passing through invisibly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeAudit {
    /// Canonical columns absent from this batch, inserted as all-zero
    pub zero_filled: usize,
    /// Columns produced by this batch but unknown to the trained schema,
    /// dropped at alignment
    pub dropped: usize,
}

/// Encoder holding the canonical, trained-time-persisted column list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEncoder {
    canonical_columns: Vec<String>,
}

impl FeatureEncoder {
    /// Derive the canonical column list from the full training batch:
    /// one-hot party, bloc, region, education (sorted categories, first
    /// dropped as the reference), then age and the behavioral rates, then
    /// one-hot age bands with the lowest band dropped.
    pub fn fit(rows: &[FeatureRow]) -> EngineResult<Self> {
        if rows.is_empty() {
            return Err(EngineError::shape(
                "cannot derive feature columns from an empty training table",
            ));
        }
        for row in rows {
            row.require_fields()?;
        }

        let mut parties = BTreeSet::new();
        let mut blocs = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut educations = BTreeSet::new();
        let mut bands = BTreeSet::new();

        for row in rows {
            parties.insert(row.party.clone());
            blocs.insert(row.bloc.as_str().to_string());
            regions.insert(row.region.clone());
            educations.insert(row.education.clone());
            if let Some(band) = age_band(row.age) {
                bands.insert(band.to_string());
            }
        }

        let mut columns = Vec::new();
        for (prefix, values) in [
            ("party", &parties),
            ("bloc", &blocs),
            ("region", &regions),
            ("education", &educations),
        ] {
            // Sorted-first category is the implicit reference; it gets no
            // column and must never be re-derived from a live sample
            for value in values.iter().skip(1) {
                columns.push(format!("{}_{}", prefix, value));
            }
        }

        columns.push(AGE_COLUMN.to_string());
        columns.extend(RATE_COLUMNS.iter().map(|c| c.to_string()));

        for band in bands.iter().skip(1) {
            columns.push(format!("age_band_{}", band));
        }

        Ok(Self {
            canonical_columns: columns,
        })
    }

    /// Rebuild an encoder around a persisted canonical column list
    pub fn from_columns(canonical_columns: Vec<String>) -> Self {
        Self { canonical_columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.canonical_columns
    }

    pub fn n_features(&self) -> usize {
        self.canonical_columns.len()
    }

    /// Encode a batch against the canonical column list. The output always
    /// has exactly the canonical shape: canonical columns missing from the
    /// batch are zero-filled, batch columns unknown to the trained schema
    /// are dropped, and both counts are reported in the audit.
    pub fn encode(&self, rows: &[FeatureRow]) -> EngineResult<(FeatureMatrix, EncodeAudit)> {
        for row in rows {
            row.require_fields()?;
        }

        let canonical: HashSet<&str> =
            self.canonical_columns.iter().map(|c| c.as_str()).collect();
        let mut emitted: HashSet<String> = HashSet::new();

        let mut matrix_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let dummies = row.dummy_columns();
            for dummy in &dummies {
                emitted.insert(dummy.clone());
            }

            let dummy_set: HashSet<&str> = dummies.iter().map(|d| d.as_str()).collect();
            let values: Vec<f64> = self
                .canonical_columns
                .iter()
                .map(|column| {
                    if let Some(value) = row.numeric_value(column) {
                        value
                    } else if dummy_set.contains(column.as_str()) {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();
            matrix_rows.push(values);
        }

        emitted.insert(AGE_COLUMN.to_string());
        emitted.extend(RATE_COLUMNS.iter().map(|c| c.to_string()));

        let zero_filled = self
            .canonical_columns
            .iter()
            .filter(|c| !emitted.contains(c.as_str()))
            .count();
        let dropped = emitted
            .iter()
            .filter(|c| !canonical.contains(c.as_str()))
            .count();
        let audit = EncodeAudit {
            zero_filled,
            dropped,
        };

        if audit.dropped > 0 {
            warn!(
                dropped = audit.dropped,
                rows = rows.len(),
                "encode batch produced categories unseen at training time; their columns were dropped"
            );
        }
        if audit.zero_filled > 0 {
            debug!(
                zero_filled = audit.zero_filled,
                rows = rows.len(),
                "canonical columns absent from batch were zero-filled"
            );
        }

        Ok((
            FeatureMatrix {
                columns: self.canonical_columns.clone(),
                rows: matrix_rows,
            },
            audit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(party: &str, bloc: Bloc, region: &str, education: &str, age: u32) -> FeatureRow {
        FeatureRow {
            party: party.to_string(),
            bloc,
            region: region.to_string(),
            education: education.to_string(),
            age,
            behavioral: BehavioralFeatures {
                deputy_yes_rate: 0.8,
                session_party_yes_rate: 0.6,
                region_yes_rate: 0.7,
                session_bloc_yes_rate: 0.9,
            },
        }
    }

    fn training_rows() -> Vec<FeatureRow> {
        vec![
            row("PT", Bloc::Government, "SP", "Superior", 45),
            row("PL", Bloc::Opposition, "RJ", "Mestrado", 38),
            row("PSDB", Bloc::Independent, "MG", "Superior", 62),
        ]
    }

    #[test]
    fn test_age_band_boundaries_are_right_closed() {
        assert_eq!(age_band(30), Some("18-30"));
        assert_eq!(age_band(31), Some("31-40"));
        assert_eq!(age_band(40), Some("31-40"));
        assert_eq!(age_band(60), Some("51-60"));
        assert_eq!(age_band(61), Some("60+"));
        assert_eq!(age_band(100), Some("60+"));
        assert_eq!(age_band(101), None);
    }

    #[test]
    fn test_fit_drops_reference_categories() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let columns = encoder.columns();
        // Sorted-first of {PL, PSDB, PT} is PL: the reference, no column
        assert!(!columns.contains(&"party_PL".to_string()));
        assert!(columns.contains(&"party_PSDB".to_string()));
        assert!(columns.contains(&"party_PT".to_string()));
        // Sorted-first bloc is Government
        assert!(!columns.contains(&"bloc_Government".to_string()));
        assert!(columns.contains(&"bloc_Opposition".to_string()));
        // Lowest observed age band (31-40) is the band reference
        assert!(!columns.contains(&"age_band_31-40".to_string()));
        assert!(columns.contains(&"age_band_41-50".to_string()));
    }

    #[test]
    fn test_fit_column_order_is_stable() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let columns = encoder.columns();
        let age_pos = columns.iter().position(|c| c == AGE_COLUMN).expect("age");
        // Categorical dummies come first, then age, then the rates
        assert!(columns[..age_pos].iter().all(|c| {
            c.starts_with("party_")
                || c.starts_with("bloc_")
                || c.starts_with("region_")
                || c.starts_with("education_")
        }));
        let rates: Vec<&str> = columns[age_pos + 1..age_pos + 5]
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(rates, RATE_COLUMNS.to_vec());
    }

    #[test]
    fn test_round_trip_against_own_canonical_list() {
        let rows = training_rows();
        let encoder = FeatureEncoder::fit(&rows).expect("fit");
        let (matrix, audit) = encoder.encode(&rows).expect("encode");

        assert_eq!(matrix.columns, encoder.columns());
        assert_eq!(matrix.n_rows(), rows.len());
        // Encoding the training batch drops only the reference categories,
        // which is not schema drift
        assert_eq!(audit.zero_filled, 0);

        let pt = matrix.column_index("party_PT").expect("column");
        assert_eq!(matrix.rows[0][pt], 1.0);
        assert_eq!(matrix.rows[1][pt], 0.0);
        let age = matrix.column_index(AGE_COLUMN).expect("column");
        assert_eq!(matrix.rows[0][age], 45.0);
        let rate = matrix.column_index("deputy_yes_rate").expect("column");
        assert_eq!(matrix.rows[0][rate], 0.8);
    }

    #[test]
    fn test_reindex_contract_zero_fills_missing_columns() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let n = encoder.n_features();

        // A live batch with one party only: a strict subset of the
        // canonical dummies
        let live = vec![row("PT", Bloc::Government, "SP", "Superior", 45)];
        let (matrix, audit) = encoder.encode(&live).expect("encode");

        assert_eq!(matrix.n_columns(), n);
        assert!(audit.zero_filled > 0);
        let psdb = matrix.column_index("party_PSDB").expect("column");
        assert_eq!(matrix.rows[0][psdb], 0.0);
        let rj = matrix.column_index("region_RJ").expect("column");
        assert_eq!(matrix.rows[0][rj], 0.0);
    }

    #[test]
    fn test_unseen_category_is_dropped_and_audited() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let live = vec![row("XPTO", Bloc::Independent, "SP", "Superior", 45)];
        let (matrix, audit) = encoder.encode(&live).expect("encode");

        // No error: the unknown party contributes nothing, and every
        // canonical party dummy stays zero
        assert!(audit.dropped >= 1);
        assert!(matrix.column_index("party_XPTO").is_none());
        let pt = matrix.column_index("party_PT").expect("column");
        assert_eq!(matrix.rows[0][pt], 0.0);
    }

    #[test]
    fn test_missing_required_field_is_a_shape_error() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let mut bad = row("PT", Bloc::Government, "SP", "Superior", 45);
        bad.education = String::new();
        let err = encoder.encode(&[bad]).expect_err("must fail");
        assert!(matches!(err, EngineError::Shape(_)));
    }

    #[test]
    fn test_fit_on_empty_table_fails() {
        assert!(FeatureEncoder::fit(&[]).is_err());
    }

    #[test]
    fn test_persisted_columns_rebuild_identical_encoder() {
        let encoder = FeatureEncoder::fit(&training_rows()).expect("fit");
        let rebuilt = FeatureEncoder::from_columns(encoder.columns().to_vec());
        let live = vec![row("PT", Bloc::Government, "SP", "Superior", 45)];
        let (a, _) = encoder.encode(&live).expect("encode");
        let (b, _) = rebuilt.encode(&live).expect("encode");
        assert_eq!(a.columns, b.columns);
        assert_eq!(a.rows, b.rows);
    }
}
