//! Domain vocabulary used to recover title-block text on drawings.
//!
//! The built-in tables target piping and pressure-vessel drawings. A
//! deployment working with other document classes can replace them from
//! the `[vocabulary]` table of the config file.

use serde::{Deserialize, Serialize};

/// Compact (separator-free) tokens mapped to their spaced phrase.
/// Order matters: the first key found in a token wins.
pub const ENGINEERING_TOKEN_SPLITS: &[(&str, &str)] = &[
    ("DESIGNCODE", "DESIGN CODE"),
    ("DESIGNTEMP", "DESIGN TEMP"),
    ("DESIGNPRESS", "DESIGN PRESS"),
    ("OPERATINGPRESS", "OPERATING PRESS"),
    ("OPERATINGTEMP", "OPERATING TEMP"),
    ("HYDROTESTPRESS", "HYDRO TEST PRESS"),
    ("PNEUMTESTPRESS", "PNEUM TEST PRESS"),
    ("RADIOGRAPHICEXAM", "RADIOGRAPHIC EXAM"),
    ("JOINTEFFICIENCY", "JOINT EFFICIENCY"),
    ("CORROSIONALLOW", "CORROSION ALLOW"),
    ("INTERNALCOATING", "INTERNAL COATING"),
    ("EXTERNALPAINT", "EXTERNAL PAINT"),
    ("FIREPROOFING", "FIRE PROOFING"),
    ("ACIDPICKLING", "ACID PICKLING"),
    ("FLOWRATE", "FLOW RATE"),
    ("EMPTYWEIGHT", "EMPTY WEIGHT"),
    ("FULLWATERWEIGHT", "FULL WATER WEIGHT"),
];

/// Known OCR misreads in rescued text lines, applied in order.
pub const RESCUE_MISREADS: &[(&str, &str)] = &[
    ("RADIOGRAPHIC EAM", "RADIOGRAPHIC EXAM"),
    ("JOINTEFFICIENCY", "JOINT EFFICIENCY"),
    ("FIOINT EFFICIENCY", "JOINT EFFICIENCY"),
    ("FIREPROOFING", "FIRE PROOFING"),
    ("ACIDPICKLING", "ACID PICKLING"),
    ("PLCKLING", "PICKLING"),
    ("DESIGNTEMP", "DESIGN TEMP"),
    ("DESIGNCODE", "DESIGN CODE"),
];

/// Stems that mark a token as a design-table row label.
pub const DESIGN_TABLE_STEMS: &[&str] = &[
    "DESIGN", "STANDARD", "FLUID", "FLOW", "OPERAT", "HYDRO", "PNEUM", "RADIO", "JOINT",
    "CORROS", "INTERN", "EXTERN", "INSUL", "FIRE", "VOLUME", "EMPTY", "FULL", "WEIGHT", "PWHT",
    "TEMP", "PRESS",
];

/// Phrase tables driving token rejoining, misread repair and table labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub token_splits: Vec<(String, String)>,
    pub misreads: Vec<(String, String)>,
    pub table_stems: Vec<String>,
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            token_splits: owned_pairs(ENGINEERING_TOKEN_SPLITS),
            misreads: owned_pairs(RESCUE_MISREADS),
            table_stems: DESIGN_TABLE_STEMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Vocabulary {
    /// Phrase for the first split key contained in `compact`.
    pub fn split_phrase(&self, compact: &str) -> Option<&str> {
        self.token_splits
            .iter()
            .find(|(key, _)| !key.is_empty() && compact.contains(key.as_str()))
            .map(|(_, phrase)| phrase.as_str())
    }

    /// Apply every misread replacement to a line.
    pub fn repair_misreads(&self, line: &str) -> String {
        let mut fixed = line.to_string();
        for (source, replacement) in &self.misreads {
            if !source.is_empty() {
                fixed = fixed.replace(source.as_str(), replacement);
            }
        }
        fixed
    }

    /// A normalized token of at least 3 chars containing a label stem.
    pub fn is_table_label(&self, token: &str) -> bool {
        token.chars().count() >= 3 && self.table_stems.iter().any(|s| token.contains(s.as_str()))
    }
}
