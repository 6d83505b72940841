//! Scenario definitions
//!
//! Four fixed scenarios are trained and served independently: detailed or
//! simple input mode, with or without the glucose feature. Scenario configs
//! are immutable and defined at pipeline start.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target label column in the source CSV
pub const TARGET_COLUMN: &str = "당뇨";

/// Raw columns where a zero is a recording sentinel for "missing"
pub const SENTINEL_ZERO_COLUMNS: &[&str] = &["혈당", "혈압", "피부두께", "인슐린", "BMI"];

/// Input preprocessing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Quartile clipping + standardization + KNN imputation
    Detailed,
    /// Ordinal 1..=4 grading by training-set quantiles
    Simple,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Detailed => write!(f, "detailed"),
            Mode::Simple => write!(f, "simple"),
        }
    }
}

/// Scenario identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioKey {
    A,
    B,
    C,
    #[serde(rename = "C_NS")]
    CNs,
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 4] = [
        ScenarioKey::A,
        ScenarioKey::B,
        ScenarioKey::C,
        ScenarioKey::CNs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKey::A => "A",
            ScenarioKey::B => "B",
            ScenarioKey::C => "C",
            ScenarioKey::CNs => "C_NS",
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fixed training/serving configuration
#[derive(Debug, Clone)]
pub struct Scenario {
    pub key: ScenarioKey,
    /// Artifact file-name stem, e.g. `a_detail_sugar`
    pub artifact_name: &'static str,
    pub mode: Mode,
    /// Feature identifiers, English naming
    pub features_eng: Vec<&'static str>,
}

impl Scenario {
    /// Korean source-CSV column names for this scenario's features
    pub fn features_kor(&self) -> Vec<&'static str> {
        self.features_eng.iter().map(|f| kor_column(f)).collect()
    }

    pub fn has_glucose(&self) -> bool {
        self.features_eng.contains(&"glucose")
    }
}

/// English feature name → Korean CSV column
pub fn kor_column(eng: &str) -> &'static str {
    match eng {
        "pregnancies" => "임신횟수",
        "glucose" => "혈당",
        "blood_pressure" => "혈압",
        "skin_thickness" => "피부두께",
        "insulin" => "인슐린",
        "bmi" => "BMI",
        "pedigree" => "가족력지표",
        "age" => "나이",
        other => panic!("unknown feature name: {other}"),
    }
}

/// The four scenario configurations, in training order
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            key: ScenarioKey::A,
            artifact_name: "a_detail_sugar",
            mode: Mode::Detailed,
            features_eng: vec!["pregnancies", "glucose", "bmi", "age"],
        },
        Scenario {
            key: ScenarioKey::B,
            artifact_name: "b_detail_no_sugar",
            mode: Mode::Detailed,
            features_eng: vec!["pregnancies", "bmi", "age"],
        },
        Scenario {
            key: ScenarioKey::C,
            artifact_name: "c_simple_sugar",
            mode: Mode::Simple,
            features_eng: vec!["pregnancies", "glucose", "bmi", "age"],
        },
        Scenario {
            key: ScenarioKey::CNs,
            artifact_name: "cns_simple_no_sugar",
            mode: Mode::Simple,
            features_eng: vec!["pregnancies", "bmi", "age"],
        },
    ]
}
