// Letterprint Data Models
// Feature sets, fitted distributions, corpus models and analysis reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of character slots: digits 0-9 followed by letters a-z.
pub const SLOT_COUNT: usize = 36;

/// Index of the first letter slot ('a').
pub const LETTER_SLOT_OFFSET: usize = 10;

// ============ Slots ============

/// One of the 36 fixed character classes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Slot(usize);

impl Slot {
    pub fn new(index: usize) -> Option<Self> {
        (index < SLOT_COUNT).then_some(Self(index))
    }

    /// Classify a character. ASCII digits map to 0-9; letters whose
    /// lowercase form is a single ASCII letter map to 10-35.
    pub fn from_char(ch: char) -> Option<Self> {
        if ch.is_ascii_digit() {
            return Some(Self((ch as u8 - b'0') as usize));
        }
        if !ch.is_alphabetic() {
            return None;
        }

        let mut lower = ch.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if l.is_ascii_lowercase() => {
                Some(Self(LETTER_SLOT_OFFSET + (l as u8 - b'a') as usize))
            }
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Human label: the digit itself or the lowercase letter.
    pub fn label(self) -> char {
        if self.0 < LETTER_SLOT_OFFSET {
            (b'0' + self.0 as u8) as char
        } else {
            (b'a' + (self.0 - LETTER_SLOT_OFFSET) as u8) as char
        }
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT).map(Slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// serde only derives fixed arrays up to 32 elements
mod slot_array {
    use super::SLOT_COUNT;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(values: &[T; SLOT_COUNT], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        values.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<[T; SLOT_COUNT], D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let values = Vec::<T>::deserialize(deserializer)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"exactly 36 slot entries"))
    }
}

// ============ Features ============

/// Per-text character counts and occurrence offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    /// Every character scanned, classified or not.
    pub total_count: usize,
    /// Characters that landed in a slot.
    pub letter_count: usize,
    #[serde(with = "slot_array")]
    pub count_by_slot: [u32; SLOT_COUNT],
    /// Character offsets (not byte offsets) in occurrence order.
    #[serde(with = "slot_array")]
    pub positions_by_slot: [Vec<usize>; SLOT_COUNT],
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            total_count: 0,
            letter_count: 0,
            count_by_slot: [0; SLOT_COUNT],
            positions_by_slot: std::array::from_fn(|_| Vec::new()),
        }
    }
}

// ============ Distributions ============

/// Parameters of a fitted distribution family. Only the fields of the
/// active family exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum DistributionParameters {
    Normal { mean: f64, std_dev: f64 },
    Gamma { shape: f64, rate: f64 },
    Beta { alpha: f64, beta: f64 },
    Exponential { rate: f64 },
    LogNormal { mu: f64, sigma: f64 },
    /// Sorted raw samples with their empirical CDF.
    Empirical { samples: Vec<f64>, cdf: Vec<f64> },
}

impl DistributionParameters {
    pub fn family_name(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::Gamma { .. } => "gamma",
            Self::Beta { .. } => "beta",
            Self::Exponential { .. } => "exponential",
            Self::LogNormal { .. } => "lognormal",
            Self::Empirical { .. } => "empirical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedDistribution {
    pub params: DistributionParameters,
    /// In [0, 1], higher is better. Empirical fits score 1.0.
    pub goodness_of_fit: f64,
}

impl FittedDistribution {
    /// Degenerate stand-in for slots without any samples.
    pub fn placeholder() -> Self {
        Self {
            params: DistributionParameters::Normal {
                mean: 0.0,
                std_dev: 0.0,
            },
            goodness_of_fit: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStatistics {
    pub mean: f64,
    pub std_dev: f64,
}

// ============ Corpus Model ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotModel {
    pub frequency: FittedDistribution,
    pub position: FittedDistribution,
    /// Relative frequencies, one per training text with characters.
    pub frequency_samples: Vec<f64>,
    /// Relative positions of every occurrence across the corpus.
    pub position_samples: Vec<f64>,
    pub frequency_stats: SlotStatistics,
    pub position_stats: SlotStatistics,
}

impl SlotModel {
    pub fn empty() -> Self {
        Self {
            frequency: FittedDistribution::placeholder(),
            position: FittedDistribution::placeholder(),
            frequency_samples: Vec::new(),
            position_samples: Vec::new(),
            frequency_stats: SlotStatistics::default(),
            position_stats: SlotStatistics::default(),
        }
    }

    pub fn has_frequency_data(&self) -> bool {
        !self.frequency_samples.is_empty()
    }

    pub fn has_position_data(&self) -> bool {
        !self.position_samples.is_empty()
    }
}

/// Character-distribution fingerprint of a training corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionModel {
    pub sample_count: usize,
    pub anomaly_threshold: f64,
    #[serde(with = "slot_array")]
    pub slots: [SlotModel; SLOT_COUNT],
}

impl DistributionModel {
    pub fn slot(&self, slot: Slot) -> &SlotModel {
        &self.slots[slot.index()]
    }
}

// ============ Anomaly Reports ============

/// Which fitted distribution a query is scored against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lens {
    Frequency,
    Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalousSlot {
    pub label: char,
    pub score: f64,
}

impl fmt::Display for AnomalousSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LensVerdict {
    pub is_anomaly: bool,
    /// Mean score of the slots above the significance floor.
    pub score: f64,
    /// Contributing slots in slot order.
    pub slot_scores: Vec<AnomalousSlot>,
    /// Density of the last slot evaluated.
    pub probability: f64,
}

/// Frequency and position verdicts, reported side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub frequency: LensVerdict,
    pub position: LensVerdict,
}

// ============ Similarity ============

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityReport {
    pub cosine: f64,
    pub jaccard: f64,
    pub position_difference: f64,
    /// (cosine + jaccard + (1 - position)) / 3
    pub equal_weighted: f64,
    /// 40-30-30 cosine-jaccard-position blend
    pub weighted: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_classification() {
        assert_eq!(Slot::from_char('0').map(Slot::index), Some(0));
        assert_eq!(Slot::from_char('9').map(Slot::index), Some(9));
        assert_eq!(Slot::from_char('a').map(Slot::index), Some(10));
        assert_eq!(Slot::from_char('Z').map(Slot::index), Some(35));
        assert_eq!(Slot::from_char(' '), None);
        assert_eq!(Slot::from_char('!'), None);
        assert_eq!(Slot::from_char('é'), None);
    }

    #[test]
    fn test_slot_labels() {
        let labels: String = Slot::all().map(Slot::label).collect();
        assert_eq!(labels, "0123456789abcdefghijklmnopqrstuvwxyz");
        assert_eq!(Slot::new(36), None);
    }

    #[test]
    fn test_anomalous_slot_display() {
        let entry = AnomalousSlot { label: 'z', score: 10.0 };
        assert_eq!(entry.to_string(), "z (10.00)");
    }

    #[test]
    fn test_feature_set_rejects_short_slot_array() {
        let mut value = serde_json::to_value(FeatureSet::default()).unwrap();
        value["countBySlot"] = serde_json::json!([0, 0, 0]);
        assert!(serde_json::from_value::<FeatureSet>(value).is_err());
    }

    #[test]
    fn test_distribution_parameters_tagging() {
        let params = DistributionParameters::Exponential { rate: 2.5 };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"family\":\"exponential\""));
        assert_eq!(params.family_name(), "exponential");
    }
}
