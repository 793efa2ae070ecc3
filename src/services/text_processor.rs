// Text Processing Service
// Pre-filtering and per-character feature extraction

use crate::models::{FeatureSet, Slot};
use regex::Regex;
use std::sync::OnceLock;

fn non_alphanumeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("non-alphanumeric regex"))
}

/// Keep letters, numeric characters and whitespace; drop everything else.
pub fn normalize_alphanumeric(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    non_alphanumeric_re().replace_all(text, "").into_owned()
}

/// Single pass over the text's characters. Every character advances the
/// offset counter; only digits and letters are recorded in a slot.
pub fn extract_features(text: &str) -> FeatureSet {
    let mut features = FeatureSet::default();

    for (offset, ch) in text.chars().enumerate() {
        if let Some(slot) = Slot::from_char(ch) {
            let idx = slot.index();
            features.count_by_slot[idx] += 1;
            features.positions_by_slot[idx].push(offset);
            features.letter_count += 1;
        }
        features.total_count += 1;
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_index(ch: char) -> usize {
        Slot::from_char(ch).map(Slot::index).unwrap()
    }

    #[test]
    fn test_extract_empty_text() {
        let features = extract_features("");
        assert_eq!(features, FeatureSet::default());
    }

    #[test]
    fn test_extract_counts_and_positions() {
        let features = extract_features("Ab a1!");
        assert_eq!(features.total_count, 6);
        assert_eq!(features.letter_count, 4);
        assert_eq!(features.count_by_slot[slot_index('a')], 2);
        assert_eq!(features.positions_by_slot[slot_index('a')], vec![0, 3]);
        assert_eq!(features.positions_by_slot[slot_index('b')], vec![1]);
        assert_eq!(features.positions_by_slot[slot_index('1')], vec![4]);
    }

    #[test]
    fn test_extract_uses_character_offsets() {
        // multi-byte characters count as one position each
        let features = extract_features("中文a");
        assert_eq!(features.total_count, 3);
        assert_eq!(features.positions_by_slot[slot_index('a')], vec![2]);
    }

    #[test]
    fn test_extract_invariants() {
        let samples = [
            "The quick brown fox jumps over the lazy dog 1234567890",
            "   ",
            "ÄÖÜ straße 42!",
            "ZZZZZZZZZZ999999999XXXXXXXXXX000000000000000000",
        ];
        for text in samples {
            let features = extract_features(text);
            let summed: u32 = features.count_by_slot.iter().sum();
            assert_eq!(summed as usize, features.letter_count);
            assert!(features.letter_count <= features.total_count);
            assert_eq!(features.total_count, text.chars().count());
            for (count, positions) in features.count_by_slot.iter().zip(features.positions_by_slot.iter()) {
                assert_eq!(*count as usize, positions.len());
            }
        }
    }

    #[test]
    fn test_normalize_alphanumeric() {
        assert_eq!(normalize_alphanumeric("Hello, world! 123."), "Hello world 123");
        assert_eq!(normalize_alphanumeric("tab\there\nline"), "tab\there\nline");
        assert_eq!(normalize_alphanumeric(""), "");
    }
}
