use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::quantize::ColorBucket;

/// The dominant colors of an image, most frequent first.
///
/// Serializes as a flat JSON object (`{"CC3333":12,"000000":3}`) whose keys
/// appear in this order, and deserializes back in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteResult {
    entries: Vec<(ColorBucket, u64)>,
}

impl PaletteResult {
    pub fn entries(&self) -> &[(ColorBucket, u64)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ColorBucket, u64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for the bucket with the given `RRGGBB` key.
    pub fn get(&self, hex: &str) -> Option<u64> {
        let bucket: ColorBucket = hex.parse().ok()?;
        self.entries
            .iter()
            .find(|(b, _)| *b == bucket)
            .map(|(_, n)| *n)
    }

    pub fn hex_colors(&self) -> Vec<String> {
        self.entries.iter().map(|(b, _)| b.to_string()).collect()
    }
}

/// Order entries by descending count and keep the first `limit`.
///
/// The sort is stable: equal counts keep their input order, which for a
/// histogram is first-seen scan order.
pub fn select(entries: &[(ColorBucket, u64)], limit: usize) -> PaletteResult {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.truncate(limit);
    PaletteResult { entries: sorted }
}

impl Serialize for PaletteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (bucket, count) in &self.entries {
            map.serialize_entry(&bucket.to_string(), count)?;
        }
        map.end()
    }
}

struct PaletteVisitor;

impl<'de> Visitor<'de> for PaletteVisitor {
    type Value = PaletteResult;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-empty map of RRGGBB keys to non-increasing positive counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(ColorBucket, u64)> = Vec::new();
        while let Some((key, count)) = access.next_entry::<String, u64>()? {
            let bucket: ColorBucket = key.parse().map_err(de::Error::custom)?;
            if count == 0 {
                return Err(de::Error::custom(format!("zero count for {key}")));
            }
            if entries.iter().any(|(b, _)| *b == bucket) {
                return Err(de::Error::custom(format!("duplicate key {key}")));
            }
            if entries.last().is_some_and(|&(_, prev)| prev < count) {
                return Err(de::Error::custom(format!("{key} is out of order")));
            }
            entries.push((bucket, count));
        }
        if entries.is_empty() {
            return Err(de::Error::invalid_length(0, &self));
        }
        Ok(PaletteResult { entries })
    }
}

impl<'de> Deserialize<'de> for PaletteResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PaletteVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::quantize;

    fn entries() -> Vec<(ColorBucket, u64)> {
        vec![
            (quantize(0, 0, 0), 2),
            (quantize(255, 0, 0), 5),
            (quantize(0, 255, 0), 2),
            (quantize(0, 0, 255), 5),
            (quantize(255, 255, 255), 1),
        ]
    }

    #[test]
    fn sorts_descending_with_first_seen_ties() {
        let result = select(&entries(), 10);
        assert_eq!(
            result.hex_colors(),
            ["FF0000", "0000FF", "000000", "00FF00", "FFFFFF"]
        );
    }

    #[test]
    fn truncates_to_limit() {
        let result = select(&entries(), 3);
        assert_eq!(result.hex_colors(), ["FF0000", "0000FF", "000000"]);
        assert!(select(&entries(), 0).is_empty());
    }

    #[test]
    fn empty_input_is_empty_result() {
        assert!(select(&[], 10).is_empty());
    }

    #[test]
    fn select_is_idempotent() {
        let first = select(&entries(), 3);
        assert_eq!(select(first.entries(), 3), first);
        assert_eq!(select(first.entries(), 10), first);
    }

    #[test]
    fn lookup_by_hex() {
        let result = select(&entries(), 10);
        assert_eq!(result.get("0000FF"), Some(5));
        assert_eq!(result.get("333333"), None);
        assert_eq!(result.get("nope"), None);
    }

    #[test]
    fn serializes_as_flat_object_in_result_order() {
        let result = select(&entries(), 2);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"FF0000":5,"0000FF":5}"#);
    }

    #[test]
    fn equal_counts_may_appear_in_any_order() {
        let result: PaletteResult =
            serde_json::from_str(r#"{"FF0000":5,"0000FF":5,"000000":2}"#).unwrap();
        assert_eq!(result.hex_colors(), ["FF0000", "0000FF", "000000"]);
    }

    #[test]
    fn deserializes_in_document_order() {
        let result: PaletteResult =
            serde_json::from_str(r#"{"FFFFFF":9,"000000":1}"#).unwrap();
        assert_eq!(result.hex_colors(), ["FFFFFF", "000000"]);
        assert_eq!(result.get("000000"), Some(1));
    }

    #[test]
    fn rejects_malformed_artifacts() {
        for json in [
            "{}",
            "[]",
            r#"{"000000":0}"#,
            r#"{"000000":-1}"#,
            r#"{"000000":1.5}"#,
            r#"{"abcdef":1}"#,
            r#"{"000000":1,"000000":2}"#,
            r#"{"000000":"1"}"#,
            r#"{"000000":1,"FFFFFF":9,"FF0000":5}"#,
        ] {
            assert!(
                serde_json::from_str::<PaletteResult>(json).is_err(),
                "{json} should be rejected"
            );
        }
    }
}
