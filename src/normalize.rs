//! Mapping of free-text category fields onto a fixed vocabulary.

use crate::types::DimensionKey;

pub const MEMBERSHIP_STATUSES: [&str; 4] = ["Guest", "Member", "Worker", "Associate Coord"];
pub const CONGRESS_CATEGORIES: [&str; 6] =
    ["Student", "Children", "Corper", "Staff", "Others", "Youth"];
pub const RETREAT_CATEGORIES: [&str; 5] = ["Corper", "Student", "Staff", "Children", "Youth"];

/// Case-insensitive matcher from raw text to a canonical label.
///
/// Aliases are consulted before the canonical set. Anything that matches
/// neither, including an absent value, becomes the fallback label.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyNormalizer {
    canonical: Vec<String>,
    aliases: Vec<(String, String)>,
    fallback: String,
}

impl KeyNormalizer {
    pub fn new<I, S>(canonical: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into_iter().map(Into::into).collect(),
            aliases: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Map `variant` (any casing) to `canonical`.
    pub fn alias(mut self, variant: impl Into<String>, canonical: impl Into<String>) -> Self {
        let variant: String = variant.into();
        self.aliases.push((variant.to_lowercase(), canonical.into()));
        self
    }

    /// Guest / Member / Worker / Associate Coord, with "Associate Coordinator"
    /// folded into the short form.
    pub fn membership_status() -> Self {
        Self::new(MEMBERSHIP_STATUSES, "Guest")
            .alias("associate coordinator", "Associate Coord")
            .alias("associate coord", "Associate Coord")
    }

    pub fn congress_category() -> Self {
        Self::new(CONGRESS_CATEGORIES, "Others")
    }

    /// The retreat vocabulary has no "Others" column; the fallback bucket is
    /// still kept in the matrix even though it is never rendered.
    pub fn retreat_category() -> Self {
        Self::new(RETREAT_CATEGORIES, "Others")
    }

    pub fn normalize(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return self.fallback.clone();
        };
        let lowered = raw.to_lowercase();
        if let Some((_, canonical)) = self.aliases.iter().find(|(v, _)| *v == lowered) {
            return canonical.clone();
        }
        self.canonical
            .iter()
            .find(|c| c.to_lowercase() == lowered)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// The canonical set as an ordered column dimension.
    pub fn keys(&self) -> Vec<DimensionKey> {
        self.canonical.iter().map(DimensionKey::plain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn associate_variants_share_one_label() {
        let n = KeyNormalizer::membership_status();
        assert_eq!(n.normalize(Some("Associate Coordinator")), "Associate Coord");
        assert_eq!(n.normalize(Some("associate coord")), "Associate Coord");
        assert_eq!(n.normalize(Some("ASSOCIATE COORD")), "Associate Coord");
    }

    #[test]
    fn matches_ignore_case() {
        let n = KeyNormalizer::membership_status();
        assert_eq!(n.normalize(Some("worker")), "Worker");
        assert_eq!(n.normalize(Some(" MEMBER ")), "Member");
    }

    #[test]
    fn unmapped_and_missing_fall_back() {
        let n = KeyNormalizer::congress_category();
        assert_eq!(n.normalize(Some("Pastor")), "Others");
        assert_eq!(n.normalize(None), "Others");
        assert_eq!(n.normalize(Some("")), "Others");
        assert_eq!(KeyNormalizer::membership_status().normalize(Some("visitor")), "Guest");
    }

    #[test]
    fn keys_follow_declared_order() {
        let keys: Vec<String> = KeyNormalizer::congress_category()
            .keys()
            .into_iter()
            .map(|k| k.key)
            .collect();
        assert_eq!(keys, CONGRESS_CATEGORIES);
    }
}
