// ── Canonical status vocabulary ──
//
// The source system uses free-text status strings ("up", "enabled",
// "Inactive", ...). Everything is funnelled through `normalize` so that
// every entity in either graph carries one of six canonical values.

use serde::{Deserialize, Serialize};

/// Canonical lifecycle status shared by all six entity types.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CanonicalStatus {
    #[default]
    Active,
    Decommissioned,
    Failed,
    Planned,
    Staged,
    Reserved,
}

impl CanonicalStatus {
    /// Lower-case slug used for diffing and serialization.
    pub fn slug(self) -> &'static str {
        self.into()
    }

    /// Title-cased name used when materializing the status in the target.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Decommissioned => "Decommissioned",
            Self::Failed => "Failed",
            Self::Planned => "Planned",
            Self::Staged => "Staged",
            Self::Reserved => "Reserved",
        }
    }

    /// Match a canonical name exactly (case-insensitive), without the
    /// synonym table.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// Map a raw status string to its canonical form.
///
/// Total and idempotent: unknown, blank and missing values all become
/// [`CanonicalStatus::Active`].
pub fn normalize(raw: Option<&str>) -> CanonicalStatus {
    let Some(raw) = raw else {
        return CanonicalStatus::default();
    };

    match raw.trim().to_lowercase().as_str() {
        "active" | "enabled" | "up" | "operational" => CanonicalStatus::Active,
        "decommissioned" | "disabled" | "inactive" => CanonicalStatus::Decommissioned,
        "failed" | "down" => CanonicalStatus::Failed,
        "planned" => CanonicalStatus::Planned,
        "staged" => CanonicalStatus::Staged,
        "reserved" => CanonicalStatus::Reserved,
        _ => CanonicalStatus::default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn synonyms_map_to_canonical() {
        assert_eq!(normalize(Some("up")), CanonicalStatus::Active);
        assert_eq!(normalize(Some(" Enabled ")), CanonicalStatus::Active);
        assert_eq!(normalize(Some("OPERATIONAL")), CanonicalStatus::Active);
        assert_eq!(normalize(Some("disabled")), CanonicalStatus::Decommissioned);
        assert_eq!(normalize(Some("Inactive")), CanonicalStatus::Decommissioned);
        assert_eq!(normalize(Some("down")), CanonicalStatus::Failed);
        assert_eq!(normalize(Some("planned")), CanonicalStatus::Planned);
        assert_eq!(normalize(Some("staged")), CanonicalStatus::Staged);
        assert_eq!(normalize(Some("reserved")), CanonicalStatus::Reserved);
    }

    #[test]
    fn unknown_and_missing_default_to_active() {
        assert_eq!(normalize(None), CanonicalStatus::Active);
        assert_eq!(normalize(Some("")), CanonicalStatus::Active);
        assert_eq!(normalize(Some("   ")), CanonicalStatus::Active);
        assert_eq!(normalize(Some("maintenance")), CanonicalStatus::Active);
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["up", "down", "disabled", "garbage", "Reserved", ""] {
            let once = normalize(Some(raw));
            assert_eq!(normalize(Some(once.slug())), once, "raw = {raw:?}");
            assert_eq!(normalize(Some(once.display_name())), once, "raw = {raw:?}");
        }
    }

    #[test]
    fn every_canonical_name_maps_to_itself() {
        for status in CanonicalStatus::iter() {
            assert_eq!(normalize(Some(status.slug())), status);
            assert_eq!(CanonicalStatus::parse_strict(status.display_name()), Some(status));
        }
    }

    #[test]
    fn strict_parse_ignores_synonyms() {
        assert_eq!(CanonicalStatus::parse_strict("up"), None);
        assert_eq!(
            CanonicalStatus::parse_strict("Failed").unwrap(),
            CanonicalStatus::Failed
        );
    }
}
