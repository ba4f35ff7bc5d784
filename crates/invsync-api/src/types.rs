// Wire types for the inventory REST API.
//
// Read records mirror the `?depth=2` response shape: related objects arrive
// as nested objects carrying at least `id` and a natural-key field. Write
// bodies reference related objects by UUID.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ── Envelope ─────────────────────────────────────────────────────────

/// Paginated list envelope (`{count, next, previous, results}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

// ── Nested references ────────────────────────────────────────────────

/// A related object as it appears inside another record.
///
/// Which natural-key field is populated depends on the object type:
/// most carry `name`, device types carry `model` (and a nested
/// `manufacturer`), IP addresses reach their namespace via `parent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedRef {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<Box<NestedRef>>,
    #[serde(default)]
    pub namespace: Option<Box<NestedRef>>,
}

impl NestedRef {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A choice field (`{"value": "1000base-t", "label": "1000BASE-T (1GE)"}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceField {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}

// ── Inventory records ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub location_type: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_type: Option<NestedRef>,
    #[serde(default)]
    pub role: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default)]
    pub location: Option<NestedRef>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub platform: Option<NestedRef>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub device: Option<NestedRef>,
    #[serde(rename = "type", default)]
    pub kind: Option<ChoiceField>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixRecord {
    pub id: Uuid,
    pub prefix: String,
    #[serde(default)]
    pub namespace: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vrf: Option<NestedRef>,
    #[serde(default)]
    pub location: Option<NestedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpAddressRecord {
    pub id: Uuid,
    pub address: String,
    /// Parent prefix; its nested `namespace` names the address namespace.
    #[serde(default)]
    pub parent: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default)]
    pub dns_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitRecord {
    pub id: Uuid,
    pub cid: String,
    #[serde(default)]
    pub provider: Option<NestedRef>,
    #[serde(default)]
    pub circuit_type: Option<NestedRef>,
    #[serde(default)]
    pub status: Option<NestedRef>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commit_rate: Option<u64>,
    #[serde(default)]
    pub comments: Option<String>,
}

// ── Minor records ────────────────────────────────────────────────────

/// Any record identified by `name` (manufacturer, role, status, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTypeRecord {
    pub id: Uuid,
    pub model: String,
    #[serde(default)]
    pub manufacturer: Option<NestedRef>,
}

// ── Write bodies ─────────────────────────────────────────────────────

/// Create body for name-keyed minor records.
#[derive(Debug, Clone, Serialize)]
pub struct NamedWrite {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NamedWrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_types: Vec::new(),
            color: None,
        }
    }

    #[must_use]
    pub fn with_content_types(mut self, content_types: &[&str]) -> Self {
        self.content_types = content_types.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_owned());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeWrite {
    pub model: String,
    pub manufacturer: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationWrite {
    pub name: String,
    pub location_type: Uuid,
    pub status: Uuid,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceWrite {
    pub name: String,
    pub device_type: Uuid,
    pub role: Uuid,
    pub status: Uuid,
    pub location: Option<Uuid>,
    pub serial: String,
    pub platform: Option<Uuid>,
    pub comments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceWrite {
    pub device: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Uuid,
    pub enabled: bool,
    pub description: String,
    pub mac_address: Option<String>,
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrefixWrite {
    pub prefix: String,
    pub namespace: Uuid,
    pub status: Uuid,
    pub description: String,
    pub vrf: Option<Uuid>,
    pub location: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpAddressWrite {
    pub address: String,
    pub namespace: Uuid,
    pub status: Uuid,
    pub dns_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitWrite {
    pub cid: String,
    pub provider: Uuid,
    pub circuit_type: Uuid,
    pub status: Uuid,
    pub description: String,
    pub commit_rate: Option<u64>,
    pub comments: String,
}

/// Minimal response for writes where only the new id matters.
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// Decimal fields are serialized as strings (`"40.712800"`) by default,
/// but some deployments emit plain numbers. Accept both, plus null.
fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
