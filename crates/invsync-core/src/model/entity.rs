// ── Inventory entity types ──
//
// Six fixed record types, a closed `Entity` enum over them, and the
// identity/attribute views the graph and the diff operate on.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fields::FieldMap;
use super::mac::MacAddress;
use super::status::{self, CanonicalStatus};

// ── Defaults ─────────────────────────────────────────────────────────

pub const DEFAULT_LOCATION_TYPE: &str = "Site";
pub const DEFAULT_LABEL: &str = "Unknown";
pub const DEFAULT_INTERFACE_TYPE: &str = "other";
pub const DEFAULT_NAMESPACE: &str = "Global";

// ── EntityKind ───────────────────────────────────────────────────────

/// The six entity types. Declaration order is load and apply order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Location,
    Device,
    Interface,
    Prefix,
    IpAddress,
    Circuit,
}

impl EntityKind {
    /// All kinds, parents before children.
    pub const ALL: [Self; 6] = [
        Self::Location,
        Self::Device,
        Self::Interface,
        Self::Prefix,
        Self::IpAddress,
        Self::Circuit,
    ];

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Human-readable singular name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::Device => "Device",
            Self::Interface => "Interface",
            Self::Prefix => "Prefix",
            Self::IpAddress => "IP address",
            Self::Circuit => "Circuit",
        }
    }

    /// The kind this kind hangs under in the containment hierarchy.
    pub fn parent_kind(self) -> Option<Self> {
        match self {
            Self::Device => Some(Self::Location),
            Self::Interface => Some(Self::Device),
            _ => None,
        }
    }

    /// Field names a source row may carry for this kind.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Location => &[
                "name",
                "location_type",
                "status",
                "description",
                "latitude",
                "longitude",
            ],
            Self::Device => &[
                "name",
                "device_type",
                "manufacturer",
                "role",
                "status",
                "location",
                "serial",
                "platform",
                "comments",
            ],
            Self::Interface => &[
                "device",
                "name",
                "type",
                "status",
                "enabled",
                "description",
                "mac_address",
                "mtu",
            ],
            Self::Prefix => &["prefix", "namespace", "status", "description", "vrf", "location"],
            Self::IpAddress => &["address", "namespace", "status", "dns_name", "description"],
            Self::Circuit => &[
                "cid",
                "provider",
                "circuit_type",
                "status",
                "description",
                "commit_rate",
                "comments",
            ],
        }
    }

    /// The subset of [`fields`](Self::fields) forming the identity key.
    pub fn identity_fields(self) -> &'static [&'static str] {
        match self {
            Self::Location | Self::Device => &["name"],
            Self::Interface => &["device", "name"],
            Self::Prefix => &["prefix", "namespace"],
            Self::IpAddress => &["address", "namespace"],
            Self::Circuit => &["cid", "provider"],
        }
    }
}

// ── IdentityKey ──────────────────────────────────────────────────────

/// Minimal field tuple that identifies an entity within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(Vec<String>);

impl IdentityKey {
    pub fn single(part: impl Into<String>) -> Self {
        Self(vec![part.into()])
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self(vec![first.into(), second.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" | "))
    }
}

// ── AttrValue ────────────────────────────────────────────────────────

/// A comparable attribute value, reported field by field in diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<&String> for AttrValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<&Option<String>> for AttrValue {
    fn from(v: &Option<String>) -> Self {
        v.as_deref().map_or(Self::Null, Self::from)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Option<u32>> for AttrValue {
    fn from(v: Option<u32>) -> Self {
        v.map_or(Self::Null, |n| Self::Integer(u64::from(n)))
    }
}

impl From<Option<u64>> for AttrValue {
    fn from(v: Option<u64>) -> Self {
        v.map_or(Self::Null, Self::Integer)
    }
}

impl From<Option<f64>> for AttrValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Null, Self::Float)
    }
}

impl From<CanonicalStatus> for AttrValue {
    fn from(s: CanonicalStatus) -> Self {
        Self::Text(s.slug().to_owned())
    }
}

impl From<&Option<MacAddress>> for AttrValue {
    fn from(v: &Option<MacAddress>) -> Self {
        v.as_ref().map_or(Self::Null, |m| Self::Text(m.to_string()))
    }
}

/// Ordered attribute set of one entity.
pub type Attributes = Vec<(&'static str, AttrValue)>;

// ── Entity structs ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub location_type: String,
    pub status: CanonicalStatus,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub device_type: String,
    pub manufacturer: String,
    pub role: String,
    pub status: CanonicalStatus,
    /// Location name. A reference, not ownership: the location may not exist.
    pub location: String,
    pub serial: Option<String>,
    pub platform: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    /// Owning device name.
    pub device: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: CanonicalStatus,
    pub enabled: bool,
    pub description: Option<String>,
    pub mac_address: Option<MacAddress>,
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    pub prefix: String,
    pub namespace: String,
    pub status: CanonicalStatus,
    pub description: Option<String>,
    pub vrf: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: String,
    pub namespace: String,
    pub status: CanonicalStatus,
    pub dns_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub cid: String,
    pub provider: String,
    pub circuit_type: String,
    pub status: CanonicalStatus,
    pub description: Option<String>,
    pub commit_rate: Option<u64>,
    pub comments: Option<String>,
}

// ── Construction from field maps ─────────────────────────────────────

fn status_of(row: &FieldMap) -> CanonicalStatus {
    status::normalize(row.text("status").as_deref())
}

impl Location {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            name: row.text_or("name", ""),
            location_type: row.text_or("location_type", DEFAULT_LOCATION_TYPE),
            status: status_of(row),
            description: row.text("description"),
            latitude: row.float("latitude").map(round_coordinate),
            longitude: row.float("longitude").map(round_coordinate),
        }
    }
}

impl Device {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            name: row.text_or("name", ""),
            device_type: row.text_or("device_type", DEFAULT_LABEL),
            manufacturer: row.text_or("manufacturer", DEFAULT_LABEL),
            role: row.text_or("role", DEFAULT_LABEL),
            status: status_of(row),
            location: row.text_or("location", DEFAULT_LABEL),
            serial: row.text("serial"),
            platform: row.text("platform"),
            comments: row.text("comments"),
        }
    }
}

impl Interface {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            device: row.text_or("device", DEFAULT_LABEL),
            name: row.text_or("name", ""),
            kind: row.text_or("type", DEFAULT_INTERFACE_TYPE),
            status: status_of(row),
            enabled: row.bool("enabled").unwrap_or(true),
            description: row.text("description"),
            mac_address: row.text("mac_address").map(MacAddress::new),
            mtu: row.int("mtu"),
        }
    }
}

impl Prefix {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            prefix: row.text_or("prefix", ""),
            namespace: row.text_or("namespace", DEFAULT_NAMESPACE),
            status: status_of(row),
            description: row.text("description"),
            vrf: row.text("vrf"),
            location: row.text("location"),
        }
    }
}

impl IpAddress {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            address: row.text_or("address", ""),
            namespace: row.text_or("namespace", DEFAULT_NAMESPACE),
            status: status_of(row),
            dns_name: row.text("dns_name"),
            description: row.text("description"),
        }
    }
}

impl Circuit {
    pub fn from_fields(row: &FieldMap) -> Self {
        Self {
            cid: row.text_or("cid", ""),
            provider: row.text_or("provider", DEFAULT_LABEL),
            circuit_type: row.text_or("circuit_type", DEFAULT_LABEL),
            status: status_of(row),
            description: row.text("description"),
            commit_rate: row.int("commit_rate"),
            comments: row.text("comments"),
        }
    }
}

// ── Entity ───────────────────────────────────────────────────────────

/// Any one of the six inventory records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Location(Location),
    Device(Device),
    Interface(Interface),
    Prefix(Prefix),
    IpAddress(IpAddress),
    Circuit(Circuit),
}

impl Entity {
    /// Build an entity of `kind` from a loosely-typed row, substituting
    /// defaults for missing or unparseable fields.
    pub fn from_fields(kind: EntityKind, row: &FieldMap) -> Self {
        match kind {
            EntityKind::Location => Self::Location(Location::from_fields(row)),
            EntityKind::Device => Self::Device(Device::from_fields(row)),
            EntityKind::Interface => Self::Interface(Interface::from_fields(row)),
            EntityKind::Prefix => Self::Prefix(Prefix::from_fields(row)),
            EntityKind::IpAddress => Self::IpAddress(IpAddress::from_fields(row)),
            EntityKind::Circuit => Self::Circuit(Circuit::from_fields(row)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Location(_) => EntityKind::Location,
            Self::Device(_) => EntityKind::Device,
            Self::Interface(_) => EntityKind::Interface,
            Self::Prefix(_) => EntityKind::Prefix,
            Self::IpAddress(_) => EntityKind::IpAddress,
            Self::Circuit(_) => EntityKind::Circuit,
        }
    }

    pub fn identity(&self) -> IdentityKey {
        match self {
            Self::Location(l) => IdentityKey::single(&l.name),
            Self::Device(d) => IdentityKey::single(&d.name),
            Self::Interface(i) => IdentityKey::pair(&i.device, &i.name),
            Self::Prefix(p) => IdentityKey::pair(&p.prefix, &p.namespace),
            Self::IpAddress(a) => IdentityKey::pair(&a.address, &a.namespace),
            Self::Circuit(c) => IdentityKey::pair(&c.cid, &c.provider),
        }
    }

    pub fn status(&self) -> CanonicalStatus {
        match self {
            Self::Location(l) => l.status,
            Self::Device(d) => d.status,
            Self::Interface(i) => i.status,
            Self::Prefix(p) => p.status,
            Self::IpAddress(a) => a.status,
            Self::Circuit(c) => c.status,
        }
    }

    /// Comparable non-identity attributes, in a fixed order per kind.
    pub fn attributes(&self) -> Attributes {
        match self {
            Self::Location(l) => vec![
                ("location_type", (&l.location_type).into()),
                ("status", l.status.into()),
                ("description", (&l.description).into()),
                ("latitude", l.latitude.into()),
                ("longitude", l.longitude.into()),
            ],
            Self::Device(d) => vec![
                ("device_type", (&d.device_type).into()),
                ("manufacturer", (&d.manufacturer).into()),
                ("role", (&d.role).into()),
                ("status", d.status.into()),
                ("location", (&d.location).into()),
                ("serial", (&d.serial).into()),
                ("platform", (&d.platform).into()),
                ("comments", (&d.comments).into()),
            ],
            Self::Interface(i) => vec![
                ("type", (&i.kind).into()),
                ("status", i.status.into()),
                ("enabled", i.enabled.into()),
                ("description", (&i.description).into()),
                ("mac_address", (&i.mac_address).into()),
                ("mtu", i.mtu.into()),
            ],
            Self::Prefix(p) => vec![
                ("status", p.status.into()),
                ("description", (&p.description).into()),
                ("vrf", (&p.vrf).into()),
                ("location", (&p.location).into()),
            ],
            Self::IpAddress(a) => vec![
                ("status", a.status.into()),
                ("dns_name", (&a.dns_name).into()),
                ("description", (&a.description).into()),
            ],
            Self::Circuit(c) => vec![
                ("circuit_type", (&c.circuit_type).into()),
                ("status", c.status.into()),
                ("description", (&c.description).into()),
                ("commit_rate", c.commit_rate.into()),
                ("comments", (&c.comments).into()),
            ],
        }
    }

    /// The containing entity this one references, if its kind has one.
    pub fn parent_ref(&self) -> Option<(EntityKind, IdentityKey)> {
        match self {
            Self::Device(d) => Some((EntityKind::Location, IdentityKey::single(&d.location))),
            Self::Interface(i) => Some((EntityKind::Device, IdentityKey::single(&i.device))),
            _ => None,
        }
    }

    /// Bring every field into canonical form and fill defaults.
    ///
    /// Applied to both graphs so that values which round-trip through the
    /// target compare equal to their source.
    pub fn normalize_defaults(&mut self) {
        match self {
            Self::Location(l) => {
                trim(&mut l.name);
                label(&mut l.location_type, DEFAULT_LOCATION_TYPE);
                clean(&mut l.description);
                l.latitude = l.latitude.filter(|v| v.is_finite()).map(round_coordinate);
                l.longitude = l.longitude.filter(|v| v.is_finite()).map(round_coordinate);
            }
            Self::Device(d) => {
                trim(&mut d.name);
                label(&mut d.device_type, DEFAULT_LABEL);
                label(&mut d.manufacturer, DEFAULT_LABEL);
                label(&mut d.role, DEFAULT_LABEL);
                label(&mut d.location, DEFAULT_LABEL);
                clean(&mut d.serial);
                clean(&mut d.platform);
                clean(&mut d.comments);
            }
            Self::Interface(i) => {
                label(&mut i.device, DEFAULT_LABEL);
                trim(&mut i.name);
                label(&mut i.kind, DEFAULT_INTERFACE_TYPE);
                clean(&mut i.description);
                i.mac_address = i
                    .mac_address
                    .take()
                    .map(|m| MacAddress::new(m.as_str()))
                    .filter(|m| !m.as_str().is_empty());
            }
            Self::Prefix(p) => {
                trim(&mut p.prefix);
                label(&mut p.namespace, DEFAULT_NAMESPACE);
                clean(&mut p.description);
                clean(&mut p.vrf);
                clean(&mut p.location);
            }
            Self::IpAddress(a) => {
                trim(&mut a.address);
                label(&mut a.namespace, DEFAULT_NAMESPACE);
                clean(&mut a.dns_name);
                clean(&mut a.description);
            }
            Self::Circuit(c) => {
                trim(&mut c.cid);
                label(&mut c.provider, DEFAULT_LABEL);
                label(&mut c.circuit_type, DEFAULT_LABEL);
                clean(&mut c.description);
                clean(&mut c.comments);
            }
        }
    }
}

// ── Canonical-form helpers ───────────────────────────────────────────

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

fn label(value: &mut String, default: &str) {
    trim(value);
    if value.is_empty() {
        default.clone_into(value);
    }
}

fn clean(value: &mut Option<String>) {
    if let Some(s) = value.as_mut() {
        trim(s);
    }
    if value.as_deref().is_some_and(str::is_empty) {
        *value = None;
    }
}

/// Coordinates are stored with six decimal places.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
