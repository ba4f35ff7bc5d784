// ── Domain model ──
//
// Entity records, the status vocabulary, and the loosely-typed row
// representation both loaders feed into `Entity::from_fields`.

pub mod entity;
pub mod fields;
pub mod mac;
pub mod status;

pub use entity::{
    AttrValue, Attributes, Circuit, DEFAULT_INTERFACE_TYPE, DEFAULT_LABEL, DEFAULT_LOCATION_TYPE,
    DEFAULT_NAMESPACE, Device, Entity, EntityKind, IdentityKey, Interface, IpAddress, Location,
    Prefix,
};
pub use fields::{FieldMap, FieldValue};
pub use mac::MacAddress;
pub use status::{CanonicalStatus, normalize as normalize_status};
