// ── API-to-domain type conversions ──
//
// Bridges raw `invsync_api` records into canonical `invsync_core::model`
// entities. Every impl is a `From` so callers can write `record.into()`.
// Missing references fall back to the same defaults the source side uses.

use invsync_api::types::{
    CircuitRecord, DeviceRecord, InterfaceRecord, IpAddressRecord, LocationRecord, NestedRef,
    PrefixRecord,
};
use tracing::debug;

use crate::model::{
    CanonicalStatus, Circuit, DEFAULT_INTERFACE_TYPE, DEFAULT_LABEL, DEFAULT_LOCATION_TYPE,
    DEFAULT_NAMESPACE, Device, Entity, Interface, IpAddress, Location, MacAddress, Prefix,
    normalize_status,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn nested_name(nested: Option<&NestedRef>) -> Option<String> {
    nested.and_then(NestedRef::name).map(ToOwned::to_owned)
}

fn name_or(nested: Option<&NestedRef>, default: &str) -> String {
    nested_name(nested).unwrap_or_else(|| default.to_owned())
}

/// Target statuses are matched against canonical names first; anything
/// else goes through the synonym table.
fn status_of(nested: Option<&NestedRef>) -> CanonicalStatus {
    let name = nested.and_then(NestedRef::name);
    match name.and_then(CanonicalStatus::parse_strict) {
        Some(status) => status,
        None => {
            let status = normalize_status(name);
            debug!(raw = ?name, normalized = %status, "non-canonical target status");
            status
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<LocationRecord> for Location {
    fn from(r: LocationRecord) -> Self {
        Self {
            name: r.name,
            location_type: name_or(r.location_type.as_ref(), DEFAULT_LOCATION_TYPE),
            status: status_of(r.status.as_ref()),
            description: r.description,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

impl From<DeviceRecord> for Device {
    fn from(r: DeviceRecord) -> Self {
        let device_type = r.device_type.as_ref();
        Self {
            name: r.name.unwrap_or_default(),
            device_type: device_type
                .and_then(|dt| dt.model.clone())
                .unwrap_or_else(|| DEFAULT_LABEL.to_owned()),
            manufacturer: name_or(
                device_type.and_then(|dt| dt.manufacturer.as_deref()),
                DEFAULT_LABEL,
            ),
            role: name_or(r.role.as_ref(), DEFAULT_LABEL),
            status: status_of(r.status.as_ref()),
            location: name_or(r.location.as_ref(), DEFAULT_LABEL),
            serial: r.serial,
            platform: nested_name(r.platform.as_ref()),
            comments: r.comments,
        }
    }
}

impl From<InterfaceRecord> for Interface {
    fn from(r: InterfaceRecord) -> Self {
        Self {
            device: name_or(r.device.as_ref(), DEFAULT_LABEL),
            name: r.name,
            kind: r
                .kind
                .map_or_else(|| DEFAULT_INTERFACE_TYPE.to_owned(), |c| c.value),
            status: status_of(r.status.as_ref()),
            enabled: r.enabled,
            description: r.description,
            mac_address: r.mac_address.map(MacAddress::new),
            mtu: r.mtu,
        }
    }
}

impl From<PrefixRecord> for Prefix {
    fn from(r: PrefixRecord) -> Self {
        Self {
            prefix: r.prefix,
            namespace: name_or(r.namespace.as_ref(), DEFAULT_NAMESPACE),
            status: status_of(r.status.as_ref()),
            description: r.description,
            vrf: nested_name(r.vrf.as_ref()),
            location: nested_name(r.location.as_ref()),
        }
    }
}

impl From<IpAddressRecord> for IpAddress {
    fn from(r: IpAddressRecord) -> Self {
        let namespace = r.parent.as_ref().and_then(|p| p.namespace.as_deref());
        Self {
            address: r.address,
            namespace: name_or(namespace, DEFAULT_NAMESPACE),
            status: status_of(r.status.as_ref()),
            dns_name: r.dns_name,
            description: r.description,
        }
    }
}

impl From<CircuitRecord> for Circuit {
    fn from(r: CircuitRecord) -> Self {
        Self {
            cid: r.cid,
            provider: name_or(r.provider.as_ref(), DEFAULT_LABEL),
            circuit_type: name_or(r.circuit_type.as_ref(), DEFAULT_LABEL),
            status: status_of(r.status.as_ref()),
            description: r.description,
            commit_rate: r.commit_rate,
            comments: r.comments,
        }
    }
}

macro_rules! into_entity {
    ($($record:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$record> for Entity {
                fn from(r: $record) -> Self {
                    Entity::$variant(r.into())
                }
            }
        )*
    };
}

into_entity! {
    LocationRecord => Location,
    DeviceRecord => Device,
    InterfaceRecord => Interface,
    PrefixRecord => Prefix,
    IpAddressRecord => IpAddress,
    CircuitRecord => Circuit,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn device_record_flattens_nested_refs() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "name": "router01",
            "device_type": {"model": "ISR4451", "manufacturer": {"name": "Cisco"}},
            "role": {"name": "Router"},
            "status": {"name": "Active"},
            "location": null,
            "serial": "",
            "platform": {"name": "ios"},
            "comments": ""
        }))
        .unwrap();

        let mut entity = Entity::from(record);
        entity.normalize_defaults();
        let Entity::Device(d) = entity else {
            panic!("expected device");
        };

        assert_eq!(d.device_type, "ISR4451");
        assert_eq!(d.manufacturer, "Cisco");
        assert_eq!(d.location, "Unknown");
        assert_eq!(d.serial, None);
        assert_eq!(d.platform.as_deref(), Some("ios"));
        assert_eq!(d.status, CanonicalStatus::Active);
    }

    #[test]
    fn unknown_target_status_falls_back_to_normalizer() {
        assert_eq!(
            status_of(Some(&NestedRef {
                name: Some("Decommissioned".into()),
                ..NestedRef::default()
            })),
            CanonicalStatus::Decommissioned
        );
        assert_eq!(
            status_of(Some(&NestedRef {
                name: Some("Offline".into()),
                ..NestedRef::default()
            })),
            CanonicalStatus::Active
        );
        assert_eq!(status_of(None), CanonicalStatus::Active);
    }

    #[test]
    fn ip_namespace_defaults_to_global() {
        let record: IpAddressRecord = serde_json::from_value(json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "address": "10.0.0.1/24",
            "parent": null
        }))
        .unwrap();
        let ip = IpAddress::from(record);
        assert_eq!(ip.namespace, "Global");
    }
}
