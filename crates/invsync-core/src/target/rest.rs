// REST-backed target store.
//
// Reads go through `list_all`/`find_one` with nested objects inlined.
// Writes reference related records by id, so materializing an entity
// first resolves each minor record by name, creating it when absent.
// Resolved ids are cached for the life of the store.

use std::collections::HashMap;

use invsync_api::types::{
    CircuitRecord, CircuitWrite, Created, DeviceRecord, DeviceTypeRecord, DeviceTypeWrite,
    DeviceWrite, InterfaceRecord, InterfaceWrite, IpAddressRecord, IpAddressWrite, LocationRecord,
    LocationWrite, NamedRecord, NamedWrite, PrefixRecord, PrefixWrite,
};
use invsync_api::{Endpoint, InventoryClient};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use super::{TargetRef, TargetStore};
use crate::config::TargetConfig;
use crate::error::CoreError;
use crate::model::{
    CanonicalStatus, Circuit, DEFAULT_LABEL, Device, Entity, EntityKind, IdentityKey, Interface,
    IpAddress, Location, Prefix,
};

/// Content types a lazily created status is valid for.
const STATUS_CONTENT_TYPES: &[&str] = &[
    "dcim.location",
    "dcim.device",
    "dcim.interface",
    "ipam.prefix",
    "ipam.ipaddress",
    "circuits.circuit",
];

const ROLE_CONTENT_TYPES: &[&str] = &["dcim.device"];
const LOCATION_TYPE_CONTENT_TYPES: &[&str] = &["dcim.device", "ipam.prefix"];

/// Endpoint holding entities of `kind`.
pub fn endpoint_for(kind: EntityKind) -> Endpoint {
    match kind {
        EntityKind::Location => Endpoint::Locations,
        EntityKind::Device => Endpoint::Devices,
        EntityKind::Interface => Endpoint::Interfaces,
        EntityKind::Prefix => Endpoint::Prefixes,
        EntityKind::IpAddress => Endpoint::IpAddresses,
        EntityKind::Circuit => Endpoint::Circuits,
    }
}

/// Target store backed by a Nautobot-compatible REST API.
pub struct RestTarget {
    client: InventoryClient,
    /// (endpoint, natural key) → id. Only positive results are cached.
    ids: HashMap<(Endpoint, String), Uuid>,
}

impl RestTarget {
    pub fn new(client: InventoryClient) -> Self {
        Self {
            client,
            ids: HashMap::new(),
        }
    }

    /// Build the REST client from a resolved target config.
    pub fn connect(config: &TargetConfig) -> Result<Self, CoreError> {
        let client =
            InventoryClient::from_token(config.url.as_str(), &config.token, &config.transport())?;
        debug!(url = %client.base_url(), "target client ready");
        Ok(Self::new(client))
    }

    // ── Reads ────────────────────────────────────────────────────────

    async fn list_as<R>(&self, endpoint: Endpoint) -> Result<Vec<Entity>, CoreError>
    where
        R: DeserializeOwned + Into<Entity>,
    {
        let records: Vec<R> = self.client.list_all(endpoint, &[]).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn find_as<R>(
        &self,
        kind: EntityKind,
        filters: &[(&str, String)],
    ) -> Result<Option<(Entity, TargetRef)>, CoreError>
    where
        R: DeserializeOwned + Into<Entity> + HasId,
    {
        let found: Option<R> = self.client.find_one(endpoint_for(kind), filters).await?;
        Ok(found.map(|record| {
            let reference = TargetRef {
                kind,
                id: record.id().to_string(),
            };
            let mut entity: Entity = record.into();
            entity.normalize_defaults();
            (entity, reference)
        }))
    }

    // ── Minor-record resolution ──────────────────────────────────────

    /// Id of the record named `name`, without creating it.
    async fn find_named(&mut self, endpoint: Endpoint, name: &str) -> Result<Option<Uuid>, CoreError> {
        let cache_key = (endpoint, name.to_owned());
        if let Some(id) = self.ids.get(&cache_key) {
            return Ok(Some(*id));
        }

        let found: Option<NamedRecord> = self
            .client
            .find_one(endpoint, &[("name", name.to_owned())])
            .await?;
        if let Some(record) = &found {
            self.ids.insert(cache_key, record.id);
        }
        Ok(found.map(|r| r.id))
    }

    /// Id of the record named by `body`, creating it when absent.
    async fn get_or_create_named(
        &mut self,
        endpoint: Endpoint,
        body: NamedWrite,
    ) -> Result<Uuid, CoreError> {
        if let Some(id) = self.find_named(endpoint, &body.name).await? {
            return Ok(id);
        }

        let created: Created = self.client.create(endpoint, &body).await?;
        info!(endpoint = endpoint.path(), name = %body.name, "created minor record");
        self.ids.insert((endpoint, body.name), created.id);
        Ok(created.id)
    }

    async fn status_id(&mut self, status: CanonicalStatus) -> Result<Uuid, CoreError> {
        let body = NamedWrite::new(status.display_name())
            .with_content_types(STATUS_CONTENT_TYPES)
            .with_color(status_color(status));
        self.get_or_create_named(Endpoint::Statuses, body).await
    }

    async fn device_type_id(&mut self, model: &str, manufacturer: &str) -> Result<Uuid, CoreError> {
        let manufacturer_id = self
            .get_or_create_named(Endpoint::Manufacturers, NamedWrite::new(manufacturer))
            .await?;

        let cache_key = (Endpoint::DeviceTypes, format!("{manufacturer_id}/{model}"));
        if let Some(id) = self.ids.get(&cache_key) {
            return Ok(*id);
        }

        let found: Option<DeviceTypeRecord> = self
            .client
            .find_one(
                Endpoint::DeviceTypes,
                &[
                    ("model", model.to_owned()),
                    ("manufacturer_id", manufacturer_id.to_string()),
                ],
            )
            .await?;

        let id = match found {
            Some(record) => record.id,
            None => {
                let body = DeviceTypeWrite {
                    model: model.to_owned(),
                    manufacturer: manufacturer_id,
                };
                let created: Created = self.client.create(Endpoint::DeviceTypes, &body).await?;
                info!(%model, %manufacturer, "created device type");
                created.id
            }
        };
        self.ids.insert(cache_key, id);
        Ok(id)
    }

    /// Id of an existing record the entity points at. A name that does not
    /// resolve fails the write: sending null would read back differently
    /// and the entity would be updated again on every run.
    async fn existing_ref(
        &mut self,
        endpoint: Endpoint,
        what: &str,
        name: &str,
        entity: (EntityKind, IdentityKey),
    ) -> Result<Uuid, CoreError> {
        self.find_named(endpoint, name)
            .await?
            .ok_or_else(|| CoreError::Materialization {
                kind: entity.0,
                key: entity.1,
                message: format!("{what} '{name}' not found"),
            })
    }

    async fn optional_ref(
        &mut self,
        endpoint: Endpoint,
        what: &str,
        name: Option<&str>,
        entity: (EntityKind, IdentityKey),
    ) -> Result<Option<Uuid>, CoreError> {
        match name {
            Some(name) => Ok(Some(self.existing_ref(endpoint, what, name, entity).await?)),
            None => Ok(None),
        }
    }

    // ── Write bodies ─────────────────────────────────────────────────

    async fn location_body(&mut self, l: &Location) -> Result<LocationWrite, CoreError> {
        let location_type = self
            .get_or_create_named(
                Endpoint::LocationTypes,
                NamedWrite::new(&l.location_type).with_content_types(LOCATION_TYPE_CONTENT_TYPES),
            )
            .await?;
        Ok(LocationWrite {
            name: l.name.clone(),
            location_type,
            status: self.status_id(l.status).await?,
            description: l.description.clone().unwrap_or_default(),
            latitude: l.latitude,
            longitude: l.longitude,
        })
    }

    async fn device_body(&mut self, d: &Device) -> Result<DeviceWrite, CoreError> {
        let device_type = self.device_type_id(&d.device_type, &d.manufacturer).await?;
        let role = self
            .get_or_create_named(
                Endpoint::Roles,
                NamedWrite::new(&d.role).with_content_types(ROLE_CONTENT_TYPES),
            )
            .await?;
        let platform = match &d.platform {
            Some(name) => Some(
                self.get_or_create_named(Endpoint::Platforms, NamedWrite::new(name))
                    .await?,
            ),
            None => None,
        };
        // An unset location reads back as the default label.
        let location = if d.location == DEFAULT_LABEL {
            self.find_named(Endpoint::Locations, &d.location).await?
        } else {
            let key = (EntityKind::Device, IdentityKey::single(&d.name));
            Some(self.existing_ref(Endpoint::Locations, "location", &d.location, key).await?)
        };

        Ok(DeviceWrite {
            name: d.name.clone(),
            device_type,
            role,
            status: self.status_id(d.status).await?,
            location,
            serial: d.serial.clone().unwrap_or_default(),
            platform,
            comments: d.comments.clone().unwrap_or_default(),
        })
    }

    async fn interface_body(&mut self, i: &Interface) -> Result<InterfaceWrite, CoreError> {
        let key = (EntityKind::Interface, IdentityKey::pair(&i.device, &i.name));
        let device = self
            .existing_ref(Endpoint::Devices, "device", &i.device, key)
            .await?;

        Ok(InterfaceWrite {
            device,
            name: i.name.clone(),
            kind: i.kind.clone(),
            status: self.status_id(i.status).await?,
            enabled: i.enabled,
            description: i.description.clone().unwrap_or_default(),
            mac_address: i.mac_address.as_ref().map(ToString::to_string),
            mtu: i.mtu,
        })
    }

    async fn prefix_body(&mut self, p: &Prefix) -> Result<PrefixWrite, CoreError> {
        let key = (EntityKind::Prefix, IdentityKey::pair(&p.prefix, &p.namespace));
        let namespace = self
            .get_or_create_named(Endpoint::Namespaces, NamedWrite::new(&p.namespace))
            .await?;
        Ok(PrefixWrite {
            prefix: p.prefix.clone(),
            namespace,
            status: self.status_id(p.status).await?,
            description: p.description.clone().unwrap_or_default(),
            vrf: self
                .optional_ref(Endpoint::Vrfs, "VRF", p.vrf.as_deref(), key.clone())
                .await?,
            location: self
                .optional_ref(Endpoint::Locations, "location", p.location.as_deref(), key)
                .await?,
        })
    }

    async fn ip_address_body(&mut self, a: &IpAddress) -> Result<IpAddressWrite, CoreError> {
        let namespace = self
            .get_or_create_named(Endpoint::Namespaces, NamedWrite::new(&a.namespace))
            .await?;
        Ok(IpAddressWrite {
            address: a.address.clone(),
            namespace,
            status: self.status_id(a.status).await?,
            dns_name: a.dns_name.clone().unwrap_or_default(),
            description: a.description.clone().unwrap_or_default(),
        })
    }

    async fn circuit_body(&mut self, c: &Circuit) -> Result<CircuitWrite, CoreError> {
        let provider = self
            .get_or_create_named(Endpoint::Providers, NamedWrite::new(&c.provider))
            .await?;
        let circuit_type = self
            .get_or_create_named(Endpoint::CircuitTypes, NamedWrite::new(&c.circuit_type))
            .await?;
        Ok(CircuitWrite {
            cid: c.cid.clone(),
            provider,
            circuit_type,
            status: self.status_id(c.status).await?,
            description: c.description.clone().unwrap_or_default(),
            commit_rate: c.commit_rate,
            comments: c.comments.clone().unwrap_or_default(),
        })
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Create (no `existing` id) or patch the record for `entity`.
    async fn write(&mut self, entity: &Entity, existing: Option<Uuid>) -> Result<Uuid, CoreError> {
        let endpoint = endpoint_for(entity.kind());
        let created = match entity {
            Entity::Location(l) => {
                let body = self.location_body(l).await?;
                self.send(endpoint, existing, &body).await?
            }
            Entity::Device(d) => {
                let body = self.device_body(d).await?;
                self.send(endpoint, existing, &body).await?
            }
            Entity::Interface(i) => {
                let body = self.interface_body(i).await?;
                self.send(endpoint, existing, &body).await?
            }
            Entity::Prefix(p) => {
                let body = self.prefix_body(p).await?;
                self.send(endpoint, existing, &body).await?
            }
            Entity::IpAddress(a) => {
                let body = self.ip_address_body(a).await?;
                self.send(endpoint, existing, &body).await?
            }
            Entity::Circuit(c) => {
                let body = self.circuit_body(c).await?;
                self.send(endpoint, existing, &body).await?
            }
        };

        // Devices are referenced by later interface writes in the same run.
        if let Entity::Device(d) = entity {
            self.ids.insert((Endpoint::Devices, d.name.clone()), created.id);
        }
        Ok(created.id)
    }

    async fn send<B: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        existing: Option<Uuid>,
        body: &B,
    ) -> Result<Created, CoreError> {
        let created = match existing {
            Some(id) => self.client.update(endpoint, &id, body).await?,
            None => self.client.create(endpoint, body).await?,
        };
        Ok(created)
    }
}

impl TargetStore for RestTarget {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, CoreError> {
        let endpoint = endpoint_for(kind);
        match kind {
            EntityKind::Location => self.list_as::<LocationRecord>(endpoint).await,
            EntityKind::Device => self.list_as::<DeviceRecord>(endpoint).await,
            EntityKind::Interface => self.list_as::<InterfaceRecord>(endpoint).await,
            EntityKind::Prefix => self.list_as::<PrefixRecord>(endpoint).await,
            EntityKind::IpAddress => self.list_as::<IpAddressRecord>(endpoint).await,
            EntityKind::Circuit => self.list_as::<CircuitRecord>(endpoint).await,
        }
    }

    async fn lookup(
        &self,
        kind: EntityKind,
        key: &IdentityKey,
    ) -> Result<Option<(Entity, TargetRef)>, CoreError> {
        let part = |i: usize| key.parts().get(i).cloned().unwrap_or_default();
        match kind {
            EntityKind::Location => {
                self.find_as::<LocationRecord>(kind, &[("name", part(0))]).await
            }
            EntityKind::Device => self.find_as::<DeviceRecord>(kind, &[("name", part(0))]).await,
            EntityKind::Interface => {
                self.find_as::<InterfaceRecord>(kind, &[("device", part(0)), ("name", part(1))])
                    .await
            }
            EntityKind::Prefix => {
                self.find_as::<PrefixRecord>(kind, &[("prefix", part(0)), ("namespace", part(1))])
                    .await
            }
            EntityKind::IpAddress => {
                self.find_as::<IpAddressRecord>(
                    kind,
                    &[("address", part(0)), ("namespace", part(1))],
                )
                .await
            }
            EntityKind::Circuit => {
                self.find_as::<CircuitRecord>(kind, &[("cid", part(0)), ("provider", part(1))])
                    .await
            }
        }
    }

    async fn create(&mut self, entity: &Entity) -> Result<TargetRef, CoreError> {
        let id = self.write(entity, None).await?;
        Ok(TargetRef {
            kind: entity.kind(),
            id: id.to_string(),
        })
    }

    async fn update(&mut self, reference: &TargetRef, entity: &Entity) -> Result<(), CoreError> {
        let id = Uuid::parse_str(&reference.id).map_err(|e| {
            CoreError::Internal(format!("invalid target reference {reference}: {e}"))
        })?;
        self.write(entity, Some(id)).await?;
        Ok(())
    }
}

// ── Record ids ───────────────────────────────────────────────────────

/// Records that carry their own id.
trait HasId {
    fn id(&self) -> Uuid;
}

macro_rules! has_id {
    ($($record:ty),* $(,)?) => {
        $(impl HasId for $record {
            fn id(&self) -> Uuid {
                self.id
            }
        })*
    };
}

has_id!(
    LocationRecord,
    DeviceRecord,
    InterfaceRecord,
    PrefixRecord,
    IpAddressRecord,
    CircuitRecord,
);

fn status_color(status: CanonicalStatus) -> &'static str {
    match status {
        CanonicalStatus::Active => "4caf50",
        CanonicalStatus::Decommissioned => "9e9e9e",
        CanonicalStatus::Failed => "f44336",
        CanonicalStatus::Planned => "00bcd4",
        CanonicalStatus::Staged => "2196f3",
        CanonicalStatus::Reserved => "ffc107",
    }
}
