//! Entity graph and reconciliation engine between a relational source and
//! the canonical inventory store.
//!
//! - **Domain model** ([`model`]) — six entity kinds with identity keys,
//!   comparable attributes and the canonical status vocabulary.
//!
//! - **[`Graph`]** — arena keyed by (kind, identity key) with a parent
//!   side-table. A missing parent is recorded, never an error.
//!
//! - **Loaders** — [`SourceLoader`] reads configured [`Projections`] from a
//!   [`SourceStore`] (PostgreSQL via [`PgSource`]), tolerating per-kind
//!   failure. [`load_target`] reads a [`TargetStore`] (REST via
//!   [`RestTarget`]) in full.
//!
//! - **[`SyncEngine`]** — pure [`diff`](reconcile::diff()) followed by a
//!   per-kind [`ConflictPolicy`] gate and hierarchy-ordered apply,
//!   producing a [`SyncReport`].
//!
//! - **Schema discovery** ([`discovery`]) — keyword scoring of unknown
//!   source tables against entity kinds.

pub mod config;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod model;
pub mod reconcile;
pub mod source;
pub mod target;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SourceConfig, SslMode, TargetConfig, TlsVerification};
pub use discovery::{SchemaIntrospector, SchemaReport, discover};
pub use error::CoreError;
pub use graph::Graph;
pub use reconcile::{
    ConflictPolicies, ConflictPolicy, DiffEntry, EntityState, SyncEngine, SyncPlan, SyncReport,
};
pub use source::{
    MemorySource, PgSource, Projection, ProjectionOverride, Projections, SourceLoader, SourceStore,
};
pub use target::{MemoryTarget, RestTarget, TargetRef, TargetStore, load_target};

pub use model::{
    CanonicalStatus, Circuit, Device, Entity, EntityKind, FieldMap, FieldValue, IdentityKey,
    Interface, IpAddress, Location, MacAddress, Prefix,
};
