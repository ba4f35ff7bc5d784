// End-to-end reconciliation runs against in-memory stores.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use invsync_core::reconcile::EntityState;
use invsync_core::{
    CanonicalStatus, ConflictPolicies, ConflictPolicy, Entity, EntityKind, FieldMap, IdentityKey,
    MemorySource, MemoryTarget, Projections, SyncEngine,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn location(name: &str, status: &str) -> FieldMap {
    FieldMap::new().with("name", name).with("status", status)
}

fn device(name: &str, location: &str, status: &str) -> FieldMap {
    FieldMap::new()
        .with("name", name)
        .with("location", location)
        .with("status", status)
        .with("device_type", "ISR4451")
        .with("manufacturer", "Cisco")
        .with("role", "Router")
}

fn seeded(kind: EntityKind, row: &FieldMap) -> Entity {
    let mut entity = Entity::from_fields(kind, row);
    entity.normalize_defaults();
    entity
}

fn status_of(target: &MemoryTarget, kind: EntityKind, key: &str) -> CanonicalStatus {
    target
        .get(kind, &IdentityKey::single(key))
        .unwrap()
        .status()
}

async fn run(
    source: &MemorySource,
    target: &mut MemoryTarget,
    policies: ConflictPolicies,
) -> invsync_core::SyncReport {
    SyncEngine::new(policies)
        .run(source, &Projections::default(), target)
        .await
        .unwrap()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_location_is_created_once() {
    let source =
        MemorySource::new().with_rows(EntityKind::Location, vec![location("NYC-DC1", "up")]);
    let mut target = MemoryTarget::new();

    let first = run(&source, &mut target, ConflictPolicies::default()).await;
    assert_eq!(first.counts_for(EntityKind::Location).created, 1);
    assert_eq!(
        status_of(&target, EntityKind::Location, "NYC-DC1"),
        CanonicalStatus::Active
    );

    let second = run(&source, &mut target, ConflictPolicies::default()).await;
    let totals = second.totals();
    assert_eq!(totals.created, 0);
    assert_eq!(totals.updated, 0);
    assert_eq!(second.counts_for(EntityKind::Location).unchanged, 1);
    assert_eq!(target.create_count(), 1);
}

#[tokio::test]
async fn test_skip_policy_leaves_conflicting_device_alone() {
    let source = MemorySource::new()
        .with_rows(EntityKind::Location, vec![location("NYC-DC1", "active")])
        .with_rows(
            EntityKind::Device,
            vec![
                device("router01", "NYC-DC1", "down"),
                device("router02", "NYC-DC1", "active"),
            ],
        );
    let mut target = MemoryTarget::new();
    target.seed(seeded(EntityKind::Location, &location("NYC-DC1", "active")));
    target.seed(seeded(
        EntityKind::Device,
        &device("router01", "NYC-DC1", "active"),
    ));

    let policies = ConflictPolicies::default().with(EntityKind::Device, ConflictPolicy::Skip);
    let report = run(&source, &mut target, policies).await;

    let counts = report.counts_for(EntityKind::Device);
    assert_eq!(counts.skipped, 1);
    assert_eq!(counts.updated, 0);
    // Skip only suppresses updates.
    assert_eq!(counts.created, 1);
    assert_eq!(
        status_of(&target, EntityKind::Device, "router01"),
        CanonicalStatus::Active
    );
    assert_eq!(target.update_count(), 0);
}

#[tokio::test]
async fn test_flag_policy_records_without_mutating() {
    let source = MemorySource::new().with_rows(
        EntityKind::Location,
        vec![location("NYC-DC1", "planned"), location("CHI-DC2", "active")],
    );
    let mut target = MemoryTarget::new();
    target.seed(seeded(EntityKind::Location, &location("NYC-DC1", "active")));

    let policies = ConflictPolicies::uniform(ConflictPolicy::Flag);
    let report = run(&source, &mut target, policies).await;

    assert_eq!(report.counts_for(EntityKind::Location).flagged, 2);
    assert_eq!(report.flagged.len(), 2);
    assert_eq!(report.flagged[0].key, IdentityKey::single("NYC-DC1"));
    assert_eq!(report.flagged[0].changes[0].field, "status");
    assert_eq!(target.create_count() + target.update_count(), 0);
    assert_eq!(target.len(), 1);
}

#[tokio::test]
async fn test_overwrite_policy_converges_target_to_source() {
    let source = MemorySource::new()
        .with_rows(EntityKind::Location, vec![location("NYC-DC1", "active")])
        .with_rows(
            EntityKind::Device,
            vec![device("router01", "NYC-DC1", "disabled")],
        );
    let mut target = MemoryTarget::new();
    target.seed(seeded(EntityKind::Location, &location("NYC-DC1", "active")));
    target.seed(seeded(
        EntityKind::Device,
        &device("router01", "NYC-DC1", "active"),
    ));

    let report = run(&source, &mut target, ConflictPolicies::default()).await;
    assert_eq!(report.counts_for(EntityKind::Device).updated, 1);
    assert_eq!(
        status_of(&target, EntityKind::Device, "router01"),
        CanonicalStatus::Decommissioned
    );

    let plan = SyncEngine::default()
        .plan(&source, &Projections::default(), &target)
        .await
        .unwrap();
    assert!(
        plan.entries
            .iter()
            .all(|e| e.state == EntityState::MatchedEqual)
    );
}

#[tokio::test]
async fn test_interfaces_are_applied_after_their_devices() {
    let source = MemorySource::new()
        .with_rows(
            EntityKind::Device,
            vec![device("router01", "NYC-DC1", "active")],
        )
        .with_rows(
            EntityKind::Interface,
            vec![
                FieldMap::new()
                    .with("device", "router01")
                    .with("name", "Gi0/0")
                    .with("mac_address", "AABBCCDDEEFF"),
            ],
        );
    let mut target = MemoryTarget::new();

    let report = run(&source, &mut target, ConflictPolicies::default()).await;

    assert!(!report.has_failures());
    assert_eq!(report.counts_for(EntityKind::Device).created, 1);
    assert_eq!(report.counts_for(EntityKind::Interface).created, 1);
}

#[tokio::test]
async fn test_source_kind_failure_is_reported_and_others_proceed() {
    let source = MemorySource::new()
        .with_rows(EntityKind::Location, vec![location("NYC-DC1", "active")])
        .with_failure(EntityKind::Circuit, "relation \"nc_circuit\" does not exist");
    let mut target = MemoryTarget::new();

    let report = run(&source, &mut target, ConflictPolicies::default()).await;

    assert_eq!(report.counts_for(EntityKind::Location).created, 1);
    assert_eq!(report.load_failures.len(), 1);
    assert_eq!(report.load_failures[0].kind, EntityKind::Circuit);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_target_only_entities_are_never_deleted() {
    let source = MemorySource::new();
    let mut target = MemoryTarget::new();
    target.seed(seeded(EntityKind::Location, &location("LEGACY", "active")));

    let report = run(&source, &mut target, ConflictPolicies::default()).await;

    assert_eq!(report.counts_for(EntityKind::Location).target_only, 1);
    assert_eq!(target.len(), 1);
}
