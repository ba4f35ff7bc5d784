// ── Diff, policy gate, apply ──

pub mod diff;
pub mod engine;
pub mod policy;
pub mod report;

pub use diff::{Action, AttrChange, DiffEntry, EntityState, diff};
pub use engine::{SyncEngine, SyncPlan};
pub use policy::{ConflictPolicies, ConflictPolicy, Verdict};
pub use report::{Failure, FlaggedChange, KindCounts, SyncReport};
