//! # conflict-engine
//!
//! Deterministic conflict detection for recurring timetable sessions.
//!
//! Given a snapshot of teaching sessions, each with a weekly recurrence
//! pattern, a day/time window, and assignments to a room, a teacher, and
//! student population groups, the engine reports which pairs collide in
//! time, share a resource, and actually meet on a common calendar date.
//! Reports are advisory: nothing here prevents a conflicting session from
//! being saved.
//!
//! ## Modules
//!
//! - [`model`] — Sessions, rooms, teachers, population groups, input validation
//! - [`recurrence`] — Weekly / biweekly / catchup intersection with a fixed parity epoch
//! - [`hierarchy`] — Branch → TD → TP ancestry lookup and population closure
//! - [`resolver`] — Shared-resource tagging (ROOM, TEACHER, BRANCH, TD, TP)
//! - [`classifier`] — Pairwise conflict classification
//! - [`service`] — The four query shapes over a live snapshot
//! - [`store`] — Collaborator read traits and an in-memory store
//! - [`expander`] — RRULE-based expansion of concrete occurrence dates
//! - [`config`] — Parity epoch and academic term configuration
//! - [`error`] — Error types

pub mod classifier;
pub mod config;
pub mod error;
pub mod expander;
pub mod hierarchy;
pub mod model;
pub mod recurrence;
pub mod resolver;
pub mod service;
pub mod store;

pub use classifier::{Conflict, ConflictClassifier, SessionConflict};
pub use config::{AcademicTerm, EngineConfig, DEFAULT_PARITY_EPOCH};
pub use error::{ConflictError, Result};
pub use expander::{expand_occurrences, first_shared_occurrence};
pub use hierarchy::{PopulationClosure, PopulationHierarchy};
pub use model::{
    Recurrence, Room, RoomId, Session, SessionDraft, SessionId, SessionKind, TeacherId,
    WeekParity,
};
pub use recurrence::RecurrenceEvaluator;
pub use resolver::{overlap, ResolvedSession, ResourceTag};
pub use service::ConflictService;
pub use store::{InMemoryStore, SessionRepository, SnapshotDocument};
