//! Conflict query service: the four report shapes consumed by the
//! controller layer.
//!
//! Every call reads one fresh snapshot from the [`SessionRepository`],
//! resolves population ancestry through the [`PopulationHierarchy`] up
//! front, then evaluates entirely against that snapshot. Nothing is cached
//! between calls and nothing is written: results are advisory.

use chrono::{Datelike, Weekday};
use tracing::{debug, instrument, trace, warn};

use crate::classifier::{Conflict, ConflictClassifier, SessionConflict};
use crate::config::EngineConfig;
use crate::error::{ConflictError, Result};
use crate::hierarchy::PopulationHierarchy;
use crate::model::{SessionDraft, SessionId};
use crate::recurrence::RecurrenceEvaluator;
use crate::resolver::{ResolvedSession, ResourceTag};
use crate::store::{InMemoryStore, SessionRepository};

pub struct ConflictService<R, H> {
    repository: R,
    hierarchy: H,
    classifier: ConflictClassifier,
}

impl ConflictService<InMemoryStore, InMemoryStore> {
    /// Service backed by a single in-memory store for both collaborators.
    pub fn in_memory(store: InMemoryStore, config: &EngineConfig) -> Self {
        Self::new(store.clone(), store, config)
    }
}

impl<R: SessionRepository, H: PopulationHierarchy> ConflictService<R, H> {
    pub fn new(repository: R, hierarchy: H, config: &EngineConfig) -> Self {
        Self {
            repository,
            hierarchy,
            classifier: ConflictClassifier::new(RecurrenceEvaluator::new(config.parity_epoch)),
        }
    }

    pub fn classifier(&self) -> &ConflictClassifier {
        &self.classifier
    }

    /// Every conflicting unordered pair in the current snapshot, sorted by
    /// `(sessionAId, sessionBId)` with `sessionAId < sessionBId`.
    #[instrument(skip(self))]
    pub fn all_conflicts(&self) -> Result<Vec<Conflict>> {
        let snapshot = self.snapshot()?;
        let buckets = bucket_by_day(&snapshot);

        let mut conflicts = Vec::new();
        for bucket in &buckets {
            for (i, a) in bucket.iter().enumerate() {
                for b in &bucket[i + 1..] {
                    if let Some(conflict) = self.classifier.classify(a, b) {
                        trace!(a = %conflict.session_a_id, b = %conflict.session_b_id, "conflict");
                        conflicts.push(conflict);
                    }
                }
            }
        }

        conflicts.sort_by_key(|c| (c.session_a_id, c.session_b_id));
        debug!(conflicts = conflicts.len(), "all-pairs evaluation done");
        Ok(conflicts)
    }

    /// Room-focused report: conflicts sharing a room, with every other tag
    /// dropped.
    #[instrument(skip(self))]
    pub fn room_conflicts(&self) -> Result<Vec<Conflict>> {
        let conflicts = self
            .all_conflicts()?
            .into_iter()
            .filter(|c| c.tags.contains(&ResourceTag::Room))
            .map(|mut c| {
                c.tags.retain(|tag| *tag == ResourceTag::Room);
                c
            })
            .collect();
        Ok(conflicts)
    }

    /// Conflicts involving `id`, each seen from `id` (other side's id plus
    /// tags), sorted by the other side's id.
    ///
    /// # Errors
    ///
    /// [`ConflictError::NotFound`] if `id` is not in the snapshot.
    #[instrument(skip(self), fields(session = %id))]
    pub fn conflicts_for_session(&self, id: SessionId) -> Result<Vec<SessionConflict>> {
        let snapshot = self.snapshot()?;
        let target = snapshot
            .iter()
            .find(|s| s.session.id() == id)
            .ok_or_else(|| ConflictError::not_found(id))?;

        let found = self.against_snapshot(target, &snapshot, Some(id));
        debug!(conflicts = found.len(), "session evaluation done");
        Ok(found)
    }

    /// Evaluate a hypothetical session against every stored session.
    ///
    /// The candidate is never persisted and a non-empty result never blocks
    /// anything; it is surfaced as a warning. If the draft carries an `id`,
    /// it names the stored session being edited, which is left out of the
    /// comparison.
    ///
    /// # Errors
    ///
    /// - [`ConflictError::Validation`] for malformed draft fields, checked
    ///   before any comparison runs.
    /// - [`ConflictError::NotFound`] for an unknown replaced session, room,
    ///   teacher, or population group.
    #[instrument(skip(self, candidate), fields(replaces = ?candidate.id))]
    pub fn conflicts_for_candidate(&self, candidate: &SessionDraft) -> Result<Vec<SessionConflict>> {
        let replaces = candidate.id.map(SessionId);
        let session = candidate.validate_as(replaces.unwrap_or(SessionId::UNSAVED))?;

        if let Some(room) = session.room() {
            self.repository
                .find_room(room)?
                .ok_or_else(|| ConflictError::not_found(room))?;
        }
        if let Some(teacher) = session.teacher() {
            self.repository
                .find_teacher(teacher)?
                .ok_or_else(|| ConflictError::not_found(teacher))?;
        }

        let candidate = ResolvedSession::resolve(session, &self.hierarchy)?;
        let snapshot = self.snapshot()?;
        if let Some(id) = replaces {
            if !snapshot.iter().any(|s| s.session.id() == id) {
                return Err(ConflictError::not_found(id));
            }
        }

        let found = self.against_snapshot(&candidate, &snapshot, replaces);
        if !found.is_empty() {
            warn!(
                conflicts = found.len(),
                "candidate conflicts with existing sessions; saving is still permitted"
            );
        }
        Ok(found)
    }

    /// Compare `target` with every snapshot session on the same effective
    /// day, skipping the stored session `exclude` names. No other session is
    /// skipped, whatever id `target` carries.
    fn against_snapshot(
        &self,
        target: &ResolvedSession,
        snapshot: &[ResolvedSession],
        exclude: Option<SessionId>,
    ) -> Vec<SessionConflict> {
        let day = target.session.effective_day();
        snapshot
            .iter()
            .filter(|s| Some(s.session.id()) != exclude && s.session.effective_day() == day)
            .filter_map(|other| {
                self.classifier.classify_distinct(other, target).map(|c| SessionConflict {
                    session_id: other.session.id(),
                    tags: c.tags,
                })
            })
            .collect()
    }

    /// Read the session list once and resolve every session's ancestry.
    /// The result is sorted by id.
    fn snapshot(&self) -> Result<Vec<ResolvedSession>> {
        let mut sessions = self.repository.list_sessions()?;
        sessions.sort_by_key(|s| s.id());
        debug!(sessions = sessions.len(), "snapshot loaded");

        sessions
            .into_iter()
            .map(|session| ResolvedSession::resolve(session, &self.hierarchy))
            .collect()
    }
}

/// Group sessions by effective weekday, preserving input order in each
/// bucket. Sessions on different weekdays never conflict.
fn bucket_by_day(snapshot: &[ResolvedSession]) -> [Vec<&ResolvedSession>; 7] {
    let mut buckets: [Vec<&ResolvedSession>; 7] = Default::default();
    for s in snapshot {
        buckets[day_index(s.session.effective_day())].push(s);
    }
    buckets
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}
