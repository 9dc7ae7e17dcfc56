//! Conflict classification: time overlap + recurrence intersection +
//! resource overlap → tagged [`Conflict`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::SessionId;
use crate::recurrence::RecurrenceEvaluator;
use crate::resolver::{overlap, ResolvedSession, ResourceTag};

/// A collision between two sessions, tagged by the resources they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub session_a_id: SessionId,
    pub session_b_id: SessionId,
    #[serde(rename = "conflictTypes")]
    pub tags: BTreeSet<ResourceTag>,
}

impl Conflict {
    /// The conflict as seen from `id`: the other side's id and the tags.
    /// `None` if `id` is not part of this conflict.
    pub fn seen_from(&self, id: SessionId) -> Option<SessionConflict> {
        let other = if self.session_a_id == id {
            self.session_b_id
        } else if self.session_b_id == id {
            self.session_a_id
        } else {
            return None;
        };
        Some(SessionConflict {
            session_id: other,
            tags: self.tags.clone(),
        })
    }
}

/// Single-session view of a conflict: the colliding session and the shared
/// resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConflict {
    pub session_id: SessionId,
    #[serde(rename = "conflictTypes")]
    pub tags: BTreeSet<ResourceTag>,
}

/// Combines the recurrence evaluator and resource resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictClassifier {
    recurrence: RecurrenceEvaluator,
}

impl ConflictClassifier {
    pub fn new(recurrence: RecurrenceEvaluator) -> Self {
        Self { recurrence }
    }

    pub fn recurrence(&self) -> &RecurrenceEvaluator {
        &self.recurrence
    }

    /// Classify the pair `(a, b)`.
    ///
    /// Produces a conflict iff the sessions are distinct, meet on the same
    /// effective weekday, their half-open time windows overlap, their
    /// recurrences share a calendar occurrence, and at least one resource is
    /// shared. The result's ids follow argument order.
    pub fn classify(&self, a: &ResolvedSession, b: &ResolvedSession) -> Option<Conflict> {
        if a.session.id() == b.session.id() {
            return None;
        }
        self.classify_distinct(a, b)
    }

    /// Classify a pair the caller already knows to be two different
    /// sessions. Ids are not compared, so an unsaved candidate can be
    /// checked against a stored session carrying any id.
    pub(crate) fn classify_distinct(
        &self,
        a: &ResolvedSession,
        b: &ResolvedSession,
    ) -> Option<Conflict> {
        let (sa, sb) = (&a.session, &b.session);

        if sa.effective_day() != sb.effective_day() {
            return None;
        }
        if !sa.overlaps_in_time(sb) {
            return None;
        }
        if !self
            .recurrence
            .intersects(sa.day(), sa.recurrence(), sb.day(), sb.recurrence())
        {
            return None;
        }

        let tags = overlap(a, b);
        if tags.is_empty() {
            return None;
        }

        Some(Conflict {
            session_a_id: sa.id(),
            session_b_id: sb.id(),
            tags,
        })
    }
}
