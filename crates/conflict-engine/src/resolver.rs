//! Resource-overlap resolution: which resources two sessions share.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hierarchy::{PopulationClosure, PopulationHierarchy};
use crate::model::Session;

/// Why two sessions collide. Ordered ROOM < TEACHER < BRANCH < TD < TP so
/// that tag sets serialize in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceTag {
    Room,
    Teacher,
    Branch,
    Td,
    Tp,
}

impl ResourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTag::Room => "ROOM",
            ResourceTag::Teacher => "TEACHER",
            ResourceTag::Branch => "BRANCH",
            ResourceTag::Td => "TD",
            ResourceTag::Tp => "TP",
        }
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session paired with its resolved population ancestry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub session: Session,
    pub population: PopulationClosure,
}

impl ResolvedSession {
    pub fn resolve<H: PopulationHierarchy>(session: Session, hierarchy: &H) -> Result<Self> {
        let population = PopulationClosure::resolve(session.population(), hierarchy)?;
        Ok(Self {
            session,
            population,
        })
    }
}

/// Resource tags shared by `a` and `b`; empty when nothing is shared.
///
/// - `ROOM` / `TEACHER`: both assigned and equal.
/// - `BRANCH`: a branch assigned on one side is assigned to or an ancestor
///   of a group on the other side.
/// - `TD`: same rule one level down.
/// - `TP`: the same practical group is assigned on both sides.
pub fn overlap(a: &ResolvedSession, b: &ResolvedSession) -> BTreeSet<ResourceTag> {
    let mut tags = BTreeSet::new();

    if matches!((a.session.room(), b.session.room()), (Some(x), Some(y)) if x == y) {
        tags.insert(ResourceTag::Room);
    }
    if matches!((a.session.teacher(), b.session.teacher()), (Some(x), Some(y)) if x == y) {
        tags.insert(ResourceTag::Teacher);
    }
    if !a.population.shared_branches(&b.population).is_empty() {
        tags.insert(ResourceTag::Branch);
    }
    if !a
        .population
        .shared_tutorial_groups(&b.population)
        .is_empty()
    {
        tags.insert(ResourceTag::Td);
    }
    if !a
        .population
        .shared_practical_groups(&b.population)
        .is_empty()
    {
        tags.insert(ResourceTag::Tp);
    }

    tags
}
