//! Collaborator read interfaces and an in-memory implementation.
//!
//! [`SessionRepository`] and [`PopulationHierarchy`] are what the conflict
//! service consumes. [`InMemoryStore`] implements both; it backs the CLI
//! (loaded from a JSON [`SnapshotDocument`]) and the tests.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::{ConflictError, Result};
use crate::hierarchy::PopulationHierarchy;
use crate::model::{
    Branch, BranchId, PracticalGroup, PracticalGroupId, Room, RoomId, Session, SessionDraft,
    SessionId, Teacher, TeacherId, TutorialGroup, TutorialGroupId,
};

/// Read access to sessions and the rooms/teachers they reference.
pub trait SessionRepository {
    fn list_sessions(&self) -> Result<Vec<Session>>;
    fn find_session(&self, id: SessionId) -> Result<Option<Session>>;
    fn find_room(&self, id: RoomId) -> Result<Option<Room>>;
    fn find_teacher(&self, id: TeacherId) -> Result<Option<Teacher>>;
}

impl<R: SessionRepository + ?Sized> SessionRepository for &R {
    fn list_sessions(&self) -> Result<Vec<Session>> {
        (**self).list_sessions()
    }

    fn find_session(&self, id: SessionId) -> Result<Option<Session>> {
        (**self).find_session(id)
    }

    fn find_room(&self, id: RoomId) -> Result<Option<Room>> {
        (**self).find_room(id)
    }

    fn find_teacher(&self, id: TeacherId) -> Result<Option<Teacher>> {
        (**self).find_teacher(id)
    }
}

/// Serialized form of a full timetable snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub tutorial_groups: Vec<TutorialGroup>,
    #[serde(default)]
    pub practical_groups: Vec<PracticalGroup>,
    #[serde(default)]
    pub sessions: Vec<SessionDraft>,
}

#[derive(Debug, Default)]
struct StoreData {
    rooms: BTreeMap<RoomId, Room>,
    teachers: BTreeMap<TeacherId, Teacher>,
    branches: BTreeMap<BranchId, Branch>,
    tutorial_groups: BTreeMap<TutorialGroupId, TutorialGroup>,
    practical_groups: BTreeMap<PracticalGroupId, PracticalGroup>,
    sessions: BTreeMap<SessionId, Session>,
    available: bool,
}

/// Thread-safe in-memory timetable store.
///
/// Cloning shares the underlying data, so a clone handed to a
/// [`crate::ConflictService`] observes later writes through the original.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    data: Arc<RwLock<StoreData>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData {
                available: true,
                ..Default::default()
            })),
        }
    }

    /// Build a store from a snapshot document, validating every session and
    /// every ancestry link.
    pub fn from_snapshot(doc: SnapshotDocument) -> Result<Self> {
        let store = Self::new();
        for room in doc.rooms {
            store.insert_room(room)?;
        }
        for teacher in doc.teachers {
            store.insert_teacher(teacher)?;
        }
        for branch in doc.branches {
            store.insert_branch(branch)?;
        }
        for group in doc.tutorial_groups {
            store.insert_tutorial_group(group)?;
        }
        for group in doc.practical_groups {
            store.insert_practical_group(group)?;
        }
        for draft in &doc.sessions {
            store.insert_session(draft.validate()?)?;
        }
        Ok(store)
    }

    /// Parse a JSON snapshot document and build a store from it.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SnapshotDocument = serde_json::from_str(json)
            .map_err(|e| ConflictError::Validation(format!("invalid snapshot: {e}")))?;
        Self::from_snapshot(doc)
    }

    pub fn insert_room(&self, room: Room) -> Result<()> {
        self.write()?.rooms.insert(room.id, room);
        Ok(())
    }

    pub fn insert_teacher(&self, teacher: Teacher) -> Result<()> {
        self.write()?.teachers.insert(teacher.id, teacher);
        Ok(())
    }

    pub fn insert_branch(&self, branch: Branch) -> Result<()> {
        self.write()?.branches.insert(branch.id, branch);
        Ok(())
    }

    pub fn insert_tutorial_group(&self, group: TutorialGroup) -> Result<()> {
        let mut data = self.write()?;
        if !data.branches.contains_key(&group.branch) {
            return Err(ConflictError::not_found(group.branch));
        }
        data.tutorial_groups.insert(group.id, group);
        Ok(())
    }

    pub fn insert_practical_group(&self, group: PracticalGroup) -> Result<()> {
        let mut data = self.write()?;
        if !data.tutorial_groups.contains_key(&group.tutorial_group) {
            return Err(ConflictError::not_found(group.tutorial_group));
        }
        data.practical_groups.insert(group.id, group);
        Ok(())
    }

    /// Insert or replace a session. Its room, teacher, and every population
    /// group it references must exist.
    ///
    /// Conflicts are never checked here; saving is always permitted.
    pub fn insert_session(&self, session: Session) -> Result<()> {
        let mut data = self.write()?;
        if let Some(room) = session.room() {
            if !data.rooms.contains_key(&room) {
                return Err(ConflictError::not_found(room));
            }
        }
        if let Some(teacher) = session.teacher() {
            if !data.teachers.contains_key(&teacher) {
                return Err(ConflictError::not_found(teacher));
            }
        }
        let population = session.population();
        if let Some(branch) = population
            .branches
            .iter()
            .find(|b| !data.branches.contains_key(b))
        {
            return Err(ConflictError::not_found(branch));
        }
        if let Some(td) = population
            .tutorial_groups
            .iter()
            .find(|g| !data.tutorial_groups.contains_key(g))
        {
            return Err(ConflictError::not_found(td));
        }
        if let Some(tp) = population
            .practical_groups
            .iter()
            .find(|g| !data.practical_groups.contains_key(g))
        {
            return Err(ConflictError::not_found(tp));
        }
        data.sessions.insert(session.id(), session);
        Ok(())
    }

    pub fn remove_session(&self, id: SessionId) -> Result<Option<Session>> {
        Ok(self.write()?.sessions.remove(&id))
    }

    /// Toggle availability. While unavailable every read fails with
    /// [`ConflictError::Internal`], simulating a persistence outage.
    pub fn set_available(&self, available: bool) -> Result<()> {
        self.write()?.available = available;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreData>> {
        let data = self
            .data
            .read()
            .map_err(|_| ConflictError::Internal("store lock poisoned".to_string()))?;
        if !data.available {
            return Err(ConflictError::Internal("store unavailable".to_string()));
        }
        Ok(data)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreData>> {
        self.data
            .write()
            .map_err(|_| ConflictError::Internal("store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemoryStore {
    fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.read()?.sessions.values().cloned().collect())
    }

    fn find_session(&self, id: SessionId) -> Result<Option<Session>> {
        Ok(self.read()?.sessions.get(&id).cloned())
    }

    fn find_room(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.read()?.rooms.get(&id).cloned())
    }

    fn find_teacher(&self, id: TeacherId) -> Result<Option<Teacher>> {
        Ok(self.read()?.teachers.get(&id).cloned())
    }
}

impl PopulationHierarchy for InMemoryStore {
    fn branch_exists(&self, branch: BranchId) -> Result<bool> {
        Ok(self.read()?.branches.contains_key(&branch))
    }

    fn branch_of(&self, group: TutorialGroupId) -> Result<BranchId> {
        self.read()?
            .tutorial_groups
            .get(&group)
            .map(|g| g.branch)
            .ok_or_else(|| ConflictError::not_found(group))
    }

    fn parents_of(&self, group: PracticalGroupId) -> Result<(TutorialGroupId, BranchId)> {
        let td = self
            .read()?
            .practical_groups
            .get(&group)
            .map(|g| g.tutorial_group)
            .ok_or_else(|| ConflictError::not_found(group))?;
        Ok((td, self.branch_of(td)?))
    }
}
