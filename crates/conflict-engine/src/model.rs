//! Timetable data model: sessions, rooms, teachers, and the population hierarchy.
//!
//! [`Session`] values are immutable snapshots. The only way to obtain one is
//! through [`SessionDraft`], which validates the raw transport fields
//! (day label, `HH:MM` times, recurrence label, catchup date) at the
//! boundary so the rest of the engine never sees a malformed session.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ConflictError, Result};

// ── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of a scheduled session.
    SessionId,
    "session"
);
id_type!(RoomId, "room");
id_type!(TeacherId, "teacher");
id_type!(BranchId, "branch");
id_type!(TutorialGroupId, "td");
id_type!(PracticalGroupId, "tp");

impl SessionId {
    /// Id carried by a candidate that does not replace a stored session.
    /// Placeholder only: the service never matches sessions by it.
    pub const UNSAVED: SessionId = SessionId(0);
}

// ── Recurrence ──────────────────────────────────────────────────────────────

/// Which alternating week a biweekly session meets on, counted from the
/// configured parity epoch (week 0 is even).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    #[default]
    Even,
    Odd,
}

impl WeekParity {
    pub fn from_week_index(index: i64) -> Self {
        if index.rem_euclid(2) == 0 {
            WeekParity::Even
        } else {
            WeekParity::Odd
        }
    }
}

/// Recurrence pattern of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "camelCase")]
pub enum Recurrence {
    /// Every week on the session's day.
    Weekly,
    /// Every other week on the session's day.
    Biweekly { parity: WeekParity },
    /// A single make-up occurrence on a concrete date.
    Catchup { date: NaiveDate },
}

impl Recurrence {
    /// Parse a recurrence label plus the optional catchup date.
    ///
    /// Accepted labels (case-insensitive): `weekly`, `biweekly`,
    /// `biweekly:even`, `biweekly:odd`, `catchup`. A date is required for
    /// `catchup` and rejected for every other label.
    pub fn parse(label: &str, date: Option<&str>) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        let recurrence = match normalized.as_str() {
            "weekly" => Recurrence::Weekly,
            "biweekly" | "biweekly:even" => Recurrence::Biweekly {
                parity: WeekParity::Even,
            },
            "biweekly:odd" => Recurrence::Biweekly {
                parity: WeekParity::Odd,
            },
            "catchup" => {
                let raw = date.ok_or_else(|| {
                    ConflictError::validation("catchup recurrence requires a date")
                })?;
                return Ok(Recurrence::Catchup {
                    date: parse_date(raw)?,
                });
            }
            _ => {
                return Err(ConflictError::validation(format!(
                    "unknown recurrence '{}'",
                    label.trim()
                )))
            }
        };

        if let Some(raw) = date {
            return Err(ConflictError::validation(format!(
                "date '{raw}' given for non-catchup recurrence '{}'",
                label.trim()
            )));
        }
        Ok(recurrence)
    }
}

// ── Session ─────────────────────────────────────────────────────────────────

/// Teaching format of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    IntegratedCourse,
    Lecture,
    Tutorial,
    Practical,
}

impl FromStr for SessionKind {
    type Err = ConflictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integrated-course" | "integrated" | "ci" => Ok(SessionKind::IntegratedCourse),
            "lecture" | "cours" => Ok(SessionKind::Lecture),
            "tutorial" | "td" => Ok(SessionKind::Tutorial),
            "practical" | "tp" => Ok(SessionKind::Practical),
            other => Err(ConflictError::validation(format!(
                "unknown session kind '{other}'"
            ))),
        }
    }
}

/// Population references of a session, one independent set per level.
///
/// An empty set places no direct population constraint at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRefs {
    pub branches: BTreeSet<BranchId>,
    pub tutorial_groups: BTreeSet<TutorialGroupId>,
    pub practical_groups: BTreeSet<PracticalGroupId>,
}

impl PopulationRefs {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.tutorial_groups.is_empty() && self.practical_groups.is_empty()
    }
}

/// One scheduled teaching session with its weekly time window and resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    day: Weekday,
    start: NaiveTime,
    end: NaiveTime,
    subject: String,
    kind: SessionKind,
    recurrence: Recurrence,
    room: Option<RoomId>,
    teacher: Option<TeacherId>,
    population: PopulationRefs,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The declared day of week.
    pub fn day(&self) -> Weekday {
        self.day
    }

    /// The weekday the session actually meets on: the catchup date's weekday
    /// for [`Recurrence::Catchup`], the declared day otherwise.
    pub fn effective_day(&self) -> Weekday {
        match self.recurrence {
            Recurrence::Catchup { date } => date.weekday(),
            _ => self.day,
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    pub fn teacher(&self) -> Option<TeacherId> {
        self.teacher
    }

    pub fn population(&self) -> &PopulationRefs {
        &self.population
    }

    /// Half-open interval overlap of the daily time windows. Touching
    /// endpoints (`end == other.start`) do not overlap.
    pub fn overlaps_in_time(&self, other: &Session) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Raw, unvalidated session fields as they arrive from a transport layer or
/// a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    /// Stored id. For a candidate this names the session being replaced.
    #[serde(default)]
    pub id: Option<i64>,
    pub day: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub recurrence: String,
    #[serde(default)]
    pub catchup_date: Option<String>,
    #[serde(default)]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub branch_ids: Vec<i64>,
    #[serde(default)]
    pub tutorial_group_ids: Vec<i64>,
    #[serde(default)]
    pub practical_group_ids: Vec<i64>,
}

fn default_kind() -> String {
    "lecture".to_string()
}

impl SessionDraft {
    /// Validate a draft that must carry its own id.
    pub fn validate(&self) -> Result<Session> {
        let id = self
            .id
            .ok_or_else(|| ConflictError::validation("session is missing an id"))?;
        self.validate_as(SessionId(id))
    }

    /// Validate the draft's fields and stamp the result with `id`.
    pub fn validate_as(&self, id: SessionId) -> Result<Session> {
        let day = parse_weekday(&self.day)?;
        let start = parse_time(&self.start)?;
        let end = parse_time(&self.end)?;
        if start >= end {
            return Err(ConflictError::validation(format!(
                "{id}: start {start} must be before end {end}"
            )));
        }
        let recurrence = Recurrence::parse(&self.recurrence, self.catchup_date.as_deref())?;
        let kind = self.kind.parse::<SessionKind>()?;

        Ok(Session {
            id,
            day,
            start,
            end,
            subject: self.subject.trim().to_string(),
            kind,
            recurrence,
            room: self.room_id.map(RoomId),
            teacher: self.teacher_id.map(TeacherId),
            population: PopulationRefs {
                branches: self.branch_ids.iter().copied().map(BranchId).collect(),
                tutorial_groups: self
                    .tutorial_group_ids
                    .iter()
                    .copied()
                    .map(TutorialGroupId)
                    .collect(),
                practical_groups: self
                    .practical_group_ids
                    .iter()
                    .copied()
                    .map(PracticalGroupId)
                    .collect(),
            },
        })
    }
}

// ── Rooms, teachers, population hierarchy ───────────────────────────────────

/// A weekly window during which a room may be booked. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub identifier: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialGroup {
    pub id: TutorialGroupId,
    #[serde(default)]
    pub name: String,
    pub branch: BranchId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticalGroup {
    pub id: PracticalGroupId,
    #[serde(default)]
    pub name: String,
    pub tutorial_group: TutorialGroupId,
}

// ── Field parsers ───────────────────────────────────────────────────────────

/// Parse a weekday label: English full or short names (`Monday`, `mon`) or
/// French names (`lundi`).
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    let normalized = s.trim().to_lowercase();
    let french = match normalized.as_str() {
        "lundi" => Some(Weekday::Mon),
        "mardi" => Some(Weekday::Tue),
        "mercredi" => Some(Weekday::Wed),
        "jeudi" => Some(Weekday::Thu),
        "vendredi" => Some(Weekday::Fri),
        "samedi" => Some(Weekday::Sat),
        "dimanche" => Some(Weekday::Sun),
        _ => None,
    };
    french
        .map(Ok)
        .unwrap_or_else(|| normalized.parse::<Weekday>())
        .map_err(|_| ConflictError::validation(format!("invalid day '{}'", s.trim())))
}

/// Parse a wall-clock time in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ConflictError::validation(format!("invalid time '{s}'")))
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ConflictError::validation(format!("invalid date '{s}': {e}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(day: &str, start: &str, end: &str, recurrence: &str) -> SessionDraft {
        SessionDraft {
            id: Some(1),
            day: day.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            recurrence: recurrence.to_string(),
            kind: "lecture".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_weekly_session() {
        let session = draft("Monday", "08:00", "10:00", "weekly")
            .validate()
            .unwrap();
        assert_eq!(session.id(), SessionId(1));
        assert_eq!(session.day(), Weekday::Mon);
        assert_eq!(session.recurrence(), Recurrence::Weekly);
        assert_eq!(session.start(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_validate_rejects_start_after_end() {
        let err = draft("Monday", "10:00", "08:00", "weekly")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConflictError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_empty_interval() {
        let err = draft("Monday", "10:00", "10:00", "weekly")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConflictError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_bad_day() {
        let err = draft("Someday", "08:00", "10:00", "weekly")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("invalid day"));
    }

    #[test]
    fn test_validate_rejects_bad_time() {
        let err = draft("Monday", "8h", "10:00", "weekly")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("invalid time"));
    }

    #[test]
    fn test_validate_requires_id() {
        let mut d = draft("Monday", "08:00", "10:00", "weekly");
        d.id = None;
        assert!(matches!(d.validate(), Err(ConflictError::Validation(_))));
        assert!(d.validate_as(SessionId::UNSAVED).is_ok());
    }

    #[test]
    fn test_parse_weekday_variants() {
        assert_eq!(parse_weekday("mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("  FRIDAY ").unwrap(), Weekday::Fri);
        assert_eq!(parse_weekday("Mercredi").unwrap(), Weekday::Wed);
    }

    #[test]
    fn test_parse_time_with_seconds() {
        assert_eq!(
            parse_time("14:30:15").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 15).unwrap()
        );
    }

    #[test]
    fn test_recurrence_labels() {
        assert_eq!(Recurrence::parse("Weekly", None).unwrap(), Recurrence::Weekly);
        assert_eq!(
            Recurrence::parse("biweekly", None).unwrap(),
            Recurrence::Biweekly {
                parity: WeekParity::Even
            }
        );
        assert_eq!(
            Recurrence::parse("BIWEEKLY:odd", None).unwrap(),
            Recurrence::Biweekly {
                parity: WeekParity::Odd
            }
        );
        assert_eq!(
            Recurrence::parse("catchup", Some("2025-03-10")).unwrap(),
            Recurrence::Catchup {
                date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
            }
        );
    }

    #[test]
    fn test_recurrence_catchup_requires_date() {
        assert!(matches!(
            Recurrence::parse("catchup", None),
            Err(ConflictError::Validation(_))
        ));
        assert!(matches!(
            Recurrence::parse("catchup", Some("2025-02-30")),
            Err(ConflictError::Validation(_))
        ));
    }

    #[test]
    fn test_recurrence_rejects_date_on_weekly() {
        assert!(Recurrence::parse("weekly", Some("2025-03-10")).is_err());
    }

    #[test]
    fn test_recurrence_rejects_free_form_label() {
        assert!(Recurrence::parse("every other tuesday", None).is_err());
    }

    #[test]
    fn test_effective_day_of_catchup_follows_date() {
        let mut d = draft("Monday", "08:00", "09:00", "catchup");
        d.catchup_date = Some("2025-03-11".to_string());
        let session = d.validate().unwrap();
        assert_eq!(session.day(), Weekday::Mon);
        assert_eq!(session.effective_day(), Weekday::Tue);
    }

    #[test]
    fn test_time_overlap_is_half_open() {
        let a = draft("Monday", "08:00", "10:00", "weekly").validate().unwrap();
        let b = draft("Monday", "10:00", "11:00", "weekly").validate().unwrap();
        let c = draft("Monday", "09:59", "11:00", "weekly").validate().unwrap();
        assert!(!a.overlaps_in_time(&b));
        assert!(!b.overlaps_in_time(&a));
        assert!(a.overlaps_in_time(&c));
    }

    #[test]
    fn test_population_ids_are_collected() {
        let mut d = draft("Tuesday", "08:00", "09:00", "weekly");
        d.branch_ids = vec![3, 3, 1];
        d.practical_group_ids = vec![7];
        let session = d.validate().unwrap();
        assert_eq!(session.population().branches.len(), 2);
        assert!(session.population().tutorial_groups.is_empty());
        assert!(session
            .population()
            .practical_groups
            .contains(&PracticalGroupId(7)));
    }

    #[test]
    fn test_session_kind_labels() {
        assert_eq!(
            "integrated-course".parse::<SessionKind>().unwrap(),
            SessionKind::IntegratedCourse
        );
        assert_eq!("TP".parse::<SessionKind>().unwrap(), SessionKind::Practical);
        assert!("seminar".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_draft_deserializes_from_camel_case_json() {
        let json = r#"{
            "id": 4, "day": "Thursday", "start": "13:00", "end": "15:00",
            "recurrence": "catchup", "catchupDate": "2025-03-13",
            "roomId": 2, "tutorialGroupIds": [5]
        }"#;
        let d: SessionDraft = serde_json::from_str(json).unwrap();
        let session = d.validate().unwrap();
        assert_eq!(session.room(), Some(RoomId(2)));
        assert_eq!(session.kind(), SessionKind::Lecture);
        assert!(session
            .population()
            .tutorial_groups
            .contains(&TutorialGroupId(5)));
    }
}
