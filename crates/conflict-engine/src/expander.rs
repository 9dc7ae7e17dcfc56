//! Occurrence expansion: the concrete calendar dates a session meets on
//! within an academic term.
//!
//! Recurring sessions are turned into an RFC 5545 RRULE (`FREQ=WEEKLY`,
//! `INTERVAL=1` or `2`) anchored on their first occurrence in the term and
//! expanded with the `rrule` crate. Catchup sessions expand to their single
//! date when it falls inside the term.

use chrono::{Datelike, Duration, NaiveDate};
use rrule::RRuleSet;

use crate::config::AcademicTerm;
use crate::error::{ConflictError, Result};
use crate::model::{Recurrence, Session, WeekParity};
use crate::recurrence::RecurrenceEvaluator;

/// Upper bound on expanded occurrences. A weekly session over ten years is
/// well under this.
pub const MAX_OCCURRENCES: u16 = 1000;

/// Every date within `term` on which `session` meets, ascending.
///
/// # Errors
///
/// [`ConflictError::Validation`] if the term would yield more than
/// [`MAX_OCCURRENCES`] dates. The list is never truncated.
pub fn expand_occurrences(
    session: &Session,
    term: &AcademicTerm,
    evaluator: &RecurrenceEvaluator,
) -> Result<Vec<NaiveDate>> {
    let (interval, parity) = match session.recurrence() {
        Recurrence::Catchup { date } => {
            return Ok(if term.contains(date) { vec![date] } else { vec![] });
        }
        Recurrence::Weekly => (1, None),
        Recurrence::Biweekly { parity } => (2, Some(parity)),
    };

    let Some(first) = first_occurrence(session, term, evaluator, parity) else {
        return Ok(vec![]);
    };

    let weeks = (term.end - first).num_days() / 7;
    let count = weeks / interval + 1;
    if count > i64::from(MAX_OCCURRENCES) {
        return Err(ConflictError::Validation(format!(
            "term {} to {} yields {count} occurrences of {}, more than {MAX_OCCURRENCES}",
            term.start,
            term.end,
            session.id()
        )));
    }

    let rule = format!(
        "DTSTART:{}T000000Z\nRRULE:FREQ=WEEKLY;INTERVAL={};UNTIL={}T235959Z",
        first.format("%Y%m%d"),
        interval,
        term.end.format("%Y%m%d"),
    );
    let set: RRuleSet = rule
        .parse()
        .map_err(|e| ConflictError::Internal(format!("RRULE '{rule}': {e}")))?;

    let result = set.all(MAX_OCCURRENCES + 1);
    if result.limited {
        return Err(ConflictError::Internal(format!(
            "RRULE '{rule}' expanded past {MAX_OCCURRENCES} occurrences"
        )));
    }
    Ok(result.dates.iter().map(|dt| dt.date_naive()).collect())
}

/// The earliest date within `term` on which both sessions meet, if any.
///
/// Only dates are compared; time-of-day overlap is the classifier's concern.
pub fn first_shared_occurrence(
    a: &Session,
    b: &Session,
    term: &AcademicTerm,
    evaluator: &RecurrenceEvaluator,
) -> Result<Option<NaiveDate>> {
    let left = expand_occurrences(a, term, evaluator)?;
    let right = expand_occurrences(b, term, evaluator)?;

    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => return Ok(Some(left[i])),
        }
    }
    Ok(None)
}

/// First date `>= term.start` on the session's day (and, for biweekly
/// sessions, in a week of the right parity) that is still inside the term.
/// `None` also when the date would fall past the end of the calendar.
fn first_occurrence(
    session: &Session,
    term: &AcademicTerm,
    evaluator: &RecurrenceEvaluator,
    parity: Option<WeekParity>,
) -> Option<NaiveDate> {
    let offset = (7 + session.day().num_days_from_monday() as i64
        - term.start.weekday().num_days_from_monday() as i64)
        % 7;
    let mut first = term.start.checked_add_signed(Duration::days(offset))?;
    if let Some(parity) = parity {
        if evaluator.week_parity(first) != parity {
            first = first.checked_add_signed(Duration::days(7))?;
        }
    }
    term.contains(first).then_some(first)
}
