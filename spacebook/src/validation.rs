//! Booking draft validation.
//!
//! Rules run in a fixed order. Every violated rule is reported, but a field
//! keeps only one message: a later rule for the same field replaces the
//! earlier one (an invalid email overrides "required", a past start date
//! overrides a missing start time, and so on).

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::types::{BookingDraft, DraftField, Space};

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded email pattern should compile")
});

/// Whether a string looks like an email address
#[must_use]
pub fn is_email(candidate: &str) -> bool {
    EMAIL.is_match(candidate)
}

/// Field-level validation messages
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<DraftField, String>);

impl ValidationErrors {
    /// No errors
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// True when the draft is valid
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with an error
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field
    #[must_use]
    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Set a field's message, replacing any earlier one
    pub fn insert(&mut self, field: DraftField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Clear a field's message
    pub fn remove(&mut self, field: DraftField) -> Option<String> {
        self.0.remove(&field)
    }

    /// Iterate in field order
    pub fn iter(&self) -> impl Iterator<Item = (DraftField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Validate a draft against the catalog snapshot and today's date
///
/// `today` has day precision: a start date equal to today is accepted.
#[must_use]
pub fn validate(draft: &BookingDraft, spaces: &[Space], today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    // Required fields
    if draft.event_name.trim().is_empty() {
        errors.insert(DraftField::EventName, "Event name is required");
    }
    if draft.space_id.is_none() {
        errors.insert(DraftField::SpaceId, "Space selection is required");
    }
    if draft.start_date.is_none() {
        errors.insert(DraftField::StartDate, "Start date is required");
    }
    if !draft.is_full_day && draft.start_time.is_none() {
        errors.insert(DraftField::StartTime, "Start time is required");
    }
    if draft.end_date.is_none() {
        errors.insert(DraftField::EndDate, "End date is required");
    }
    if !draft.is_full_day && draft.end_time.is_none() {
        errors.insert(DraftField::EndTime, "End time is required");
    }
    if draft.organizer_name.trim().is_empty() {
        errors.insert(DraftField::OrganizerName, "Organizer name is required");
    }
    if draft.organizer_email.trim().is_empty() {
        errors.insert(DraftField::OrganizerEmail, "Organizer email is required");
    }
    if draft.attendees < 1 {
        errors.insert(DraftField::Attendees, "At least one attendee required");
    }

    if !draft.organizer_email.is_empty() && !is_email(&draft.organizer_email) {
        errors.insert(DraftField::OrganizerEmail, "Please enter a valid email address");
    }

    // Time order only matters within a single day
    if !draft.is_full_day && draft.start_date == draft.end_date {
        if let (Some(start), Some(end)) = (draft.start_time, draft.end_time) {
            if start >= end {
                errors.insert(DraftField::EndTime, "End time must be after start time");
            }
        }
    }

    if let Some(start) = draft.start_date {
        if start < today {
            errors.insert(DraftField::StartDate, "Start date cannot be in the past");
        }
        if draft.end_date.is_some_and(|end| end < start) {
            errors.insert(DraftField::EndDate, "End date cannot be before start date");
        }
    }

    if let Some(space) = draft
        .space_id
        .and_then(|id| spaces.iter().find(|space| space.id == id))
    {
        if draft.attendees > space.capacity {
            errors.insert(
                DraftField::Attendees,
                format!("This space can only accommodate up to {} people", space.capacity),
            );
        }
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, SpaceId};
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn spaces() -> Vec<Space> {
        vec![Space {
            id: SpaceId::new(1),
            name: "Board Room".into(),
            location: "Westlands".into(),
            capacity: 10,
            price_per_day: Money::checked_from_shillings(5000).unwrap(),
        }]
    }

    fn valid_draft() -> BookingDraft {
        BookingDraft {
            event_name: "Board Sync".into(),
            space_id: Some(SpaceId::new(1)),
            start_date: Some(date(2025, 6, 10)),
            end_date: Some(date(2025, 6, 10)),
            is_full_day: true,
            attendees: 5,
            organizer_name: "Jane".into(),
            organizer_email: "jane@x.com".into(),
            ..BookingDraft::default()
        }
    }

    fn today() -> NaiveDate {
        date(2025, 6, 1)
    }

    #[test]
    fn valid_draft_has_no_errors() {
        assert!(validate(&valid_draft(), &spaces(), today()).is_empty());
    }

    #[test]
    fn empty_draft_reports_every_required_field() {
        let errors = validate(&BookingDraft::default(), &spaces(), today());

        assert_eq!(errors.get(DraftField::EventName), Some("Event name is required"));
        assert_eq!(errors.get(DraftField::SpaceId), Some("Space selection is required"));
        assert_eq!(errors.get(DraftField::StartDate), Some("Start date is required"));
        assert_eq!(errors.get(DraftField::StartTime), Some("Start time is required"));
        assert_eq!(errors.get(DraftField::EndDate), Some("End date is required"));
        assert_eq!(errors.get(DraftField::EndTime), Some("End time is required"));
        assert_eq!(errors.get(DraftField::OrganizerName), Some("Organizer name is required"));
        assert_eq!(errors.get(DraftField::OrganizerEmail), Some("Organizer email is required"));
        assert_eq!(errors.len(), 8);
    }

    #[test]
    fn full_day_skips_time_requirements() {
        let draft = BookingDraft {
            is_full_day: true,
            ..BookingDraft::default()
        };
        let errors = validate(&draft, &spaces(), today());
        assert_eq!(errors.get(DraftField::StartTime), None);
        assert_eq!(errors.get(DraftField::EndTime), None);
    }

    #[test]
    fn zero_attendees_is_rejected() {
        let draft = BookingDraft {
            attendees: 0,
            ..valid_draft()
        };
        let errors = validate(&draft, &spaces(), today());
        assert_eq!(errors.get(DraftField::Attendees), Some("At least one attendee required"));
    }

    #[test]
    fn malformed_email_replaces_required_message() {
        for bad in ["jane", "jane@x", "jane @x.com", "@x.com", "   "] {
            let draft = BookingDraft {
                organizer_email: bad.into(),
                ..valid_draft()
            };
            let errors = validate(&draft, &spaces(), today());
            assert_eq!(
                errors.get(DraftField::OrganizerEmail),
                Some("Please enter a valid email address"),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn same_day_end_time_must_follow_start() {
        let draft = BookingDraft {
            is_full_day: false,
            start_time: time(14, 0),
            end_time: time(14, 0),
            ..valid_draft()
        };
        let errors = validate(&draft, &spaces(), today());
        assert_eq!(errors.get(DraftField::EndTime), Some("End time must be after start time"));

        let overnight = BookingDraft {
            end_date: Some(date(2025, 6, 11)),
            ..draft
        };
        assert!(validate(&overnight, &spaces(), today()).is_empty());
    }

    #[test]
    fn start_date_today_is_accepted_yesterday_is_not() {
        let today = date(2025, 6, 10);
        assert!(validate(&valid_draft(), &spaces(), today).is_empty());

        let errors = validate(&valid_draft(), &spaces(), date(2025, 6, 11));
        assert_eq!(errors.get(DraftField::StartDate), Some("Start date cannot be in the past"));
    }

    #[test]
    fn end_date_before_start_date() {
        let draft = BookingDraft {
            end_date: Some(date(2025, 6, 9)),
            ..valid_draft()
        };
        let errors = validate(&draft, &spaces(), today());
        assert_eq!(errors.get(DraftField::EndDate), Some("End date cannot be before start date"));
    }

    #[test]
    fn capacity_is_enforced_against_selected_space() {
        let draft = BookingDraft {
            attendees: 15,
            ..valid_draft()
        };
        let errors = validate(&draft, &spaces(), today());
        assert_eq!(
            errors.get(DraftField::Attendees),
            Some("This space can only accommodate up to 10 people")
        );

        // Unknown spaces are resolved at submit time, not here
        let unknown = BookingDraft {
            space_id: Some(SpaceId::new(99)),
            ..draft
        };
        assert!(validate(&unknown, &spaces(), today()).is_empty());
    }

    #[test]
    fn email_pattern() {
        assert!(is_email("jane@x.com"));
        assert!(is_email("first.last@sub.domain.co.ke"));
        assert!(!is_email("jane@.com"));
        assert!(!is_email("jane@x."));
        assert!(!is_email("ja ne@x.com"));
        assert!(!is_email("jane@@x.com"));
    }
}
