//! Domain types for the space-booking workflow.
//!
//! Value objects for spaces and money, the editable [`BookingDraft`], and the
//! payloads that flow from the form through payment to the booking API.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::BookingError;
use crate::pricing;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a space in the external catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(u64);

impl SpaceId {
    /// Create a `SpaceId` from the catalog's numeric id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric id
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Parse a deep-link value such as the `space` query parameter
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// An amount in Kenyan shillings, stored in cents
///
/// On the wire money is a plain JSON number in shillings. The catalog may
/// also send it as a decimal string (`"5000.00"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero shillings
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole shillings with overflow checking
    #[must_use]
    pub const fn checked_from_shillings(shillings: u64) -> Option<Self> {
        match shillings.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the whole-shilling part
    #[must_use]
    pub const fn shillings(&self) -> u64 {
        self.0 / 100
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Parse a decimal amount such as `"5000"`, `"5000.5"` or `"5000.00"`
    ///
    /// At most two fractional digits are accepted.
    #[must_use]
    pub fn parse_decimal(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let shillings: u64 = whole.parse().ok()?;
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };

        shillings.checked_mul(100)?.checked_add(cents).map(Self)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn from_float(shillings: f64) -> Option<Self> {
        if !shillings.is_finite() || shillings < 0.0 {
            return None;
        }
        let cents = (shillings * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 % 100 {
            0 => write!(f, "Ksh {}", self.shillings()),
            cents => write!(f, "Ksh {}.{cents:02}", self.shillings()),
        }
    }
}

impl Serialize for Money {
    #[allow(clippy::cast_precision_loss)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u64(self.shillings())
        } else {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Whole(u64),
            Float(f64),
            Text(String),
        }

        let money = match Raw::deserialize(deserializer)? {
            Raw::Whole(shillings) => Self::checked_from_shillings(shillings),
            Raw::Float(shillings) => Self::from_float(shillings),
            Raw::Text(text) => Self::parse_decimal(&text),
        };
        money.ok_or_else(|| serde::de::Error::custom("invalid money amount"))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A bookable venue from the external catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Catalog id
    pub id: SpaceId,
    /// Display name
    pub name: String,
    /// Where the space is
    #[serde(default)]
    pub location: String,
    /// Maximum number of attendees
    pub capacity: u32,
    /// Price for one day
    pub price_per_day: Money,
}

// ============================================================================
// Draft
// ============================================================================

/// Kind of event being booked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Meeting (default)
    #[default]
    Meeting,
    /// Conference
    Conference,
    /// Webinar
    Webinar,
    /// Workshop
    Workshop,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Meeting => "meeting",
            Self::Conference => "conference",
            Self::Webinar => "webinar",
            Self::Workshop => "workshop",
        })
    }
}

/// Booking details while the user is still editing them
///
/// Optional fields are `None` until the user fills them in; validation
/// reports every missing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingDraft {
    /// Name of the event
    pub event_name: String,
    /// Selected space
    pub space_id: Option<SpaceId>,
    /// First day of the booking
    pub start_date: Option<NaiveDate>,
    /// Last day of the booking
    pub end_date: Option<NaiveDate>,
    /// Start time on the first day (ignored for full-day bookings)
    pub start_time: Option<NaiveTime>,
    /// End time on the last day (ignored for full-day bookings)
    pub end_time: Option<NaiveTime>,
    /// Whole days, 00:00:00 to 23:59:59
    pub is_full_day: bool,
    /// Expected attendance
    pub attendees: u32,
    /// Who is organising the event
    pub organizer_name: String,
    /// Organizer contact address
    pub organizer_email: String,
    /// Kind of event
    pub event_type: EventType,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            space_id: None,
            start_date: None,
            end_date: None,
            start_time: None,
            end_time: None,
            is_full_day: false,
            attendees: 1,
            organizer_name: String::new(),
            organizer_email: String::new(),
            event_type: EventType::default(),
        }
    }
}

impl BookingDraft {
    /// Combined start and end timestamps
    ///
    /// Full-day bookings snap to `00:00:00` on the start date and `23:59:59`
    /// on the end date. Returns `None` while a needed date or time is missing.
    #[must_use]
    pub fn window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start_date = self.start_date?;
        let end_date = self.end_date?;

        if self.is_full_day {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
            return Some((
                start_date.and_time(NaiveTime::MIN),
                end_date.and_time(end_of_day),
            ));
        }

        Some((
            start_date.and_time(self.start_time?),
            end_date.and_time(self.end_time?),
        ))
    }
}

/// A draft field, used as the key for validation messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    /// `eventName`
    EventName,
    /// `spaceId`
    SpaceId,
    /// `startDate`
    StartDate,
    /// `startTime`
    StartTime,
    /// `endDate`
    EndDate,
    /// `endTime`
    EndTime,
    /// `isFullDay`
    IsFullDay,
    /// `attendees`
    Attendees,
    /// `organizerName`
    OrganizerName,
    /// `organizerEmail`
    OrganizerEmail,
    /// `eventType`
    EventType,
}

impl DraftField {
    /// Form field name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EventName => "eventName",
            Self::SpaceId => "spaceId",
            Self::StartDate => "startDate",
            Self::StartTime => "startTime",
            Self::EndDate => "endDate",
            Self::EndTime => "endTime",
            Self::IsFullDay => "isFullDay",
            Self::Attendees => "attendees",
            Self::OrganizerName => "organizerName",
            Self::OrganizerEmail => "organizerEmail",
            Self::EventType => "eventType",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edit to the draft
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Set the event name
    EventName(String),
    /// Select or clear the space
    Space(Option<SpaceId>),
    /// Set or clear the start date
    StartDate(Option<NaiveDate>),
    /// Set or clear the end date
    EndDate(Option<NaiveDate>),
    /// Set or clear the start time
    StartTime(Option<NaiveTime>),
    /// Set or clear the end time
    EndTime(Option<NaiveTime>),
    /// Toggle full-day mode
    FullDay(bool),
    /// Set the attendance
    Attendees(u32),
    /// Set the organizer name
    OrganizerName(String),
    /// Set the organizer email
    OrganizerEmail(String),
    /// Set the event type
    EventType(EventType),
}

impl FieldUpdate {
    /// The field this update touches
    #[must_use]
    pub const fn field(&self) -> DraftField {
        match self {
            Self::EventName(_) => DraftField::EventName,
            Self::Space(_) => DraftField::SpaceId,
            Self::StartDate(_) => DraftField::StartDate,
            Self::EndDate(_) => DraftField::EndDate,
            Self::StartTime(_) => DraftField::StartTime,
            Self::EndTime(_) => DraftField::EndTime,
            Self::FullDay(_) => DraftField::IsFullDay,
            Self::Attendees(_) => DraftField::Attendees,
            Self::OrganizerName(_) => DraftField::OrganizerName,
            Self::OrganizerEmail(_) => DraftField::OrganizerEmail,
            Self::EventType(_) => DraftField::EventType,
        }
    }

    /// Write the new value into the draft
    pub fn apply(self, draft: &mut BookingDraft) {
        match self {
            Self::EventName(value) => draft.event_name = value,
            Self::Space(value) => draft.space_id = value,
            Self::StartDate(value) => draft.start_date = value,
            Self::EndDate(value) => draft.end_date = value,
            Self::StartTime(value) => draft.start_time = value,
            Self::EndTime(value) => draft.end_time = value,
            Self::FullDay(value) => draft.is_full_day = value,
            Self::Attendees(value) => draft.attendees = value,
            Self::OrganizerName(value) => draft.organizer_name = value,
            Self::OrganizerEmail(value) => draft.organizer_email = value,
            Self::EventType(value) => draft.event_type = value,
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Supported payment methods
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// M-Pesa mobile money (default)
    #[default]
    Mpesa,
    /// `PayPal`
    Paypal,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mpesa => "mpesa",
            Self::Paypal => "paypal",
        })
    }
}

/// Method-specific contact the payment was made from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentContact {
    /// M-Pesa phone number
    Phone(String),
    /// `PayPal` account email
    Email(String),
}

/// Proof of a completed payment
///
/// `transaction_id` is the only reconciliation key if saving the booking
/// fails afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    /// How the user paid
    pub method: PaymentMethod,
    /// Gateway transaction id
    pub transaction_id: String,
    /// Amount charged
    pub amount: Money,
    /// Phone or email used
    #[serde(flatten)]
    pub contact: PaymentContact,
}

// ============================================================================
// Payloads
// ============================================================================

/// A validated, priced booking waiting for payment
///
/// Serializes to the booking API's field names. The summary fields shown in
/// the payment dialog are not part of the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingBooking {
    /// Event name
    pub event_name: String,
    /// Combined start timestamp
    pub start_datetime: NaiveDateTime,
    /// Combined end timestamp
    pub end_datetime: NaiveDateTime,
    /// First day
    pub start_date: NaiveDate,
    /// Last day
    pub end_date: NaiveDate,
    /// Full-day booking
    pub is_full_day: bool,
    /// Organizer name
    pub organizer_name: String,
    /// Organizer email
    pub organizer_email: String,
    /// Kind of event
    pub event_type: EventType,
    /// Expected attendance
    pub attendance: u32,
    /// Booked space
    pub space: SpaceId,
    /// Amount due
    #[serde(skip)]
    pub total_amount: Money,
    /// Billable days
    #[serde(skip)]
    pub duration_days: u32,
    /// Name of the booked space
    #[serde(skip)]
    pub space_name: String,
}

impl PendingBooking {
    /// Snapshot a draft against the space it was validated for
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDraft`] if a date or time the window
    /// needs is missing, or the total overflows. Callers validate first, so
    /// this only fires on programming errors.
    pub fn build(draft: &BookingDraft, space: &Space) -> Result<Self, BookingError> {
        let (start_datetime, end_datetime) = draft
            .window()
            .ok_or_else(|| BookingError::InvalidDraft("incomplete booking window".into()))?;
        let (start_date, end_date) = (start_datetime.date(), end_datetime.date());

        let duration_days = pricing::duration_days(start_date, end_date);
        let total_amount = pricing::total(space.price_per_day, duration_days)
            .ok_or_else(|| BookingError::InvalidDraft("booking total overflows".into()))?;

        Ok(Self {
            event_name: draft.event_name.clone(),
            start_datetime,
            end_datetime,
            start_date,
            end_date,
            is_full_day: draft.is_full_day,
            organizer_name: draft.organizer_name.clone(),
            organizer_email: draft.organizer_email.clone(),
            event_type: draft.event_type,
            attendance: draft.attendees,
            space: space.id,
            total_amount,
            duration_days,
            space_name: space.name.clone(),
        })
    }

    /// Attach payment proof, producing the payload sent to the booking API
    #[must_use]
    pub fn confirm(self, payment: &PaymentResult) -> ConfirmedBooking {
        ConfirmedBooking {
            payment_method: payment.method,
            transaction_id: payment.transaction_id.clone(),
            amount_paid: payment.amount,
            booking: self,
        }
    }
}

/// A paid booking, ready to be saved exactly once
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmedBooking {
    /// Booking details
    #[serde(flatten)]
    pub booking: PendingBooking,
    /// Method used
    pub payment_method: PaymentMethod,
    /// Gateway transaction id
    pub transaction_id: String,
    /// Amount charged
    pub amount_paid: Money,
}

/// A booking record returned by the booking API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Record id
    pub id: u64,
    /// Event name
    #[serde(default)]
    pub event_name: String,
    /// Booked space
    pub space: SpaceId,
    /// Server-side status, when reported
    #[serde(default)]
    pub status: Option<String>,
    /// Payment transaction id, when echoed back
    #[serde(default)]
    pub transaction_id: Option<String>,
}
