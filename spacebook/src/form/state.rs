//! Booking form state and read-only queries

use chrono::NaiveDate;

use crate::payment::PaymentState;
use crate::pricing::Quote;
use crate::types::{BookingDraft, ConfirmedBooking, DraftField, PendingBooking, Space, SpaceId};
use crate::validation::{self, ValidationErrors};

/// Where the form is in the booking workflow
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormStage {
    /// The user is filling in the draft
    #[default]
    Editing,
    /// The draft was accepted and the payment dialog is open
    Payment {
        /// Snapshot handed to the payment dialog
        pending: PendingBooking,
        /// Payment dialog state
        payment: PaymentState,
    },
    /// Payment confirmed; the booking is being saved
    Submitting {
        /// Payload sent to the booking API
        confirmed: ConfirmedBooking,
    },
    /// Booking saved; redirecting shortly
    Succeeded {
        /// Confirmation shown to the user
        message: String,
    },
}

/// Booking form state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingFormState {
    /// What the user has entered
    pub draft: BookingDraft,
    /// Field-level messages from the last submit
    pub errors: ValidationErrors,
    /// Submit-level message shown at the top of the form
    pub banner: Option<String>,
    /// Catalog snapshot
    pub spaces: Vec<Space>,
    /// Catalog fetch outstanding
    pub spaces_loading: bool,
    /// Deep-linked space waiting for the catalog to arrive
    pub prefill: Option<SpaceId>,
    /// Workflow stage
    pub stage: FormStage,
    /// A booking API call is outstanding
    pub in_flight: bool,
}

impl BookingFormState {
    /// Validate the current draft against the catalog snapshot
    #[must_use]
    pub fn validate(&self, today: NaiveDate) -> ValidationErrors {
        validation::validate(&self.draft, &self.spaces, today)
    }

    /// The selected space, if it is in the catalog
    #[must_use]
    pub fn selected_space(&self) -> Option<&Space> {
        let id = self.draft.space_id?;
        self.spaces.iter().find(|space| space.id == id)
    }

    /// More attendees than the selected space holds
    #[must_use]
    pub fn capacity_exceeded(&self) -> bool {
        self.selected_space()
            .is_some_and(|space| self.draft.attendees > space.capacity)
    }

    /// Inline hint under the attendee field, shown before validation runs
    #[must_use]
    pub fn capacity_hint(&self) -> Option<String> {
        if !self.capacity_exceeded() || self.errors.get(DraftField::Attendees).is_some() {
            return None;
        }
        self.selected_space()
            .map(|space| format!("Exceeds space capacity of {} people", space.capacity))
    }

    /// Whether the submit button is disabled
    #[must_use]
    pub fn submit_disabled(&self) -> bool {
        self.in_flight || self.capacity_exceeded() || self.stage != FormStage::Editing
    }

    /// Live duration and price for the selected space and dates
    #[must_use]
    pub fn quote(&self) -> Option<Quote> {
        let space = self.selected_space()?;
        Quote::new(space, self.draft.start_date?, self.draft.end_date?)
    }

    /// Booking duration in words, once both dates are set
    #[must_use]
    pub fn duration_label(&self) -> Option<String> {
        let (start, end) = (self.draft.start_date?, self.draft.end_date?);
        Some(crate::pricing::duration_label(crate::pricing::duration_days(start, end)))
    }

    /// Payment dialog state, while it is open
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentState> {
        match &self.stage {
            FormStage::Payment { payment, .. } => Some(payment),
            _ => None,
        }
    }
}
