//! Booking lifecycle state and the pure checks run before each command.

use crate::error::{ClientError, Result};
use crate::types::{
    Booking, BookingId, BookingStatus, HotelId, HotelSummary, Money, ReservationDraft,
    SearchQuery, ValidSearch,
};
use chrono::{DateTime, Days, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Where the user is in the search, reserve, confirm flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookingFlow {
    /// Nothing searched yet, or the last search failed.
    #[default]
    Idle,
    /// Waiting for availability.
    Searching {
        /// Request whose answer will be shown
        request_id: Uuid,
        /// The search
        query: ValidSearch,
    },
    /// Availability received.
    ResultsShown {
        /// The search
        query: ValidSearch,
        /// Hotels with availability, possibly none
        results: Vec<HotelSummary>,
    },
    /// One hotel opened from the results.
    HotelDetail {
        /// The search
        query: ValidSearch,
        /// Cached results to go back to
        results: Vec<HotelSummary>,
        /// Opened hotel
        hotel: HotelSummary,
    },
    /// A reservation waits for confirmation.
    ConfirmPending {
        /// The search
        query: ValidSearch,
        /// Cached results to go back to
        results: Vec<HotelSummary>,
        /// What will be submitted
        draft: ReservationDraft,
        /// Confirmation request in flight, if any
        submitting: Option<Uuid>,
        /// Failure of the previous attempt
        error: Option<ClientError>,
    },
}

impl BookingFlow {
    /// Search and results available to navigate within, if any.
    #[must_use]
    pub fn context(&self) -> Option<(&ValidSearch, &[HotelSummary])> {
        match self {
            Self::ResultsShown { query, results }
            | Self::HotelDetail { query, results, .. }
            | Self::ConfirmPending { query, results, .. } => Some((query, results)),
            Self::Idle | Self::Searching { .. } => None,
        }
    }

    /// The draft awaiting confirmation.
    #[must_use]
    pub const fn draft(&self) -> Option<&ReservationDraft> {
        match self {
            Self::ConfirmPending { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Whether a confirmation request is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::ConfirmPending { submitting: Some(_), .. })
    }
}

/// Result of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The server acknowledged the cancellation.
    Cancelled {
        /// Server message, if any
        message: Option<String>,
    },
    /// Already cancelled, or a cancellation is in flight; nothing was sent.
    AlreadyCancelled,
}

/// State owned by the booking reducer.
#[derive(Debug, Clone, Default)]
pub struct BookingState {
    /// Search, reserve and confirm progress
    pub flow: BookingFlow,
    /// The user's bookings as last known
    pub bookings: Vec<Booking>,
    /// Optimistic cancellations in flight, with the status to restore
    pub pending_cancellations: HashMap<BookingId, BookingStatus>,
    /// Collection load whose answer will be applied
    pub active_load: Option<Uuid>,
    /// Most recent failure surfaced to the user
    pub last_error: Option<ClientError>,
    /// When the collection was last replaced from the server
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl BookingState {
    /// Cached booking by id.
    #[must_use]
    pub fn booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|booking| booking.id == id)
    }

    pub(crate) fn booking_mut(&mut self, id: BookingId) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|booking| booking.id == id)
    }

    /// Insert or replace a booking, keeping an in-flight cancellation visible.
    pub(crate) fn upsert(&mut self, mut booking: Booking) {
        if let Some(prior) = self.pending_cancellations.get_mut(&booking.id) {
            *prior = booking.status;
            booking.status = BookingStatus::Cancelled;
        }
        match self.booking_mut(booking.id) {
            Some(existing) => *existing = booking,
            None => self.bookings.push(booking),
        }
    }

    /// Decide whether `cancel(booking_id)` should send a request.
    ///
    /// `Ok(None)` means the booking is already cancelled or being cancelled.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown booking or one that is
    /// still pending.
    pub fn check_cancel(&self, booking_id: BookingId) -> Result<Option<BookingStatus>> {
        let booking = self
            .booking(booking_id)
            .ok_or_else(|| ClientError::validation(format!("Booking {booking_id} not found")))?;

        if self.pending_cancellations.contains_key(&booking_id) || booking.status.is_terminal() {
            return Ok(None);
        }
        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(ClientError::validation(format!(
                "Booking {booking_id} is {} and cannot be cancelled yet",
                booking.status
            )));
        }
        Ok(Some(booking.status))
    }

    /// Build the draft for `reserve`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when there is no search containing the
    /// hotel, `nights` is zero or the stay overflows the calendar.
    pub fn plan_reservation(
        &self,
        hotel_id: HotelId,
        nights: u32,
        total_price: Money,
    ) -> Result<ReservationDraft> {
        let Some((query, results)) = self.flow.context() else {
            return Err(ClientError::validation("Search for availability before reserving"));
        };
        let hotel = results
            .iter()
            .find(|hotel| hotel.id == hotel_id)
            .ok_or_else(|| ClientError::validation(format!("Hotel {hotel_id} is not in the search results")))?;
        if nights == 0 {
            return Err(ClientError::validation("A reservation needs at least one night"));
        }
        if self.flow.is_submitting() {
            return Err(ClientError::validation("A confirmation is already being submitted"));
        }

        let check_out = query
            .check_in
            .checked_add_days(Days::new(u64::from(nights)))
            .ok_or_else(|| ClientError::validation("Stay is too long"))?;

        Ok(ReservationDraft {
            hotel_id,
            hotel_name: hotel.name.clone(),
            location: hotel
                .location
                .clone()
                .unwrap_or_else(|| query.destination.clone()),
            check_in: query.check_in,
            check_out,
            nights,
            total_price,
        })
    }

    /// The draft `confirm` would submit.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when nothing is waiting for confirmation
    /// or a confirmation is already in flight.
    pub fn check_confirm(&self) -> Result<&ReservationDraft> {
        match &self.flow {
            BookingFlow::ConfirmPending { submitting: Some(_), .. } => {
                Err(ClientError::validation("A confirmation is already being submitted"))
            },
            BookingFlow::ConfirmPending { draft, .. } => Ok(draft),
            _ => Err(ClientError::validation("There is no reservation to confirm")),
        }
    }
}

/// Validate a search before any request is made.
///
/// # Errors
///
/// [`ClientError::Validation`] when the destination is blank, a date is
/// missing, or check-out is not strictly after check-in.
pub fn validate_search(query: &SearchQuery) -> Result<ValidSearch> {
    let destination = query.destination.trim();
    if destination.is_empty() {
        return Err(ClientError::validation("Enter a destination"));
    }
    let (Some(check_in), Some(check_out)) = (query.check_in, query.check_out) else {
        return Err(ClientError::validation("Select both check-in and check-out dates"));
    };
    if check_out <= check_in {
        return Err(ClientError::validation("Check-out must be after check-in"));
    }
    Ok(ValidSearch {
        destination: destination.to_string(),
        check_in,
        check_out,
    })
}
