//! Booking lifecycle actions.
//!
//! Commands carry user intent; events are produced by request effects and
//! fed back into the reducer. Every request-backed command carries a
//! `request_id` so its outcome can be told apart from a concurrent one.

use crate::error::ClientError;
use crate::types::{Booking, BookingId, HotelId, HotelSummary, ReservationDraft, ValidSearch};
use uuid::Uuid;

/// Input to the booking reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingAction {
    // ═══════════════════════════════════════════════════════════
    // Search Flow Commands
    // ═══════════════════════════════════════════════════════════
    /// Start an availability search.
    Search {
        /// Correlates the outcome
        request_id: Uuid,
        /// Validated query
        query: ValidSearch,
    },

    /// Open one hotel from the results.
    SelectHotel {
        /// Hotel to show
        hotel_id: HotelId,
    },

    /// Return to the cached results.
    BackToResults,

    /// Carry a reservation draft to the confirmation step.
    Reserve {
        /// Pending reservation, not yet a booking
        draft: ReservationDraft,
    },

    /// Submit the pending reservation.
    ConfirmReservation {
        /// Correlates the outcome
        request_id: Uuid,
    },

    // ═══════════════════════════════════════════════════════════
    // Booking Collection Commands
    // ═══════════════════════════════════════════════════════════
    /// Optimistically cancel a confirmed booking.
    CancelBooking {
        /// Booking to cancel
        booking_id: BookingId,
    },

    /// Refresh the whole collection.
    LoadBookings {
        /// Correlates the outcome
        request_id: Uuid,
    },

    /// Fetch a single booking.
    LoadBooking {
        /// Correlates the outcome
        request_id: Uuid,
        /// Booking to fetch
        booking_id: BookingId,
    },

    /// Forget everything held for the current user.
    EndSession,

    // ═══════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════
    /// Availability search answered.
    SearchCompleted {
        /// Originating search
        request_id: Uuid,
        /// Hotels with availability, possibly none
        results: Vec<HotelSummary>,
    },

    /// Availability search failed.
    SearchFailed {
        /// Originating search
        request_id: Uuid,
        /// Why
        error: ClientError,
    },

    /// The booking service created the reservation.
    ReservationConfirmed {
        /// Originating confirmation
        request_id: Uuid,
        /// The new booking
        booking: Booking,
    },

    /// The booking service refused the reservation.
    ReservationFailed {
        /// Originating confirmation
        request_id: Uuid,
        /// Why
        error: ClientError,
    },

    /// The server accepted the cancellation.
    CancellationAcknowledged {
        /// Cancelled booking
        booking_id: BookingId,
        /// Server message, if any
        message: Option<String>,
    },

    /// The cancellation failed; the prior status must come back.
    CancellationRejected {
        /// Booking to roll back
        booking_id: BookingId,
        /// Why
        error: ClientError,
    },

    /// The collection was fetched.
    BookingsLoaded {
        /// Originating load
        request_id: Uuid,
        /// Server's view of the user's bookings
        bookings: Vec<Booking>,
    },

    /// Fetching the collection failed.
    BookingsFailed {
        /// Originating load
        request_id: Uuid,
        /// Why
        error: ClientError,
    },

    /// A single booking was fetched.
    BookingLoaded {
        /// Originating load
        request_id: Uuid,
        /// The booking
        booking: Booking,
    },

    /// Fetching a single booking failed.
    BookingFailed {
        /// Originating load
        request_id: Uuid,
        /// Requested booking
        booking_id: BookingId,
        /// Why
        error: ClientError,
    },
}

impl BookingAction {
    /// Whether this action is an outcome produced by an effect.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(
            self,
            Self::SearchCompleted { .. }
                | Self::SearchFailed { .. }
                | Self::ReservationConfirmed { .. }
                | Self::ReservationFailed { .. }
                | Self::CancellationAcknowledged { .. }
                | Self::CancellationRejected { .. }
                | Self::BookingsLoaded { .. }
                | Self::BookingsFailed { .. }
                | Self::BookingLoaded { .. }
                | Self::BookingFailed { .. }
        )
    }

    /// Request id of a request-backed command or its outcome.
    #[must_use]
    pub const fn request_id(&self) -> Option<Uuid> {
        match self {
            Self::Search { request_id, .. }
            | Self::ConfirmReservation { request_id }
            | Self::LoadBookings { request_id }
            | Self::LoadBooking { request_id, .. }
            | Self::SearchCompleted { request_id, .. }
            | Self::SearchFailed { request_id, .. }
            | Self::ReservationConfirmed { request_id, .. }
            | Self::ReservationFailed { request_id, .. }
            | Self::BookingsLoaded { request_id, .. }
            | Self::BookingsFailed { request_id, .. }
            | Self::BookingLoaded { request_id, .. }
            | Self::BookingFailed { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }
}
