//! Booking lifecycle reducer.
//!
//! Every transition of the search flow and the booking collection happens
//! here. Requests are returned as effects; their outcomes come back as
//! events carrying the originating `request_id` (or booking id for
//! cancellations), and events that no longer match the state are ignored.

use crate::booking::actions::BookingAction;
use crate::booking::state::{BookingFlow, BookingState};
use crate::environment::ClientEnvironment;
use crate::gateway::HttpTransport;
use crate::types::BookingStatus;
use staybook_core::effect::Effect;
use staybook_core::reducer::Reducer;
use staybook_core::{SmallVec, request_effect, smallvec};
use std::fmt;
use std::marker::PhantomData;

/// Reducer for the booking lifecycle.
pub struct BookingReducer<T> {
    _transport: PhantomData<fn() -> T>,
}

impl<T> BookingReducer<T> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _transport: PhantomData,
        }
    }
}

impl<T> Default for BookingReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BookingReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BookingReducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BookingReducer")
    }
}

impl<T: HttpTransport> Reducer for BookingReducer<T> {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = ClientEnvironment<T>;

    #[allow(clippy::too_many_lines)] // one arm per lifecycle transition
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Search: results replace whatever flow was in progress
            // ═══════════════════════════════════════════════════════════
            BookingAction::Search { request_id, query } => {
                if state.flow.is_submitting() {
                    tracing::debug!("Search ignored while a confirmation is in flight");
                    return SmallVec::new();
                }
                tracing::debug!(destination = %query.destination, "Searching availability");
                state.flow = BookingFlow::Searching {
                    request_id,
                    query: query.clone(),
                };
                state.last_error = None;

                let api = env.api.clone();
                smallvec![request_effect! {
                    call: api.availability(&query),
                    on_success: |results| Some(BookingAction::SearchCompleted { request_id, results }),
                    on_error: |error| Some(BookingAction::SearchFailed { request_id, error })
                }]
            },

            BookingAction::SearchCompleted { request_id, results } => {
                match std::mem::take(&mut state.flow) {
                    BookingFlow::Searching { request_id: active, query } if active == request_id => {
                        tracing::info!(hotels = results.len(), "Availability received");
                        state.flow = BookingFlow::ResultsShown { query, results };
                    },
                    other => {
                        tracing::debug!(%request_id, "Stale search result ignored");
                        state.flow = other;
                    },
                }
                SmallVec::new()
            },

            BookingAction::SearchFailed { request_id, error } => {
                if matches!(&state.flow, BookingFlow::Searching { request_id: active, .. } if *active == request_id)
                {
                    tracing::warn!(%error, "Availability search failed");
                    state.flow = BookingFlow::Idle;
                    state.last_error = Some(error);
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Navigation within the results
            // ═══════════════════════════════════════════════════════════
            BookingAction::SelectHotel { hotel_id } => {
                if state.flow.is_submitting() {
                    return SmallVec::new();
                }
                let Some((query, results)) = state.flow.context() else {
                    return SmallVec::new();
                };
                let Some(hotel) = results.iter().find(|hotel| hotel.id == hotel_id).cloned() else {
                    tracing::debug!(%hotel_id, "Selected hotel is not in the results");
                    return SmallVec::new();
                };
                state.flow = BookingFlow::HotelDetail {
                    query: query.clone(),
                    results: results.to_vec(),
                    hotel,
                };
                SmallVec::new()
            },

            BookingAction::BackToResults => {
                if state.flow.is_submitting() {
                    return SmallVec::new();
                }
                if let Some((query, results)) = state.flow.context() {
                    state.flow = BookingFlow::ResultsShown {
                        query: query.clone(),
                        results: results.to_vec(),
                    };
                }
                SmallVec::new()
            },

            BookingAction::Reserve { draft } => {
                if state.flow.is_submitting() {
                    return SmallVec::new();
                }
                let Some((query, results)) = state.flow.context() else {
                    return SmallVec::new();
                };
                if !results.iter().any(|hotel| hotel.id == draft.hotel_id) {
                    return SmallVec::new();
                }
                tracing::debug!(hotel_id = %draft.hotel_id, nights = draft.nights, "Reservation drafted");
                state.flow = BookingFlow::ConfirmPending {
                    query: query.clone(),
                    results: results.to_vec(),
                    draft,
                    submitting: None,
                    error: None,
                };
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Confirm: the collection changes only on success
            // ═══════════════════════════════════════════════════════════
            BookingAction::ConfirmReservation { request_id } => {
                let BookingFlow::ConfirmPending {
                    draft,
                    submitting,
                    error,
                    ..
                } = &mut state.flow
                else {
                    tracing::debug!("Confirmation ignored: nothing to submit");
                    return SmallVec::new();
                };
                if submitting.is_some() {
                    tracing::debug!("Confirmation ignored: already submitting");
                    return SmallVec::new();
                }
                *submitting = Some(request_id);
                *error = None;

                let api = env.api.clone();
                let draft = draft.clone();
                smallvec![request_effect! {
                    call: api.create_reservation(&draft),
                    on_success: |booking| Some(BookingAction::ReservationConfirmed { request_id, booking }),
                    on_error: |error| Some(BookingAction::ReservationFailed { request_id, error })
                }]
            },

            BookingAction::ReservationConfirmed { request_id, booking } => {
                if !matches!(&state.flow, BookingFlow::ConfirmPending { submitting: Some(active), .. } if *active == request_id)
                {
                    tracing::debug!(%request_id, "Stale confirmation ignored");
                    return SmallVec::new();
                }
                tracing::info!(
                    booking_id = %booking.id,
                    confirmation_code = %booking.confirmation_code,
                    "Reservation confirmed"
                );
                state.flow = BookingFlow::Idle;
                state.last_error = None;
                state.upsert(booking);
                SmallVec::new()
            },

            BookingAction::ReservationFailed { request_id, error } => {
                if let BookingFlow::ConfirmPending {
                    submitting,
                    error: flow_error,
                    ..
                } = &mut state.flow
                {
                    if *submitting == Some(request_id) {
                        tracing::warn!(%error, "Reservation failed, retry permitted");
                        *submitting = None;
                        *flow_error = Some(error.clone());
                        state.last_error = Some(error);
                    }
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Cancel: apply optimistically, then commit or revert
            // ═══════════════════════════════════════════════════════════
            BookingAction::CancelBooking { booking_id } => {
                if state.pending_cancellations.contains_key(&booking_id) {
                    tracing::debug!(%booking_id, "Cancellation already in flight");
                    return SmallVec::new();
                }
                let Some(booking) = state.booking_mut(booking_id) else {
                    return SmallVec::new();
                };
                if !booking.status.can_transition_to(BookingStatus::Cancelled) {
                    tracing::debug!(%booking_id, status = %booking.status, "Cancellation not applicable");
                    return SmallVec::new();
                }

                let prior = booking.status;
                booking.status = BookingStatus::Cancelled;
                state.pending_cancellations.insert(booking_id, prior);
                state.last_error = None;
                tracing::info!(%booking_id, "Booking cancelled optimistically");

                let api = env.api.clone();
                smallvec![request_effect! {
                    call: api.cancel_reservation(booking_id),
                    on_success: |message| Some(BookingAction::CancellationAcknowledged { booking_id, message }),
                    on_error: |error| Some(BookingAction::CancellationRejected { booking_id, error })
                }]
            },

            BookingAction::CancellationAcknowledged { booking_id, .. } => {
                if state.pending_cancellations.remove(&booking_id).is_some() {
                    tracing::info!(%booking_id, "Cancellation settled");
                }
                SmallVec::new()
            },

            BookingAction::CancellationRejected { booking_id, error } => {
                let Some(prior) = state.pending_cancellations.remove(&booking_id) else {
                    return SmallVec::new();
                };
                if let Some(booking) = state.booking_mut(booking_id) {
                    booking.status = prior;
                }
                tracing::warn!(%booking_id, %error, restored = %prior, "Cancellation rolled back");
                state.last_error = Some(error);
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Collection reads: failures never leave stale data behind
            // ═══════════════════════════════════════════════════════════
            BookingAction::LoadBookings { request_id } => {
                state.active_load = Some(request_id);

                let api = env.api.clone();
                smallvec![request_effect! {
                    call: api.list_reservations(),
                    on_success: |bookings| Some(BookingAction::BookingsLoaded { request_id, bookings }),
                    on_error: |error| Some(BookingAction::BookingsFailed { request_id, error })
                }]
            },

            BookingAction::BookingsLoaded { request_id, bookings } => {
                if state.active_load != Some(request_id) {
                    tracing::debug!(%request_id, "Stale booking list ignored");
                    return SmallVec::new();
                }
                state.active_load = None;
                state.bookings.clear();
                for booking in bookings {
                    state.upsert(booking);
                }
                state.last_error = None;
                state.last_refreshed = Some(env.clock.now());
                tracing::info!(count = state.bookings.len(), "Bookings refreshed");
                SmallVec::new()
            },

            BookingAction::BookingsFailed { request_id, error } => {
                if state.active_load != Some(request_id) {
                    return SmallVec::new();
                }
                tracing::warn!(%error, discarded = state.bookings.len(), "Booking refresh failed");
                state.active_load = None;
                state.bookings.clear();
                state.last_error = Some(error);
                SmallVec::new()
            },

            BookingAction::LoadBooking { request_id, booking_id } => {
                let api = env.api.clone();
                smallvec![request_effect! {
                    call: api.get_reservation(booking_id),
                    on_success: |booking| Some(BookingAction::BookingLoaded { request_id, booking }),
                    on_error: |error| Some(BookingAction::BookingFailed { request_id, booking_id, error })
                }]
            },

            BookingAction::BookingLoaded { booking, .. } => {
                state.upsert(booking);
                SmallVec::new()
            },

            BookingAction::BookingFailed { booking_id, error, .. } => {
                tracing::warn!(%booking_id, %error, "Booking fetch failed");
                state.last_error = Some(error);
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Session end
            // ═══════════════════════════════════════════════════════════
            BookingAction::EndSession => {
                tracing::debug!("Clearing booking state");
                *state = BookingState::default();
                SmallVec::new()
            },
        }
    }
}
