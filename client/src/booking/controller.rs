//! Async facade over the booking store.
//!
//! Each operation validates against a state snapshot, sends one command and
//! waits for the outcome event of that command. The store remains the only
//! writer of [`BookingState`].

use crate::booking::actions::BookingAction;
use crate::booking::reducer::BookingReducer;
use crate::booking::state::{BookingFlow, BookingState, CancelOutcome, validate_search};
use crate::environment::ClientEnvironment;
use crate::error::{ClientError, Result};
use crate::gateway::HttpTransport;
use crate::types::{
    Booking, BookingId, BookingStatus, HotelId, HotelSummary, Money, ReservationDraft,
    SearchQuery,
};
use chrono::{DateTime, Utc};
use staybook_runtime::{Store, StoreConfig};
use std::fmt;
use uuid::Uuid;

/// Store running the booking reducer.
pub type BookingStore<T> = Store<BookingState, BookingAction, ClientEnvironment<T>, BookingReducer<T>>;

const BROADCAST_CAPACITY: usize = 256;

/// Booking lifecycle controller.
pub struct BookingController<T: HttpTransport> {
    store: BookingStore<T>,
}

impl<T: HttpTransport> Clone for BookingController<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: HttpTransport> fmt::Debug for BookingController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingController").finish_non_exhaustive()
    }
}

impl<T: HttpTransport> BookingController<T> {
    /// Create a controller with an empty collection.
    #[must_use]
    pub fn new(environment: ClientEnvironment<T>) -> Self {
        let config = StoreConfig::default().with_broadcast_capacity(BROADCAST_CAPACITY);
        Self {
            store: Store::with_config(BookingState::default(), BookingReducer::new(), environment, config),
        }
    }

    /// The underlying store, for observers.
    #[must_use]
    pub const fn store(&self) -> &BookingStore<T> {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════
    // Search Flow
    // ═══════════════════════════════════════════════════════════

    /// Search availability.
    ///
    /// An empty list means no availability and is not an error.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] without any request when the query is
    /// incomplete or check-out is not after check-in; gateway errors
    /// otherwise.
    #[tracing::instrument(skip(self, query), fields(destination = %query.destination))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<HotelSummary>> {
        let search = validate_search(query)?;
        if self.store.state(|s| s.flow.is_submitting()).await {
            return Err(ClientError::validation("A confirmation is being submitted"));
        }

        let request_id = Uuid::new_v4();
        let outcome = self
            .store
            .send_and_wait_for(BookingAction::Search { request_id, query: search }, |action| {
                matches!(
                    action,
                    BookingAction::SearchCompleted { request_id: id, .. }
                    | BookingAction::SearchFailed { request_id: id, .. } if *id == request_id
                )
            })
            .await?;

        match outcome {
            Some(BookingAction::SearchCompleted { results, .. }) => Ok(results),
            Some(BookingAction::SearchFailed { error, .. }) => Err(error),
            _ => Err(ClientError::validation("A confirmation is being submitted")),
        }
    }

    /// Open a hotel from the current results.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when the hotel is not in the results.
    pub async fn select_hotel(&self, hotel_id: HotelId) -> Result<HotelSummary> {
        let known = self
            .store
            .state(|s| {
                !s.flow.is_submitting()
                    && s.flow
                        .context()
                        .is_some_and(|(_, results)| results.iter().any(|hotel| hotel.id == hotel_id))
            })
            .await;
        if !known {
            return Err(ClientError::validation(format!("Hotel {hotel_id} is not in the search results")));
        }

        self.store.send(BookingAction::SelectHotel { hotel_id }).await?;

        self.store
            .state(|s| match &s.flow {
                BookingFlow::HotelDetail { hotel, .. } if hotel.id == hotel_id => Some(hotel.clone()),
                _ => None,
            })
            .await
            .ok_or_else(|| ClientError::validation("The search results changed"))
    }

    /// Return to the cached results without searching again.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when there are no results to return to.
    pub async fn back_to_results(&self) -> Result<Vec<HotelSummary>> {
        self.store.send(BookingAction::BackToResults).await?;
        self.store
            .state(|s| match &s.flow {
                BookingFlow::ResultsShown { results, .. } => Some(results.clone()),
                _ => None,
            })
            .await
            .ok_or_else(|| ClientError::validation("There are no search results"))
    }

    /// Carry a reservation to the confirmation step. No request is made.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when the hotel is not in the current
    /// search or `nights` is zero.
    pub async fn reserve(&self, hotel_id: HotelId, nights: u32, total_price: Money) -> Result<ReservationDraft> {
        let draft = self
            .store
            .state(|s| s.plan_reservation(hotel_id, nights, total_price))
            .await?;

        self.store
            .send(BookingAction::Reserve { draft: draft.clone() })
            .await?;

        let accepted = self.store.state(|s| s.flow.draft() == Some(&draft)).await;
        if !accepted {
            return Err(ClientError::validation("The search results changed"));
        }
        Ok(draft)
    }

    /// Submit the pending reservation.
    ///
    /// On failure the collection is untouched and the draft stays pending
    /// so the user can retry.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when nothing is pending or a submission
    /// is already in flight; gateway errors from the booking service.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self) -> Result<Booking> {
        self.store.state(|s| s.check_confirm().map(|_| ())).await?;

        let request_id = Uuid::new_v4();
        let outcome = self
            .store
            .send_and_wait_for(BookingAction::ConfirmReservation { request_id }, |action| {
                matches!(
                    action,
                    BookingAction::ReservationConfirmed { request_id: id, .. }
                    | BookingAction::ReservationFailed { request_id: id, .. } if *id == request_id
                )
            })
            .await?;

        match outcome {
            Some(BookingAction::ReservationConfirmed { booking, .. }) => Ok(booking),
            Some(BookingAction::ReservationFailed { error, .. }) => Err(error),
            _ => Err(ClientError::validation("A confirmation is already being submitted")),
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Booking Collection
    // ═══════════════════════════════════════════════════════════

    /// Cancel a confirmed booking.
    ///
    /// The cached status becomes `Cancelled` before the request is sent and
    /// is restored exactly if the request fails.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown or pending booking; the
    /// gateway error after a rollback.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: BookingId) -> Result<CancelOutcome> {
        if self.store.state(|s| s.check_cancel(booking_id)).await?.is_none() {
            tracing::debug!("Already cancelled, nothing sent");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let outcome = self
            .store
            .send_and_wait_for(BookingAction::CancelBooking { booking_id }, |action| {
                matches!(
                    action,
                    BookingAction::CancellationAcknowledged { booking_id: id, .. }
                    | BookingAction::CancellationRejected { booking_id: id, .. } if *id == booking_id
                )
            })
            .await?;

        match outcome {
            Some(BookingAction::CancellationAcknowledged { message, .. }) => Ok(CancelOutcome::Cancelled { message }),
            Some(BookingAction::CancellationRejected { error, .. }) => Err(error),
            // Another cancellation of the same booking won the race.
            _ => Ok(CancelOutcome::AlreadyCancelled),
        }
    }

    /// Refresh the user's bookings.
    ///
    /// # Errors
    ///
    /// Gateway errors; the cached collection is emptied in that case.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Booking>> {
        let request_id = Uuid::new_v4();
        let outcome = self
            .store
            .send_and_wait_for(BookingAction::LoadBookings { request_id }, |action| {
                matches!(
                    action,
                    BookingAction::BookingsLoaded { request_id: id, .. }
                    | BookingAction::BookingsFailed { request_id: id, .. } if *id == request_id
                )
            })
            .await?;

        match outcome {
            Some(BookingAction::BookingsFailed { error, .. }) => Err(error),
            _ => Ok(self.bookings().await),
        }
    }

    /// Fetch one booking and refresh it in the collection.
    ///
    /// # Errors
    ///
    /// Gateway errors.
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking> {
        let request_id = Uuid::new_v4();
        let outcome = self
            .store
            .send_and_wait_for(BookingAction::LoadBooking { request_id, booking_id }, |action| {
                matches!(
                    action,
                    BookingAction::BookingLoaded { request_id: id, .. }
                    | BookingAction::BookingFailed { request_id: id, .. } if *id == request_id
                )
            })
            .await?;

        match outcome {
            Some(BookingAction::BookingLoaded { booking, .. }) => Ok(self
                .store
                .state(|s| s.booking(booking_id).cloned())
                .await
                .unwrap_or(booking)),
            Some(BookingAction::BookingFailed { error, .. }) => Err(error),
            _ => Err(ClientError::network("booking request produced no answer")),
        }
    }

    /// Forget the current user's bookings and flow.
    ///
    /// # Errors
    ///
    /// [`ClientError::ShuttingDown`] if the controller has been shut down.
    pub async fn end_session(&self) -> Result<()> {
        self.store.send(BookingAction::EndSession).await?;
        Ok(())
    }

    /// Stop accepting commands and wait for in-flight requests.
    ///
    /// # Errors
    ///
    /// [`ClientError::ShuttingDown`] if requests are still running after
    /// the shutdown timeout.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.shutdown().await?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════

    /// Cached bookings.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.store.state(|s| s.bookings.clone()).await
    }

    /// Cached status of one booking.
    pub async fn status_of(&self, booking_id: BookingId) -> Option<BookingStatus> {
        self.store
            .state(|s| s.booking(booking_id).map(|booking| booking.status))
            .await
    }

    /// Current search flow.
    pub async fn flow(&self) -> BookingFlow {
        self.store.state(|s| s.flow.clone()).await
    }

    /// Most recent surfaced failure.
    pub async fn last_error(&self) -> Option<ClientError> {
        self.store.state(|s| s.last_error.clone()).await
    }

    /// When the collection was last refreshed from the server.
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.store.state(|s| s.last_refreshed).await
    }
}
