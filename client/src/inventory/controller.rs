//! Async facade over the inventory store.

use crate::environment::ClientEnvironment;
use crate::error::{ClientError, Result};
use crate::gateway::HttpTransport;
use crate::inventory::actions::InventoryAction;
use crate::inventory::reducer::InventoryReducer;
use crate::inventory::state::{InventoryState, validate_hotel};
use crate::inventory::types::{Hotel, NewHotel, NewRate, NewRoom, Rate, Room};
use crate::types::HotelId;
use staybook_runtime::{Store, StoreConfig};
use std::fmt;
use uuid::Uuid;

/// Store running the inventory reducer.
pub type InventoryStore<T> = Store<InventoryState, InventoryAction, ClientEnvironment<T>, InventoryReducer<T>>;

/// Inventory admin controller.
pub struct InventoryController<T: HttpTransport> {
    store: InventoryStore<T>,
}

impl<T: HttpTransport> Clone for InventoryController<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: HttpTransport> fmt::Debug for InventoryController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryController").finish_non_exhaustive()
    }
}

impl<T: HttpTransport> InventoryController<T> {
    /// Create a controller with empty caches.
    #[must_use]
    pub fn new(environment: ClientEnvironment<T>) -> Self {
        let config = StoreConfig::default().with_broadcast_capacity(256);
        Self {
            store: Store::with_config(InventoryState::default(), InventoryReducer::new(), environment, config),
        }
    }

    /// Send a request-backed command and return its outcome event.
    async fn dispatch(&self, command: impl FnOnce(Uuid) -> InventoryAction) -> Result<InventoryAction> {
        let request_id = Uuid::new_v4();
        self.store
            .send_and_wait_for(command(request_id), |action| action.answers(request_id))
            .await?
            .ok_or_else(|| ClientError::network("inventory request produced no answer"))
    }

    // ═══════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════

    /// Reload the hotel list.
    ///
    /// # Errors
    ///
    /// Gateway errors; the cached list is emptied in that case.
    pub async fn load_hotels(&self) -> Result<Vec<Hotel>> {
        match self.dispatch(|request_id| InventoryAction::LoadHotels { request_id }).await? {
            InventoryAction::LoadFailed { error, .. } => Err(error),
            _ => Ok(self.hotels().await),
        }
    }

    /// Reload the hotel list only if it was never loaded or has changed.
    ///
    /// # Errors
    ///
    /// As [`Self::load_hotels`].
    pub async fn refresh_hotels_if_stale(&self) -> Result<Vec<Hotel>> {
        if self.store.state(|s| s.hotels_stale).await {
            return self.load_hotels().await;
        }
        Ok(self.hotels().await)
    }

    /// Select a hotel and reload its rooms.
    ///
    /// # Errors
    ///
    /// Gateway errors; the cached rooms are emptied in that case.
    pub async fn load_rooms(&self, hotel_id: HotelId) -> Result<Vec<Room>> {
        match self
            .dispatch(|request_id| InventoryAction::LoadRooms { request_id, hotel_id })
            .await?
        {
            InventoryAction::LoadFailed { error, .. } => Err(error),
            _ => Ok(self.rooms().await),
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════

    /// Create a hotel and append it to the list.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank name, city or address;
    /// the server's rejection otherwise, with the list unchanged.
    #[tracing::instrument(skip(self, hotel), fields(name = %hotel.name))]
    pub async fn create_hotel(&self, hotel: &NewHotel) -> Result<Hotel> {
        let hotel = validate_hotel(hotel)?;
        match self
            .dispatch(|request_id| InventoryAction::CreateHotel { request_id, hotel })
            .await?
        {
            InventoryAction::HotelCreated { hotel, .. } => Ok(hotel),
            InventoryAction::MutationFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Delete a hotel.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a hotel that is not loaded; the
    /// server's rejection (e.g. a hotel with rooms) otherwise, with the
    /// list unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn delete_hotel(&self, hotel_id: HotelId) -> Result<()> {
        if self.store.state(|s| s.hotel(hotel_id).is_none()).await {
            return Err(ClientError::validation(format!("Hotel {hotel_id} is not in the loaded list")));
        }
        match self
            .dispatch(|request_id| InventoryAction::DeleteHotel { request_id, hotel_id })
            .await?
        {
            InventoryAction::HotelDeleted { .. } => Ok(()),
            InventoryAction::MutationFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Create a room.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when no hotels are loaded or the room is
    /// incomplete; the server's rejection otherwise.
    #[tracing::instrument(skip(self, room), fields(hotel_id = %room.hotel_id))]
    pub async fn create_room(&self, room: &NewRoom) -> Result<Room> {
        self.store.state(|s| s.check_room(room)).await?;
        let room = room.clone();
        match self
            .dispatch(|request_id| InventoryAction::CreateRoom { request_id, room })
            .await?
        {
            InventoryAction::RoomCreated { room, .. } => Ok(room),
            InventoryAction::MutationFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Create a rate.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when no hotels are loaded or the period
    /// is empty; the server's rejection otherwise.
    #[tracing::instrument(skip(self, rate), fields(hotel_id = %rate.hotel_id))]
    pub async fn create_rate(&self, rate: &NewRate) -> Result<Rate> {
        self.store.state(|s| s.check_rate(rate)).await?;
        let rate = rate.clone();
        match self
            .dispatch(|request_id| InventoryAction::CreateRate { request_id, rate })
            .await?
        {
            InventoryAction::RateCreated { rate, .. } => Ok(rate),
            InventoryAction::MutationFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Drop every cached list.
    ///
    /// # Errors
    ///
    /// [`ClientError::ShuttingDown`] if the controller has been shut down.
    pub async fn reset(&self) -> Result<()> {
        self.store.send(InventoryAction::Reset).await?;
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

    /// Cached hotels.
    pub async fn hotels(&self) -> Vec<Hotel> {
        self.store.state(|s| s.hotels.clone()).await
    }

    /// Cached rooms of the selected hotel.
    pub async fn rooms(&self) -> Vec<Room> {
        self.store.state(|s| s.rooms.clone()).await
    }

    /// Rates created this session.
    pub async fn rates(&self) -> Vec<Rate> {
        self.store.state(|s| s.rates.clone()).await
    }

    /// Whether rooms and rates can be created.
    pub async fn can_create_room(&self) -> bool {
        self.store.state(InventoryState::can_create_room).await
    }

    /// Whether the hotel list must be reloaded before it is shown.
    pub async fn hotels_stale(&self) -> bool {
        self.store.state(|s| s.hotels_stale).await
    }

    /// Whether the room list must be reloaded before it is shown.
    pub async fn rooms_stale(&self) -> bool {
        self.store.state(|s| s.rooms_stale).await
    }

    /// Most recent surfaced failure.
    pub async fn last_error(&self) -> Option<ClientError> {
        self.store.state(|s| s.last_error.clone()).await
    }
}

fn unexpected(action: &InventoryAction) -> ClientError {
    tracing::error!(?action, "Unexpected inventory outcome");
    ClientError::network("unexpected inventory outcome")
}
