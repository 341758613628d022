//! Inventory admin actions.

use crate::error::ClientError;
use crate::inventory::types::{Hotel, NewHotel, NewRate, NewRoom, Rate, Room};
use crate::types::HotelId;
use uuid::Uuid;

/// Input to the inventory reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryAction {
    // ═══════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════
    /// Reload the hotel list.
    LoadHotels {
        /// Correlates the outcome
        request_id: Uuid,
    },

    /// Select a hotel and reload its rooms.
    LoadRooms {
        /// Correlates the outcome
        request_id: Uuid,
        /// Hotel whose rooms to list
        hotel_id: HotelId,
    },

    /// Create a hotel.
    CreateHotel {
        /// Correlates the outcome
        request_id: Uuid,
        /// Validated payload
        hotel: NewHotel,
    },

    /// Delete a hotel.
    DeleteHotel {
        /// Correlates the outcome
        request_id: Uuid,
        /// Hotel to delete
        hotel_id: HotelId,
    },

    /// Create a room.
    CreateRoom {
        /// Correlates the outcome
        request_id: Uuid,
        /// Validated payload
        room: NewRoom,
    },

    /// Create a rate.
    CreateRate {
        /// Correlates the outcome
        request_id: Uuid,
        /// Validated payload
        rate: NewRate,
    },

    /// Drop every cached list.
    Reset,

    // ═══════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════
    /// Hotel list fetched.
    HotelsLoaded {
        /// Originating load
        request_id: Uuid,
        /// Every hotel
        hotels: Vec<Hotel>,
    },

    /// Room list fetched.
    RoomsLoaded {
        /// Originating load
        request_id: Uuid,
        /// Rooms of the selected hotel
        rooms: Vec<Room>,
    },

    /// A read failed.
    LoadFailed {
        /// Originating load
        request_id: Uuid,
        /// Why
        error: ClientError,
    },

    /// Hotel created.
    HotelCreated {
        /// Originating command
        request_id: Uuid,
        /// Server copy
        hotel: Hotel,
    },

    /// Hotel deleted.
    HotelDeleted {
        /// Originating command
        request_id: Uuid,
        /// Deleted hotel
        hotel_id: HotelId,
    },

    /// Room created.
    RoomCreated {
        /// Originating command
        request_id: Uuid,
        /// Server copy
        room: Room,
    },

    /// Rate created.
    RateCreated {
        /// Originating command
        request_id: Uuid,
        /// Server copy
        rate: Rate,
    },

    /// A mutation was rejected; cached lists are untouched.
    MutationFailed {
        /// Originating command
        request_id: Uuid,
        /// Why, with the server message verbatim
        error: ClientError,
    },
}

impl InventoryAction {
    /// Whether this event answers the command with `request_id`.
    #[must_use]
    pub fn answers(&self, request_id: Uuid) -> bool {
        match self {
            Self::HotelsLoaded { request_id: id, .. }
            | Self::RoomsLoaded { request_id: id, .. }
            | Self::LoadFailed { request_id: id, .. }
            | Self::HotelCreated { request_id: id, .. }
            | Self::HotelDeleted { request_id: id, .. }
            | Self::RoomCreated { request_id: id, .. }
            | Self::RateCreated { request_id: id, .. }
            | Self::MutationFailed { request_id: id, .. } => *id == request_id,
            _ => false,
        }
    }
}
