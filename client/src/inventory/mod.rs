//! Inventory administration: hotels, rooms and rates.
//!
//! Each entity is managed independently. Creations append the server's copy
//! to the cached list, deletions remove it, and every successful mutation
//! flags the list for a wholesale reload on the next view entry.

pub mod actions;
pub mod controller;
pub mod reducer;
pub mod state;
pub mod types;

pub use actions::InventoryAction;
pub use controller::{InventoryController, InventoryStore};
pub use reducer::InventoryReducer;
pub use state::{InventoryState, validate_hotel};
pub use types::{
    Hotel, HotelStatus, NewHotel, NewRate, NewRoom, Rate, Room, RoomStatus, RoomType,
    parse_image_list,
};
