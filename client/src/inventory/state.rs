//! Inventory caches and the checks run before each mutation.

use crate::error::{ClientError, Result};
use crate::inventory::types::{Hotel, NewHotel, NewRate, NewRoom, Rate, Room};
use crate::types::HotelId;
use uuid::Uuid;

/// Read caches of the admin views.
///
/// A list flagged `stale` was mutated since it was last loaded and is
/// reloaded wholesale the next time its view is entered.
#[derive(Debug, Clone)]
pub struct InventoryState {
    /// Every hotel
    pub hotels: Vec<Hotel>,
    /// Rooms of `selected_hotel`
    pub rooms: Vec<Room>,
    /// Hotel whose rooms are cached
    pub selected_hotel: Option<HotelId>,
    /// Rates created during this session
    pub rates: Vec<Rate>,
    /// Hotel list needs a reload
    pub hotels_stale: bool,
    /// Room list needs a reload
    pub rooms_stale: bool,
    /// Hotel load whose answer will be applied
    pub active_hotels_load: Option<Uuid>,
    /// Room load whose answer will be applied
    pub active_rooms_load: Option<Uuid>,
    /// Most recent failure surfaced to the user
    pub last_error: Option<ClientError>,
}

impl Default for InventoryState {
    fn default() -> Self {
        Self {
            hotels: Vec::new(),
            rooms: Vec::new(),
            selected_hotel: None,
            rates: Vec::new(),
            hotels_stale: true,
            rooms_stale: true,
            active_hotels_load: None,
            active_rooms_load: None,
            last_error: None,
        }
    }
}

impl InventoryState {
    /// Rooms and rates need a hotel to point at.
    #[must_use]
    pub fn can_create_room(&self) -> bool {
        !self.hotels.is_empty()
    }

    /// Loaded hotel by id.
    #[must_use]
    pub fn hotel(&self, id: HotelId) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == id)
    }

    fn require_hotel(&self, id: HotelId) -> Result<()> {
        if !self.can_create_room() {
            return Err(ClientError::validation("Create a hotel first"));
        }
        if self.hotel(id).is_none() {
            return Err(ClientError::validation(format!("Hotel {id} is not in the loaded list")));
        }
        Ok(())
    }

    /// Check a room before it is sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when no hotels are loaded, the hotel is
    /// unknown, the room number is zero or the price is missing.
    pub fn check_room(&self, room: &NewRoom) -> Result<()> {
        self.require_hotel(room.hotel_id)?;
        if room.room_number == 0 {
            return Err(ClientError::validation("Room number is required"));
        }
        if room.price.is_zero() {
            return Err(ClientError::validation("Price is required"));
        }
        Ok(())
    }

    /// Check a rate before it is sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] when no hotels are loaded, the hotel is
    /// unknown, the period is empty or the price is missing.
    pub fn check_rate(&self, rate: &NewRate) -> Result<()> {
        self.require_hotel(rate.hotel_id)?;
        if rate.end_date <= rate.start_date {
            return Err(ClientError::validation("End date must be after start date"));
        }
        if rate.price.is_zero() {
            return Err(ClientError::validation("Price is required"));
        }
        Ok(())
    }
}

/// Trim a hotel payload and check its required fields.
///
/// # Errors
///
/// [`ClientError::Validation`] naming the first empty field.
pub fn validate_hotel(hotel: &NewHotel) -> Result<NewHotel> {
    let required = [
        ("Name", hotel.name.trim()),
        ("City", hotel.city.trim()),
        ("Address", hotel.address.trim()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(ClientError::validation(format!("{field} is required")));
    }
    Ok(NewHotel {
        name: hotel.name.trim().to_string(),
        city: hotel.city.trim().to_string(),
        address: hotel.address.trim().to_string(),
        status: hotel.status,
        images: hotel.images.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::types::{HotelStatus, RoomStatus, RoomType};
    use crate::types::Money;
    use chrono::NaiveDate;

    fn hotel(id: u64) -> Hotel {
        Hotel {
            id: HotelId::new(id),
            name: "Mar Azul".to_string(),
            city: "Lima".to_string(),
            address: "Av. Costanera 100".to_string(),
            status: HotelStatus::Available,
            images: Vec::new(),
        }
    }

    fn room(hotel_id: u64, number: u32) -> NewRoom {
        NewRoom {
            hotel_id: HotelId::new(hotel_id),
            room_number: number,
            room_type: RoomType::Double,
            price: Money::from_cents(12_000),
            status: RoomStatus::Available,
            images: Vec::new(),
        }
    }

    #[test]
    fn hotel_fields_are_required_and_trimmed() {
        let blank_city = NewHotel {
            name: "Mar Azul".to_string(),
            city: "  ".to_string(),
            address: "Av. Costanera 100".to_string(),
            ..NewHotel::default()
        };
        assert_eq!(
            validate_hotel(&blank_city),
            Err(ClientError::validation("City is required"))
        );

        let padded = NewHotel {
            name: " Mar Azul ".to_string(),
            ..blank_city
        };
        let padded = NewHotel {
            city: "Lima".to_string(),
            ..padded
        };
        assert_eq!(validate_hotel(&padded).map(|h| h.name), Ok("Mar Azul".to_string()));
    }

    #[test]
    fn room_creation_is_disabled_without_hotels() {
        let state = InventoryState::default();
        assert!(!state.can_create_room());
        assert_eq!(
            state.check_room(&room(1, 101)),
            Err(ClientError::validation("Create a hotel first"))
        );
    }

    #[test]
    fn room_must_reference_a_loaded_hotel() {
        let state = InventoryState {
            hotels: vec![hotel(1)],
            ..InventoryState::default()
        };
        assert!(state.check_room(&room(1, 101)).is_ok());
        assert!(state.check_room(&room(2, 101)).is_err());
        assert!(state.check_room(&room(1, 0)).is_err());
    }

    #[test]
    fn rate_period_must_not_be_empty() {
        let state = InventoryState {
            hotels: vec![hotel(1)],
            ..InventoryState::default()
        };
        let day = |d| NaiveDate::from_ymd_opt(2025, 6, d).unwrap_or_default();
        let rate = NewRate {
            hotel_id: HotelId::new(1),
            room_type: RoomType::Suite,
            price: Money::from_cents(30_000),
            start_date: day(10),
            end_date: day(10),
        };
        assert!(state.check_rate(&rate).is_err());
        assert!(state.check_rate(&NewRate { end_date: day(20), ..rate }).is_ok());
    }
}
