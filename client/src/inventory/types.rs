//! Inventory entities and creation payloads.

use crate::types::{HotelId, Money, RateId, RoomId, wire_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Operational status of a hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotelStatus {
    /// Accepting reservations
    #[default]
    #[serde(alias = "Available", alias = "AVAILABLE", alias = "disponible", alias = "Disponible")]
    Available,
    /// Temporarily closed
    #[serde(alias = "Unavailable", alias = "UNAVAILABLE", alias = "fueradeservicio", alias = "FueraDeServicio")]
    Unavailable,
}

/// Room category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// One guest
    #[serde(alias = "Single", alias = "SINGLE", alias = "sencilla", alias = "Sencilla")]
    Single,
    /// Two guests
    #[default]
    #[serde(alias = "Double", alias = "DOUBLE", alias = "doble", alias = "Doble")]
    Double,
    /// Suite
    #[serde(alias = "Suite", alias = "SUITE")]
    Suite,
}

/// Room availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Can be booked
    #[default]
    #[serde(alias = "Available", alias = "disponible", alias = "Disponible")]
    Available,
    /// Being serviced
    #[serde(alias = "Maintenance", alias = "mantenimiento", alias = "Mantenimiento")]
    Maintenance,
    /// Not bookable
    #[serde(alias = "OutOfService", alias = "outofservice", alias = "fueradeservicio", alias = "FueraDeServicio")]
    OutOfService,
}

/// A hotel as returned by the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    /// Hotel id
    pub id: HotelId,
    /// Hotel name
    pub name: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// Street address
    #[serde(default)]
    pub address: String,
    /// Operational status
    #[serde(default)]
    pub status: HotelStatus,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
}

/// A room as returned by the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room id
    pub id: RoomId,
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Number shown on the door
    pub room_number: u32,
    /// Category
    #[serde(default)]
    pub room_type: RoomType,
    /// Nightly price
    pub price: Money,
    /// Availability
    #[serde(default)]
    pub status: RoomStatus,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
}

/// A seasonal price for one room type of a hotel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    /// Rate id
    pub id: RateId,
    /// Hotel the rate applies to
    pub hotel_id: HotelId,
    /// Room category
    pub room_type: RoomType,
    /// Nightly price
    pub price: Money,
    /// First day the rate applies
    #[serde(with = "wire_date")]
    pub start_date: NaiveDate,
    /// Last day the rate applies
    #[serde(with = "wire_date")]
    pub end_date: NaiveDate,
}

/// Payload for `POST /hotels`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHotel {
    /// Hotel name
    pub name: String,
    /// City
    pub city: String,
    /// Street address
    pub address: String,
    /// Initial status
    pub status: HotelStatus,
    /// Image URLs
    pub images: Vec<String>,
}

/// Payload for `POST /rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Number shown on the door
    pub room_number: u32,
    /// Category
    pub room_type: RoomType,
    /// Nightly price
    pub price: Money,
    /// Availability
    pub status: RoomStatus,
    /// Image URLs
    pub images: Vec<String>,
}

/// Payload for `POST /rates`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRate {
    /// Hotel the rate applies to
    pub hotel_id: HotelId,
    /// Room category
    pub room_type: RoomType,
    /// Nightly price
    pub price: Money,
    /// First day
    #[serde(with = "wire_date")]
    pub start_date: NaiveDate,
    /// Last day
    #[serde(with = "wire_date")]
    pub end_date: NaiveDate,
}

/// Split comma-separated URL input, trimming and dropping empty entries.
///
/// ```
/// use staybook_client::inventory::parse_image_list;
///
/// assert_eq!(parse_image_list("a.jpg, b.jpg,,c.jpg "), vec!["a.jpg", "b.jpg", "c.jpg"]);
/// ```
#[must_use]
pub fn parse_image_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
