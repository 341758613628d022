//! Typed endpoints over the gateway.
//!
//! Every remote route of the travel platform has one method here. Responses
//! are parsed into domain types at this boundary; anything that does not fit
//! becomes a [`ClientError::Schema`].

use crate::error::{ClientError, Result};
use crate::gateway::{Access, ApiClient, HttpTransport, Method};
use crate::inventory::{Hotel, NewHotel, NewRate, NewRoom, Rate, Room};
use crate::types::{
    Booking, BookingId, BookingStatus, Credential, HotelId, HotelSummary, Identity, Money,
    ReservationDraft, ValidSearch, wire_date,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Issued bearer token
    pub token: Credential,
    /// Profile of the signed-in user
    pub user: Identity,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityQuery<'a> {
    destination: &'a str,
    #[serde(with = "wire_date")]
    check_in: NaiveDate,
    #[serde(with = "wire_date")]
    check_out: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationRequest {
    hotel_id: HotelId,
    #[serde(with = "wire_date")]
    check_in: NaiveDate,
    #[serde(with = "wire_date")]
    check_out: NaiveDate,
    total_price: Money,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomsQuery {
    hotel_id: HotelId,
}

/// Booking as sent by the booking service.
///
/// Fields the server may omit are optional; [`BookingRecord::into_booking`]
/// fills them from the reservation draft when one is available.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    id: BookingId,
    #[serde(default, alias = "hotel_id")]
    hotel_id: Option<HotelId>,
    #[serde(default, alias = "hotel_name")]
    hotel_name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "check_in", deserialize_with = "wire_date::option::deserialize")]
    check_in: Option<NaiveDate>,
    #[serde(default, alias = "check_out", deserialize_with = "wire_date::option::deserialize")]
    check_out: Option<NaiveDate>,
    #[serde(default, alias = "total_price")]
    total_price: Option<Money>,
    #[serde(default, alias = "confirmation_code")]
    confirmation_code: Option<String>,
    #[serde(default)]
    status: Option<BookingStatus>,
}

impl BookingRecord {
    /// Validate the record into a [`Booking`].
    ///
    /// A missing status means the booking is confirmed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Schema`] if a required field is missing (and not
    /// supplied by `draft`) or `checkOut` is not after `checkIn`.
    pub fn into_booking(self, draft: Option<&ReservationDraft>) -> Result<Booking> {
        let id = self.id;
        let missing = |field: &str| ClientError::schema(format!("booking {id} is missing {field}"));

        let hotel_id = self
            .hotel_id
            .or_else(|| draft.map(|d| d.hotel_id))
            .ok_or_else(|| missing("hotelId"))?;
        let check_in = self
            .check_in
            .or_else(|| draft.map(|d| d.check_in))
            .ok_or_else(|| missing("checkIn"))?;
        let check_out = self
            .check_out
            .or_else(|| draft.map(|d| d.check_out))
            .ok_or_else(|| missing("checkOut"))?;
        let total_price = self
            .total_price
            .or_else(|| draft.map(|d| d.total_price))
            .ok_or_else(|| missing("totalPrice"))?;
        let confirmation_code = self
            .confirmation_code
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| missing("confirmationCode"))?;

        if check_out <= check_in {
            return Err(ClientError::schema(format!(
                "booking {id} has checkOut {check_out} not after checkIn {check_in}"
            )));
        }

        Ok(Booking {
            id,
            hotel_id,
            hotel_name: self
                .hotel_name
                .or_else(|| draft.map(|d| d.hotel_name.clone()))
                .unwrap_or_default(),
            location: self
                .location
                .or_else(|| draft.map(|d| d.location.clone()))
                .unwrap_or_default(),
            check_in,
            check_out,
            total_price,
            confirmation_code,
            status: self.status.unwrap_or(BookingStatus::Confirmed),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct BookingList {
    #[serde(default)]
    bookings: Vec<BookingRecord>,
}

// ============================================================================
// Endpoints
// ============================================================================

impl<T: HttpTransport> ApiClient<T> {
    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Gateway errors; a response without a non-empty `token` and a `user`
    /// object is a [`ClientError::Schema`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response: LoginResponse = self
            .request_typed(
                Method::Post,
                "/auth/login",
                Some(&LoginRequest { email, password }),
                Access::Public,
            )
            .await?;
        if response.token.is_blank() {
            return Err(ClientError::schema("login response has an empty token"));
        }
        Ok(response)
    }

    /// `POST /auth/register`, returning the server's message if any.
    ///
    /// # Errors
    ///
    /// Gateway errors.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Option<String>> {
        let value = self
            .request(
                Method::Post,
                "/auth/register",
                Some(&serde_json::to_value(RegisterRequest { name, email, password })?),
                Access::Public,
            )
            .await?;
        Ok(message_of(value))
    }

    /// `GET /availability?destination&checkIn&checkOut`
    ///
    /// # Errors
    ///
    /// Gateway errors or a body that is not a list of hotel summaries.
    pub async fn availability(&self, search: &ValidSearch) -> Result<Vec<HotelSummary>> {
        let query = serde_urlencoded::to_string(AvailabilityQuery {
            destination: &search.destination,
            check_in: search.check_in,
            check_out: search.check_out,
        })
        .map_err(|e| ClientError::validation(e.to_string()))?;

        let value = self
            .request(Method::Get, &format!("/availability?{query}"), None, Access::Public)
            .await?;
        // An empty body means no availability, not a failure.
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| ClientError::schema(format!("availability: {e}")))
    }

    /// `POST /reservations`
    ///
    /// # Errors
    ///
    /// Gateway errors or an unusable booking in the response.
    pub async fn create_reservation(&self, draft: &ReservationDraft) -> Result<Booking> {
        let request = CreateReservationRequest {
            hotel_id: draft.hotel_id,
            check_in: draft.check_in,
            check_out: draft.check_out,
            total_price: draft.total_price,
        };
        let record: BookingRecord = self
            .request_typed(Method::Post, "/reservations", Some(&request), Access::Authenticated)
            .await?;
        record.into_booking(Some(draft))
    }

    /// `GET /reservations`
    ///
    /// # Errors
    ///
    /// Gateway errors or any unusable booking in the list.
    pub async fn list_reservations(&self) -> Result<Vec<Booking>> {
        let value = self
            .request(Method::Get, "/reservations", None, Access::Authenticated)
            .await?;
        let list: BookingList = if value.is_null() {
            BookingList::default()
        } else {
            serde_json::from_value(value).map_err(|e| ClientError::schema(format!("reservations: {e}")))?
        };
        list.bookings
            .into_iter()
            .map(|record| record.into_booking(None))
            .collect()
    }

    /// `GET /reservations/{id}`
    ///
    /// # Errors
    ///
    /// Gateway errors or an unusable booking.
    pub async fn get_reservation(&self, id: BookingId) -> Result<Booking> {
        let record: BookingRecord = self
            .request_typed::<Value, _>(Method::Get, &format!("/reservations/{id}"), None, Access::Authenticated)
            .await?;
        if record.id != id {
            return Err(ClientError::schema(format!("asked for booking {id}, got {}", record.id)));
        }
        record.into_booking(None)
    }

    /// `DELETE /reservations/{id}`
    ///
    /// # Errors
    ///
    /// Gateway errors.
    pub async fn cancel_reservation(&self, id: BookingId) -> Result<Option<String>> {
        let value = self
            .request(Method::Delete, &format!("/reservations/{id}"), None, Access::Authenticated)
            .await?;
        Ok(message_of(value))
    }

    /// `GET /hotels`
    ///
    /// # Errors
    ///
    /// Gateway errors or a body that is not a list of hotels.
    pub async fn list_hotels(&self) -> Result<Vec<Hotel>> {
        self.request_typed::<Value, _>(Method::Get, "/hotels", None, Access::Authenticated)
            .await
    }

    /// `POST /hotels`
    ///
    /// # Errors
    ///
    /// Gateway errors or an unusable hotel in the response.
    pub async fn create_hotel(&self, hotel: &NewHotel) -> Result<Hotel> {
        self.request_typed(Method::Post, "/hotels", Some(hotel), Access::Authenticated)
            .await
    }

    /// `DELETE /hotels/{id}`
    ///
    /// # Errors
    ///
    /// Gateway errors, e.g. a hotel that still has rooms.
    pub async fn delete_hotel(&self, id: HotelId) -> Result<Option<String>> {
        let value = self
            .request(Method::Delete, &format!("/hotels/{id}"), None, Access::Authenticated)
            .await?;
        Ok(message_of(value))
    }

    /// `GET /rooms?hotelId=`
    ///
    /// # Errors
    ///
    /// Gateway errors or a body that is not a list of rooms.
    pub async fn list_rooms(&self, hotel_id: HotelId) -> Result<Vec<Room>> {
        let query = serde_urlencoded::to_string(RoomsQuery { hotel_id })
            .map_err(|e| ClientError::validation(e.to_string()))?;
        self.request_typed::<Value, _>(Method::Get, &format!("/rooms?{query}"), None, Access::Authenticated)
            .await
    }

    /// `POST /rooms`
    ///
    /// # Errors
    ///
    /// Gateway errors or an unusable room in the response.
    pub async fn create_room(&self, room: &NewRoom) -> Result<Room> {
        self.request_typed(Method::Post, "/rooms", Some(room), Access::Authenticated)
            .await
    }

    /// `POST /rates`
    ///
    /// # Errors
    ///
    /// Gateway errors or an unusable rate in the response.
    pub async fn create_rate(&self, rate: &NewRate) -> Result<Rate> {
        self.request_typed(Method::Post, "/rates", Some(rate), Access::Authenticated)
            .await
    }
}

fn message_of(value: Value) -> Option<String> {
    serde_json::from_value::<MessageResponse>(value)
        .ok()
        .and_then(|response| response.message)
        .filter(|message| !message.trim().is_empty())
}
