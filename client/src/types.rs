//! Domain types shared by the session, booking and inventory components.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a server-assigned identifier
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// The raw identifier
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Server-assigned booking identifier
    BookingId
);
define_id!(
    /// Server-assigned hotel identifier
    HotelId
);
define_id!(
    /// Server-assigned room identifier
    RoomId
);
define_id!(
    /// Server-assigned rate identifier
    RateId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// A non-negative amount of money, stored in cents
///
/// On the wire it is a plain JSON number in major units (`450`, `99.5`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole units with overflow checking
    #[must_use]
    pub const fn checked_from_units(units: u64) -> Option<Self> {
        match units.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Parses a decimal amount such as `"150"` or `"99.90"`
    ///
    /// Negative, non-finite and unrepresentable amounts are rejected.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let cents = (value * 100.0).round();
        // finite, non-negative and within range, so the cast is exact enough
        (cents <= u64::MAX as f64).then(|| Self(cents as u64))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| format!("invalid amount: {s}"))?;
        Self::from_decimal(value).ok_or_else(|| format!("invalid amount: {s}"))
    }
}

impl Serialize for Money {
    #[allow(clippy::cast_precision_loss)] // amounts stay far below 2^52 cents
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(units) => Self::checked_from_units(units)
                .ok_or_else(|| serde::de::Error::custom("amount out of range")),
            Raw::Float(value) => Self::from_decimal(value)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid amount {value}"))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Serde helpers for calendar dates sent as `YYYY-MM-DD`
///
/// Deserialization also accepts full timestamps and keeps the date part.
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    /// Parse a date, ignoring any time component
    ///
    /// # Errors
    ///
    /// Returns a message when the text does not start with a valid date.
    pub fn parse(text: &str) -> Result<NaiveDate, String> {
        let trimmed = text.trim();
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, FORMAT).map_err(|e| format!("invalid date {text:?}: {e}"))
    }

    /// Serialize as `YYYY-MM-DD`
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    /// Deserialize a date or timestamp string
    ///
    /// # Errors
    ///
    /// Fails when the value is not a string holding a date.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module for `Option<NaiveDate>`
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer};

        /// Deserialize an optional date or timestamp string
        ///
        /// # Errors
        ///
        /// Fails when a present value is not a valid date.
        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(text) if !text.trim().is_empty() => {
                    super::parse(&text).map(Some).map_err(serde::de::Error::custom)
                },
                _ => Ok(None),
            }
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Opaque bearer token issued by the authentication service
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Role {
    /// Browsing without an account
    Guest,
    /// Regular customer (assumed when the server sends no role)
    #[default]
    Customer,
    /// Inventory administrator
    Admin,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Customer => "Customer",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" | "invitado" => Ok(Self::Guest),
            "customer" | "user" | "client" | "cliente" => Ok(Self::Customer),
            "admin" | "administrator" | "administrador" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Resolved user profile associated with a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Role used by the access guard
    #[serde(default)]
    pub role: Role,
    /// Name shown in the interface
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Account email, when the server returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity
    pub fn new(role: Role, display_name: impl Into<String>) -> Self {
        Self {
            role,
            display_name: display_name.into(),
            email: None,
        }
    }

    /// Attach the account email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

// ============================================================================
// Booking Types
// ============================================================================

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BookingStatus {
    /// Created but not yet confirmed by the booking service
    Pending,
    /// Confirmed and paid
    Confirmed,
    /// Terminal
    Cancelled,
}

impl BookingStatus {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed) | (Self::Confirmed, Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        };
        f.pad(label)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendiente" => Ok(Self::Pending),
            "confirmed" | "confirmada" => Ok(Self::Confirmed),
            "cancelled" | "canceled" | "cancelada" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A reservation as cached by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Server-assigned id
    pub id: BookingId,
    /// Hotel the booking is for
    pub hotel_id: HotelId,
    /// Hotel name
    pub hotel_name: String,
    /// Hotel location
    pub location: String,
    /// Arrival date
    #[serde(with = "wire_date")]
    pub check_in: NaiveDate,
    /// Departure date, always after `check_in`
    #[serde(with = "wire_date")]
    pub check_out: NaiveDate,
    /// Total price for the stay
    pub total_price: Money,
    /// Server-assigned confirmation code
    pub confirmation_code: String,
    /// Lifecycle status
    pub status: BookingStatus,
}

impl Booking {
    /// Number of nights covered by the booking
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// Availability search input
///
/// Dates are optional so that a half-filled search form can be represented;
/// `search` rejects it before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// City or region
    pub destination: String,
    /// Arrival date
    pub check_in: Option<NaiveDate>,
    /// Departure date
    pub check_out: Option<NaiveDate>,
}

impl SearchQuery {
    /// Create a complete query
    pub fn new(destination: impl Into<String>, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            destination: destination.into(),
            check_in: Some(check_in),
            check_out: Some(check_out),
        }
    }
}

/// A query that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSearch {
    /// City or region
    pub destination: String,
    /// Arrival date
    pub check_in: NaiveDate,
    /// Departure date, strictly after `check_in`
    pub check_out: NaiveDate,
}

impl ValidSearch {
    /// Number of nights searched
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// One hotel in a search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSummary {
    /// Hotel id
    pub id: HotelId,
    /// Hotel name
    pub name: String,
    /// Price for one night
    pub price_per_night: Money,
    /// Cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// City or address, when provided
    #[serde(default, alias = "city", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Pending reservation carried from hotel detail to confirmation
///
/// Not a booking: nothing exists server-side until confirmation succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    /// Hotel being reserved
    pub hotel_id: HotelId,
    /// Hotel name, used to fill gaps in the creation response
    pub hotel_name: String,
    /// Hotel location, used to fill gaps in the creation response
    pub location: String,
    /// Arrival date
    pub check_in: NaiveDate,
    /// Departure date
    pub check_out: NaiveDate,
    /// Number of nights
    pub nights: u32,
    /// Total price for the stay
    pub total_price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn money_uses_plain_numbers_on_the_wire() {
        let whole: Money = serde_json::from_value(json!(450)).unwrap_or_default();
        assert_eq!(whole.cents(), 45_000);
        assert_eq!(serde_json::to_value(whole).ok(), Some(json!(450)));

        let fractional: Money = serde_json::from_value(json!(99.9)).unwrap_or_default();
        assert_eq!(fractional.cents(), 9_990);
        assert_eq!(fractional.to_string(), "$99.90");

        assert!(serde_json::from_value::<Money>(json!(-1)).is_err());
        assert!(serde_json::from_value::<Money>(json!(-0.5)).is_err());
    }

    #[test]
    fn money_accepts_numeric_strings() {
        let parsed: Money = serde_json::from_value(json!("150.00")).unwrap_or_default();
        assert_eq!(parsed, Money::from_cents(15_000));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn spanish_role_names_are_accepted() {
        assert_eq!("Cliente".parse::<Role>(), Ok(Role::Customer));
        assert_eq!("Administrador".parse::<Role>(), Ok(Role::Admin));
        let identity: Option<Identity> =
            serde_json::from_value(json!({"role": "Cliente", "name": "Ana"})).ok();
        assert_eq!(identity.map(|identity| identity.role), Some(Role::Customer));
    }

    #[test]
    fn spanish_booking_statuses_are_accepted() {
        assert_eq!("Confirmada".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert_eq!("pendiente".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!("CANCELADA".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        let parsed: Option<BookingStatus> = serde_json::from_value(json!("Cancelada")).ok();
        assert_eq!(parsed, Some(BookingStatus::Cancelled));
    }

    #[test]
    fn identity_defaults_role_to_customer() {
        let identity: Identity = serde_json::from_value(json!({"name": "Ana"}))
            .unwrap_or_else(|_| Identity::new(Role::Guest, ""));
        assert_eq!(identity.role, Role::Customer);
        assert_eq!(identity.display_name, "Ana");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
        assert_eq!(credential.expose(), "secret-token");
    }

    #[test]
    fn only_lifecycle_edges_are_allowed() {
        use BookingStatus::{Cancelled, Confirmed, Pending};
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn wire_dates_accept_timestamps() {
        assert_eq!(
            wire_date::parse("2025-11-19T00:00:00Z"),
            Ok(NaiveDate::from_ymd_opt(2025, 11, 19).unwrap_or_default())
        );
        assert!(wire_date::parse("19/11/2025").is_err());
    }

    #[test]
    fn ids_parse_from_text() {
        assert_eq!(" 42 ".parse::<BookingId>().map(BookingId::get), Ok(42));
        assert_eq!(HotelId::new(7).to_string(), "7");
    }
}
