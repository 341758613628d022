//! Access guard: decides whether navigation to a view is allowed.
//!
//! [`can_enter`] is a pure function of the view and a session snapshot. It
//! keeps no state, so a logout between two navigations is always observed.

use crate::session::Session;
use crate::types::{BookingId, HotelId, Role};
use std::fmt;

/// Capability a view demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone may enter.
    None,
    /// A credential must be held.
    Authenticated,
    /// A credential must be held and the identity must have `role`.
    Role(Role),
}

/// Navigable screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Sign-in form
    Login,
    /// Account creation form
    Register,
    /// Search form
    Home,
    /// Search results
    Results,
    /// One hotel from the results
    HotelDetail(HotelId),
    /// Confirmation of a pending reservation
    ReserveConfirm(HotelId),
    /// The user's bookings
    MyBookings,
    /// One booking
    BookingDetail(BookingId),
    /// Admin landing page
    AdminDashboard,
    /// Hotel, room and rate management
    InventoryManagement,
}

impl View {
    /// Capability needed to enter this view.
    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::Login | Self::Register => Requirement::None,
            Self::Home
            | Self::Results
            | Self::HotelDetail(_)
            | Self::ReserveConfirm(_)
            | Self::MyBookings
            | Self::BookingDetail(_) => Requirement::Authenticated,
            Self::AdminDashboard | Self::InventoryManagement => Requirement::Role(Role::Admin),
        }
    }

    /// Route path of this view.
    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Home => "/".to_string(),
            Self::Results => "/results".to_string(),
            Self::HotelDetail(id) => format!("/hotel/{id}"),
            Self::ReserveConfirm(id) => format!("/reserve/{id}"),
            Self::MyBookings => "/bookings".to_string(),
            Self::BookingDetail(id) => format!("/bookings/{id}"),
            Self::AdminDashboard => "/admin".to_string(),
            Self::InventoryManagement => "/admin/inventory".to_string(),
        }
    }

    /// Resolve a route path. Unknown paths yield `None`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["home"] => Some(Self::Home),
            ["login"] => Some(Self::Login),
            ["register"] => Some(Self::Register),
            ["results"] => Some(Self::Results),
            ["hotel", id] => id.parse().ok().map(Self::HotelDetail),
            ["reserve", id] => id.parse().ok().map(Self::ReserveConfirm),
            ["bookings"] => Some(Self::MyBookings),
            ["bookings", id] => id.parse().ok().map(Self::BookingDetail),
            ["admin"] => Some(Self::AdminDashboard),
            ["admin", "inventory"] => Some(Self::InventoryManagement),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Navigation may proceed.
    Allow,
    /// Navigate to this view instead.
    Redirect(View),
}

/// Gate navigation to `view` for `session`.
///
/// | requirement | on failure |
/// |---|---|
/// | authenticated | redirect to login |
/// | admin role | redirect to home, or to login when signed out |
#[must_use]
pub fn can_enter(view: View, session: &Session) -> Decision {
    match view.requirement() {
        Requirement::None => Decision::Allow,
        Requirement::Authenticated if session.is_authenticated() => Decision::Allow,
        Requirement::Authenticated => Decision::Redirect(View::Login),
        Requirement::Role(_) if !session.is_authenticated() => Decision::Redirect(View::Login),
        Requirement::Role(role) if session.has_role(role) => Decision::Allow,
        Requirement::Role(_) => Decision::Redirect(View::Home),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Credential, Identity};

    fn signed_in(role: Role) -> Session {
        Session::authenticated(Credential::new("T"), Identity::new(role, "user"))
    }

    #[test]
    fn anonymous_users_are_sent_to_login() {
        let session = Session::anonymous();
        assert_eq!(can_enter(View::Home, &session), Decision::Redirect(View::Login));
        assert_eq!(can_enter(View::MyBookings, &session), Decision::Redirect(View::Login));
        assert_eq!(can_enter(View::AdminDashboard, &session), Decision::Redirect(View::Login));
        assert_eq!(can_enter(View::Login, &session), Decision::Allow);
        assert_eq!(can_enter(View::Register, &session), Decision::Allow);
    }

    #[test]
    fn customers_cannot_enter_admin_views() {
        let session = signed_in(Role::Customer);
        assert_eq!(can_enter(View::MyBookings, &session), Decision::Allow);
        assert_eq!(can_enter(View::InventoryManagement, &session), Decision::Redirect(View::Home));
    }

    #[test]
    fn admins_enter_everything() {
        let session = signed_in(Role::Admin);
        assert_eq!(can_enter(View::InventoryManagement, &session), Decision::Allow);
        assert_eq!(can_enter(View::BookingDetail(BookingId::new(1)), &session), Decision::Allow);
    }

    #[test]
    fn paths_round_trip() {
        for view in [
            View::Login,
            View::Register,
            View::Home,
            View::Results,
            View::HotelDetail(HotelId::new(4)),
            View::ReserveConfirm(HotelId::new(4)),
            View::MyBookings,
            View::BookingDetail(BookingId::new(9)),
            View::AdminDashboard,
            View::InventoryManagement,
        ] {
            assert_eq!(View::from_path(&view.path()), Some(view));
        }
    }

    #[test]
    fn unknown_or_malformed_paths_are_rejected() {
        assert_eq!(View::from_path("/hotel/abc"), None);
        assert_eq!(View::from_path("/nowhere"), None);
        assert_eq!(View::from_path("/bookings/3?tab=info"), Some(View::BookingDetail(BookingId::new(3))));
    }
}
