//! Booking lifecycle: search, reserve, confirm and manage.
//!
//! ```text
//! Idle --search--> ResultsShown --select--> HotelDetail --reserve--> ConfirmPending
//! ConfirmPending --confirm ok--> booking added, Idle
//! ConfirmPending --confirm failed--> ConfirmPending (retry)
//! Confirmed --cancel--> Cancelled (optimistic) --ack--> Cancelled
//!                                              --reject--> Confirmed
//! ```

pub mod actions;
pub mod controller;
pub mod reducer;
pub mod state;

pub use actions::BookingAction;
pub use controller::{BookingController, BookingStore};
pub use reducer::BookingReducer;
pub use state::{BookingFlow, BookingState, CancelOutcome, validate_search};
