//! # Staybook Testing
//!
//! Testing utilities for Staybook reducers and controllers.
//!
//! This crate provides:
//! - `FixedClock` for deterministic timestamps
//! - `ReducerTest`, a Given/When/Then harness for reducers
//! - Effect assertions and a helper that drives effect futures to completion
//!
//! ## Example
//!
//! ```ignore
//! use staybook_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(test_environment())
//!     .given_state(BookingState::default())
//!     .when_action(BookingAction::CancelBooking { booking_id })
//!     .then_state(move |s| assert!(s.pending_cancellations.contains_key(&booking_id)))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use staybook_core::environment::Clock;

/// Ergonomic Given/When/Then testing for reducers
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::TimeZone;

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use staybook_testing::mocks::FixedClock;
    /// use staybook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

/// Helpers for running effects outside a Store
pub mod helpers {
    use staybook_core::effect::Effect;

    /// Execute effects in order and collect every action they feed back
    ///
    /// Parallel effects are awaited one after the other, so the collected order
    /// is deterministic.
    pub async fn drive_effects<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut produced = Vec::new();
        let mut queue: Vec<Effect<A>> = effects.into_iter().collect();
        queue.reverse();

        while let Some(effect) = queue.pop() {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        produced.push(action);
                    }
                },
                Effect::Parallel(nested) | Effect::Sequential(nested) => {
                    queue.extend(nested.into_iter().rev());
                },
            }
        }

        produced
    }
}

pub use helpers::drive_effects;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::effect::Effect;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn drive_effects_flattens_in_order() {
        let effects = vec![
            Effect::Future(Box::pin(async { Some(1) })),
            Effect::Parallel(vec![
                Effect::Future(Box::pin(async { Some(2) })),
                Effect::None,
                Effect::Sequential(vec![Effect::Future(Box::pin(async { Some(3) }))]),
            ]),
            Effect::Future(Box::pin(async { None })),
        ];
        assert_eq!(drive_effects(effects).await, vec![1, 2, 3]);
    }
}
