//! Dependencies injected into the controller reducers.

use crate::gateway::{ApiClient, HttpTransport};
use staybook_core::environment::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;

/// Environment shared by the booking and inventory reducers.
///
/// Reducers only clone what an effect needs out of it; nothing here is
/// mutated during a reduction.
pub struct ClientEnvironment<T> {
    /// Gateway used by request effects
    pub api: ApiClient<T>,
    /// Source of cache timestamps
    pub clock: Arc<dyn Clock>,
}

impl<T: HttpTransport> ClientEnvironment<T> {
    /// Create an environment with the wall clock.
    #[must_use]
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<T> Clone for ClientEnvironment<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T> fmt::Debug for ClientEnvironment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientEnvironment")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
