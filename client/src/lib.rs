//! # Staybook Client
//!
//! Typed client for the Staybook travel-booking platform.
//!
//! ## Components
//!
//! - [`session::SessionStore`]: credential and identity, persisted through
//!   [`storage::DurableStorage`] and restored before the first navigation
//! - [`guard::can_enter`]: pure navigation gate over a session snapshot
//! - [`gateway::ApiClient`]: the single request path (bearer credential,
//!   failure normalization, session invalidation on 401), with typed
//!   endpoints in [`api`]
//! - [`booking::BookingController`]: search, reserve, confirm, cancel and
//!   list, as a reducer running in a [`staybook_runtime::Store`]
//! - [`inventory::InventoryController`]: hotel, room and rate administration
//!
//! [`StayClient`] wires everything together.
//!
//! ## Example
//!
//! ```no_run
//! use staybook_client::{ClientConfig, StayClient, View};
//! use staybook_client::guard::Decision;
//!
//! # async fn example() -> Result<(), staybook_client::ClientError> {
//! let client = StayClient::from_config(ClientConfig::from_env())?;
//! client.login("a@b.com", "x").await?;
//!
//! if client.can_enter(View::MyBookings) == Decision::Allow {
//!     let bookings = client.bookings().list().await?;
//!     println!("{} bookings", bookings.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod inventory;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use auth::{AuthService, Registration};
pub use booking::{BookingController, BookingFlow, CancelOutcome};
pub use config::ClientConfig;
pub use environment::ClientEnvironment;
pub use error::{ClientError, Result};
pub use gateway::{Access, ApiClient, HttpTransport, Method, ReqwestTransport};
pub use guard::{Decision, View, can_enter};
pub use inventory::InventoryController;
pub use session::{Session, SessionStore};
pub use storage::{DurableStorage, FileStorage};
pub use types::{
    Booking, BookingId, BookingStatus, Credential, HotelId, HotelSummary, Identity, Money,
    ReservationDraft, Role, SearchQuery,
};

use staybook_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// The assembled client: one session shared by every controller.
pub struct StayClient<T: HttpTransport> {
    config: Arc<ClientConfig>,
    session: SessionStore,
    api: ApiClient<T>,
    auth: AuthService<T>,
    bookings: BookingController<T>,
    inventory: InventoryController<T>,
}

impl<T: HttpTransport> std::fmt::Debug for StayClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StayClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl StayClient<ReqwestTransport> {
    /// Build the production client: HTTP over `reqwest`, session persisted
    /// under `config.storage_dir`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an invalid configuration,
    /// [`ClientError::Network`] if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(config.storage_dir.clone()));
        Ok(Self::with_parts(config, transport, storage))
    }
}

impl<T: HttpTransport> StayClient<T> {
    /// Assemble a client over any transport and storage.
    ///
    /// The session is restored from `storage` before this returns.
    #[must_use]
    pub fn with_parts(config: ClientConfig, transport: Arc<T>, storage: Arc<dyn DurableStorage>) -> Self {
        Self::with_clock(config, transport, storage, Arc::new(SystemClock))
    }

    /// [`Self::with_parts`] with an explicit clock.
    #[must_use]
    pub fn with_clock(
        config: ClientConfig,
        transport: Arc<T>,
        storage: Arc<dyn DurableStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let session = SessionStore::restore(storage);
        let api = ApiClient::new(transport, session.clone(), Arc::clone(&config));
        let environment = ClientEnvironment::new(api.clone()).with_clock(clock);

        tracing::debug!(api_base_url = %config.api_base_url, "Client assembled");

        Self {
            auth: AuthService::new(api.clone()),
            bookings: BookingController::new(environment.clone()),
            inventory: InventoryController::new(environment),
            config,
            session,
            api,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The process-wide session.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The request gateway.
    #[must_use]
    pub const fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Sign-in and registration.
    #[must_use]
    pub const fn auth(&self) -> &AuthService<T> {
        &self.auth
    }

    /// Booking lifecycle.
    #[must_use]
    pub const fn bookings(&self) -> &BookingController<T> {
        &self.bookings
    }

    /// Inventory administration.
    #[must_use]
    pub const fn inventory(&self) -> &InventoryController<T> {
        &self.inventory
    }

    /// Evaluate the access guard against the live session.
    #[must_use]
    pub fn can_enter(&self, view: View) -> Decision {
        can_enter(view, &self.session.snapshot())
    }

    /// Sign in, dropping anything cached for a previous user first.
    ///
    /// # Errors
    ///
    /// As [`AuthService::login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        self.clear_user_caches().await;
        self.auth.login(email, password).await
    }

    /// Sign out and drop every per-user cache. Idempotent.
    pub async fn logout(&self) {
        self.auth.logout();
        self.clear_user_caches().await;
        tracing::info!("Signed out");
    }

    /// Stop both controllers, waiting for in-flight requests.
    ///
    /// # Errors
    ///
    /// [`ClientError::ShuttingDown`] if requests are still running after
    /// the shutdown timeout.
    pub async fn shutdown(&self) -> Result<()> {
        self.bookings.shutdown().await?;
        self.inventory.shutdown().await
    }

    async fn clear_user_caches(&self) {
        if let Err(error) = self.bookings.end_session().await {
            tracing::warn!(%error, "Could not clear bookings");
        }
        if let Err(error) = self.inventory.reset().await {
            tracing::warn!(%error, "Could not clear inventory");
        }
    }
}
