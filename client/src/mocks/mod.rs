//! Mock implementations for testing.
//!
//! In-memory stand-ins for the transport and durable storage so that every
//! controller can run without a server or a filesystem.

pub mod storage;
pub mod transport;

pub use storage::MemoryStorage;
pub use transport::{MockGate, MockTransport};
