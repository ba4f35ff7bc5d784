// invsync-api: Async Rust client for Nautobot-compatible inventory REST APIs

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{Endpoint, InventoryClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
