//! Client-side synchronization library for stash editing surfaces.

pub mod client;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{DEFAULT_DEBOUNCE_WINDOW, LocalResource, SyncClient};
pub use error::{Result, SyncError};
pub use http::HttpTransport;
pub use transport::SyncTransport;
