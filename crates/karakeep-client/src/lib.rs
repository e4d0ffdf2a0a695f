//! Karakeep API client.
//!
//! Talks to a user's self-hosted Karakeep server over HTTPS with a bearer
//! API key. The client tolerates the schema drift seen across Karakeep
//! deployments:
//!
//! - the API may live under `/api/v1` or `/api`; a 404 triggers one retry
//!   with the other prefix, which then sticks
//! - responses may or may not be wrapped in `{"data": ...}`
//!
//! # Example
//!
//! ```no_run
//! use karakeep_client::{KarakeepClient, KarakeepConfig};
//! use keep_core::NewBookmark;
//!
//! # async fn example() -> Result<(), karakeep_client::KarakeepError> {
//! let config = KarakeepConfig::new("https://keep.example.com", "ak_123")?;
//! let client = KarakeepClient::new(config)?;
//!
//! let record = client
//!     .create_bookmark(&NewBookmark::link("https://example.com", "read later"))
//!     .await?;
//! println!("saved {}", record.id);
//! # Ok(())
//! # }
//! ```

mod adapter;
mod client;
mod config;
mod error;

pub use adapter::KarakeepConnector;
pub use client::KarakeepClient;
pub use config::{KarakeepConfig, DEFAULT_API_PREFIX, DEFAULT_TIMEOUT};
pub use error::KarakeepError;
