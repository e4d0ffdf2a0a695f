//! Message classification for the Karakeep Telegram bot.
//!
//! Pure functions only, no I/O:
//!
//! - [`slice_utf16`] - Resolve entity offsets counted in UTF-16 code units
//! - [`extract_urls`] - Collect URLs from link and bare-URL entities
//! - [`classify`] - Decide whether a message is a bookmark, a note or a file
//!
//! # Example
//!
//! ```rust
//! use classifier::{classify, Classification};
//! use keep_core::{Entity, MessageUnit};
//!
//! let unit = MessageUnit::text(1, 1, "https://example.com interesting read", 0)
//!     .with_entities(vec![Entity::url(0, 19)]);
//!
//! match classify(&unit) {
//!     Classification::Bookmark { url, notes, .. } => {
//!         assert_eq!(url, "https://example.com");
//!         assert_eq!(notes, "interesting read");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod classify;
mod urls;
mod utf16;

pub use classify::{classify, Classification, ContentKind};
pub use urls::extract_urls;
pub use utf16::{slice_utf16, utf16_byte_range};
