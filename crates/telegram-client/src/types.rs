//! Bot API wire types.

mod request;
mod update;

pub use request::*;
pub use update::*;
