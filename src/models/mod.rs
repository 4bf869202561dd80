//! Domain types for the card service.
//!
//! The server sends more fields than the CLI needs; each type keeps the
//! fields it acts on and passes the rest through untyped in `extra` so
//! nothing is lost when a record is re-serialized.

pub mod account;
pub mod card;

pub use account::AccountInfo;
pub use card::{Card, CardDetail};
