//! Custom Axum extractors.
//!
//! - `CurrentUser`: identity installed by the authentication gate; rejects
//!   anonymous requests with 401.
//! - `OptionalCurrentUser`: same slot, but never rejects.

pub mod current_user;

pub use current_user::{CurrentUser, OptionalCurrentUser};
