//! Core types and traits for the keyhole URL-shortening engine.
//!
//! This crate defines the link record shared by every storage backend,
//! the [`Store`] contract those backends implement, and the error
//! taxonomy that crosses the contract boundary.

pub mod error;
pub mod link;
pub mod store;

pub use error::{Result, StoreError};
pub use link::{DeleteRequest, Link, UserId, NO_OWNER};
pub use store::Store;
