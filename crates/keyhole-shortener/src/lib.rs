//! Service layer of the keyhole URL-shortening engine.
//!
//! Sits on top of the [`Store`](keyhole_core::Store) contract: validates
//! URLs, generates short codes, folds the duplicate-URL signal into an
//! explicit outcome, and runs the asynchronous deletion pipeline.

pub mod deleter;
pub mod generator;
pub mod service;

pub use deleter::Deleter;
pub use service::{AddOutcome, ShortenError, ShortenerService};
