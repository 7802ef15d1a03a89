//! Database models for the Popcorn backend.
//!
//! ## Constraints
//! Foreign key and uniqueness constraints live in the store, not in the
//! record types. They are checked when a [`session::Session`] writes its
//! staged records, never when a record is constructed.

pub mod db;
pub mod entity;
pub mod session;
pub mod submission;
pub mod system;
pub mod vendor;
