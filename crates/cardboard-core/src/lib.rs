//! Core traits for cardboard snapshots and transports
//!
//! This crate provides the capability traits an immutable snapshot is built
//! from, and the seams a synchronization client talks through:
//! - `CardSet`, `CategorySet`, `CommentSet`, `ColorSet`, `ProjectSet`: read
//!   access plus persistent replacement of one collection each
//! - `UpdateSink`: fire-and-forget delivery of mutation envelopes
//! - `QueryTransport`: batched query round trips

pub mod capabilities;
pub mod transport;

pub use capabilities::{CardSet, CategorySet, ColorSet, CommentSet, ProjectSet};
pub use transport::{QueryTransport, UpdateSink};
