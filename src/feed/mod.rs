//! Price feed ingestion
//!
//! A TCP client for the length-prefixed upstream channel and the parser
//! that turns its JSON payloads into rate-graph updates.

mod client;
mod message;

pub use client::{FeedClient, LENGTH_PREFIX_BYTES};
pub use message::PriceUpdate;
