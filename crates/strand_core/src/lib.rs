//! This module specifies the shared vocabulary for the Strand consistency
//! checker: process and write identifiers, the logical timestamp type, and the
//! error taxonomy through which every checker operation reports.
//!
//! # Usage
//!
//! Most users depend on the `strand` crate, which re-exports these types.
//!
//! # Features
//!
//! - `serde`: Implement `Serialize` and `Deserialize` where applicable.

#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

mod error;
mod id;

pub use error::{CheckError, InvariantFault, ProtocolError, Violation};
pub use id::{ProcessId, WriteId};

/// A caller-supplied logical instant. Timestamps only need to be strictly
/// increasing across the calls delivered to one checker, so wall-clock
/// microseconds and plain counters both work.
pub type Timestamp = u64;
