//! Strand is a streaming checker for [causal
//! consistency](https://en.wikipedia.org/wiki/Causal_consistency) of a
//! replicated key-value register, designed to run alongside a workload
//! rather than over a recorded history.
//!
//! A harness drives reads and writes against the system under test and
//! reports each operation to the checker as a begin event and a terminal
//! event, stamped with a strictly increasing timestamp. Every write carries
//! a fresh id and the id of the write it causally follows, so the reported
//! operations form chains. The checker folds each event into a per-key
//! state machine ([`RegisterChecker`]) that maintains a single accepted
//! chain per key and flags any observation that contradicts it, such as a
//! read of a value that was already superseded when the read began, or a
//! confirmed write that lost its fork. State that no in-flight operation
//! can still observe is reclaimed immediately, so memory stays bounded by
//! concurrency instead of history length.
//!
//! [`OnlineChecker`] wraps a lazily-populated map of per-key checkers and
//! routes terminal events, which carry no key, to the key their process most
//! recently began an operation against.
//!
//! ```
//! use strand::{OnlineChecker, ProcessId, WriteId};
//!
//! let mut checker = OnlineChecker::new(WriteId::from("0000"), 0);
//! let writer = ProcessId::from(0);
//! let reader = ProcessId::from(1);
//!
//! checker
//!     .begin_write(2, writer, "k", WriteId::from("0000"), WriteId::from("0001"), 7)
//!     .unwrap();
//! checker.begin_read(3, reader, "k").unwrap();
//! checker.end_write(4, writer).unwrap();
//!
//! // The read began while the write was in flight, so either the old or
//! // the new value is a valid observation.
//! checker.end_read(5, reader, WriteId::from("0001"), 7).unwrap();
//! assert_eq!(checker.head_of(&"k"), Some(&WriteId::from("0001")));
//! ```
//!
//! Outcomes are split three ways: a [`Violation`] is a finding about the
//! system under test, a [`ProtocolError`] means the harness itself reported
//! an impossible sequence, and an [`InvariantFault`] means the checker's own
//! bookkeeping broke.

#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

mod online;
mod record;
mod register;

pub use {
    online::OnlineChecker,
    register::RegisterChecker,
    strand_core::{
        CheckError, InvariantFault, ProcessId, ProtocolError, Timestamp, Violation, WriteId,
    },
};
