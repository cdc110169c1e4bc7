//! Persists and replays the activity history of a checked workload.
//!
//! A harness driving [`strand`] records each operation against the store
//! under test as one tab-separated line: process id, logical timestamp, key,
//! an event tag, then event-specific fields.
//!
//! ```text
//! 0	2	key1	write-start	0000	f3b1	1
//! 1	3	key1	read-start
//! 0	4	key1	write-end
//! 1	5	key1	read-end	f3b1	1
//! ```
//!
//! [`HistoryRecord`] renders and parses those lines, and the two directions
//! are exact inverses, so existing logs keep working bit-for-bit.
//! [`Replayer`] feeds a parsed stream back through a fresh
//! [`strand::OnlineChecker`] for offline re-verification:
//!
//! ```
//! use {strand::WriteId, strand_history::Replayer};
//!
//! let log = "0\t2\tkey1\twrite-start\t0000\t0001\t7\n\
//!            0\t3\tkey1\twrite-end\n";
//! let mut replayer: Replayer<String, u64> = Replayer::new(WriteId::from("0000"), 0);
//! let report = replayer.run(log.as_bytes()).unwrap();
//!
//! assert_eq!(report.records, 2);
//! assert_eq!(report.violation, None);
//! assert_eq!(
//!     replayer.head_of(&"key1".to_string()),
//!     Some(&WriteId::from("0001")),
//! );
//! ```

#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

mod record;
mod replay;

pub use {
    record::{HistoryEvent, HistoryRecord, ParseRecordError},
    replay::{ReplayError, ReplayReport, Replayer},
};
