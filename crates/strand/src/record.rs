use strand_core::{ProcessId, Timestamp, WriteId};

/// A write that has begun but has not yet been observed by any read. Its
/// place in the causal order is still undecided.
#[derive(Clone, Debug)]
pub(crate) struct PendingWrite<V> {
    pub(crate) begin: Timestamp,
    pub(crate) prev: WriteId,
    pub(crate) process: ProcessId,
    pub(crate) value: V,
}

impl<V> PendingWrite<V> {
    pub(crate) fn into_accepted(self, accepted_at: Timestamp) -> AcceptedWrite<V> {
        AcceptedWrite {
            accepted_at,
            begin: self.begin,
            value: self.value,
        }
    }
}

/// A write some read has observed, fixing its place in the accepted chain.
#[derive(Clone, Debug)]
pub(crate) struct AcceptedWrite<V> {
    pub(crate) accepted_at: Timestamp,
    pub(crate) begin: Timestamp,
    pub(crate) value: V,
}

impl<V> AcceptedWrite<V> {
    pub(crate) fn seed(value: V) -> Self {
        AcceptedWrite {
            accepted_at: 0,
            begin: 0,
            value,
        }
    }
}

/// Snapshot of the head at the instant a process began an operation. Every
/// write accepted no earlier than `head` must stay resolvable until the
/// operation ends.
#[derive(Clone, Debug)]
pub(crate) struct Baseline {
    pub(crate) begin: Timestamp,
    pub(crate) head: WriteId,
    pub(crate) head_accepted_at: Timestamp,
}

/// Begin-ordered queue entry mirroring one [`Baseline`]. The entry is dead
/// once the process's live baseline no longer carries the same `begin`, which
/// is unambiguous since the clock strictly increases.
#[derive(Clone, Debug)]
pub(crate) struct QueuedBaseline {
    pub(crate) begin: Timestamp,
    pub(crate) head_accepted_at: Timestamp,
    pub(crate) process: ProcessId,
}

/// Begin-ordered queue entry mirroring one pending write.
#[derive(Clone, Debug)]
pub(crate) struct QueuedPending {
    pub(crate) begin: Timestamp,
    pub(crate) write: WriteId,
}

/// Acceptance-ordered queue entry mirroring one accepted write.
#[derive(Clone, Debug)]
pub(crate) struct QueuedAccepted {
    pub(crate) accepted_at: Timestamp,
    pub(crate) write: WriteId,
}
