use {
    crate::record::{
        AcceptedWrite, Baseline, PendingWrite, QueuedAccepted, QueuedBaseline, QueuedPending,
    },
    std::{
        collections::{HashMap, VecDeque},
        fmt::Debug,
    },
    strand_core::{
        CheckError, InvariantFault, ProcessId, ProtocolError, Timestamp, Violation, WriteId,
    },
    tracing::{debug, trace},
};

/// Checks that one key of a replicated register behaves like a causally
/// ordered register, incrementally and in bounded memory.
///
/// # Purpose
///
/// A workload harness drives concurrent writes and reads against a single
/// stored key and reports each operation to the checker as a begin/end event
/// pair. The checker reconstructs the causal order from those markers alone:
/// every write names its predecessor, a read observing a still-pending write
/// promotes that write's whole predecessor chain onto the accepted head, and
/// competing chains forked from a common predecessor are resolved in favor of
/// whichever chain a read observes first. Any observation that cannot be
/// reconciled with the single accepted chain is reported as a
/// [`Violation`].
///
/// The checker never waits for the full history. Records are reclaimed as
/// soon as they are provably unobservable: accepted writes older than every
/// in-flight operation's baseline, and pending writes that lost a fork. Long
/// runs therefore hold a bounded working set, sized by the number of
/// concurrent operations rather than by the length of the history.
///
/// Timestamps are supplied by the caller and must strictly increase across
/// calls. Calls for a single checker must be serialized; checkers for
/// distinct keys are independent.
///
/// # Example
///
/// ```
/// use strand::{ProcessId, RegisterChecker, WriteId};
///
/// let mut checker = RegisterChecker::new(WriteId::from("0000"), 0);
/// let writer = ProcessId::from(0);
/// let reader = ProcessId::from(1);
///
/// checker
///     .begin_write(2, writer, WriteId::from("0000"), WriteId::from("0001"), 7)
///     .unwrap();
/// checker.begin_read(3, reader).unwrap();
/// checker.end_write(4, writer).unwrap();
/// checker.end_read(5, reader, WriteId::from("0001"), 7).unwrap();
///
/// assert_eq!(checker.head(), &WriteId::from("0001"));
/// ```
pub struct RegisterChecker<V> {
    accepted: HashMap<WriteId, AcceptedWrite<V>>,
    accepted_queue: VecDeque<QueuedAccepted>,
    baseline_queue: VecDeque<QueuedBaseline>,
    baselines: HashMap<ProcessId, Baseline>,
    head: WriteId,
    pending: HashMap<WriteId, PendingWrite<V>>,
    pending_queue: VecDeque<QueuedPending>,
    time: Timestamp,
    write_by_process: HashMap<ProcessId, WriteId>,
}

impl<V> RegisterChecker<V>
where
    V: Clone + Debug + PartialEq,
{
    /// Starts tracking a read for `process`, snapshotting the current head as
    /// the read's baseline.
    pub fn begin_read(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        if self.baselines.contains_key(&process) {
            return Err(ProtocolError::ReadPending { process }.into());
        }
        if self.write_by_process.contains_key(&process) {
            return Err(ProtocolError::WritePending { process }.into());
        }
        self.time = at;
        self.push_baseline(at, process)?;
        Ok(())
    }

    /// Records a pending write of `value`, identified by the fresh id `next`
    /// and causally following `prev`. Confirming a write later observes it,
    /// so a baseline is snapshotted here exactly as for a read.
    pub fn begin_write(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        prev: WriteId,
        next: WriteId,
        value: V,
    ) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        if self.write_by_process.contains_key(&process) {
            return Err(ProtocolError::WritePending { process }.into());
        }
        if self.baselines.contains_key(&process) {
            return Err(ProtocolError::ReadPending { process }.into());
        }
        if let Some(dep) = self.pending.get(&prev) {
            if dep.begin >= at {
                return Err(ProtocolError::CausalOrderInverted {
                    prev,
                    prev_begin: dep.begin,
                    next,
                    begin: at,
                }
                .into());
            }
        } else if prev == self.head {
            let dep = match self.accepted.get(&prev) {
                None => {
                    return Err(InvariantFault::HeadMissing {
                        head: self.head.clone(),
                    }
                    .into())
                }
                Some(dep) => dep,
            };
            if dep.begin >= at {
                return Err(ProtocolError::CausalOrderInverted {
                    prev,
                    prev_begin: dep.begin,
                    next,
                    begin: at,
                }
                .into());
            }
        }
        if next == prev || self.pending.contains_key(&next) || self.accepted.contains_key(&next) {
            return Err(ProtocolError::WriteIdReused { write: next }.into());
        }
        self.time = at;
        self.write_by_process.insert(process, next.clone());
        self.pending.insert(
            next.clone(),
            PendingWrite {
                begin: at,
                prev,
                process,
                value,
            },
        );
        self.pending_queue.push_back(QueuedPending {
            begin: at,
            write: next,
        });
        self.push_baseline(at, process)?;
        Ok(())
    }

    fn check_clock(&self, at: Timestamp) -> Result<(), ProtocolError> {
        if self.time >= at {
            return Err(ProtocolError::TimeNotAdvanced {
                last: self.time,
                at,
            });
        }
        Ok(())
    }

    /// Ends `process`'s in-flight write on a storage-level conflict, which
    /// asserts the write was never accepted. Its record is discarded: unlike
    /// [`fail_write`](Self::fail_write), a conflicted write provably did not
    /// land.
    pub fn conflict_write(
        &mut self,
        at: Timestamp,
        process: ProcessId,
    ) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        self.time = at;
        let write = match self.write_by_process.get(&process) {
            None => return Err(ProtocolError::NoWritePending { process }.into()),
            Some(write) => write.clone(),
        };
        if !self.baselines.contains_key(&process) {
            return Err(InvariantFault::BaselineMissing { process }.into());
        }
        if self.accepted.contains_key(&write) {
            return Err(Violation::AcceptedWriteRejected {
                write,
                head: self.head.clone(),
            }
            .into());
        }
        if let Some(pending) = self.pending.remove(&write) {
            trace!(write = %write, process = ?pending.process, "Discarded conflicted write.");
        }
        self.write_by_process.remove(&process);
        self.baselines.remove(&process);
        self.gc()?;
        Ok(())
    }

    /// Ends `process`'s in-flight read, which observed `write` holding
    /// `value`.
    pub fn end_read(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        write: WriteId,
        value: V,
    ) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        self.time = at;
        if self.write_by_process.contains_key(&process) {
            return Err(ProtocolError::WritePending { process }.into());
        }
        if !self.baselines.contains_key(&process) {
            return Err(ProtocolError::NoReadPending { process }.into());
        }
        self.observe(at, process, write, value)?;
        self.baselines.remove(&process);
        self.gc()?;
        Ok(())
    }

    /// Confirms `process`'s in-flight write. Confirmation counts as an
    /// observation of the write's own value, so a confirmed write whose
    /// record was pruned by a competing promotion is a violation.
    pub fn end_write(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        self.time = at;
        let write = match self.write_by_process.get(&process) {
            None => return Err(ProtocolError::NoWritePending { process }.into()),
            Some(write) => write.clone(),
        };
        if !self.baselines.contains_key(&process) {
            return Err(InvariantFault::BaselineMissing { process }.into());
        }
        self.write_by_process.remove(&process);
        let value = if let Some(pending) = self.pending.get(&write) {
            pending.value.clone()
        } else if let Some(accepted) = self.accepted.get(&write) {
            accepted.value.clone()
        } else {
            return Err(Violation::SupersededWrite {
                write,
                head: self.head.clone(),
            }
            .into());
        };
        self.observe(at, process, write, value)?;
        self.baselines.remove(&process);
        self.gc()?;
        Ok(())
    }

    /// Drops `process`'s in-flight read without observing anything.
    pub fn fail_read(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        self.time = at;
        if self.write_by_process.contains_key(&process) {
            return Err(ProtocolError::WritePending { process }.into());
        }
        if self.baselines.remove(&process).is_none() {
            return Err(ProtocolError::NoReadPending { process }.into());
        }
        self.gc()?;
        Ok(())
    }

    /// Ends `process`'s in-flight write with an unknown outcome. The pending
    /// record stays: the write may have landed and can still be observed by a
    /// later read.
    pub fn fail_write(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        self.check_clock(at)?;
        self.time = at;
        if !self.write_by_process.contains_key(&process) {
            return Err(ProtocolError::NoWritePending { process }.into());
        }
        if !self.baselines.contains_key(&process) {
            return Err(InvariantFault::BaselineMissing { process }.into());
        }
        self.write_by_process.remove(&process);
        self.baselines.remove(&process);
        self.gc()?;
        Ok(())
    }

    fn gc(&mut self) -> Result<(), InvariantFault> {
        while self
            .baseline_queue
            .front()
            .map_or(false, |queued| self.queued_baseline_is_dead(queued))
        {
            self.baseline_queue.pop_front();
        }
        // The oldest live baseline bounds what any in-flight operation may
        // still legitimately observe. With no live baselines, only the head
        // must survive.
        let bound = self
            .baseline_queue
            .front()
            .map(|queued| queued.head_accepted_at);
        match bound {
            None => {
                while self
                    .accepted_queue
                    .front()
                    .map_or(false, |queued| queued.write != self.head)
                {
                    if let Some(queued) = self.accepted_queue.pop_front() {
                        self.accepted.remove(&queued.write);
                        trace!(write = %queued.write, "Reclaimed accepted write.");
                    }
                }
            }
            Some(bound) => {
                while self
                    .accepted_queue
                    .front()
                    .map_or(false, |queued| queued.accepted_at < bound)
                {
                    if let Some(queued) = self.accepted_queue.pop_front() {
                        self.accepted.remove(&queued.write);
                        trace!(write = %queued.write, "Reclaimed accepted write.");
                    }
                }
            }
        }
        if self.accepted_queue.is_empty() {
            return Err(InvariantFault::AcceptedQueueEmpty);
        }
        Ok(())
    }

    /// The most recently accepted write id.
    pub fn head(&self) -> &WriteId {
        &self.head
    }

    /// Number of retained records across every internal structure, for
    /// memory dashboards.
    pub fn mem(&self) -> usize {
        self.accepted.len()
            + self.accepted_queue.len()
            + self.baseline_queue.len()
            + self.baselines.len()
            + self.pending.len()
            + self.pending_queue.len()
            + self.write_by_process.len()
    }

    /// Creates a checker whose accepted chain starts at `seed` holding
    /// `value`, accepted at timestamp 0.
    pub fn new(seed: WriteId, value: V) -> Self {
        let mut accepted = HashMap::new();
        accepted.insert(seed.clone(), AcceptedWrite::seed(value));
        let mut accepted_queue = VecDeque::new();
        accepted_queue.push_back(QueuedAccepted {
            accepted_at: 0,
            write: seed.clone(),
        });
        RegisterChecker {
            accepted,
            accepted_queue,
            baseline_queue: VecDeque::new(),
            baselines: HashMap::new(),
            head: seed,
            pending: HashMap::new(),
            pending_queue: VecDeque::new(),
            time: 0,
            write_by_process: HashMap::new(),
        }
    }

    fn observe(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        write: WriteId,
        value: V,
    ) -> Result<(), CheckError<V>> {
        let baseline = match self.baselines.get(&process) {
            None => return Err(InvariantFault::BaselineMissing { process }.into()),
            Some(baseline) => baseline.clone(),
        };
        if !self.accepted.contains_key(&baseline.head) {
            return Err(InvariantFault::BaselineHeadMissing {
                head: baseline.head,
            }
            .into());
        }
        if let Some(accepted) = self.accepted.get(&write) {
            if accepted.accepted_at < baseline.head_accepted_at {
                return Err(Violation::StaleRead {
                    observed: write,
                    accepted_at: accepted.accepted_at,
                    baseline: baseline.head,
                    baseline_accepted_at: baseline.head_accepted_at,
                    read_begin: baseline.begin,
                }
                .into());
            }
            if accepted.value != value {
                return Err(Violation::ValueMismatch {
                    observed: write,
                    got: value,
                    accepted: accepted.value.clone(),
                }
                .into());
            }
            return Ok(());
        }
        if let Some(pending) = self.pending.get(&write) {
            let observed = pending.clone();
            return self.promote(at, write, observed);
        }
        Err(Violation::UnknownWrite {
            observed: write,
            value,
            baseline: baseline.head,
            read_begin: baseline.begin,
        }
        .into())
    }

    /// Walks the observed write's predecessor links back through the pending
    /// set. Reaching the head accepts the whole chain at once; ending
    /// anywhere else means a competing fork was accepted instead.
    fn promote(
        &mut self,
        at: Timestamp,
        write: WriteId,
        observed: PendingWrite<V>,
    ) -> Result<(), CheckError<V>> {
        let new_head = write.clone();
        let new_head_begin = observed.begin;
        let mut cursor = observed.prev.clone();
        let mut cursor_successor = write.clone();
        let mut cursor_successor_begin = observed.begin;
        let mut chain = vec![(write, observed)];
        let reached_head = loop {
            if cursor == self.head {
                break true;
            }
            let pending = match self.pending.get(&cursor) {
                None => break false,
                Some(pending) => pending.clone(),
            };
            // Each hop must go strictly backward in begin time. Honest
            // histories always do; rejecting the rest keeps the walk free of
            // cycles, which forward-referencing predecessors could otherwise
            // smuggle past the begin-time checks.
            if pending.begin >= cursor_successor_begin {
                return Err(ProtocolError::CausalOrderInverted {
                    prev: cursor,
                    prev_begin: pending.begin,
                    next: cursor_successor,
                    begin: cursor_successor_begin,
                }
                .into());
            }
            let prev = pending.prev.clone();
            cursor_successor = cursor.clone();
            cursor_successor_begin = pending.begin;
            chain.push((cursor, pending));
            cursor = prev;
        };
        if !reached_head {
            let mut chain: Vec<WriteId> = chain.into_iter().map(|(id, _)| id).collect();
            chain.push(cursor);
            return Err(Violation::ForkLost {
                chain,
                head: self.head.clone(),
            }
            .into());
        }

        debug!(head = %new_head, depth = chain.len(), at, "Promoting chain.");
        for (id, pending) in chain.into_iter().rev() {
            self.pending.remove(&id);
            self.accepted_queue.push_back(QueuedAccepted {
                accepted_at: at,
                write: id.clone(),
            });
            self.accepted.insert(id, pending.into_accepted(at));
        }
        self.head = new_head;

        // Pending writes begun before the new head can no longer reach it
        // and will never be promoted. Stale queue entries for just-promoted
        // ids fall out in the same sweep.
        while self
            .pending_queue
            .front()
            .map_or(false, |queued| queued.begin < new_head_begin)
        {
            if let Some(queued) = self.pending_queue.pop_front() {
                if let Some(pending) = self.pending.remove(&queued.write) {
                    trace!(
                        write = %queued.write,
                        process = ?pending.process,
                        "Reclaimed write that lost the fork."
                    );
                }
            }
        }
        Ok(())
    }

    fn push_baseline(&mut self, at: Timestamp, process: ProcessId) -> Result<(), InvariantFault> {
        let head_accepted_at = match self.accepted.get(&self.head) {
            None => {
                return Err(InvariantFault::HeadMissing {
                    head: self.head.clone(),
                })
            }
            Some(accepted) => accepted.accepted_at,
        };
        self.baselines.insert(
            process,
            Baseline {
                begin: at,
                head: self.head.clone(),
                head_accepted_at,
            },
        );
        self.baseline_queue.push_back(QueuedBaseline {
            begin: at,
            head_accepted_at,
            process,
        });
        Ok(())
    }

    fn queued_baseline_is_dead(&self, queued: &QueuedBaseline) -> bool {
        self.baselines
            .get(&queued.process)
            .map_or(true, |live| live.begin != queued.begin)
    }

    /// The timestamp of the most recent accepted call.
    pub fn time(&self) -> Timestamp {
        self.time
    }
}
