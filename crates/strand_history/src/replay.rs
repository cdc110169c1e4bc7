use {
    crate::record::{HistoryEvent, HistoryRecord, ParseRecordError},
    std::{
        collections::HashSet,
        fmt::{self, Debug, Display, Formatter},
        hash::Hash,
        io::BufRead,
        str::FromStr,
    },
    strand::{
        CheckError, InvariantFault, OnlineChecker, ProcessId, ProtocolError, Violation, WriteId,
    },
    tracing::{debug, warn},
};

/// Re-drives a recorded history through a fresh [`OnlineChecker`].
///
/// Replay gives the same verdict as the original run: the checker is
/// deterministic, so an identical history yields an identical final head per
/// key and the same first violation, if any. Protocol errors and invariant
/// faults abort the replay, since they mean the log itself or the checker is
/// broken rather than the store whose history was recorded. The first
/// consistency violation is captured and halts the checker; the remaining
/// records are counted as skipped, mirroring a live harness that stops
/// issuing operations once a violation surfaces.
pub struct Replayer<K, V> {
    checker: OnlineChecker<K, V>,
    open_reads: HashSet<ProcessId>,
    records: usize,
    skipped: usize,
    violation: Option<(usize, Violation<V>)>,
}

impl<K, V> Replayer<K, V>
where
    K: Clone + Debug + Eq + Hash,
    V: Clone + Debug + PartialEq,
{
    /// Applies one parsed record. Violation markers are counted but drive
    /// nothing, and every record after a captured violation is skipped.
    pub fn apply(&mut self, record: HistoryRecord<K, V>) -> Result<(), ReplayError> {
        if self.violation.is_some() {
            self.skipped += 1;
            return Ok(());
        }
        let index = self.records;
        self.records += 1;
        match self.drive(record) {
            Ok(()) => Ok(()),
            Err(CheckError::Fault(source)) => Err(ReplayError::Fault { index, source }),
            Err(CheckError::Protocol(source)) => Err(ReplayError::Protocol { index, source }),
            Err(CheckError::Violation(violation)) => {
                warn!(index, %violation, "Violation found. Halting replay.");
                self.violation = Some((index, violation));
                Ok(())
            }
        }
    }

    fn drive(&mut self, record: HistoryRecord<K, V>) -> Result<(), CheckError<V>> {
        let HistoryRecord {
            at,
            event,
            key,
            process,
        } = record;
        match event {
            HistoryEvent::ReadEnd { value, write } => {
                self.open_reads.remove(&process);
                self.checker.end_read(at, process, write, value)
            }
            HistoryEvent::ReadStart => {
                if !self.open_reads.insert(process) {
                    // No tag records a failed read, so a repeated begin
                    // implies the previous read failed off the record. The
                    // failure consumed a timestamp in the live run, leaving a
                    // gap before this record to settle it in.
                    debug!(?process, at, "Settling an unlogged read failure.");
                    self.checker.fail_read(at.saturating_sub(1), process)?;
                }
                self.checker.begin_read(at, process, key)
            }
            HistoryEvent::ViolationRead { detail } | HistoryEvent::ViolationWrite { detail } => {
                debug!(detail = %detail, "Skipping violation marker.");
                Ok(())
            }
            HistoryEvent::WriteConflict => self.checker.conflict_write(at, process),
            HistoryEvent::WriteEnd => self.checker.end_write(at, process),
            HistoryEvent::WriteFail => self.checker.fail_write(at, process),
            HistoryEvent::WriteStart { next, prev, value } => {
                if self.open_reads.remove(&process) {
                    debug!(?process, at, "Settling an unlogged read failure.");
                    self.checker.fail_read(at.saturating_sub(1), process)?;
                }
                self.checker.begin_write(at, process, key, prev, next, value)
            }
        }
    }

    /// The accepted head replay arrived at for `key`.
    pub fn head_of(&self, key: &K) -> Option<&WriteId> {
        self.checker.head_of(key)
    }

    /// Accepted heads for every key the history touched.
    pub fn heads(&self) -> impl Iterator<Item = (&K, &WriteId)> {
        self.checker.heads()
    }

    /// Records retained by the underlying checker.
    pub fn mem(&self) -> usize {
        self.checker.mem()
    }

    pub fn new(seed_write: WriteId, seed_value: V) -> Self {
        Replayer {
            checker: OnlineChecker::new(seed_write, seed_value),
            open_reads: HashSet::new(),
            records: 0,
            skipped: 0,
            violation: None,
        }
    }

    pub fn report(&self) -> ReplayReport<V> {
        ReplayReport {
            records: self.records,
            skipped: self.skipped,
            violation: self.violation.clone(),
        }
    }

    /// Parses and applies every line of `reader`. Blank lines and violation
    /// markers are skipped without counting.
    pub fn run<R>(&mut self, reader: R) -> Result<ReplayReport<V>, ReplayError>
    where
        R: BufRead,
        K: FromStr,
        V: FromStr,
    {
        let mut line_number = 0;
        for line in reader.lines() {
            let line = line.map_err(|source| ReplayError::Io { source })?;
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record: HistoryRecord<K, V> = line.parse().map_err(|source| {
                ReplayError::Parse {
                    line: line_number,
                    source,
                }
            })?;
            if let HistoryEvent::ViolationRead { .. } | HistoryEvent::ViolationWrite { .. } =
                record.event
            {
                continue;
            }
            self.apply(record)?;
        }
        Ok(self.report())
    }
}

/// What [`Replayer::run`] found.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReplayReport<V> {
    /// Records applied, including the one that raised the violation.
    pub records: usize,
    /// Records ignored after the violation halted the checker.
    pub skipped: usize,
    /// The first violation and the index of the record that raised it.
    pub violation: Option<(usize, Violation<V>)>,
}

/// Raised when a history cannot be replayed at all. A [`Violation`] is not an
/// error here: it is the replay's result, carried in the [`ReplayReport`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ReplayError {
    Fault {
        index: usize,
        source: InvariantFault,
    },
    Io {
        source: std::io::Error,
    },
    Parse {
        line: usize,
        source: ParseRecordError,
    },
    Protocol {
        index: usize,
        source: ProtocolError,
    },
}

impl Display for ReplayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Fault { index, source } => {
                write!(f, "invariant fault at record {}: {}", index, source)
            }
            ReplayError::Io { source } => write!(f, "cannot read history: {}", source),
            ReplayError::Parse { line, source } => {
                write!(f, "unparseable record on line {}: {}", line, source)
            }
            ReplayError::Protocol { index, source } => {
                write!(f, "protocol error at record {}: {}", index, source)
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Fault { source, .. } => Some(source),
            ReplayError::Io { source } => Some(source),
            ReplayError::Parse { source, .. } => Some(source),
            ReplayError::Protocol { source, .. } => Some(source),
        }
    }
}
