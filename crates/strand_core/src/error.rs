use {
    crate::{ProcessId, Timestamp, WriteId},
    std::fmt::{Debug, Display, Formatter},
};

/// The caller broke the calling contract. Not a finding about the system
/// under test: the driving harness has a bug and should stop immediately,
/// using the carried context to locate it.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[non_exhaustive]
pub enum ProtocolError {
    CausalOrderInverted {
        prev: WriteId,
        prev_begin: Timestamp,
        next: WriteId,
        begin: Timestamp,
    },
    NoReadPending {
        process: ProcessId,
    },
    NoRoute {
        process: ProcessId,
    },
    NoWritePending {
        process: ProcessId,
    },
    ReadPending {
        process: ProcessId,
    },
    TimeNotAdvanced {
        last: Timestamp,
        at: Timestamp,
    },
    WriteIdReused {
        write: WriteId,
    },
    WritePending {
        process: ProcessId,
    },
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::CausalOrderInverted {
                prev,
                prev_begin,
                next,
                begin,
            } => write!(
                f,
                "write {} begun at {} does not follow its predecessor {} begun at {}",
                next, begin, prev, prev_begin
            ),
            ProtocolError::NoReadPending { process } => {
                write!(f, "process {} has no read in flight", process)
            }
            ProtocolError::NoRoute { process } => {
                write!(f, "process {} has no routed operation in flight", process)
            }
            ProtocolError::NoWritePending { process } => {
                write!(f, "process {} has no write in flight", process)
            }
            ProtocolError::ReadPending { process } => {
                write!(f, "process {} must finish its read first", process)
            }
            ProtocolError::TimeNotAdvanced { last, at } => {
                write!(f, "time {} does not advance past {}", at, last)
            }
            ProtocolError::WriteIdReused { write } => {
                write!(f, "write id {} is already in use", write)
            }
            ProtocolError::WritePending { process } => {
                write!(f, "process {} must finish its write first", process)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// The system under test returned something inconsistent with a causally
/// ordered register. This is the checker's target finding, and each variant
/// carries enough context to reconstruct the offending chain from the
/// activity log.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[non_exhaustive]
pub enum Violation<V> {
    /// A write reported as conflicted was already promoted into the accepted
    /// chain, so some earlier read observed it.
    AcceptedWriteRejected { write: WriteId, head: WriteId },
    /// A pending chain ended somewhere other than the accepted head, meaning
    /// a concurrent fork won and this branch can never be accepted. The chain
    /// is ordered from the observed write back to the deepest predecessor
    /// reached.
    ForkLost { chain: Vec<WriteId>, head: WriteId },
    /// The observed write was accepted before the baseline head that the
    /// reading process already (transitively) knew about.
    StaleRead {
        observed: WriteId,
        accepted_at: Timestamp,
        baseline: WriteId,
        baseline_accepted_at: Timestamp,
        read_begin: Timestamp,
    },
    /// A write finished successfully, yet its record is gone from both the
    /// pending and the accepted side. A non-descendant write was promoted
    /// over it while it was in flight.
    SupersededWrite { write: WriteId, head: WriteId },
    /// A read observed a write the checker has no record of. Either the value
    /// was fabricated or it predates everything the reader causally knew.
    UnknownWrite {
        observed: WriteId,
        value: V,
        baseline: WriteId,
        read_begin: Timestamp,
    },
    /// The observed write exists but its recorded value differs from the one
    /// returned by the system under test.
    ValueMismatch {
        observed: WriteId,
        got: V,
        accepted: V,
    },
}

impl<V> Display for Violation<V>
where
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::AcceptedWriteRejected { write, head } => write!(
                f,
                "write {} was reported as conflicted after acceptance (head {})",
                write, head
            ),
            Violation::ForkLost { chain, head } => {
                write!(f, "chain [")?;
                let mut iter = chain.iter();
                if let Some(mut next) = iter.next() {
                    loop {
                        write!(f, "{}", next)?;
                        next = match iter.next() {
                            None => break,
                            Some(next) => {
                                write!(f, " <- ")?;
                                next
                            }
                        }
                    }
                }
                write!(f, "] does not reach the accepted head {}", head)
            }
            Violation::StaleRead {
                observed,
                accepted_at,
                baseline,
                baseline_accepted_at,
                read_begin,
            } => write!(
                f,
                "read begun at {} observed {} (accepted at {}) although {} (accepted at {}) was already known",
                read_begin, observed, accepted_at, baseline, baseline_accepted_at
            ),
            Violation::SupersededWrite { write, head } => write!(
                f,
                "write {} finished but was superseded (head {})",
                write, head
            ),
            Violation::UnknownWrite {
                observed,
                value,
                baseline,
                read_begin,
            } => write!(
                f,
                "read begun at {} with baseline {} observed unknown write {} holding {:?}",
                read_begin, baseline, observed, value
            ),
            Violation::ValueMismatch {
                observed,
                got,
                accepted,
            } => write!(
                f,
                "write {} holds {:?} but the read observed {:?}",
                observed, accepted, got
            ),
        }
    }
}

impl<V> std::error::Error for Violation<V> where V: Debug {}

/// The checker's own bookkeeping failed a self-check. Unlike the other two
/// kinds this can only arise from a bug in the checker, so it is fatal and
/// the checker must not be fed further events.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[non_exhaustive]
pub enum InvariantFault {
    AcceptedQueueEmpty,
    BaselineHeadMissing { head: WriteId },
    BaselineMissing { process: ProcessId },
    HeadMissing { head: WriteId },
}

impl Display for InvariantFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantFault::AcceptedQueueEmpty => {
                write!(f, "accepted queue drained below the head")
            }
            InvariantFault::BaselineHeadMissing { head } => {
                write!(f, "baseline head {} is not in the accepted map", head)
            }
            InvariantFault::BaselineMissing { process } => {
                write!(f, "baseline for process {} is missing", process)
            }
            InvariantFault::HeadMissing { head } => {
                write!(f, "head {} is not in the accepted map", head)
            }
        }
    }
}

impl std::error::Error for InvariantFault {}

/// The union of the three report kinds, so checker operations have a single
/// error type and `?` composes them.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CheckError<V> {
    Fault(InvariantFault),
    Protocol(ProtocolError),
    Violation(Violation<V>),
}

impl<V> Display for CheckError<V>
where
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::Fault(fault) => write!(f, "invariant fault: {}", fault),
            CheckError::Protocol(protocol) => write!(f, "protocol error: {}", protocol),
            CheckError::Violation(violation) => {
                write!(f, "consistency violation: {}", violation)
            }
        }
    }
}

impl<V> std::error::Error for CheckError<V>
where
    V: Debug + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Fault(fault) => Some(fault),
            CheckError::Protocol(protocol) => Some(protocol),
            CheckError::Violation(violation) => Some(violation),
        }
    }
}

impl<V> From<InvariantFault> for CheckError<V> {
    fn from(fault: InvariantFault) -> Self {
        CheckError::Fault(fault)
    }
}

impl<V> From<ProtocolError> for CheckError<V> {
    fn from(protocol: ProtocolError) -> Self {
        CheckError::Protocol(protocol)
    }
}

impl<V> From<Violation<V>> for CheckError<V> {
    fn from(violation: Violation<V>) -> Self {
        CheckError::Violation(violation)
    }
}
