use {
    std::{
        fmt::{self, Debug, Display, Formatter},
        str::{FromStr, Split},
    },
    strand_core::{ProcessId, Timestamp, WriteId},
};

/// One line of the activity log.
///
/// Rendering and parsing are inverses, so a log written with [`Display`] can
/// be fed back through [`FromStr`] bit-for-bit. Fields are tab-separated and
/// must not contain tabs themselves, except the free-form detail of a
/// violation marker, which runs to the end of the line.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct HistoryRecord<K, V> {
    pub at: Timestamp,
    pub event: HistoryEvent<V>,
    pub key: K,
    pub process: ProcessId,
}

/// What a [`HistoryRecord`] says happened, with the event-specific fields.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[non_exhaustive]
pub enum HistoryEvent<V> {
    /// A read completed, observing `write` holding `value`.
    ReadEnd { value: V, write: WriteId },
    /// A read was issued. Failed reads have no terminal line.
    ReadStart,
    /// Annotation: the checker flagged the preceding read.
    ViolationRead { detail: String },
    /// Annotation: the checker flagged the preceding write terminal.
    ViolationWrite { detail: String },
    /// A write was rejected by the store's precondition check.
    WriteConflict,
    /// A write was confirmed by the store.
    WriteEnd,
    /// A write finished with an unknown outcome.
    WriteFail,
    /// A write of `value` was issued, proposing `next` on top of `prev`.
    WriteStart { next: WriteId, prev: WriteId, value: V },
}

impl<V> HistoryEvent<V> {
    /// The tag rendered in the line's fourth field.
    pub fn tag(&self) -> &'static str {
        match self {
            HistoryEvent::ReadEnd { .. } => "read-end",
            HistoryEvent::ReadStart => "read-start",
            HistoryEvent::ViolationRead { .. } => "violation-read",
            HistoryEvent::ViolationWrite { .. } => "violation-write",
            HistoryEvent::WriteConflict => "write-conflict",
            HistoryEvent::WriteEnd => "write-end",
            HistoryEvent::WriteFail => "write-fail",
            HistoryEvent::WriteStart { .. } => "write-start",
        }
    }
}

impl<K, V> Display for HistoryRecord<K, V>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.process,
            self.at,
            self.key,
            self.event.tag()
        )?;
        match &self.event {
            HistoryEvent::ReadEnd { value, write } => write!(f, "\t{}\t{}", write, value),
            HistoryEvent::ReadStart => Ok(()),
            HistoryEvent::ViolationRead { detail } => write!(f, "\t{}", detail),
            HistoryEvent::ViolationWrite { detail } => write!(f, "\t{}", detail),
            HistoryEvent::WriteConflict => Ok(()),
            HistoryEvent::WriteEnd => Ok(()),
            HistoryEvent::WriteFail => Ok(()),
            HistoryEvent::WriteStart { next, prev, value } => {
                write!(f, "\t{}\t{}\t{}", prev, next, value)
            }
        }
    }
}

impl<K, V> FromStr for HistoryRecord<K, V>
where
    K: FromStr,
    V: FromStr,
{
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split('\t');
        let process = next_field(&mut fields, "process")?
            .parse::<usize>()
            .map_err(|_| ParseRecordError::MalformedField { field: "process" })?
            .into();
        let at = next_field(&mut fields, "timestamp")?
            .parse()
            .map_err(|_| ParseRecordError::MalformedField { field: "timestamp" })?;
        let key = next_field(&mut fields, "key")?
            .parse()
            .map_err(|_| ParseRecordError::MalformedField { field: "key" })?;
        let tag = next_field(&mut fields, "tag")?;

        if tag == "violation-read" || tag == "violation-write" {
            let detail = fields.collect::<Vec<_>>().join("\t");
            if detail.is_empty() {
                return Err(ParseRecordError::MissingField { field: "detail" });
            }
            let event = if tag == "violation-read" {
                HistoryEvent::ViolationRead { detail }
            } else {
                HistoryEvent::ViolationWrite { detail }
            };
            return Ok(HistoryRecord {
                at,
                event,
                key,
                process,
            });
        }

        let event = match tag {
            "read-end" => {
                let write = WriteId::from(next_field(&mut fields, "write")?);
                let value = parse_value(next_field(&mut fields, "value")?)?;
                HistoryEvent::ReadEnd { value, write }
            }
            "read-start" => HistoryEvent::ReadStart,
            "write-conflict" => HistoryEvent::WriteConflict,
            "write-end" => HistoryEvent::WriteEnd,
            "write-fail" => HistoryEvent::WriteFail,
            "write-start" => {
                let prev = WriteId::from(next_field(&mut fields, "prev")?);
                let next = WriteId::from(next_field(&mut fields, "next")?);
                let value = parse_value(next_field(&mut fields, "value")?)?;
                HistoryEvent::WriteStart { next, prev, value }
            }
            _ => {
                return Err(ParseRecordError::UnknownTag {
                    tag: tag.to_string(),
                })
            }
        };
        if fields.next().is_some() {
            return Err(ParseRecordError::TrailingField);
        }
        Ok(HistoryRecord {
            at,
            event,
            key,
            process,
        })
    }
}

fn next_field<'a>(
    fields: &mut Split<'a, char>,
    field: &'static str,
) -> Result<&'a str, ParseRecordError> {
    match fields.next() {
        None => Err(ParseRecordError::MissingField { field }),
        Some(text) => Ok(text),
    }
}

fn parse_value<V>(text: &str) -> Result<V, ParseRecordError>
where
    V: FromStr,
{
    text.parse()
        .map_err(|_| ParseRecordError::MalformedField { field: "value" })
}

/// Raised when a line does not render a valid [`HistoryRecord`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseRecordError {
    MalformedField { field: &'static str },
    MissingField { field: &'static str },
    TrailingField,
    UnknownTag { tag: String },
}

impl Display for ParseRecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::MalformedField { field } => {
                write!(f, "malformed {} field", field)
            }
            ParseRecordError::MissingField { field } => {
                write!(f, "missing {} field", field)
            }
            ParseRecordError::TrailingField => write!(f, "unexpected trailing field"),
            ParseRecordError::UnknownTag { tag } => write!(f, "unknown tag {}", tag),
        }
    }
}

impl std::error::Error for ParseRecordError {}
