use std::fmt::{Debug, Display, Formatter};

/// Identifies one of the concurrent processes driving a checker. Processes
/// are "logical threads" from the checker's perspective: each has at most one
/// write and one read in flight at a time.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProcessId(usize);

impl Debug for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<ProcessId> for usize {
    fn from(id: ProcessId) -> Self {
        id.0
    }
}

impl From<usize> for ProcessId {
    fn from(n: usize) -> Self {
        ProcessId(n)
    }
}

/// An opaque token naming a single write. Drivers must mint a globally unique
/// token per write (UUIDs in practice); the checker never inspects the
/// contents, only compares them.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WriteId(String);

impl WriteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for WriteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl Display for WriteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<&str> for WriteId {
    fn from(token: &str) -> Self {
        WriteId(token.to_string())
    }
}

impl From<String> for WriteId {
    fn from(token: String) -> Self {
        WriteId(token)
    }
}

impl From<WriteId> for String {
    fn from(id: WriteId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_display() {
        assert_eq!(format!("{}", ProcessId::from(3)), "3");
        assert_eq!(format!("{:?}", ProcessId::from(3)), "3");
        assert_eq!(format!("{}", WriteId::from("0000")), "0000");
        assert_eq!(format!("{:?}", WriteId::from("0000")), "0000");
    }

    #[test]
    fn can_convert() {
        assert_eq!(usize::from(ProcessId::from(7)), 7);
        assert_eq!(String::from(WriteId::from("w1".to_string())), "w1");
        assert_eq!(WriteId::from("w1").as_str(), "w1");
    }
}
