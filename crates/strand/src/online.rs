use {
    crate::register::RegisterChecker,
    std::{collections::HashMap, fmt::Debug, hash::Hash},
    strand_core::{CheckError, ProcessId, ProtocolError, Timestamp, WriteId},
    tracing::debug,
};

/// Checks a whole key-value store by fanning records out to one
/// [`RegisterChecker`] per key.
///
/// Keys are independent registers, so per-key checkers never interact.
/// Checkers are created on first use, each seeded with the same initial
/// write id and value, matching a store whose keys all start with one known
/// default.
///
/// Begin records carry the key. Terminal records do not: the store client
/// reports only which process finished, so the checker remembers which key
/// each process most recently began an operation against and routes the
/// terminal there. A terminal for a process with no operation in flight has
/// nowhere to go and is a [`ProtocolError`].
pub struct OnlineChecker<K, V> {
    checkers: HashMap<K, RegisterChecker<V>>,
    last_key: HashMap<ProcessId, K>,
    seed_value: V,
    seed_write: WriteId,
}

impl<K, V> OnlineChecker<K, V>
where
    K: Clone + Debug + Eq + Hash,
    V: Clone + Debug + PartialEq,
{
    pub fn begin_read(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        key: K,
    ) -> Result<(), CheckError<V>> {
        self.last_key.insert(process, key.clone());
        self.checker_for(key).begin_read(at, process)
    }

    pub fn begin_write(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        key: K,
        prev: WriteId,
        next: WriteId,
        value: V,
    ) -> Result<(), CheckError<V>> {
        self.last_key.insert(process, key.clone());
        self.checker_for(key)
            .begin_write(at, process, prev, next, value)
    }

    fn checker_for(&mut self, key: K) -> &mut RegisterChecker<V> {
        if !self.checkers.contains_key(&key) {
            debug!(?key, "Seeding checker for new key.");
        }
        let seed_write = &self.seed_write;
        let seed_value = &self.seed_value;
        self.checkers
            .entry(key)
            .or_insert_with(|| RegisterChecker::new(seed_write.clone(), seed_value.clone()))
    }

    pub fn conflict_write(
        &mut self,
        at: Timestamp,
        process: ProcessId,
    ) -> Result<(), CheckError<V>> {
        let key = self.take_route(process)?;
        self.checker_for(key).conflict_write(at, process)
    }

    pub fn end_read(
        &mut self,
        at: Timestamp,
        process: ProcessId,
        write: WriteId,
        value: V,
    ) -> Result<(), CheckError<V>> {
        let key = self.take_route(process)?;
        self.checker_for(key).end_read(at, process, write, value)
    }

    pub fn end_write(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        let key = self.take_route(process)?;
        self.checker_for(key).end_write(at, process)
    }

    pub fn fail_read(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        let key = self.take_route(process)?;
        self.checker_for(key).fail_read(at, process)
    }

    pub fn fail_write(&mut self, at: Timestamp, process: ProcessId) -> Result<(), CheckError<V>> {
        let key = self.take_route(process)?;
        self.checker_for(key).fail_write(at, process)
    }

    /// The accepted head for `key`, or `None` if no operation ever touched
    /// it.
    pub fn head_of(&self, key: &K) -> Option<&WriteId> {
        self.checkers.get(key).map(|checker| checker.head())
    }

    /// Accepted heads for every key seen so far.
    pub fn heads(&self) -> impl Iterator<Item = (&K, &WriteId)> {
        self.checkers
            .iter()
            .map(|(key, checker)| (key, checker.head()))
    }

    /// Number of retained records across every per-key checker, for memory
    /// dashboards.
    pub fn mem(&self) -> usize {
        self.last_key.len()
            + self
                .checkers
                .values()
                .map(|checker| checker.mem())
                .sum::<usize>()
    }

    pub fn new(seed_write: WriteId, seed_value: V) -> Self {
        OnlineChecker {
            checkers: HashMap::new(),
            last_key: HashMap::new(),
            seed_value,
            seed_write,
        }
    }

    fn take_route(&mut self, process: ProcessId) -> Result<K, ProtocolError> {
        match self.last_key.remove(&process) {
            None => Err(ProtocolError::NoRoute { process }),
            Some(key) => Ok(key),
        }
    }
}
