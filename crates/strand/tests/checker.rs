use strand::{CheckError, OnlineChecker, ProcessId, Timestamp, Violation, WriteId};

const KEY: &str = "key1";

struct Clock(Timestamp);

impl Clock {
    fn new() -> Self {
        Clock(1)
    }

    fn tick(&mut self) -> Timestamp {
        self.0 += 1;
        self.0
    }
}

fn seeded() -> OnlineChecker<&'static str, u64> {
    OnlineChecker::new(WriteId::from("0000"), 0)
}

#[test]
fn accepts_a_sequential_write_then_read() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));
}

#[test]
fn read_overlapping_a_write_may_observe_the_old_value() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0000"), 0)
        .unwrap();
}

#[test]
fn read_overlapping_a_write_may_observe_the_new_value() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();
}

#[test]
fn write_overlapping_a_read_may_go_unobserved() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(1);
    let reader = ProcessId::from(0);

    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0000"), 0)
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));
}

#[test]
fn read_may_observe_a_write_before_it_is_confirmed() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(1);
    let reader = ProcessId::from(0);

    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));
}

#[test]
fn flags_a_read_of_reclaimed_history() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();

    // The seed was reclaimed the moment the confirmed write superseded it
    // with no reader in flight, so the observation no longer matches any
    // retained record.
    assert_eq!(
        checker.end_read(clock.tick(), reader, WriteId::from("0000"), 0),
        Err(CheckError::Violation(Violation::UnknownWrite {
            observed: WriteId::from("0000"),
            value: 0,
            baseline: WriteId::from("0001"),
            read_begin: 4,
        })),
    );
}

#[test]
fn flags_a_read_of_the_wrong_value() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    assert_eq!(
        checker.end_read(clock.tick(), reader, WriteId::from("0001"), 0),
        Err(CheckError::Violation(Violation::ValueMismatch {
            observed: WriteId::from("0001"),
            got: 0,
            accepted: 1,
        })),
    );
}

#[test]
fn flags_a_read_of_an_unknown_write_id() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.end_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    assert_eq!(
        checker.end_read(clock.tick(), reader, WriteId::from("0002"), 0),
        Err(CheckError::Violation(Violation::UnknownWrite {
            observed: WriteId::from("0002"),
            value: 0,
            baseline: WriteId::from("0001"),
            read_begin: 4,
        })),
    );
}

#[test]
fn failed_write_may_be_observed_and_promoted() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.fail_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));
}

#[test]
fn failed_write_may_go_unobserved() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.fail_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0000"), 0)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0000")));
}

#[test]
fn readers_may_settle_a_failed_write_late() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.fail_write(clock.tick(), writer).unwrap();

    // First reader misses the unconfirmed write, second one observes it.
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0000"), 0)
        .unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));
}

#[test]
fn flags_a_read_that_steps_back_behind_a_settled_write() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let writer = ProcessId::from(0);
    let reader = ProcessId::from(1);

    checker
        .begin_write(
            clock.tick(),
            writer,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker.fail_write(clock.tick(), writer).unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0000"), 0)
        .unwrap();
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    checker
        .end_read(clock.tick(), reader, WriteId::from("0001"), 1)
        .unwrap();

    // Once some read observed the write, every later read must stay at or
    // past it. The superseded seed has also been reclaimed by now.
    checker.begin_read(clock.tick(), reader, KEY).unwrap();
    assert_eq!(
        checker.end_read(clock.tick(), reader, WriteId::from("0000"), 0),
        Err(CheckError::Violation(Violation::UnknownWrite {
            observed: WriteId::from("0000"),
            value: 0,
            baseline: WriteId::from("0001"),
            read_begin: 8,
        })),
    );
}

#[test]
fn flags_the_losing_branch_of_a_fork() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let (p0, p1, p2) = (ProcessId::from(0), ProcessId::from(1), ProcessId::from(2));

    // Two writers race from the seed. A read observes 0001, promoting it, so
    // 0003 can never reach the head again.
    checker
        .begin_write(
            clock.tick(),
            p0,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            1,
        )
        .unwrap();
    checker
        .begin_write(
            clock.tick(),
            p1,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0003"),
            3,
        )
        .unwrap();
    checker.begin_read(clock.tick(), p2, KEY).unwrap();
    checker
        .end_read(clock.tick(), p2, WriteId::from("0001"), 1)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0001")));

    checker.end_write(clock.tick(), p0).unwrap();
    assert_eq!(
        checker.end_write(clock.tick(), p1),
        Err(CheckError::Violation(Violation::ForkLost {
            chain: vec![WriteId::from("0003"), WriteId::from("0000")],
            head: WriteId::from("0001"),
        })),
    );
}

#[test]
fn settles_forks_in_favor_of_the_observed_chain() {
    let mut checker = seeded();
    let mut clock = Clock::new();
    let (p0, p1, p2, p3, p4) = (
        ProcessId::from(0),
        ProcessId::from(1),
        ProcessId::from(2),
        ProcessId::from(3),
        ProcessId::from(4),
    );

    // Two chains race from the seed: 0000 <- 0001 <- 0002 against
    // 0000 <- 0003 <- 0004.
    checker
        .begin_write(
            clock.tick(),
            p0,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0001"),
            11,
        )
        .unwrap();
    checker
        .begin_write(
            clock.tick(),
            p1,
            KEY,
            WriteId::from("0001"),
            WriteId::from("0002"),
            12,
        )
        .unwrap();
    checker
        .begin_write(
            clock.tick(),
            p2,
            KEY,
            WriteId::from("0000"),
            WriteId::from("0003"),
            21,
        )
        .unwrap();
    checker
        .begin_write(
            clock.tick(),
            p3,
            KEY,
            WriteId::from("0003"),
            WriteId::from("0004"),
            22,
        )
        .unwrap();

    // A read observing the second chain's tip promotes that whole chain and
    // prunes the first.
    checker.begin_read(clock.tick(), p4, KEY).unwrap();
    checker
        .end_read(clock.tick(), p4, WriteId::from("0004"), 22)
        .unwrap();
    assert_eq!(checker.head_of(&KEY), Some(&WriteId::from("0004")));

    assert_eq!(
        checker.end_write(clock.tick(), p0),
        Err(CheckError::Violation(Violation::SupersededWrite {
            write: WriteId::from("0001"),
            head: WriteId::from("0004"),
        })),
    );
    assert_eq!(
        checker.end_write(clock.tick(), p1),
        Err(CheckError::Violation(Violation::SupersededWrite {
            write: WriteId::from("0002"),
            head: WriteId::from("0004"),
        })),
    );
    checker.end_write(clock.tick(), p3).unwrap();
    checker.end_write(clock.tick(), p2).unwrap();
}
