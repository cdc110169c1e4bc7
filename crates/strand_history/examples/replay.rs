//! Replays a recorded history file and reports whether it is consistent,
//! with a running throughput dashboard.
//!
//! ```sh
//! cargo run --example replay -- history.log
//! RUST_LOG=debug cargo run --example replay -- history.log 0000 0
//! ```

use {
    sliding_counters::SlidingCounters,
    std::{
        env,
        fs::File,
        io::{BufRead, BufReader},
        process::ExitCode,
    },
    strand::WriteId,
    strand_history::{HistoryRecord, Replayer},
    tracing::{error, info},
};

const WINDOW: u64 = 100_000;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        None => {
            eprintln!("usage: replay <history-file> [seed-write] [seed-value]");
            return ExitCode::FAILURE;
        }
        Some(path) => path,
    };
    let seed_write = WriteId::from(args.next().unwrap_or_else(|| "0000".to_string()));
    let seed_value = args.next().unwrap_or_else(|| "0".to_string());

    let file = match File::open(&path) {
        Err(err) => {
            error!(path = %path, err = %err, "Cannot open history file.");
            return ExitCode::FAILURE;
        }
        Ok(file) => file,
    };

    let mut replayer: Replayer<String, String> = Replayer::new(seed_write, seed_value);
    let mut counters = SlidingCounters::new();
    let mut index: u64 = 0;
    let mut line_number: u64 = 0;
    for line in BufReader::new(file).lines() {
        let line = match line {
            Err(err) => {
                error!(err = %err, "Cannot read history file.");
                return ExitCode::FAILURE;
            }
            Ok(line) => line,
        };
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: HistoryRecord<String, String> = match line.parse() {
            Err(err) => {
                error!(line = line_number, err = %err, "Unparseable record.");
                return ExitCode::FAILURE;
            }
            Ok(record) => record,
        };
        counters.inc(index, record.event.tag());
        if let Err(err) = replayer.apply(record) {
            error!(err = %err, "History is not replayable.");
            return ExitCode::FAILURE;
        }
        index += 1;
        if index % WINDOW == 0 {
            counters.forget_before(index - WINDOW);
            info!(
                records = index,
                writes = counters.count(&"write-end"),
                conflicts = counters.count(&"write-conflict"),
                failed_writes = counters.count(&"write-fail"),
                reads = counters.count(&"read-end"),
                mem = replayer.mem(),
                "Replay progress."
            );
        }
    }

    let report = replayer.report();
    for (key, head) in replayer.heads() {
        info!(key = %key, head = %head, "Accepted head.");
    }
    match report.violation {
        None => {
            info!(records = report.records, "History is consistent.");
            ExitCode::SUCCESS
        }
        Some((index, violation)) => {
            error!(
                index,
                violation = %violation,
                skipped = report.skipped,
                "History contains a violation."
            );
            ExitCode::FAILURE
        }
    }
}
