//! Interactive check of the key queue in a terminal.
//!
//! Type to fill the queue; the poll loop drains it every few milliseconds.
//! Use a small `--capacity` with a slow `--poll-ms` to watch overflow and
//! recovery. Ctrl+D or Esc exits.
//!
//! Run with: cargo run --bin getchar -- --capacity 4 --poll-ms 2000

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use clap::Parser;

use keyqueue::{KeyEventQueue, QueueConfig, RawModeGuard, TerminalSource, init_logging};

#[derive(Parser, Debug)]
#[command(name = "getchar", version, about = "Poll typed characters from the terminal")]
struct Args {
    /// Queue slots (usable capacity is one less). Defaults to KEYQUEUE_CAPACITY or 100.
    #[arg(long)]
    capacity: Option<usize>,

    /// Milliseconds between polls.
    #[arg(long, default_value_t = 20)]
    poll_ms: u64,

    /// Log a line per key event (debug level).
    #[arg(long)]
    log_keys: bool,
}

const CTRL_D: char = '\u{4}';
const ESC: char = '\u{1b}';

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(if args.log_keys { "debug" } else { "warn" });

    let mut config = QueueConfig::from_env()?;
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    config.log_keys |= args.log_keys;
    config.validate()?;

    let (producer, consumer) = KeyEventQueue::with_config(&config)?.split();

    let _raw = RawModeGuard::enable()?;
    let mut source = TerminalSource::spawn(producer, config.log_keys)?;

    let mut out = io::stdout();
    write!(
        out,
        "queue holds {} chars; Ctrl+D or Esc to quit\r\n",
        consumer.capacity_hint()
    )?;
    out.flush()?;

    let mut was_focused = true;
    'poll: while source.is_running() {
        let focused = source.is_focused();
        if focused != was_focused {
            write!(out, "[focus {}]\r\n", if focused { "gained" } else { "lost" })?;
            was_focused = focused;
        }

        match consumer.count() {
            Ok(0) => {}
            Ok(n) => {
                for _ in 0..n {
                    let ch = match consumer.pop() {
                        Ok(ch) => ch,
                        Err(_) => break,
                    };
                    if ch == CTRL_D || ch == ESC {
                        break 'poll;
                    }
                    write!(out, "got {:?} (U+{:04X})\r\n", ch, ch as u32)?;
                }
            }
            Err(overflow) => {
                write!(out, "[{}]\r\n", overflow)?;
                consumer.flush();
            }
        }
        out.flush()?;

        thread::sleep(Duration::from_millis(args.poll_ms));
    }

    source.stop();
    Ok(())
}
