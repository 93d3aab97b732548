//! `mem_pressure <start> <limit> <hold_for>`: allocate `<start>` MB, double
//! every `<hold_for>` seconds until the next block would reach `<limit>` MB,
//! then start over. Runs until killed.

extern crate mem_pressure;

use std::env;
use std::io;
use std::process;

use mem_pressure::config::USAGE;
use mem_pressure::{Config, Engine, ErrorKind, Result};

fn run() -> Result<()> {
    let config = Config::from_args(env::args().skip(1))?;

    let stdout = io::stdout();
    let mut engine = Engine::new(config, stdout.lock());
    engine.print_config()?;
    engine.run_forever()
}

/// Like `error_chain`'s `quick_main!`, except that a usage request isn't a
/// failure.
fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    if let Err(e) = run() {
        if let ErrorKind::Usage = *e.kind() {
            eprint!("{}", USAGE);
            process::exit(0);
        }
        eprintln!("{}", e);
        for cause in e.iter().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        process::exit(1);
    }
}
