//! Command-line configuration.

use std::time::Duration;

use crate::errors::*;

/// Bytes in one megabyte, as our arguments count them.
pub const MB: usize = 1024 * 1024;

/// Longest hold we accept, in seconds (about 136 years). Every deadline a
/// cycle computes from it stays representable by the clock.
pub const MAX_HOLD_SECS: i64 = u32::MAX as i64;

/// Usage text printed when we're called with the wrong number of arguments.
pub const USAGE: &str = "Usage:
  This program expects 3 arguments:
    <start> -- allocate <start> MB of RAM on start, double allocation
               every <hold_for> seconds;
    <limit> -- reset to <start> when memory allocation is over <limit> MB;
    <hold_for> -- how long to keep allocated memory, seconds.
";

/// The three numbers that drive the engine. Once built, a `Config` always
/// satisfies `1 <= start < limit` and `hold >= 1s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    start: usize,
    limit: usize,
    hold: Duration,
}

impl Config {
    /// Build a configuration from `<start_mb> <limit_mb> <hold_seconds>`,
    /// not including the program name.
    ///
    /// ```
    /// use mem_pressure::{Config, ErrorKind};
    ///
    /// let config = Config::from_args(&["1", "3", "1"]).unwrap();
    /// assert_eq!(config.start(), 1048576);
    /// assert_eq!(config.limit(), 3145728);
    ///
    /// match *Config::from_args(&["0", "3", "1"]).unwrap_err().kind() {
    ///     ErrorKind::InvalidArgument("start", ref v) => assert_eq!(v, "0"),
    ///     ref other => panic!("unexpected error: {}", other),
    /// }
    /// ```
    pub fn from_args<I, S>(args: I) -> Result<Config>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        if args.len() != 3 {
            return Err(ErrorKind::Usage.into());
        }

        let start_mb = parse_int("start", args[0].as_ref())?;
        let limit_mb = parse_int("limit", args[1].as_ref())?;
        let hold_for = parse_int("hold_for", args[2].as_ref())?;

        // Check for sanity, in the same order we name them in the usage.
        if start_mb < 1 {
            return Err(invalid("start", start_mb));
        }
        if limit_mb < 1 || limit_mb <= start_mb {
            return Err(invalid("limit", limit_mb));
        }
        if hold_for < 1 || hold_for > MAX_HOLD_SECS {
            return Err(invalid("hold_for", hold_for));
        }

        Ok(Config {
            start: mb_to_bytes("start", start_mb)?,
            limit: mb_to_bytes("limit", limit_mb)?,
            hold: Duration::from_secs(hold_for as u64),
        })
    }

    /// Size of the first allocation of every cycle, in bytes.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Allocations never reach this many bytes.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// How long each allocation is held.
    pub fn hold(&self) -> Duration {
        self.hold
    }
}

fn invalid(name: &'static str, value: i64) -> Error {
    ErrorKind::InvalidArgument(name, value.to_string()).into()
}

/// Parse a base-10 integer, tolerating surrounding whitespace.
fn parse_int(name: &'static str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ErrorKind::InvalidArgument(name, raw.to_owned()).into())
}

/// Turn a (positive) number of MBs into bytes, refusing anything that
/// doesn't fit in our address space.
fn mb_to_bytes(name: &'static str, mb: i64) -> Result<usize> {
    (mb as u64)
        .checked_mul(MB as u64)
        .filter(|&bytes| bytes <= isize::MAX as u64)
        .map(|bytes| bytes as usize)
        .ok_or_else(|| invalid(name, mb))
}
