//! Resource usage snapshots and log timestamps.

use std::fmt;
use std::mem;

use chrono::Local;

use crate::errors::*;

/// The memory counters from `getrusage(RUSAGE_SELF)`. See `man 2 getrusage`
/// for what each means on your platform; Linux, for example, only fills in
/// `max_rss` and leaves the integral sizes at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemUsage {
    /// Peak resident set size (`ru_maxrss`).
    pub max_rss: i64,
    /// Integral shared memory size (`ru_ixrss`).
    pub ixrss: i64,
    /// Integral unshared data size (`ru_idrss`).
    pub idrss: i64,
    /// Integral unshared stack size (`ru_isrss`).
    pub isrss: i64,
}

impl MemUsage {
    /// Ask the OS how much memory this process has been using.
    pub fn current() -> Result<MemUsage> {
        // SAFETY: `rusage` is plain old data, and `getrusage` only writes
        // into the struct we hand it.
        let usage = unsafe {
            let mut usage: libc::rusage = mem::zeroed();
            if libc::getrusage(libc::RUSAGE_SELF, &mut usage) < 0 {
                return Err(ErrorKind::UsageQuery.into());
            }
            usage
        };
        Ok(MemUsage {
            max_rss: usage.ru_maxrss as i64,
            ixrss: usage.ru_ixrss as i64,
            idrss: usage.ru_idrss as i64,
            isrss: usage.ru_isrss as i64,
        })
    }
}

impl fmt::Display for MemUsage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Mem resource usage: maxrss({}) ixrss({}) idrss({}) isrss({})",
            self.max_rss, self.ixrss, self.idrss, self.isrss
        )
    }
}

/// The local time in `ctime` format, without the trailing newline:
/// `Wed Jan  1 00:00:00 2025`.
pub fn timestamp() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}
