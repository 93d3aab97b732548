//! The pressure cycle: grow, hold, report, release, repeat.

use std::io::Write;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::buffer::PressureBuffer;
use crate::cgroup::{self, CgroupMemory};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::*;
use crate::schedule;
use crate::usage::{timestamp, MemUsage};

/// How long we sleep between touch passes while holding a block.
pub const TOUCH_INTERVAL: Duration = Duration::from_secs(1);

/// Drives the allocation cycle. Owns the one block of memory that may be
/// live at any moment, and writes its progress lines to `out`.
pub struct Engine<W, C = SystemClock> {
    config: Config,
    clock: C,
    out: W,
    cgroup: Option<CgroupMemory>,
    query_usage: fn() -> Result<MemUsage>,
    current: Option<PressureBuffer>,
}

impl<W: Write> Engine<W> {
    /// An engine on the real clock, reporting cgroup usage when this host
    /// has a memory cgroup.
    pub fn new(config: Config, out: W) -> Engine<W> {
        Engine::with_clock(config, out, SystemClock).with_cgroup(Some(CgroupMemory::detect()))
    }
}

impl<W: Write, C: Clock> Engine<W, C> {
    /// An engine on a clock of our choosing, without cgroup reporting.
    pub fn with_clock(config: Config, out: W, clock: C) -> Engine<W, C> {
        Engine {
            config,
            clock,
            out,
            cgroup: None,
            query_usage: MemUsage::current,
            current: None,
        }
    }

    /// Append cgroup usage (when readable) to every report line.
    pub fn with_cgroup(mut self, cgroup: Option<CgroupMemory>) -> Engine<W, C> {
        self.cgroup = cgroup;
        self
    }

    /// Take usage snapshots from `query` instead of `getrusage`.
    pub fn with_usage_query(mut self, query: fn() -> Result<MemUsage>) -> Engine<W, C> {
        self.query_usage = query;
        self
    }

    /// Size of the block we're currently holding, if any.
    pub fn current_size(&self) -> Option<usize> {
        self.current.as_ref().map(PressureBuffer::len)
    }

    /// The clock we run on.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Where our progress lines go.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Echo our configuration, as we do once at startup.
    pub fn print_config(&mut self) -> Result<()> {
        writeln!(self.out, "start, B    : {}", self.config.start())?;
        writeln!(self.out, "limit, B    : {}", self.config.limit())?;
        writeln!(self.out, "hold for, s : {}", self.config.hold().as_secs())?;
        if let Some(ref cgroup) = self.cgroup {
            match cgroup.limit() {
                Ok(limit) => {
                    writeln!(self.out, "cgroup limit, B : {}", cgroup::describe_limit(limit))?
                }
                Err(e) => debug!(error = %e, "no cgroup memory limit"),
            }
        }
        Ok(())
    }

    /// Cycle forever. Only returns if an allocation fails or we can't
    /// write our output.
    pub fn run_forever(&mut self) -> Result<()> {
        loop {
            self.run_cycle()?;
        }
    }

    /// Run one cycle: every size from `start` up to `limit`, each held
    /// until its slot in a fixed schedule of `hold`-long windows is over.
    pub fn run_cycle(&mut self) -> Result<()> {
        let hold = self.config.hold();
        let mut hold_until = deadline(self.clock.now(), hold)?;

        for size in schedule::sizes(&self.config) {
            self.allocate(size)?;
            let touches = self.hold_until(hold_until);
            trace!(size, touches, "hold finished");
            self.report()?;
            self.release();

            // Windows stay back to back, however long allocating and
            // reporting took.
            hold_until = deadline(hold_until, hold)?;
        }
        Ok(())
    }

    fn allocate(&mut self, size: usize) -> Result<()> {
        // Never have two blocks at once.
        self.release();
        self.current = Some(PressureBuffer::allocate(size)?);
        writeln!(self.out, "[{}] {} bytes of memory was allocated", timestamp(), size)?;
        self.out.flush()?;
        Ok(())
    }

    /// Touch the current block, then sleep, until `deadline`. If the
    /// deadline has already passed we don't touch at all. Returns the
    /// number of touch passes.
    fn hold_until(&mut self, deadline: Instant) -> usize {
        let mut touches = 0;
        while self.clock.now() < deadline {
            if let Some(ref mut buf) = self.current {
                let pages = buf.touch();
                trace!(pages, "touched");
            }
            touches += 1;
            self.clock.sleep(TOUCH_INTERVAL);
        }
        touches
    }

    /// Print one usage line. A failed `getrusage` is logged and skipped.
    fn report(&mut self) -> Result<()> {
        let usage = match (self.query_usage)() {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "skipping resource usage report");
                return Ok(());
            }
        };
        write!(self.out, "[{}] {}", timestamp(), usage)?;
        if let Some(ref cgroup) = self.cgroup {
            match cgroup.used() {
                Ok(used) => write!(self.out, " cgroup_used({})", used)?,
                Err(e) => debug!(error = %e, "no cgroup memory usage"),
            }
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn release(&mut self) {
        self.current = None;
    }
}

/// `hold` past `from`. A deadline the clock can't represent is rejected
/// rather than allowed to wrap.
fn deadline(from: Instant, hold: Duration) -> Result<Instant> {
    from.checked_add(hold).ok_or_else(|| {
        ErrorKind::InvalidArgument("hold_for", hold.as_secs().to_string()).into()
    })
}
