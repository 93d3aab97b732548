//! Memory accounting of the cgroup we're running in.
//!
//! Right now, we only look at the root of the cgroup filesystem as seen from
//! inside the process, which is what you get inside a Docker container. We
//! try the cgroup v2 files first and fall back to the v1 memory controller.
//!
//! ```no_run
//! let mem = mem_pressure::cgroup::CgroupMemory::detect();
//! println!("limit: {}", mem.limit().unwrap());
//! println!("used: {}", mem.used().unwrap());
//! println!("available: {}", mem.available().unwrap());
//! ```

use std::fs;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::errors::*;

const V2_LIMIT: &str = "/sys/fs/cgroup/memory.max";
const V2_USED: &str = "/sys/fs/cgroup/memory.current";
const V1_LIMIT: &str = "/sys/fs/cgroup/memory/memory.limit_in_bytes";
const V1_USED: &str = "/sys/fs/cgroup/memory/memory.usage_in_bytes";

/// Read a file containing an integer. cgroup v2 writes `max` for "no
/// limit", which we report as `u64::MAX`.
fn read_file_u64(path: &Path) -> Result<u64> {
    // Wrap every failure with the path we were trying to read, or our
    // callers will hate us.
    let mkerr = || ErrorKind::File(path.to_owned());

    let mut s = String::new();
    let mut f: fs::File = fs::File::open(path).chain_err(&mkerr)?;
    f.read_to_string(&mut s).chain_err(&mkerr)?;
    match s.trim() {
        "max" => Ok(u64::MAX),
        n => n.parse().chain_err(&mkerr),
    }
}

/// The memory counters of one cgroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupMemory {
    limit: PathBuf,
    used: PathBuf,
}

impl CgroupMemory {
    /// Use whichever cgroup version this host has mounted.
    pub fn detect() -> CgroupMemory {
        if Path::new(V2_LIMIT).exists() {
            CgroupMemory::at(V2_LIMIT, V2_USED)
        } else {
            CgroupMemory::at(V1_LIMIT, V1_USED)
        }
    }

    /// Read the limit and usage from the given files.
    pub fn at<P: Into<PathBuf>, Q: Into<PathBuf>>(limit: P, used: Q) -> CgroupMemory {
        CgroupMemory {
            limit: limit.into(),
            used: used.into(),
        }
    }

    /// What is the maximum amount of memory this cgroup may consume?
    /// `u64::MAX` means no limit.
    pub fn limit(&self) -> Result<u64> {
        read_file_u64(&self.limit)
    }

    /// How much memory is the cgroup currently using?
    pub fn used(&self) -> Result<u64> {
        read_file_u64(&self.used)
    }

    /// How much memory is available to the cgroup but not yet used?
    pub fn available(&self) -> Result<u64> {
        let l = self.limit()?;
        let u = self.used()?;
        Ok(l.saturating_sub(u))
    }
}

/// Render a limit for humans.
pub fn describe_limit(limit: u64) -> String {
    if limit == u64::MAX {
        "unlimited".to_owned()
    } else {
        limit.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    /// A scratch directory with fake `limit` and `used` files.
    fn fake_cgroup(name: &str, limit: &str, used: &str) -> CgroupMemory {
        let dir = env::temp_dir().join(format!("mem_pressure-{}-{}", name, process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("limit"), limit).unwrap();
        fs::write(dir.join("used"), used).unwrap();
        CgroupMemory::at(dir.join("limit"), dir.join("used"))
    }

    #[test]
    fn reads_limit_and_usage() {
        let mem = fake_cgroup("plain", "1048576\n", "1000\n");
        assert_eq!(mem.limit().unwrap(), 1_048_576);
        assert_eq!(mem.used().unwrap(), 1000);
        assert_eq!(mem.available().unwrap(), 1_047_576);
    }

    #[test]
    fn max_means_unlimited() {
        let mem = fake_cgroup("max", "max\n", "5\n");
        assert_eq!(mem.limit().unwrap(), u64::MAX);
        assert_eq!(describe_limit(mem.limit().unwrap()), "unlimited");
        assert_eq!(describe_limit(42), "42");
    }

    #[test]
    fn available_never_goes_negative() {
        let mem = fake_cgroup("over", "10", "20");
        assert_eq!(mem.available().unwrap(), 0);
    }

    #[test]
    fn errors_name_the_file() {
        let mem = CgroupMemory::at("/nonexistent/limit", "/nonexistent/used");
        let err = mem.limit().unwrap_err();
        assert_eq!(err.to_string(), "could not access /nonexistent/limit");

        let garbage = fake_cgroup("garbage", "lots", "0");
        match *garbage.limit().unwrap_err().kind() {
            ErrorKind::File(ref path) => assert!(path.ends_with("limit")),
            ref other => panic!("unexpected error: {}", other),
        }
    }
}
