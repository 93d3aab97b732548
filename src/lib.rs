//! # `mem_pressure`: Apply escalating memory pressure to the current host
//!
//! This crate allocates a block of memory, keeps every page of it resident
//! for a while, reports how much memory the process is using, frees the
//! block and allocates one twice as large. Once the next block would reach
//! the configured ceiling, it starts over from the smallest size. It runs
//! until something outside the process stops it, which is the point: it's
//! meant for watching how a container limit, an OOM killer or a monitoring
//! alert reacts.
//!
//! ```
//! let config = mem_pressure::Config::from_args(&["1", "4", "1"]).unwrap();
//! let sizes: Vec<usize> = mem_pressure::schedule::sizes(&config).collect();
//! assert_eq!(sizes, vec![1024 * 1024, 2 * 1024 * 1024]);
//! ```
//!
//! Everything is single-threaded. The only time we wait is the one-second
//! sleep between touch passes while a block is being held.

#![warn(missing_docs)]

// Needed for `error_chain`, which does evil things with macros.
#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

pub mod buffer;
pub mod cgroup;
pub mod clock;
pub mod config;
pub mod engine;
pub mod schedule;
pub mod usage;

// Re-export our error types declared by `error-chain`.
pub use errors::{Error, ErrorKind, Result, ResultExt};

pub use config::Config;
pub use engine::Engine;

/// Our error type, declared with the `[error-chain][]` crate's
/// `error_chain!` macro.
///
/// Only `AllocationFailed`, `InvalidArgument` and `Io` end the program.
/// `Usage` is really a request for help, and `UsageQuery` and `File` are
/// logged and skipped.
///
/// [error-chain]: https://docs.rs/error-chain/0.12/error_chain/
mod errors {
    use std::path::PathBuf;

    error_chain! {
        foreign_links {
            Io(::std::io::Error) #[doc = "Writing progress output failed."];
        }

        errors {
            /// We were called with the wrong number of arguments.
            Usage {
                description("wrong number of arguments")
                display("expected exactly 3 arguments: <start> <limit> <hold_for>")
            }

            /// One of the numeric arguments is out of range or unparseable.
            InvalidArgument(name: &'static str, value: String) {
                description("invalid argument")
                display("Invalid value of <{}>: {}", name, value)
            }

            /// The allocator could not give us a block of this many bytes.
            AllocationFailed(size: usize) {
                description("memory allocation failed")
                display("failed to allocate {} bytes", size)
            }

            /// `getrusage` refused to report on this process.
            UsageQuery {
                description("getrusage() failed")
                display("getrusage() failed")
            }

            /// An error occurred while trying to access the specified path.
            File(path: PathBuf) {
                description("could not access file with cgroup data")
                // Note that we have to call `.display()` on path objects to
                // get something that's valid, printable UTF-8.
                display("could not access {}", path.display())
            }
        }
    }
}
