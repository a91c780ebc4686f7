//! uexpect: drive interactive command-line programs
//!
//! uexpect spawns a process attached to a pseudo-terminal, sends it input,
//! and waits for expected output patterns within bounded time: the classic
//! `expect` automation model with a synchronous-looking call contract over
//! non-blocking I/O.
//!
//! # Features
//!
//! - **Expect/send protocol engine**: multiplex the output stream against
//!   an ordered set of candidate patterns with per-call timeouts
//! - **Pattern kinds**: literal strings, literal bytes, regex, end-of-stream
//!   and timeout sentinels
//! - **Lifecycle tracking**: non-blocking process state, signals, graceful
//!   close with kill escalation
//! - **Bounded buffering**: output growth past a configurable limit is
//!   reported, never silently truncated mid-match
//! - **ANSI stripping**: optional removal of escape sequences before
//!   matching
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use uexpect::{Session, Pattern};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder()
//!         .timeout(Duration::from_secs(30))
//!         .arg("-i")
//!         .spawn("python3")?;
//!
//!     session.expect(Pattern::exact(">>> ")).await?;
//!     session.send_line("print('Hello, World!')").await?;
//!
//!     let result = session.expect(Pattern::exact(">>> ")).await?;
//!     println!("Output: {}", result.before);
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Pattern Matching
//!
//! An `expect_any` call takes an ordered set of patterns. The earliest
//! match in the output wins; among matches starting at the same offset,
//! declaration order decides:
//!
//! ```rust,no_run
//! use uexpect::{Session, Pattern};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let session = Session::spawn("make test")?;
//! let patterns = [
//!     Pattern::exact("PASS"),
//!     Pattern::regex(r"FAIL(ED)?")?,
//!     Pattern::Eof,
//! ];
//! let result = session.expect_any(&patterns).await?;
//! match result.pattern_index {
//!     0 => println!("passed"),
//!     1 => println!("failed: {}", result.before),
//!     2 => println!("ended without a verdict"),
//!     _ => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! On success the match and everything before it are consumed; output after
//! the match stays buffered for the next call. On failure the buffer is
//! left as-is and the error carries the unmatched text for diagnosis.
//!
//! # Shells
//!
//! For the common case of driving an interactive shell, [`Shell`] layers
//! prompt management and exit-code capture on top of [`Session`]:
//!
//! ```rust,no_run
//! use uexpect::Shell;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shell = Shell::builder().spawn().await?;
//! let ls = shell.run("ls -1 /").await?;
//! assert_eq!(ls.exit_code, Some(0));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod buffer;
mod encoding;
mod pattern;
mod result;
mod session;
pub mod shell;

// Public API exports
pub use encoding::Encoding;
pub use pattern::Pattern;
pub use result::{Error, MatchResult, PatternError};
pub use session::{LifecycleState, Session, SessionBuilder, SessionRegistry, Signal};
pub use shell::Shell;
