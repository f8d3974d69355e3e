//! multiexpect: expect-style automation over one output and many inputs
//!
//! multiexpect drives interactive programs, network services, or any pair of
//! byte streams: send text to an output, then wait until the text read from
//! an input satisfies a matcher. Every input is read by its own background
//! task into its own buffer, so a session may watch several streams (say a
//! process' stdout and stderr) at once.
//!
//! # Features
//!
//! - **Async/await**: Built on tokio, every wait is bounded by a deadline
//! - **Multiple inputs**: One reader task and one buffer per input stream
//! - **Matcher algebra**: Substrings, regexes, globs and end of stream,
//!   combined with `all_of`, `any_of`, `times` and `sequence`
//! - **Filters**: ANSI stripping, replacements and line buffering applied
//!   before matching, each switchable at runtime
//! - **Interact loop**: React to prompts until a terminal condition holds
//! - **PTY spawning**: Run a command on a pseudo-terminal via portable-pty
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use multiexpect::{matcher::{contains, regexp}, Expect};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut expect = Expect::builder()
//!         .timeout(Duration::from_secs(30))
//!         .exception_on_failure(true)
//!         .spawn("python3 -i")?;
//!
//!     expect.expect(contains(">>> ")).await?;
//!     expect.send_line("print('Hello, World!')").await?;
//!
//!     let result = expect.expect(regexp(r"Hello, (\w+)!")?).await?;
//!     println!("Greeted: {:?}", result.group_at(1)?);
//!
//!     expect.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Streams instead of processes
//!
//! Any tokio reader and writer can be wired in; inputs are numbered in the
//! order they are added.
//!
//! ```rust,no_run
//! use multiexpect::{matcher::contains, Expect};
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("localhost:25").await?;
//! let (reader, writer) = stream.into_split();
//!
//! let mut expect = Expect::builder().output(writer).input(reader).build()?;
//! expect.expect(contains("220")).await?;
//! expect.send_line("QUIT").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Unsuccessful matches
//!
//! By default a match that times out or can no longer succeed is returned
//! as an unsuccessful [`MatchResult`]; reading its attributes fails with
//! [`ExpectError::NoResult`]. Builder flags turn such results into
//! [`ExpectError::Timeout`] or [`ExpectError::Unsuccessful`]. A match that
//! has not succeeded by the time its input ends always fails with
//! [`ExpectError::Eof`].

#![warn(missing_docs)]

mod buffer;
mod event;
pub mod filter;
mod input;
mod interact;
pub mod matcher;
mod result;
mod session;

// Public API exports
pub use buffer::Encoding;
pub use event::{Echo, EchoWriter, ExpectEvent, Observer};
pub use input::Source;
pub use interact::{InteractAction, InteractBuilder, When};
pub use result::{ExpectError, MatchResult, MultiResult, Outcome, PatternError};
pub use session::{
    Expect, ExpectBuilder, Sink, DEFAULT_CHANNEL_CAPACITY, DEFAULT_READ_BUFFER_SIZE,
    DEFAULT_TIMEOUT_SECS,
};

// Re-export commonly used types
pub use portable_pty::ExitStatus;
