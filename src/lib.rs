//! # Serlogin
//!
//! Log in to a shell over a serial console.
//!
//! A serial console gives no "prompt received" signal, only a stream of bytes
//! and time. Serlogin works out what state the remote end is in (already at a
//! shell, at a login prompt, at a password prompt, or mid-command) and drives
//! it to an authenticated shell for a given user.
//!
//! ## Quick start
//!
//! ```no_run
//! use serlogin::{Deadline, LoginController, LoginParams, SerialSettings, SerialTransport};
//! use serlogin::{Transport, Verbosity};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut transport = SerialTransport::open(SerialSettings::new("/dev/ttyUSB0"))?;
//!     transport.flush_input()?;
//!
//!     let params = LoginParams::new("pi")?.with_password("raspberry");
//!     let outcome = LoginController::new(&mut transport, params, Verbosity::Verbose)
//!         .with_deadline(Some(Deadline::from_secs(30.0)?))
//!         .run()
//!         .await?;
//!
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## How a run decides
//!
//! | Phase | Sends | Reads | Next |
//! |-------|-------|-------|------|
//! | Probe | `ls /` | 1s window | shell marker seen: CheckIdentity, else NeedLogin |
//! | CheckIdentity | `id` | 0.5s window | `(user)` before `gid`: done, else NeedLogout |
//! | NeedLogout | `exit`, newline | 0.5s window | NeedLogin |
//! | NeedLogin | newline | until login prompt or deadline | SendUser |
//! | SendUser | user name | 2s window | MaybePassword |
//! | MaybePassword | password, if any | 2s window | VerifyShell |
//! | VerifyShell | `ls /` | 1s window, then 1s later another | LoggedIn or LoginUnverified |
//!
//! ## Testing against something other than a serial line
//!
//! [`LoginController`] and [`TimedReader`] only use the [`Transport`] trait,
//! so any byte channel that can honour a read timeout can stand in for the
//! serial port.

pub mod config;
pub mod controller;
pub mod deadline;
pub mod error;
pub mod matcher;
pub mod outcome;
pub mod reader;
pub mod serial;
pub mod transport;
pub(crate) mod port_reader;

pub use config::{LoginParams, SerialSettings, Timing, Verbosity};
pub use controller::LoginController;
pub use deadline::Deadline;
pub use error::{ConfigError, Error, Result};
pub use outcome::Outcome;
pub use reader::{ReadUntil, TimedReader};
pub use serial::SerialTransport;
pub use transport::Transport;
