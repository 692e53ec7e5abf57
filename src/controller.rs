//! The login state machine.
//!
//! The remote end of a serial console can be in any state when we attach: at
//! a shell (possibly as the wrong user), at a login or password prompt, or in
//! the middle of a command. [`LoginController`] probes it, logs out when
//! needed, sends credentials and checks that a shell answers:
//!
//! ```text
//! Probe ──shell──▶ CheckIdentity ──same user──▶ Done(LoggedIn)
//!   │                   │
//!   │                   └─other user──▶ NeedLogout ──┐
//!   └──no shell──────────────────────────────────────┴─▶ NeedLogin
//!
//! NeedLogin ─▶ SendUser ─▶ MaybePassword ─▶ VerifyShell ─▶ Done(LoggedIn | LoginUnverified)
//! ```
//!
//! Every decision is a substring check on the bytes collected in a timed read
//! window. Missing output is never an error: it picks a branch or ends in
//! [`Outcome::LoginUnverified`]. Only transport faults abort the run.

use crate::config::{LoginParams, Timing, Verbosity};
use crate::deadline::Deadline;
use crate::error::Result;
use crate::matcher::{self, SHELL_MARKER};
use crate::outcome::Outcome;
use crate::reader::TimedReader;
use crate::transport::Transport;
use log::{debug, info, warn};
use std::io;
use std::time::Duration;

/// Harmless command whose output contains [`SHELL_MARKER`] on a live shell.
pub const LIST_COMMAND: &str = "ls /";
pub const IDENTITY_COMMAND: &str = "id";
pub const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Probe,
    CheckIdentity,
    NeedLogout,
    NeedLogin,
    SendUser,
    MaybePassword,
    VerifyShell,
    Done(Outcome),
}

/// Drives a console from an unknown state to a shell for one user.
pub struct LoginController<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    reader: TimedReader,
    params: LoginParams,
    timing: Timing,
    deadline: Option<Deadline>,
    verbosity: Verbosity,
}

impl<'a, T> LoginController<'a, T>
where
    T: Transport + ?Sized,
{
    pub fn new(transport: &'a mut T, params: LoginParams, verbosity: Verbosity) -> Self {
        Self {
            transport,
            reader: TimedReader::new(verbosity),
            params,
            timing: Timing::default(),
            deadline: None,
            verbosity,
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Bound the wait for the login prompt. Without a deadline that wait is
    /// unbounded.
    pub fn with_deadline(mut self, deadline: Option<Deadline>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run the handshake to completion.
    pub async fn run(mut self) -> Result<Outcome> {
        self.send_pre_command().await?;

        let mut phase = Phase::Probe;
        loop {
            debug!("phase {:?}", phase);
            phase = match phase {
                Phase::Done(outcome) => return Ok(outcome),
                Phase::Probe => self.probe().await?,
                Phase::CheckIdentity => self.check_identity().await?,
                Phase::NeedLogout => self.logout().await?,
                Phase::NeedLogin => self.wait_for_login_prompt().await?,
                Phase::SendUser => self.send_user().await?,
                Phase::MaybePassword => self.send_password().await?,
                Phase::VerifyShell => self.verify_shell().await?,
            };
        }
    }

    async fn send_pre_command(&mut self) -> io::Result<()> {
        let Some(command) = self.params.pre_command.clone() else {
            return Ok(());
        };
        info!("sending pre-command {command:?}");
        self.send_line(&command)?;
        let output = self.drain(self.timing.pre_command).await?;
        debug!("pre-command output: {}", output.escape_ascii());
        Ok(())
    }

    async fn probe(&mut self) -> io::Result<Phase> {
        self.send_line(LIST_COMMAND)?;
        let output = self.drain(self.timing.probe).await?;
        if matcher::contains(&output, SHELL_MARKER) {
            info!("shell is active, checking user");
            Ok(Phase::CheckIdentity)
        } else {
            info!("no shell response, logging in");
            Ok(Phase::NeedLogin)
        }
    }

    async fn check_identity(&mut self) -> io::Result<Phase> {
        self.send_line(IDENTITY_COMMAND)?;
        let output = self.drain(self.timing.identity).await?;
        if matcher::identity_confirmed(&output, &self.params.username) {
            info!("already logged in as {}", self.params.username);
            Ok(Phase::Done(Outcome::LoggedIn))
        } else {
            info!("not logged in as {}, logging out", self.params.username);
            Ok(Phase::NeedLogout)
        }
    }

    /// The exit may itself land on a login prompt and be taken as a user
    /// name; the newline afterwards clears that.
    async fn logout(&mut self) -> io::Result<Phase> {
        self.send_line(EXIT_COMMAND)?;
        self.drain(self.timing.logout).await?;
        self.send_line("")?;
        Ok(Phase::NeedLogin)
    }

    async fn wait_for_login_prompt(&mut self) -> io::Result<Phase> {
        self.send_line("")?;
        let prompt = self.params.login_prompt.clone();
        let result = self
            .reader
            .read_until(&mut *self.transport, self.deadline, &prompt)
            .await?;
        if result.found {
            debug!("got login prompt {prompt:?}");
        } else {
            warn!("login prompt {prompt:?} not seen, sending user name anyway");
        }
        Ok(Phase::SendUser)
    }

    async fn send_user(&mut self) -> io::Result<Phase> {
        let username = self.params.username.clone();
        self.send_line(&username)?;
        self.drain(self.timing.user).await?;
        Ok(Phase::MaybePassword)
    }

    /// The password prompt is not checked: whatever answered the user name,
    /// the password goes next.
    async fn send_password(&mut self) -> io::Result<Phase> {
        if let Some(password) = self.params.password.clone() {
            self.send_secret_line(&password)?;
            self.drain(self.timing.password).await?;
        }
        Ok(Phase::VerifyShell)
    }

    async fn verify_shell(&mut self) -> io::Result<Phase> {
        self.send_line(LIST_COMMAND)?;
        let output = self.drain(self.timing.verify).await?;
        if matcher::contains(&output, SHELL_MARKER) {
            info!("logged in as {}", self.params.username);
            return Ok(Phase::Done(Outcome::LoggedIn));
        }

        // Slow remotes sometimes answer only after the first window closed.
        tokio::time::sleep(self.timing.grace).await;
        let output = self.drain(self.timing.verify).await?;
        if matcher::contains(&output, SHELL_MARKER) {
            debug!("shell answered after grace period");
            return Ok(Phase::Done(Outcome::LoggedIn));
        }

        warn!(
            "could not verify login as {}: no shell response",
            self.params.username
        );
        Ok(Phase::Done(Outcome::LoginUnverified))
    }

    async fn drain(&mut self, window: Duration) -> io::Result<Vec<u8>> {
        self.reader.drain(&mut *self.transport, window).await
    }

    fn send_line(&mut self, line: &str) -> io::Result<()> {
        if self.verbosity.traces_traffic() {
            debug!("tx {}", line.escape_debug());
        }
        self.write_line(line)
    }

    fn send_secret_line(&mut self, line: &str) -> io::Result<()> {
        if self.verbosity.traces_traffic() {
            debug!("tx <password>");
        }
        self.write_line(line)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.transport.write(&bytes)
    }
}
