use std::fmt;

/// How a login attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A shell answered as the requested user.
    LoggedIn,
    /// Credentials were sent but no shell answered the final check.
    LoginUnverified,
    /// The line failed before the handshake could finish.
    Failed,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::LoggedIn => 0,
            Outcome::LoginUnverified => 1,
            Outcome::Failed => 4,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::LoggedIn => write!(f, "logged in"),
            Outcome::LoginUnverified => write!(f, "login not verified"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}
