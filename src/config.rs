//! Validated line settings and login parameters.
//!
//! Every value here is checked when it is built, so the transport and the
//! login controller only ever see well-formed configuration.

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Baud rates accepted on the command line.
pub const BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400, 460800, 500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000,
    3000000, 3500000, 4000000,
];

/// A baud rate from [`BAUD_RATES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudRate(u32);

impl BaudRate {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ConfigError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        if BAUD_RATES.contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(ConfigError::BaudRate(rate))
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self(115200)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl FromStr for Parity {
    type Err = ConfigError;

    /// Parse a parity letter. Mark and space parity are not supported by the
    /// line driver and are rejected along with anything else.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Parity::None),
            "E" => Ok(Parity::Even),
            "O" => Ok(Parity::Odd),
            _ => Err(ConfigError::Parity(s.to_string())),
        }
    }
}

/// Byte width on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl TryFrom<u8> for DataBits {
    type Error = ConfigError;

    fn try_from(width: u8) -> Result<Self, Self::Error> {
        match width {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(ConfigError::DataBits(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl FromStr for StopBits {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(StopBits::One),
            "2" => Ok(StopBits::Two),
            _ => Err(ConfigError::StopBits(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowControl {
    #[default]
    None,
    /// XON/XOFF
    Software,
    /// RTS/CTS
    Hardware,
}

impl FlowControl {
    /// Build from the `--xonxoff` / `--rtscts` flags.
    pub fn from_flags(xonxoff: bool, rtscts: bool) -> Result<Self, ConfigError> {
        match (xonxoff, rtscts) {
            (false, false) => Ok(FlowControl::None),
            (true, false) => Ok(FlowControl::Software),
            (false, true) => Ok(FlowControl::Hardware),
            (true, true) => Err(ConfigError::FlowControl),
        }
    }
}

/// Everything needed to open and configure the serial line.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: String,
    pub baud_rate: BaudRate,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Default blocking time of a single read.
    pub timeout: Duration,
    /// Toggle the baud rate before use to wake up stubborn adapters.
    pub force_reset: bool,
}

impl SerialSettings {
    /// Settings for `path` with 115200 8N1, no flow control and a one-second
    /// read timeout.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: BaudRate::default(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            timeout: Duration::from_secs(1),
            force_reset: false,
        }
    }
}

/// What to log in as, and how to recognise the login prompt.
#[derive(Clone)]
pub struct LoginParams {
    pub username: String,
    pub password: Option<String>,
    pub login_prompt: String,
    /// Command sent once before the remote state is probed.
    pub pre_command: Option<String>,
}

impl LoginParams {
    pub const DEFAULT_LOGIN_PROMPT: &'static str = "login:";

    pub fn new(username: impl Into<String>) -> Result<Self, ConfigError> {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::EmptyUser);
        }
        Ok(Self {
            username,
            password: None,
            login_prompt: Self::DEFAULT_LOGIN_PROMPT.to_string(),
            pre_command: None,
        })
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// An empty prompt would match the first byte read, so it is rejected.
    pub fn with_login_prompt(mut self, prompt: impl Into<String>) -> Result<Self, ConfigError> {
        let prompt = prompt.into();
        if prompt.is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        self.login_prompt = prompt;
        Ok(self)
    }

    pub fn with_pre_command(mut self, command: impl Into<String>) -> Self {
        self.pre_command = Some(command.into());
        self
    }
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginParams")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("login_prompt", &self.login_prompt)
            .field("pre_command", &self.pre_command)
            .finish()
    }
}

/// Lengths of the fixed read windows used by each login phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub pre_command: Duration,
    pub probe: Duration,
    pub identity: Duration,
    pub logout: Duration,
    pub user: Duration,
    pub password: Duration,
    pub verify: Duration,
    /// Pause before the second shell check.
    pub grace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pre_command: Duration::from_secs(1),
            probe: Duration::from_secs(1),
            identity: Duration::from_millis(500),
            logout: Duration::from_millis(500),
            user: Duration::from_secs(2),
            password: Duration::from_secs(2),
            verify: Duration::from_secs(1),
            grace: Duration::from_secs(1),
        }
    }
}

/// How chatty the run is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only.
    #[default]
    Silent,
    /// Phase progress and status lines.
    Verbose,
    /// Everything, including console traffic.
    Debug,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Silent
        }
    }

    /// Default `env_logger` filter for this level.
    pub fn log_filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "warn",
            Verbosity::Verbose => "info",
            Verbosity::Debug => "debug",
        }
    }

    /// Whether raw console traffic is logged.
    pub fn traces_traffic(self) -> bool {
        self >= Verbosity::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_rate_table() {
        assert_eq!(BaudRate::try_from(9600).unwrap().get(), 9600);
        assert_eq!(BaudRate::try_from(115200).unwrap().get(), 115200);
        assert_eq!(BaudRate::try_from(12345), Err(ConfigError::BaudRate(12345)));
        assert!(BaudRate::try_from(0).is_err());
    }

    #[test]
    fn test_parse_parity() {
        assert_eq!("N".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("e".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("O".parse::<Parity>().unwrap(), Parity::Odd);
        assert!("M".parse::<Parity>().is_err());
        assert!("S".parse::<Parity>().is_err());
        assert!("odd".parse::<Parity>().is_err());
    }

    #[test]
    fn test_data_bits() {
        assert_eq!(DataBits::try_from(7).unwrap(), DataBits::Seven);
        assert_eq!(DataBits::try_from(9), Err(ConfigError::DataBits(9)));
        assert!(DataBits::try_from(4).is_err());
    }

    #[test]
    fn test_parse_stop_bits() {
        assert_eq!("1".parse::<StopBits>().unwrap(), StopBits::One);
        assert_eq!("2".parse::<StopBits>().unwrap(), StopBits::Two);
        assert!("1.5".parse::<StopBits>().is_err());
    }

    #[test]
    fn test_flow_control_flags() {
        assert_eq!(FlowControl::from_flags(false, false).unwrap(), FlowControl::None);
        assert_eq!(FlowControl::from_flags(true, false).unwrap(), FlowControl::Software);
        assert_eq!(FlowControl::from_flags(false, true).unwrap(), FlowControl::Hardware);
        assert_eq!(FlowControl::from_flags(true, true), Err(ConfigError::FlowControl));
    }

    #[test]
    fn test_login_params() {
        let params = LoginParams::new("pi").unwrap().with_password("raspberry");
        assert_eq!(params.login_prompt, "login:");
        assert_eq!(params.password.as_deref(), Some("raspberry"));
        assert!(params.pre_command.is_none());
        assert!(!format!("{params:?}").contains("raspberry"));

        assert!(matches!(LoginParams::new(""), Err(ConfigError::EmptyUser)));
    }

    #[test]
    fn test_empty_login_prompt_rejected() {
        let params = LoginParams::new("pi").unwrap();
        let err = params.clone().with_login_prompt("").unwrap_err();
        assert_eq!(err, ConfigError::EmptyPrompt);
        assert_eq!(err.exit_code(), 3);

        let params = params.with_login_prompt("Username:").unwrap();
        assert_eq!(params.login_prompt, "Username:");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Silent);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
        assert_eq!(Verbosity::Verbose.log_filter(), "info");
        assert!(Verbosity::Debug.traces_traffic());
        assert!(!Verbosity::Verbose.traces_traffic());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ConfigError::BaudRate(1).exit_code(), 2);
        assert_eq!(ConfigError::FlowControl.exit_code(), 2);
        assert_eq!(ConfigError::EndTime(-1.0).exit_code(), 3);
    }
}
