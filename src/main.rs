use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use serlogin::config::{BaudRate, DataBits, FlowControl};
use serlogin::{
    ConfigError, Deadline, LoginController, LoginParams, Outcome, SerialSettings, SerialTransport,
    Transport, Verbosity,
};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "serlogin",
    about = "Log in to a shell over a serial console",
    version
)]
struct Args {
    /// Serial device
    #[arg(short = 'D', long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Baud rate
    #[arg(short, long, default_value_t = 115200)]
    baud: u32,

    /// Bits per byte (5-8)
    #[arg(short, long, default_value_t = 8)]
    width: u8,

    /// Parity: N, E or O
    #[arg(long, default_value = "N")]
    parity: String,

    /// Stop bits: 1 or 2
    #[arg(long, default_value = "1")]
    stopbits: String,

    /// Enable RTS/CTS flow control
    #[arg(long)]
    rtscts: bool,

    /// Enable XON/XOFF flow control
    #[arg(long)]
    xonxoff: bool,

    /// Bounce the line through another baud rate before use
    #[arg(long)]
    force_reset: bool,

    /// Give up waiting for the login prompt after this many seconds
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true)]
    endtime: Option<f64>,

    /// Command to send before probing the console
    #[arg(long)]
    precmd: Option<String>,

    /// Report progress
    #[arg(short, long)]
    verbose: bool,

    /// Report progress and console traffic
    #[arg(short, long)]
    debug: bool,

    /// Password, sent after the user name
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Text that marks the login prompt
    #[arg(short, long, default_value = LoginParams::DEFAULT_LOGIN_PROMPT)]
    login_prompt: String,

    /// User to log in as
    user: String,
}

impl Args {
    fn serial_settings(&self) -> Result<SerialSettings, ConfigError> {
        let mut settings = SerialSettings::new(&self.device);
        settings.baud_rate = BaudRate::try_from(self.baud)?;
        settings.data_bits = DataBits::try_from(self.width)?;
        settings.parity = self.parity.parse()?;
        settings.stop_bits = self.stopbits.parse()?;
        settings.flow_control = FlowControl::from_flags(self.xonxoff, self.rtscts)?;
        settings.force_reset = self.force_reset;
        Ok(settings)
    }

    fn login_params(&self) -> Result<LoginParams, ConfigError> {
        let mut params = LoginParams::new(&self.user)?.with_login_prompt(&self.login_prompt)?;
        if let Some(password) = &self.password {
            params = params.with_password(password);
        }
        if let Some(command) = &self.precmd {
            params = params.with_pre_command(command);
        }
        Ok(params)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.verbose, args.debug);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.log_filter()),
    )
    .init();

    let deadline = args.endtime.map(Deadline::from_secs).transpose();
    let config = args
        .serial_settings()
        .and_then(|settings| Ok((settings, args.login_params()?, deadline?)));
    let (settings, params, deadline) = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let outcome = match login(settings, params, deadline, verbosity).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{e:#}");
            Outcome::Failed
        }
    };
    println!("{outcome}");
    ExitCode::from(outcome.exit_code())
}

/// Open the line, run the handshake, and close the line again.
async fn login(
    settings: SerialSettings,
    params: LoginParams,
    deadline: Option<Deadline>,
    verbosity: Verbosity,
) -> Result<Outcome> {
    let path = settings.path.clone();
    let force_reset = settings.force_reset;

    let mut transport = SerialTransport::open(settings)
        .with_context(|| format!("Failed to open serial device: {path}"))?;
    transport.flush_input().context("Failed to flush input")?;
    transport.flush_output().context("Failed to flush output")?;
    transport
        .reconfigure(force_reset)
        .context("Failed to configure serial device")?;

    let outcome = LoginController::new(&mut transport, params, verbosity)
        .with_deadline(deadline)
        .run()
        .await
        .with_context(|| format!("Login on {path} failed"))?;

    Ok(outcome)
}
