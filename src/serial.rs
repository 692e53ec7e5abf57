//! [`SerialTransport`]: a [`Transport`] over a real serial line.

use crate::config::{DataBits, FlowControl, Parity, SerialSettings, StopBits};
use crate::error::{Error, Result};
use crate::port_reader::{ChunkQueue, spawn_reader};
use crate::transport::Transport;
use async_trait::async_trait;
use log::debug;
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the background reader blocks per call before checking whether it
/// should stop.
const READER_POLL: Duration = Duration::from_millis(100);

/// An open serial line.
///
/// Incoming bytes are pulled off the line by a background thread; dropping the
/// transport stops that thread and closes the device.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    settings: SerialSettings,
    timeout: Duration,
    incoming: ChunkQueue,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialTransport {
    /// Open and configure the line described by `settings`.
    pub fn open(settings: SerialSettings) -> Result<Self> {
        let port = serialport::new(settings.path.as_str(), settings.baud_rate.get())
            .data_bits(settings.data_bits.into())
            .parity(settings.parity.into())
            .stop_bits(settings.stop_bits.into())
            .flow_control(settings.flow_control.into())
            .timeout(READER_POLL)
            .open()
            .map_err(|e| Error::Transport(e.into()))?;

        let reader_port = port.try_clone().map_err(|e| Error::Transport(e.into()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let (rx, reader) = spawn_reader(reader_port, stop.clone());

        debug!(
            "opened {} at {} baud",
            settings.path,
            settings.baud_rate.get()
        );

        Ok(Self {
            port,
            timeout: settings.timeout,
            settings,
            incoming: ChunkQueue::new(rx),
            stop,
            reader: Some(reader),
        })
    }

    fn apply_settings(&mut self) -> io::Result<()> {
        self.port.set_baud_rate(self.settings.baud_rate.get())?;
        self.port.set_data_bits(self.settings.data_bits.into())?;
        self.port.set_parity(self.settings.parity.into())?;
        self.port.set_stop_bits(self.settings.stop_bits.into())?;
        self.port.set_flow_control(self.settings.flow_control.into())?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    async fn read(&mut self, max: Option<usize>) -> io::Result<Vec<u8>> {
        self.incoming.read(self.timeout, max).await
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        self.incoming.clear()
    }

    fn flush_output(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Output)?;
        Ok(())
    }

    /// With `force`, bounce the line through a different baud rate first.
    /// Some USB-serial adapters only start passing data after that.
    fn reconfigure(&mut self, force: bool) -> io::Result<()> {
        if force {
            let bounce = match self.settings.baud_rate.get() {
                9600 => 115200,
                _ => 9600,
            };
            debug!("resetting {} via {} baud", self.settings.path, bounce);
            self.port.set_baud_rate(bounce)?;
        }
        self.apply_settings()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        debug!("closed {}", self.settings.path);
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}
