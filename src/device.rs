// src/device.rs
use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::channel::{self, Channel, DacBank, Filter};
use crate::commands::*;
use crate::error::{Error, Result};

pub const BAUD_RATE: u32 = 9600;

/// Driver for the light engine.
///
/// Owns the transport and a shadow copy of the enable register, which the
/// device cannot report back. Dropping an open engine switches every channel
/// off before releasing the port.
pub struct LightEngine<T: Read + Write = Box<dyn SerialPort>> {
    port: Option<T>,
    enable: u8,
}

impl LightEngine {
    /// Opens `port_name` at 9600 8E1 and initializes the engine.
    pub fn open(port_name: &str, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::Even)
            .stop_bits(StopBits::One)
            .timeout(read_timeout)
            .open()
            .map_err(|source| Error::Connection {
                port: port_name.to_string(),
                source,
            })?;
        info!(port = port_name, "serial port opened");
        Self::connect(port)
    }
}

impl<T: Read + Write> LightEngine<T> {
    /// Configures the GPIO directions and leaves every channel disabled at
    /// minimum intensity. `port` must already run at 9600 baud, 8E1.
    pub fn connect(port: T) -> Result<Self> {
        let mut engine = Self {
            port: Some(port),
            enable: ALL_DISABLED,
        };
        engine.send(gpio_low_direction())?;
        engine.send(gpio_high_direction())?;
        engine.disable_all()?;
        info!("light engine ready");
        Ok(engine)
    }

    fn send(&mut self, frame: Vec<u8>) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::Closed)?;
        port.write_all(&frame)?;
        port.flush()?;
        debug!(frame = %hex(&frame), "sent");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Last enable register value written to the device. Bit set = disabled.
    pub fn enable_register(&self) -> u8 {
        self.enable
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.enable & channel.enable_mask() == 0
    }

    pub fn filter_position(&self) -> Filter {
        if self.is_enabled(Channel::Filter) {
            Filter::Yellow
        } else {
            Filter::Green
        }
    }

    /// Disables every channel and drives both DAC banks to minimum.
    pub fn disable_all(&mut self) -> Result<()> {
        self.send(enable_register(ALL_DISABLED))?;
        self.enable = ALL_DISABLED;
        for bank in DacBank::ALL {
            self.send(intensity(bank, ALL_OUTPUTS, 0))?;
        }
        Ok(())
    }

    /// Flips the enable bit of each channel. Toggling the same channel twice
    /// restores the previous state.
    pub fn toggle(&mut self, channels: &[Channel]) -> Result<()> {
        let next = (self.enable ^ channel::enable_mask(channels)) & ALL_DISABLED;
        self.send(enable_register(next))?;
        self.enable = next;
        Ok(())
    }

    /// [`toggle`](Self::toggle) by channel name. Nothing is sent if any name
    /// is unknown.
    pub fn toggle_named<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let channels = Channel::parse_list(names)?;
        self.toggle(&channels)
    }

    /// Sets the output level (0 = minimum, 255 = full) of each channel.
    ///
    /// One frame per DAC bank with at least one selected channel; the banks are
    /// written independently.
    pub fn set_intensity(&mut self, channels: &[Channel], level: u8) -> Result<()> {
        if channels.contains(&Channel::Filter) {
            warn!("filter has no intensity control, ignoring it");
        }
        for bank in DacBank::ALL {
            let sel = channel::selector(channels, bank);
            if sel != 0 {
                self.send(intensity(bank, sel, level))?;
            }
        }
        Ok(())
    }

    pub fn set_intensity_named<S: AsRef<str>>(&mut self, names: &[S], level: u8) -> Result<()> {
        let channels = Channel::parse_list(names)?;
        self.set_intensity(&channels, level)
    }

    /// Reads the engine temperature in degrees Celsius.
    ///
    /// A short reply fails with [`Error::Io`] and the bytes already read are
    /// dropped. A reply byte that arrives after the timeout stays in the
    /// port's input buffer and would shift the next reading, so reopen the
    /// port after a timeout.
    pub fn temperature(&mut self) -> Result<f32> {
        self.send(temperature_query())?;
        let mut reply = [0u8; TEMPERATURE_REPLY_LEN];
        let port = self.port.as_mut().ok_or(Error::Closed)?;
        port.read_exact(&mut reply)?;
        let celsius = decode_temperature(reply);
        debug!(reply = %hex(&reply), celsius, "temperature");
        Ok(celsius)
    }

    /// Switches everything off and releases the port. Closing an already
    /// closed engine does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.port.is_none() {
            debug!("close on closed light engine");
            return Ok(());
        }
        let result = self.disable_all();
        self.port = None;
        info!("light engine closed");
        result
    }
}

impl<T: Read + Write> Drop for LightEngine<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to switch off light engine: {e}");
        }
    }
}
