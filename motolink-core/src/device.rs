//! Device state and command execution
//!
//! Commands arrive already framed and CRC-checked. This module only decides
//! whether the command and its payload make sense for the device.

use motolink_protocol::messages::{CMD_GET_STAT, CMD_SET_MODE, CMD_SET_SPEED, CMD_STOP};
use motolink_protocol::Reason;

/// Highest accepted speed setpoint (percent)
pub const MAX_SPEED: u8 = 100;

/// Control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    #[default]
    Open = 0,
    Closed = 1,
}

impl Mode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Mode::Open),
            1 => Some(Mode::Closed),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Reasons a decoded command is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Command byte is not a request this device understands
    UnknownCommand,
    /// Payload has the wrong length or an out-of-range value
    BadPayload,
}

impl From<CommandError> for Reason {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::UnknownCommand => Reason::UnknownCmd,
            CommandError::BadPayload => Reason::BadPayload,
        }
    }
}

/// Controllable device state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device {
    speed: u8,
    mode: Mode,
}

impl Device {
    /// Create a stopped device in open-loop mode
    pub const fn new() -> Self {
        Self {
            speed: 0,
            mode: Mode::Open,
        }
    }

    /// Current speed setpoint (0..=100)
    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Execute a decoded command
    ///
    /// GET_STAT is accepted here but produces no state change; the reply is
    /// built by the dispatcher.
    pub fn handle(&mut self, cmd: u8, payload: &[u8]) -> Result<(), CommandError> {
        match (cmd, payload) {
            (CMD_SET_SPEED, &[speed]) => {
                self.speed = speed.min(MAX_SPEED);
                Ok(())
            }
            (CMD_SET_MODE, &[mode]) => {
                self.mode = Mode::from_byte(mode).ok_or(CommandError::BadPayload)?;
                Ok(())
            }
            (CMD_STOP, []) => {
                self.speed = 0;
                Ok(())
            }
            (CMD_GET_STAT, []) => Ok(()),
            (CMD_SET_SPEED | CMD_SET_MODE | CMD_STOP | CMD_GET_STAT, _) => {
                Err(CommandError::BadPayload)
            }
            _ => Err(CommandError::UnknownCommand),
        }
    }
}
