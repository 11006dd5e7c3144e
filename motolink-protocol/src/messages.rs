//! Command and reason codes for the Motolink protocol
//!
//! Command bytes are divided into two ranges:
//! - Host → device: 0x01..=0x7F (requests)
//! - Device → host: 0x80..=0xFF (replies)

// Command IDs: host → device
pub const CMD_SET_SPEED: u8 = 0x01;
pub const CMD_SET_MODE: u8 = 0x02;
pub const CMD_STOP: u8 = 0x03;
pub const CMD_GET_STAT: u8 = 0x04;

// Command IDs: device → host
pub const CMD_ACK: u8 = 0x80;
pub const CMD_NACK: u8 = 0x81;
pub const CMD_STAT: u8 = 0x82;

/// Known command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set motor speed, payload `[percent]` (clamped to 0..=100)
    SetSpeed,
    /// Set mode, payload `[0 = open, 1 = closed]`
    SetMode,
    /// Stop the motor, no payload
    Stop,
    /// Request a STAT telemetry reply, no payload
    GetStat,
    /// Positive acknowledgement, payload `[orig_cmd]`
    Ack,
    /// Negative acknowledgement, payload `[orig_cmd, reason]`
    Nack,
    /// Telemetry record reply, 24-byte payload
    Stat,
}

impl Command {
    /// Parse a command from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_SET_SPEED => Some(Command::SetSpeed),
            CMD_SET_MODE => Some(Command::SetMode),
            CMD_STOP => Some(Command::Stop),
            CMD_GET_STAT => Some(Command::GetStat),
            CMD_ACK => Some(Command::Ack),
            CMD_NACK => Some(Command::Nack),
            CMD_STAT => Some(Command::Stat),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::SetSpeed => CMD_SET_SPEED,
            Command::SetMode => CMD_SET_MODE,
            Command::Stop => CMD_STOP,
            Command::GetStat => CMD_GET_STAT,
            Command::Ack => CMD_ACK,
            Command::Nack => CMD_NACK,
            Command::Stat => CMD_STAT,
        }
    }

    /// Returns true for device → host replies
    pub fn is_reply(&self) -> bool {
        matches!(self, Command::Ack | Command::Nack | Command::Stat)
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetSpeed => "SET_SPEED",
            Command::SetMode => "SET_MODE",
            Command::Stop => "STOP",
            Command::GetStat => "GET_STAT",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Stat => "STAT",
        }
    }
}

/// Log name for a raw command byte
pub fn command_name(byte: u8) -> &'static str {
    Command::from_byte(byte).map_or("CMD_UNKNOWN", |c| c.name())
}

/// Failure reasons, used in NACK payloads and engine telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Reason {
    #[default]
    Ok = 0,
    BadStx = 1,
    /// LEN byte outside 1..=65
    BadLen = 2,
    /// Checksum mismatch
    Crc = 3,
    UnknownCmd = 4,
    BadPayload = 5,
    /// Byte or frame deadline exceeded mid-frame
    Timeout = 6,
}

impl Reason {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Reason::Ok),
            1 => Some(Reason::BadStx),
            2 => Some(Reason::BadLen),
            3 => Some(Reason::Crc),
            4 => Some(Reason::UnknownCmd),
            5 => Some(Reason::BadPayload),
            6 => Some(Reason::Timeout),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Reason::Ok => "OK",
            Reason::BadStx => "BAD_STX",
            Reason::BadLen => "BAD_LEN",
            Reason::Crc => "CRC",
            Reason::UnknownCmd => "UNKNOWN_CMD",
            Reason::BadPayload => "BAD_PAYLOAD",
            Reason::Timeout => "TIMEOUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_roundtrip() {
        let commands = [
            Command::SetSpeed,
            Command::SetMode,
            Command::Stop,
            Command::GetStat,
            Command::Ack,
            Command::Nack,
            Command::Stat,
        ];

        for cmd in commands {
            assert_eq!(Command::from_byte(cmd.to_byte()), Some(cmd));
        }
    }

    #[test]
    fn test_command_wire_values() {
        assert_eq!(Command::SetSpeed.to_byte(), 0x01);
        assert_eq!(Command::GetStat.to_byte(), 0x04);
        assert_eq!(Command::Ack.to_byte(), 0x80);
        assert_eq!(Command::Stat.to_byte(), 0x82);
    }

    #[test]
    fn test_unknown_command() {
        assert!(Command::from_byte(0x00).is_none());
        assert!(Command::from_byte(0x05).is_none());
        assert_eq!(command_name(0x55), "CMD_UNKNOWN");
        assert_eq!(command_name(0x01), "SET_SPEED");
    }

    #[test]
    fn test_is_reply() {
        assert!(Command::Nack.is_reply());
        assert!(!Command::Stop.is_reply());
    }

    #[test]
    fn test_reason_codes() {
        for byte in 0..=6u8 {
            let reason = Reason::from_byte(byte).unwrap();
            assert_eq!(reason.to_byte(), byte);
        }
        assert!(Reason::from_byte(7).is_none());
        assert_eq!(Reason::Timeout.to_byte(), 6);
        assert_eq!(Reason::default(), Reason::Ok);
        assert_eq!(Reason::Crc.name(), "CRC");
    }
}
