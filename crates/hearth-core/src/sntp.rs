//! Minimal SNTPv4 client packets (RFC 4330)
//!
//! Only what a display clock needs: build a client request and pull the
//! server's transmit timestamp out of the reply. Round-trip delay is not
//! compensated; a few hundred milliseconds do not show on an HH:MM face.

use thiserror_no_std::Error;

/// UDP port servers listen on
pub const NTP_PORT: u16 = 123;

pub const PACKET_LEN: usize = 48;

/// Seconds from the NTP era (1900-01-01) to the unix epoch
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

const VERSION: u8 = 4;
const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const LEAP_UNSYNCHRONIZED: u8 = 3;

const TRANSMIT_TIMESTAMP: usize = 40;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    #[error("Reply is {0} bytes, expected at least 48")]
    Truncated(usize),
    #[error("Reply has mode {0}, expected server")]
    UnexpectedMode(u8),
    #[error("Server sent a kiss-o'-death or is unsynchronized")]
    Unsynchronized,
    #[error("Reply carries no transmit timestamp")]
    MissingTimestamp,
}

/// Client request: LI 0, version 4, mode 3, everything else zero.
pub fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Server reply reduced to what the clock uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SntpReply {
    pub stratum: u8,
    /// Transmit timestamp, whole seconds since the unix epoch
    pub unix_secs: u64,
    /// Fractional part of the transmit timestamp in milliseconds
    pub millis: u16,
}

/// Validate a reply and extract the server's transmit time.
pub fn parse(reply: &[u8]) -> Result<SntpReply, SntpError> {
    if reply.len() < PACKET_LEN {
        return Err(SntpError::Truncated(reply.len()));
    }

    let leap = reply[0] >> 6;
    let mode = reply[0] & 0x07;
    let stratum = reply[1];

    if mode != MODE_SERVER {
        return Err(SntpError::UnexpectedMode(mode));
    }
    if stratum == 0 || leap == LEAP_UNSYNCHRONIZED {
        return Err(SntpError::Unsynchronized);
    }

    let seconds = read_u32(reply, TRANSMIT_TIMESTAMP) as u64;
    let fraction = read_u32(reply, TRANSMIT_TIMESTAMP + 4) as u64;
    if seconds == 0 && fraction == 0 {
        return Err(SntpError::MissingTimestamp);
    }

    Ok(SntpReply {
        stratum,
        // Era 0 ends in 2036; values below the offset belong to era 1
        unix_secs: if seconds >= NTP_UNIX_OFFSET {
            seconds - NTP_UNIX_OFFSET
        } else {
            seconds + (1u64 << 32) - NTP_UNIX_OFFSET
        },
        millis: ((fraction * 1_000) >> 32) as u16,
    })
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(stratum: u8, seconds: u32, fraction: u32) -> [u8; PACKET_LEN] {
        let mut packet = [0u8; PACKET_LEN];
        packet[0] = (VERSION << 3) | MODE_SERVER;
        packet[1] = stratum;
        packet[40..44].copy_from_slice(&seconds.to_be_bytes());
        packet[44..48].copy_from_slice(&fraction.to_be_bytes());
        packet
    }

    #[test]
    fn test_request_header() {
        let packet = request();
        assert_eq!(packet[0], 0x23);
        assert!(packet[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_converts_to_unix() {
        // 2025-08-19 18:05:00 UTC
        let unix = 1_755_626_700u64;
        let parsed = parse(&reply(2, (unix + NTP_UNIX_OFFSET) as u32, 1 << 31)).unwrap();
        assert_eq!(parsed.unix_secs, unix);
        assert_eq!(parsed.millis, 500);
        assert_eq!(parsed.stratum, 2);
    }

    #[test]
    fn test_parse_handles_era_rollover() {
        // Ten seconds into NTP era 1 (2036-02-07)
        let parsed = parse(&reply(1, 10, 0)).unwrap();
        assert_eq!(parsed.unix_secs, (1u64 << 32) + 10 - NTP_UNIX_OFFSET);
    }

    #[test]
    fn test_parse_rejects_bad_replies() {
        assert_eq!(parse(&[0u8; 12]), Err(SntpError::Truncated(12)));

        let mut client_echo = reply(2, 3_900_000_000, 0);
        client_echo[0] = 0x23;
        assert_eq!(parse(&client_echo), Err(SntpError::UnexpectedMode(3)));

        assert_eq!(
            parse(&reply(0, 3_900_000_000, 0)),
            Err(SntpError::Unsynchronized)
        );

        let mut alarm = reply(2, 3_900_000_000, 0);
        alarm[0] |= 0b1100_0000;
        assert_eq!(parse(&alarm), Err(SntpError::Unsynchronized));

        assert_eq!(parse(&reply(2, 0, 0)), Err(SntpError::MissingTimestamp));
    }
}
