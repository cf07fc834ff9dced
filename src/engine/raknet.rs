//! RakNet offline message codec.
//!
//! Only the unconnected exchange a Bedrock client performs before a
//! session exists is understood here:
//!
//! ```text
//! client                         server
//!   ── Unconnected Ping (0x01) ──▶
//!   ◀── Unconnected Pong (0x1c) ──   MOTD for the server list
//!   ── Open Conn. Request 1 (0x05) ─▶
//!   ◀── No Free Incoming (0x14) ───   or Incompatible Protocol (0x19)
//! ```
//!
//! All integers are big-endian.

use thiserror::Error;

/// Offline message magic carried by every unconnected datagram.
pub const OFFLINE_MAGIC: [u8; 16] = [
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

/// RakNet protocol version spoken by current Bedrock clients.
pub const RAKNET_PROTOCOL_VERSION: u8 = 11;

/// Bedrock network protocol and version advertised in the MOTD.
pub const BEDROCK_PROTOCOL: u32 = 766;
pub const BEDROCK_VERSION: &str = "1.21.50";

/// IPv4 + UDP header overhead added to the datagram length to get the MTU.
const UDP_HEADER_OVERHEAD: usize = 28;

pub const ID_UNCONNECTED_PING: u8 = 0x01;
pub const ID_UNCONNECTED_PING_OPEN_CONNECTIONS: u8 = 0x02;
pub const ID_OPEN_CONNECTION_REQUEST_1: u8 = 0x05;
pub const ID_NO_FREE_INCOMING_CONNECTIONS: u8 = 0x14;
pub const ID_INCOMPATIBLE_PROTOCOL_VERSION: u8 = 0x19;
pub const ID_UNCONNECTED_PONG: u8 = 0x1c;

/// Decoding failures. Malformed datagrams are dropped by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty datagram")]
    Empty,

    #[error("truncated message 0x{id:02x}: {len} bytes")]
    Truncated { id: u8, len: usize },

    #[error("bad offline magic in message 0x{0:02x}")]
    BadMagic(u8),

    #[error("unsupported message 0x{0:02x}")]
    Unsupported(u8),
}

/// Client-to-server offline messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineMessage {
    UnconnectedPing { ping_time: i64, client_guid: u64 },
    OpenConnectionRequest1 { protocol: u8, mtu: usize },
}

/// Decode a client datagram.
pub fn decode(datagram: &[u8]) -> Result<OfflineMessage, DecodeError> {
    let (&id, body) = datagram.split_first().ok_or(DecodeError::Empty)?;

    match id {
        ID_UNCONNECTED_PING | ID_UNCONNECTED_PING_OPEN_CONNECTIONS => {
            // time(8) + magic(16) + guid(8)
            if body.len() < 32 {
                return Err(DecodeError::Truncated { id, len: datagram.len() });
            }
            let ping_time = i64::from_be_bytes(array8(&body[0..8]));
            check_magic(id, &body[8..24])?;
            let client_guid = u64::from_be_bytes(array8(&body[24..32]));
            Ok(OfflineMessage::UnconnectedPing { ping_time, client_guid })
        }
        ID_OPEN_CONNECTION_REQUEST_1 => {
            // magic(16) + protocol(1) + zero padding up to the MTU
            if body.len() < 17 {
                return Err(DecodeError::Truncated { id, len: datagram.len() });
            }
            check_magic(id, &body[0..16])?;
            Ok(OfflineMessage::OpenConnectionRequest1 {
                protocol: body[16],
                mtu: datagram.len() + UDP_HEADER_OVERHEAD,
            })
        }
        other => Err(DecodeError::Unsupported(other)),
    }
}

fn check_magic(id: u8, bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes == OFFLINE_MAGIC {
        Ok(())
    } else {
        Err(DecodeError::BadMagic(id))
    }
}

fn array8(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}

/// Server list advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motd<'a> {
    pub headline: &'a str,
    pub server_name: &'a str,
    pub max_players: u32,
    pub server_guid: u64,
    pub port: u16,
}

impl Motd<'_> {
    /// Render the `MCPE;...` string Bedrock clients parse.
    pub fn render(&self) -> String {
        format!(
            "MCPE;{};{};{};0;{};{};{};Survival;1;{};{};",
            sanitize(self.headline),
            BEDROCK_PROTOCOL,
            BEDROCK_VERSION,
            self.max_players,
            self.server_guid,
            sanitize(self.server_name),
            self.port,
            self.port,
        )
    }
}

/// `;` separates MOTD fields.
fn sanitize(text: &str) -> String {
    text.replace(';', ",")
}

/// Encode an Unconnected Pong answering `ping_time`.
///
/// A MOTD longer than the u16 length prefix allows is cut at the last
/// character boundary that fits.
pub fn encode_pong(ping_time: i64, server_guid: u64, motd: &str) -> Vec<u8> {
    let motd = truncate_on_char_boundary(motd, u16::MAX as usize).as_bytes();
    let mut out = Vec::with_capacity(35 + motd.len());
    out.push(ID_UNCONNECTED_PONG);
    out.extend_from_slice(&ping_time.to_be_bytes());
    out.extend_from_slice(&server_guid.to_be_bytes());
    out.extend_from_slice(&OFFLINE_MAGIC);
    out.extend_from_slice(&(motd.len() as u16).to_be_bytes());
    out.extend_from_slice(motd);
    out
}

fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Encode the rejection sent in answer to an Open Connection Request 1.
///
/// Clients on another RakNet protocol get Incompatible Protocol Version,
/// everyone else No Free Incoming Connections.
pub fn encode_rejection(client_protocol: u8, server_guid: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(26);
    if client_protocol == RAKNET_PROTOCOL_VERSION {
        out.push(ID_NO_FREE_INCOMING_CONNECTIONS);
    } else {
        out.push(ID_INCOMPATIBLE_PROTOCOL_VERSION);
        out.push(RAKNET_PROTOCOL_VERSION);
    }
    out.extend_from_slice(&OFFLINE_MAGIC);
    out.extend_from_slice(&server_guid.to_be_bytes());
    out
}
