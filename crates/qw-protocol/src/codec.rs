//! Datagram codec.
//!
//! ## Wire format
//! ```text
//! connectionless:  [FF FF FF FF] [payload...]
//! server->client:  [sequence(4)] [ack(4)]            [messages...]
//! client->server:  [sequence(4)] [ack(4)] [qport(2)] [messages...]
//!
//! message:         [id(1)] [body...]
//! string:          [bytes...] [00]
//! ```
//!
//! Strings are 8-bit Quake text.  Each byte is mapped to the `char` with the
//! same code point so that decoding then encoding never changes a byte.

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{Command, StringCmd, Stufftext};
use crate::layout::{clc_message_len, svc_message_len};
use crate::packet::{Datagram, Direction, Packet};

pub use crate::layout::{clc, svc};

/// Largest datagram the proxy will build when appending injected commands.
pub const MAX_DATAGRAM: usize = 1450;

const CONNECTIONLESS_MARKER: [u8; 4] = [0xff; 4];

/// Errors produced while classifying a datagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{direction} datagram of {len} bytes is shorter than its {expected}-byte header")]
    ShortHeader {
        direction: Direction,
        len: usize,
        expected: usize,
    },
}

/// Classify and decode one datagram travelling in `direction`.
///
/// Never fails on message content: anything the codec does not understand
/// ends up in a trailing [`Command::Other`].
pub fn decode_datagram(direction: Direction, data: Bytes) -> Result<Datagram, DecodeError> {
    if data.starts_with(&CONNECTIONLESS_MARKER) {
        return Ok(Datagram::Connectionless(data));
    }

    let expected = direction.header_len();
    if data.len() < expected {
        return Err(DecodeError::ShortHeader {
            direction,
            len: data.len(),
            expected,
        });
    }

    let header = data.slice(..expected);
    let commands = decode_messages(direction, data.slice(expected..));
    Ok(Datagram::Sequenced(Packet::new(direction, header, commands)))
}

/// Encode a datagram back into wire bytes.
pub fn encode_datagram(datagram: &Datagram) -> Bytes {
    match datagram {
        Datagram::Connectionless(data) => data.clone(),
        Datagram::Sequenced(packet) => encode_packet(packet),
    }
}

fn encode_packet(packet: &Packet) -> Bytes {
    let mut buf = BytesMut::with_capacity(packet.encoded_len());
    buf.put_slice(packet.header());
    for cmd in packet.commands() {
        encode_command(cmd, &mut buf);
    }
    buf.freeze()
}

/// Append the wire form of `cmd` to `buf`.
pub fn encode_command(cmd: &Command, buf: &mut BytesMut) {
    match cmd {
        Command::StringCmd(StringCmd { text }) => {
            buf.put_u8(clc::STRINGCMD);
            put_string(buf, text);
        }
        Command::Stufftext(Stufftext { text }) => {
            buf.put_u8(svc::STUFFTEXT);
            put_string(buf, text);
        }
        Command::Other(raw) => buf.put_slice(raw),
    }
}

/// Number of bytes [`encode_command`] writes for `cmd`.
pub fn encoded_len(cmd: &Command) -> usize {
    match cmd {
        Command::StringCmd(StringCmd { text }) | Command::Stufftext(Stufftext { text }) => {
            1 + string_len(text) + 1
        }
        Command::Other(raw) => raw.len(),
    }
}

fn decode_messages(direction: Direction, body: Bytes) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut pos = 0;

    while pos < body.len() {
        let rest = &body[pos..];
        let len = match direction {
            Direction::Svc => svc_message_len(rest),
            Direction::Clc => clc_message_len(rest),
        };

        let Some(len) = len else {
            commands.push(Command::Other(body.slice(pos..)));
            break;
        };

        let raw = body.slice(pos..pos + len);
        commands.push(match (direction, raw[0]) {
            (Direction::Svc, svc::STUFFTEXT) => Stufftext::new(get_string(&raw[1..])).into(),
            (Direction::Clc, clc::STRINGCMD) => StringCmd::new(get_string(&raw[1..])).into(),
            _ => Command::Other(raw),
        });
        pos += len;
    }

    commands
}

/// Decode a null-terminated string; `raw` must contain the terminator.
fn get_string(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn put_string(buf: &mut BytesMut, text: &str) {
    for ch in text.chars() {
        match u8::try_from(ch) {
            Ok(0) => {}
            Ok(b) => buf.put_u8(b),
            Err(_) => {
                let mut utf8 = [0u8; 4];
                buf.put_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.put_u8(0);
}

fn string_len(text: &str) -> usize {
    text.chars()
        .map(|ch| match u8::try_from(ch) {
            Ok(0) => 0,
            Ok(_) => 1,
            Err(_) => ch.len_utf8(),
        })
        .sum()
}
