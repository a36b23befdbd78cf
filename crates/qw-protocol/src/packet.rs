use std::fmt;

use bytes::Bytes;

use crate::codec;
use crate::command::Command;

/// Which way a packet travels through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client -> server.
    Clc,
    /// Server -> client.
    Svc,
}

impl Direction {
    /// Length of the netchan header preceding the messages of a sequenced
    /// packet.  Clients append a 2-byte qport to the sequence/ack pair.
    pub fn header_len(self) -> usize {
        match self {
            Direction::Clc => 10,
            Direction::Svc => 8,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Clc => f.write_str("clc"),
            Direction::Svc => f.write_str("svc"),
        }
    }
}

/// A raw datagram classified by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    /// Out-of-band traffic (`0xFFFFFFFF` prefix): challenges, connect, status
    /// queries.  Relayed untouched.
    Connectionless(Bytes),
    /// In-game traffic carrying decoded messages.
    Sequenced(Packet),
}

/// A sequenced packet: the netchan header kept verbatim plus the ordered
/// list of messages it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    direction: Direction,
    header: Bytes,
    commands: Vec<Command>,
}

impl Packet {
    pub fn new(direction: Direction, header: Bytes, commands: Vec<Command>) -> Self {
        Self {
            direction,
            header,
            commands,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn header(&self) -> &Bytes {
        &self.header
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Mutable access to the message list for packet handlers.
    pub fn commands_mut(&mut self) -> &mut Vec<Command> {
        &mut self.commands
    }

    /// Size of this packet on the wire, header included.
    pub fn encoded_len(&self) -> usize {
        self.header.len() + self.commands.iter().map(codec::encoded_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Stufftext;

    #[test]
    fn header_lengths() {
        assert_eq!(Direction::Clc.header_len(), 10);
        assert_eq!(Direction::Svc.header_len(), 8);
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Clc.to_string(), "clc");
        assert_eq!(Direction::Svc.to_string(), "svc");
    }

    #[test]
    fn encoded_len_counts_header_and_commands() {
        let packet = Packet::new(
            Direction::Svc,
            Bytes::from_static(&[0; 8]),
            vec![
                Stufftext::new("echo\n").into(),
                Command::Other(Bytes::from_static(&[1, 2])),
            ],
        );
        // header + (id + "echo\n" + terminator) + raw
        assert_eq!(packet.encoded_len(), 8 + 7 + 2);
    }
}
