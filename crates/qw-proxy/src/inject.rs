use std::collections::VecDeque;

use qw_protocol::{Command, Direction, Packet, MAX_DATAGRAM};
use tracing::warn;

/// Per-connection mailbox of commands waiting to be sent to the client.
///
/// Strictly FIFO and unbounded: commands are never reordered, merged or
/// deduplicated. Packet handlers append to it while processing one packet;
/// the relay drains it into the next server-to-client datagram.
#[derive(Debug, Default)]
pub struct InjectionQueue {
    pending: VecDeque<Command>,
}

impl InjectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `commands` to the end of the queue, preserving their order.
    pub fn enqueue<I>(&mut self, commands: I)
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        self.pending.extend(commands.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterate over the pending commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.pending.iter()
    }

    /// Move as many queued commands as fit within [`MAX_DATAGRAM`] onto the
    /// end of `packet`, oldest first, and return how many were moved.
    ///
    /// Stops at the first command that does not fit so that order is kept;
    /// the rest wait for the next packet. A command too large for any
    /// datagram is discarded. Only server-to-client packets are filled.
    pub fn flush_into(&mut self, packet: &mut Packet) -> usize {
        if packet.direction() != Direction::Svc {
            return 0;
        }

        let mut size = packet.encoded_len();
        let mut moved = 0;

        while let Some(cmd) = self.pending.front() {
            let len = qw_protocol::codec::encoded_len(cmd);

            if packet.header().len() + len > MAX_DATAGRAM {
                warn!(len, "injected command exceeds datagram size; discarding");
                self.pending.pop_front();
                continue;
            }
            if size + len > MAX_DATAGRAM {
                break;
            }

            if let Some(cmd) = self.pending.pop_front() {
                packet.commands_mut().push(cmd);
                size += len;
                moved += 1;
            }
        }

        moved
    }
}
