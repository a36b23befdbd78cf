use std::net::SocketAddr;
use std::sync::Arc;

use qw_protocol::{Direction, Packet};

use crate::inject::InjectionQueue;

/// Per-client state owned by the session task and handed to handlers.
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this client session.
    pub id: uuid::Uuid,
    /// The UDP address of the client.
    pub remote_addr: SocketAddr,
    inject: InjectionQueue,
}

impl Connection {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            remote_addr,
            inject: InjectionQueue::new(),
        }
    }

    /// Commands waiting to be delivered to the client.
    pub fn inject(&mut self) -> &mut InjectionQueue {
        &mut self.inject
    }

    pub fn pending(&self) -> &InjectionQueue {
        &self.inject
    }
}

/// Trait for synchronous packet mutation.
///
/// Implementors examine the decoded messages of one packet and may remove or
/// rewrite entries in place. New messages for the client must go through the
/// connection's [`InjectionQueue`], never into the packet itself.
///
/// Handlers run on the session task between receiving and forwarding a
/// datagram, so they must not block or perform I/O.
pub trait PacketHandler: Send + Sync {
    fn handle(&self, conn: &mut Connection, packet: &mut Packet);
}

impl<F> PacketHandler for F
where
    F: Fn(&mut Connection, &mut Packet) + Send + Sync,
{
    fn handle(&self, conn: &mut Connection, packet: &mut Packet) {
        self(conn, packet)
    }
}

/// Handlers registered per packet direction, run in registration order.
#[derive(Clone, Default)]
pub struct Handlers {
    clc: Vec<Arc<dyn PacketHandler>>,
    svc: Vec<Arc<dyn PacketHandler>>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for packets travelling in `direction`.
    pub fn handle_func(
        &mut self,
        direction: Direction,
        handler: impl PacketHandler + 'static,
    ) -> &mut Self {
        self.for_direction_mut(direction).push(Arc::new(handler));
        self
    }

    /// Number of handlers registered for `direction`.
    pub fn len(&self, direction: Direction) -> usize {
        self.for_direction(direction).len()
    }

    /// Run every handler registered for the packet's direction.
    pub fn dispatch(&self, conn: &mut Connection, packet: &mut Packet) {
        for handler in self.for_direction(packet.direction()) {
            handler.handle(conn, packet);
        }
    }

    fn for_direction(&self, direction: Direction) -> &[Arc<dyn PacketHandler>] {
        match direction {
            Direction::Clc => &self.clc,
            Direction::Svc => &self.svc,
        }
    }

    fn for_direction_mut(&mut self, direction: Direction) -> &mut Vec<Arc<dyn PacketHandler>> {
        match direction {
            Direction::Clc => &mut self.clc,
            Direction::Svc => &mut self.svc,
        }
    }
}
