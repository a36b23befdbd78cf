use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use qw_protocol::{decode_datagram, encode_datagram, Datagram, Direction};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::relay::{Connection, Handlers};

/// Sessions without traffic in either direction for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Datagrams buffered per session before new client packets are dropped.
const SESSION_BUFFER: usize = 256;

/// Receive buffer size; larger than any datagram QuakeWorld sends.
const RECV_BUFFER: usize = 8192;

/// Sender half of a running session, tagged with its connection id so a
/// late close notice cannot remove a newer session for the same address.
struct Session {
    id: Uuid,
    tx: mpsc::Sender<Bytes>,
}

type Sessions = HashMap<SocketAddr, Session>;

/// Drop the session for `addr` if it is still the one identified by `id`.
fn remove_session(sessions: &mut Sessions, addr: SocketAddr, id: Uuid) -> bool {
    match sessions.get(&addr) {
        Some(session) if session.id == id => {
            sessions.remove(&addr);
            true
        }
        _ => false,
    }
}

/// Configuration for the UDP relay.
pub struct ProxyConfig {
    /// Address to bind the client-facing socket to (`host:port`).
    pub listen_addr: String,
    /// Address of the upstream QuakeWorld server (`host:port`).
    pub upstream_addr: String,
    /// Packet handlers run on every sequenced datagram.
    pub handlers: Handlers,
}

/// The QuakeWorld relay server.
///
/// Accepts datagrams from any client, opens a dedicated upstream socket per
/// client address and relays packets in both directions while running each
/// sequenced packet through the registered [`Handlers`].
pub struct Proxy {
    config: Arc<ProxyConfig>,
    socket: Arc<UdpSocket>,
}

impl Proxy {
    /// Bind the client-facing socket.
    pub async fn bind(config: ProxyConfig) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;

        Ok(Self {
            config: Arc::new(config),
            socket: Arc::new(socket),
        })
    }

    /// The address the proxy is listening on.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the relay.
    ///
    /// Loops forever routing client datagrams to their session task. Each
    /// session runs in its own Tokio task and ends after
    /// [`SESSION_IDLE_TIMEOUT`] without traffic.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            upstream = %self.config.upstream_addr,
            "qw-proxy listening"
        );

        let mut sessions = Sessions::new();
        let (closed_tx, mut closed_rx) = mpsc::unbounded_channel::<(SocketAddr, Uuid)>();
        let mut buf = vec![0u8; RECV_BUFFER];

        loop {
            tokio::select! {
                recv = self.socket.recv_from(&mut buf) => {
                    let (len, remote_addr) = match recv {
                        Ok(r) => r,
                        Err(err) => {
                            // ICMP errors from earlier sends surface here on
                            // some platforms; they do not affect the socket.
                            debug!(%err, "client socket receive error");
                            continue;
                        }
                    };
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    self.route(&mut sessions, &closed_tx, remote_addr, data);
                }
                Some((addr, id)) = closed_rx.recv() => {
                    if remove_session(&mut sessions, addr, id) {
                        debug!(remote_addr = %addr, active = sessions.len(), "session removed");
                    }
                }
            }
        }
    }

    /// Hand a client datagram to its session, starting one if needed.
    fn route(
        &self,
        sessions: &mut Sessions,
        closed_tx: &mpsc::UnboundedSender<(SocketAddr, Uuid)>,
        remote_addr: SocketAddr,
        data: Bytes,
    ) {
        let data = match sessions.get(&remote_addr) {
            Some(session) => match session.tx.try_send(data) {
                Ok(()) => return,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%remote_addr, "session backlog full; dropping datagram");
                    return;
                }
                // The session ended but its removal has not been processed yet.
                Err(mpsc::error::TrySendError::Closed(data)) => data,
            },
            None => data,
        };

        let conn = Connection::new(remote_addr);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        // Capacity is fresh, so this cannot fail.
        let _ = tx.try_send(data);
        sessions.insert(remote_addr, Session { id: conn.id, tx });

        let client_socket = Arc::clone(&self.socket);
        let config = Arc::clone(&self.config);
        let closed_tx = closed_tx.clone();

        tokio::spawn(async move {
            let connection_id = conn.id;
            if let Err(err) = run_session(client_socket, conn, config, rx).await {
                error!(%connection_id, %remote_addr, err = %format!("{err:#}"), "session error");
            }
            let _ = closed_tx.send((remote_addr, connection_id));
        });
    }
}

/// Relay one client's traffic until it goes idle or the upstream fails.
async fn run_session(
    client_socket: Arc<UdpSocket>,
    mut conn: Connection,
    config: Arc<ProxyConfig>,
    mut from_client: mpsc::Receiver<Bytes>,
) -> anyhow::Result<()> {
    let upstream = connect_upstream(&config.upstream_addr).await?;

    info!(
        connection_id = %conn.id,
        remote_addr = %conn.remote_addr,
        upstream = %config.upstream_addr,
        "client connected"
    );

    let mut buf = vec![0u8; RECV_BUFFER];

    loop {
        tokio::select! {
            Some(data) = from_client.recv() => {
                let out = process_datagram(Direction::Clc, data, &mut conn, &config.handlers);
                upstream
                    .send(&out)
                    .await
                    .context("failed to send to upstream")?;
            }
            recv = upstream.recv(&mut buf) => {
                let len = recv.context("failed to receive from upstream")?;
                let data = Bytes::copy_from_slice(&buf[..len]);
                let out = process_datagram(Direction::Svc, data, &mut conn, &config.handlers);
                client_socket
                    .send_to(&out, conn.remote_addr)
                    .await
                    .context("failed to send to client")?;
            }
            _ = tokio::time::sleep(SESSION_IDLE_TIMEOUT) => {
                info!(
                    connection_id = %conn.id,
                    remote_addr = %conn.remote_addr,
                    "session idle, closing"
                );
                return Ok(());
            }
        }
    }
}

async fn connect_upstream(upstream_addr: &str) -> anyhow::Result<UdpSocket> {
    let target = tokio::net::lookup_host(upstream_addr)
        .await
        .with_context(|| format!("failed to resolve upstream {upstream_addr}"))?
        .next()
        .with_context(|| format!("upstream {upstream_addr} resolved to no address"))?;

    let local: SocketAddr = if target.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };

    let socket = UdpSocket::bind(local)
        .await
        .context("failed to bind upstream socket")?;
    socket
        .connect(target)
        .await
        .with_context(|| format!("failed to connect to upstream {target}"))?;
    Ok(socket)
}

/// Decode, run handlers, drain the injection queue and re-encode.
///
/// Anything that is not a sequenced packet is forwarded unchanged.
fn process_datagram(
    direction: Direction,
    data: Bytes,
    conn: &mut Connection,
    handlers: &Handlers,
) -> Bytes {
    let mut packet = match decode_datagram(direction, data.clone()) {
        Ok(Datagram::Sequenced(packet)) => packet,
        Ok(Datagram::Connectionless(_)) => return data,
        Err(err) => {
            debug!(connection_id = %conn.id, %err, "forwarding undecodable datagram");
            return data;
        }
    };

    handlers.dispatch(conn, &mut packet);

    let injected = conn.inject().flush_into(&mut packet);
    if injected > 0 {
        debug!(
            connection_id = %conn.id,
            injected,
            pending = conn.pending().len(),
            "injected queued commands"
        );
    }

    encode_datagram(&Datagram::Sequenced(packet))
}
