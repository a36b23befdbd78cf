use qw_protocol::{Command, Packet, Stufftext};
use qw_proxy::{Connection, PacketHandler};
use tracing::info;

/// Console text that starts a client-initiated download.
const DOWNLOAD_PREFIX: &str = "download ";

/// Stuffed into the client after a blocked download request.
pub const BLOCK_NOTICE: &str = "echo The download has been blocked by qwstfw\n";

/// Stuffed into the client right after [`BLOCK_NOTICE`].
pub const FORCED_DISCONNECT: &str = "disconnect\n";

/// Check whether a client string command requests a download.
///
/// A literal prefix match, so anything starting with `"download "` counts.
pub fn is_download_request(text: &str) -> bool {
    text.starts_with(DOWNLOAD_PREFIX)
}

/// Client-to-server handler that blocks download requests.
///
/// Every `clc_stringcmd` starting with `"download "` is removed from the
/// packet, and a block notice followed by a forced disconnect is queued for
/// the client.  Each request gets its own pair; nothing is deduplicated.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadGuard;

impl DownloadGuard {
    pub fn new() -> Self {
        Self
    }
}

impl PacketHandler for DownloadGuard {
    fn handle(&self, conn: &mut Connection, packet: &mut Packet) {
        let commands = std::mem::take(packet.commands_mut());
        let mut retained = Vec::with_capacity(commands.len());

        for cmd in commands {
            match cmd {
                Command::StringCmd(cmd) if is_download_request(&cmd.text) => {
                    info!(
                        connection_id = %conn.id,
                        remote_addr = %conn.remote_addr,
                        command = %cmd.text,
                        "blocking download request"
                    );
                    conn.inject().enqueue([
                        Stufftext::new(BLOCK_NOTICE),
                        Stufftext::new(FORCED_DISCONNECT),
                    ]);
                }
                other => retained.push(other),
            }
        }

        *packet.commands_mut() = retained;
    }
}
