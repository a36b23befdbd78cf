use std::sync::Arc;

use policy_engine::PolicyEngine;
use qw_protocol::{args, Command, Packet, Stufftext};
use qw_proxy::{Connection, PacketHandler};
use tracing::{debug, info};

/// Result of filtering a single stufftext payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredPayload {
    /// Rewritten payload, or `None` when every command was blocked.
    pub text: Option<String>,
    /// Alias commands to queue for the client, in order.
    pub injected: Vec<Stufftext>,
}

/// Server-to-client handler enforcing the console command allow-list.
///
/// Each `svc_stufftext` payload is split into console commands.  Commands
/// whose canonical text starts with an allowed prefix are kept and joined
/// back together with `;`; the rest are dropped.  A payload left empty is
/// removed from the packet altogether.
///
/// Enter triggers (`on_enter`, `on_spec_enter`) queue every configured alias
/// command whether or not the trigger itself is allowed through.
#[derive(Debug, Clone)]
pub struct StufftextFilter {
    engine: Arc<PolicyEngine>,
    verbose: bool,
}

impl StufftextFilter {
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self {
            engine,
            verbose: false,
        }
    }

    /// Log every allow/block decision at `info` instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Filter one stufftext payload against the policy.
    pub fn filter_payload(&self, text: &str) -> FilteredPayload {
        let mut retained = Vec::new();
        let mut injected = Vec::new();

        for sub in args::parse(text) {
            let command = sub.canonical();
            let decision = self.engine.evaluate(&command);

            if decision.triggers_aliases {
                injected.extend(
                    self.engine
                        .alias_commands()
                        .iter()
                        .map(|alias| Stufftext::new(format!("{alias}\n"))),
                );
            }

            if self.verbose {
                info!(command = %command, allowed = decision.is_allowed(), "stufftext command");
            } else {
                debug!(command = %command, allowed = decision.is_allowed(), "stufftext command");
            }

            if decision.is_allowed() {
                retained.push(command);
            }
        }

        let text = if retained.is_empty() {
            None
        } else {
            Some(format!("{}\n", retained.join(";")))
        };

        FilteredPayload { text, injected }
    }
}

impl PacketHandler for StufftextFilter {
    fn handle(&self, conn: &mut Connection, packet: &mut Packet) {
        let commands = std::mem::take(packet.commands_mut());
        let mut retained = Vec::with_capacity(commands.len());

        for cmd in commands {
            let stufftext = match cmd {
                Command::Stufftext(stufftext) => stufftext,
                other => {
                    retained.push(other);
                    continue;
                }
            };

            let filtered = self.filter_payload(&stufftext.text);
            if !filtered.injected.is_empty() {
                debug!(
                    connection_id = %conn.id,
                    count = filtered.injected.len(),
                    "enter trigger seen, queueing aliases"
                );
                conn.inject().enqueue(filtered.injected);
            }

            match filtered.text {
                Some(text) => retained.push(Stufftext::new(text).into()),
                None => debug!(connection_id = %conn.id, "dropping fully blocked stufftext"),
            }
        }

        *packet.commands_mut() = retained;
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use policy_engine::loader::load_policy_from_str;
    use qw_protocol::{decode_datagram, encode_datagram, Datagram, Direction};

    use super::*;

    fn filter(cfg: &str) -> StufftextFilter {
        StufftextFilter::new(Arc::new(PolicyEngine::new(load_policy_from_str(cfg))))
    }

    fn svc_packet(commands: Vec<Command>) -> Packet {
        Packet::new(Direction::Svc, Bytes::from_static(&[0; 8]), commands)
    }

    fn conn() -> Connection {
        Connection::new("127.0.0.1:27001".parse().unwrap())
    }

    fn pending_texts(conn: &Connection) -> Vec<String> {
        conn.pending()
            .iter()
            .map(|cmd| match cmd {
                Command::Stufftext(st) => st.text.clone(),
                other => panic!("unexpected queued command {:?}", other),
            })
            .collect()
    }

    #[test]
    fn blocked_commands_are_cut_from_payload() {
        let f = filter("[commands]\nsay\nname\n");
        let out = f.filter_payload("say hi;rm -rf /;name bob");
        assert_eq!(out.text.as_deref(), Some("say hi;name bob\n"));
        assert!(out.injected.is_empty());
    }

    #[test]
    fn fully_blocked_stufftext_is_removed() {
        let f = filter("[commands]\nsay\n");
        let mut conn = conn();
        let mut packet = svc_packet(vec![
            Command::Other(Bytes::from_static(&[1])),
            Stufftext::new("rm -rf /;quit\n").into(),
            Stufftext::new("say ok\n").into(),
        ]);

        f.handle(&mut conn, &mut packet);

        assert_eq!(
            packet.commands(),
            &[
                Command::Other(Bytes::from_static(&[1])),
                Stufftext::new("say ok\n").into(),
            ]
        );
        assert!(conn.pending().is_empty());
    }

    #[test]
    fn trigger_queues_aliases_even_when_blocked() {
        let f = filter("[aliases]\n+jump\nbind space +jump\n[commands]\nsay\n");
        let mut conn = conn();
        let mut packet = svc_packet(vec![Stufftext::new("on_enter\n").into()]);

        f.handle(&mut conn, &mut packet);

        assert!(packet.commands().is_empty());
        assert_eq!(pending_texts(&conn), vec!["+jump\n", "bind space +jump\n"]);
    }

    #[test]
    fn allowed_trigger_is_kept_and_queues_aliases() {
        let f = filter("[aliases]\nexec user.cfg\n[commands]\non_spec_enter\n");
        let out = f.filter_payload("on_spec_enter");
        assert_eq!(out.text.as_deref(), Some("on_spec_enter\n"));
        assert_eq!(out.injected, vec![Stufftext::new("exec user.cfg\n")]);
    }

    #[test]
    fn repeated_triggers_each_queue_full_alias_list() {
        let f = filter("[aliases]\na1\na2\n");
        let out = f.filter_payload("on_enter;on_spec_enter");
        assert_eq!(out.text, None);
        assert_eq!(
            out.injected,
            vec![
                Stufftext::new("a1\n"),
                Stufftext::new("a2\n"),
                Stufftext::new("a1\n"),
                Stufftext::new("a2\n"),
            ]
        );
    }

    #[test]
    fn trigger_without_aliases_queues_nothing() {
        let f = filter("[commands]\nsay\n");
        let out = f.filter_payload("on_enter;say hi");
        assert_eq!(out.text.as_deref(), Some("say hi\n"));
        assert!(out.injected.is_empty());
    }

    #[test]
    fn empty_allow_list_blocks_everything() {
        let f = filter("");
        assert_eq!(f.filter_payload("say hi;name bob\n").text, None);
        assert_eq!(f.filter_payload("").text, None);
    }

    #[test]
    fn whitespace_is_canonicalised() {
        let f = filter("[commands]\nsay\n");
        let out = f.filter_payload("  say   \"hello   there\"  \n");
        assert_eq!(out.text.as_deref(), Some("say \"hello   there\"\n"));
    }

    #[test]
    fn quake_high_bit_text_is_kept_verbatim() {
        let f = filter("[commands]\nname\n");
        let out = f.filter_payload("name a\u{a0}b\n");
        assert_eq!(out.text.as_deref(), Some("name a\u{a0}b\n"));
    }

    #[test]
    fn stufftext_behind_other_messages_is_filtered_on_the_wire() {
        let f = filter("[commands]\nsay\n");
        let mut conn = conn();
        // svc_setangle, svc_stufftext "quit", svc_stufftext "say hi"
        let data = Bytes::from_static(
            b"\x01\x00\x00\x80\x01\x00\x00\x00\x0a\x01\x02\x03\x09quit\n\x00\x09say hi\n\x00",
        );

        let mut packet = match decode_datagram(Direction::Svc, data) {
            Ok(Datagram::Sequenced(packet)) => packet,
            other => panic!("unexpected decode result {:?}", other),
        };
        f.handle(&mut conn, &mut packet);

        assert_eq!(
            encode_datagram(&Datagram::Sequenced(packet)).as_ref(),
            b"\x01\x00\x00\x80\x01\x00\x00\x00\x0a\x01\x02\x03\x09say hi\n\x00"
        );
    }

    #[test]
    fn refiltering_is_idempotent() {
        let f = filter("[commands]\nsay\nname\ncolor\n");
        let payloads = [
            "say hi;rm -rf /;name bob",
            "color 4 4\nsay \"a;b\"\n",
            "name  \"unterminated",
        ];
        for payload in payloads {
            let once = f.filter_payload(payload).text.unwrap();
            let twice = f.filter_payload(&once).text.unwrap();
            assert_eq!(once, twice, "payload {payload:?}");
        }
    }

    #[test]
    fn non_stufftext_commands_are_untouched() {
        let f = filter("");
        let mut conn = conn();
        let commands = vec![
            Command::Other(Bytes::from_static(&[8, 2, b'h', b'i', 0])),
            qw_protocol::StringCmd::new("say hi").into(),
        ];
        let mut packet = svc_packet(commands.clone());

        f.handle(&mut conn, &mut packet);

        assert_eq!(packet.commands(), commands.as_slice());
    }
}
