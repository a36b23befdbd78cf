use tracing::trace;

use crate::decision::{PolicyDecision, ResolvedAction};
use crate::matcher::{is_enter_trigger, matching_prefix};
use crate::schema::PolicyConfig;

/// The policy evaluation engine.
///
/// Holds the immutable [`PolicyConfig`] and answers pure queries about single
/// console commands.  Every method is total over any input string and free of
/// side effects other than trace logging.
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("allow_downloads", &self.config.allow_downloads)
            .field("num_allowed_prefixes", &self.config.allowed_prefixes.len())
            .field("num_alias_commands", &self.config.alias_commands.len())
            .finish()
    }
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Return a reference to the underlying config.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn allows_downloads(&self) -> bool {
        self.config.allow_downloads
    }

    /// Alias commands to inject on an enter trigger, in configured order.
    pub fn alias_commands(&self) -> &[String] {
        &self.config.alias_commands
    }

    /// `true` iff `command` starts with one of the allowed prefixes.
    pub fn is_allowed(&self, command: &str) -> bool {
        matching_prefix(&self.config.allowed_prefixes, command).is_some()
    }

    /// `true` iff `command` starts with `on_enter` or `on_spec_enter`.
    pub fn is_trigger(&self, command: &str) -> bool {
        is_enter_trigger(command)
    }

    /// Evaluate a canonical console command against the policy.
    pub fn evaluate(&self, command: &str) -> PolicyDecision {
        let matched_prefix = matching_prefix(&self.config.allowed_prefixes, command);
        let action = if matched_prefix.is_some() {
            ResolvedAction::Allow
        } else {
            ResolvedAction::Block
        };
        let triggers_aliases = is_enter_trigger(command);

        trace!(command, ?action, ?matched_prefix, triggers_aliases, "evaluated command");

        PolicyDecision {
            action,
            matched_prefix: matched_prefix.map(str::to_string),
            triggers_aliases,
        }
    }
}
