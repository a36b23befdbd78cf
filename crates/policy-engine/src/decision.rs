/// The outcome of evaluating one console command against the loaded policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Whether the command may reach the client.
    pub action: ResolvedAction,
    /// The allow-list prefix that matched, if any.
    pub matched_prefix: Option<String>,
    /// Whether the command should cause the alias commands to be injected.
    ///
    /// Independent of `action`: a blocked trigger still injects.
    pub triggers_aliases: bool,
}

/// What the filter should do with a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAction {
    /// Keep the command in the rewritten payload.
    Allow,
    /// Drop the command from the payload.
    Block,
}

impl PolicyDecision {
    /// Returns `true` if the command survives filtering.
    pub fn is_allowed(&self) -> bool {
        self.action == ResolvedAction::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_decision_is_allowed() {
        let d = PolicyDecision {
            action: ResolvedAction::Allow,
            matched_prefix: Some("say".to_string()),
            triggers_aliases: false,
        };
        assert!(d.is_allowed());
    }

    #[test]
    fn block_decision_is_not_allowed() {
        let d = PolicyDecision {
            action: ResolvedAction::Block,
            matched_prefix: None,
            triggers_aliases: true,
        };
        assert!(!d.is_allowed());
    }
}
