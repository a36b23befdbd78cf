/// Command prefixes that mark the client entering play or spectator mode.
pub const ENTER_TRIGGERS: [&str; 2] = ["on_enter", "on_spec_enter"];

/// Return the first prefix in `prefixes` that `command` starts with.
///
/// Matching is a case-sensitive literal prefix test; there are no wildcards.
/// An empty prefix list never matches.
pub fn matching_prefix<'a>(prefixes: &'a [String], command: &str) -> Option<&'a str> {
    prefixes
        .iter()
        .map(String::as_str)
        .find(|prefix| command.starts_with(prefix))
}

/// Check whether `command` signals that the client entered the game.
pub fn is_enter_trigger(command: &str) -> bool {
    ENTER_TRIGGERS
        .iter()
        .any(|trigger| command.starts_with(trigger))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ---- prefix matching ----

    #[test]
    fn prefix_exact_and_longer() {
        let allowed = prefixes(&["say"]);
        assert_eq!(matching_prefix(&allowed, "say"), Some("say"));
        assert_eq!(matching_prefix(&allowed, "say hi"), Some("say"));
        assert_eq!(matching_prefix(&allowed, "say_team hi"), Some("say"));
    }

    #[test]
    fn prefix_is_case_sensitive() {
        let allowed = prefixes(&["say"]);
        assert_eq!(matching_prefix(&allowed, "SAY hi"), None);
        assert_eq!(matching_prefix(&allowed, "Say hi"), None);
    }

    #[test]
    fn prefix_has_no_wildcards() {
        let allowed = prefixes(&["s*"]);
        assert_eq!(matching_prefix(&allowed, "say hi"), None);
        assert_eq!(matching_prefix(&allowed, "s* literal"), Some("s*"));
    }

    #[test]
    fn prefix_must_be_at_start() {
        let allowed = prefixes(&["name"]);
        assert_eq!(matching_prefix(&allowed, "setinfo name bob"), None);
    }

    #[test]
    fn empty_prefix_list_matches_nothing() {
        assert_eq!(matching_prefix(&[], "say hi"), None);
        assert_eq!(matching_prefix(&[], ""), None);
    }

    #[test]
    fn first_matching_prefix_is_reported() {
        let allowed = prefixes(&["cl_", "cl_maxfps"]);
        assert_eq!(matching_prefix(&allowed, "cl_maxfps 77"), Some("cl_"));
    }

    // ---- enter triggers ----

    #[test]
    fn enter_triggers() {
        assert!(is_enter_trigger("on_enter"));
        assert!(is_enter_trigger("on_enter_ctf"));
        assert!(is_enter_trigger("on_spec_enter"));
        assert!(is_enter_trigger("on_spec_enter foo"));
    }

    #[test]
    fn non_triggers() {
        assert!(!is_enter_trigger("on_spec"));
        assert!(!is_enter_trigger("say on_enter"));
        assert!(!is_enter_trigger("ON_ENTER"));
        assert!(!is_enter_trigger(""));
    }
}
