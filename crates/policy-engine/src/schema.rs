/// Policy configuration loaded from the `qwstfw.cfg` file.
///
/// Built once at startup and never mutated afterwards; share it between
/// connections behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Whether clients may request file downloads from the server.
    pub allow_downloads: bool,
    /// Command prefixes a server may stuff into a client, in file order.
    pub allowed_prefixes: Vec<String>,
    /// Console commands injected when the client enters play or spectator
    /// mode, in file order.
    pub alias_commands: Vec<String>,
}

impl PolicyConfig {
    /// Return this config with `allowed` OR-ed into the download toggle.
    ///
    /// Used to merge the `--allow-downloads` command-line flag, which can
    /// only widen the policy, never narrow it.
    pub fn with_downloads_allowed(mut self, allowed: bool) -> Self {
        self.allow_downloads |= allowed;
        self
    }
}
