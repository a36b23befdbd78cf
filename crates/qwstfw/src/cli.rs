use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qwstfw", version, about = "QuakeWorld stufftext firewall")]
pub struct Cli {
    /// Address to accept client datagrams on
    #[arg(long, default_value = "localhost:27500")]
    pub listen_addr: String,

    /// Address of the QuakeWorld server to relay to
    #[arg(long)]
    pub upstream: String,

    /// Path to the policy file
    #[arg(short, long, default_value = "qwstfw.cfg")]
    pub config_file: PathBuf,

    /// Let clients download files regardless of the policy file
    #[arg(long)]
    pub allow_downloads: bool,

    /// Log every stufftext allow/block decision
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["qwstfw", "--upstream", "qw.example.org:27500"]).unwrap();
        assert_eq!(cli.listen_addr, "localhost:27500");
        assert_eq!(cli.upstream, "qw.example.org:27500");
        assert_eq!(cli.config_file, PathBuf::from("qwstfw.cfg"));
        assert!(!cli.allow_downloads);
        assert!(!cli.verbose);
        assert!(!cli.json_logs);
    }

    #[test]
    fn upstream_is_required() {
        assert!(Cli::try_parse_from(["qwstfw"]).is_err());
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "qwstfw",
            "--upstream",
            "10.0.0.1:27500",
            "--listen-addr",
            "0.0.0.0:28000",
            "-c",
            "/etc/qwstfw.cfg",
            "--allow-downloads",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.listen_addr, "0.0.0.0:28000");
        assert_eq!(cli.config_file, PathBuf::from("/etc/qwstfw.cfg"));
        assert!(cli.allow_downloads);
        assert!(cli.verbose);
    }
}
