//! Command-line interface

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Keep the A and AAAA records of a Cloudflare zone pointed at this host
#[derive(Parser, Debug)]
#[command(name = "cfsync")]
#[command(version)]
#[command(about = "Update Cloudflare DNS records with this host's current addresses", long_about = None)]
pub struct Args {
    /// Domain (zone name) to update, e.g. example.com
    pub domain: String,

    /// Cloudflare account email
    #[arg(short, long)]
    pub email: Option<String>,

    /// Configuration file [default: ~/.cloudflare/config]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Network interface to take the IPv6 address from
    #[arg(short, long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Show what would change without modifying any record
    #[arg(short, long)]
    pub dry_run: bool,

    /// Add AAAA records for names that only have an A record
    #[arg(short, long)]
    pub add_aaaa: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Send the email report even if nothing changed
    #[arg(short, long)]
    pub force_report: bool,

    /// Email the run report to this address
    #[arg(short, long, value_name = "ADDR")]
    pub mail_to: Option<String>,

    /// Sender address for the report [default: root@<hostname>]
    #[arg(long, value_name = "ADDR")]
    pub mail_from: Option<String>,
}

impl Args {
    /// Log level selected by `--verbose` / `--quiet` (verbose wins)
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "cfsync", "example.com", "-e", "me@example.com", "-i", "eth0", "-d", "-a", "-f",
            "-m", "ops@example.com",
        ])
        .unwrap();

        assert_eq!(args.domain, "example.com");
        assert_eq!(args.email.as_deref(), Some("me@example.com"));
        assert_eq!(args.interface.as_deref(), Some("eth0"));
        assert!(args.dry_run);
        assert!(args.add_aaaa);
        assert!(args.force_report);
        assert_eq!(args.mail_to.as_deref(), Some("ops@example.com"));
        assert_eq!(args.mail_from, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_domain_is_required() {
        assert!(Args::try_parse_from(["cfsync"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["cfsync", "example.com"];
            argv.extend_from_slice(extra);
            Args::try_parse_from(argv).unwrap().log_level()
        };

        assert_eq!(parse(&[]), Level::INFO);
        assert_eq!(parse(&["-q"]), Level::WARN);
        assert_eq!(parse(&["-v"]), Level::DEBUG);
        assert_eq!(parse(&["-q", "-v"]), Level::DEBUG);
    }
}
