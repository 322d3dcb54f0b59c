// # cfsync
//
// One-shot synchronizer for the A and AAAA records of a Cloudflare zone.
//
// This binary is a thin integration layer:
// 1. Parse the command line
// 2. Set up logging (console + `~/.cloudflare/dns_update.log`)
// 3. Resolve configuration and credentials
// 4. Wire the IP sources, provider and notifier into a `SyncEngine`
// 5. Map the run outcome to an exit status
//
// All synchronization logic lives in `cfsync-core`.
//
// ## Configuration
//
// - `CF_API_KEY`: Cloudflare API token (takes precedence over the config file)
// - `~/.cloudflare/config`: JSON object with optional `email` and `api_key`
//
// ## Example
//
// ```bash
// export CF_API_KEY=your_token
// cfsync example.com -e me@example.com -i eth0 --add-aaaa -m ops@example.com
// ```
//
// Typically run from cron every few minutes.

mod cli;
mod logging;

use cfsync_core::config::API_KEY_ENV;
use cfsync_core::{
    AddressResolver, ConfigFile, Credentials, IpSource, MailConfig, Notifier, Result, RunOutcome,
    SyncConfig, SyncEngine,
};
use cfsync_ip_http::HttpIpSource;
use cfsync_ip_netlink::NetlinkIpSource;
use cfsync_notify_smtp::SmtpNotifier;
use cfsync_provider_cloudflare::CloudflareProvider;
use clap::Parser;
use cli::Args;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

/// Exit codes
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Run completed (possibly with non-fatal errors)
    Success = 0,
    /// Configuration error or a fatal error during the run
    Failure = 1,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// `~/.cloudflare`, holding both the config file and the log file
fn cloudflare_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cloudflare")
}

fn main() -> ExitCode {
    let args = Args::parse();
    let base_dir = cloudflare_dir();

    let _log = logging::init(args.log_level(), &base_dir);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::Failure.into();
        }
    };

    let outcome = runtime.block_on(run(args, &base_dir));

    // A fatal error is already in the report and the log
    if outcome.is_success() {
        info!("DNS update process completed.");
        SyncExitCode::Success.into()
    } else {
        SyncExitCode::Failure.into()
    }
}

/// Run settings that come from the command line alone
fn sync_config(args: &Args) -> SyncConfig {
    let mut config = SyncConfig::new(args.domain.clone())
        .with_add_aaaa(args.add_aaaa)
        .with_dry_run(args.dry_run)
        .with_force_report(args.force_report);

    if let Some(interface) = &args.interface {
        config = config.with_interface(interface);
    }

    match (&args.mail_to, &args.mail_from) {
        (Some(to), from) => {
            config = config.with_mail(MailConfig {
                to: to.clone(),
                from: from.clone(),
            });
        }
        (None, Some(_)) => warn!("--mail-from has no effect without --mail-to"),
        (None, None) => {}
    }

    config
}

/// Resolve credentials and wire the engine together
fn build_engine(args: &Args, base_dir: &Path, config: SyncConfig) -> Result<SyncEngine> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| base_dir.join("config"));
    let file = ConfigFile::load(&config_path)?;
    let credentials =
        Credentials::resolve(args.email.clone(), std::env::var(API_KEY_ENV).ok(), &file)?;
    debug!("Using {:?} from {}", credentials, config_path.display());

    let provider = CloudflareProvider::new(credentials.api_key)?;
    let ipv4 = HttpIpSource::new()?;
    let ipv6 = args
        .interface
        .clone()
        .map(|name| Box::new(NetlinkIpSource::new(name)) as Box<dyn IpSource>);
    let resolver = AddressResolver::new(Box::new(ipv4), ipv6);

    let notifier = config
        .mail
        .as_ref()
        .map(|_| Box::new(SmtpNotifier::new()) as Box<dyn Notifier>);

    SyncEngine::new(Box::new(provider), resolver, notifier, config)
}

/// Run once. Setup failures are reported like any other fatal error.
async fn run(args: Args, base_dir: &Path) -> RunOutcome {
    let config = sync_config(&args);
    info!("Starting DNS update for {}", config.domain);

    match build_engine(&args, base_dir, config.clone()) {
        Ok(engine) => engine.run().await,
        Err(e) => RunOutcome::aborted(&config, e, &SmtpNotifier::new()).await,
    }
}
