mod activate;
mod config;
mod hook;
mod naming;
mod notify;
mod resolver;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use hook::{Hook, HookEvent};
use naming::SessionNamer;
use naming::cache::LabelCache;
use naming::remote::RemoteSummarizer;
use notify::libnotify::NotifySendSink;
use notify::sink::PlatformSink;
use notify::sound::SystemChime;
use notify::{Dispatcher, NotificationRequest, Sound};

/// Filter directives for diagnostics on stderr. Unset means silent.
const LOG_VAR: &str = "SESSION_NOTIFIER_LOG";

#[derive(Parser)]
#[command(
    name = "session-notifier",
    version,
    about = "Desktop notifications for coding-assistant sessions"
)]
struct Cli {
    /// Directory holding cached session labels
    #[arg(long, global = true, env = "SESSION_NOTIFIER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a Stop or Notification hook (payload in $HOOK_INPUT or stdin)
    Hook,

    /// Focus the terminal window behind a notification link
    Activate {
        /// Activation URI, e.g. session-notifier://activate?pid=123&cwd=...
        uri: Option<String>,
        /// Anything else the OS appends is ignored.
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Internal: show a notification and activate on click
    #[command(hide = true)]
    AwaitClick {
        uri: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        title: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        subtitle: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        body: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            // A hook or click handler must never fail its caller.
            tracing::debug!(error = %e, "unusable command line");
            return;
        }
        Err(e) => e.exit(),
    };
    let config = Config::from_env(cli.cache_dir);

    match cli.command {
        Commands::Hook => run_hook(&config).await,
        Commands::Activate { uri: None, .. } => tracing::debug!("activate without a link"),
        Commands::Activate {
            uri: Some(uri),
            extra,
        } => {
            if !extra.is_empty() {
                tracing::debug!(?extra, "ignoring extra activation arguments");
            }
            let outcome = activate::activate(&*resolver::detect(), &uri);
            tracing::debug!(?outcome, "activation finished");
        }
        Commands::AwaitClick {
            uri,
            title,
            subtitle,
            body,
        } => {
            let request = NotificationRequest {
                title,
                subtitle,
                body,
                sound: Sound::Hero,
                link: None,
            };
            if NotifySendSink::new(&config.uri_scheme).wait_for_click(&request).await {
                let outcome = activate::activate(&*resolver::detect(), &uri);
                tracing::debug!(?outcome, "activation finished");
            }
        }
    }
}

async fn run_hook(config: &Config) {
    let Some(raw) = hook::read_payload() else {
        tracing::debug!("no hook payload");
        return;
    };
    let Some(event) = HookEvent::parse(&raw) else {
        return;
    };

    let cache = LabelCache::new(&config.cache_dir);
    tracing::debug!(cache = %cache.dir().display(), session = %event.session_id, "handling hook");
    let namer = SessionNamer::new(cache, RemoteSummarizer::from_config(config.remote.as_ref()));
    let desktop = resolver::detect();
    let dispatcher = Dispatcher::new(PlatformSink::detect(config), SystemChime);

    Hook {
        namer: &namer,
        desktop: &*desktop,
        dispatcher: &dispatcher,
        self_pid: std::process::id(),
    }
    .run(&event)
    .await;
}

/// Log to stderr so stdout stays free for the hook runner.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("session-notifier").chain(args.iter().copied()))
    }

    #[test]
    fn activate_tolerates_missing_and_extra_arguments() {
        let cli = parse(&["activate"]).unwrap();
        assert!(matches!(cli.command, Commands::Activate { uri: None, .. }));

        let cli = parse(&["activate", "session-notifier://activate?pid=7", "x", "y"]).unwrap();
        match cli.command {
            Commands::Activate { uri, extra } => {
                assert_eq!(uri.as_deref(), Some("session-notifier://activate?pid=7"));
                assert_eq!(extra, ["x", "y"]);
            }
            _ => panic!("expected activate"),
        }
    }

    #[test]
    fn unknown_subcommand_is_a_quiet_error() {
        let err = parse(&["frobnicate"]).err().unwrap();
        assert!(err.use_stderr());
        let help = parse(&["--help"]).err().unwrap();
        assert!(!help.use_stderr());
    }

    #[test]
    fn await_click_takes_dashed_values() {
        let cli = parse(&[
            "await-click",
            "--title=-✅ 已完成",
            "--subtitle=x",
            "--body=-y",
            "--",
            "session-notifier://activate?pid=1",
        ])
        .unwrap();
        match cli.command {
            Commands::AwaitClick { uri, title, body, .. } => {
                assert_eq!(uri, "session-notifier://activate?pid=1");
                assert_eq!(title, "-✅ 已完成");
                assert_eq!(body, "-y");
            }
            _ => panic!("expected await-click"),
        }
    }

    #[test]
    fn cache_dir_is_global() {
        let cli = parse(&["hook", "--cache-dir", "/tmp/labels"]).unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/labels")));
    }
}
