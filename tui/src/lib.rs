// Forbid accidental stdout/stderr writes in the library portion of the TUI;
// stray prints corrupt the alternate screen.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::fs::OpenOptions;
use std::sync::Arc;

use lorebook_core::Config;
use lorebook_core::ConfigOverrides;
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod app_event;
mod app_event_sender;
mod cli;
mod composer;
mod demo;
mod suggestion_popup;
mod transcript_view;
mod tui;

pub use cli::Cli;
pub use demo::DemoVault;

use app::App;

pub fn run_main(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_overrides(ConfigOverrides {
        reduced_motion: cli.reduced_motion.then_some(true),
    });

    // File-based logging only; stdout belongs to the terminal UI.
    let log_dir = lorebook_core::config::log_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts.open(log_dir.join("lorebook-tui.log"))?;
    let (non_blocking, _guard) = non_blocking(log_file);

    let default_filter = if cli.debug {
        "lorebook_core=info,lorebook_tui=info"
    } else {
        "lorebook_core=warn,lorebook_tui=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_filter(env_filter);
    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let vault = Arc::new(DemoVault::new());
    let mut app = App::new(
        config,
        Arc::clone(&vault) as Arc<dyn lorebook_core::SuggestionSource>,
        vault as Arc<dyn lorebook_core::CommandExecutor>,
        runtime.handle().clone(),
    );

    let mut terminal = tui::init()?;
    let result = app.run(&mut terminal);
    let _ = tui::restore();
    result
}
