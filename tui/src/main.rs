use clap::Parser;
use lorebook_tui::Cli;
use lorebook_tui::run_main;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_main(cli)
}
