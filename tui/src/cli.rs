use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lorebook", version, about = "Interactive lorebook terminal")]
pub struct Cli {
    /// Jump new output into view instead of animating the scroll.
    #[arg(long = "reduced-motion", default_value_t = false)]
    pub reduced_motion: bool,

    /// Log at info level instead of warn (file log under ~/.lorebook/log).
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
