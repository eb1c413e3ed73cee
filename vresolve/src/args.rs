/// Flags and command to change vResolve execution
#[derive(Debug, clap::Parser, PartialEq, Eq)]
#[clap(about, version, author)]
pub struct Args {
    /// Path of the vResolve configuration file (toml format)
    #[clap(short, long)]
    pub config: Option<String>,

    /// Commands
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Do not run the program as a daemon
    #[clap(short, long)]
    pub no_daemon: bool,
}

/// Subcommand run instead of the resolver service
#[derive(Debug, clap::Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// Show the loaded config (as serialized json format)
    ConfigShow,
    /// Show the difference between the loaded config and the default one
    ConfigDiff,
}
