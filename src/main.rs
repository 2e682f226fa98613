use clap::Parser;
use webticker::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
    run(cli)
}
