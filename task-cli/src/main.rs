use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use task_cli::cli::{Cli, UNKNOWN_COMMAND, USAGE, normalize_args};
use task_cli::{JsonFileStore, Settings, TaskTracker};
use tracing::debug;
use tracing::level_filters::LevelFilter;

fn init_logging(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::InvalidSubcommand => {
            println!("{}", UNKNOWN_COMMAND);
            return Ok(());
        }
        Err(err) => err.exit(),
    };

    let Some(command) = args.command else {
        println!("{}", USAGE);
        return Ok(());
    };

    let settings = Settings::load(args.file).context("cannot load configuration")?;
    init_logging(settings.log_level()?);
    debug!("Using task file {}", settings.file.display());

    let store = JsonFileStore::new(settings.file.clone());
    let mut tracker = TaskTracker::new(store, std::io::stdout().lock());
    command
        .dispatch(&mut tracker)
        .with_context(|| format!("cannot update tasks in '{}'", settings.file.display()))?;

    Ok(())
}
