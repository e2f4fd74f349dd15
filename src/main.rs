use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

use snaparchive::cli::{Cli, Commands};
use snaparchive::ops;

fn init_logger() {
    // RUST_LOG wins; default to info
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = ops::Settings::from_cli(&cli)?;

    match cli.command {
        Commands::Init { nodetool, host, port, username, password_file } => {
            let access = ops::NodetoolAccess { binary: nodetool, host, port, username, password_file };
            ops::do_init(&settings, access)?;
        }
        Commands::Backup { keyspace, tag } => {
            ops::do_backup(&settings, &keyspace, tag)?;
        }
        Commands::Restore { keyspace } => {
            ops::do_restore(&settings, &keyspace)?;
        }
        Commands::Tables { keyspace } => {
            ops::do_tables(&settings, &keyspace)?;
        }
        Commands::List { keyspace } => {
            ops::do_list(&settings, keyspace.as_deref())?;
        }
        Commands::Version => {
            ops::do_version();
        }
    }

    Ok(())
}
