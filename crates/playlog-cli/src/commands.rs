use anyhow::Result;
use playlog_runtime::{Config, WorkspacePaths, resolve_workspace_path};
use std::path::Path;

use super::args::{Cli, Commands};
use super::{handlers, logging};

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);
    let data_dir = resolve_workspace_path(cli.data_dir.as_deref())?;

    let Some(command) = cli.command else {
        show_guidance(&data_dir);
        return Ok(());
    };

    match command {
        Commands::Init { force } => handlers::init::handle(&data_dir, force),

        Commands::Ingest {
            from,
            to,
            reason,
            dry_run,
        } => {
            let (config, paths) = load(&data_dir)?;
            handlers::ingest::handle(
                config,
                paths,
                playlog_runtime::IngestRequest {
                    from,
                    to,
                    reason,
                    dry_run,
                },
            )
        }

        Commands::Backup => {
            let (config, paths) = load(&data_dir)?;
            handlers::backup::create(&config, &paths)
        }

        Commands::Backups => {
            let (config, paths) = load(&data_dir)?;
            handlers::backup::list(&config, &paths)
        }

        Commands::Restore => {
            let (config, paths) = load(&data_dir)?;
            handlers::restore::handle(&config, &paths)
        }
    }
}

fn load(data_dir: &Path) -> Result<(Config, WorkspacePaths)> {
    let config = Config::load_from(&Config::path_in(data_dir))?;
    let paths = config.workspace(data_dir);
    Ok((config, paths))
}

fn show_guidance(data_dir: &Path) {
    let config_path = Config::path_in(data_dir);
    if config_path.exists() {
        println!("playlog data directory: {}", data_dir.display());
        println!();
        println!("  playlog ingest             fold new log files into the records");
        println!("  playlog ingest --dry-run   preview what would change");
        println!("  playlog backups            list backup archives");
    } else {
        println!("No playlog config found at {}.", config_path.display());
        println!("Run `playlog init` to create one.");
    }
}
