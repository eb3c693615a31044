use anyhow::Result;
use playlog_runtime::Config;
use playlog_store::Section;
use std::fs;
use std::path::Path;

pub fn handle(data_dir: &Path, force: bool) -> Result<()> {
    let config_path = Config::path_in(data_dir);

    let config = if config_path.exists() && !force {
        println!("Using existing config: {}", config_path.display());
        Config::load_from(&config_path)?
    } else {
        let config = Config::default();
        config.save_to(&config_path)?;
        println!("Wrote config: {}", config_path.display());
        config
    };

    let paths = config.workspace(data_dir);
    let mut dirs = vec![
        paths.logs.clone(),
        paths.processed.clone(),
        paths.backups.clone(),
        paths.reports.clone(),
    ];
    dirs.extend(Section::ALL.iter().map(|s| paths.store.join(s.dir_name())));

    for dir in &dirs {
        fs::create_dir_all(dir)?;
    }
    tracing::info!(data_dir = %data_dir.display(), "Initialized workspace");

    println!();
    println!("Drop server logs into {}", paths.logs.display());
    println!("then run `playlog ingest`.");
    Ok(())
}
