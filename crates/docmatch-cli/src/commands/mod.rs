//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use docmatch_core::{DocmatchConfig, PopulationSnapshot};

/// Load configuration from an explicit path, or fall back to defaults.
pub(crate) fn load_config(config_path: Option<&str>) -> anyhow::Result<DocmatchConfig> {
    match config_path {
        Some(path) => Ok(DocmatchConfig::from_file(Path::new(path))?),
        None => Ok(DocmatchConfig::default()),
    }
}

/// Load the population snapshot named on the command line, falling back
/// to the configured path.
pub(crate) fn load_snapshot(
    population: Option<&PathBuf>,
    config: &DocmatchConfig,
) -> anyhow::Result<PopulationSnapshot> {
    let path = population
        .cloned()
        .or_else(|| config.population.snapshot.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no population snapshot given (use --population or set population.snapshot in the config)")
        })?;

    let snapshot =
        PopulationSnapshot::from_csv_path(&path, &config.population.faculty_aliases)?;
    Ok(snapshot)
}
