//! Config command

use std::path::Path;

use anyhow::{Context, Result};
use billsense_core::{config::default_config_path, DetectionConfig};

pub fn cmd_config(config: Option<&Path>, path_only: bool) -> Result<()> {
    if path_only {
        let path = config
            .map(Path::to_path_buf)
            .or_else(default_config_path)
            .context("No config directory available on this platform")?;
        let state = if path.exists() { "present" } else { "not present" };
        println!("{} ({})", path.display(), state);
        return Ok(());
    }

    let effective = DetectionConfig::load(config).context("Failed to load detection config")?;
    print!("{}", effective.to_toml_string()?);
    Ok(())
}
