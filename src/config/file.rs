// src/config/file.rs
use std::{fs, path::Path};

use super::options::AppOptions;
use crate::Result;

/// Load options from a TOML file. A missing file yields defaults;
/// a present but invalid one is an error.
pub fn load(path: &Path) -> Result<AppOptions> {
    if !path.exists() {
        logd!("No config at {}, using defaults", path.display());
        return Ok(AppOptions::default());
    }
    let text = fs::read_to_string(path)?;
    let opts = parse(&text)?;
    logf!("Loaded config from {}", path.display());
    Ok(opts)
}

pub fn parse(text: &str) -> Result<AppOptions> {
    let opts: AppOptions = toml::from_str(text)?;
    opts.validate()?;
    Ok(opts)
}

pub fn save(path: &Path, opts: &AppOptions) -> Result<()> {
    let text = toml::to_string_pretty(opts)
        .map_err(|e| crate::Error::Config(e.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    Ok(())
}
