use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Where one translation's source files live:
/// `<inputs>/<NAME>/<NAME>.scml` and `<inputs>/<NAME>/<NAME>_images/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationInput {
    pub name: String,
    pub scml: PathBuf,
    pub images_dir: PathBuf,
}

impl TranslationInput {
    pub fn named(inputs_dir: &Path, name: &str) -> Self {
        let root = inputs_dir.join(name);
        TranslationInput {
            name: name.to_string(),
            scml: root.join(format!("{}.scml", name)),
            images_dir: root.join(format!("{}_images", name)),
        }
    }

    pub fn exists(&self) -> bool {
        self.scml.is_file()
    }
}

/// Every subdirectory of `inputs_dir` holding its matching `.scml` file, by name.
pub fn discover(inputs_dir: &Path) -> Result<Vec<TranslationInput>> {
    let entries = fs::read_dir(inputs_dir)
        .with_context(|| format!("Failed to read inputs directory {}", inputs_dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let input = TranslationInput::named(inputs_dir, &name);
        if input.exists() {
            found.push(input);
        } else {
            debug!("Skipping {}: no {}.scml", name, name);
        }
    }
    found.sort_by(|a, b| a.name.cmp(&b.name));
    info!("Found {} translation(s) in {}", found.len(), inputs_dir.display());
    Ok(found)
}

/// [`discover`], failing when nothing is found.
pub fn discover_all(inputs_dir: &Path) -> Result<Vec<TranslationInput>> {
    let found = discover(inputs_dir)?;
    if found.is_empty() {
        bail!("No translations found in {}", inputs_dir.display());
    }
    Ok(found)
}
