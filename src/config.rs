use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "scml_notes.toml";
pub const ENV_PREFIX: &str = "SCML";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCopyMode {
    /// Copy the whole image directory.
    #[default]
    All,
    /// Copy only images backing an emitted resource.
    Referenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub inputs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub images: ImageCopyMode,
    pub strict_images: bool,
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            inputs_dir: PathBuf::from("./inputs"),
            output_dir: PathBuf::from("./output"),
            images: ImageCopyMode::All,
            strict_images: false,
            progress: true,
        }
    }
}

impl Settings {
    /// `scml_notes.toml` in the working directory if present, then `SCML_*`
    /// environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .with_context(|| format!("Failed to load settings ({})", file.display()))
    }

    pub fn apply_dirs(&mut self, inputs_dir: Option<PathBuf>, output_dir: Option<PathBuf>) {
        if let Some(dir) = inputs_dir {
            self.inputs_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
    }

    /// Command-line switches only ever tighten or quieten the loaded settings.
    pub fn apply_flags(&mut self, only_referenced_images: bool, strict_images: bool, no_progress: bool) {
        if only_referenced_images {
            self.images = ImageCopyMode::Referenced;
        }
        if strict_images {
            self.strict_images = true;
        }
        if no_progress {
            self.progress = false;
        }
    }
}
