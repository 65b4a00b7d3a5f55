use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::parser::extract::ImageSource;

/// Result of copying images into an output directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageCopyReport {
    pub copied: usize,
    pub missing: Vec<String>,
}

/// A translation's image directory, listed once when opened.
///
/// Files in nested folders are indexed by basename; the first one found wins.
#[derive(Debug)]
pub struct ImageDir {
    root: PathBuf,
    present: bool,
    files: IndexMap<String, PathBuf>,
}

impl ImageDir {
    pub fn open(root: &Path) -> Result<Self> {
        let mut files = IndexMap::new();
        let present = root.is_dir();
        if present {
            let mut entries = WalkDir::new(root)
                .into_iter()
                .collect::<std::result::Result<Vec<DirEntry>, walkdir::Error>>()
                .with_context(|| format!("Failed to list images in {}", root.display()))?;
            entries.sort_by(|a, b| a.path().cmp(b.path()));
            for entry in entries.into_iter().filter(|e| e.file_type().is_file()) {
                if let Some(name) = entry.file_name().to_str() {
                    files
                        .entry(name.to_string())
                        .or_insert_with(|| entry.path().to_path_buf());
                }
            }
        } else {
            warn!("Image directory {} not found", root.display());
        }
        debug!("{} image file(s) under {}", files.len(), root.display());
        Ok(ImageDir {
            root: root.to_path_buf(),
            present,
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Copy exactly `names`, reporting the ones not in the directory.
    pub fn copy_referenced(&self, names: &[String], dest: &Path) -> Result<ImageCopyReport> {
        fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut report = ImageCopyReport::default();
        for name in names {
            match self.files.get(name) {
                Some(src) => {
                    copy_file(src, &dest.join(name))?;
                    report.copied += 1;
                }
                None => report.missing.push(name.clone()),
            }
        }
        Ok(report)
    }

    /// Copy every `.jpg` in the directory tree, flattened by basename.
    pub fn copy_all(&self, dest: &Path) -> Result<ImageCopyReport> {
        fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut report = ImageCopyReport::default();
        for (name, src) in self.files.iter().filter(|(name, _)| is_jpg(name)) {
            copy_file(src, &dest.join(name))?;
            report.copied += 1;
        }
        Ok(report)
    }
}

impl ImageSource for ImageDir {
    fn contains(&self, basename: &str) -> bool {
        self.files.contains_key(basename)
    }
}

fn is_jpg(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}
