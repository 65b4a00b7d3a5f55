use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

// ── Rows ──

/// One verse-anchored study note. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub start: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Chart,
    Figure,
    Introduction,
    Article,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Chart => "chart",
            ResourceType::Figure => "figure",
            ResourceType::Introduction => "introduction",
            ResourceType::Article => "article",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
}

// ── Writing ──

pub const NOTES_FILE: &str = "notes.json";
pub const RESOURCES_FILE: &str = "resources.json";

/// Write both collections into `dir`. Each file is written beside its final
/// name and renamed into place once complete.
pub fn write_collections(dir: &Path, notes: &[Note], resources: &[Resource]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    write_json(&dir.join(NOTES_FILE), notes)?;
    write_json(&dir.join(RESOURCES_FILE), resources)?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

// ── Tests ──
