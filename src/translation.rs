use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{ImageCopyMode, Settings};
use crate::images::{ImageCopyReport, ImageDir};
use crate::inputs::TranslationInput;
use crate::output;
use crate::parser;
use crate::parser::books::BookTable;
use crate::parser::error::Diagnostics;
use crate::parser::extract::images::DecorativeFilter;
use crate::parser::extract::{ExtractContext, ImagePolicy};

/// Read-only tables shared by every translation in a run.
#[derive(Debug, Default)]
pub struct Lookups {
    pub books: BookTable,
    pub decorative: DecorativeFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    pub name: String,
    pub notes: usize,
    pub resources: usize,
    pub images_copied: usize,
    pub images_missing: usize,
    pub warnings: usize,
}

impl TranslationSummary {
    pub fn print(&self) {
        println!(
            "{}: {} notes, {} resources, {} images copied ({} missing), {} warnings",
            self.name,
            self.notes,
            self.resources,
            self.images_copied,
            self.images_missing,
            self.warnings,
        );
    }
}

/// Convert every input in parallel. Each translation succeeds or fails on its own.
pub fn run_all(
    inputs: &[TranslationInput],
    settings: &Settings,
    lookups: &Lookups,
) -> Vec<(String, Result<TranslationSummary>)> {
    let multi = MultiProgress::new();
    inputs
        .par_iter()
        .map(|input| {
            let bar = if settings.progress {
                Some(multi.add(ProgressBar::new(0)))
            } else {
                None
            };
            (input.name.clone(), run_one(input, settings, lookups, bar))
        })
        .collect()
}

pub fn run_one(
    input: &TranslationInput,
    settings: &Settings,
    lookups: &Lookups,
    bar: Option<ProgressBar>,
) -> Result<TranslationSummary> {
    let t0 = Instant::now();
    if !input.exists() {
        bail!("SCML file not found: {}", input.scml.display());
    }
    info!("Processing {} ({})", input.name, input.scml.display());

    let image_dir = ImageDir::open(&input.images_dir)?;
    if settings.strict_images && !image_dir.is_present() {
        bail!("Images directory not found: {}", image_dir.root().display());
    }
    let policy = if settings.strict_images {
        ImagePolicy::Strict
    } else {
        ImagePolicy::Lenient
    };

    let file = File::open(&input.scml)
        .with_context(|| format!("Failed to open {}", input.scml.display()))?;
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let bar = bar.unwrap_or_else(ProgressBar::hidden);
    bar.set_length(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>8} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    bar.set_prefix(input.name.clone());

    let ctx = ExtractContext::new(&lookups.books, &lookups.decorative, &image_dir, policy);
    let mut diag = Diagnostics::new();
    let extracted = parser::extract_translation(BufReader::new(bar.wrap_read(file)), &ctx, &mut diag);
    bar.finish_and_clear();
    let extraction = extracted.with_context(|| format!("Failed to convert {}", input.name))?;

    let out_dir = settings.output_dir.join(&input.name);
    output::write_collections(&out_dir, &extraction.notes, &extraction.resources)?;

    let images_out = out_dir.join("images");
    let report = match settings.images {
        ImageCopyMode::All if image_dir.is_present() => image_dir.copy_all(&images_out)?,
        ImageCopyMode::All => ImageCopyReport::default(),
        ImageCopyMode::Referenced => image_dir.copy_referenced(&extraction.images, &images_out)?,
    };
    for name in &report.missing {
        if settings.strict_images {
            bail!("Referenced image not found: {}", image_dir.root().join(name).display());
        }
        warn!("Referenced image not found: {}", image_dir.root().join(name).display());
    }

    if !diag.is_empty() {
        info!("{}: {} warning(s), see log above", input.name, diag.len());
    }

    let summary = TranslationSummary {
        name: input.name.clone(),
        notes: extraction.notes.len(),
        resources: extraction.resources.len(),
        images_copied: report.copied,
        images_missing: report.missing.len(),
        warnings: diag.warnings().len(),
    };
    info!(
        "Finished {} in {:.1}s: {} notes, {} resources",
        input.name,
        t0.elapsed().as_secs_f64(),
        summary.notes,
        summary.resources
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use crate::output::{NOTES_FILE, RESOURCES_FILE};

    fn stage(inputs: &Path, name: &str, images: &[&str]) -> TranslationInput {
        let input = TranslationInput::named(inputs, name);
        fs::create_dir_all(&input.images_dir).unwrap();
        fs::copy("tests/fixtures/genesis.scml", &input.scml).unwrap();
        for image in images {
            fs::write(input.images_dir.join(image), b"jpg").unwrap();
        }
        input
    }

    fn settings(root: &Path) -> Settings {
        Settings {
            inputs_dir: root.join("inputs"),
            output_dir: root.join("output"),
            progress: false,
            ..Settings::default()
        }
    }

    const ALL_IMAGES: &[&str] = &["foo-fig1.jpg", "eden-map.jpg", "eden-map-detail.jpg", "hcp-rule.jpg"];

    #[test]
    fn writes_json_and_copies_all_images() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path());
        let input = stage(&s.inputs_dir, "esv", ALL_IMAGES);

        let summary = run_one(&input, &s, &Lookups::default(), None).unwrap();
        assert_eq!(summary.name, "esv");
        assert_eq!(summary.images_copied, 4);
        assert!(summary.warnings > 0);

        let out = s.output_dir.join("esv");
        let notes: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(NOTES_FILE)).unwrap()).unwrap();
        assert_eq!(notes.as_array().unwrap().len(), summary.notes);
        assert_eq!(notes[0]["start"], 1_001_001);
        assert!(notes[0].get("end").is_none());

        let resources: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(RESOURCES_FILE)).unwrap()).unwrap();
        assert_eq!(resources.as_array().unwrap().len(), summary.resources);
        for r in resources.as_array().unwrap() {
            let keys: Vec<&str> = r.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys.len(), 4);
            assert!(["chart", "figure", "introduction", "article"].contains(&r["type"].as_str().unwrap()));
        }
        assert!(out.join("images").join("hcp-rule.jpg").exists());
    }

    #[test]
    fn referenced_mode_copies_resource_images_only() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = settings(tmp.path());
        s.images = ImageCopyMode::Referenced;
        let input = stage(&s.inputs_dir, "niv", ALL_IMAGES);

        let summary = run_one(&input, &s, &Lookups::default(), None).unwrap();
        assert_eq!(summary.images_copied, 3);
        assert_eq!(summary.images_missing, 0);
        let images = s.output_dir.join("niv").join("images");
        assert!(images.join("eden-map.jpg").exists());
        assert!(!images.join("hcp-rule.jpg").exists());
    }

    #[test]
    fn strict_mode_fails_on_missing_image() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = settings(tmp.path());
        s.strict_images = true;
        let input = stage(&s.inputs_dir, "kjv", &["foo-fig1.jpg"]);

        assert!(run_one(&input, &s, &Lookups::default(), None).is_err());
        assert!(!s.output_dir.join("kjv").join(NOTES_FILE).exists());
    }

    #[test]
    fn malformed_translation_fails_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path());
        let good = stage(&s.inputs_dir, "good", ALL_IMAGES);
        let bad = TranslationInput::named(&s.inputs_dir, "bad");
        fs::create_dir_all(bad.scml.parent().unwrap()).unwrap();
        fs::write(&bad.scml, "<scml><com id=\"com01001001\">unclosed").unwrap();

        let results = run_all(&[bad, good], &s, &Lookups::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert!(!s.output_dir.join("bad").join(NOTES_FILE).exists());
    }

    #[test]
    fn missing_scml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path());
        let input = TranslationInput::named(&s.inputs_dir, "absent");
        assert!(run_one(&input, &s, &Lookups::default(), None).is_err());
    }
}
