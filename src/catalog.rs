use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use walkdir::WalkDir;

use crate::analyzer::{self, TrackDescriptor};
use crate::config::GenreThresholds;
use crate::SUPPORTED_EXTENSIONS;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Ordered filename → descriptor mapping for one analysis session.
///
/// Insertion order is scan order, which also fixes tie order in the rankings.
/// Built fresh per session and effectively read-only once the energy rescale
/// pass has run.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<(String, TrackDescriptor)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a track, replacing any existing entry with the same name.
    pub fn insert(&mut self, name: String, descriptor: TrackDescriptor) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = descriptor;
        } else {
            self.entries.push((name, descriptor));
        }
    }

    pub fn get(&self, name: &str) -> Option<&TrackDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrackDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-time catalog-wide energy rescale onto a 0–100 scale.
    ///
    /// When every track carries the same raw energy (including a one-track
    /// catalog) all rescaled values are pinned to the 50.0 midpoint rather
    /// than dividing by zero. Genre labels were already derived from the raw
    /// values, so they are untouched here.
    pub fn rescale_energy(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let min = self
            .entries
            .iter()
            .map(|(_, d)| d.energy)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .entries
            .iter()
            .map(|(_, d)| d.energy)
            .fold(f64::NEG_INFINITY, f64::max);

        for (_, descriptor) in &mut self.entries {
            descriptor.energy = if max - min > 0.0 {
                100.0 * (descriptor.energy - min) / (max - min)
            } else {
                50.0
            };
        }
    }
}

/// Scans a directory tree for supported audio files and builds a catalog.
///
/// The root directory and genre thresholds are explicit construction inputs;
/// nothing here reads global paths.
pub struct LibraryScanner {
    root: PathBuf,
    thresholds: GenreThresholds,
}

impl LibraryScanner {
    pub fn new(root: impl Into<PathBuf>, thresholds: GenreThresholds) -> Self {
        Self {
            root: root.into(),
            thresholds,
        }
    }

    /// Extract every supported audio file under the root into a catalog,
    /// then apply the energy rescale pass.
    ///
    /// A file that fails to decode is logged and skipped — one bad file must
    /// not cost us the rest of the library.
    pub fn scan(&self) -> Result<Catalog, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        // First pass: collect candidate audio files in a stable order
        let audio_files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let ext = e
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                SUPPORTED_EXTENSIONS.contains(&ext.as_str())
            })
            .map(|e| e.into_path())
            .collect();

        let pb = ProgressBar::new(audio_files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        pb.set_message("Analyzing...");

        let mut catalog = Catalog::new();
        let mut failed = 0u64;

        for path in &audio_files {
            match analyzer::extract(path, &self.thresholds) {
                Ok(descriptor) => {
                    catalog.insert(self.track_name(path), descriptor);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    failed += 1;
                }
            }
            pb.inc(1);
        }

        catalog.rescale_energy();

        pb.finish_with_message(format!(
            "Done: {} analyzed, {} skipped",
            catalog.len(),
            failed
        ));

        Ok(catalog)
    }

    /// Catalog key: path relative to the scan root, so names stay unique
    /// when the library has subdirectories.
    fn track_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}
