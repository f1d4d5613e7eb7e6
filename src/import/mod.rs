use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};
use crate::models::RawActivity;

pub mod csv;
pub mod json;

/// Trait for reading exported activity lists in different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read the file into unvalidated activities, in file order
    fn import_file(&self, file_path: &Path) -> Result<Vec<RawActivity>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Case-insensitive extension check shared by the importers
pub(crate) fn has_extension(file_path: &Path, extension: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Manager for coordinating the available import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
    /// Extensions picked up by a directory scan; empty means all supported
    directory_extensions: Vec<String>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self {
            importers,
            directory_extensions: Vec::new(),
        }
    }

    /// Restrict directory imports to the given extensions (case-insensitive,
    /// leading dot optional). Single-file imports are unaffected.
    pub fn with_directory_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.directory_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    fn scanned_in_directory(&self, file_path: &Path) -> bool {
        self.directory_extensions.is_empty()
            || self
                .directory_extensions
                .iter()
                .any(|ext| has_extension(file_path, ext))
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<RawActivity>> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                path: file_path.to_path_buf(),
            })?;

        let activities = importer.import_file(file_path)?;
        tracing::info!(
            path = %file_path.display(),
            format = importer.format_name(),
            count = activities.len(),
            "Imported activities"
        );
        Ok(activities)
    }

    /// Import a file, or every supported file of a directory
    pub fn import_path(&self, path: &Path) -> Result<Vec<RawActivity>> {
        if path.is_dir() {
            self.import_directory(path)
        } else {
            self.import_file(path)
        }
    }

    /// Import all supported files from a directory, in file-name order.
    ///
    /// Files that fail to import are reported and skipped.
    pub fn import_directory(&self, dir_path: &Path) -> Result<Vec<RawActivity>> {
        let mut all_activities = Vec::new();
        let files = self.collect_importable_files(dir_path)?;

        if files.is_empty() {
            tracing::warn!(path = %dir_path.display(), "No importable files found");
            return Ok(all_activities);
        }

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for file_path in files {
            let file_name = file_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            pb.set_message(format!("Processing {}", file_name));

            match self.import_file(&file_path) {
                Ok(mut activities) => {
                    pb.println(format!("✓ Imported {} activities from {}", activities.len(), file_name));
                    all_activities.append(&mut activities);
                }
                Err(e) => {
                    tracing::warn!(path = %file_path.display(), error = %e, "Skipping file");
                    pb.println(format!("✗ Failed to import {}: {}", file_name, e));
                }
            }

            pb.inc(1);
        }

        pb.finish_with_message("Import complete");
        Ok(all_activities)
    }

    fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        if !dir_path.is_dir() {
            return Err(ImportError::NotADirectory {
                path: dir_path.to_path_buf(),
            }
            .into());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir_path)? {
            let path = entry?.path();
            if path.is_file() && self.can_import_file(&path) && self.scanned_in_directory(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if any importer handles the given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}
