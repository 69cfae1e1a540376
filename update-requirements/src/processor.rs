use crate::config::Settings;
use crate::error::UpdateError;
use crate::output::Sink;
use crate::resolver::{ResolveReport, VersionLookup, VersionResolver};
use indicatif::{ProgressBar, ProgressStyle};
use requirements_core::{NormalizeSummary, RequirementsDocument};
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one input file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub normalize: NormalizeSummary,
    pub resolve: ResolveReport,
}

/// Runs the parse → normalize → resolve → write pipeline for one file at a time.
/// Files share no state, so a failure in one never affects the next.
pub struct FileProcessor<'a, L> {
    settings: &'a Settings,
    /// `None` when versions should not be updated
    lookup: Option<&'a L>,
    show_progress: bool,
}

impl<'a, L: VersionLookup> FileProcessor<'a, L> {
    pub fn new(settings: &'a Settings, lookup: Option<&'a L>) -> Self {
        Self {
            settings,
            lookup,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Read and transform `path`, returning the new file contents
    pub async fn transform(&self, path: &Path) -> Result<(String, FileReport), UpdateError> {
        tracing::info!("processing {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| UpdateError::read(path, e))?;
        let mut document = RequirementsDocument::parse(path, &content);

        for (line_number, text, error) in document.malformed() {
            tracing::debug!(
                "{}:{line_number}: keeping unparseable line {text:?} ({error})",
                path.display()
            );
        }

        let normalize = document.normalize(&self.settings.normalize);
        for removed in &normalize.duplicates_removed {
            tracing::debug!("{}: dropped duplicate entry {removed}", path.display());
        }

        let resolve = match self.lookup {
            Some(lookup) => {
                VersionResolver::new(lookup)
                    .with_progress(self.progress_bar())
                    .resolve(&mut document)
                    .await
            }
            None => ResolveReport::default(),
        };

        let report = FileReport {
            path: path.to_path_buf(),
            normalize,
            resolve,
        };

        Ok((document.render(), report))
    }

    /// Transform `path` and send the result to `sink`
    pub async fn run(&self, path: &Path, sink: Sink) -> Result<FileReport, UpdateError> {
        let (rendered, report) = self.transform(path).await?;
        sink.emit(path, &rendered)?;
        Ok(report)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        ProgressBar::new(0).with_style(style)
    }
}
