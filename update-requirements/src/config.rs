use crate::cli::Args;
use crate::error::UpdateError;
use requirements_core::{CommentPolicy, DuplicatePolicy, NormalizeOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_TIMEOUT_SECS: u64 = 1;

/// Settings as written in a config file. Every key is optional.
///
/// Either a standalone TOML file passed with `--config`:
///
/// ```toml
/// index-url = "https://pypi.example.com/pypi"
/// comments = "drop"
/// ```
///
/// or the `[tool.update-requirements]` table of `./pyproject.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub index_url: Option<String>,
    pub pre_release: Option<bool>,
    pub update: Option<bool>,
    pub comments: Option<CommentPolicy>,
    pub duplicates: Option<DuplicatePolicy>,
    pub split_markers: Option<bool>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    #[serde(rename = "update-requirements")]
    update_requirements: Option<FileConfig>,
}

impl FileConfig {
    /// Load a standalone config file. Missing or invalid files are errors.
    pub fn load(path: &Path) -> Result<Self, UpdateError> {
        let content = fs::read_to_string(path).map_err(|e| UpdateError::read(path, e))?;
        toml::from_str(&content).map_err(|e| UpdateError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read `[tool.update-requirements]` from a pyproject.toml, if it has one
    pub fn from_pyproject(path: &Path) -> Result<Option<Self>, UpdateError> {
        let content = fs::read_to_string(path).map_err(|e| UpdateError::read(path, e))?;
        let pyproject: PyProject = toml::from_str(&content).map_err(|e| UpdateError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(pyproject.tool.and_then(|tool| tool.update_requirements))
    }

    /// Find settings for this run: the explicit `--config` file, else
    /// `pyproject.toml` in `dir`. A broken pyproject.toml is not fatal since
    /// it usually belongs to the project rather than to this tool.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, UpdateError> {
        if let Some(path) = explicit {
            tracing::debug!("loading settings from {}", path.display());
            return Self::load(path);
        }

        let pyproject = dir.join("pyproject.toml");
        if !pyproject.is_file() {
            return Ok(Self::default());
        }

        match Self::from_pyproject(&pyproject) {
            Ok(Some(config)) => {
                tracing::debug!("loaded settings from {}", pyproject.display());
                Ok(config)
            }
            Ok(None) => Ok(Self::default()),
            Err(e) => {
                tracing::warn!("ignoring settings: {e}");
                Ok(Self::default())
            }
        }
    }
}

/// Effective settings for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub files: Vec<PathBuf>,
    pub debug: bool,
    pub inplace: bool,
    pub update: bool,
    pub pre_release: bool,
    pub index_url: String,
    pub timeout: Duration,
    pub normalize: NormalizeOptions,
}

impl Settings {
    /// Merge command-line flags over config file values over defaults
    pub fn resolve(args: &Args, config: FileConfig) -> Self {
        let defaults = NormalizeOptions::default();

        let timeout = match config.timeout {
            Some(secs) if secs < MIN_TIMEOUT_SECS => {
                tracing::warn!("timeout of {secs}s is too short, using {MIN_TIMEOUT_SECS}s");
                MIN_TIMEOUT_SECS
            }
            Some(secs) => secs,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            files: args.files.clone(),
            debug: args.debug,
            inplace: args.inplace,
            update: !args.no_update && config.update.unwrap_or(true),
            pre_release: args.pre_release || config.pre_release.unwrap_or(false),
            index_url: args
                .index_url
                .clone()
                .or(config.index_url)
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            timeout: Duration::from_secs(timeout),
            normalize: NormalizeOptions {
                comments: args
                    .comments
                    .or(config.comments)
                    .unwrap_or(defaults.comments),
                duplicates: args
                    .duplicates
                    .or(config.duplicates)
                    .unwrap_or(defaults.duplicates),
                split_markers: args.split_markers
                    || config.split_markers.unwrap_or(defaults.split_markers),
            },
        }
    }

    /// Discover the config file relative to the current directory and merge
    pub fn load(args: &Args) -> Result<Self, UpdateError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let config = FileConfig::discover(args.config.as_deref(), &cwd)?;
        Ok(Self::resolve(args, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(files: &[&str]) -> Args {
        Args {
            files: files.iter().map(PathBuf::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&args(&["requirements.txt"]), FileConfig::default());

        assert!(settings.update);
        assert!(!settings.inplace);
        assert!(!settings.pre_release);
        assert_eq!(settings.index_url, DEFAULT_INDEX_URL);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.normalize, NormalizeOptions::default());
    }

    #[test]
    fn test_flags_override_config() {
        let config = FileConfig {
            index_url: Some("https://mirror.example/pypi".to_string()),
            update: Some(true),
            comments: Some(CommentPolicy::Drop),
            duplicates: Some(DuplicatePolicy::First),
            timeout: Some(5),
            ..Default::default()
        };
        let mut cli = args(&["r.txt"]);
        cli.no_update = true;
        cli.duplicates = Some(DuplicatePolicy::Last);

        let settings = Settings::resolve(&cli, config);

        assert!(!settings.update);
        assert_eq!(settings.index_url, "https://mirror.example/pypi");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.normalize.comments, CommentPolicy::Drop);
        assert_eq!(settings.normalize.duplicates, DuplicatePolicy::Last);
    }

    #[test]
    fn test_config_can_disable_updates() {
        let config = FileConfig {
            update: Some(false),
            ..Default::default()
        };
        assert!(!Settings::resolve(&args(&["r.txt"]), config).update);
    }

    #[test]
    fn test_zero_timeout_is_raised_to_minimum() {
        let config = FileConfig {
            timeout: Some(0),
            ..Default::default()
        };
        let settings = Settings::resolve(&args(&["r.txt"]), config);
        assert_eq!(settings.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_split_markers_from_config_or_flag() {
        let settings = Settings::resolve(&args(&["r.txt"]), FileConfig::default());
        assert!(!settings.normalize.split_markers);

        let config: FileConfig = toml::from_str("split-markers = true\n").unwrap();
        let settings = Settings::resolve(&args(&["r.txt"]), config);
        assert!(settings.normalize.split_markers);

        let mut cli = args(&["r.txt"]);
        cli.split_markers = true;
        assert!(Settings::resolve(&cli, FileConfig::default()).normalize.split_markers);
    }

    #[test]
    fn test_load_standalone_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "index-url = \"http://localhost:8080/pypi\"\npre-release = true\ncomments = \"drop\"\n",
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.index_url.as_deref(), Some("http://localhost:8080/pypi"));
        assert_eq!(config.pre_release, Some(true));
        assert_eq!(config.comments, Some(CommentPolicy::Drop));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "sort = \"desc\"\n").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert!(matches!(err, UpdateError::Config { .. }));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = FileConfig::discover(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, UpdateError::FileNotFound(_)));
    }

    #[test]
    fn test_discover_pyproject_table() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.update-requirements]\nduplicates = \"first\"\n",
        )
        .unwrap();

        let config = FileConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.duplicates, Some(DuplicatePolicy::First));
    }

    #[test]
    fn test_discover_without_table_or_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            FileConfig::discover(None, dir.path()).unwrap(),
            FileConfig::default()
        );

        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();
        assert_eq!(
            FileConfig::discover(None, dir.path()).unwrap(),
            FileConfig::default()
        );
    }

    #[test]
    fn test_discover_ignores_broken_pyproject() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project\n").unwrap();
        assert_eq!(
            FileConfig::discover(None, dir.path()).unwrap(),
            FileConfig::default()
        );
    }
}
