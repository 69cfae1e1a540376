use clap::Parser;
use requirements_core::{CommentPolicy, DuplicatePolicy};
use std::path::PathBuf;

/// Update requirements.txt files (optionally in-place)
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "update_requirements")]
#[command(author, version, about)]
#[command(
    long_about = "Update requirements.txt files (optionally in-place).\n\n\
    Entries are deduplicated, sorted by package name and their versions set to \
    the latest release on the package index.\n\n\
    NOTE: version numbers are updated without regard for the version comparison \
    operators in the requirements file; bare names and == pins become ~=<latest>."
)]
pub struct Args {
    /// Path to the requirements file
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Enable more verbose output
    #[arg(short, long)]
    pub debug: bool,

    /// Update the file in-place instead of printing to stdout
    #[arg(short, long)]
    pub inplace: bool,

    /// Only sort and deduplicate; do not look up latest versions
    #[arg(short = 'n', long)]
    pub no_update: bool,

    /// Allow pre-release versions as the latest version
    #[arg(short, long)]
    pub pre_release: bool,

    /// Base URL of the package index JSON API [default: https://pypi.org/pypi]
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// What to do with comment lines: top, drop [default: top]
    #[arg(long, value_name = "POLICY")]
    pub comments: Option<CommentPolicy>,

    /// Which duplicate entry wins: last, first [default: last]
    #[arg(long, value_name = "POLICY")]
    pub duplicates: Option<DuplicatePolicy>,

    /// Keep same-named entries whose environment markers differ
    #[arg(long)]
    pub split_markers: bool,

    /// Read settings from this TOML file instead of ./pyproject.toml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
