#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a temporary project directory
pub struct TempProject {
    pub dir: TempDir,
}

impl TempProject {
    /// Create a new temporary project
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    /// Get the path to the project directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file in the project with the given content, returning its path
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(relative_path);

        // Create parent directories if needed
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Get the absolute path to a file in the project
    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }

    pub fn read_file(&self, relative_path: &str) -> String {
        fs::read_to_string(self.file_path(relative_path)).expect("Failed to read file")
    }

    /// The binary, run from inside the project with a clean logging environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("update_requirements").expect("binary is built");
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// An unsorted requirements.txt with comments, blanks, duplicates and a bad line
pub fn sample_requirements_txt() -> &'static str {
    r#"# Sample requirements.txt
requests==2.28.0
Zlib==1.0

aiohttp>=3.0
-r requirements-base.txt
numpy>=1.24.0  # pinned for py3.9
???not-a-package???
Requests==2.31.0
"#
}

/// What `sample_requirements_txt` looks like after sorting without updates
pub fn sample_requirements_sorted() -> &'static str {
    r#"# Sample requirements.txt
-r requirements-base.txt
aiohttp>=3.0
numpy>=1.24.0  # pinned for py3.9
Requests==2.31.0
Zlib==1.0
???not-a-package???
"#
}

/// Create a project holding the sample requirements.txt
pub fn create_temp_project_with_requirements() -> TempProject {
    let project = TempProject::new();
    project.create_file("requirements.txt", sample_requirements_txt());
    project
}

/// Minimal PyPI JSON API body for a package
pub fn pypi_body(name: &str, version: &str) -> serde_json::Value {
    serde_json::json!({
        "info": { "name": name, "version": version },
        "releases": { version: [{ "yanked": false }] }
    })
}
