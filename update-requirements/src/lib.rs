pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod processor;
pub mod pypi;
pub mod resolver;

pub use cli::Args;
pub use config::{FileConfig, Settings};
pub use error::{LookupError, UpdateError};
pub use output::{ChangeRenderer, Sink};
pub use processor::{FileProcessor, FileReport};
pub use pypi::PyPiClient;
pub use resolver::{VersionLookup, VersionResolver};

// Re-export core types for convenience
pub use requirements_core::{
    CommentPolicy, DuplicatePolicy, Line, NormalizeOptions, Requirement, RequirementsDocument,
    UpdateSeverity, Version,
};
