pub mod document;
pub mod parser;
pub mod requirement;
pub mod version;

// Re-export commonly used types at crate root
pub use document::{
    CommentPolicy, DuplicatePolicy, NormalizeOptions, NormalizeSummary, PolicyError,
    RequirementsDocument,
};
pub use parser::RequirementsParser;
pub use requirement::{Comparator, Line, ParseError, Requirement, Spec, normalize_name};
pub use version::{PreRelease, UpdateSeverity, Version, VersionError};
