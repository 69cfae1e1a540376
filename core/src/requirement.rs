use std::fmt;
use thiserror::Error;

/// Version-constraint operator (PEP 440 comparison clause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// ~=
    Compatible,
    /// ===
    Arbitrary,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// <=
    LessOrEqual,
    /// >=
    GreaterOrEqual,
    /// <
    Less,
    /// >
    Greater,
}

impl Comparator {
    /// Operators in matching order: longer tokens first so `===` is not read as `==`
    pub const ALL: [Comparator; 8] = [
        Comparator::Arbitrary,
        Comparator::Compatible,
        Comparator::Equal,
        Comparator::NotEqual,
        Comparator::LessOrEqual,
        Comparator::GreaterOrEqual,
        Comparator::Less,
        Comparator::Greater,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Compatible => "~=",
            Comparator::Arbitrary => "===",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessOrEqual => "<=",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Less => "<",
            Comparator::Greater => ">",
        }
    }

    /// Match an operator at the start of `s`, returning it and the remaining text
    pub fn strip_prefix(s: &str) -> Option<(Comparator, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|op| s.strip_prefix(op.as_str()).map(|rest| (op, rest)))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a requirement pins the package to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    /// Bare package name
    Any,
    /// `<comparator><version>`; `version` is everything after the first
    /// comparator, so `>=2.0,<3.0` keeps `2.0,<3.0` here
    Version {
        comparator: Comparator,
        version: String,
    },
    /// PEP 508 direct reference (`name @ url`)
    Url(String),
}

/// One dependency declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name as written
    pub name: String,
    pub extras: Vec<String>,
    pub spec: Spec,
    /// Environment marker (text after `;`)
    pub marker: Option<String>,
    /// Inline comment text, without the leading `#`
    pub comment: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            spec: Spec::Any,
            marker: None,
            comment: None,
        }
    }

    /// PEP 503 normalized name: lowercase, runs of `-`, `_` and `.` collapsed to `-`
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// The version literal of the first clause, e.g. `2.0` for `>=2.0,<3.0`
    pub fn base_version(&self) -> Option<&str> {
        match &self.spec {
            Spec::Version { version, .. } => version.split(',').next().map(str::trim),
            Spec::Any | Spec::Url(_) => None,
        }
    }

    /// The constraint part as written back, e.g. `>=1.0` or ` @ https://...`
    pub fn spec_string(&self) -> String {
        match &self.spec {
            Spec::Any => String::new(),
            Spec::Version {
                comparator,
                version,
            } => format!("{comparator}{version}"),
            Spec::Url(url) => format!(" @ {url}"),
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        f.write_str(&self.spec_string())?;
        if let Some(marker) = &self.marker {
            // A bare `;` would be read back as part of the URL
            let separator = if matches!(self.spec, Spec::Url(_)) {
                " ; "
            } else {
                "; "
            };
            write!(f, "{separator}{marker}")?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}

/// Why a line could not be read as a requirement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid package name '{0}'")]
    InvalidName(String),
    #[error("invalid extra '{0}'")]
    InvalidExtra(String),
    #[error("unclosed extras bracket")]
    UnclosedExtras,
    #[error("unrecognized version operator in '{0}'")]
    UnknownOperator(String),
    #[error("missing version after '{0}'")]
    MissingVersion(Comparator),
    #[error("invalid version clause '{0}'")]
    InvalidVersion(String),
    #[error("empty environment marker")]
    EmptyMarker,
    #[error("missing URL after '@'")]
    MissingUrl,
}

/// A single line of a requirements file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Requirement(Requirement),
    /// Full-line comment, stored with its `#`
    Comment(String),
    /// pip option line such as `-r base.txt` or `--index-url ...`
    Directive(String),
    Blank,
    /// Unparseable line, kept verbatim
    Malformed { text: String, error: ParseError },
}

impl Line {
    pub fn as_requirement(&self) -> Option<&Requirement> {
        match self {
            Line::Requirement(req) => Some(req),
            _ => None,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Requirement(req) => write!(f, "{req}"),
            Line::Comment(text) | Line::Directive(text) => f.write_str(text),
            Line::Malformed { text, .. } => f.write_str(text),
            Line::Blank => Ok(()),
        }
    }
}
