use crate::parser::RequirementsParser;
use crate::requirement::{Line, ParseError, Requirement};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} policy '{value}' (expected one of: {expected})")]
pub struct PolicyError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// What happens to full-line comments when the file is sorted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentPolicy {
    /// Keep comments, anchored above the sorted entries in their original order
    #[default]
    Top,
    Drop,
}

impl FromStr for CommentPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(CommentPolicy::Top),
            "drop" => Ok(CommentPolicy::Drop),
            _ => Err(PolicyError {
                kind: "comment",
                value: s.to_string(),
                expected: "top, drop",
            }),
        }
    }
}

/// Which entry survives when a package is listed more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Last,
    First,
}

impl FromStr for DuplicatePolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last" => Ok(DuplicatePolicy::Last),
            "first" => Ok(DuplicatePolicy::First),
            _ => Err(PolicyError {
                kind: "duplicate",
                value: s.to_string(),
                expected: "last, first",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub comments: CommentPolicy,
    pub duplicates: DuplicatePolicy,
    /// Treat entries with different environment markers as distinct packages
    pub split_markers: bool,
}

/// What `normalize` changed, for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    /// Entries dropped as duplicates, rendered as they appeared
    pub duplicates_removed: Vec<String>,
    pub comments_dropped: usize,
    pub malformed: usize,
}

/// A parsed requirements file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsDocument {
    pub source: PathBuf,
    pub lines: Vec<Line>,
}

impl RequirementsDocument {
    pub fn parse(source: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            source: source.into(),
            lines: RequirementsParser::new().parse(content),
        }
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.lines.iter().filter_map(Line::as_requirement)
    }

    pub fn requirements_mut(&mut self) -> impl Iterator<Item = &mut Requirement> {
        self.lines.iter_mut().filter_map(|line| match line {
            Line::Requirement(req) => Some(req),
            _ => None,
        })
    }

    /// Malformed lines with their 1-indexed line number, in file order.
    /// Only meaningful before `normalize` reorders the document.
    pub fn malformed(&self) -> impl Iterator<Item = (usize, &str, &ParseError)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| match line {
                Line::Malformed { text, error } => Some((idx + 1, text.as_str(), error)),
                _ => None,
            })
    }

    /// Deduplicate and sort the document in place.
    ///
    /// Resulting layout: directives and (unless dropped) comments in their
    /// original order, then requirement entries sorted case-insensitively by
    /// name, then malformed lines in their original order. Blank lines are
    /// removed. Entries are duplicates when their normalized names match
    /// (and, with `options.split_markers`, their environment markers too);
    /// `options.duplicates` picks the survivor.
    pub fn normalize(&mut self, options: &NormalizeOptions) -> NormalizeSummary {
        let mut summary = NormalizeSummary::default();
        let mut anchored = Vec::new();
        let mut entries: Vec<Requirement> = Vec::new();
        let mut malformed = Vec::new();
        let mut seen: HashMap<(String, Option<String>), usize> = HashMap::new();

        for line in std::mem::take(&mut self.lines) {
            match line {
                Line::Blank => {}
                Line::Comment(_) if options.comments == CommentPolicy::Drop => {
                    summary.comments_dropped += 1;
                }
                Line::Comment(_) | Line::Directive(_) => anchored.push(line),
                Line::Malformed { .. } => malformed.push(line),
                Line::Requirement(req) => {
                    let marker = if options.split_markers {
                        req.marker.clone()
                    } else {
                        None
                    };
                    let key = (req.normalized_name(), marker);
                    match seen.get(&key).copied() {
                        Some(idx) => {
                            let removed = match options.duplicates {
                                DuplicatePolicy::Last => std::mem::replace(&mut entries[idx], req),
                                DuplicatePolicy::First => req,
                            };
                            summary.duplicates_removed.push(removed.to_string());
                        }
                        None => {
                            seen.insert(key, entries.len());
                            entries.push(req);
                        }
                    }
                }
            }
        }

        // Stable: entries sharing a name keep their relative order
        entries.sort_by_cached_key(Requirement::normalized_name);

        summary.malformed = malformed.len();

        self.lines = anchored;
        self.lines.extend(entries.into_iter().map(Line::Requirement));
        self.lines.extend(malformed);

        summary
    }

    /// Serialize back to file text, one line each, newline-terminated
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequirementsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Spec;

    fn normalized(content: &str, options: NormalizeOptions) -> String {
        let mut doc = RequirementsDocument::parse("requirements.txt", content);
        doc.normalize(&options);
        doc.render()
    }

    #[test]
    fn test_sort_case_insensitive() {
        let output = normalized("Zlib==1.0\naiohttp>=3.0\n", NormalizeOptions::default());
        assert_eq!(output, "aiohttp>=3.0\nZlib==1.0\n");
    }

    #[test]
    fn test_sort_uses_normalized_names() {
        let output = normalized(
            "zope.interface\nZope_Event\nattrs\n",
            NormalizeOptions::default(),
        );
        assert_eq!(output, "attrs\nZope_Event\nzope.interface\n");
    }

    #[test]
    fn test_duplicates_last_seen_wins() {
        let mut doc = RequirementsDocument::parse("r.txt", "foo==1.0\nbar\nFoo==2.0\n");
        let summary = doc.normalize(&NormalizeOptions::default());

        assert_eq!(doc.render(), "bar\nFoo==2.0\n");
        assert_eq!(summary.duplicates_removed, vec!["foo==1.0"]);
    }

    #[test]
    fn test_duplicates_first_seen_wins() {
        let options = NormalizeOptions {
            duplicates: DuplicatePolicy::First,
            ..Default::default()
        };
        let output = normalized("foo==1.0\nfoo==2.0\n", options);
        assert_eq!(output, "foo==1.0\n");
    }

    #[test]
    fn test_duplicates_ignore_markers_by_default() {
        let mut doc = RequirementsDocument::parse(
            "r.txt",
            "numpy==1.0\nnumpy==2.0; python_version > '3.8'\n",
        );
        let summary = doc.normalize(&NormalizeOptions::default());

        assert_eq!(doc.requirements().count(), 1);
        assert_eq!(doc.render(), "numpy==2.0; python_version > '3.8'\n");
        assert_eq!(summary.duplicates_removed, vec!["numpy==1.0"]);
    }

    #[test]
    fn test_split_markers_keeps_distinct_markers() {
        let options = NormalizeOptions {
            split_markers: true,
            ..Default::default()
        };
        let output = normalized(
            "numpy==1.24; python_version < '3.9'\n\
             numpy==2.0; python_version >= '3.9'\n\
             numpy==2.1; python_version >= '3.9'\n",
            options,
        );
        assert_eq!(
            output,
            "numpy==1.24; python_version < '3.9'\nnumpy==2.1; python_version >= '3.9'\n"
        );
    }

    #[test]
    fn test_comments_anchored_at_top() {
        let content = "# header\nrequests\n\n-r base.txt\n# about flask\nflask\n";
        let output = normalized(content, NormalizeOptions::default());
        assert_eq!(
            output,
            "# header\n-r base.txt\n# about flask\nflask\nrequests\n"
        );
    }

    #[test]
    fn test_comments_dropped() {
        let options = NormalizeOptions {
            comments: CommentPolicy::Drop,
            ..Default::default()
        };
        let mut doc = RequirementsDocument::parse("r.txt", "# header\nrequests\n-r base.txt\n");
        let summary = doc.normalize(&options);

        assert_eq!(doc.render(), "-r base.txt\nrequests\n");
        assert_eq!(summary.comments_dropped, 1);
    }

    #[test]
    fn test_malformed_preserved_after_entries() {
        let mut doc =
            RequirementsDocument::parse("r.txt", "zlib\n???not-a-package???\naiohttp\n");
        let summary = doc.normalize(&NormalizeOptions::default());

        assert_eq!(doc.render(), "aiohttp\nzlib\n???not-a-package???\n");
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_malformed_line_numbers() {
        let doc = RequirementsDocument::parse("r.txt", "ok\n\n???\n");
        let malformed: Vec<_> = doc.malformed().map(|(n, text, _)| (n, text)).collect();
        assert_eq!(malformed, vec![(3, "???")]);
    }

    #[test]
    fn test_every_package_survives() {
        let content = "b\nA==1\nc>=2\na==2\nB[x]\n";
        let mut doc = RequirementsDocument::parse("r.txt", content);
        doc.normalize(&NormalizeOptions::default());

        let names: Vec<_> = doc.requirements().map(Requirement::normalized_name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_requirements_mut() {
        let mut doc = RequirementsDocument::parse("r.txt", "foo==1.0\n# c\n");
        for req in doc.requirements_mut() {
            req.spec = Spec::Any;
        }
        assert_eq!(doc.render(), "foo\n# c\n");
    }

    #[test]
    fn test_empty_document() {
        let mut doc = RequirementsDocument::parse("r.txt", "\n\n");
        doc.normalize(&NormalizeOptions::default());
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("TOP".parse::<CommentPolicy>(), Ok(CommentPolicy::Top));
        assert_eq!("first".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::First));
        let err = "newest".parse::<DuplicatePolicy>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown duplicate policy 'newest' (expected one of: last, first)"
        );
    }
}
