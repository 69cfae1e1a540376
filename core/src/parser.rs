use crate::requirement::{Comparator, Line, ParseError, Requirement, Spec};
use std::sync::LazyLock;

static NAME_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)^[a-z0-9](?:[a-z0-9._-]*[a-z0-9])?$").expect("name pattern is valid")
});

static VERSION_CLAUSE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9.*+!_-]+$").expect("version pattern is valid")
});

/// Characters that can start a version operator
const OPERATOR_CHARS: [char; 5] = ['<', '>', '=', '!', '~'];

/// Parser for requirements.txt files
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementsParser;

impl RequirementsParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the full text of a requirements file, one `Line` per input line
    pub fn parse(&self, content: &str) -> Vec<Line> {
        content.lines().map(|line| self.parse_line(line)).collect()
    }

    /// Parse a single line. Never fails: unreadable lines come back as
    /// `Line::Malformed` carrying the original text.
    pub fn parse_line(&self, line: &str) -> Line {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return Line::Blank;
        }

        if trimmed.starts_with('#') {
            return Line::Comment(trimmed.to_string());
        }

        // -r, -c, -e, --index-url and other pip options
        if trimmed.starts_with('-') {
            return Line::Directive(trimmed.to_string());
        }

        match Self::parse_requirement(trimmed) {
            Ok(requirement) => Line::Requirement(requirement),
            Err(error) => Line::Malformed {
                text: line.to_string(),
                error,
            },
        }
    }

    fn parse_requirement(line: &str) -> Result<Requirement, ParseError> {
        let (body, comment) = split_inline_comment(line);

        let (name_part, spec, marker) = match split_direct_reference(body) {
            Some((name_part, rest)) => {
                // After a URL the marker separator must follow whitespace
                let (url, marker) = split_marker(rest, true)?;
                if url.is_empty() {
                    return Err(ParseError::MissingUrl);
                }
                (name_part, Spec::Url(url.to_string()), marker)
            }
            None => {
                // Environment markers: "package>=1.0; python_version >= '3.8'"
                let (body, marker) = split_marker(body, false)?;
                let (name_part, spec) = Self::split_package_version(body)?;
                (name_part, spec, marker)
            }
        };

        let (name, extras) = Self::split_extras(name_part.trim())?;

        if !NAME_RE.is_match(name) {
            return Err(ParseError::InvalidName(name.to_string()));
        }

        Ok(Requirement {
            name: name.to_string(),
            extras,
            spec,
            marker,
            comment,
        })
    }

    /// Split on the first operator character. Returns the package part
    /// (with extras) and the parsed spec.
    fn split_package_version(spec: &str) -> Result<(&str, Spec), ParseError> {
        let Some(idx) = spec.find(OPERATOR_CHARS) else {
            return Ok((spec, Spec::Any));
        };

        let package = &spec[..idx];
        let rest = &spec[idx..];

        let (comparator, version) = Comparator::strip_prefix(rest)
            .ok_or_else(|| ParseError::UnknownOperator(rest.trim().to_string()))?;

        let version = version.trim();
        if version.is_empty() {
            return Err(ParseError::MissingVersion(comparator));
        }

        validate_version_clauses(version)?;

        Ok((
            package,
            Spec::Version {
                comparator,
                version: version.to_string(),
            },
        ))
    }

    /// Split "package[extra1,extra2]" into name and extras
    fn split_extras(package: &str) -> Result<(&str, Vec<String>), ParseError> {
        let Some((name, extras)) = package.split_once('[') else {
            return Ok((package, Vec::new()));
        };

        let extras = extras
            .trim_end()
            .strip_suffix(']')
            .ok_or(ParseError::UnclosedExtras)?;

        let extras = extras
            .split(',')
            .map(str::trim)
            .filter(|extra| !extra.is_empty())
            .map(|extra| {
                if NAME_RE.is_match(extra) {
                    Ok(extra.to_string())
                } else {
                    Err(ParseError::InvalidExtra(extra.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((name.trim_end(), extras))
    }
}

/// Inline comments start at a `#` preceded by whitespace
fn split_inline_comment(line: &str) -> (&str, Option<String>) {
    let idx = line
        .char_indices()
        .zip(line.chars().skip(1))
        .find(|((_, c), next)| c.is_whitespace() && *next == '#')
        .map(|((idx, _), _)| idx);

    match idx {
        Some(idx) => {
            let comment = line[idx..].trim_start().trim_start_matches('#').trim();
            let comment = (!comment.is_empty()).then(|| comment.to_string());
            (line[..idx].trim_end(), comment)
        }
        None => (line, None),
    }
}

/// Split "name @ url" at the `@`, unless a marker starts before it
fn split_direct_reference(body: &str) -> Option<(&str, &str)> {
    let at = body.find('@')?;
    match body.find(';') {
        Some(semi) if semi < at => None,
        _ => Some((&body[..at], &body[at + 1..])),
    }
}

/// Split off a trailing environment marker. With `after_url`, only a `;`
/// preceded by whitespace starts the marker.
fn split_marker(text: &str, after_url: bool) -> Result<(&str, Option<String>), ParseError> {
    let idx = if after_url {
        text.match_indices(';')
            .map(|(idx, _)| idx)
            .find(|idx| text[..*idx].ends_with(char::is_whitespace))
    } else {
        text.find(';')
    };

    let Some(idx) = idx else {
        return Ok((text.trim(), None));
    };

    let marker = text[idx + 1..].trim();
    if marker.is_empty() {
        return Err(ParseError::EmptyMarker);
    }
    Ok((text[..idx].trim(), Some(marker.to_string())))
}

/// Check "1.0" and "2.0, <3.0, !=2.5" style version text
fn validate_version_clauses(version: &str) -> Result<(), ParseError> {
    let invalid = || ParseError::InvalidVersion(version.to_string());

    let mut clauses = version.split(',').map(str::trim);

    let first = clauses.next().ok_or_else(invalid)?;
    if !VERSION_CLAUSE_RE.is_match(first) {
        return Err(invalid());
    }

    for clause in clauses {
        let (_, clause_version) = Comparator::strip_prefix(clause).ok_or_else(invalid)?;
        if !VERSION_CLAUSE_RE.is_match(clause_version.trim()) {
            return Err(invalid());
        }
    }

    Ok(())
}
