use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
}

/// PEP 440 public version pattern, matched against the lowercased input
static VERSION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^v?(?:(?P<epoch>\d+)!)?(?P<release>\d+(?:\.\d+)*)(?:[-_.]?(?P<pre_tag>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_num>\d+)?)?(?:-(?P<post_implicit>\d+)|[-_.]?(?P<post_tag>post|rev|r)[-_.]?(?P<post_num>\d+)?)?(?:[-_.]?(?P<dev_tag>dev)[-_.]?(?P<dev_num>\d+)?)?$",
    )
    .expect("version pattern is valid")
});

/// Pre-release phase, ordered alpha < beta < rc
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha(u64),
    Beta(u64),
    Rc(u64),
}

/// A parsed PEP 440 version
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    /// Release segments, e.g. `[1, 2, 3]` for `1.2.3`
    pub release: Vec<u64>,
    pub pre_release: Option<PreRelease>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    /// Local version label (after `+`), ignored for ordering
    pub local: Option<String>,
    /// Original string representation
    pub original: String,
}

impl Version {
    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    pub fn patch(&self) -> u64 {
        self.segment(2)
    }

    fn segment(&self, idx: usize) -> u64 {
        self.release.get(idx).copied().unwrap_or(0)
    }

    /// Check if this is a pre-release (or development) version
    pub fn is_prerelease(&self) -> bool {
        self.pre_release.is_some() || self.dev.is_some()
    }

    /// Check if this version is in the same major series as another
    pub fn same_major(&self, other: &Version) -> bool {
        self.epoch == other.epoch && self.major() == other.major()
    }

    /// Check if this version is in the same minor series as another
    pub fn same_minor(&self, other: &Version) -> bool {
        self.same_major(other) && self.minor() == other.minor()
    }

    /// Release segments with trailing zeros removed, so `1.0` == `1.0.0`
    fn trimmed_release(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |idx| idx + 1);
        &self.release[..len]
    }

    /// Sort key for the pre-release slot. A bare `.devN` sorts before any
    /// pre-release of the same release, a final release sorts after them.
    fn pre_key(&self) -> (u8, Option<PreRelease>) {
        match (self.pre_release, self.post, self.dev) {
            (None, None, Some(_)) => (0, None),
            (Some(pre), _, _) => (1, Some(pre)),
            (None, _, _) => (2, None),
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (public, local) = match s.split_once('+') {
            Some((public, local)) if !local.is_empty() => (public, Some(local.to_string())),
            Some(_) => return Err(VersionError::InvalidVersion(s.to_string())),
            None => (s, None),
        };

        let lowered = public.to_lowercase();
        let caps = VERSION_RE
            .captures(&lowered)
            .ok_or_else(|| VersionError::InvalidVersion(s.to_string()))?;

        let number = |name: &str| -> Result<Option<u64>, VersionError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>())
                .transpose()
                .map_err(|_| VersionError::InvalidVersion(s.to_string()))
        };

        let epoch = number("epoch")?.unwrap_or(0);

        let release = caps
            .name("release")
            .map_or("", |m| m.as_str())
            .split('.')
            .map(str::parse::<u64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::InvalidVersion(s.to_string()))?;

        let pre_num = number("pre_num")?.unwrap_or(0);
        let pre_release = caps.name("pre_tag").map(|tag| match tag.as_str() {
            "a" | "alpha" => PreRelease::Alpha(pre_num),
            "b" | "beta" => PreRelease::Beta(pre_num),
            _ => PreRelease::Rc(pre_num),
        });

        let post = match number("post_implicit")? {
            Some(n) => Some(n),
            None if caps.name("post_tag").is_some() => Some(number("post_num")?.unwrap_or(0)),
            None => None,
        };

        let dev = if caps.name("dev_tag").is_some() {
            Some(number("dev_num")?.unwrap_or(0))
        } else {
            None
        };

        Ok(Version {
            epoch,
            release,
            pre_release,
            post,
            dev,
            local,
            original: s.to_string(),
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            // No post release sorts before any post release
            .then_with(|| self.post.cmp(&other.post))
            // No dev release sorts after any dev release
            .then_with(|| match (self.dev, other.dev) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Severity of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSeverity {
    Major,
    Minor,
    Patch,
}

impl UpdateSeverity {
    /// Classify the move from `from` to `to`. Returns `None` when `to` is not newer.
    pub fn between(from: &Version, to: &Version) -> Option<Self> {
        if to <= from {
            None
        } else if !from.same_major(to) {
            Some(UpdateSeverity::Major)
        } else if !from.same_minor(to) {
            Some(UpdateSeverity::Minor)
        } else {
            Some(UpdateSeverity::Patch)
        }
    }
}
