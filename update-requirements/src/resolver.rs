use crate::error::LookupError;
use indicatif::ProgressBar;
use requirements_core::{
    Comparator, Requirement, RequirementsDocument, Spec, UpdateSeverity, Version,
};
use std::future::Future;
use std::str::FromStr;

/// Source of "latest version" answers, e.g. a package index
pub trait VersionLookup {
    /// `Ok(None)` when the index does not know the package
    fn latest_version(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Version>, LookupError>> + Send;
}

/// A pin rewritten to a newer version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: String,
    /// Constraint before the update, empty for a bare name
    pub from: String,
    pub to: String,
    /// Compared on the first version clause; `None` when either side does
    /// not parse or nothing newer was found
    pub severity: Option<UpdateSeverity>,
}

/// An entry whose latest version could not be determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub changes: Vec<Change>,
    pub failures: Vec<LookupFailure>,
    pub unchanged: usize,
}

/// Point `req` at `latest`.
///
/// The version literal is overwritten whatever the comparator says. Bare
/// names and `==` pins become `~=latest`; other comparators are kept, and a
/// multi-clause constraint such as `>=2.0,<3.0` is replaced wholesale.
/// Direct URL references are left alone.
pub fn apply_latest(req: &mut Requirement, latest: &Version) -> Option<Change> {
    let comparator = match &req.spec {
        Spec::Url(_) => return None,
        Spec::Any
        | Spec::Version {
            comparator: Comparator::Equal,
            ..
        } => Comparator::Compatible,
        Spec::Version { comparator, .. } => *comparator,
    };

    let from = req.spec_string();
    let previous = req.base_version().and_then(|v| Version::from_str(v).ok());

    req.spec = Spec::Version {
        comparator,
        version: latest.to_string(),
    };

    let to = req.spec_string();
    if from == to {
        return None;
    }

    Some(Change {
        name: req.name.clone(),
        from,
        to,
        severity: previous.and_then(|previous| UpdateSeverity::between(&previous, latest)),
    })
}

/// Rewrites every entry of a document to its latest version
pub struct VersionResolver<'a, L> {
    lookup: &'a L,
    progress: ProgressBar,
}

impl<'a, L: VersionLookup> VersionResolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Look up and apply the latest version for each entry in turn. A failed
    /// lookup is recorded and the entry left unchanged; the rest still run.
    pub async fn resolve(&self, document: &mut RequirementsDocument) -> ResolveReport {
        let mut report = ResolveReport::default();

        let total = document
            .requirements()
            .filter(|req| !matches!(req.spec, Spec::Url(_)))
            .count();
        self.progress.set_length(total as u64);
        self.progress.set_position(0);

        for req in document.requirements_mut() {
            if matches!(req.spec, Spec::Url(_)) {
                tracing::debug!("{}: direct reference, not looked up", req.name);
                continue;
            }

            let name = req.normalized_name();
            self.progress.set_message(name.clone());

            match self.lookup.latest_version(&name).await {
                Ok(Some(latest)) => match apply_latest(req, &latest) {
                    Some(change) => {
                        tracing::debug!("{}: {} -> {}", change.name, change.from, change.to);
                        report.changes.push(change);
                    }
                    None => {
                        tracing::debug!("{}: already at {latest}", req.name);
                        report.unchanged += 1;
                    }
                },
                Ok(None) => {
                    tracing::warn!("{}: not found on the package index", req.name);
                    report.failures.push(LookupFailure {
                        name: req.name.clone(),
                        reason: "not found".to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("{}: {e}", req.name);
                    report.failures.push(LookupFailure {
                        name: req.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        report
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// In-memory lookup: known packages, unknown packages, and packages
    /// whose lookup fails
    #[derive(Debug, Default)]
    pub(crate) struct StaticLookup {
        latest: HashMap<String, String>,
        failing: HashSet<String>,
    }

    impl StaticLookup {
        pub(crate) fn new(latest: &[(&str, &str)]) -> Self {
            Self {
                latest: latest
                    .iter()
                    .map(|(name, version)| (name.to_string(), version.to_string()))
                    .collect(),
                failing: HashSet::new(),
            }
        }

        pub(crate) fn failing(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }
    }

    impl VersionLookup for StaticLookup {
        async fn latest_version(&self, name: &str) -> Result<Option<Version>, LookupError> {
            if self.failing.contains(name) {
                return Err(LookupError::Status {
                    name: name.to_string(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            Ok(self
                .latest
                .get(name)
                .map(|version| Version::from_str(version).expect("valid test version")))
        }
    }
}
