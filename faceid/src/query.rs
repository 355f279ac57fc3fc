use std::fmt;

use serde::Serialize;

use crate::error::{FaceIdError, Result};
use crate::store::IdentityStore;
use crate::vector::FeatureVector;

/// Match is one ranked entry of a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Identity label of the stored reference vector.
    pub label: String,

    /// Distance between the probe and the reference vector.
    /// Lower values indicate higher similarity.
    pub distance: f32,
}

/// ResultSet is the ranked outcome of one query.
///
/// Holds the matches in ascending distance order together with the label the
/// probe claims to be. The subject is carried for reporting and evaluation
/// only; it never filters the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    subject: String,
    matches: Vec<Match>,
}

impl ResultSet {
    /// The identity the probe claims to be.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Matches, closest first.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Closest match, if any.
    pub fn best(&self) -> Option<&Match> {
        self.matches.first()
    }

    /// 1-based rank of `label`, or `None` if it is not among the matches.
    pub fn rank_of(&self, label: &str) -> Option<usize> {
        self.matches
            .iter()
            .position(|m| m.label == label)
            .map(|i| i + 1)
    }

    /// True if the closest match is the claimed subject.
    pub fn is_identified(&self) -> bool {
        self.best().is_some_and(|m| m.label == self.subject)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Match;
    type IntoIter = std::vec::IntoIter<Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "subject: {}", self.subject)?;
        if self.matches.is_empty() {
            return writeln!(f, "  (no matches)");
        }
        for (i, m) in self.matches.iter().enumerate() {
            let mark = if m.label == self.subject { "*" } else { " " };
            writeln!(f, "{mark}{:>4}  {:<24} {:.6}", i + 1, m.label, m.distance)?;
        }
        Ok(())
    }
}

/// Ranks every identity in `store` by distance to `probe`.
///
/// Exact brute-force scan, O(n·d). Matches are sorted by ascending distance;
/// the sort is stable, so equal distances keep the store's enumeration
/// order. `limit` truncates to the closest `limit` matches, and a limit above
/// the store size returns everything. An empty store yields an empty
/// result, not an error.
///
/// Fails with [`FaceIdError::IncompatibleVector`] if the probe's dim differs
/// from the stored vectors'.
pub fn nearest<V: FeatureVector>(
    store: &IdentityStore<V>,
    probe: &V,
    subject: &str,
    limit: Option<usize>,
) -> Result<ResultSet> {
    if let Some(want) = store.dim() {
        if probe.dim() != want {
            return Err(FaceIdError::IncompatibleVector {
                expected: want,
                got: probe.dim(),
            });
        }
    }

    let mut matches = store
        .entries()
        .map(|(label, vector)| {
            Ok(Match {
                label: label.to_string(),
                distance: probe.distance(vector)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    Ok(ResultSet {
        subject: subject.to_string(),
        matches,
    })
}
