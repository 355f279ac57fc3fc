//! Rank-k identification accuracy over a set of labeled probes.

use std::borrow::Borrow;

use serde::Serialize;
use tracing::debug;

use crate::error::{FaceIdError, Result};
use crate::extractor::FeatureExtractor;
use crate::model::FaceModel;
use crate::query::{nearest, Match};

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub subject: String,
    /// 1-based rank of the subject's own identity; `None` if not enrolled.
    pub rank: Option<usize>,
    /// Closest identity, if the store was non-empty.
    pub best: Option<Match>,
}

/// Aggregate of an [`evaluate`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Cutoff used for `topk`.
    pub k: usize,
    /// Number of probes.
    pub total: usize,
    /// Probes whose subject ranked first.
    pub top1: usize,
    /// Probes whose subject ranked within the first `k`.
    pub topk: usize,
    /// Probes whose subject is not enrolled at all.
    pub missing: usize,
    pub outcomes: Vec<ProbeOutcome>,
}

impl Evaluation {
    pub fn top1_accuracy(&self) -> f64 {
        ratio(self.top1, self.total)
    }

    pub fn topk_accuracy(&self) -> f64 {
        ratio(self.topk, self.total)
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 { 0.0 } else { n as f64 / d as f64 }
}

/// Queries `model` with every `(subject, image)` probe and reports how often
/// the subject's own identity ranks first and within the first `k`.
///
/// All probes run against one snapshot. The first extraction failure aborts
/// the run.
pub fn evaluate<E, I, L, B>(model: &FaceModel<E>, probes: I, k: usize) -> Result<Evaluation>
where
    E: FeatureExtractor,
    I: IntoIterator<Item = (L, B)>,
    L: Into<String>,
    B: Borrow<E::Image>,
{
    let snapshot = model.snapshot();
    let mut eval = Evaluation {
        k,
        ..Default::default()
    };

    for (subject, image) in probes {
        let subject = subject.into();
        let probe = model
            .extractor()
            .extract(image.borrow())
            .map_err(|source| FaceIdError::Extraction {
                label: subject.clone(),
                source,
            })?;
        let rs = nearest(&snapshot, &probe, &subject, None)?;

        let rank = rs.rank_of(&subject);
        eval.total += 1;
        match rank {
            None => eval.missing += 1,
            Some(r) => {
                if r == 1 {
                    eval.top1 += 1;
                }
                if r <= k {
                    eval.topk += 1;
                }
            }
        }
        debug!(subject = %subject, ?rank, "evaluated probe");
        eval.outcomes.push(ProbeOutcome {
            subject,
            rank,
            best: rs.best().cloned(),
        });
    }

    Ok(eval)
}
