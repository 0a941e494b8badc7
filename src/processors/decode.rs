//! CTC (Connectionist Temporal Classification) decoding.
//!
//! Collapses a [`Lattice`] into text with either a greedy best-path decode or
//! a prefix beam search. Both are deterministic: ties are broken by the lowest
//! label (greedy) or by prefix order (beam).

use crate::core::constants::DEFAULT_BEAM_WIDTH;
use crate::domain::{Lattice, Vocabulary};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which CTC decoding algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodingPolicy {
    /// Best path: arg-max per step, collapse repeats, drop blanks.
    #[default]
    Greedy,
    /// Prefix beam search.
    Beam,
}

/// Text decoded from one lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl DecodedText {
    fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }
}

/// CTC decoder bound to a vocabulary.
#[derive(Debug, Clone)]
pub struct CTCDecoder {
    policy: DecodingPolicy,
    beam_width: usize,
    vocabulary: Arc<Vocabulary>,
}

/// `ln(exp(a) + exp(b))` without overflow.
fn log_sum_exp(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}

/// Log probabilities of a prefix ending in a blank and in a non-blank.
#[derive(Debug, Clone, Copy)]
struct BeamScore {
    blank: f32,
    non_blank: f32,
}

impl BeamScore {
    const ZERO: BeamScore = BeamScore {
        blank: f32::NEG_INFINITY,
        non_blank: f32::NEG_INFINITY,
    };

    fn total(&self) -> f32 {
        log_sum_exp(self.blank, self.non_blank)
    }
}

fn rank(a: &(Vec<usize>, BeamScore), b: &(Vec<usize>, BeamScore)) -> Ordering {
    b.1.total().total_cmp(&a.1.total()).then_with(|| a.0.cmp(&b.0))
}

impl CTCDecoder {
    pub fn new(policy: DecodingPolicy, beam_width: usize, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            policy,
            beam_width: beam_width.max(1),
            vocabulary,
        }
    }

    /// Greedy decoder over `vocabulary`.
    pub fn greedy(vocabulary: Arc<Vocabulary>) -> Self {
        Self::new(DecodingPolicy::Greedy, DEFAULT_BEAM_WIDTH, vocabulary)
    }

    pub fn policy(&self) -> DecodingPolicy {
        self.policy
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn decode(&self, lattice: &Lattice) -> DecodedText {
        if lattice.time_steps() == 0 || lattice.num_classes() == 0 {
            return DecodedText::empty();
        }
        match self.policy {
            DecodingPolicy::Greedy => self.decode_greedy(lattice),
            DecodingPolicy::Beam => self.decode_beam(lattice),
        }
    }

    fn labels_to_text(&self, labels: impl IntoIterator<Item = usize>) -> String {
        labels
            .into_iter()
            .filter_map(|label| self.vocabulary.symbol(label))
            .collect()
    }

    fn decode_greedy(&self, lattice: &Lattice) -> DecodedText {
        let blank = self.vocabulary.blank();
        let mut labels = Vec::new();
        let mut log_prob_sum = 0.0f64;
        let mut previous: Option<usize> = None;

        for t in 0..lattice.time_steps() {
            let row = lattice.row(t);
            // strict comparison keeps the lowest index on ties
            let (best, best_prob) = row
                .iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |acc, (i, &p)| {
                    if p > acc.1 { (i, p) } else { acc }
                });
            log_prob_sum += (best_prob.max(0.0) as f64).ln();

            if best != blank && previous != Some(best) {
                labels.push(best);
            }
            previous = Some(best);
        }

        let mean = log_prob_sum / lattice.time_steps() as f64;
        let confidence = if mean.is_finite() {
            (mean.exp() as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };
        DecodedText {
            text: self.labels_to_text(labels),
            confidence,
        }
    }

    fn decode_beam(&self, lattice: &Lattice) -> DecodedText {
        let blank = self.vocabulary.blank();
        let mut beams: BTreeMap<Vec<usize>, BeamScore> = BTreeMap::new();
        beams.insert(
            Vec::new(),
            BeamScore {
                blank: 0.0,
                non_blank: f32::NEG_INFINITY,
            },
        );

        for t in 0..lattice.time_steps() {
            let log_probs: Vec<f32> = lattice.row(t).iter().map(|p| p.ln()).collect();
            let mut next: BTreeMap<Vec<usize>, BeamScore> = BTreeMap::new();

            for (prefix, score) in &beams {
                let total = score.total();
                for (label, &lp) in log_probs.iter().enumerate() {
                    if lp == f32::NEG_INFINITY {
                        continue;
                    }
                    if label == blank {
                        let entry = next.entry(prefix.clone()).or_insert(BeamScore::ZERO);
                        entry.blank = log_sum_exp(entry.blank, total + lp);
                        continue;
                    }

                    let mut extended = prefix.clone();
                    extended.push(label);
                    if prefix.last() == Some(&label) {
                        // a repeated label only extends the prefix after a blank
                        let entry = next.entry(extended).or_insert(BeamScore::ZERO);
                        entry.non_blank = log_sum_exp(entry.non_blank, score.blank + lp);
                        let same = next.entry(prefix.clone()).or_insert(BeamScore::ZERO);
                        same.non_blank = log_sum_exp(same.non_blank, score.non_blank + lp);
                    } else {
                        let entry = next.entry(extended).or_insert(BeamScore::ZERO);
                        entry.non_blank = log_sum_exp(entry.non_blank, total + lp);
                    }
                }
            }

            let mut ranked: Vec<(Vec<usize>, BeamScore)> = next.into_iter().collect();
            ranked.sort_by(rank);
            ranked.truncate(self.beam_width);
            beams = ranked.into_iter().collect();
        }

        let mut ranked: Vec<(Vec<usize>, BeamScore)> = beams.into_iter().collect();
        ranked.sort_by(rank);
        match ranked.into_iter().next() {
            Some((labels, score)) => {
                let per_step = score.total() / lattice.time_steps() as f32;
                let confidence = if per_step.is_finite() {
                    per_step.exp().min(1.0)
                } else {
                    0.0
                };
                DecodedText {
                    text: self.labels_to_text(labels),
                    confidence,
                }
            }
            None => DecodedText::empty(),
        }
    }
}
