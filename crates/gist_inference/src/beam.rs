//! Beam-search decoding over an arbitrary decoder.
//!
//! The search only needs per-sequence log-probabilities for the next token,
//! so it is driven through [`DecoderStep`] and knows nothing about tensors.
//! Lengths are measured in decoder tokens and include the start token.

use std::cmp::Ordering;

use gist_core::{Error, GenerationParams, Result};

/// Score given to the idle beams on the first step so only beam 0 expands.
const IDLE_BEAM_SCORE: f64 = -1e9;

pub trait DecoderStep {
    /// Log-probabilities over the vocabulary for the next token of each
    /// sequence. All sequences have the same length.
    fn next_log_probs(&mut self, sequences: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone)]
pub struct BeamSearch {
    num_beams: usize,
    length_penalty: f64,
    early_stopping: bool,
    max_length: usize,
    min_length: usize,
    start_token: u32,
    eos_token: u32,
}

impl BeamSearch {
    pub fn new(params: &GenerationParams, start_token: u32, eos_token: u32) -> Self {
        let max_length = params.max_length.max(1);
        Self {
            num_beams: params.num_beams.max(1),
            length_penalty: params.length_penalty,
            early_stopping: params.early_stopping,
            max_length,
            min_length: params.min_length.min(max_length),
            start_token,
            eos_token,
        }
    }

    /// Run the search and return the best sequence, without the start token
    /// and without the end-of-sequence token.
    pub fn run<D: DecoderStep>(&self, decoder: &mut D) -> Result<Vec<u32>> {
        let num_beams = self.num_beams;
        let mut beams = vec![vec![self.start_token]; num_beams];
        let mut scores = vec![IDLE_BEAM_SCORE; num_beams];
        scores[0] = 0.0;

        let mut hypotheses = Hypotheses::new(num_beams, self.length_penalty, self.early_stopping);
        let mut cur_len = 1;
        let mut done = false;

        while cur_len < self.max_length {
            let log_probs = decoder.next_log_probs(&beams)?;
            if log_probs.len() != beams.len() {
                return Err(Error::Inference(format!(
                    "decoder returned {} rows for {} beams",
                    log_probs.len(),
                    beams.len()
                )));
            }

            let banned = (cur_len < self.min_length).then_some(self.eos_token);
            let candidates = self.candidates(&scores, &log_probs, banned);

            let mut next_beams = Vec::with_capacity(num_beams);
            let mut next_scores = Vec::with_capacity(num_beams);
            for (rank, candidate) in candidates.iter().enumerate() {
                if candidate.token == self.eos_token {
                    if rank < num_beams {
                        hypotheses.add(beams[candidate.beam].clone(), candidate.score);
                    }
                } else {
                    let mut sequence = beams[candidate.beam].clone();
                    sequence.push(candidate.token);
                    next_beams.push(sequence);
                    next_scores.push(candidate.score);
                }
                if next_beams.len() == num_beams {
                    break;
                }
            }

            cur_len += 1;
            beams = next_beams;
            scores = next_scores;

            let Some(best) = scores.iter().copied().reduce(f64::max) else {
                done = true;
                break;
            };
            if hypotheses.is_done(best, cur_len) {
                done = true;
                break;
            }
        }

        if !done {
            for (sequence, score) in beams.into_iter().zip(scores) {
                hypotheses.add(sequence, score);
            }
        }

        let mut best = hypotheses
            .best()
            .ok_or_else(|| Error::Inference("beam search produced no hypothesis".to_string()))?;
        best.remove(0);
        Ok(best)
    }

    /// Top `2 * num_beams` continuations across all beams, best first.
    fn candidates(&self, scores: &[f64], log_probs: &[Vec<f32>], banned: Option<u32>) -> Vec<Candidate> {
        let width = 2 * self.num_beams;
        let mut candidates: Vec<Candidate> = log_probs
            .iter()
            .enumerate()
            .flat_map(|(beam, row)| {
                top_k(row, width, banned).into_iter().map(move |(token, log_prob)| Candidate {
                    score: scores[beam] + log_prob as f64,
                    beam,
                    token,
                })
            })
            .collect();
        candidates.sort_by(Candidate::rank);
        candidates.truncate(width);
        candidates
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    beam: usize,
    token: u32,
}

impl Candidate {
    fn rank(a: &Self, b: &Self) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then(a.beam.cmp(&b.beam))
            .then(a.token.cmp(&b.token))
    }
}

fn top_k(row: &[f32], k: usize, banned: Option<u32>) -> Vec<(u32, f32)> {
    let order = |a: &u32, b: &u32| {
        row[*b as usize]
            .total_cmp(&row[*a as usize])
            .then(a.cmp(b))
    };
    let mut tokens: Vec<u32> = (0..row.len() as u32)
        .filter(|token| Some(*token) != banned)
        .collect();
    if tokens.len() > k && k > 0 {
        tokens.select_nth_unstable_by(k - 1, order);
        tokens.truncate(k);
    }
    tokens.sort_by(order);
    tokens.truncate(k);
    tokens.into_iter().map(|token| (token, row[token as usize])).collect()
}

/// Finished sequences, capped at `num_beams` entries.
#[derive(Debug)]
struct Hypotheses {
    num_beams: usize,
    length_penalty: f64,
    early_stopping: bool,
    entries: Vec<(f64, Vec<u32>)>,
    worst_score: f64,
}

impl Hypotheses {
    fn new(num_beams: usize, length_penalty: f64, early_stopping: bool) -> Self {
        Self {
            num_beams,
            length_penalty,
            early_stopping,
            entries: Vec::with_capacity(num_beams + 1),
            worst_score: 1e9,
        }
    }

    fn penalized(&self, sum_log_probs: f64, len: usize) -> f64 {
        sum_log_probs / (len as f64).powf(self.length_penalty)
    }

    fn add(&mut self, sequence: Vec<u32>, sum_log_probs: f64) {
        let score = self.penalized(sum_log_probs, sequence.len());
        if self.entries.len() < self.num_beams || score > self.worst_score {
            self.entries.push((score, sequence));
            if self.entries.len() > self.num_beams {
                let worst = self
                    .entries
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
                    .map(|(idx, _)| idx);
                if let Some(idx) = worst {
                    self.entries.remove(idx);
                }
            }
            self.worst_score = self
                .entries
                .iter()
                .map(|(score, _)| *score)
                .reduce(f64::min)
                .unwrap_or(score);
        }
    }

    fn is_done(&self, best_sum_log_probs: f64, cur_len: usize) -> bool {
        if self.entries.len() < self.num_beams {
            return false;
        }
        if self.early_stopping {
            return true;
        }
        self.worst_score >= self.penalized(best_sum_log_probs, cur_len)
    }

    /// Highest score wins; the earliest added entry wins a tie.
    fn best(self) -> Option<Vec<u32>> {
        let mut best: Option<(f64, Vec<u32>)> = None;
        for (score, sequence) in self.entries {
            match &best {
                Some((best_score, _)) if *best_score >= score => {}
                _ => best = Some((score, sequence)),
            }
        }
        best.map(|(_, sequence)| sequence)
    }
}
