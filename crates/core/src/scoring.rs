//! Bins, round bookkeeping and termination policies.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GameError};

/// How a round decides it is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TerminationMode {
    /// Win once every bin reaches `per_bin`; lose if the aggregate reaches
    /// `aggregate_ceiling` first.
    Threshold {
        /// Score each bin must reach.
        per_bin: u32,
        /// Aggregate weight that ends the round in a loss.
        aggregate_ceiling: u32,
    },
    /// Win once the deposited tile count reaches `target_percent` of
    /// `denominator`. Never loses.
    SimpleProgress {
        /// Tile count that corresponds to 100 %.
        denominator: u32,
        /// Percentage that completes the round.
        target_percent: u32,
    },
}

impl Default for TerminationMode {
    fn default() -> Self {
        TerminationMode::Threshold {
            per_bin: 250,
            aggregate_ceiling: 1000,
        }
    }
}

impl TerminationMode {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            TerminationMode::Threshold {
                per_bin,
                aggregate_ceiling,
            } => {
                if per_bin == 0 {
                    return Err(ConfigError::Zero("per-bin threshold"));
                }
                if aggregate_ceiling == 0 {
                    return Err(ConfigError::Zero("aggregate ceiling"));
                }
            }
            TerminationMode::SimpleProgress {
                denominator,
                target_percent,
            } => {
                if denominator == 0 {
                    return Err(ConfigError::Zero("progress denominator"));
                }
                if !(1..=100).contains(&target_percent) {
                    return Err(ConfigError::TargetOutOfRange(target_percent));
                }
            }
        }
        Ok(())
    }

    /// Decide whether `round` has reached a terminal outcome.
    pub fn evaluate(&self, round: &Round) -> Option<Outcome> {
        match *self {
            TerminationMode::Threshold {
                per_bin,
                aggregate_ceiling,
            } => {
                let all_full = round.bins.iter().all(|bin| bin.score >= per_bin);
                let overflow = round.aggregate >= aggregate_ceiling;
                if overflow {
                    Some(Outcome::Lost)
                } else if all_full {
                    Some(Outcome::Won)
                } else {
                    None
                }
            }
            TerminationMode::SimpleProgress { target_percent, .. } => {
                if self.progress_percent(round) >= target_percent as f32 {
                    Some(Outcome::Won)
                } else {
                    None
                }
            }
        }
    }

    /// Overall progress shown on the main gauge, clamped to 0..=100.
    pub fn progress_percent(&self, round: &Round) -> f32 {
        let (numerator, denominator) = match *self {
            TerminationMode::Threshold {
                aggregate_ceiling, ..
            } => (round.aggregate, aggregate_ceiling),
            TerminationMode::SimpleProgress { denominator, .. } => (round.deposited, denominator),
        };
        percent(numerator, denominator)
    }

    /// Fill level of a single bin, when the mode defines one.
    pub fn bin_percent(&self, bin: &Bin) -> Option<f32> {
        match *self {
            TerminationMode::Threshold { per_bin, .. } => Some(percent(bin.score, per_bin)),
            TerminationMode::SimpleProgress { .. } => None,
        }
    }
}

fn percent(numerator: u32, denominator: u32) -> f32 {
    if denominator == 0 {
        return 100.0;
    }
    (numerator as f32 * 100.0 / denominator as f32).min(100.0)
}

/// Terminal disposition of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every goal met.
    Won,
    /// The round overflowed.
    Lost,
}

/// A scored destination for deposits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    values: Vec<u32>,
    score: u32,
}

impl Bin {
    /// Deposited values in arrival order.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Sum of deposited weights.
    pub fn score(&self) -> u32 {
        self.score
    }
}

/// One tile's contribution to a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// Label appended to the bin.
    pub value: u32,
    /// Weight added to the bin and the aggregate.
    pub weight: u32,
}

/// Per-round scores and terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    bins: Vec<Bin>,
    aggregate: u32,
    deposited: u32,
    outcome: Option<Outcome>,
}

impl Round {
    /// Fresh round with `bin_count` empty bins.
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![Bin::default(); bin_count],
            aggregate: 0,
            deposited: 0,
            outcome: None,
        }
    }

    /// Bins in index order.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Sum of every deposited weight this round.
    pub fn aggregate(&self) -> u32 {
        self.aggregate
    }

    /// Number of tiles deposited this round.
    pub fn deposited(&self) -> u32 {
        self.deposited
    }

    /// Terminal outcome, once reached.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Whether any ending condition fired.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the round ended in a win.
    pub fn is_won(&self) -> bool {
        self.outcome == Some(Outcome::Won)
    }

    /// Check that `bin` can accept a deposit right now.
    pub fn ensure_accepting(&self, bin: usize) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::RoundOver);
        }
        if bin >= self.bins.len() {
            return Err(GameError::UnknownBin {
                bin,
                bins: self.bins.len(),
            });
        }
        Ok(())
    }

    /// Add `deposits` to `bin` and the aggregate, then evaluate `mode`.
    /// Returns the weight added.
    pub fn record(
        &mut self,
        bin: usize,
        deposits: &[Deposit],
        mode: &TerminationMode,
    ) -> Result<u32, GameError> {
        self.ensure_accepting(bin)?;
        let target = &mut self.bins[bin];
        let mut added = 0u32;
        for deposit in deposits {
            target.values.push(deposit.value);
            target.score = target.score.saturating_add(deposit.weight);
            added = added.saturating_add(deposit.weight);
        }
        self.aggregate = self.aggregate.saturating_add(added);
        self.deposited = self
            .deposited
            .saturating_add(u32::try_from(deposits.len()).unwrap_or(u32::MAX));
        self.outcome = mode.evaluate(self);
        Ok(added)
    }
}
