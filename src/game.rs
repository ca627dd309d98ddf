use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ExprError, PoolError};
use crate::expr::{evaluate, render_infix, render_postfix, to_postfix, tokenize};
use crate::pool::NumberPool;
use crate::scoring::ScoreTable;
use crate::targets::{RangeTargets, TargetPolicy};

/// Absolute tolerance when comparing an answer with the target.
pub const TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Setup,
    Playing,
    /// Answer accepted; clock frozen and input locked until the player moves on.
    AwaitingRoundAdvance,
    Over,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Correct,
    Incorrect { value: f64 },
    Rejected,
    Removed { value: u64 },
    Info,
    Unchanged,
}

/// What a transition did, for the presentation layer to redraw from.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionDelta {
    pub outcome: Outcome,
    pub message: Option<String>,
    pub phase: Phase,
    pub seconds_remaining: u32,
    pub correct_count: u32,
    /// Pool values whose state changed in this transition.
    pub changed: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Round {
    pub index: usize,
    pub target: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRules {
    pub time_budget_secs: u32,
    pub penalty_secs: u32,
    pub removal_bonus_secs: i32,
    pub rounds: usize,
    pub pool_size: u64,
    pub score_table: ScoreTable,
}

impl Default for GameRules {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GameRules {
    fn from(cfg: &Config) -> Self {
        Self {
            time_budget_secs: cfg.time_budget_secs,
            penalty_secs: cfg.penalty_secs,
            removal_bonus_secs: cfg.removal_bonus_secs,
            rounds: cfg.rounds,
            pool_size: cfg.pool_size,
            score_table: ScoreTable::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub correct_count: u32,
    pub rounds_played: usize,
    pub rounds_total: usize,
    pub score: u32,
    pub seconds_remaining: u32,
}

/// One game from setup to game over.
pub struct GameSession {
    rules: GameRules,
    policy: Box<dyn TargetPolicy>,
    rng: StdRng,
    pool: NumberPool,
    targets: Vec<i64>,
    round_index: usize,
    seconds_remaining: u32,
    correct_count: u32,
    input: String,
    phase: Phase,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("phase", &self.phase)
            .field("round_index", &self.round_index)
            .field("targets", &self.targets)
            .field("seconds_remaining", &self.seconds_remaining)
            .field("correct_count", &self.correct_count)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    pub fn new(rules: GameRules, policy: Box<dyn TargetPolicy>) -> Self {
        Self::with_rng(rules, policy, StdRng::from_entropy())
    }

    pub fn with_rng(rules: GameRules, policy: Box<dyn TargetPolicy>, mut rng: StdRng) -> Self {
        let targets = policy.generate_targets(rules.rounds, &mut rng);
        Self {
            pool: NumberPool::new(rules.pool_size),
            seconds_remaining: rules.time_budget_secs,
            rules,
            policy,
            rng,
            targets,
            round_index: 0,
            correct_count: 0,
            input: String::new(),
            phase: Phase::Setup,
        }
    }

    pub fn from_config(cfg: &Config, seed: Option<u64>) -> Self {
        let policy = Box::new(RangeTargets::new(cfg.target_min, cfg.target_max));
        match seed {
            Some(seed) => Self::with_rng(GameRules::from(cfg), policy, StdRng::seed_from_u64(seed)),
            None => Self::new(GameRules::from(cfg), policy),
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn rounds_total(&self) -> usize {
        self.targets.len()
    }

    pub fn current_round(&self) -> Option<Round> {
        self.targets.get(self.round_index).map(|&target| Round {
            index: self.round_index,
            target,
        })
    }

    /// The countdown only runs while a round is being played.
    pub fn is_clock_running(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn score(&self) -> u32 {
        self.rules.score_table.score(self.correct_count)
    }

    pub fn summary(&self) -> GameSummary {
        let rounds_played = match self.phase {
            Phase::Setup => 0,
            _ => (self.round_index + 1).min(self.targets.len()),
        };
        GameSummary {
            correct_count: self.correct_count,
            rounds_played,
            rounds_total: self.targets.len(),
            score: self.score(),
            seconds_remaining: self.seconds_remaining,
        }
    }

    pub fn start(&mut self) -> SessionDelta {
        if self.phase != Phase::Setup {
            return self.delta(Outcome::Unchanged, None, vec![]);
        }
        if self.targets.is_empty() {
            self.set_phase(Phase::Over);
            return self.delta(Outcome::Info, Some("No rounds to play".into()), vec![]);
        }
        self.input.clear();
        self.set_phase(Phase::Playing);
        info!(
            rounds = self.targets.len(),
            seconds = self.seconds_remaining,
            "game started"
        );
        self.delta(Outcome::Info, None, vec![])
    }

    /// Append to the expression buffer; ignored unless a round is in play.
    pub fn push_char(&mut self, c: char) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.input.push(c);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.phase == Phase::Playing && self.input.pop().is_some()
    }

    pub fn clear_input(&mut self) {
        if self.phase == Phase::Playing {
            self.input.clear();
        }
    }

    /// Submit the expression buffer.
    pub fn submit_input(&mut self) -> SessionDelta {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Check `text` against the current target.
    ///
    /// Rule and syntax errors are reported without touching any state. A
    /// well-formed wrong answer costs `penalty_secs`; a right one consumes
    /// its numbers and freezes the clock until [`GameSession::advance_round`].
    pub fn submit(&mut self, text: &str) -> SessionDelta {
        let message = match self.phase {
            Phase::Playing => None,
            Phase::AwaitingRoundAdvance => Some("Advance to the next round first"),
            Phase::Setup => Some("The game has not started"),
            Phase::Over => Some("The game is over"),
        };
        if let Some(message) = message {
            return self.delta(Outcome::Rejected, Some(message.into()), vec![]);
        }
        let Some(round) = self.current_round() else {
            return self.delta(Outcome::Rejected, Some("No round in play".into()), vec![]);
        };

        if text.trim().is_empty() {
            let err = ExprError::EmptyExpression;
            debug!(%err, "submission rejected");
            return self.delta(Outcome::Rejected, Some(err.to_string()), vec![]);
        }

        let checked = self.pool.validate_usage(text).and_then(|used| {
            let value = evaluate(text)?;
            Ok::<_, PoolError>((used, value))
        });
        let (used, value) = match checked {
            Ok(checked) => checked,
            Err(err) => {
                debug!(%err, text, "submission rejected");
                return self.delta(Outcome::Rejected, Some(err.to_string()), vec![]);
            }
        };

        if (value - round.target as f64).abs() <= TOLERANCE {
            let changed = self.pool.mark_used(&used);
            self.correct_count += 1;
            self.input.clear();
            self.set_phase(Phase::AwaitingRoundAdvance);
            info!(
                round = round.index,
                target = round.target,
                correct = self.correct_count,
                "correct answer"
            );
            let message = format!("Correct! {} = {}", canonical(text), round.target);
            self.delta(Outcome::Correct, Some(message), changed)
        } else {
            self.seconds_remaining = self.seconds_remaining.saturating_sub(self.rules.penalty_secs);
            self.input.clear();
            debug!(
                value,
                target = round.target,
                seconds = self.seconds_remaining,
                "wrong answer"
            );
            let message = format!(
                "{} = {}, not {} (-{}s)",
                canonical(text),
                format_value(value),
                round.target,
                self.rules.penalty_secs
            );
            if self.seconds_remaining == 0 {
                self.finish("time ran out");
            }
            self.delta(Outcome::Incorrect { value }, Some(message), vec![])
        }
    }

    /// One second of clock. A no-op unless a round is in play.
    pub fn tick(&mut self) -> SessionDelta {
        if !self.is_clock_running() {
            return self.delta(Outcome::Unchanged, None, vec![]);
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.finish("time ran out");
            return self.delta(Outcome::Info, Some("Time's up!".into()), vec![]);
        }
        self.delta(Outcome::Unchanged, None, vec![])
    }

    /// Drop a random available number from the pool in exchange for the
    /// configured bonus (or penalty) seconds.
    pub fn remove_random(&mut self) -> SessionDelta {
        if self.phase != Phase::Playing {
            return self.delta(
                Outcome::Rejected,
                Some("Numbers can only be removed during a round".into()),
                vec![],
            );
        }
        match self.pool.remove_random(&mut self.rng) {
            Ok(value) => {
                let bonus = self.rules.removal_bonus_secs;
                self.seconds_remaining = self.seconds_remaining.saturating_add_signed(bonus);
                let message = format!("Removed {value} ({bonus:+}s)");
                if self.seconds_remaining == 0 {
                    self.finish("time ran out");
                }
                self.delta(Outcome::Removed { value }, Some(message), vec![value])
            }
            Err(err) => self.delta(Outcome::Info, Some(err.to_string()), vec![]),
        }
    }

    pub fn advance_round(&mut self) -> SessionDelta {
        if self.phase != Phase::AwaitingRoundAdvance {
            return self.delta(Outcome::Unchanged, None, vec![]);
        }
        if self.round_index + 1 < self.targets.len() {
            self.round_index += 1;
            self.input.clear();
            self.set_phase(Phase::Playing);
            info!(round = self.round_index, "next round");
            self.delta(Outcome::Info, None, vec![])
        } else {
            self.finish("all rounds cleared");
            self.delta(Outcome::Info, Some("All rounds cleared!".into()), vec![])
        }
    }

    pub fn terminate(&mut self) -> SessionDelta {
        match self.phase {
            Phase::Playing | Phase::AwaitingRoundAdvance => {
                self.finish("terminated");
                self.delta(Outcome::Info, Some("Game ended".into()), vec![])
            }
            Phase::Setup | Phase::Over => self.delta(Outcome::Unchanged, None, vec![]),
        }
    }

    /// Back to setup with a fresh pool, target list and clock.
    pub fn restart(&mut self) -> SessionDelta {
        if self.phase != Phase::Over {
            return self.delta(Outcome::Unchanged, None, vec![]);
        }
        self.pool = NumberPool::new(self.rules.pool_size);
        self.targets = self
            .policy
            .generate_targets(self.rules.rounds, &mut self.rng);
        self.round_index = 0;
        self.seconds_remaining = self.rules.time_budget_secs;
        self.correct_count = 0;
        self.input.clear();
        self.set_phase(Phase::Setup);
        info!("game reset");
        self.delta(Outcome::Info, None, vec![])
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
    }

    fn finish(&mut self, reason: &str) {
        self.set_phase(Phase::Over);
        self.input.clear();
        info!(
            reason,
            correct = self.correct_count,
            score = self.score(),
            "game over"
        );
    }

    fn delta(&self, outcome: Outcome, message: Option<String>, changed: Vec<u64>) -> SessionDelta {
        SessionDelta {
            outcome,
            message,
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            correct_count: self.correct_count,
            changed,
        }
    }
}

/// Fully parenthesised form of an expression that already evaluated.
fn canonical(text: &str) -> String {
    tokenize(text)
        .and_then(|tokens| to_postfix(&tokens))
        .and_then(|postfix| {
            debug!(postfix = %render_postfix(&postfix), "canonical form");
            render_infix(&postfix)
        })
        .unwrap_or_else(|_| text.trim().to_string())
}

/// Whole numbers print without a fraction, anything else to 4 places.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.4}")
    }
}
