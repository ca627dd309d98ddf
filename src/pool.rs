use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::PoolError;
use crate::expr::{numbers, tokenize};

pub const DEFAULT_POOL_SIZE: u64 = 100;

/// Lifecycle of a pool number. Transitions only ever leave `Available`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum NumberState {
    Available,
    Used,
    Removed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolNumber {
    pub value: u64,
    pub state: NumberState,
}

/// The numbers `1..=size`, each consumable once.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberPool {
    numbers: Vec<PoolNumber>,
}

impl Default for NumberPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl NumberPool {
    pub fn new(size: u64) -> Self {
        let numbers = (1..=size)
            .map(|value| PoolNumber {
                value,
                state: NumberState::Available,
            })
            .collect();
        Self { numbers }
    }

    pub fn size(&self) -> u64 {
        self.numbers.len() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolNumber> {
        self.numbers.iter()
    }

    pub fn get(&self, value: u64) -> Option<&PoolNumber> {
        let idx = usize::try_from(value.checked_sub(1)?).ok()?;
        self.numbers.get(idx)
    }

    fn get_mut(&mut self, value: u64) -> Option<&mut PoolNumber> {
        let idx = usize::try_from(value.checked_sub(1)?).ok()?;
        self.numbers.get_mut(idx)
    }

    pub fn state(&self, value: u64) -> Option<NumberState> {
        self.get(value).map(|n| n.state)
    }

    pub fn available_count(&self) -> usize {
        self.count(NumberState::Available)
    }

    pub fn count(&self, state: NumberState) -> usize {
        self.numbers.iter().filter(|n| n.state == state).count()
    }

    /// Check that `text` draws each of its numbers once from the available
    /// pool. Read-only: the caller applies [`NumberPool::mark_used`] once the
    /// answer is known to be right.
    pub fn validate_usage(&self, text: &str) -> Result<Vec<u64>, PoolError> {
        let tokens = tokenize(text)?;
        let values: Vec<f64> = numbers(&tokens).map(|n| n as f64).collect();
        self.validate_values(&values)
    }

    /// Same rules as [`NumberPool::validate_usage`] over raw numeric values.
    pub fn validate_values(&self, values: &[f64]) -> Result<Vec<u64>, PoolError> {
        if values.is_empty() {
            return Err(PoolError::NoNumbersUsed);
        }

        let max = self.size();
        let mut seen = HashSet::new();
        let mut used = Vec::with_capacity(values.len());
        for &value in values {
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(PoolError::NonIntegerUsage { value });
            }
            if value < 1.0 || value > max as f64 {
                return Err(PoolError::OutOfRange { value, max });
            }
            let value = value as u64;
            if !seen.insert(value) {
                return Err(PoolError::DuplicateUsageInExpression { value });
            }
            used.push(value);
        }

        if let Some(&value) = used
            .iter()
            .find(|&&v| self.state(v) != Some(NumberState::Available))
        {
            return Err(PoolError::NumberAlreadyConsumed { value });
        }

        Ok(used)
    }

    /// Move each value from `Available` to `Used`; returns the values that
    /// actually changed state.
    pub fn mark_used(&mut self, values: &[u64]) -> Vec<u64> {
        let mut changed = Vec::with_capacity(values.len());
        for &value in values {
            if let Some(number) = self.get_mut(value) {
                if number.state == NumberState::Available {
                    number.state = NumberState::Used;
                    changed.push(value);
                }
            }
        }
        changed
    }

    /// Remove one available number chosen uniformly at random.
    pub fn remove_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u64, PoolError> {
        let available: Vec<usize> = self
            .numbers
            .iter()
            .enumerate()
            .filter(|(_, n)| n.state == NumberState::Available)
            .map(|(idx, _)| idx)
            .collect();

        let &idx = available.choose(rng).ok_or(PoolError::PoolExhausted)?;
        let number = &mut self.numbers[idx];
        number.state = NumberState::Removed;
        debug!(value = number.value, "removed pool number");
        Ok(number.value)
    }
}
