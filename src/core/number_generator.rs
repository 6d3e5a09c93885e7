//! Account number generation
//!
//! Account numbers have the form `<branch code><type code><6 digits>`, e.g.
//! `NYCSAV004217`. The numeric suffix is drawn at random and candidates are
//! checked against the caller's view of taken numbers until a free one is
//! found.

use crate::types::LedgerError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Candidates tried before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

const SUFFIX_SPACE: u32 = 1_000_000;

/// Random account number source
///
/// Seed it with [`AccountNumberGenerator::with_seed`] for reproducible runs.
#[derive(Debug)]
pub struct AccountNumberGenerator {
    rng: Mutex<StdRng>,
    max_attempts: u32,
}

impl Default for AccountNumberGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl AccountNumberGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the number of candidates tried per call
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one candidate number, without any uniqueness check
    pub fn next_candidate(&self, branch_code: &str, type_code: &str) -> String {
        let suffix = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen_range(0..SUFFIX_SPACE);
        format!(
            "{}{}{:06}",
            branch_code.to_uppercase(),
            type_code.to_uppercase(),
            suffix
        )
    }

    /// Draw candidates until `is_taken` rejects none of them
    ///
    /// `is_taken` is only a pre-check; use [`Self::claim_unique`] when the
    /// store's unique insert must share the same attempt budget.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` after `max_attempts` taken candidates in a row.
    pub fn generate_unique<F>(
        &self,
        branch_code: &str,
        type_code: &str,
        is_taken: F,
    ) -> Result<String, LedgerError>
    where
        F: Fn(&str) -> bool,
    {
        self.claim_unique(branch_code, type_code, |candidate| {
            Ok((!is_taken(candidate)).then(|| candidate.to_string()))
        })
    }

    /// Offer candidates to `claim` until one is accepted
    ///
    /// `claim` returns `Ok(Some(_))` once it has stored the candidate and
    /// `Ok(None)` when the number is taken. Every rejected candidate counts
    /// against `max_attempts`; an error from `claim` stops immediately.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` after `max_attempts` rejected candidates, or the
    /// first error of `claim`.
    pub fn claim_unique<T, F>(
        &self,
        branch_code: &str,
        type_code: &str,
        mut claim: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut(&str) -> Result<Option<T>, LedgerError>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.next_candidate(branch_code, type_code);
            if let Some(claimed) = claim(&candidate)? {
                return Ok(claimed);
            }
            tracing::debug!(candidate = %candidate, attempt, "account number collision");
        }

        Err(LedgerError::conflict(format!(
            "Could not generate a unique account number for {}{} after {} attempts",
            branch_code, type_code, self.max_attempts
        )))
    }
}
