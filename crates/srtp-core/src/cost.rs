//! Optional economic cost for self-teleports.

use srtp_types::{Outcome, SubjectId};
use std::sync::{Arc, RwLock};

use crate::ports::EconomyPort;

/// Holds the current economy binding, which may be absent and may be swapped
/// on reload.
#[derive(Default)]
pub struct CostGate {
    economy: RwLock<Option<Arc<dyn EconomyPort>>>,
}

impl CostGate {
    pub fn new(economy: Option<Arc<dyn EconomyPort>>) -> Self {
        Self {
            economy: RwLock::new(economy),
        }
    }

    /// Replaces the economy binding.
    pub fn bind(&self, economy: Option<Arc<dyn EconomyPort>>) {
        let mut slot = match self.economy.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = economy;
    }

    /// The economy currently bound, if any.
    pub fn economy(&self) -> Option<Arc<dyn EconomyPort>> {
        match self.economy.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.economy().is_some()
    }

    /// Verifies `subject` can afford `amount`.
    ///
    /// A failing balance query is treated like a missing economy.
    pub fn check(&self, subject: SubjectId, amount: f64) -> Result<(), Outcome> {
        let economy = self.economy().ok_or(Outcome::NoEconomyProvider)?;
        match economy.has_balance(subject, amount) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Outcome::InsufficientFunds { cost: amount }),
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "balance check failed");
                Err(Outcome::NoEconomyProvider)
            }
        }
    }

    /// Withdraws `amount` and returns the economy that accepted it, so a
    /// refund goes back to the same ledger.
    pub fn withdraw(
        &self,
        subject: SubjectId,
        amount: f64,
    ) -> Result<Arc<dyn EconomyPort>, Outcome> {
        let economy = self.economy().ok_or(Outcome::NoEconomyProvider)?;
        match economy.withdraw(subject, amount) {
            Ok(true) => Ok(economy),
            Ok(false) => {
                tracing::info!(subject = %subject, amount, "withdrawal rejected by ledger");
                Err(Outcome::EconomyWithdrawFailed)
            }
            Err(e) => {
                tracing::warn!(subject = %subject, amount, error = %e, "withdrawal failed");
                Err(Outcome::EconomyWithdrawFailed)
            }
        }
    }

    /// Returns `amount` to `subject`. Failures are logged; there is nothing
    /// further to roll back.
    pub fn refund(economy: &dyn EconomyPort, subject: SubjectId, amount: f64) {
        match economy.deposit(subject, amount) {
            Ok(true) => tracing::info!(subject = %subject, amount, "refunded teleport cost"),
            Ok(false) => tracing::error!(subject = %subject, amount, "refund rejected by ledger"),
            Err(e) => tracing::error!(subject = %subject, amount, error = %e, "refund failed"),
        }
    }
}
