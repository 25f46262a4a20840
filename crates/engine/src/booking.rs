//! Purchase booking.
//!
//! A booking walks through
//! `Received → DateValidated → GuardAcquired → BalanceChecked → Committed`
//! and stops at the first failing gate. Nothing is retried.
//!
//! The guard permit is taken before the spent balance is read and is held
//! until the new purchase row is written, so no two bookings on the same
//! contract can both pass the credit check against the same balance. The
//! permit is released on every exit path when it goes out of scope.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    ContractGuard, Engine, EngineError, GuardScope, NewPurchase, ResultEngine,
};

/// A purchase as received from the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub contract_id: i32,
    pub datetime: DateTime<Utc>,
    /// Credit to spend. Expected positive; not checked here.
    pub amount: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PurchaseStage {
    Received,
    DateValidated,
    GuardAcquired,
    BalanceChecked,
    Committed,
}

impl PurchaseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::DateValidated => "date_validated",
            Self::GuardAcquired => "guard_acquired",
            Self::BalanceChecked => "balance_checked",
            Self::Committed => "committed",
        }
    }
}

impl std::fmt::Display for PurchaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Books purchases against contracts without overspending their credit.
#[derive(Debug)]
pub struct PurchaseWorkflow {
    engine: Arc<Engine>,
    guard: ContractGuard,
}

impl PurchaseWorkflow {
    pub fn new(engine: Arc<Engine>, scope: GuardScope) -> Self {
        Self {
            engine,
            guard: ContractGuard::new(scope),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn guard(&self) -> &ContractGuard {
        &self.guard
    }

    /// Validate `request` against its contract and append it to the ledger.
    ///
    /// Returns the id of the new purchase, or:
    /// - `ContractNotFound` when the contract cannot be read, whether it is
    ///   missing or the store failed;
    /// - `DateNotValid` when `datetime` lies outside the validity window;
    /// - `InsufficientCredit` when the remaining credit is below `amount`
    ///   (spending exactly the remaining credit is accepted), or when the new
    ///   running balance would not fit an `i64`;
    /// - `Database` when reading the balance or writing the row failed.
    pub async fn book(&self, request: &PurchaseRequest) -> ResultEngine<i32> {
        let mut stage = PurchaseStage::Received;
        let result = self.run(request, &mut stage).await;

        match &result {
            Ok(id) => tracing::info!(
                "purchase {id} booked on contract {}: {} credit",
                request.contract_id,
                request.amount
            ),
            Err(err) if err.is_client_fault() => tracing::warn!(
                "purchase on contract {} rejected after {stage}: {err}",
                request.contract_id
            ),
            Err(err) => tracing::error!(
                "purchase on contract {} failed after {stage}: {err}",
                request.contract_id
            ),
        }

        result
    }

    async fn run(
        &self,
        request: &PurchaseRequest,
        stage: &mut PurchaseStage,
    ) -> ResultEngine<i32> {
        let contract = self
            .engine
            .contract(request.contract_id)
            .await
            .map_err(|err| {
                tracing::debug!("contract {} unavailable: {err}", request.contract_id);
                EngineError::ContractNotFound
            })?;

        if !contract.covers(request.datetime) {
            return Err(EngineError::DateNotValid);
        }
        advance(stage, PurchaseStage::DateValidated, request.contract_id);

        let permit = self.guard.acquire(contract.id).await;
        tracing::debug!("holding guard key {}", permit.contract_key());
        advance(stage, PurchaseStage::GuardAcquired, request.contract_id);

        let spent = self.engine.try_contract_purchase_sum(contract.id).await?;
        if !contract.admits(spent, request.amount) {
            return Err(EngineError::InsufficientCredit);
        }
        advance(stage, PurchaseStage::BalanceChecked, request.contract_id);

        let id = self
            .engine
            .create_purchase(&NewPurchase {
                contract_id: contract.id,
                purchased_at: request.datetime,
                credit_spent: request.amount,
            })
            .await?;
        advance(stage, PurchaseStage::Committed, request.contract_id);

        Ok(id)
    }
}

fn advance(stage: &mut PurchaseStage, next: PurchaseStage, contract_id: i32) {
    tracing::debug!("purchase on contract {contract_id}: {stage} -> {next}");
    *stage = next;
}
