//! Storage capabilities the engine is built on.
//!
//! One trait per entity kind. The traits carry no storage types, so the
//! engine runs unchanged on the SeaORM stores in [`sql`] or on the in-memory
//! stores in [`memory`].

use async_trait::async_trait;

use crate::{
    Company, Contract, NewCompany, NewContract, NewPurchase, Purchase, ResultEngine,
};

pub mod memory;
pub mod sql;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn list(&self) -> ResultEngine<Vec<Company>>;

    /// Fails with `KeyNotFound` when no company has `id`.
    async fn get(&self, id: i32) -> ResultEngine<Company>;

    /// Stores a new company and returns the identifier the store assigned.
    async fn create(&self, company: &NewCompany) -> ResultEngine<i32>;

    /// Fails with `KeyNotFound` when no company has `company.id`.
    async fn update(&self, company: &Company) -> ResultEngine<()>;

    /// Fails with `KeyNotFound` when no company has `id`.
    async fn delete(&self, id: i32) -> ResultEngine<()>;

    /// `false` both when the company is missing and when the lookup failed.
    async fn exists(&self, id: i32) -> bool;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn list(&self) -> ResultEngine<Vec<Contract>>;

    /// Fails with `KeyNotFound` when no contract has `id`.
    async fn get(&self, id: i32) -> ResultEngine<Contract>;

    async fn create(&self, contract: &NewContract) -> ResultEngine<i32>;

    async fn update(&self, contract: &Contract) -> ResultEngine<()>;

    async fn delete(&self, id: i32) -> ResultEngine<()>;

    /// `false` both when the contract is missing and when the lookup failed.
    async fn exists(&self, id: i32) -> bool;
}

/// Append-only purchase ledger.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Appends a purchase row and returns its identifier.
    async fn add(&self, purchase: &NewPurchase) -> ResultEngine<i32>;

    /// Purchases of a contract, oldest first.
    ///
    /// An empty history is reported as `KeyNotFound`; callers that need to
    /// tell "no purchases yet" from "no such contract" must ask the contract
    /// store.
    async fn contract_history(&self, contract_id: i32) -> ResultEngine<Vec<Purchase>>;

    /// Sum of `credit_spent` over the purchases of a contract, 0 when there
    /// are none.
    async fn contract_sum(&self, contract_id: i32) -> ResultEngine<i64>;
}
