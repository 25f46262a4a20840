//! In-memory stores.
//!
//! Deterministic stand-ins for the SQL stores. Identifiers are assigned from a
//! per-store counter starting at 1.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::DbErr;
use tokio::sync::RwLock;

use crate::{
    Company, Contract, EngineError, NewCompany, NewContract, NewPurchase, Purchase,
    ResultEngine,
};

use super::{CompanyStore, ContractStore, PurchaseStore};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i32) -> T) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }
}

#[derive(Debug, Default)]
pub struct MemoryCompanyStore {
    table: RwLock<Table<Company>>,
}

impl MemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyStore for MemoryCompanyStore {
    async fn list(&self) -> ResultEngine<Vec<Company>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> ResultEngine<Company> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(format!("company {id}")))
    }

    async fn create(&self, company: &NewCompany) -> ResultEngine<i32> {
        let mut table = self.table.write().await;
        Ok(table.insert_with(|id| Company::with_id(id, company.clone())))
    }

    async fn update(&self, company: &Company) -> ResultEngine<()> {
        let mut table = self.table.write().await;
        let row = table
            .rows
            .get_mut(&company.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("company {}", company.id)))?;
        *row = company.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> ResultEngine<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound(format!("company {id}")))
    }

    async fn exists(&self, id: i32) -> bool {
        self.table.read().await.rows.contains_key(&id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryContractStore {
    table: RwLock<Table<Contract>>,
}

impl MemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    async fn list(&self) -> ResultEngine<Vec<Contract>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> ResultEngine<Contract> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(format!("contract {id}")))
    }

    async fn create(&self, contract: &NewContract) -> ResultEngine<i32> {
        let mut table = self.table.write().await;
        Ok(table.insert_with(|id| Contract::with_id(id, contract.clone())))
    }

    async fn update(&self, contract: &Contract) -> ResultEngine<()> {
        let mut table = self.table.write().await;
        let row = table
            .rows
            .get_mut(&contract.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("contract {}", contract.id)))?;
        *row = contract.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> ResultEngine<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound(format!("contract {id}")))
    }

    async fn exists(&self, id: i32) -> bool {
        self.table.read().await.rows.contains_key(&id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPurchaseStore {
    table: RwLock<Table<Purchase>>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn add(&self, purchase: &NewPurchase) -> ResultEngine<i32> {
        let mut table = self.table.write().await;
        Ok(table.insert_with(|id| Purchase::with_id(id, purchase.clone())))
    }

    async fn contract_history(&self, contract_id: i32) -> ResultEngine<Vec<Purchase>> {
        let mut history: Vec<Purchase> = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|p| p.contract_id == contract_id)
            .cloned()
            .collect();
        if history.is_empty() {
            return Err(EngineError::KeyNotFound(format!(
                "purchases of contract {contract_id}"
            )));
        }
        history.sort_by_key(|p| (p.purchased_at, p.id));
        Ok(history)
    }

    async fn contract_sum(&self, contract_id: i32) -> ResultEngine<i64> {
        self.table
            .read()
            .await
            .rows
            .values()
            .filter(|p| p.contract_id == contract_id)
            .try_fold(0i64, |total, p| total.checked_add(p.credit_spent))
            .ok_or_else(|| {
                DbErr::Custom(format!("purchase sum of contract {contract_id} overflows")).into()
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = MemoryCompanyStore::new();
        let first = store
            .create(&NewCompany {
                name: "Acme".to_string(),
                reg_code: None,
            })
            .await
            .unwrap();
        let second = store
            .create(&NewCompany {
                name: "Globex".to_string(),
                reg_code: Some("123".to_string()),
            })
            .await
            .unwrap();
        assert_eq!((first, second), (1, 2));

        store.delete(first).await.unwrap();
        assert!(!store.exists(first).await);
        assert_eq!(
            store.delete(first).await,
            Err(EngineError::KeyNotFound("company 1".to_string()))
        );
    }

    #[tokio::test]
    async fn history_is_ordered_by_purchase_time() {
        let store = MemoryPurchaseStore::new();
        for (day, amount) in [(3, 1), (1, 2), (2, 4)] {
            store
                .add(&NewPurchase {
                    contract_id: 1,
                    purchased_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
                    credit_spent: amount,
                })
                .await
                .unwrap();
        }

        let history = store.contract_history(1).await.unwrap();
        let amounts: Vec<i64> = history.iter().map(|p| p.credit_spent).collect();
        assert_eq!(amounts, vec![2, 4, 1]);
        assert_eq!(store.contract_sum(1).await.unwrap(), 7);
        assert_eq!(store.contract_sum(2).await.unwrap(), 0);
        assert!(store.contract_history(2).await.is_err());
    }

    #[tokio::test]
    async fn overflowing_sum_is_reported() {
        let store = MemoryPurchaseStore::new();
        for amount in [i64::MAX, 1] {
            store
                .add(&NewPurchase {
                    contract_id: 1,
                    purchased_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                    credit_spent: amount,
                })
                .await
                .unwrap();
        }

        assert!(matches!(
            store.contract_sum(1).await,
            Err(EngineError::Database(_))
        ));
    }
}
