//! SeaORM implementations of the storage capabilities.
//!
//! Each store serializes its own inserts, updates and deletes behind an
//! entity-scoped lock. The lock spans the single write only, never a
//! read-then-write sequence; that is the purchase guard's job.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, prelude::*, sea_query::Expr,
};
use tokio::sync::Mutex;

use crate::{
    Company, Contract, EngineError, NewCompany, NewContract, NewPurchase, Purchase,
    ResultEngine, companies, contracts, purchases,
};

use super::{CompanyStore, ContractStore, PurchaseStore};

fn not_updated(err: DbErr, what: &str, id: i32) -> EngineError {
    match err {
        DbErr::RecordNotUpdated => EngineError::KeyNotFound(format!("{what} {id}")),
        other => EngineError::Database(other),
    }
}

#[derive(Debug)]
pub struct SqlCompanyStore {
    database: DatabaseConnection,
    writes: Mutex<()>,
}

impl SqlCompanyStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CompanyStore for SqlCompanyStore {
    async fn list(&self) -> ResultEngine<Vec<Company>> {
        let models = companies::Entity::find()
            .order_by_asc(companies::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Company::from).collect())
    }

    async fn get(&self, id: i32) -> ResultEngine<Company> {
        companies::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Company::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("company {id}")))
    }

    async fn create(&self, company: &NewCompany) -> ResultEngine<i32> {
        let _write = self.writes.lock().await;
        let model = companies::ActiveModel::from(company)
            .insert(&self.database)
            .await?;
        Ok(model.id)
    }

    async fn update(&self, company: &Company) -> ResultEngine<()> {
        let _write = self.writes.lock().await;
        companies::ActiveModel::from(company)
            .update(&self.database)
            .await
            .map_err(|err| not_updated(err, "company", company.id))?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> ResultEngine<()> {
        let _write = self.writes.lock().await;
        let result = companies::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("company {id}")));
        }
        Ok(())
    }

    async fn exists(&self, id: i32) -> bool {
        match companies::Entity::find_by_id(id).one(&self.database).await {
            Ok(model) => model.is_some(),
            Err(err) => {
                tracing::warn!("company {id} existence check failed: {err}");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct SqlContractStore {
    database: DatabaseConnection,
    writes: Mutex<()>,
}

impl SqlContractStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ContractStore for SqlContractStore {
    async fn list(&self) -> ResultEngine<Vec<Contract>> {
        let models = contracts::Entity::find()
            .order_by_asc(contracts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Contract::from).collect())
    }

    async fn get(&self, id: i32) -> ResultEngine<Contract> {
        contracts::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Contract::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("contract {id}")))
    }

    async fn create(&self, contract: &NewContract) -> ResultEngine<i32> {
        let _write = self.writes.lock().await;
        let model = contracts::ActiveModel::from(contract)
            .insert(&self.database)
            .await?;
        Ok(model.id)
    }

    async fn update(&self, contract: &Contract) -> ResultEngine<()> {
        let _write = self.writes.lock().await;
        contracts::ActiveModel::from(contract)
            .update(&self.database)
            .await
            .map_err(|err| not_updated(err, "contract", contract.id))?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> ResultEngine<()> {
        let _write = self.writes.lock().await;
        let result = contracts::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("contract {id}")));
        }
        Ok(())
    }

    async fn exists(&self, id: i32) -> bool {
        match contracts::Entity::find_by_id(id).one(&self.database).await {
            Ok(model) => model.is_some(),
            Err(err) => {
                tracing::warn!("contract {id} existence check failed: {err}");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct SqlPurchaseStore {
    database: DatabaseConnection,
    writes: Mutex<()>,
}

impl SqlPurchaseStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl PurchaseStore for SqlPurchaseStore {
    async fn add(&self, purchase: &NewPurchase) -> ResultEngine<i32> {
        let _write = self.writes.lock().await;
        // The insert reports its own generated key, no follow-up lookup.
        let model = purchases::ActiveModel::from(purchase)
            .insert(&self.database)
            .await?;
        Ok(model.id)
    }

    async fn contract_history(&self, contract_id: i32) -> ResultEngine<Vec<Purchase>> {
        let models = purchases::Entity::find()
            .filter(purchases::Column::ContractId.eq(contract_id))
            .order_by_asc(purchases::Column::PurchasedAt)
            .order_by_asc(purchases::Column::Id)
            .all(&self.database)
            .await?;
        if models.is_empty() {
            return Err(EngineError::KeyNotFound(format!(
                "purchases of contract {contract_id}"
            )));
        }
        Ok(models.into_iter().map(Purchase::from).collect())
    }

    async fn contract_sum(&self, contract_id: i32) -> ResultEngine<i64> {
        let total: Option<Option<i64>> = purchases::Entity::find()
            .select_only()
            .column_as(Expr::col(purchases::Column::CreditSpent).sum(), "total")
            .filter(purchases::Column::ContractId.eq(contract_id))
            .into_tuple()
            .one(&self.database)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
