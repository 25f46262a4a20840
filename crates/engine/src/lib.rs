use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use booking::{PurchaseRequest, PurchaseStage, PurchaseWorkflow};
pub use companies::{Company, NewCompany};
pub use contracts::{Contract, NewContract};
pub use error::EngineError;
pub use guard::{ContractGuard, GuardPermit, GuardScope};
pub use ops::Saved;
pub use purchases::{NewPurchase, Purchase};
pub use store::{CompanyStore, ContractStore, PurchaseStore};

pub mod store;

mod booking;
mod companies;
mod contracts;
mod error;
mod guard;
mod ops;
mod purchases;

type ResultEngine<T> = Result<T, EngineError>;

/// Single access point over company, contract and purchase storage.
///
/// The engine owns no entity state and takes no locks of its own; it only
/// forwards to the stores it was built with. Build one per process and share
/// it behind an `Arc`.
#[derive(Clone)]
pub struct Engine {
    companies: Arc<dyn CompanyStore>,
    contracts: Arc<dyn ContractStore>,
    purchases: Arc<dyn PurchaseStore>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn new(
        companies: Arc<dyn CompanyStore>,
        contracts: Arc<dyn ContractStore>,
        purchases: Arc<dyn PurchaseStore>,
    ) -> Self {
        Self {
            companies,
            contracts,
            purchases,
        }
    }

    pub async fn company_list(&self) -> ResultEngine<Vec<Company>> {
        self.companies.list().await
    }

    pub async fn company(&self, id: i32) -> ResultEngine<Company> {
        self.companies.get(id).await
    }

    pub async fn create_company(&self, company: &NewCompany) -> ResultEngine<i32> {
        self.companies.create(company).await
    }

    pub async fn update_company(&self, company: &Company) -> ResultEngine<()> {
        self.companies.update(company).await
    }

    pub async fn delete_company(&self, id: i32) -> ResultEngine<()> {
        self.companies.delete(id).await
    }

    /// Whether a company with `id` exists. Storage failures read as `false`.
    pub async fn check_company_exist(&self, id: i32) -> bool {
        self.companies.exists(id).await
    }

    pub async fn contract_list(&self) -> ResultEngine<Vec<Contract>> {
        self.contracts.list().await
    }

    pub async fn contract(&self, id: i32) -> ResultEngine<Contract> {
        self.contracts.get(id).await
    }

    pub async fn create_contract(&self, contract: &NewContract) -> ResultEngine<i32> {
        self.contracts.create(contract).await
    }

    pub async fn update_contract(&self, contract: &Contract) -> ResultEngine<()> {
        self.contracts.update(contract).await
    }

    pub async fn delete_contract(&self, id: i32) -> ResultEngine<()> {
        self.contracts.delete(id).await
    }

    /// Whether a contract with `id` exists. Storage failures read as `false`.
    pub async fn check_contract_exist(&self, id: i32) -> bool {
        self.contracts.exists(id).await
    }

    pub async fn create_purchase(&self, purchase: &NewPurchase) -> ResultEngine<i32> {
        self.purchases.add(purchase).await
    }

    /// Credit spent so far on a contract.
    ///
    /// Reads as 0 both when there are no purchases and when the store failed.
    /// Booking does not rely on this; see [`Engine::try_contract_purchase_sum`].
    pub async fn contract_purchase_sum(&self, contract_id: i32) -> i64 {
        match self.purchases.contract_sum(contract_id).await {
            Ok(sum) => sum,
            Err(err) => {
                tracing::warn!("purchase sum of contract {contract_id} failed, reading 0: {err}");
                0
            }
        }
    }

    /// Credit spent so far on a contract, with storage failures reported.
    pub async fn try_contract_purchase_sum(&self, contract_id: i32) -> ResultEngine<i64> {
        self.purchases.contract_sum(contract_id).await
    }

    /// Raw purchase history; empty histories come back as `KeyNotFound`.
    pub async fn contract_purchase_history(&self, contract_id: i32) -> ResultEngine<Vec<Purchase>> {
        self.purchases.contract_history(contract_id).await
    }
}

/// The builder for `Engine`
///
/// Stores that are not set explicitly are backed by the database when one was
/// given, by in-memory stores otherwise.
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
    companies: Option<Arc<dyn CompanyStore>>,
    contracts: Option<Arc<dyn ContractStore>>,
    purchases: Option<Arc<dyn PurchaseStore>>,
}

impl EngineBuilder {
    /// Pass the database backing every store not set explicitly
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    pub fn companies(mut self, store: Arc<dyn CompanyStore>) -> EngineBuilder {
        self.companies = Some(store);
        self
    }

    pub fn contracts(mut self, store: Arc<dyn ContractStore>) -> EngineBuilder {
        self.contracts = Some(store);
        self
    }

    pub fn purchases(mut self, store: Arc<dyn PurchaseStore>) -> EngineBuilder {
        self.purchases = Some(store);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        let database = self.database;
        let companies: Arc<dyn CompanyStore> = match (self.companies, &database) {
            (Some(custom), _) => custom,
            (None, Some(db)) => Arc::new(store::sql::SqlCompanyStore::new(db.clone())),
            (None, None) => Arc::new(store::memory::MemoryCompanyStore::new()),
        };
        let contracts: Arc<dyn ContractStore> = match (self.contracts, &database) {
            (Some(custom), _) => custom,
            (None, Some(db)) => Arc::new(store::sql::SqlContractStore::new(db.clone())),
            (None, None) => Arc::new(store::memory::MemoryContractStore::new()),
        };
        let purchases: Arc<dyn PurchaseStore> = match (self.purchases, &database) {
            (Some(custom), _) => custom,
            (None, Some(db)) => Arc::new(store::sql::SqlPurchaseStore::new(db.clone())),
            (None, None) => Arc::new(store::memory::MemoryPurchaseStore::new()),
        };

        Engine::new(companies, contracts, purchases)
    }
}
