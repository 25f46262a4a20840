use crate::{
    Company, Contract, Engine, EngineError, NewCompany, NewContract, ResultEngine,
    contracts::ensure_period,
};

use super::Saved;

impl Engine {
    /// Seller first, then client: the first missing party names the error.
    async fn ensure_parties(&self, seller_id: i32, client_id: i32) -> ResultEngine<()> {
        if !self.check_company_exist(seller_id).await {
            return Err(EngineError::SellerNotExist);
        }
        if !self.check_company_exist(client_id).await {
            return Err(EngineError::ClientNotExist);
        }
        Ok(())
    }

    /// Create a contract after checking both parties exist and the validity
    /// window is not reversed.
    pub async fn register_contract(&self, contract: &NewContract) -> ResultEngine<i32> {
        self.ensure_parties(contract.seller_id, contract.client_id)
            .await?;
        ensure_period(contract.valid_from, contract.valid_to)?;

        let id = self.create_contract(contract).await?;
        tracing::info!(
            "contract {id} registered: seller {} client {} credit {}",
            contract.seller_id,
            contract.client_id,
            contract.credit_amount
        );
        Ok(id)
    }

    /// Overwrite a contract, with the same checks as [`Engine::register_contract`].
    pub async fn amend_contract(&self, contract: &Contract) -> ResultEngine<()> {
        self.ensure_parties(contract.seller_id, contract.client_id)
            .await?;
        ensure_period(contract.valid_from, contract.valid_to)?;

        self.update_contract(contract).await
    }

    /// Register the contract when its id is 0, amend it otherwise.
    pub async fn save_contract(&self, contract: &Contract) -> ResultEngine<Saved> {
        if contract.id == 0 {
            let id = self
                .register_contract(&NewContract {
                    seller_id: contract.seller_id,
                    client_id: contract.client_id,
                    valid_from: contract.valid_from,
                    valid_to: contract.valid_to,
                    credit_amount: contract.credit_amount,
                })
                .await?;
            return Ok(Saved::Created(id));
        }

        self.amend_contract(contract).await?;
        Ok(Saved::Updated(contract.id))
    }

    /// Create the company when its id is 0, overwrite it otherwise.
    pub async fn save_company(&self, company: &Company) -> ResultEngine<Saved> {
        if company.id == 0 {
            let id = self
                .create_company(&NewCompany {
                    name: company.name.clone(),
                    reg_code: company.reg_code.clone(),
                })
                .await?;
            return Ok(Saved::Created(id));
        }

        self.update_company(company).await?;
        Ok(Saved::Updated(company.id))
    }
}
