use crate::{Engine, EngineError, Purchase, ResultEngine};

impl Engine {
    /// Purchases of a contract, oldest first.
    ///
    /// The purchase store reports an empty history as an error, so an empty
    /// or failed lookup is followed by an existence check on the contract:
    /// a known contract without purchases yields an empty list, an unknown
    /// one `ContractNotFound`.
    pub async fn purchase_history(&self, contract_id: i32) -> ResultEngine<Vec<Purchase>> {
        let failure = match self.contract_purchase_history(contract_id).await {
            Ok(history) if !history.is_empty() => return Ok(history),
            Ok(_) | Err(EngineError::KeyNotFound(_)) => None,
            Err(err) => Some(err),
        };

        if !self.check_contract_exist(contract_id).await {
            return Err(EngineError::ContractNotFound);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}
