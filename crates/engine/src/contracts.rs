//! The module contains `Contract` struct and its table mapping.
//!
//! A contract grants a client company an amount of credit to spend with a
//! seller company inside a validity window. Purchases are drawn against it.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    pub id: i32,
    pub seller_id: i32,
    pub client_id: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Granted credit, in whole currency units.
    pub credit_amount: i64,
}

/// Fields of a contract that is not stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewContract {
    pub seller_id: i32,
    pub client_id: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub credit_amount: i64,
}

impl Contract {
    pub fn with_id(id: i32, contract: NewContract) -> Self {
        Self {
            id,
            seller_id: contract.seller_id,
            client_id: contract.client_id,
            valid_from: contract.valid_from,
            valid_to: contract.valid_to,
            credit_amount: contract.credit_amount,
        }
    }

    /// Returns `true` if `at` lies inside the validity window.
    ///
    /// Both bounds are inclusive: a purchase stamped exactly at `valid_from`
    /// or at `valid_to` is accepted.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && at <= self.valid_to
    }

    /// Credit left once `spent` has been drawn. Computed in `i128` so any
    /// pair of `i64` values is exact.
    pub fn remaining_credit(&self, spent: i64) -> i128 {
        i128::from(self.credit_amount) - i128::from(spent)
    }

    /// Whether `amount` can be drawn on top of `spent`.
    ///
    /// The new running balance must still fit an `i64`, or every later sum
    /// over the contract would overflow.
    pub fn admits(&self, spent: i64, amount: i64) -> bool {
        spent.checked_add(amount).is_some() && i128::from(amount) <= self.remaining_credit(spent)
    }
}

/// Reject a validity window that ends before it starts.
pub(crate) fn ensure_period(
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
) -> ResultEngine<()> {
    if valid_from > valid_to {
        return Err(EngineError::InvalidPeriod(format!(
            "validFrom {valid_from} is after validTo {valid_to}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub seller_id: i32,
    pub client_id: i32,
    pub valid_from: DateTimeUtc,
    pub valid_to: DateTimeUtc,
    pub credit_amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchases::Entity")]
    Purchases,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::SellerId",
        to = "super::companies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Seller,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::ClientId",
        to = "super::companies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Client,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Contract {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            seller_id: model.seller_id,
            client_id: model.client_id,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            credit_amount: model.credit_amount,
        }
    }
}

impl From<&NewContract> for ActiveModel {
    fn from(value: &NewContract) -> Self {
        Self {
            id: ActiveValue::NotSet,
            seller_id: ActiveValue::Set(value.seller_id),
            client_id: ActiveValue::Set(value.client_id),
            valid_from: ActiveValue::Set(value.valid_from),
            valid_to: ActiveValue::Set(value.valid_to),
            credit_amount: ActiveValue::Set(value.credit_amount),
        }
    }
}

impl From<&Contract> for ActiveModel {
    fn from(value: &Contract) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            seller_id: ActiveValue::Set(value.seller_id),
            client_id: ActiveValue::Set(value.client_id),
            valid_from: ActiveValue::Set(value.valid_from),
            valid_to: ActiveValue::Set(value.valid_to),
            credit_amount: ActiveValue::Set(value.credit_amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn contract() -> Contract {
        Contract {
            id: 1,
            seller_id: 1,
            client_id: 2,
            valid_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            valid_to: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
            credit_amount: 10,
        }
    }

    #[test]
    fn covers_both_bounds() {
        let contract = contract();
        assert!(contract.covers(contract.valid_from));
        assert!(contract.covers(contract.valid_to));
        assert!(!contract.covers(contract.valid_from - Duration::microseconds(1)));
        assert!(!contract.covers(contract.valid_to + Duration::microseconds(1)));
    }

    #[test]
    fn remaining_credit() {
        let contract = contract();
        assert_eq!(contract.remaining_credit(7), 3);
        assert_eq!(contract.remaining_credit(10), 0);
    }

    #[test]
    fn admits_up_to_the_remaining_credit() {
        let contract = contract();
        assert!(contract.admits(7, 3));
        assert!(!contract.admits(7, 4));
        assert!(!contract.admits(0, i64::MAX));
    }

    #[test]
    fn extreme_balances_do_not_overflow() {
        let contract = contract();
        assert_eq!(
            contract.remaining_credit(i64::MIN),
            10 - i128::from(i64::MIN)
        );
        assert!(contract.admits(i64::MIN, 1));
        assert!(!contract.admits(i64::MIN, -1));
        assert!(!contract.admits(i64::MAX, 1));
    }

    #[test]
    fn period_must_not_be_reversed() {
        let contract = contract();
        assert!(ensure_period(contract.valid_from, contract.valid_to).is_ok());
        assert!(ensure_period(contract.valid_from, contract.valid_from).is_ok());
        assert!(matches!(
            ensure_period(contract.valid_to, contract.valid_from),
            Err(EngineError::InvalidPeriod(_))
        ));
    }
}
