//! Purchase primitives.
//!
//! A `Purchase` is a single credit-spend event recorded against a contract.
//! Rows are append-only: the engine never updates or deletes them.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub id: i32,
    pub contract_id: i32,
    pub purchased_at: DateTime<Utc>,
    pub credit_spent: i64,
}

/// A purchase waiting to be booked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPurchase {
    pub contract_id: i32,
    pub purchased_at: DateTime<Utc>,
    pub credit_spent: i64,
}

impl Purchase {
    pub fn with_id(id: i32, purchase: NewPurchase) -> Self {
        Self {
            id,
            contract_id: purchase.contract_id,
            purchased_at: purchase.purchased_at,
            credit_spent: purchase.credit_spent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub contract_id: i32,
    pub purchased_at: DateTimeUtc,
    pub credit_spent: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contracts::Entity",
        from = "Column::ContractId",
        to = "super::contracts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Contracts,
}

impl Related<super::contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contracts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Purchase {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            contract_id: model.contract_id,
            purchased_at: model.purchased_at,
            credit_spent: model.credit_spent,
        }
    }
}

impl From<&NewPurchase> for ActiveModel {
    fn from(value: &NewPurchase) -> Self {
        Self {
            id: ActiveValue::NotSet,
            contract_id: ActiveValue::Set(value.contract_id),
            purchased_at: ActiveValue::Set(value.purchased_at),
            credit_spent: ActiveValue::Set(value.credit_spent),
        }
    }
}
