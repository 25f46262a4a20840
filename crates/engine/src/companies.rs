//! The module contains `Company` struct and its table mapping.

use sea_orm::entity::{ActiveValue, prelude::*};

/// A company taking part in contracts, either as seller or as client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Company {
    pub id: i32,
    pub name: String,
    /// Registration code, when the company has one.
    pub reg_code: Option<String>,
}

/// Fields of a company that is not stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub reg_code: Option<String>,
}

impl Company {
    pub fn with_id(id: i32, company: NewCompany) -> Self {
        Self {
            id,
            name: company.name,
            reg_code: company.reg_code,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub reg_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Company {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            reg_code: model.reg_code,
        }
    }
}

impl From<&NewCompany> for ActiveModel {
    fn from(value: &NewCompany) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(value.name.clone()),
            reg_code: ActiveValue::Set(value.reg_code.clone()),
        }
    }
}

impl From<&Company> for ActiveModel {
    fn from(value: &Company) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            name: ActiveValue::Set(value.name.clone()),
            reg_code: ActiveValue::Set(value.reg_code.clone()),
        }
    }
}
