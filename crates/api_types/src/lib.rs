//! JSON bodies exchanged with the HTTP server.
//!
//! Field names are part of the public wire format and are fixed by the
//! `serde` renames below. Timestamps travel as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod company {
    use super::*;

    /// A company as read or written by clients.
    ///
    /// `ID` may be omitted or 0 on `PUT` to create a new company.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Company {
        #[serde(rename = "ID", default)]
        pub id: i32,
        pub name: String,
        #[serde(rename = "regcode", default)]
        pub reg_code: Option<String>,
    }
}

pub mod contract {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Contract {
        #[serde(rename = "ID", default)]
        pub id: i32,
        #[serde(rename = "sellerID")]
        pub seller_id: i32,
        #[serde(rename = "clientID")]
        pub client_id: i32,
        #[serde(rename = "validFrom")]
        pub valid_from: DateTime<Utc>,
        #[serde(rename = "validTo")]
        pub valid_to: DateTime<Utc>,
        /// Credit granted to the client over the validity window.
        pub amount: i64,
    }
}

pub mod purchase {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Purchase {
        #[serde(rename = "ID", default)]
        pub id: i32,
        #[serde(rename = "contractID")]
        pub contract_id: i32,
        pub datetime: DateTime<Utc>,
        /// Credit spent by this purchase.
        pub amount: i64,
    }
}

pub mod response {
    use super::*;

    /// Identifier of a newly created row.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ResponseId {
        #[serde(rename = "ID")]
        pub id: i32,
    }

    /// Body of every non-2xx response.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
    }
}
