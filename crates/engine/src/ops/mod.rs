//! Operations that combine several store calls.
//!
//! The plain delegations live on [`Engine`] itself; this module adds the
//! contract registration rules, the id-0 upserts and the purchase history
//! lookup.

mod contracts;
mod history;

/// Outcome of an upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Saved {
    /// A new row was stored under this id.
    Created(i32),
    /// The existing row with this id was overwritten.
    Updated(i32),
}

impl Saved {
    pub fn id(self) -> i32 {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}
