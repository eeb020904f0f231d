//! Core business logic for the reseller key store.
//!
//! Every function takes a `SeaORM` connection (or transaction) and is
//! independent of any transport layer. [`crate::store::Store`] wraps these
//! functions behind a single handle and adds the mirror side effects.

pub mod admin;
pub mod binding;
pub mod device;
pub mod key;
pub mod reseller;
pub mod stats;
pub mod token;
pub mod validation;
