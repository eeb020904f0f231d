//! Reseller key store - the data layer of a license-key reseller backend.
//!
//! Admins issue single-use referral tokens, resellers register by redeeming a
//! token and spend credits to mint game license keys, and client devices bind to
//! keys up to each key's device limit until the key is revoked or expires.
//! [`store::Store`] is the handle the surrounding API layer talks to.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Style consistency
    clippy::enum_glob_use,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Configuration management for the database and store settings
pub mod config;
/// Core business logic - framework-agnostic token, reseller, key and device operations
pub mod core;
/// `SeaORM` entity definitions for the store's tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Best-effort per-reseller JSON mirror
pub mod mirror;
/// The store handle passed to every consumer
pub mod store;

/// In-memory database and fixtures for tests
#[cfg(test)]
pub mod test_utils;
