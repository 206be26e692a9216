//! Listing Wizard - guided, multi-step property listing submission
//!
//! The library holds the wizard engine so it can be driven by the
//! `listing-wizard` binary, the `generate_types` binary and tests.

pub mod app;
pub mod config;
pub mod logging;
pub mod session;
pub mod store;
pub mod wizard;
