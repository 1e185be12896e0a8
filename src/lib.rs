//! Commission Engine library crate.
//!
//! This crate implements hierarchical commission-split configuration
//! for the PayBazaar reseller network (Admin, Master Distributor,
//! Distributor, Retailer).  Applications drive a
//! [`console::CommissionConsole`] over any [`client::CommissionBackend`]
//! (usually [`client::HttpBackend`]), call [`split::validate`] directly
//! for the split rules, or embed the HTTP API via [`api::build_router`].

pub mod api;
pub mod audit;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod resolver;
pub mod selector;
pub mod split;
pub mod submission;

pub use client::{CommissionBackend, HttpBackend};
pub use console::CommissionConsole;
pub use error::{BackendError, ConsoleError};
