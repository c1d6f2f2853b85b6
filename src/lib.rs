//! `octopus-consumption` library crate.
//!
//! The binary (`octo`) is a thin wrapper around this library so that:
//!
//! - the fetch/normalize/write core is testable without spawning processes
//! - the client can be embedded elsewhere with its own tracing setup

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod observability;
