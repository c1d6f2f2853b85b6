//! Remote data sources.

pub mod octopus;

pub use octopus::{OctopusClient, RetryPolicy};
