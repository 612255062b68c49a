//! berrytest - manual board test station
//!
//! Exposes the workflow core, service contracts, and configuration so
//! integration tests and alternative frontends can drive the station
//! without the terminal binary.

pub mod cli;
pub mod constants;
pub mod models;
pub mod services;
pub mod station;
pub mod ui;
pub mod workflow;
