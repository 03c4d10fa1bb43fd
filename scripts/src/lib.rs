//! Scripts for deploying and configuring the TouchFan share contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod chain;
pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod params;
pub mod plan;
mod solidity;
pub mod types;
pub mod utils;
pub mod verify;
