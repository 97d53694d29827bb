//! Scripts for deploying, upgrading and maintaining the dollar protocol contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cache;
pub mod cli;
pub mod client;
mod commands;
pub mod constants;
pub mod errors;
pub mod sequencer;
mod solidity;
pub mod types;
pub mod utils;
