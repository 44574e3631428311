//! Scripts for deploying the LPLock, TokenLock and RoiToken contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod deployments;
pub mod errors;
pub mod signal;
pub mod types;
