//! helmboot Client - drives the provisioned helm binary
//!
//! - `runner`: explicit-argument subprocess execution behind [`CommandRunner`]
//! - `client`: `init --client-only`, `repo add` and `version --client`
//! - `provision`: the full locate / install / init / register flow

pub mod client;
pub mod error;
pub mod provision;
pub mod runner;

#[cfg(test)]
mod testing;

pub use client::HelmClient;
pub use error::{ProvisionError, Result};
pub use provision::{BinaryOrigin, ProvisionOutcome, ProvisionedBinary, Provisioner};
pub use runner::{CommandLine, CommandOutput, CommandRunner, SystemRunner};
