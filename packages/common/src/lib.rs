//! Common - Shared Types and Utilities for the IBC Token Bridge Contracts
//!
//! This package provides the asset descriptors shared by the bridge contract
//! and its tests: which ledger an accepted token lives on and how to pay it out.

pub mod asset;

pub use asset::{Asset, AssetInfo};
