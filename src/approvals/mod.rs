pub mod connector;
pub mod contract;
pub mod controller;
#[cfg(feature = "evm")]
pub mod evm;
pub mod klip;
pub mod models;
pub mod trade;
pub mod transactions;
