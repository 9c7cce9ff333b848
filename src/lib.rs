//! Localisation and token approval support for a decentralized-exchange front-end.
//!
//! [`localisation`] keeps the selected UI language and the translations fetched for it.
//! [`approvals`] derives whether a spender may move a token amount and approves it through the
//! connected wallet.
pub mod approvals;
pub mod config;
pub mod errors;
pub mod localisation;
mod serde_primitives;
pub mod utils;
