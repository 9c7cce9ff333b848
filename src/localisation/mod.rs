pub mod crowdin;
pub mod languages;
pub mod models;
pub mod provider;
pub mod storage;
