use std::{env, str::FromStr};

use alloy_primitives::Address;
use dotenv::dotenv;

use crate::errors::InterfaceError;

pub const DEFAULT_CROWDIN_BASE_URL: &str = "https://api.crowdin.com/api/v2";
pub const DEFAULT_KLIP_BASE_URL: &str = "https://a2a-api.klipwallet.com";
pub const DEFAULT_ROUTER_ADDRESS: &str = "0x05fF2B0DB69458A0750badebc4f9e13aDd608C7F";
pub const DEFAULT_BAPP_NAME: &str = "swap-interface";

/// Runtime configuration read from the environment (and a `.env` file when present).
#[derive(Clone, Debug)]
pub struct Config {
    /// Raw `CROWDIN_PROJECT_ID`; parsed when the credentials are requested.
    pub crowdin_project_id: Option<String>,
    pub crowdin_api_token: Option<String>,
    pub crowdin_base_url: String,
    pub rpc_url: Option<String>,
    pub router_address: Address,
    pub klip_bapp_name: String,
}

impl Config {
    /// Reads the configuration. Missing values only fail once something needs them.
    pub fn from_env() -> Result<Self, InterfaceError> {
        dotenv().ok();
        let crowdin_project_id = env::var("CROWDIN_PROJECT_ID").ok();
        let crowdin_api_token = env::var("CROWDIN_API_TOKEN").ok();
        let router_address = match env::var("ROUTER_ADDRESS") {
            Ok(address) => parse_address(&address)?,
            Err(_) => parse_address(DEFAULT_ROUTER_ADDRESS)?,
        };

        Ok(Self {
            crowdin_project_id,
            crowdin_api_token,
            crowdin_base_url: env::var("CROWDIN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CROWDIN_BASE_URL.to_string()),
            rpc_url: env::var("RPC_URL").ok(),
            router_address,
            klip_bapp_name: env::var("KLIP_BAPP_NAME")
                .unwrap_or_else(|_| DEFAULT_BAPP_NAME.to_string()),
        })
    }

    /// Project id and API token of the translation project.
    pub fn crowdin_credentials(&self) -> Result<(u64, &str), InterfaceError> {
        let project_id = self
            .crowdin_project_id
            .as_deref()
            .ok_or_else(|| missing("CROWDIN_PROJECT_ID"))?
            .trim()
            .parse::<u64>()
            .map_err(|e| {
                InterfaceError::FatalError(format!("CROWDIN_PROJECT_ID is not a number: {}", e))
            })?;
        let api_token = self
            .crowdin_api_token
            .as_deref()
            .ok_or_else(|| missing("CROWDIN_API_TOKEN"))?;
        Ok((project_id, api_token))
    }

    pub fn rpc_url(&self) -> Result<&str, InterfaceError> {
        self.rpc_url
            .as_deref()
            .ok_or_else(|| missing("RPC_URL"))
    }
}

fn missing(key: &str) -> InterfaceError {
    InterfaceError::FatalError(format!("Missing {} in environment", key))
}

pub fn parse_address(address: &str) -> Result<Address, InterfaceError> {
    Address::from_str(address)
        .map_err(|_| InterfaceError::InvalidInput(format!("Invalid address: {}", address)))
}
