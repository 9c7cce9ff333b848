use std::path::PathBuf;

pub use clap::Parser;
use clap::{Args, Subcommand};

#[derive(Parser)]
/// Localisation and token approval tools of the swap interface.
///
/// Translation commands read CROWDIN_PROJECT_ID and CROWDIN_API_TOKEN from the environment (or a
/// `.env` file). Chain commands additionally need RPC_URL.
#[command(name = "swap-interface", version)]
pub struct Cli {
    /// Storage file holding the selected language. Defaults to the user's config directory.
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the known languages
    Languages,
    /// Select a language, persist it and fetch its translations
    Select {
        /// Language code, for example `fr` or `pt-BR`
        code: String,
    },
    /// Fetch the translations of the stored language and print them as JSON
    Translations,
    /// Print the approval state of an amount for a spender
    Allowance(ApprovalArgs),
    /// Approve a spender through the node's account
    Approve(ApprovalArgs),
}

#[derive(Args)]
pub struct ApprovalArgs {
    /// Token contract address
    #[arg(long)]
    pub token: String,

    /// Token symbol used in the transaction summary
    #[arg(long, default_value = "TOKEN")]
    pub symbol: String,

    #[arg(long, default_value_t = 18)]
    pub decimals: u8,

    #[arg(long, default_value_t = 56)]
    pub chain_id: u64,

    /// Account owning the tokens
    #[arg(long)]
    pub owner: String,

    /// Spender to approve. Defaults to ROUTER_ADDRESS.
    #[arg(long)]
    pub spender: Option<String>,

    /// Amount in the token's smallest unit
    #[arg(long)]
    pub amount: String,
}
