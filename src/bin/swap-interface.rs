use std::{str::FromStr, sync::Arc};

use num_bigint::BigUint;
use swap_interface::{
    approvals::{
        connector::WalletConnector,
        controller::{ApprovalController, ApproveCallback},
        evm::erc20::Erc20Client,
        models::{Currency, CurrencyAmount, Token},
        transactions::TransactionStore,
    },
    config::{parse_address, Config},
    errors::InterfaceError,
    localisation::{
        crowdin::CrowdinClient,
        languages::{language_by_code, ALL_LANGUAGES},
        models::LangType,
        provider::LanguageProvider,
        storage::{FileStorage, KeyValueStorage},
    },
};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

mod lib {
    pub mod cli;
}

use lib::cli::{ApprovalArgs, Cli, Command, Parser};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Languages => {
            for language in ALL_LANGUAGES.iter() {
                println!("{}\t{}", language.code, language.language);
            }
        }
        Command::Select { code } => {
            let provider = language_provider(cli.storage)?;
            let language = language_by_code(&code)
                .cloned()
                .unwrap_or_else(|| LangType::new(&code, &code));
            wait_for(provider.set_selected_language(language)).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "selected": provider.selected_language(),
                    "translated": provider.translated_language(),
                    "translations": provider.translations().len(),
                    "error": provider.translations().is_error(),
                }))?
            );
        }
        Command::Translations => {
            let provider = language_provider(cli.storage)?;
            if let Some(fetch) = provider.initialize() {
                wait_for(fetch).await?;
            }
            println!("{}", serde_json::to_string_pretty(&provider.translations())?);
        }
        Command::Allowance(args) => {
            let (callback, _) = approve_callback(&args).await?;
            println!("{}", serde_json::to_string(&callback.state())?);
        }
        Command::Approve(args) => {
            let (callback, store) = approve_callback(&args).await?;
            callback.approve().await?;
            println!("{}", serde_json::to_string_pretty(&store.all_transactions())?);
        }
    }
    Ok(())
}

fn language_provider(
    storage: Option<std::path::PathBuf>,
) -> Result<LanguageProvider, InterfaceError> {
    let config = Config::from_env()?;
    let storage: Arc<dyn KeyValueStorage> = match storage {
        Some(path) => Arc::new(FileStorage::new(path)),
        None => Arc::new(FileStorage::in_config_dir()?),
    };
    LanguageProvider::new(storage, Arc::new(CrowdinClient::from_config(&config)?))
}

async fn wait_for(fetch: JoinHandle<()>) -> Result<(), InterfaceError> {
    fetch
        .await
        .map_err(|e| InterfaceError::FatalError(format!("Translation fetch panicked: {}", e)))
}

async fn approve_callback(
    args: &ApprovalArgs,
) -> Result<(ApproveCallback, Arc<TransactionStore>), InterfaceError> {
    let config = Config::from_env()?;
    let owner = parse_address(&args.owner)?;
    let spender = match &args.spender {
        Some(spender) => parse_address(spender)?,
        None => config.router_address,
    };
    let token = Token {
        chain_id: args.chain_id,
        address: parse_address(&args.token)?,
        decimals: args.decimals,
        symbol: args.symbol.clone(),
    };
    let raw = BigUint::from_str(&args.amount)
        .map_err(|_| InterfaceError::InvalidInput(format!("Invalid amount: {}", args.amount)))?;

    let client = Arc::new(Erc20Client::connect(config.rpc_url()?, Some(owner)).await?);
    let store = Arc::new(TransactionStore::new());
    let controller = ApprovalController::new(
        Some(owner),
        Arc::new(WalletConnector::Injected),
        client.clone(),
        client,
        store.clone(),
    );
    let callback = controller
        .approve_callback(Some(CurrencyAmount::new(Currency::Token(token), raw)), Some(spender))
        .await;
    Ok((callback, store))
}
