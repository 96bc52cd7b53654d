use anyhow::{Context, Result};

use mds_sdk::config::CliArgs;
use mds_sdk::{CredentialOverrides, MdsSdk, SdkOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::load();

    // Logs go to stderr; stdout carries only the token
    let log_level = args.effective_log_level();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let overrides = CredentialOverrides {
        account_id: args.account.clone(),
        user_id: args.user_id.clone(),
        password: args.password.clone(),
    };

    let sdk = MdsSdk::initialize(SdkOptions::from(args))
        .await
        .context("Failed to initialize the SDK")?;

    let auth_manager = sdk.auth_manager();
    tracing::debug!(
        account = %auth_manager.current_account().await,
        user = %auth_manager.current_user().await,
        "Requesting token"
    );

    let token = auth_manager
        .get_authentication_token(&overrides)
        .await
        .with_context(|| format!("Failed to obtain a token from {}", auth_manager.identity_url()))?;

    println!("{}", token);
    Ok(())
}
