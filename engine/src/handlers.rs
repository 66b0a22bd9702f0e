//! Command handlers for CLI operations
//!
//! - serve: run the HTTP API until Ctrl+C
//! - chat: talk to the preorder assistant from the terminal
//! - orders: list confirmed orders
//! - config: print the effective configuration
//! - secret: store or check the OpenAI API key

use anyhow::{Context, Result};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use sdk::types::ChatResponse;

use crate::app::AppContext;
use crate::cli::SecretAction;
use crate::chat::OrderStore;
use crate::config::Config;
use crate::secrets::{SecretManager, OPENAI_API_KEY, SERVICE_NAME};
use crate::server;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Start the HTTP API and block until Ctrl+C
pub async fn handle_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let ctx = AppContext::from_config(config).context("Failed to initialize chatbots")?;
    server::serve(ctx, server::shutdown_signal())
        .await
        .context("API server failed")?;
    Ok(())
}

/// Send one query, or run a stdin loop in a single session when no query
/// is given. `session` names the stdin session; a one-shot query always
/// starts a fresh one.
pub async fn handle_chat(
    config: Config,
    query: Option<String>,
    session: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let ctx = AppContext::from_config(config).context("Failed to initialize chatbots")?;

    if let Some(query) = query {
        let response = ctx.preorder.handle(None, &query, Vec::new()).await?;
        return print_chat_response(&response, format);
    }

    let mut session = session;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    if format == OutputFormat::Text {
        println!("Type a query and press Enter. Ctrl+D to quit.");
    }

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = ctx.preorder.handle(session.clone(), &line, Vec::new()).await?;
        session = Some(response.session_id.clone());
        print_chat_response(&response, format)?;
    }

    Ok(())
}

fn print_chat_response(response: &ChatResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("[{}] {}", response.category, response.response);
            if let Some(pending) = &response.pending_order {
                println!("  (pending order: {} - reply \"yes\" to confirm)", pending);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
    }
    Ok(())
}

/// List confirmed orders
pub async fn handle_orders(config: &Config, format: OutputFormat) -> Result<()> {
    let store = OrderStore::new(config.preorder.orders_file.clone());
    let orders = store.list().await.context("Failed to read orders")?;

    match format {
        OutputFormat::Text => {
            if orders.is_empty() {
                println!("No orders yet");
                return Ok(());
            }

            println!("Orders ({}):", orders.len());
            println!();
            for order in &orders {
                println!("#{}: {}", order.order_number, order.details);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "orders": orders,
                "count": orders.len(),
                "path": store.path().display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn handle_config(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{}", text);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

/// Store the OpenAI API key in the keychain, or report whether one is set
pub async fn handle_secret(action: SecretAction, format: OutputFormat) -> Result<()> {
    let manager = SecretManager::new(SERVICE_NAME);

    match action {
        SecretAction::Set => {
            if format == OutputFormat::Text {
                println!("Paste the OpenAI API key and press Enter:");
            }
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let key = lines
                .next_line()
                .await
                .context("Failed to read stdin")?
                .unwrap_or_default();

            manager
                .set_secret(OPENAI_API_KEY, key.trim())
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            match format {
                OutputFormat::Text => println!("OpenAI API key stored in the keychain"),
                OutputFormat::Json => println!("{}", json!({ "stored": true })),
            }
        }
        SecretAction::Status => {
            let available = manager.has_secret(OPENAI_API_KEY);
            match format {
                OutputFormat::Text => {
                    if available {
                        println!("OpenAI API key: available");
                    } else {
                        println!(
                            "OpenAI API key: missing (set {} or run `matchday secret set`)",
                            SecretManager::env_var_name(OPENAI_API_KEY)
                        );
                    }
                }
                OutputFormat::Json => println!("{}", json!({ "openai_api_key": available })),
            }
        }
    }

    Ok(())
}
