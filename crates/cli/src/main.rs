//! `pikarama` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`: execute the action node for one or more items.
//! - `options`: load a dynamic option list.
//! - `check`: test the credentials and show the current user.
//! - `serve`: register the trigger's webhook and receive deliveries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nodes::{
    ExecutableNode, ExecutionContext, HookContext, JsonFileStaticData, LoadOptions,
    PerItemParameters, TriggerNode,
};
use pikarama::credentials::DEFAULT_BASE_URL;
use pikarama::{PikaramaClient, PikaramaCredentials, PikaramaNode, PikaramaTrigger};

#[derive(Parser)]
#[command(
    name = "pikarama",
    about = "Pikarama action and trigger nodes from the command line",
    version
)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CredentialArgs {
    /// API token from Pikarama Settings > API Tokens.
    #[arg(long, env = "PIKARAMA_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    #[arg(long, env = "PIKARAMA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Fallback secret for verifying deliveries.
    #[arg(long, env = "PIKARAMA_WEBHOOK_SECRET", hide_env_values = true, global = true)]
    webhook_secret: Option<String>,
}

impl CredentialArgs {
    fn credentials(&self) -> Result<PikaramaCredentials> {
        let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) else {
            bail!("an API token is required (--api-token or PIKARAMA_API_TOKEN)");
        };
        let mut creds = PikaramaCredentials::new(token, &self.base_url);
        if let Some(secret) = &self.webhook_secret {
            creds = creds.with_webhook_secret(secret.as_str());
        }
        Ok(creds)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Execute the action node.
    Run {
        #[arg(long, default_value = "event")]
        resource: String,
        #[arg(long)]
        operation: String,
        /// Node parameters as a JSON object, shared by every item.
        #[arg(long, default_value = "{}")]
        params: String,
        /// JSON array of per-item parameter objects. One item when omitted.
        #[arg(long)]
        items: Option<String>,
        /// Record item failures as output instead of aborting.
        #[arg(long)]
        continue_on_fail: bool,
    },
    /// Load a dynamic option list (getGroups, getTopics, getEvents, ...).
    Options {
        method: String,
        /// Parameters the list depends on, e.g. `{"groupId":"g1"}`.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Test the credentials.
    Check,
    /// Register the trigger and receive deliveries until Ctrl-C.
    Serve {
        #[arg(long, default_value = "0.0.0.0:5678")]
        bind: String,
        /// Public base URL the Pikarama service can reach this process on.
        #[arg(long)]
        public_url: String,
        #[arg(long, default_value = "pikarama")]
        path: String,
        /// Event types to subscribe to (comma-separated).
        #[arg(long, value_delimiter = ',')]
        events: Vec<String>,
        /// Only receive events from these groups (comma-separated ids).
        #[arg(long)]
        group_ids: Option<String>,
        /// Where the webhook id and secret are persisted.
        #[arg(long, default_value = ".pikarama-trigger.json")]
        state_file: PathBuf,
    },
}

fn parse_object(name: &str, raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).with_context(|| format!("--{name} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        _ => bail!("--{name} must be a JSON object"),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credentials = cli.credentials.credentials()?;

    match cli.command {
        Command::Run {
            resource,
            operation,
            params,
            items,
            continue_on_fail,
        } => {
            let mut shared = parse_object("params", &params)?;
            shared.insert("resource".into(), json!(resource));
            shared.insert("operation".into(), json!(operation));

            let per_item = match items {
                Some(raw) => {
                    let values: Vec<Value> =
                        serde_json::from_str(&raw).context("--items is not valid JSON")?;
                    values
                        .into_iter()
                        .map(|v| match v {
                            Value::Object(map) => Ok(map),
                            _ => bail!("--items must be an array of JSON objects"),
                        })
                        .collect::<Result<Vec<_>>>()?
                }
                None => vec![Map::new()],
            };

            let input = vec![json!({}); per_item.len()];
            let ctx = ExecutionContext::new(
                credentials.to_secrets(),
                Arc::new(PerItemParameters::new(shared, per_item)),
            )
            .with_continue_on_fail(continue_on_fail);

            let output = PikaramaNode::new().execute(input, &ctx).await?;
            print_json(&Value::Array(output))?;
        }

        Command::Options { method, params } => {
            let params = Value::Object(parse_object("params", &params)?);
            let ctx = ExecutionContext::new(credentials.to_secrets(), Arc::new(params));
            let options = PikaramaNode::new().load_options(&method, &ctx).await?;
            print_json(&serde_json::to_value(options)?)?;
        }

        Command::Check => {
            let client = PikaramaClient::new(&credentials)?;
            client.test_credentials().await?;
            info!("Credentials accepted by {}", client.base_url());
            print_json(&client.current_user().await?)?;
        }

        Command::Serve {
            bind,
            public_url,
            path,
            events,
            group_ids,
            state_file,
        } => {
            let mut params = Map::new();
            if !events.is_empty() {
                params.insert("events".into(), json!(events));
            }
            params.insert("filterByGroups".into(), json!(group_ids.is_some()));
            if let Some(ids) = group_ids {
                params.insert("groupIds".into(), json!(ids));
            }

            let webhook_url = format!("{}/webhook/{}", public_url.trim_end_matches('/'), path);
            let ctx = HookContext::new(
                webhook_url.clone(),
                credentials.to_secrets(),
                Arc::new(Value::Object(params)),
                Arc::new(JsonFileStaticData::open(&state_file)?),
            );
            let trigger = Arc::new(PikaramaTrigger::new());

            if trigger.check_exists(&ctx).await? {
                info!("Webhook already registered for {webhook_url}");
            } else {
                trigger.create(&ctx).await?;
                info!("Registered webhook for {webhook_url}");
            }

            let (tx, mut rx) = mpsc::channel::<Value>(64);
            let printer = tokio::spawn(async move {
                while let Some(record) = rx.recv().await {
                    println!("{record}");
                }
            });

            let state = api::AppState::new(tx).with_route(
                path,
                api::WebhookRoute {
                    trigger: trigger.clone(),
                    ctx: ctx.clone(),
                },
            );
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
            };
            api::serve(&bind, state, shutdown).await?;

            if trigger.delete(&ctx).await? {
                info!("Webhook deregistered");
            } else {
                warn!("Webhook deregistration failed; local state cleared");
            }
            // All senders are gone once the server stops.
            let _ = printer.await;
        }
    }

    Ok(())
}
