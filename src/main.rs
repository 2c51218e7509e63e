use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::path::Path;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod chat;
mod config;
mod mcp;
mod session;
mod tools;
mod utils;

use chat::{ChatClient, ChatCompletionsClient};
use config::{read_secrets_api_key, resolve_api_key, validate_base_url, API_KEY_ENV, DEFAULT_BASE_URL};
use mcp::server::McpServer;
use session::{ContextMode, Orchestrator};

fn cli() -> Command {
    Command::new("mcp-pdfchat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A Model Context Protocol server for chatting with a PDF")
        .long_about(
            "This MCP server provides the following tools:\n\
            - upload-pdf: Upload a PDF and extract its text\n\
            - ask-question: Ask the chat model a question about the uploaded PDF\n\
            - chat-history: Show the conversation transcript",
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("Chat completions API key (overrides SAMBANOVA_API_KEY)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("secrets-file")
                .long("secrets-file")
                .value_name("PATH")
                .help("TOML file with a [general] SAMBANOVA_API_KEY entry")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Base URL of the OpenAI-compatible API")
                .default_value(DEFAULT_BASE_URL)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("ephemeral-context")
                .long("ephemeral-context")
                .help("Send the document excerpt with each question without storing it in the chat history")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
}

/// Logs go to stderr; stdout is reserved for JSON-RPC.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn lookup_api_key(matches: &ArgMatches) -> Option<String> {
    resolve_api_key(
        matches.get_one::<String>("api-key").cloned(),
        env::var(API_KEY_ENV).ok(),
        || {
            let path = matches.get_one::<String>("secrets-file")?;
            match read_secrets_api_key(Path::new(path)) {
                Ok(key) => key,
                Err(e) => {
                    error!("{}", e);
                    None
                }
            }
        },
    )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("quiet"));

    let raw_base_url = matches
        .get_one::<String>("base-url")
        .map(String::as_str)
        .unwrap_or(DEFAULT_BASE_URL);
    let base_url = match validate_base_url(raw_base_url) {
        Ok(url) => url,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let client: Option<Box<dyn ChatClient>> = match lookup_api_key(&matches) {
        Some(api_key) => match ChatCompletionsClient::new(api_key, &base_url) {
            Ok(client) => {
                info!("Chat client configured for {}", client.endpoint());
                Some(Box::new(client) as Box<dyn ChatClient>)
            }
            Err(e) => {
                error!("Failed to create chat client: {}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("API key not found - questions will be rejected until {} is configured", API_KEY_ENV);
            None
        }
    };

    let context_mode = if matches.get_flag("ephemeral-context") {
        info!("Document excerpts will not be stored in the chat history");
        ContextMode::Ephemeral
    } else {
        ContextMode::Persisted
    };

    let orchestrator = Orchestrator::new(client).with_context_mode(context_mode);

    info!("Starting MCP server...");

    let mut server = McpServer::new(orchestrator);
    if let Err(e) = server.start().await {
        error!("Server stopped with an error: {}", e);
        process::exit(1);
    }
}
