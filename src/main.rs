use std::sync::Arc;

use chatwatch::cli::{parse_args, run_cli_command, RunOptions, USAGE};
use chatwatch::{ClientConfig, GatewayClient, GatewayEvent, MessageRef};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// One line of `--ingest` input.
#[derive(Debug, Deserialize)]
struct IngestLine {
    content: String,
    #[serde(flatten)]
    target: MessageRef,
}

fn init_tracing(options: &RunOptions) {
    let default_level = if options.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Print every gateway event to stdout as one JSON line.
fn print_event(event: &GatewayEvent) {
    let line = match event {
        GatewayEvent::Connected => json!({"event": "connected"}),
        GatewayEvent::Response(data) => json!({"event": "response", "data": data}),
        GatewayEvent::Close(reason) => {
            json!({"event": "close", "code": reason.code, "reason": reason.reason})
        }
    };
    println!("{}", line);
}

async fn ingest_stdin(client: &GatewayClient) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.wrap_err("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: IngestLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping invalid ingest line: {}", e);
                continue;
            }
        };
        if let Err(e) = client.ingest(&parsed.content, &parsed.target) {
            warn!(code = e.error_code(), "Ingest failed: {}", e);
        }
    }

    info!("stdin closed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    let Some(options) = run_cli_command(command) else {
        return Ok(());
    };

    init_tracing(&options);

    let config = ClientConfig::from_env()
        .wrap_err("Invalid ChatWatch configuration")?
        .with_verbose(options.verbose);
    let token = options
        .token
        .clone()
        .or_else(|| std::env::var("CHATWATCH_TOKEN").ok())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| eyre!("No token given; pass --token or set CHATWATCH_TOKEN"))?;

    info!(version = chatwatch::cli::VERSION, "chatwatch starting");

    let client = GatewayClient::new(config);
    client.on_event(Arc::new(print_event));

    client
        .login(Some(&token))
        .await
        .wrap_err("Failed to connect to ChatWatch")?;

    if let Some(user) = &options.profile {
        let profile = client
            .profile(user.as_str())
            .await
            .wrap_err_with(|| format!("Profile lookup for {} failed", user))?;
        println!("{}", json!({"event": "profile", "user": user, "data": profile}));
    }

    if options.ingest_stdin {
        tokio::select! {
            result = ingest_stdin(&client) => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                client.shutdown();
                return Ok(());
            }
        }
    }

    // Keep printing verdicts until interrupted.
    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl+C")?;
    info!("Interrupted");

    client.shutdown();
    Ok(())
}
