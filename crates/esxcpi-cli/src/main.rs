use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use esxcpi_core::app::{ActionTable, Dispatcher, Operations, response_error};
use esxcpi_core::config;
use esxcpi_core::domain::{ActionError, Request, Response};
use esxcpi_core::ports::SystemClock;

/// stdin から `{method, arguments}` を 1 件読み、stdout に `{result, error, log}` を書く
#[derive(Debug, Parser)]
#[command(name = "esxcpi", version, about = "esxcloud CPI for BOSH")]
struct Cli {
    /// JSON 設定ファイルのパス
    #[arg(long, env = "ESXCPI_CONFIG_PATH")]
    config_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // help / version だけはエンベロープを返さない
    let cli = match Cli::try_parse() {
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        parsed => parsed,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let response = runtime.block_on(async {
        let mut input = String::new();
        let read = tokio::io::stdin().read_to_string(&mut input).await.map(|_| input);
        run(cli, read).await
    });

    let mut body = serde_json::to_vec(&response).context("encoding response")?;
    body.push(b'\n');
    runtime
        .block_on(async {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&body).await?;
            stdout.flush().await
        })
        .context("writing response")?;
    Ok(())
}

async fn run(cli: Result<Cli, clap::Error>, input: std::io::Result<String>) -> Response {
    match prepare(cli, input) {
        Ok((dispatcher, ops, request)) => dispatcher.handle(&ops, request).await,
        Err(err) => {
            tracing::error!("{err}");
            Response::failure(response_error(&err), String::new())
        }
    }
}

fn prepare(
    cli: Result<Cli, clap::Error>,
    input: std::io::Result<String>,
) -> Result<(Dispatcher, Operations, Request), ActionError> {
    let input = input.map_err(|e| ActionError::cpi("Error reading from stdin", e))?;

    let request: Request =
        serde_json::from_str(&input).map_err(|e| ActionError::cpi("Error parsing args", e))?;

    let cli = cli.map_err(|e| ActionError::cpi("Unable to load esxcloud config", e))?;

    let config = config::load(&cli.config_path)
        .map_err(|e| ActionError::cpi("Error loading config file", e))?;

    let ops = Operations::from_config(&config)
        .map_err(|e| ActionError::cpi("Error creating esxcloud client", e))?;

    let table = ActionTable::standard().map_err(|e| ActionError::cpi("Error building action table", e))?;
    let dispatcher = Dispatcher::new(table, Arc::new(SystemClock)).mirror_to_stderr(true);

    tracing::debug!(method = %request.method, "dispatching");
    Ok((dispatcher, ops, request))
}
