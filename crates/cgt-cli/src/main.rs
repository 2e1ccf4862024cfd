//! cgt-query: evaluate one game position with a CGT engine
//!
//! Usage:
//!   cgt-query [--engine PATH] [--protocol 1|2] [--timeout-ms N] domineering GRID
//!   cgt-query [--engine PATH] [--protocol 1|2] [--timeout-ms N] snort MATRIX [COLORS]
//!
//! GRID uses `.` and `#` with `|` between rows. MATRIX uses `0` and `1` with
//! `|` between rows. COLORS is a comma-separated list of vertex tags 0..4.
//! Options not given fall back to CGT_ENGINE, CGT_PROTOCOL and CGT_READ_TIMEOUT_MS.

use anyhow::{Context, Result, anyhow, bail};
use cgt_client::{CgtClient, DomineeringRequest, EngineConfig, Request, SnortRequest, VertexColor};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "usage: cgt-query [--engine PATH] [--protocol 1|2] [--timeout-ms N] \
                     (domineering GRID | snort MATRIX [COLORS])";

/// Parsed command line
#[derive(Debug)]
struct Invocation {
    config: EngineConfig,
    request: Request,
}

fn parse_args(args: &[String], mut config: EngineConfig) -> Result<Invocation> {
    let mut rest = args.iter();
    let mut positional = Vec::new();

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--engine" => {
                let path = rest.next().ok_or_else(|| anyhow!("--engine needs a path"))?;
                config.program = PathBuf::from(path);
            }
            "--protocol" => {
                let version = rest.next().ok_or_else(|| anyhow!("--protocol needs 1 or 2"))?;
                config.protocol = version.parse()?;
            }
            "--timeout-ms" => {
                let ms = rest
                    .next()
                    .ok_or_else(|| anyhow!("--timeout-ms needs a value"))?;
                let ms: u64 = ms.parse().context("--timeout-ms must be an integer")?;
                config.read_timeout = Some(Duration::from_millis(ms));
            }
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            _ => positional.push(arg.as_str()),
        }
    }

    let request: Request = match positional.as_slice() {
        ["domineering", grid] => DomineeringRequest::from_grid(*grid).into(),
        ["snort", matrix] => SnortRequest::new(parse_matrix(matrix)?).into(),
        ["snort", matrix, colors] => SnortRequest::new(parse_matrix(matrix)?)
            .with_vertices(parse_colors(colors)?)
            .into(),
        _ => bail!(USAGE),
    };

    Ok(Invocation { config, request })
}

/// `010|101|010` into a flat row-major matrix
fn parse_matrix(text: &str) -> Result<Vec<bool>> {
    text.chars()
        .filter(|c| *c != '|')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(anyhow!("invalid matrix entry '{}'", other)),
        })
        .collect()
}

/// `0,1,4` into vertex colors
fn parse_colors(text: &str) -> Result<Vec<VertexColor>> {
    text.split(',')
        .map(|tag| -> Result<VertexColor> {
            let tag: u8 = tag
                .trim()
                .parse()
                .with_context(|| format!("invalid color tag '{}'", tag))?;
            Ok(VertexColor::try_from(tag)?)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Invocation { config, request } = parse_args(&args, EngineConfig::from_env()?)?;

    info!("Querying {} with {} request", config.program.display(), request.kind());

    let mut client = CgtClient::spawn(config).await?;
    let result = client.request(&request).await;
    if result.is_err() {
        for line in client.stderr_tail() {
            warn!("engine: {}", line);
        }
    }
    client.close().await?;

    let value = result?;
    println!("canonical form: {}", value.canonical_form());
    println!("temperature: {}", value.temperature());
    Ok(())
}
