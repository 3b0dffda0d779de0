use anyhow::Result;
use clap::Parser;
use clean_proxy::proxy::{CheckerConfig, FraudClient, FraudConfig, ProxyChecker, ProxyParser};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// A SOCKS5 proxy checker that keeps the proxies with a clean exit IP
#[derive(Parser)]
#[command(name = "clean-proxy")]
#[command(about = "Checks SOCKS5 proxies and keeps the ones with a zero fraud score")]
struct Cli {
    /// Input file containing proxies in HOST:PORT:USER:PASS format
    #[arg(default_value = "socks5.txt")]
    input: PathBuf,

    /// Output file for clean proxies
    #[arg(short, long, default_value = "clean_socks5.txt")]
    output: PathBuf,

    /// ip2location.io API key with the fraud add-on enabled
    #[arg(short = 'k', long, env = "IP2LOCATION_API_KEY")]
    api_key: String,

    /// Timeout in seconds for each network call
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// URL returning the caller's public IP as plain text
    #[arg(long, default_value = "https://api.ipify.org")]
    echo_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    let records = ProxyParser::load_file(&cli.input)?;
    println!("Loaded {} proxies from {}", records.len(), cli.input.display());

    let checker = ProxyChecker::with_config(
        CheckerConfig::new()
            .with_timeout(timeout)
            .with_echo_url(cli.echo_url),
    );
    let mut fraud =
        FraudClient::with_config(FraudConfig::new(cli.api_key).with_timeout(timeout))?;

    let mut results = Vec::with_capacity(records.len());
    for record in &records {
        let result = checker.vet(record, &mut fraud).await;
        println!("{}", result);
        results.push(result);
    }

    let clean: Vec<String> = results
        .iter()
        .filter(|r| r.is_clean())
        .map(|r| r.proxy.clone())
        .collect();

    ProxyParser::save_to_file(&clean, &cli.output)?;

    println!();
    println!("========== SUMMARY ==========");
    println!("Total proxies checked: {}", records.len());
    println!("Clean proxies saved:  {}", clean.len());
    println!("Output file: {}", cli.output.display());

    Ok(())
}
