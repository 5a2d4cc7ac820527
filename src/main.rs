use clap::Parser;
use haunt_signals::{EngineConfig, SignalEngine, Timeframe};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "haunt-signals")]
#[command(about = "Trust-scored trading signals from multi-exchange candles")]
struct Args {
    /// Candle interval (1m, 5m, 15m, 1h, 4h, 1d)
    #[arg(short, long, default_value = "1h", value_parser = parse_timeframe)]
    timeframe: Timeframe,

    /// Exchange to try first; defaults to the first configured source
    #[arg(short, long)]
    exchange: Option<String>,

    /// Symbols to analyze, e.g. btc eth
    #[arg(required = true)]
    symbols: Vec<String>,
}

fn parse_timeframe(value: &str) -> Result<Timeframe, String> {
    Timeframe::from_str(value).ok_or_else(|| format!("unknown timeframe: {}", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haunt_signals=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env();
    info!(
        "Generating {} signals for {:?} (policy: {:?})",
        args.timeframe, args.symbols, config.synthetic_policy
    );
    let exchange = args
        .exchange
        .or_else(|| config.candle_sources.first().cloned())
        .unwrap_or_default();
    let engine = SignalEngine::from_config(config);

    for symbol in &args.symbols {
        let symbol = symbol.to_lowercase();
        match engine.generate_trading_signal(&symbol, &exchange, args.timeframe).await {
            Some(signal) => println!("{}", serde_json::to_string_pretty(&signal)?),
            None => warn!("No signal for {}", symbol),
        }
    }

    for stats in engine.breaker_stats().await {
        info!(
            "Breaker {}: {:?}, {} calls, {} failures ({:.0}% failure rate)",
            stats.name,
            stats.state,
            stats.total_calls,
            stats.total_failures,
            stats.failure_rate() * 100.0
        );
    }

    Ok(())
}
