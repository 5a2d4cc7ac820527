use crate::types::{FeatureVector, MarketContext};

/// Credit events considered for agent performance.
pub const AGENT_WINDOW: usize = 100;
/// Memory entries considered for sentiment.
pub const SENTIMENT_WINDOW: usize = 10;

/// Percent change, 0 when either side is missing or the base is zero.
fn pct_change(current: Option<f64>, previous: Option<f64>) -> f64 {
    match (current, previous) {
        (Some(cur), Some(prev)) if prev != 0.0 => (cur - prev) / prev * 100.0,
        _ => 0.0,
    }
}

fn agent_performance(deltas: &[f64]) -> f64 {
    let recent = &deltas[deltas.len().saturating_sub(AGENT_WINDOW)..];
    if recent.is_empty() {
        return 50.0;
    }
    let positive = recent.iter().filter(|d| **d > 0.0).count();
    positive as f64 / recent.len() as f64 * 100.0
}

fn sentiment(ctx: &MarketContext) -> f64 {
    let recent = &ctx.memory[ctx.memory.len().saturating_sub(SENTIMENT_WINDOW)..];
    recent.iter().fold(50.0, |mut acc, entry| {
        if entry.success {
            acc += 2.0;
        }
        if entry.high_risk {
            acc -= 2.0;
        }
        acc
    })
}

fn liquidity_depth(ctx: &MarketContext) -> f64 {
    match ctx.tvl {
        Some(tvl) if tvl > 0.0 => 100.0 - 100.0 * (ctx.volume.unwrap_or(0.0) / tvl),
        _ => 50.0,
    }
}

/// Build a clamped feature vector from raw context.
pub fn extract_features(ctx: &MarketContext, default_gas: f64, timestamp: i64) -> FeatureVector {
    FeatureVector {
        price_volatility: pct_change(ctx.price, ctx.previous_price).abs(),
        tvl_change: pct_change(ctx.tvl, ctx.previous_tvl),
        gas_price: ctx.gas_price.unwrap_or(default_gas),
        agent_performance: agent_performance(&ctx.credit_deltas),
        market_sentiment: sentiment(ctx),
        liquidity_depth: liquidity_depth(ctx),
        volume_change: pct_change(ctx.volume, ctx.previous_volume),
        timestamp,
    }
    .clamped()
}
