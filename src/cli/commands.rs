use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::app::{AppContext, Result, StripError};
use crate::cli::RunArgs;
use crate::collector::{Collector, SourceFailure};
use crate::delivery::{ConsoleSink, Sink, TelegramSink};
use crate::domain::watermark::cutoff_for;
use crate::sources::{self, Source};
use crate::store::WatermarkStore;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub delivered: usize,
    pub failures: Vec<SourceFailure>,
    pub watermarks_saved: bool,
}

/// Start of the window for sources without a watermark.
pub fn default_cutoff(lookback_days: i64) -> Result<DateTime<Utc>> {
    if lookback_days < 0 {
        return Err(StripError::Config(format!(
            "lookback must not be negative, got {} days",
            lookback_days
        )));
    }

    TimeDelta::try_days(lookback_days)
        .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
        .ok_or_else(|| {
            StripError::Config(format!("lookback of {} days is out of range", lookback_days))
        })
}

/// Collect, deliver, then persist watermarks.
///
/// Watermarks are only written once the sink accepted every update, so a
/// failed delivery is retried on the next run.
pub async fn run_with(
    collector: &Collector,
    store: &dyn WatermarkStore,
    sink: &dyn Sink,
    selected: Vec<Arc<dyn Source>>,
    lookback_days: i64,
    persist: bool,
) -> Result<RunSummary> {
    let default_cutoff = default_cutoff(lookback_days)?;
    let watermarks = store.load()?;

    let outcome = collector
        .collect(selected, &watermarks, default_cutoff)
        .await;

    sink.deliver(&outcome.updates).await?;

    if persist {
        store.save(&outcome.watermarks)?;
    }

    Ok(RunSummary {
        delivered: outcome.updates.len(),
        failures: outcome.failures,
        watermarks_saved: persist,
    })
}

pub async fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let requested: Vec<String> = if args.strips.is_empty() {
        ctx.config.collector.sources.clone()
    } else {
        args.strips
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    let selected = sources::select(&requested)?;

    // Resolve the sink first so missing credentials fail before any request.
    let sink: Box<dyn Sink> = if args.console {
        Box::new(ConsoleSink)
    } else {
        Box::new(TelegramSink::new(ctx.http.client().clone(), &ctx.config.telegram)?)
    };

    let lookback_days = args.delta.unwrap_or(ctx.config.collector.lookback_days);
    default_cutoff(lookback_days)?;

    info!(sources = selected.len(), lookback_days, "Collecting");
    let summary = run_with(
        &ctx.collector,
        &ctx.store,
        sink.as_ref(),
        selected,
        lookback_days,
        !args.dry_run,
    )
    .await?;

    for failure in &summary.failures {
        eprintln!("  Error collecting {}: {}", failure.source_id, failure.error);
    }
    println!(
        "Run complete: {} updates delivered, {} sources failed{}",
        summary.delivered,
        summary.failures.len(),
        if summary.watermarks_saved {
            ""
        } else {
            " (watermarks not saved)"
        }
    );

    Ok(())
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    let watermarks = ctx.store.load()?;
    let default_cutoff = default_cutoff(ctx.config.collector.lookback_days)?;

    for source in sources::registry() {
        let descriptor = source.descriptor();
        let next = cutoff_for(&watermarks, descriptor.id, default_cutoff);
        println!(
            "{:<24} {}\n  {}\n  next run from {}",
            descriptor.id,
            descriptor.title,
            descriptor.feed_url,
            next.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

pub fn list_watermarks(ctx: &AppContext) -> Result<()> {
    let watermarks = ctx.store.load()?;

    if watermarks.is_empty() {
        println!("No watermarks stored");
        return Ok(());
    }

    for (source_id, last_seen) in &watermarks {
        println!("{:<24} {}", source_id, last_seen.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
