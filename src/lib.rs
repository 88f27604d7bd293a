//! # Stripfeed
//!
//! Collects newly published web comic strips and pushes them to a Telegram
//! chat, or prints them to the terminal.
//!
//! ## Architecture
//!
//! ```text
//! Sources → Collector → Sink
//!              ↕
//!        Watermark store
//! ```
//!
//! Each run fetches every selected source's feed concurrently, keeps the
//! entries published after that source's watermark, turns them into
//! [`Update`](domain::Update)s and hands the merged batch to a sink. The
//! watermarks are saved only after delivery succeeds.
//!
//! ## Quick Start
//!
//! ```bash
//! # Print the last week of strips
//! stripfeed run --console --delta 7
//!
//! # Send new xkcd and SMBC strips to Telegram
//! BOT_TOKEN=... RECIPIENT_ID=... stripfeed run --strips xkcd,smbc
//!
//! # Inspect state
//! stripfeed sources
//! stripfeed watermarks
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the config,
/// watermark store, HTTP client and collector.
pub mod app;

/// Command-line interface using clap.
///
/// - `run [--console] [--delta N] [--strips a,b] [--dry-run]` - Collect and deliver
/// - `sources` - List the known sources
/// - `watermarks` - Show stored watermarks
pub mod cli;

/// Concurrent per-source collection with failure isolation.
pub mod collector;

/// Configuration management.
///
/// Loads from `~/.config/stripfeed/config.toml`, with Telegram credentials
/// overridable from the environment.
pub mod config;

/// Delivery sinks: [`TelegramSink`](delivery::TelegramSink) and
/// [`ConsoleSink`](delivery::ConsoleSink).
pub mod delivery;

/// Core domain models.
///
/// - [`Update`](domain::Update): One comic strip ready for delivery
/// - [`SourceDescriptor`](domain::SourceDescriptor): Static source metadata
/// - [`WatermarkMap`](domain::WatermarkMap): Last delivered timestamp per source
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait returning raw bodies
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing.
///
/// Converts RSS and Atom documents into [`FeedEntry`](normalizer::FeedEntry)
/// values with whole-second timestamps.
pub mod normalizer;

/// Comic source adapters and the source registry.
pub mod sources;

/// Watermark persistence.
///
/// - [`WatermarkStore`](store::WatermarkStore): Load/save trait
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
