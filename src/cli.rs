//! Command-line interface parsing for deskproxy
//!
//! Every server setting can come from a flag or an environment variable, so
//! the desktop shell can configure the backend through `PORT` alone. The
//! `wait` subcommand performs the shell's port readiness check.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use reqwest::Url;
use thiserror::Error;

use crate::data::calendar::CALENDAR_TTL_SECS;
use crate::data::headlines::FEED_TTL_SECS;
use crate::data::quotes::{QUOTE_CACHE_CAPACITY, QUOTE_TTL_SECS};
use crate::data::upstream::{CALENDAR_BASE_URL, FEED_URL, QUOTE_URL};
use crate::data::UpstreamConfig;
use crate::readiness::{POLL_INTERVAL, STARTUP_TIMEOUT};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A duration or size that must be positive was zero
    #[error("Invalid value for --{0}: must be greater than zero")]
    NotPositive(&'static str),

    /// An upstream URL could not be parsed
    #[error("Invalid URL for --{flag}: '{value}'")]
    InvalidUrl { flag: &'static str, value: String },

    /// Host and port do not form a socket address
    #[error("Invalid listen address: '{0}'")]
    InvalidAddress(String),
}

/// deskproxy - local proxy for economic calendar, quotes and headlines
#[derive(Parser, Debug)]
#[command(name = "deskproxy")]
#[command(about = "Same-origin proxy for economic calendar, quote and headline feeds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait until a local port accepts TCP connections
    ///
    /// Exits 0 once connected, 1 if the timeout elapses first.
    Wait(WaitArgs),
}

/// Options of the HTTP server (the default command)
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "DESK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Base URL of the weekly calendar files
    #[arg(long, env = "DESK_CALENDAR_BASE_URL", default_value = CALENDAR_BASE_URL)]
    pub calendar_base_url: String,

    /// Quote endpoint
    #[arg(long, env = "DESK_QUOTE_URL", default_value = QUOTE_URL)]
    pub quote_url: String,

    /// Headline RSS feed
    #[arg(long, env = "DESK_FEED_URL", default_value = FEED_URL)]
    pub feed_url: String,

    /// Seconds a weekly calendar file stays fresh
    #[arg(long, env = "DESK_CALENDAR_TTL_SECS", default_value_t = CALENDAR_TTL_SECS as u64)]
    pub calendar_ttl_secs: u64,

    /// Seconds a quote payload stays fresh
    #[arg(long, env = "DESK_QUOTE_TTL_SECS", default_value_t = QUOTE_TTL_SECS as u64)]
    pub quote_ttl_secs: u64,

    /// Seconds the headline feed stays fresh
    #[arg(long, env = "DESK_FEED_TTL_SECS", default_value_t = FEED_TTL_SECS as u64)]
    pub feed_ttl_secs: u64,

    /// Maximum number of distinct symbol sets kept in the quote cache
    #[arg(long, env = "DESK_QUOTE_CACHE_CAPACITY", default_value_t = QUOTE_CACHE_CAPACITY)]
    pub quote_cache_capacity: usize,

    /// Deadline for each upstream request, in seconds
    #[arg(long, env = "DESK_UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "DESK_LOG", default_value = "info")]
    pub log_level: String,
}

/// Options of the `wait` subcommand
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Port to probe
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Host to probe
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Give up after this many milliseconds
    #[arg(long, default_value_t = STARTUP_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Delay between connection attempts, in milliseconds
    #[arg(long, default_value_t = POLL_INTERVAL.as_millis() as u64)]
    pub interval_ms: u64,
}

/// Validated server settings derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub upstream: UpstreamConfig,
    pub calendar_ttl: Duration,
    pub quote_ttl: Duration,
    pub feed_ttl: Duration,
    pub quote_cache_capacity: usize,
    pub log_level: String,
}

fn positive_secs(value: u64, flag: &'static str) -> Result<u64, CliError> {
    if value == 0 {
        Err(CliError::NotPositive(flag))
    } else {
        Ok(value)
    }
}

fn checked_url(value: &str, flag: &'static str) -> Result<String, CliError> {
    Url::parse(value).map_err(|_| CliError::InvalidUrl {
        flag,
        value: value.to_string(),
    })?;
    Ok(value.to_string())
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed server arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with durations and URLs validated
    /// * `Err(CliError)` if a value is zero, a URL is malformed, or the host
    ///   and port do not form an address
    pub fn from_args(args: &ServeArgs) -> Result<Self, CliError> {
        let addr_str = format!("{}:{}", args.host, args.port);
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|_| CliError::InvalidAddress(addr_str.clone()))?;

        let calendar_ttl = positive_secs(args.calendar_ttl_secs, "calendar-ttl-secs")?;
        let quote_ttl = positive_secs(args.quote_ttl_secs, "quote-ttl-secs")?;
        let feed_ttl = positive_secs(args.feed_ttl_secs, "feed-ttl-secs")?;
        let timeout = positive_secs(args.upstream_timeout_secs, "upstream-timeout-secs")?;
        if args.quote_cache_capacity == 0 {
            return Err(CliError::NotPositive("quote-cache-capacity"));
        }

        let upstream = UpstreamConfig {
            calendar_base_url: checked_url(&args.calendar_base_url, "calendar-base-url")?,
            quote_url: checked_url(&args.quote_url, "quote-url")?,
            feed_url: checked_url(&args.feed_url, "feed-url")?,
            timeout: StdDuration::from_secs(timeout),
        };

        Ok(ServerConfig {
            addr,
            upstream,
            calendar_ttl: Duration::seconds(calendar_ttl as i64),
            quote_ttl: Duration::seconds(quote_ttl as i64),
            feed_ttl: Duration::seconds(feed_ttl as i64),
            quote_cache_capacity: args.quote_cache_capacity,
            log_level: args.log_level.clone(),
        })
    }
}
