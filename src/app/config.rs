//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for sensitive values like `WALLET_PRIVATE_KEY` and notification
//! tokens — those never live in the config file itself.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::risk::{KillSwitchConfig, OracleConfig, RiskConfig};
use crate::core::scanner::{LiquidityScreen, ScanFilter};
use crate::core::strategy::{PrioritizerConfig, SizingLimits, StrategyConfig};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Orders are signed and submitted to the live venue.
    Live,
    /// Reads hit the live venue; writes are simulated against its own book cache.
    #[default]
    Paper,
    /// Fully simulated — no network calls to any venue.
    Simulated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_clob_api_url")]
    pub clob_api_url: String,
    #[serde(default = "default_gamma_api_url")]
    pub gamma_api_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_paper_slippage_bps")]
    pub paper_slippage_bps: u32,
    #[serde(default = "default_paper_fill_probability")]
    pub paper_fill_probability: f64,
    #[serde(default = "default_orderbook_refresh_secs")]
    pub orderbook_refresh_secs: u64,
    #[serde(default = "default_burst_per_sec")]
    pub burst_per_sec: f64,
    #[serde(default = "default_sustained_per_sec")]
    pub sustained_per_sec: f64,
    #[serde(default = "default_order_ttl_secs")]
    pub order_ttl_secs: i64,
    #[serde(default = "default_pool_staleness_secs")]
    pub pool_staleness_secs: i64,
    #[serde(default = "default_params_cache_ttl_secs")]
    pub params_cache_ttl_secs: i64,
    #[serde(default = "default_pool_refresh_secs")]
    pub pool_refresh_secs: u64,
}

fn default_clob_api_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_gamma_api_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_ws_url() -> String {
    "wss://ws-subscriptions-clob.polymarket.com/ws".to_string()
}

const fn default_chain_id() -> u64 {
    137
}

const fn default_request_timeout_secs() -> u64 {
    10
}

const fn default_paper_slippage_bps() -> u32 {
    10
}

const fn default_paper_fill_probability() -> f64 {
    1.0
}

const fn default_orderbook_refresh_secs() -> u64 {
    5
}

const fn default_burst_per_sec() -> f64 {
    5.0
}

const fn default_sustained_per_sec() -> f64 {
    1.0
}

const fn default_order_ttl_secs() -> i64 {
    300
}

const fn default_pool_staleness_secs() -> i64 {
    60
}

const fn default_params_cache_ttl_secs() -> i64 {
    300
}

const fn default_pool_refresh_secs() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            clob_api_url: default_clob_api_url(),
            gamma_api_url: default_gamma_api_url(),
            ws_url: default_ws_url(),
            chain_id: default_chain_id(),
            request_timeout_secs: default_request_timeout_secs(),
            paper_slippage_bps: default_paper_slippage_bps(),
            paper_fill_probability: default_paper_fill_probability(),
            orderbook_refresh_secs: default_orderbook_refresh_secs(),
            burst_per_sec: default_burst_per_sec(),
            sustained_per_sec: default_sustained_per_sec(),
            order_ttl_secs: default_order_ttl_secs(),
            pool_staleness_secs: default_pool_staleness_secs(),
            params_cache_ttl_secs: default_params_cache_ttl_secs(),
            pool_refresh_secs: default_pool_refresh_secs(),
        }
    }
}

/// Private key loaded from `WALLET_PRIVATE_KEY` at runtime — never from the
/// config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    #[serde(skip)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSettingsConfig {
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_max_tracked_markets")]
    pub max_tracked_markets: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub filter: ScanFilterConfig,
    #[serde(default)]
    pub liquidity: LiquidityScreenConfig,
}

const fn default_scan_interval_secs() -> u64 {
    30
}

const fn default_max_tracked_markets() -> usize {
    500
}

const fn default_batch_size() -> usize {
    25
}

impl Default for ScannerSettingsConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            max_tracked_markets: default_max_tracked_markets(),
            batch_size: default_batch_size(),
            filter: ScanFilterConfig::default(),
            liquidity: LiquidityScreenConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanFilterConfig {
    #[serde(default = "default_true")]
    pub require_active: bool,
    #[serde(default = "default_true")]
    pub exclude_closed: bool,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub tag_allowlist: Option<Vec<String>>,
    #[serde(default)]
    pub tag_blocklist: Option<Vec<String>>,
    #[serde(default)]
    pub question_patterns: Vec<String>,
    #[serde(default)]
    pub min_hours_to_expiry: Option<f64>,
    #[serde(default)]
    pub max_hours_to_expiry: Option<f64>,
}

const fn default_true() -> bool {
    true
}

impl ScanFilterConfig {
    #[must_use]
    pub fn into_filter(self) -> ScanFilter {
        use crate::core::domain::Category;
        let categories = self.categories.map(|names| {
            names
                .iter()
                .map(|n| match n.to_lowercase().as_str() {
                    "economic" => Category::Economic,
                    "sports" => Category::Sports,
                    "crypto" => Category::Crypto,
                    "politics" => Category::Politics,
                    _ => Category::Other,
                })
                .collect()
        });
        ScanFilter {
            require_active: self.require_active,
            exclude_closed: self.exclude_closed,
            categories,
            tag_allowlist: self.tag_allowlist,
            tag_blocklist: self.tag_blocklist,
            question_patterns: self.question_patterns,
            min_hours_to_expiry: self.min_hours_to_expiry,
            max_hours_to_expiry: self.max_hours_to_expiry,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiquidityScreenConfig {
    #[serde(default = "default_min_total_depth_usd")]
    pub min_total_depth_usd: Decimal,
    #[serde(default = "default_max_spread_screen")]
    pub max_spread: Decimal,
    #[serde(default = "default_min_bid_depth_usd")]
    pub min_bid_depth_usd: Decimal,
    #[serde(default = "default_min_ask_depth_usd")]
    pub min_ask_depth_usd: Decimal,
}

fn default_min_total_depth_usd() -> Decimal {
    Decimal::new(1_000_00, 2)
}

fn default_max_spread_screen() -> Decimal {
    Decimal::new(10, 2)
}

fn default_min_bid_depth_usd() -> Decimal {
    Decimal::new(250_00, 2)
}

fn default_min_ask_depth_usd() -> Decimal {
    Decimal::new(250_00, 2)
}

impl Default for LiquidityScreenConfig {
    fn default() -> Self {
        Self {
            min_total_depth_usd: default_min_total_depth_usd(),
            max_spread: default_max_spread_screen(),
            min_bid_depth_usd: default_min_bid_depth_usd(),
            min_ask_depth_usd: default_min_ask_depth_usd(),
        }
    }
}

impl From<LiquidityScreenConfig> for LiquidityScreen {
    fn from(c: LiquidityScreenConfig) -> Self {
        Self {
            min_total_depth_usd: c.min_total_depth_usd,
            max_spread: c.max_spread,
            min_bid_depth_usd: c.min_bid_depth_usd,
            min_ask_depth_usd: c.min_ask_depth_usd,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub economic: EconomicFeedSettings,
    #[serde(default)]
    pub sports: SportsFeedSettings,
    #[serde(default)]
    pub crypto: CryptoFeedSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EconomicFeedSettings {
    #[serde(default = "default_bls_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub series_ids: Vec<String>,
    #[serde(default)]
    pub registration_key: Option<String>,
    #[serde(default = "default_economic_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_bls_endpoint() -> String {
    "https://api.bls.gov/publicAPI/v2/timeseries/data/".to_string()
}

const fn default_economic_poll_interval_secs() -> u64 {
    60
}

impl Default for EconomicFeedSettings {
    fn default() -> Self {
        Self {
            endpoint: default_bls_endpoint(),
            series_ids: Vec::new(),
            registration_key: None,
            poll_interval_secs: default_economic_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SportsFeedSettings {
    #[serde(default = "default_espn_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_league")]
    pub league: String,
    #[serde(default = "default_sports_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_espn_endpoint() -> String {
    "https://site.api.espn.com/apis/site/v2/sports".to_string()
}

fn default_league() -> String {
    "football/nfl".to_string()
}

const fn default_sports_poll_interval_secs() -> u64 {
    15
}

impl Default for SportsFeedSettings {
    fn default() -> Self {
        Self {
            endpoint: default_espn_endpoint(),
            league: default_league(),
            poll_interval_secs: default_sports_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoFeedSettings {
    #[serde(default = "default_primary_exchange")]
    pub primary_exchange: String,
    #[serde(default = "default_primary_ws_url")]
    pub primary_ws_url: String,
    #[serde(default)]
    pub validator_ws_urls: std::collections::HashMap<String, String>,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
    #[serde(default = "default_cross_validation_threshold_pct")]
    pub cross_validation_threshold_pct: Decimal,
    #[serde(default = "default_price_move_threshold_pct")]
    pub price_move_threshold_pct: Decimal,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_crypto_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_primary_exchange() -> String {
    "coinbase".to_string()
}

fn default_primary_ws_url() -> String {
    "wss://ws-feed.exchange.coinbase.com".to_string()
}

fn default_pairs() -> Vec<String> {
    vec!["BTC-USD".to_string(), "ETH-USD".to_string()]
}

fn default_cross_validation_threshold_pct() -> Decimal {
    Decimal::new(50, 2)
}

fn default_price_move_threshold_pct() -> Decimal {
    Decimal::new(100, 2)
}

const fn default_ping_interval_secs() -> u64 {
    20
}

const fn default_crypto_poll_interval_secs() -> u64 {
    5
}

impl Default for CryptoFeedSettings {
    fn default() -> Self {
        Self {
            primary_exchange: default_primary_exchange(),
            primary_ws_url: default_primary_ws_url(),
            validator_ws_urls: std::collections::HashMap::new(),
            pairs: default_pairs(),
            cross_validation_threshold_pct: default_cross_validation_threshold_pct(),
            price_move_threshold_pct: default_price_move_threshold_pct(),
            ping_interval_secs: default_ping_interval_secs(),
            poll_interval_secs: default_crypto_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub telegram_enabled: bool,
    #[serde(default)]
    pub telegram_chat_id: Option<i64>,
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
    #[serde(default = "default_daily_summary_hour_utc")]
    pub daily_summary_hour_utc: u32,
}

const fn default_throttle_secs() -> u64 {
    30
}

const fn default_daily_summary_hour_utc() -> u32 {
    0
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            telegram_enabled: false,
            telegram_chat_id: None,
            discord_webhook_url: None,
            throttle_secs: default_throttle_secs(),
            daily_summary_hour_utc: default_daily_summary_hour_utc(),
        }
    }
}

/// Telegram bot token, loaded from `TELEGRAM_BOT_TOKEN` — never from the
/// config file.
#[derive(Debug, Clone, Default)]
pub struct AlertsSecrets {
    pub telegram_bot_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub prioritizer: PrioritizerConfig,
    #[serde(default)]
    pub sizing: SizingLimits,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub kill_switch: KillSwitchConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub scanner: ScannerSettingsConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::default(),
            dry_run: false,
            exchange: ExchangeConfig::default(),
            wallet: WalletConfig::default(),
            strategy: StrategyConfig::default(),
            prioritizer: PrioritizerConfig::default(),
            sizing: SizingLimits::default(),
            risk: RiskConfig::default(),
            kill_switch: KillSwitchConfig::default(),
            oracle: OracleConfig::default(),
            scanner: ScannerSettingsConfig::default(),
            feeds: FeedsConfig::default(),
            alerts: AlertsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads config from a TOML file, overlaying secrets from the
    /// environment and validating the result.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.wallet.private_key = std::env::var("WALLET_PRIVATE_KEY").ok();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.exchange.clob_api_url.is_empty() {
            return Err(Error::Config("exchange.clob_api_url must not be empty".to_string()));
        }
        if self.exchange.ws_url.is_empty() {
            return Err(Error::Config("exchange.ws_url must not be empty".to_string()));
        }
        if self.execution_mode == ExecutionMode::Live && self.wallet.private_key.is_none() {
            return Err(Error::Config(
                "execution_mode = live requires WALLET_PRIVATE_KEY to be set".to_string(),
            ));
        }
        if self.alerts.telegram_enabled && self.alerts.telegram_chat_id.is_none() {
            return Err(Error::Config("alerts.telegram_enabled requires alerts.telegram_chat_id".to_string()));
        }
        Ok(())
    }

    /// Loads secrets the config file never carries: the Telegram bot token.
    #[must_use]
    pub fn alerts_secrets() -> AlertsSecrets {
        AlertsSecrets {
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.request_timeout_secs)
    }

    #[must_use]
    pub fn alert_throttle(&self) -> Duration {
        Duration::from_secs(self.alerts.throttle_secs)
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.logging.level));
        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn live_mode_without_private_key_is_rejected() {
        let mut config = Config::default();
        config.execution_mode = ExecutionMode::Live;
        config.wallet.private_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn telegram_enabled_without_chat_id_is_rejected() {
        let mut config = Config::default();
        config.alerts.telegram_enabled = true;
        config.alerts.telegram_chat_id = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn scan_filter_config_maps_category_names() {
        let filter = ScanFilterConfig {
            categories: Some(vec!["crypto".to_string()]),
            ..ScanFilterConfig::default()
        };
        let mapped = filter.into_filter();
        assert_eq!(mapped.categories.unwrap(), vec![crate::core::domain::Category::Crypto]);
    }
}
