use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_SURVEY__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
    #[serde(default)]
    pub raffle: RaffleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// ─── Survey Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyConfig {
    /// Upper bound on sections accepted from an imported document.
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
    #[serde(default = "default_max_questions_per_section")]
    pub max_questions_per_section: usize,
    /// Scale questions whose range is wider than this are not pre-seeded
    /// with empty buckets when aggregating.
    #[serde(default = "default_scale_bucket_span_limit")]
    pub scale_bucket_span_limit: i64,
}

// ─── Raffle Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RaffleConfig {
    /// Number of decoy entries returned for the presentation reel.
    #[serde(default = "default_reel_length")]
    pub reel_length: usize,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_max_sections() -> usize {
    50
}
fn default_max_questions_per_section() -> usize {
    200
}
fn default_scale_bucket_span_limit() -> i64 {
    100
}
fn default_reel_length() -> usize {
    12
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            max_sections: default_max_sections(),
            max_questions_per_section: default_max_questions_per_section(),
            scale_bucket_span_limit: default_scale_bucket_span_limit(),
        }
    }
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            reel_length: default_reel_length(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            survey: SurveyConfig::default(),
            raffle: RaffleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CAMPAIGN_SURVEY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
