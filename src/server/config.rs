//! Server configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::hub::HubConfig;
use crate::record::NormalizeConfig;
use crate::replay::ReplayConfig;
use crate::source::SourceConfig;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8765;

/// Default websocket endpoint
pub const DEFAULT_ENDPOINT_PATH: &str = "/lines/1";

/// Paths served alongside the websocket endpoint
pub const RESERVED_PATHS: [&str; 2] = ["/health", "/stats"];

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path viewers upgrade on
    pub endpoint_path: String,

    /// Viewer registry options
    pub hub: HubConfig,

    /// Pacing and looping
    pub replay: ReplayConfig,

    /// Row filtering and defaults
    pub normalize: NormalizeConfig,

    /// Where source files are found
    pub source: SourceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            hub: HubConfig::default(),
            replay: ReplayConfig::default(),
            normalize: NormalizeConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Unset and empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = var("BIND_ADDR") {
            config.bind_addr = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddr(value.clone()))?;
        }
        if let Some(value) = var("LINE_PATH") {
            config = config.endpoint_path(value)?;
        }

        // Source
        if let Some(value) = var("CSV_DIR") {
            config.source.directory = PathBuf::from(value);
        }
        if let Some(value) = var("CSV_GLOB") {
            config.source.pattern = value;
        }
        if let Some(value) = var("CSV_ENCODING") {
            config.source.encoding = value.trim().to_string();
        }

        // Normalization
        if let Some(value) = var("LINE_FILTER") {
            config.normalize = config.normalize.line_filter(value.trim());
        }
        if let Some(value) = var("TOOL_FILTER") {
            config.normalize = config.normalize.tool_filter(value.trim());
        }
        if let Some(value) = var("DEFAULT_LINE") {
            config.normalize = config.normalize.default_line(value.trim());
        }
        let start = match var("PREDICT_HOURS_START") {
            Some(value) => parse_f64("PREDICT_HOURS_START", &value)?,
            None => config.normalize.prediction_start_hours,
        };
        let end = match var("PREDICT_HOURS_END") {
            Some(value) => parse_f64("PREDICT_HOURS_END", &value)?,
            None => config.normalize.prediction_end_hours,
        };
        config.normalize = config.normalize.prediction_offsets(start, end);

        // Pacing
        if let Some(value) = var("INTERVAL_SEC") {
            config.replay.interval = parse_secs("INTERVAL_SEC", &value)?;
        }
        if let Some(value) = var("SPEED_FACTOR") {
            config.replay.speed_factor = parse_f64("SPEED_FACTOR", &value)?;
        }
        if let Some(value) = var("LOOP_REPLAY") {
            config.replay.loop_replay = parse_flag(&value);
        }

        // Viewers
        if let Some(value) = var("MAX_VIEWERS") {
            config.hub = config.hub.max_viewers(parse_usize("MAX_VIEWERS", &value)?);
        }
        if let Some(value) = var("VIEWER_BUFFER") {
            config.hub = config.hub.viewer_buffer(parse_usize("VIEWER_BUFFER", &value)?);
        }

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the websocket endpoint path
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Result<Self, ConfigError> {
        let path = path.into();
        let path = path.trim();
        if !path.starts_with('/') || RESERVED_PATHS.contains(&path) {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        self.endpoint_path = path.to_string();
        Ok(self)
    }

    /// Set the viewer registry options
    pub fn hub(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }

    /// Set pacing options
    pub fn replay(mut self, replay: ReplayConfig) -> Self {
        self.replay = replay;
        self
    }

    /// Set row normalization options
    pub fn normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set source file options
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }
}

fn parse_f64(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs = parse_f64(name, value)?;
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_usize(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// `1` or `true` (any case) enables; anything else disables
fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
