//! Showroom server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Live connection tuning
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Outbound frames buffered per connection before it is dropped
    pub queue_capacity: usize,
    /// Interval between keep-alive pings, always shorter than `pong_wait`
    pub ping_period: Duration,
    /// Read deadline reset by every inbound frame
    pub pong_wait: Duration,
    /// Upper bound on a single socket write
    pub write_wait: Duration,
    /// Largest inbound frame accepted
    pub max_message_bytes: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            ping_period: Duration::from_secs(30),
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_bytes: 4096,
        }
    }
}

/// Showroom server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; `None` runs against the in-memory store
    pub database_url: Option<String>,
    /// HTTP port (REST + WebSocket)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    pub live: LiveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            http_port: 8080,
            environment: "development".into(),
            live: LiveConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty());
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let defaults = LiveConfig::default();
        let mut live = LiveConfig {
            queue_capacity: env_parse("WS_QUEUE_CAPACITY", defaults.queue_capacity),
            ping_period: Duration::from_secs(env_parse(
                "WS_PING_SECS",
                defaults.ping_period.as_secs(),
            )),
            pong_wait: Duration::from_secs(env_parse(
                "WS_PONG_WAIT_SECS",
                defaults.pong_wait.as_secs(),
            )),
            write_wait: Duration::from_secs(env_parse(
                "WS_WRITE_WAIT_SECS",
                defaults.write_wait.as_secs(),
            )),
            max_message_bytes: env_parse("WS_MAX_MESSAGE_BYTES", defaults.max_message_bytes),
        };
        live.sanitize();

        Ok(Self {
            database_url,
            http_port: env_parse("HTTP_PORT", 8080),
            environment,
            live,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl LiveConfig {
    /// Replace zero values with defaults and keep `ping_period < pong_wait`
    pub fn sanitize(&mut self) {
        let defaults = LiveConfig::default();
        if self.queue_capacity == 0 {
            self.queue_capacity = defaults.queue_capacity;
        }
        if self.max_message_bytes == 0 {
            self.max_message_bytes = defaults.max_message_bytes;
        }
        if self.write_wait.is_zero() {
            self.write_wait = defaults.write_wait;
        }
        if self.pong_wait.is_zero() {
            self.pong_wait = defaults.pong_wait;
        }
        if self.ping_period.is_zero() || self.ping_period >= self.pong_wait {
            let adjusted = self.pong_wait * 9 / 10;
            tracing::warn!(
                ping_secs = self.ping_period.as_secs(),
                pong_wait_secs = self.pong_wait.as_secs(),
                "WS ping period must be shorter than pong wait, using {}ms",
                adjusted.as_millis()
            );
            self.ping_period = adjusted;
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("Invalid value for {name}: {raw:?}, using default");
                default
            }
        },
        Err(_) => default,
    }
}
