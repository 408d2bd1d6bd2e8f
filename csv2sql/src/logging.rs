//! Logging utilities and configuration for csv2sql.
//!
//! Statements are written to stdout, so every log line goes to stderr.

use tracing::Level;

/// Default bound on logged cell values and column names, in bytes.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 64;

/// Logging configuration for the conversion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level at which per-dump progress (column names, decided types) is logged
    pub progress_level: Level,
    /// Maximum length for logged values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            progress_level: Level::INFO,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging pattern files.
    pub fn verbose() -> Self {
        Self {
            progress_level: Level::INFO,
            max_field_length: 1024,
        }
    }

    /// Creates a configuration that logs progress at debug level only.
    pub fn quiet() -> Self {
        Self {
            progress_level: Level::DEBUG,
            max_field_length: 32,
        }
    }

    /// Truncates a value to this configuration's field length.
    pub fn truncate(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }

    /// Joins values for a single log field, truncating each one.
    pub fn summarize<S: AsRef<str>>(&self, values: &[S]) -> String {
        let items = values
            .iter()
            .map(|value| self.truncate(value.as_ref()))
            .collect::<Vec<_>>();
        format!("[{}]", items.join(", "))
    }
}

/// Logs at the level chosen by a [`LogConfig`].
#[macro_export]
macro_rules! log_progress {
    ($config:expr, $($arg:tt)*) => {{
        let level = $config.progress_level;
        if level == tracing::Level::ERROR {
            tracing::error!($($arg)*);
        } else if level == tracing::Level::WARN {
            tracing::warn!($($arg)*);
        } else if level == tracing::Level::INFO {
            tracing::info!($($arg)*);
        } else if level == tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        } else {
            tracing::trace!($($arg)*);
        }
    }};
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries.
pub mod setup {
    use tracing::Level;

    /// Configuration for csv2sql's logging setup.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside csv2sql
        pub level: Level,
        /// Log level for csv2sql components specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for csv2sql components.
        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},csv2sql={},csv2sql_cli={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs the global subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use csv2sql::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::default().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{
            layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
        };

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
