//! Structured JSONL logging for AODVv2 nodes
//!
//! This crate installs the `tracing` subscriber used by AODVv2 binaries and
//! simulations, where several nodes may log from one process.
//!
//! # Features
//!
//! - **JSONL Output**: one JSON object per line, on stdout unless configured otherwise
//! - **Node Context Injection**: spans remember the node that opened them
//! - **File Output**: a single file or daily/hourly rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use aodv_logging::{AodvSubscriberBuilder, LogConfig};
//!
//! // JSONL on stdout at info level
//! AodvSubscriberBuilder::new().init();
//!
//! // Pretty, colored output at debug level
//! AodvSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Node Context
//!
//! Use [`NodeContextGuard`] to set the node identity for a scope:
//!
//! ```ignore
//! use aodv_logging::NodeContextGuard;
//!
//! let _guard = NodeContextGuard::new(&node.address());
//!
//! // Spans opened by the node's handlers in this scope carry its address
//! node.on_route_request(packet)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod layers;

pub use config::{ConsoleOutput, FileConfig, JsonlFields, LogConfig, RotationStrategy};
pub use context::{NodeContextData, NodeContextGuard};
pub use error::{LogError, LogResult};
pub use layers::{NodeContextExtension, NodeContextLayer};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Builder for configuring and initializing the AODVv2 logging subscriber
pub struct AodvSubscriberBuilder {
    config: LogConfig,
}

impl AodvSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the level for targets without their own
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Choose the console format, or turn the console off
    pub fn with_console(mut self, console: ConsoleOutput) -> Self {
        self.config.console = console;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Try to initialize the subscriber globally
    ///
    /// `RUST_LOG` takes precedence over the configured levels. The returned
    /// guard must be kept alive for as long as file output is wanted.
    pub fn try_init(self) -> LogResult<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.config.filter_directives()))?;

        let (pretty_console, jsonl_console) = match self.config.console {
            ConsoleOutput::Off => (None, None),
            ConsoleOutput::Jsonl => (
                None,
                Some(layers::jsonl_layer(std::io::stdout, &self.config.jsonl)),
            ),
            ConsoleOutput::Pretty { ansi } => (
                Some(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_ansi(ansi)
                        .with_target(true),
                ),
                None,
            ),
        };

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = layers::file_writer(file_config)?;
                (
                    Some(layers::jsonl_layer(writer, &self.config.jsonl)),
                    Some(guard),
                )
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(NodeContextLayer::new())
            .with(pretty_console)
            .with(jsonl_console)
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// Failures are reported on stderr and leave logging as it was.
    pub fn init(self) -> Option<WorkerGuard> {
        self.try_init().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        })
    }
}

impl Default for AodvSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging with default settings (JSONL on stdout)
pub fn init_default() {
    AodvSubscriberBuilder::new().init();
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() {
    AodvSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = AodvSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
