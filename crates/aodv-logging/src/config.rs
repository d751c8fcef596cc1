//! Configuration types for the logging system

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logging configuration of a process running one or more nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for every target not listed in `targets`; `RUST_LOG` wins over both
    pub level: String,

    /// Per-target levels, e.g. `aodv_routing::table = "trace"`
    pub targets: BTreeMap<String, String>,

    /// Where console lines go, and in which format
    pub console: ConsoleOutput,

    /// Optional JSONL log file
    pub file: Option<FileConfig>,

    /// Fields added to every JSONL line, on console and in files
    pub jsonl: JsonlFields,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            targets: BTreeMap::new(),
            console: ConsoleOutput::default(),
            file: None,
            jsonl: JsonlFields::default(),
        }
    }
}

impl LogConfig {
    /// Debug level, colored human-readable console
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: ConsoleOutput::Pretty { ansi: true },
            ..Default::default()
        }
    }

    /// Info level into daily files under `log_dir`, nothing on the console
    pub fn production(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            console: ConsoleOutput::Off,
            file: Some(FileConfig::rolling(log_dir, RotationStrategy::Daily).with_max_files(30)),
            ..Default::default()
        }
    }

    /// Warnings only, so test output stays readable
    pub fn testing() -> Self {
        Self {
            level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Set the level for a single target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// Render the levels as an `EnvFilter` directive string
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(
                self.targets
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleOutput {
    /// No console output
    Off,
    /// One JSON object per line on stdout
    #[default]
    Jsonl,
    /// Multi-line human-readable output
    Pretty { ansi: bool },
}

/// JSONL log file location and rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub rotation: RotationStrategy,
    /// Rotated files kept; unlimited when absent
    #[serde(default)]
    pub max_files: Option<usize>,
}

fn default_prefix() -> String {
    "aodv".to_string()
}

impl FileConfig {
    /// A single `<prefix>.log` in `directory`, truncated when opened
    pub fn single(directory: impl Into<PathBuf>) -> Self {
        Self::rolling(directory, RotationStrategy::Single)
    }

    /// Rotating `<prefix>.<date>.log` files in `directory`
    pub fn rolling(directory: impl Into<PathBuf>, rotation: RotationStrategy) -> Self {
        Self {
            directory: directory.into(),
            prefix: default_prefix(),
            rotation,
            max_files: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }
}

/// When a new log file is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file for the whole run
    Single,
}

/// Optional fields of JSONL lines
///
/// Event fields are always flattened into the line and the current span is
/// always included, so `node_address` and handler fields sit next to the
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlFields {
    /// Full list of entered spans, not just the innermost
    pub span_list: bool,
    /// Source file and line of the event
    pub source_location: bool,
    /// Thread id and name
    pub thread: bool,
}

impl Default for JsonlFields {
    fn default() -> Self {
        Self {
            span_list: true,
            source_location: true,
            thread: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.console, ConsoleOutput::Jsonl);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            LogConfig::development().console,
            ConsoleOutput::Pretty { ansi: true }
        );
        assert_eq!(LogConfig::testing().level, "warn");

        let config = LogConfig::production("/var/log/aodv");
        assert_eq!(config.console, ConsoleOutput::Off);
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/aodv"));
        assert_eq!(file.rotation, RotationStrategy::Daily);
        assert_eq!(file.max_files, Some(30));
    }

    #[test]
    fn test_file_builders() {
        let file = FileConfig::single("/tmp/aodv").with_prefix("node-1");
        assert_eq!(file.rotation, RotationStrategy::Single);
        assert_eq!(file.prefix, "node-1");
        assert_eq!(file.max_files, None);
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(LogConfig::testing().filter_directives(), "warn");

        let config = LogConfig::default()
            .with_target("aodv_routing::table", "trace")
            .with_target("aodv_core", "debug");
        assert_eq!(
            config.filter_directives(),
            "info,aodv_core=debug,aodv_routing::table=trace"
        );
    }

    #[test]
    fn test_partial_document() {
        let config: LogConfig = serde_json::from_str(
            r#"{
                "level": "debug",
                "console": {"pretty": {"ansi": false}},
                "file": {"directory": "/tmp/aodv", "rotation": "single"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.console, ConsoleOutput::Pretty { ansi: false });
        assert_eq!(config.jsonl, JsonlFields::default());
        let file = config.file.unwrap();
        assert_eq!(file, FileConfig::single("/tmp/aodv"));
    }

    #[test]
    fn test_console_off_document() {
        let config: LogConfig = serde_json::from_str(r#"{"console": "off"}"#).unwrap();
        assert_eq!(config.console, ConsoleOutput::Off);
        assert_eq!(config.level, "info");
    }
}
