//! Configuration module for the sync engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.contentsync/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CSYNC_` and use double
//! underscores to separate nested levels:
//! - `CSYNC_DEV__PORT=4002` sets `dev.port`
//! - `CSYNC_API__BRANCH=main` sets `api.branch`
//! - `CSYNC_FILE_WATCH__DEBOUNCE_MS=250` sets `file_watch.debounce_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding settings, index state, and generated output.
pub const CONFIG_DIR: &str = ".contentsync";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Project root directory (where .contentsync is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_path: Option<PathBuf>,

    /// Skip writing the lock manifest (legacy generated layout)
    #[serde(default)]
    pub legacy_layout: bool,

    /// Generated-output flavor: typescript or javascript
    #[serde(default)]
    pub output_mode: OutputMode,

    /// How deep reference fields are expanded in generated fragments
    #[serde(default = "default_reference_depth")]
    pub reference_depth: usize,

    /// Directory of user-authored query/fragment documents, relative to root
    #[serde(default = "default_queries_path")]
    pub queries_path: PathBuf,

    /// Content collections
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,

    /// API connection parameters for generated clients
    #[serde(default)]
    pub api: ApiConfig,

    /// Dev session settings
    #[serde(default)]
    pub dev: DevConfig,

    /// File watching settings
    #[serde(default)]
    pub file_watch: FileWatchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One of two mutually exclusive generated-output flavors.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Typescript,
    Javascript,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectionConfig {
    /// Collection name, used for query names and type derivation
    pub name: String,

    /// Human-readable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Content root for this collection, relative to the project root
    pub path: PathBuf,

    /// File format of documents in this collection
    #[serde(default)]
    pub format: ContentFormat,

    /// Field definitions, validated during indexing
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    #[serde(rename = "md")]
    Markdown,
    Json,
    Toml,
}

impl ContentFormat {
    /// File extension used to build the content-files glob.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentFormat::Markdown => "md",
            ContentFormat::Json => "json",
            ContentFormat::Toml => "toml",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Target collection for reference fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Datetime,
    Reference,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    /// Content branch, required unless an override URL or local port is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// API client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// API token embedded in the generated client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Explicit endpoint override, used verbatim when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DevConfig {
    /// Local GraphQL endpoint port
    #[serde(default = "default_dev_port")]
    pub port: u16,

    /// Sub-command started for the lifetime of the dev session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Disable file-watch-triggered regeneration
    #[serde(default)]
    pub no_watch: bool,

    /// Disable client/type generation entirely
    #[serde(default)]
    pub no_sdk: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileWatchConfig {
    /// How long a file must be stable before it is processed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Startup window during which watcher backfill events are dropped
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_reference_depth() -> usize {
    2
}
fn default_queries_path() -> PathBuf {
    PathBuf::from("queries")
}
fn default_dev_port() -> u16 {
    4001
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    250
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            root_path: None,
            legacy_layout: false,
            output_mode: OutputMode::default(),
            reference_depth: default_reference_depth(),
            queries_path: default_queries_path(),
            collections: Vec::new(),
            api: ApiConfig::default(),
            dev: DevConfig::default(),
            file_watch: FileWatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_dev_port(),
            command: None,
            no_watch: false,
            no_sdk: false,
        }
    }
}

impl Default for FileWatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Layer in environment variables with CSYNC_ prefix.
            // Double underscore (__) separates nested levels; single
            // underscore (_) remains as is within field names.
            .merge(Env::prefixed("CSYNC_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.root_path.is_none() {
                    settings.root_path = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the workspace config by looking for the .contentsync directory,
    /// searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Get the workspace root directory (where .contentsync is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Resolved project root: configured root_path, else current directory.
    pub fn root(&self) -> PathBuf {
        self.root_path
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Canonical location of generated artifacts.
    pub fn generated_dir(&self) -> PathBuf {
        self.root().join(CONFIG_DIR).join("generated")
    }

    /// Location of content index state.
    pub fn index_dir(&self) -> PathBuf {
        self.root().join(CONFIG_DIR).join("index")
    }

    /// Location of the settings file under the resolved root.
    pub fn settings_path(&self) -> PathBuf {
        self.root().join(CONFIG_DIR).join("settings.toml")
    }

    /// Path markers whose presence in an event path suppresses routing.
    ///
    /// Covers the generated-artifact directory, the vendored app bundle, and
    /// the package's own distribution directory so the engine's writes never
    /// re-trigger it.
    pub fn suppression_markers(&self) -> Vec<String> {
        vec![
            format!("{CONFIG_DIR}/generated"),
            format!("{CONFIG_DIR}/app"),
            "dist".to_string(),
            "node_modules".to_string(),
        ]
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with a starter collection
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.root_path = Some(current_dir);
        }
        settings.collections.push(CollectionConfig {
            name: "posts".to_string(),
            label: Some("Blog Posts".to_string()),
            path: PathBuf::from("content/posts"),
            format: ContentFormat::Markdown,
            fields: vec![FieldConfig {
                name: "title".to_string(),
                field_type: FieldType::String,
                required: true,
                collection: None,
            }],
        });

        settings.save(&config_path)?;
        Ok(config_path)
    }
}
