//! Pipeline configuration
//!
//! Values are layered: built-in defaults, then the `[pipeline]` table of
//! an optional TOML file, then command-line flags.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

use crate::catalog::CatalogOptions;
use crate::raster::accessor::DEFAULT_BLOCK_SIZE;
use crate::raster::AccessorOptions;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_OUTPUT: &str = "points.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: &'static str, message: String },
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue { key, message: message.into() }
}

/// Settings of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    pub block_size: u32,
    /// Pending task capacity; `None` means twice the worker count
    pub queue_depth: Option<usize>,
    pub extensions: Vec<String>,
    pub progress: bool,
}

impl PipelineConfig {
    /// Defaults for a catalog at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            root: root.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            workers: DEFAULT_WORKERS,
            block_size: DEFAULT_BLOCK_SIZE,
            queue_depth: None,
            extensions: CatalogOptions::default().extensions,
            progress: true,
        }
    }

    /// Effective pending task capacity
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.unwrap_or(2 * self.workers)
    }

    /// Applies the `[pipeline]` table of the TOML file at `path`
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        debug!("Loaded config file {}", path.display());
        self.merge_toml(&content)
    }

    /// Applies the `[pipeline]` table of a TOML document
    ///
    /// Keys that are absent keep their current value.
    pub fn merge_toml(&mut self, content: &str) -> Result<(), ConfigError> {
        let document: Table = content.parse()?;
        let Some(table) = document.get("pipeline").and_then(Value::as_table) else {
            warn!("Config has no [pipeline] table, using defaults");
            return Ok(());
        };

        for (key, value) in table {
            match key.as_str() {
                "workers" => self.workers = read_count("workers", value)?,
                "queue_depth" => self.queue_depth = Some(read_count("queue_depth", value)?),
                "block_size" => {
                    let size = read_count("block_size", value)?;
                    self.block_size = u32::try_from(size)
                        .map_err(|_| invalid("block_size", format!("{} is too large", size)))?;
                }
                "output" => {
                    let output = value.as_str().ok_or_else(|| invalid("output", "expected a string"))?;
                    self.output = PathBuf::from(output);
                }
                "progress" => {
                    self.progress = value.as_bool().ok_or_else(|| invalid("progress", "expected a boolean"))?;
                }
                "extensions" => self.extensions = read_extensions(value)?,
                other => warn!("Ignoring unknown config key `{}`", other),
            }
        }

        Ok(())
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(invalid("block_size", "must be at least 1"));
        }
        if self.queue_depth() < self.workers {
            return Err(invalid("queue_depth",
                               format!("{} is smaller than the worker count {}", self.queue_depth(), self.workers)));
        }
        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(invalid("extensions", "at least one extension is required"));
        }
        Ok(())
    }

    pub fn accessor_options(&self) -> AccessorOptions {
        AccessorOptions { block_size: self.block_size }
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions { extensions: self.extensions.clone() }
    }
}

fn read_count(key: &'static str, value: &Value) -> Result<usize, ConfigError> {
    let number = value.as_integer().ok_or_else(|| invalid(key, "expected an integer"))?;
    usize::try_from(number).map_err(|_| invalid(key, format!("{} is negative", number)))
}

fn read_extensions(value: &Value) -> Result<Vec<String>, ConfigError> {
    let items = value.as_array().ok_or_else(|| invalid("extensions", "expected an array of strings"))?;
    items.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid("extensions", "expected an array of strings"))
        })
        .collect()
}

/// Splits a comma separated extension list
pub fn parse_extension_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}
