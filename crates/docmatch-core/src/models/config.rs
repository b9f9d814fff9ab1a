//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration for the docmatch pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocmatchConfig {
    /// Field extraction configuration.
    pub parser: ParserConfig,

    /// Pipeline execution configuration.
    pub pipeline: PipelineConfig,

    /// Population snapshot configuration.
    pub population: PopulationConfig,

    /// Routing and forwarding configuration.
    pub forwarder: ForwarderConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Institute name patterns searched in the document text. Each entry
    /// is a regular expression matched anywhere in the flattened text.
    pub institutes: Vec<String>,

    /// Minimum decoded-text length for a PDF to count as parsed.
    pub min_text_length: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            institutes: Vec::new(),
            min_text_length: 50,
        }
    }
}

/// Pipeline execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of messages processed concurrently.
    pub jobs: usize,

    /// Upper bound on a single resolver lookup, in milliseconds. `None`
    /// disables the bound.
    pub resolver_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            resolver_timeout_ms: Some(5_000),
        }
    }
}

/// Population snapshot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Path to the enrollment-history CSV snapshot.
    pub snapshot: Option<PathBuf>,

    /// Legacy faculty codes relabelled while loading the snapshot.
    pub faculty_aliases: HashMap<String, String>,
}

/// Routing and forwarding configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Address of the central student administration desk; also the
    /// destination for issues.
    pub central_address: String,

    /// Recipient addresses keyed by lowercased program or faculty code.
    pub addresses: HashMap<String, String>,
}

impl DocmatchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
