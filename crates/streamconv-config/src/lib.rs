use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use streamconv_engine::{StreamConfig, TrailingTrim, Transform};
use thiserror::Error;

pub const DEFAULT_BLOCK_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("got unknown option while parsing conv: {0}")]
    UnknownConversion(String),

    #[error("can't use both upper_case and lower_case")]
    ConflictingCase,

    #[error("can't read input file {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("provided offset is bigger than file size: {offset} > {size}")]
    OffsetBeyondSource { offset: u64, size: u64 },

    #[error("output file {0} already exists")]
    OutputExists(PathBuf),

    #[error("block size must be greater than zero")]
    ZeroBlockSize,
}

/// Conversion options, from the command line or the defaults file.
///
/// Every field is optional so a partial set can be layered over another with
/// [`Options::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Input file; stdin when unset.
    pub from: Option<PathBuf>,
    /// Output file; stdout when unset.
    pub to: Option<PathBuf>,
    pub offset: Option<u64>,
    /// 0 reads the whole input.
    pub limit: Option<u64>,
    pub block_size: Option<usize>,
    /// Comma-separated conversion names, e.g. `trim_spaces,lower_case`.
    pub conv: Option<String>,
    pub trailing_trim: Option<TrailingTrim>,
}

impl Options {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut options: Options =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in file paths
        options.from = options.from.map(|p| Self::expand_path(&p).unwrap_or(p));
        options.to = options.to.map(|p| Self::expand_path(&p).unwrap_or(p));

        Ok(Some(options))
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/streamconv");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Layers `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: Options) -> Options {
        Options {
            from: overrides.from.or(self.from),
            to: overrides.to.or(self.to),
            offset: overrides.offset.or(self.offset),
            limit: overrides.limit.or(self.limit),
            block_size: overrides.block_size.or(self.block_size),
            conv: overrides.conv.or(self.conv),
            trailing_trim: overrides.trailing_trim.or(self.trailing_trim),
        }
    }

    pub fn transforms(&self) -> Result<Vec<Transform>, ConfigError> {
        parse_conv(self.conv.as_deref().unwrap_or(""))
    }

    /// Checks the options against the filesystem before any file is opened.
    ///
    /// The input must exist and be at least `offset` bytes long, the output
    /// must not exist yet, and the conversion list must parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(from) = &self.from {
            let metadata =
                std::fs::metadata(from).map_err(|source| ConfigError::SourceUnavailable {
                    path: from.clone(),
                    source,
                })?;
            let offset = self.offset.unwrap_or(0);
            if offset > metadata.len() {
                return Err(ConfigError::OffsetBeyondSource {
                    offset,
                    size: metadata.len(),
                });
            }
        }
        if let Some(to) = &self.to
            && to.exists()
        {
            return Err(ConfigError::OutputExists(to.clone()));
        }
        if self.block_size == Some(0) {
            return Err(ConfigError::ZeroBlockSize);
        }
        self.transforms()?;
        Ok(())
    }

    pub fn stream_config(&self) -> Result<StreamConfig, ConfigError> {
        let block_size = self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE);
        if block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Ok(StreamConfig {
            offset: self.offset.unwrap_or(0),
            limit: self.limit.unwrap_or(0),
            block_size,
            transforms: self.transforms()?,
            trailing_trim: self.trailing_trim.unwrap_or_default(),
        })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Parses a comma-separated conversion list, keeping its order.
///
/// `upper_case` and `lower_case` are mutually exclusive.
pub fn parse_conv(conv: &str) -> Result<Vec<Transform>, ConfigError> {
    if conv.is_empty() {
        return Ok(Vec::new());
    }

    let mut transforms = Vec::with_capacity(2);
    let mut got_case = false;
    for name in conv.split(',') {
        let transform: Transform = name
            .parse()
            .map_err(|_| ConfigError::UnknownConversion(name.to_string()))?;
        if transform.is_case_mapping() {
            if got_case {
                return Err(ConfigError::ConflictingCase);
            }
            got_case = true;
        }
        transforms.push(transform);
    }
    Ok(transforms)
}
