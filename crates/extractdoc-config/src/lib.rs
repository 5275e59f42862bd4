//! Configuration loader for extractdoc.
//!
//! Settings are resolved from lowest to highest precedence:
//! built-in defaults → git root `.extractdoc.toml` → working directory
//! `.extractdoc.toml` → explicit override file. Command-line flags are applied
//! on top by the CLI.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use extractdoc::{RenderOptions, DEFAULT_DEPTH, DEFAULT_MARKER, DEFAULT_TREE_COMMAND};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".extractdoc.toml";

/// Deepest directory traversal a configuration may request.
pub const MAX_DEPTH: usize = 32;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub render: RenderSettings,
    pub sources: ConfigSources,
}

/// Settings that shape how files are rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub depth: usize,
    pub marker: String,
    pub tree_command: String,
}

impl RenderSettings {
    pub fn to_options(&self) -> RenderOptions {
        RenderOptions {
            depth: self.depth,
            marker: self.marker.clone(),
            tree_command: self.tree_command.clone(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            depth: DEFAULT_DEPTH,
            marker: DEFAULT_MARKER.to_string(),
            tree_command: DEFAULT_TREE_COMMAND.to_string(),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn builtin() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialRender::defaults();
        let mut layers = vec![ConfigSource::builtin()];

        let git_config_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            layers.push(source);
        }

        let render = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            render,
            sources: ConfigSources {
                working_directory: working_dir,
                layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<RenderLayer, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug)]
struct PartialRender {
    depth: Located<usize>,
    marker: Located<String>,
    tree_command: Located<String>,
}

#[derive(Clone, Debug, Default)]
struct RenderLayer {
    depth: Option<Located<usize>>,
    marker: Option<Located<String>>,
    tree_command: Option<Located<String>>,
}

impl PartialRender {
    fn defaults() -> Self {
        let defaults = RenderSettings::default();
        PartialRender {
            depth: Located::new(defaults.depth, ConfigSource::builtin()),
            marker: Located::new(defaults.marker, ConfigSource::builtin()),
            tree_command: Located::new(defaults.tree_command, ConfigSource::builtin()),
        }
    }

    fn merge(&mut self, layer: RenderLayer) {
        if let Some(depth) = layer.depth {
            self.depth = depth;
        }
        if let Some(marker) = layer.marker {
            self.marker = marker;
        }
        if let Some(tree_command) = layer.tree_command {
            self.tree_command = tree_command;
        }
    }

    fn finalize(self) -> Result<RenderSettings, ConfigValidationErrors> {
        let mut errors = Vec::new();

        if self.depth.value > MAX_DEPTH {
            errors.push(ConfigValidationError::new(
                Some(self.depth.source.clone()),
                format!(
                    "render.depth must be at most {MAX_DEPTH} (received {})",
                    self.depth.value
                ),
            ));
        }

        for (field, located) in [
            ("render.marker", &self.marker),
            ("render.tree_command", &self.tree_command),
        ] {
            if located.value.trim().is_empty() {
                errors.push(ConfigValidationError::new(
                    Some(located.source.clone()),
                    "must not be blank".to_string(),
                )
                .with_context(field));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(RenderSettings {
            depth: self.depth.value,
            marker: self.marker.value,
            tree_command: self.tree_command.value,
        })
    }
}

/// Collection of validation errors.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "- {error}")?;
        }
        Ok(())
    }
}

/// Individual validation error with optional provenance.
#[derive(Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    render: Option<RawRender>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    depth: Option<usize>,
    marker: Option<String>,
    tree_command: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> RenderLayer {
        let render = self.render.unwrap_or_default();
        RenderLayer {
            depth: render
                .depth
                .map(|value| Located::new(value, source.clone())),
            marker: render
                .marker
                .map(|value| Located::new(value, source.clone())),
            tree_command: render
                .tree_command
                .map(|value| Located::new(value, source)),
        }
    }
}
