//! Generator configuration
//!
//! Settings can be built in code with the `with_*` methods or loaded from a
//! TOML file:
//!
//! ```toml
//! search_path = ["schema", "schema/shared"]
//! template_dir = "templates"
//! output_dir = "generated"
//! line_ending = "crlf"
//! guid_mode = "stable"
//!
//! [id_spaces]
//! class = 1000
//! module = 1000
//! field = 1000
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid [id_spaces]: {0}")]
    InvalidIdSpaces(String),
}

/// Sizes of the id partitions
///
/// A class id is `local + module_id * class`, a field id is
/// `local + class_id * field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdSpaces {
    pub class: i64,
    pub module: i64,
    pub field: i64,
}

impl Default for IdSpaces {
    fn default() -> Self {
        Self {
            class: 1000,
            module: 1000,
            field: 1000,
        }
    }
}

impl IdSpaces {
    pub fn class_id(&self, module_id: i64, local: i64) -> i64 {
        local + module_id * self.class
    }

    pub fn field_id(&self, class_id: i64, local: i64) -> i64 {
        local + class_id * self.field
    }

    /// Check that every size is positive and that the largest field id
    /// (`class * module * field - 1`) fits in an `i64`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [("class", self.class), ("module", self.module), ("field", self.field)];
        for (name, size) in sizes {
            if size <= 0 {
                return Err(ConfigError::InvalidIdSpaces(format!(
                    "{name} = {size} must be positive"
                )));
            }
        }
        self.class
            .checked_mul(self.module)
            .and_then(|ids| ids.checked_mul(self.field))
            .map(|_| ())
            .ok_or_else(|| {
                ConfigError::InvalidIdSpaces(format!(
                    "class * module * field ({} * {} * {}) overflows a 64-bit id",
                    self.class, self.module, self.field
                ))
            })
    }
}

/// Line break written for every line break in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// How `$Guid` mints identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidMode {
    /// Name-based, so identical input renders identical output
    #[default]
    Stable,
    Random,
}

/// Options that affect how templates render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub line_ending: LineEnding,
    pub guid_mode: GuidMode,
}

/// Configuration for a complete generator run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Directories searched, in order, for module and include files
    pub search_path: Vec<PathBuf>,
    /// Directory holding `<Name>.tpl` overrides of the built-in templates
    pub template_dir: Option<PathBuf>,
    /// Directory the generated files are written to
    pub output_dir: PathBuf,
    pub id_spaces: IdSpaces,
    pub render: RenderOptions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            search_path: vec![PathBuf::from(".")],
            template_dir: None,
            output_dir: PathBuf::from("."),
            id_spaces: IdSpaces::default(),
            render: RenderOptions::default(),
        }
    }
}

/// TOML structure for deserializing a configuration
#[derive(Deserialize)]
struct TomlConfig {
    search_path: Option<Vec<PathBuf>>,
    template_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    id_spaces: Option<IdSpaces>,
    line_ending: Option<LineEnding>,
    guid_mode: Option<GuidMode>,
}

impl GeneratorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; absent keys keep their defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let id_spaces = parsed.id_spaces.unwrap_or_default();
        id_spaces.validate()?;

        Ok(Self {
            search_path: parsed.search_path.unwrap_or(defaults.search_path),
            template_dir: parsed.template_dir,
            output_dir: parsed.output_dir.unwrap_or(defaults.output_dir),
            id_spaces,
            render: RenderOptions {
                line_ending: parsed.line_ending.unwrap_or_default(),
                guid_mode: parsed.guid_mode.unwrap_or_default(),
            },
        })
    }

    /// Replace the search path
    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = dirs;
        self
    }

    /// Search `dir` before every directory already configured
    pub fn with_search_dir_first(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_path.insert(0, dir.into());
        self
    }

    /// Set the template override directory
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the id space sizes
    pub fn with_id_spaces(mut self, spaces: IdSpaces) -> Self {
        self.id_spaces = spaces;
        self
    }

    /// Set the output line ending
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.render.line_ending = line_ending;
        self
    }

    /// Set the GUID minting mode
    pub fn with_guid_mode(mut self, mode: GuidMode) -> Self {
        self.render.guid_mode = mode;
        self
    }
}
