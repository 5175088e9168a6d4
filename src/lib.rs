//! cellargen - SQL schema and header generator for CellarModule definitions
//!
//! This library reads a `<CellarModule>` XML document into an object model
//! and renders it through three templates: class definitions, field
//! definitions and header constants.
//!
//! # Example
//!
//! ```rust
//! use cellargen::generate;
//!
//! let generation = generate(
//!     r#"<CellarModule id="Foo" num="5" ver="1">
//!          <class id="Bar" num="2" base="CmObject">
//!            <basic id="Count" num="1" sig="Integer" bits="8"/>
//!          </class>
//!        </CellarModule>"#,
//! )
//! .unwrap();
//! assert!(generation.class_defs.contains("Count tinyint not null default 0"));
//! assert!(generation.header_defs.contains("#define kflidBar_Count 5002001"));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod template;
pub mod xml;

use std::path::PathBuf;

use thiserror::Error;

pub use config::{ConfigError, GeneratorConfig, GuidMode, IdSpaces, LineEnding, RenderOptions};
pub use error::{Diagnostic, Location, Reporter, Severity};
pub use generator::{Generation, Generator};
pub use model::{BasicType, Cardinality, Class, Module, Ownership, Property};
pub use template::{BuiltinTemplates, DirTemplateStore, Template, TemplateError, TemplateId, TemplateStore};
pub use xml::{load_module, load_module_str, SearchPath};

/// Errors from the one-call [`generate`] pipeline
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{} error(s): {}", .0.len(), format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// File name of a module given on the command line
///
/// `Foo` names `Foo.xml`; a name already ending in `.xml` is used as is.
pub fn module_file(module: &str) -> PathBuf {
    if module.ends_with(".xml") {
        PathBuf::from(module)
    } else {
        PathBuf::from(format!("{module}.xml"))
    }
}

/// Load `module` from the configured search path and render it
///
/// Returns `None` when the module could not be loaded at all; the reason is
/// in `reporter`. Otherwise every class is attempted, and `reporter` holds
/// whatever went wrong along the way.
pub fn generate_module(
    module: &str,
    config: &GeneratorConfig,
    reporter: &mut Reporter,
) -> Option<Generation> {
    let search_path = SearchPath::new(config.search_path.clone());
    let module = load_module(&module_file(module), &search_path, config.id_spaces, reporter)?;
    Some(render_module(&module, config, reporter))
}

/// Like [`generate_module`], for an in-memory document named `name`
pub fn generate_str(
    name: &str,
    source: &str,
    config: &GeneratorConfig,
    reporter: &mut Reporter,
) -> Option<Generation> {
    let search_path = SearchPath::new(config.search_path.clone());
    let module = load_module_str(name, source, &search_path, config.id_spaces, reporter)?;
    Some(render_module(&module, config, reporter))
}

/// Render an already loaded module with the configured templates
pub fn render_module(module: &Module, config: &GeneratorConfig, reporter: &mut Reporter) -> Generation {
    match &config.template_dir {
        Some(dir) => {
            let store = DirTemplateStore::new(dir);
            Generator::new(&store, config.render).generate(module, reporter)
        }
        None => Generator::new(&BuiltinTemplates, config.render).generate(module, reporter),
    }
}

/// Generate from module source with the default configuration
///
/// Any error-severity diagnostic fails the call.
pub fn generate(source: &str) -> Result<Generation, GenerateError> {
    let mut reporter = Reporter::new();
    let generation = generate_str("<input>", source, &GeneratorConfig::default(), &mut reporter);
    if reporter.has_errors() {
        return Err(GenerateError::Diagnostics(reporter.errors().cloned().collect()));
    }
    generation.ok_or_else(|| GenerateError::Diagnostics(Vec::new()))
}
