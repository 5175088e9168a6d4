//! XML front end: reads a `<CellarModule>` document into a [`Module`]
//!
//! [`driver`] walks the XML; [`ModuleHandler`] and [`ClassHandler`] are the
//! two element handlers it can drive. All mutable parse state, including the
//! auto-numbering counters, lives in a [`ParseContext`] passed to every call.

mod attrs;
mod class;
pub mod driver;
mod module;
mod property;

use std::fmt;
use std::path::Path;

use crate::config::IdSpaces;
use crate::error::{Location, Reporter};
use crate::model::Module;

pub use attrs::AttributeError;
pub use class::{ClassHandler, ClassOutcome, ClassState};
pub use driver::{Element, ElementHandler, SearchPath, XmlAttribute};
pub use module::{ModuleHandler, ModuleState};

/// State shared by every handler during one parse
pub struct ParseContext<'a> {
    pub reporter: &'a mut Reporter,
    pub search_path: &'a SearchPath,
    pub spaces: IdSpaces,
    /// Display name of the file being read
    pub(crate) file: String,
    /// Location of the element being handled
    pub(crate) location: Option<Location>,
    /// Module id used to compute class ids
    pub(crate) module_id: i64,
    /// Next local class number handed out when `num` is omitted; per module
    pub(crate) next_class_num: i64,
    /// Next local field number handed out when `num` is omitted; per class
    pub(crate) next_field_num: i64,
}

impl<'a> ParseContext<'a> {
    pub fn new(reporter: &'a mut Reporter, search_path: &'a SearchPath, spaces: IdSpaces) -> Self {
        Self {
            reporter,
            search_path,
            spaces,
            file: String::new(),
            location: None,
            module_id: 0,
            next_class_num: 1,
            next_field_num: 1,
        }
    }

    /// Location of the element currently being handled
    pub(crate) fn here(&self) -> Location {
        self.location
            .clone()
            .unwrap_or_else(|| Location::file(self.file.clone()))
    }

    pub fn error(&mut self, location: Location, message: impl fmt::Display) {
        self.reporter.error(location, message);
    }

    pub fn note(&mut self, location: Location, message: impl fmt::Display) {
        self.reporter.note(location, message);
    }

    /// Start numbering classes of a new module
    pub(crate) fn begin_module(&mut self, module_id: i64) {
        self.module_id = module_id;
        self.next_class_num = 1;
    }

    /// Start numbering fields of a new class
    pub(crate) fn begin_class(&mut self) {
        self.next_field_num = 1;
    }
}

/// Parse the module file `file`, located on `search_path`
///
/// Returns `None` if the file is missing, malformed, or its module header is
/// invalid. Class-level problems only drop the affected class; all of them
/// end up in `reporter`.
pub fn load_module(
    file: &Path,
    search_path: &SearchPath,
    spaces: IdSpaces,
    reporter: &mut Reporter,
) -> Option<Module> {
    check_spaces(spaces, &file.display().to_string(), reporter)?;
    let mut cx = ParseContext::new(reporter, search_path, spaces);
    let mut handler = ModuleHandler::new();
    let well_formed = driver::parse_file(file, &mut handler, &mut cx);
    cx.file = file.display().to_string();
    finish(handler, well_formed, &mut cx)
}

/// Parse an in-memory module document named `name`
///
/// Include references are still resolved against `search_path`.
pub fn load_module_str(
    name: &str,
    source: &str,
    search_path: &SearchPath,
    spaces: IdSpaces,
    reporter: &mut Reporter,
) -> Option<Module> {
    check_spaces(spaces, name, reporter)?;
    let mut cx = ParseContext::new(reporter, search_path, spaces);
    let mut handler = ModuleHandler::new();
    let well_formed = driver::parse_str(name, source, &mut handler, &mut cx);
    cx.file = name.to_string();
    finish(handler, well_formed, &mut cx)
}

/// Id spaces built in code skip the check done when loading a config file
fn check_spaces(spaces: IdSpaces, file: &str, reporter: &mut Reporter) -> Option<()> {
    match spaces.validate() {
        Ok(()) => Some(()),
        Err(e) => {
            reporter.error(Location::file(file), e);
            None
        }
    }
}

fn finish(handler: ModuleHandler, well_formed: bool, cx: &mut ParseContext<'_>) -> Option<Module> {
    if !well_formed {
        return None;
    }
    handler.finish(cx)
}
