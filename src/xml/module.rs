//! Handler for the `<CellarModule>` root element

use std::path::Path;

use crate::error::Location;
use crate::model::{Class, Module};

use super::attrs::{AttrSet, AttributeError};
use super::class::{ClassHandler, ClassOutcome, ClassState};
use super::driver::{self, Element, ElementHandler};
use super::ParseContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Before `<CellarModule>`
    Outside,
    InModule,
    /// The module header was invalid; classes are still checked
    Error,
    /// After `</CellarModule>`
    Closed,
}

#[derive(Debug)]
struct Header {
    name: String,
    id: i64,
    version: i64,
    back_version: i64,
}

#[derive(Debug)]
pub struct ModuleHandler {
    state: ModuleState,
    header: Option<Header>,
    classes: Vec<Class>,
    /// The `<class>` currently open, if any
    class: Option<ClassHandler>,
    skip_depth: usize,
}

impl Default for ModuleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleHandler {
    pub fn new() -> Self {
        Self {
            state: ModuleState::Outside,
            header: None,
            classes: Vec::new(),
            class: None,
            skip_depth: 0,
        }
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Classes accepted so far, in declaration order
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Build the module once the document has been read
    ///
    /// `None` if there was no module element or its header was invalid.
    pub fn finish(self, cx: &mut ParseContext<'_>) -> Option<Module> {
        match self.state {
            ModuleState::Outside => {
                let location = Location::file(cx.file.clone());
                cx.error(location, "no <CellarModule> element found");
                None
            }
            ModuleState::InModule => {
                let location = Location::file(cx.file.clone());
                cx.error(location, "<CellarModule> is not closed");
                None
            }
            ModuleState::Error => None,
            ModuleState::Closed => {
                let header = self.header?;
                tracing::info!(
                    "module {} ({}): {} classes",
                    header.name,
                    header.id,
                    self.classes.len()
                );
                Some(Module {
                    name: header.name,
                    id: header.id,
                    version: header.version,
                    back_version: header.back_version,
                    classes: self.classes,
                })
            }
        }
    }

    fn skip(&mut self, cx: &mut ParseContext<'_>, element: &Element, message: String) {
        cx.error(element.location.clone(), message);
        self.skip_depth = 1;
    }

    fn start_module(&mut self, cx: &mut ParseContext<'_>, element: &Element) {
        let mut attrs = AttrSet::new(element);
        let name = attrs.require("id");
        let id = attrs.require_int("num", 0..=cx.spaces.module - 1);
        let version = attrs.require_int("ver", 1..=i64::from(i32::MAX));
        let back_version = attrs.take_int("verBack", 1..=i64::from(i32::MAX));
        if let (Some(version), Some(back)) = (version, back_version) {
            if back > version {
                attrs.fail(AttributeError::Invalid {
                    message: format!(
                        "back version should be <= version ({} > {})",
                        back, version
                    ),
                });
            }
        }
        attrs.reject_unknown();
        let ok = attrs.report(cx, &element.location);

        cx.begin_module(id.unwrap_or(0));
        match (ok, name, id, version) {
            (true, Some(name), Some(id), Some(version)) => {
                self.header = Some(Header {
                    name,
                    id,
                    version,
                    back_version: back_version.unwrap_or(version),
                });
                self.state = ModuleState::InModule;
            }
            _ => self.state = ModuleState::Error,
        }
    }

    /// `<include file="..."/>`: read one more class from another file
    fn include(&mut self, cx: &mut ParseContext<'_>, element: &Element) {
        let mut attrs = AttrSet::new(element);
        let file = attrs.require("file");
        attrs.reject_unknown();
        if !attrs.report(cx, &element.location) {
            return;
        }
        let Some(file) = file else {
            return;
        };

        let mut handler = ClassHandler::new();
        if !driver::parse_file(Path::new(&file), &mut handler, cx) {
            return;
        }
        match handler.state() {
            ClassState::PostClass => self.accept(cx, handler),
            ClassState::InClass | ClassState::InProperties => {
                let location = handler
                    .location()
                    .cloned()
                    .unwrap_or_else(|| element.location.clone());
                cx.error(location, "<class> is not closed");
            }
            ClassState::Null => {
                if !handler.failed() {
                    cx.error(
                        element.location.clone(),
                        format!("included file '{}' does not contain a class", file),
                    );
                }
            }
        }
    }

    fn accept(&mut self, cx: &mut ParseContext<'_>, handler: ClassHandler) {
        let location = handler
            .location()
            .cloned()
            .unwrap_or_else(|| cx.here());
        match handler.finish() {
            ClassOutcome::Failed => {
                tracing::debug!("dropping class at {} after errors", location);
            }
            ClassOutcome::Excluded(class) => {
                cx.note(
                    location,
                    format!(
                        "class '{}' has id {}; built-in classes are not generated",
                        class.name, class.id
                    ),
                );
            }
            ClassOutcome::Accepted(class) => {
                if let Some(other) = self.classes.iter().find(|c| c.id == class.id) {
                    let message = format!(
                        "duplicate class id {} for class '{}' (already used by '{}')",
                        class.id, class.name, other.name
                    );
                    cx.error(location, message);
                    return;
                }
                self.classes.push(class);
            }
        }
    }
}

impl ElementHandler for ModuleHandler {
    fn on_start(&mut self, cx: &mut ParseContext<'_>, element: &Element) {
        if let Some(class) = self.class.as_mut() {
            class.on_start(cx, element);
            return;
        }
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        let name = element.name.as_str();
        match (self.state, name) {
            (ModuleState::Outside, "CellarModule") => self.start_module(cx, element),
            (ModuleState::Outside, _) => {
                self.skip(cx, element, format!("expected <CellarModule>, found <{}>", name));
            }
            (ModuleState::InModule | ModuleState::Error, "class") => {
                let mut handler = ClassHandler::new();
                handler.on_start(cx, element);
                self.class = Some(handler);
            }
            (ModuleState::InModule | ModuleState::Error, "include") => self.include(cx, element),
            (ModuleState::InModule | ModuleState::Error, _) => {
                self.skip(cx, element, format!("unexpected <{}> in <CellarModule>", name));
            }
            (ModuleState::Closed, _) => {
                self.skip(cx, element, format!("unexpected <{}> after </CellarModule>", name));
            }
        }
    }

    fn on_end(&mut self, cx: &mut ParseContext<'_>, name: &str, location: &Location) {
        if let Some(class) = self.class.as_mut() {
            class.on_end(cx, name, location);
            if class.state() == ClassState::PostClass {
                if let Some(handler) = self.class.take() {
                    self.accept(cx, handler);
                }
            }
            return;
        }
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        // an invalid header stays in Error so finish() yields no module
        if name == "CellarModule" && self.state == ModuleState::InModule {
            self.state = ModuleState::Closed;
        }
    }
}
