//! Runs the templates over every class of a module

use std::io;
use std::path::{Path, PathBuf};

use crate::config::RenderOptions;
use crate::error::{Location, Reporter};
use crate::model::{Class, Module};
use crate::template::{ClassScope, Template, TemplateId, TemplateStore};

/// The three generated text streams of one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub module: String,
    pub class_defs: String,
    pub field_defs: String,
    pub header_defs: String,
}

impl Generation {
    fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            ..Self::default()
        }
    }

    fn stream_mut(&mut self, id: TemplateId) -> &mut String {
        match id {
            TemplateId::ClassDefs => &mut self.class_defs,
            TemplateId::FieldDefs => &mut self.field_defs,
            TemplateId::HeaderDefs => &mut self.header_defs,
        }
    }

    /// Output file names paired with their contents
    pub fn files(&self) -> [(String, &str); 3] {
        [
            (format!("{}_classes.sql", self.module), self.class_defs.as_str()),
            (format!("{}_fields.sql", self.module), self.field_defs.as_str()),
            (format!("{}.h", self.module), self.header_defs.as_str()),
        ]
    }

    /// Write all three files into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (name, text) in self.files() {
            let path = dir.join(name);
            std::fs::write(&path, text)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Renders modules with templates from one store
pub struct Generator<'a> {
    store: &'a dyn TemplateStore,
    options: RenderOptions,
}

impl<'a> Generator<'a> {
    pub fn new(store: &'a dyn TemplateStore, options: RenderOptions) -> Self {
        Self { store, options }
    }

    /// Render every class of `module`
    ///
    /// Class definitions and header constants are emitted class by class in
    /// a first pass, field definitions in a second. A template that fails to
    /// load or compile is reported once and produces nothing; a render error
    /// drops only that class from that stream.
    pub fn generate(&self, module: &Module, reporter: &mut Reporter) -> Generation {
        tracing::info!(
            module = %module.name,
            classes = module.classes.len(),
            "generating"
        );
        let mut generation = Generation::new(&module.name);

        let class_defs = self.load(TemplateId::ClassDefs, reporter);
        let header_defs = self.load(TemplateId::HeaderDefs, reporter);
        let field_defs = self.load(TemplateId::FieldDefs, reporter);

        let mut first = [true; 2];
        for class in &module.classes {
            tracing::debug!(class = %class.name, id = class.id, "rendering class");
            let pass = [
                (TemplateId::ClassDefs, &class_defs),
                (TemplateId::HeaderDefs, &header_defs),
            ];
            for (slot, (id, template)) in pass.into_iter().enumerate() {
                let Some(template) = template else { continue };
                if self.emit(template, id, module, class, first[slot], &mut generation, reporter) {
                    first[slot] = false;
                }
            }
        }

        if let Some(template) = &field_defs {
            let mut first = true;
            for class in &module.classes {
                let id = TemplateId::FieldDefs;
                if self.emit(template, id, module, class, first, &mut generation, reporter) {
                    first = false;
                }
            }
        }

        generation
    }

    fn load(&self, id: TemplateId, reporter: &mut Reporter) -> Option<Template> {
        let text = match self.store.fetch(id) {
            Ok(text) => text,
            Err(err) => {
                reporter.error(Location::file(id.name()), err);
                return None;
            }
        };
        reporter.add_source(id.name(), text.as_str());
        match Template::compile(id.name(), text) {
            Ok(template) => Some(template),
            Err(err) => {
                reporter.report(err.to_diagnostic());
                None
            }
        }
    }

    /// Render one class into its stream; true if anything was emitted
    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        template: &Template,
        id: TemplateId,
        module: &Module,
        class: &Class,
        first: bool,
        generation: &mut Generation,
        reporter: &mut Reporter,
    ) -> bool {
        let scope = ClassScope {
            module,
            class,
            first,
        };
        match template.render(&scope, &self.options) {
            Ok(text) => {
                generation.stream_mut(id).push_str(&text);
                true
            }
            Err(err) => {
                tracing::debug!(class = %class.name, template = id.name(), "render failed");
                reporter.report(err.to_diagnostic());
                false
            }
        }
    }
}
