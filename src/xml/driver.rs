//! Event-driven XML reading on top of quick-xml
//!
//! The driver turns the quick-xml event stream into `on_start`/`on_end`
//! calls on an [`ElementHandler`]. Syntax errors end the parse; semantic
//! problems are the handler's business and never stop the stream.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Location;

use super::ParseContext;

/// One attribute of a start tag, already unescaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// A start tag (or empty-element tag)
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    /// In document order; duplicates are kept
    pub attributes: Vec<XmlAttribute>,
    pub location: Location,
}

/// Receives element events from the driver
pub trait ElementHandler {
    fn on_start(&mut self, cx: &mut ParseContext<'_>, element: &Element);
    fn on_end(&mut self, cx: &mut ParseContext<'_>, name: &str, location: &Location);
}

/// Ordered list of directories searched for input files
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find `file` in the first directory that has it
    ///
    /// Absolute paths, and relative paths when the search path is empty, are
    /// checked as given.
    pub fn locate(&self, file: &Path) -> Option<PathBuf> {
        if file.is_absolute() || self.dirs.is_empty() {
            return file.is_file().then(|| file.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(file))
            .find(|candidate| candidate.is_file())
    }
}

/// Locate `file` on the search path and feed it to `handler`
///
/// Returns false if the file could not be found or read, or is not
/// well-formed XML.
pub fn parse_file<H: ElementHandler>(
    file: &Path,
    handler: &mut H,
    cx: &mut ParseContext<'_>,
) -> bool {
    let Some(resolved) = cx.search_path.locate(file) else {
        let location = match cx.location {
            Some(_) => cx.here(),
            None => Location::file(file.display().to_string()),
        };
        cx.error(location, format!("file not found: {}", file.display()));
        return false;
    };
    let source = match std::fs::read_to_string(&resolved) {
        Ok(source) => source,
        Err(e) => {
            cx.error(
                Location::file(resolved.display().to_string()),
                format!("cannot read file: {}", e),
            );
            return false;
        }
    };
    tracing::debug!("parsing {}", resolved.display());
    parse_str(&resolved.display().to_string(), &source, handler, cx)
}

/// Feed an in-memory document named `file` to `handler`
pub fn parse_str<H: ElementHandler>(
    file: &str,
    source: &str,
    handler: &mut H,
    cx: &mut ParseContext<'_>,
) -> bool {
    cx.reporter.add_source(file, source);
    let previous = (
        std::mem::replace(&mut cx.file, file.to_string()),
        cx.location.take(),
    );
    let ok = drive(source, handler, cx);
    (cx.file, cx.location) = previous;
    ok
}

fn drive<H: ElementHandler>(source: &str, handler: &mut H, cx: &mut ParseContext<'_>) -> bool {
    let mut reader = Reader::from_str(source);
    let mut cursor = Cursor::new(source);

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                let location = cursor.locate(&cx.file, offset);
                match element(&tag, location) {
                    Ok(element) => {
                        cx.location = Some(element.location.clone());
                        handler.on_start(cx, &element);
                    }
                    Err(message) => {
                        let location = cursor.locate(&cx.file, offset);
                        return syntax_error(cx, location, message);
                    }
                }
            }
            Ok(Event::Empty(tag)) => {
                let location = cursor.locate(&cx.file, offset);
                match element(&tag, location) {
                    Ok(element) => {
                        cx.location = Some(element.location.clone());
                        handler.on_start(cx, &element);
                        handler.on_end(cx, &element.name, &element.location);
                    }
                    Err(message) => {
                        let location = cursor.locate(&cx.file, offset);
                        return syntax_error(cx, location, message);
                    }
                }
            }
            Ok(Event::End(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let location = cursor.locate(&cx.file, offset);
                cx.location = Some(location.clone());
                handler.on_end(cx, &name, &location);
            }
            Ok(Event::Eof) => return true,
            Ok(_) => {}
            Err(e) => {
                let offset = reader.buffer_position() as usize;
                let location = cursor.locate(&cx.file, offset);
                return syntax_error(cx, location, e.to_string());
            }
        }
    }
}

/// Line/column of the last located offset
///
/// Offsets only grow while reading, so each lookup scans just the text
/// since the previous one.
struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn locate(&mut self, file: &str, offset: usize) -> Location {
        let mut target = offset.min(self.source.len());
        while !self.source.is_char_boundary(target) {
            target -= 1;
        }
        if target < self.offset {
            *self = Cursor::new(self.source);
        }
        for ch in self.source[self.offset..target].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        Location {
            file: file.to_string(),
            line: self.line,
            column: self.column,
            offset: Some(offset),
        }
    }
}

fn element(tag: &BytesStart<'_>, location: Location) -> Result<Element, String> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    let mut raw = tag.attributes();
    raw.with_checks(false);
    for attr in raw {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: value.into_owned(),
        });
    }
    Ok(Element {
        name,
        attributes,
        location,
    })
}

fn syntax_error(cx: &mut ParseContext<'_>, location: Location, message: String) -> bool {
    cx.error(location, format!("XML syntax error: {}", message));
    false
}
