//! Loading modules from disk: search path, includes and diagnostics

use std::fs;
use std::path::{Path, PathBuf};

use cellargen::{generate_module, generate_str, load_module, module_file, GeneratorConfig, IdSpaces, Reporter, SearchPath};
use pretty_assertions::assert_eq;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

fn messages(reporter: &Reporter) -> Vec<String> {
    reporter.diagnostics().iter().map(|d| d.to_string()).collect()
}

#[test]
fn test_module_file_name() {
    assert_eq!(module_file("Ling"), PathBuf::from("Ling.xml"));
    assert_eq!(module_file("schema/Ling.xml"), PathBuf::from("schema/Ling.xml"));
}

#[test]
fn test_include_appends_class() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1">
             <class id="Text" num="1" base="CmObject"/>
             <include file="Wordform.xml"/>
             <class id="Segment" base="CmObject"/>
           </CellarModule>"#,
    );
    write(
        dir.path(),
        "Wordform.xml",
        r#"<class id="Wordform" num="2" base="CmObject">
             <basic id="Form" sig="Unicode"/>
           </class>"#,
    );

    let mut reporter = Reporter::new();
    let search_path = SearchPath::new(vec![dir.path().to_path_buf()]);
    let module = load_module(Path::new("Ling.xml"), &search_path, IdSpaces::default(), &mut reporter)
        .expect("module should load");

    assert_eq!(messages(&reporter), Vec::<String>::new());
    let classes: Vec<(&str, i64)> = module
        .classes
        .iter()
        .map(|c| (c.name.as_str(), c.id))
        .collect();
    assert_eq!(classes, vec![("Text", 5001), ("Wordform", 5002), ("Segment", 5003)]);
    assert_eq!(module.classes[1].properties[0].id, 5002001);
}

#[test]
fn test_missing_include_is_reported_at_include_element() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        "<CellarModule id=\"Ling\" num=\"5\" ver=\"1\">\n  <include file=\"Gone.xml\"/>\n</CellarModule>",
    );

    let mut reporter = Reporter::new();
    let search_path = SearchPath::new(vec![dir.path().to_path_buf()]);
    let module = load_module(Path::new("Ling.xml"), &search_path, IdSpaces::default(), &mut reporter);

    assert!(module.is_some());
    assert_eq!(reporter.error_count(), 1);
    let diagnostic = &reporter.diagnostics()[0];
    assert_eq!(diagnostic.location.line, 2);
    assert!(diagnostic.message.contains("Gone.xml"));
}

#[test]
fn test_include_syntax_error_points_into_included_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1"><include file="Bad.xml"/></CellarModule>"#,
    );
    write(dir.path(), "Bad.xml", "<class id=\"Bad\" base=\"CmObject\">\n</klass>");

    let mut reporter = Reporter::new();
    let search_path = SearchPath::new(vec![dir.path().to_path_buf()]);
    let module = load_module(Path::new("Ling.xml"), &search_path, IdSpaces::default(), &mut reporter)
        .unwrap();

    assert!(module.classes.is_empty());
    assert_eq!(reporter.error_count(), 1);
    let location = &reporter.diagnostics()[0].location;
    assert!(location.file.ends_with("Bad.xml"));
    assert_eq!(location.line, 2);
}

#[test]
fn test_unclosed_class_in_included_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1"><include file="Open.xml"/></CellarModule>"#,
    );
    write(
        dir.path(),
        "Open.xml",
        "<class id=\"Open\" num=\"1\" base=\"CmObject\">\n  <props>\n    <basic id=\"Name\" sig=\"Unicode\"/>\n",
    );

    let mut reporter = Reporter::new();
    let search_path = SearchPath::new(vec![dir.path().to_path_buf()]);
    let module = load_module(Path::new("Ling.xml"), &search_path, IdSpaces::default(), &mut reporter)
        .unwrap();

    assert!(module.classes.is_empty());
    assert_eq!(reporter.error_count(), 1);
    let diagnostic = &reporter.diagnostics()[0];
    assert_eq!(diagnostic.message, "<class> is not closed");
    assert!(diagnostic.location.file.ends_with("Open.xml"));
    assert_eq!(diagnostic.location.line, 1);
}

#[test]
fn test_included_file_without_class() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1"><include file="Empty.xml"/></CellarModule>"#,
    );
    write(dir.path(), "Empty.xml", "<!-- nothing here -->\n");

    let mut reporter = Reporter::new();
    let search_path = SearchPath::new(vec![dir.path().to_path_buf()]);
    load_module(Path::new("Ling.xml"), &search_path, IdSpaces::default(), &mut reporter).unwrap();

    let errors: Vec<&str> = reporter.errors().map(|d| d.message.as_str()).collect();
    assert_eq!(errors, vec!["included file 'Empty.xml' does not contain a class"]);
}

#[test]
fn test_id_spaces_built_in_code_are_checked() {
    let spaces = IdSpaces {
        class: 4_294_967_296,
        module: 4_294_967_296,
        field: 1000,
    };
    let config = GeneratorConfig::default().with_id_spaces(spaces);
    let mut reporter = Reporter::new();
    let generation = generate_str(
        "Foo.xml",
        r#"<CellarModule id="Foo" num="5" ver="1"><class id="Bar" num="2" base="CmObject"/></CellarModule>"#,
        &config,
        &mut reporter,
    );

    assert!(generation.is_none());
    assert_eq!(
        messages(&reporter),
        vec!["Foo.xml: error: Invalid [id_spaces]: class * module * field \
              (4294967296 * 4294967296 * 1000) overflows a 64-bit id"]
    );
}

#[test]
fn test_search_path_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(
        first.path(),
        "Ling.xml",
        r#"<CellarModule id="First" num="1" ver="1"/>"#,
    );
    write(
        second.path(),
        "Ling.xml",
        r#"<CellarModule id="Second" num="2" ver="1"/>"#,
    );

    let config = GeneratorConfig::default()
        .with_search_path(vec![second.path().to_path_buf()])
        .with_search_dir_first(first.path());
    let mut reporter = Reporter::new();
    let generation = generate_module("Ling", &config, &mut reporter).unwrap();
    assert_eq!(generation.module, "First");
}

#[test]
fn test_missing_module_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::default().with_search_path(vec![dir.path().to_path_buf()]);
    let mut reporter = Reporter::new();

    assert!(generate_module("Nowhere", &config, &mut reporter).is_none());
    assert_eq!(messages(&reporter), vec!["Nowhere.xml: error: file not found: Nowhere.xml"]);
}

#[test]
fn test_duplicate_attribute_reports_once_and_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1">
             <class id="A" num="1" base="CmObject">
               <basic id="Count" sig="Integer" bits="4" bits="8"/>
             </class>
           </CellarModule>"#,
    );
    let config = GeneratorConfig::default().with_search_path(vec![dir.path().to_path_buf()]);
    let mut reporter = Reporter::new();
    let generation = generate_module("Ling", &config, &mut reporter).unwrap();

    let errors: Vec<&str> = reporter.errors().map(|d| d.message.as_str()).collect();
    assert_eq!(errors, vec!["duplicate attribute 'bits' ignored"]);
    assert_eq!(generation.class_defs, "");
}

#[test]
fn test_every_class_is_attempted() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Ling.xml",
        r#"<CellarModule id="Ling" num="5" ver="1">
             <class id="A" num="1" base="CmObject">
               <basic id="X" sig="Decimal"/>
             </class>
             <class id="B" num="2" base="CmObject" abbr="Bee"/>
             <class id="C" num="3" base="CmObject">
               <basic id="Y" sig="Boolean"/>
             </class>
           </CellarModule>"#,
    );
    let config = GeneratorConfig::default().with_search_path(vec![dir.path().to_path_buf()]);
    let mut reporter = Reporter::new();
    let generation = generate_module("Ling", &config, &mut reporter).unwrap();

    assert_eq!(reporter.error_count(), 2);
    assert!(generation.class_defs.contains("create table C ("));
    assert!(generation.class_defs.contains("Y bit not null default 0"));
    assert!(!generation.class_defs.contains("create table A"));
    assert!(!generation.class_defs.contains("create table B"));
}
