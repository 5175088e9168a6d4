//! End-to-end tests: module XML in, generated text out

use cellargen::{generate, generate_str, GeneratorConfig, GuidMode, LineEnding, Reporter};
use pretty_assertions::assert_eq;

const FOO: &str = r#"<CellarModule id="Foo" num="5" ver="1">
  <class id="Bar" num="2" base="CmObject">
    <basic id="Count" num="1" sig="Integer" bits="8"/>
  </class>
</CellarModule>"#;

const LIBRARY: &str = r#"<?xml version="1.0"?>
<CellarModule id="Library" num="7" ver="3" verBack="2">
  <class id="Shelf" num="1" base="CmObject" abstract="true">
    <props>
      <basic id="Label" sig="Unicode"/>
      <owning id="Books" sig="Book" card="seq"/>
    </props>
  </class>
  <class id="Book" num="2" base="CmObject" abbr="bk">
    <basic id="Title" sig="String"/>
    <basic id="Pages" sig="Integer" min="1" max="5000" default="1"/>
    <rel id="Shelf" sig="Shelf" kind="backref"/>
    <rel id="Author" sig="Person"/>
  </class>
</CellarModule>"#;

#[test]
fn test_single_integer_field() {
    let generation = generate(FOO).expect("should generate");

    assert_eq!(
        generation.class_defs,
        "-- Classes of module Foo (id 5, version 1, back version 1)\n\
         \n\
         insert into Class$ (Id, Mod, Base, Abstract, Abbr, Name)\n    \
         values (5002, 5, 'CmObject', 0, 'bar', 'Bar')\n\
         create table Bar (\n    \
         Id int primary key,\n    \
         Count tinyint not null default 0\n\
         )\n\
         go\n"
    );
    assert_eq!(
        generation.field_defs,
        "-- Fields of Bar\n\
         insert into Field$ (Id, Type, Class, DstCls, Name, Min, Max, Big)\n    \
         values (5002001, 'Integer', 5002, null, 'Count', 0, 255, 0)\n\
         go\n"
    );

    let header: Vec<&str> = generation.header_defs.lines().collect();
    assert_eq!(header[0], "// Generated from module Foo, version 1");
    assert_eq!(header[2], "#define kclidBar 5002");
    assert!(header[3].starts_with("#define CLSID_Bar \""));
    assert_eq!(header[4], "#define kflidBar_Count 5002001");
}

#[test]
fn test_rendering_is_repeatable() {
    let first = generate(LIBRARY).unwrap();
    let second = generate(LIBRARY).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_multiple_classes() {
    let generation = generate(LIBRARY).unwrap();

    assert!(generation
        .class_defs
        .contains("values (7001, 7, 'CmObject', 1, 'shelf', 'Shelf')"));
    assert!(generation
        .class_defs
        .contains("values (7002, 7, 'CmObject', 0, 'bk', 'Book')"));
    assert!(generation.class_defs.contains(
        "    Pages smallint not null default 1 check (Pages >= 1 and Pages <= 5000)"
    ));
    assert!(generation.class_defs.contains("    Author int null"));
    assert_eq!(generation.class_defs.matches("-- Classes of module").count(), 1);

    assert!(generation
        .field_defs
        .contains("values (7001002, 'OwningSequence', 7001, 'Book', 'Books', null, null, 0)"));
    assert!(generation
        .field_defs
        .contains("values (7002004, 'ReferenceAtom', 7002, 'Person', 'Author', null, null, 0)"));
}

#[test]
fn test_backref_is_not_generated_but_keeps_its_number() {
    let generation = generate(LIBRARY).unwrap();
    assert!(!generation.header_defs.contains("kflidBook_Shelf"));
    assert!(generation.header_defs.contains("#define kflidBook_Author 7002004"));
}

#[test]
fn test_class_pass_runs_before_field_pass() {
    let generation = generate(LIBRARY).unwrap();
    let shelf = generation.field_defs.find("-- Fields of Shelf").unwrap();
    let book = generation.field_defs.find("-- Fields of Book").unwrap();
    assert!(shelf < book);
    let shelf = generation.header_defs.find("kclidShelf").unwrap();
    let book = generation.header_defs.find("kclidBook").unwrap();
    assert!(shelf < book);
}

#[test]
fn test_crlf_output() {
    let config = GeneratorConfig::default().with_line_ending(LineEnding::CrLf);
    let mut reporter = Reporter::new();
    let generation = generate_str("Foo.xml", FOO, &config, &mut reporter).unwrap();
    assert!(!reporter.has_errors());
    assert!(generation.class_defs.contains("create table Bar (\r\n"));
    assert!(!generation.class_defs.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_random_guids_change_between_runs() {
    let config = GeneratorConfig::default().with_guid_mode(GuidMode::Random);
    let first = generate_str("Foo.xml", FOO, &config, &mut Reporter::new()).unwrap();
    let second = generate_str("Foo.xml", FOO, &config, &mut Reporter::new()).unwrap();
    assert_ne!(first.header_defs, second.header_defs);
    assert_eq!(first.class_defs, second.class_defs);
}

#[test]
fn test_template_override_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("HeaderDefs.tpl"),
        "$foreach$ClassName.$FieldName=$FieldId\n$endfor",
    )
    .unwrap();
    let config = GeneratorConfig::default().with_template_dir(dir.path());
    let mut reporter = Reporter::new();
    let generation = generate_str("Foo.xml", FOO, &config, &mut reporter).unwrap();

    assert_eq!(generation.header_defs, "Bar.Count=5002001\n");
    assert!(generation.class_defs.starts_with("-- Classes of module Foo"));
}

#[test]
fn test_template_error_is_positioned_in_template() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ClassDefs.tpl"), "ok\n$if(first)\n").unwrap();
    let config = GeneratorConfig::default().with_template_dir(dir.path());
    let mut reporter = Reporter::new();
    let generation = generate_str("Foo.xml", FOO, &config, &mut reporter).unwrap();

    assert_eq!(generation.class_defs, "");
    let messages: Vec<String> = reporter.errors().map(|d| d.to_string()).collect();
    assert_eq!(messages, vec!["ClassDefs(2,1): error: missing 'endif'"]);
    assert!(!reporter.render().is_empty());
}

#[test]
fn test_errors_fail_the_one_call_api() {
    let err = generate(r#"<CellarModule id="Foo" num="5"/>"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "1 error(s): <input>(1,1): error: missing attribute 'ver'"
    );
}
