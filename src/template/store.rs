//! Where template texts come from
//!
//! The built-in templates are compiled into the binary. A template
//! directory may override any of them with a `<Name>.tpl` file.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The three templates run for every class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    ClassDefs,
    FieldDefs,
    HeaderDefs,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [
        TemplateId::ClassDefs,
        TemplateId::FieldDefs,
        TemplateId::HeaderDefs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::ClassDefs => "ClassDefs",
            TemplateId::FieldDefs => "FieldDefs",
            TemplateId::HeaderDefs => "HeaderDefs",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            TemplateId::ClassDefs => CLASS_DEFS,
            TemplateId::FieldDefs => FIELD_DEFS,
            TemplateId::HeaderDefs => HEADER_DEFS,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur when fetching a template
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("template directory not found: {}", dir.display())]
    MissingDir { dir: PathBuf },

    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies template text by id
pub trait TemplateStore {
    fn fetch(&self, id: TemplateId) -> Result<String, StoreError>;
}

/// Table and column creation for one class
const CLASS_DEFS: &str = r##"$if(first)-- Classes of module $ModuleName (id $ModuleId, version $Version, back version $BackVersion)
$endif
insert into Class$$ (Id, Mod, Base, Abstract, Abbr, Name)
    values ($ClassId, $ModuleId, '$BaseName', $if(abstract)1$endif$if(!abstract)0$endif, '$Abbr', '$ClassName')
create table $ClassName (
    Id int primary key$foreach$if(embedded),
    $Column$endif$endfor
)
go
"##;

/// One metadata row per property
const FIELD_DEFS: &str = r##"-- Fields of $ClassName$foreach
insert into Field$$ (Id, Type, Class, DstCls, Name, Min, Max, Big)
    values ($FieldId, '$FieldType', $ClassId,$if(object) '$Signature'$else null$endif, '$FieldName', $Min, $Max, $BigBinary)$endfor
go
"##;

/// Numeric constants for C headers
const HEADER_DEFS: &str = r##"$if(first)// Generated from module $ModuleName, version $Version
$endif
#define kclid$ClassName $ClassId
#define CLSID_$ClassName "$Guid"
$foreach#define kflid${ClassName}_$FieldName $FieldId
$endfor"##;

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateStore for BuiltinTemplates {
    fn fetch(&self, id: TemplateId) -> Result<String, StoreError> {
        Ok(id.builtin().to_string())
    }
}

/// Reads `<dir>/<Name>.tpl`, falling back to the built-in text
#[derive(Debug, Clone)]
pub struct DirTemplateStore {
    dir: PathBuf,
}

impl DirTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: TemplateId) -> PathBuf {
        self.dir.join(format!("{}.tpl", id.name()))
    }
}

impl TemplateStore for DirTemplateStore {
    fn fetch(&self, id: TemplateId) -> Result<String, StoreError> {
        if !self.dir.is_dir() {
            return Err(StoreError::MissingDir {
                dir: self.dir.clone(),
            });
        }
        let path = self.path(id);
        if !path.is_file() {
            tracing::debug!(template = id.name(), "no override, using built-in text");
            return BuiltinTemplates.fetch(id);
        }
        std::fs::read_to_string(&path).map_err(|source| StoreError::Read { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn test_builtin_templates_compile() {
        for id in TemplateId::ALL {
            let text = BuiltinTemplates.fetch(id).unwrap();
            assert!(Template::compile(id.name(), text).is_ok(), "{id} failed to compile");
        }
    }

    #[test]
    fn test_dir_store_overrides_one_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("FieldDefs.tpl"), "custom $ClassName").unwrap();
        let store = DirTemplateStore::new(dir.path());

        assert_eq!(store.fetch(TemplateId::FieldDefs).unwrap(), "custom $ClassName");
        assert_eq!(store.fetch(TemplateId::ClassDefs).unwrap(), CLASS_DEFS);
    }

    #[test]
    fn test_dir_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTemplateStore::new(dir.path().join("nope"));
        let err = store.fetch(TemplateId::HeaderDefs).unwrap_err();
        assert!(matches!(err, StoreError::MissingDir { .. }));
        assert!(err.to_string().starts_with("template directory not found"));
    }
}
