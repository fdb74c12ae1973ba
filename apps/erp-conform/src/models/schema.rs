//! Declared schema entities and migration records.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A field declared on a model. `nullable` follows the ORM default (true).
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub references: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDecl {
    pub fields: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One declared table, parsed from an infrastructure model file.
pub struct SchemaEntity {
    pub table: String,
    pub path: String,
    pub fields: Vec<FieldDecl>,
    pub indexes: Vec<IndexDecl>,
    /// `paranoid: true` declared in model options.
    pub paranoid: bool,
    /// `@identity` marker present in the declaring file.
    pub identity_marker: bool,
    pub module: Option<String>,
}

impl SchemaEntity {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_slug(&self) -> bool {
        self.field("slug").is_some()
    }

    /// Subject string used for violations scoped to this entity.
    pub fn subject(&self) -> String {
        format!("{}#{}", self.path, self.table)
    }

    pub fn module_label(&self) -> String {
        self.module
            .clone()
            .unwrap_or_else(|| "infrastructure".to_string())
    }

    /// True when some declaration gives `field` index coverage: primary key,
    /// `unique: true`, or the leading column of a declared index.
    pub fn is_indexed(&self, field: &str) -> bool {
        if let Some(f) = self.field(field) {
            if f.primary_key || f.unique {
                return true;
            }
        }
        self.indexes
            .iter()
            .any(|ix| ix.fields.first().map(String::as_str) == Some(field))
    }

    pub fn has_unique_index_on(&self, field: &str) -> bool {
        if self.field(field).map(|f| f.unique).unwrap_or(false) {
            return true;
        }
        self.indexes
            .iter()
            .any(|ix| ix.unique && ix.fields.len() == 1 && ix.fields[0] == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Effect of one query-interface call on a table.
pub enum MigrationOp {
    Create(Vec<ColumnDef>),
    AddColumn(ColumnDef),
    ChangeColumn(ColumnDef),
    RemoveColumn(String),
    RenameColumn { from: String, to: String },
    Drop,
}

impl MigrationOp {
    pub fn is_create(&self) -> bool {
        matches!(self, MigrationOp::Create(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Operations one migration file applies to one table.
pub struct MigrationRecord {
    /// 14-digit timestamp token; `None` when the filename is malformed.
    pub timestamp: Option<String>,
    pub table: String,
    pub ops: Vec<MigrationOp>,
    pub filename: String,
    pub path: String,
}

impl MigrationRecord {
    pub fn creates(&self) -> bool {
        self.ops.iter().any(MigrationOp::is_create)
    }

    /// Timestamp order, ties (and missing timestamps) broken by filename.
    pub fn chronological(a: &MigrationRecord, b: &MigrationRecord) -> Ordering {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.filename.cmp(&b.filename))
            .then_with(|| a.table.cmp(&b.table))
    }
}
