//! Migration files into [`MigrationRecord`]s.
//!
//! Only the body of the `up` member (`up:`, `up(`, `up =` or
//! `function up(`) is read, wherever it sits in the file. A file without an
//! `up` member is read up to its first `down` member. Recognized query-interface calls are `createTable`,
//! `addColumn`, `changeColumn`, `removeColumn`, `renameColumn` and
//! `dropTable`; each yields an operation on the table named by its first
//! argument.

use super::literal::{balanced_end, parse_call_args, Lit};
use super::source::mask;
use crate::models::schema::{ColumnDef, MigrationOp, MigrationRecord};
use regex::Regex;
use std::sync::OnceLock;

fn op_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(createTable|addColumn|changeColumn|removeColumn|renameColumn|dropTable)\s*\(")
            .expect("static regex")
    })
}

fn up_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bup\s*[:(=]").expect("static regex"))
}

fn down_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bdown\s*[:(=]").expect("static regex"))
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{14})-[a-z0-9]+(?:-[a-z0-9]+)*\.[A-Za-z0-9]+$").expect("static regex")
    })
}

/// The 14-digit timestamp token of a well-formed migration filename
/// (`<14 digits>-<kebab-slug>.<ext>`, any extension), or `None` when
/// malformed.
pub fn timestamp_token(filename: &str) -> Option<String> {
    let caps = name_re().captures(filename)?;
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Parse one migration file. A file may touch several tables; one record is
/// produced per table, in order of first appearance.
pub fn parse_migration_file(
    path: &str,
    filename: &str,
    src: &str,
) -> Result<Vec<MigrationRecord>, String> {
    let code = mask(src, false);
    let up = up_section(&code)?;
    let timestamp = timestamp_token(filename);

    let mut records: Vec<MigrationRecord> = Vec::new();
    for caps in op_re().captures_iter(up) {
        let (Some(whole), Some(call)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let (args, _) = parse_call_args(up, whole.end() - 1)?;
        let Some(table) = table_arg(args.first()) else {
            continue;
        };
        let Some(op) = operation(call.as_str(), &args) else {
            continue;
        };
        match records.iter_mut().find(|r| r.table == table) {
            Some(r) => r.ops.push(op),
            None => records.push(MigrationRecord {
                timestamp: timestamp.clone(),
                table,
                ops: vec![op],
                filename: filename.to_string(),
                path: path.to_string(),
            }),
        }
    }
    if records.is_empty() {
        return Err("no recognizable table operation in the up migration".to_string());
    }
    Ok(records)
}

/// The masked text of the `up` migration.
fn up_section(code: &str) -> Result<&str, String> {
    let Some(m) = up_re().find(code) else {
        let end = down_re().find(code).map(|d| d.start()).unwrap_or(code.len());
        return Ok(&code[..end]);
    };
    let b = code.as_bytes();
    // `up(` starts the parameter list; other forms reach it by scanning
    let mut i = m.end() - 1;
    if b[i] != b'(' {
        i = m.end();
    }
    while i < b.len() {
        match b[i] {
            b'{' => return Ok(&code[i..balanced_end(code, i)?]),
            b'(' | b'[' => i = balanced_end(code, i)?,
            b',' | b';' | b'}' => return Ok(&code[m.end()..i]),
            _ => i += 1,
        }
    }
    Ok(&code[m.end()..])
}

fn table_arg(arg: Option<&Lit>) -> Option<String> {
    match arg? {
        Lit::Str(s) => Some(s.clone()),
        obj @ Lit::Object(_) => obj.get("tableName").and_then(Lit::as_str).map(str::to_string),
        _ => None,
    }
}

fn column(name: &str, attrs: Option<&Lit>) -> ColumnDef {
    let primary_key = attrs
        .and_then(|a| a.get("primaryKey"))
        .and_then(Lit::as_bool)
        == Some(true);
    ColumnDef {
        name: name.to_string(),
        nullable: attrs
            .and_then(|a| a.get("allowNull"))
            .and_then(Lit::as_bool)
            .unwrap_or(!primary_key),
    }
}

fn operation(call: &str, args: &[Lit]) -> Option<MigrationOp> {
    let str_arg = |i: usize| args.get(i).and_then(Lit::as_str);
    match call {
        "createTable" => {
            let cols = args
                .get(1)?
                .as_object()?
                .iter()
                .filter(|(name, _)| name != "...")
                .map(|(name, v)| column(name, Some(v)))
                .collect();
            Some(MigrationOp::Create(cols))
        }
        "addColumn" => Some(MigrationOp::AddColumn(column(str_arg(1)?, args.get(2)))),
        "changeColumn" => Some(MigrationOp::ChangeColumn(column(str_arg(1)?, args.get(2)))),
        "removeColumn" => Some(MigrationOp::RemoveColumn(str_arg(1)?.to_string())),
        "renameColumn" => Some(MigrationOp::RenameColumn {
            from: str_arg(1)?.to_string(),
            to: str_arg(2)?.to_string(),
        }),
        "dropTable" => Some(MigrationOp::Drop),
        _ => None,
    }
}
