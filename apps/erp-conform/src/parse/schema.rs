//! Schema declarations: Sequelize-style model files into [`SchemaEntity`]s.
//!
//! Recognized shapes:
//! - `Model.init({ <fields> }, { tableName, paranoid, indexes, ... })`
//! - `sequelize.define('table', { <fields> }, { <options> })`
//!
//! The table name comes from `tableName`, then the `define` name, then the
//! snake_case model class name.

use super::literal::{parse_call_args, Lit};
use super::source::mask;
use crate::models::schema::{FieldDecl, IndexDecl, SchemaEntity};
use regex::Regex;
use std::sync::OnceLock;

fn init_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][\w$]*)\s*\.\s*init\s*\(").expect("static regex"))
}

fn define_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\s*define\s*\(").expect("static regex"))
}

/// Parse every table declared in one model file.
pub fn parse_model_file(path: &str, src: &str) -> Result<Vec<SchemaEntity>, String> {
    let code = mask(src, false);
    let identity_marker = src.contains("@identity");
    let mut entities = Vec::new();

    for caps in init_re().captures_iter(&code) {
        let (Some(whole), Some(class)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let (args, _) = parse_call_args(&code, whole.end() - 1)?;
        let fields = args.first().ok_or("init() without a field map")?;
        let empty = Lit::Object(Vec::new());
        let options = args.get(1).unwrap_or(&empty);
        let table = options
            .get("tableName")
            .and_then(Lit::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| snake_case(class.as_str()));
        entities.push(entity(path, table, fields, options, identity_marker)?);
    }

    for m in define_re().find_iter(&code) {
        let (args, _) = parse_call_args(&code, m.end() - 1)?;
        let name = args
            .first()
            .and_then(Lit::as_str)
            .ok_or("define() without a string model name")?;
        let fields = args.get(1).ok_or("define() without a field map")?;
        let empty = Lit::Object(Vec::new());
        let options = args.get(2).unwrap_or(&empty);
        let table = options
            .get("tableName")
            .and_then(Lit::as_str)
            .unwrap_or(name)
            .to_string();
        entities.push(entity(path, table, fields, options, identity_marker)?);
    }

    if entities.is_empty() {
        return Err("no model declaration (Model.init or sequelize.define) found".to_string());
    }
    Ok(entities)
}

fn entity(
    path: &str,
    table: String,
    fields: &Lit,
    options: &Lit,
    identity_marker: bool,
) -> Result<SchemaEntity, String> {
    let entries = fields
        .as_object()
        .ok_or_else(|| format!("field map of '{}' is not an object literal", table))?;
    let fields = entries
        .iter()
        .filter(|(name, _)| name != "...")
        .map(|(name, v)| field_decl(name, v))
        .collect();
    let indexes = options
        .get("indexes")
        .and_then(Lit::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(index_decl)
        .collect();
    Ok(SchemaEntity {
        table,
        path: path.to_string(),
        fields,
        indexes,
        paranoid: options.get("paranoid").and_then(Lit::as_bool) == Some(true),
        identity_marker,
        module: None,
    })
}

fn field_decl(name: &str, v: &Lit) -> FieldDecl {
    if v.as_object().is_none() {
        return FieldDecl {
            name: name.to_string(),
            ty: v.text(),
            nullable: true,
            unique: false,
            primary_key: false,
            references: None,
        };
    }
    let primary_key = v.get("primaryKey").and_then(Lit::as_bool) == Some(true);
    let unique = match v.get("unique") {
        Some(Lit::Bool(b)) => *b,
        Some(Lit::Str(_)) => true,
        _ => false,
    };
    let references = match v.get("references") {
        Some(Lit::Str(s)) => Some(s.clone()),
        Some(r @ Lit::Object(_)) => r.get("model").map(Lit::text),
        Some(other) => Some(other.text()),
        None => None,
    };
    FieldDecl {
        name: name.to_string(),
        ty: v.get("type").map(Lit::text).unwrap_or_default(),
        nullable: v
            .get("allowNull")
            .and_then(Lit::as_bool)
            .unwrap_or(!primary_key),
        unique,
        primary_key,
        references,
    }
}

fn index_decl(v: &Lit) -> Option<IndexDecl> {
    let fields: Vec<String> = v
        .get("fields")?
        .as_array()?
        .iter()
        .filter_map(|f| match f {
            Lit::Str(s) => Some(s.clone()),
            Lit::Object(_) => f
                .get("name")
                .or_else(|| f.get("attribute"))
                .and_then(Lit::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect();
    if fields.is_empty() {
        return None;
    }
    Some(IndexDecl {
        fields,
        unique: v.get("unique").and_then(Lit::as_bool) == Some(true),
    })
}

/// `PurchaseOrder` → `purchase_order`.
pub fn snake_case(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PURCHASE_ORDER: &str = r#"
import { DataTypes, Model } from 'sequelize';
import { sequelize } from '../connection';

export class PurchaseOrder extends Model {}

PurchaseOrder.init(
  {
    id: { type: DataTypes.INTEGER, primaryKey: true, autoIncrement: true },
    supplierId: {
      type: DataTypes.INTEGER,
      allowNull: false,
      references: { model: 'supplier', key: 'id' },
    },
    statusSlug: { type: DataTypes.STRING(50), allowNull: false },
    notes: DataTypes.TEXT,
  },
  {
    sequelize,
    tableName: 'purchase_order',
    paranoid: true,
    indexes: [
      { fields: ['supplierId'] },
      { unique: false, fields: ['statusSlug'] },
    ],
  },
);
"#;

    #[test]
    fn test_parse_init_model() {
        let ents = parse_model_file("m/purchase-order.model.ts", PURCHASE_ORDER).unwrap();
        assert_eq!(ents.len(), 1);
        let e = &ents[0];
        assert_eq!(e.table, "purchase_order");
        assert!(e.paranoid);
        assert_eq!(
            e.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["id", "supplierId", "statusSlug", "notes"]
        );
        let id = e.field("id").unwrap();
        assert!(id.primary_key && !id.nullable);
        assert_eq!(e.field("supplierId").unwrap().references.as_deref(), Some("supplier"));
        assert!(e.field("notes").unwrap().nullable);
        assert!(e.is_indexed("supplierId"));
        assert!(e.is_indexed("statusSlug"));
        assert!(!e.is_indexed("notes"));
    }

    #[test]
    fn test_parse_define_and_identity_marker() {
        let src = r#"
// @identity
export const OrderStatus = sequelize.define('order_status', {
  slug: { type: DataTypes.STRING, allowNull: false, unique: true },
  label: DataTypes.STRING,
}, { paranoid: true });
"#;
        let ents = parse_model_file("m/order-status.model.ts", src).unwrap();
        assert_eq!(ents[0].table, "order_status");
        assert!(ents[0].identity_marker);
        assert!(ents[0].has_unique_index_on("slug"));
    }

    #[test]
    fn test_table_name_falls_back_to_snake_case_class() {
        let src = "GoodsReceipt.init({ id: DataTypes.INTEGER }, { sequelize });";
        let ents = parse_model_file("m/goods-receipt.model.ts", src).unwrap();
        assert_eq!(ents[0].table, "goods_receipt");
        assert!(!ents[0].paranoid);
    }

    #[test]
    fn test_file_without_declaration_is_error() {
        assert!(parse_model_file("m/x.model.ts", "export const x = 1;").is_err());
        assert!(parse_model_file("m/y.model.ts", "Y.init({ a: 1 ").is_err());
    }
}
