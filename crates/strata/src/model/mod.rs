//! Table metadata derived from entity types.

mod registry;
mod tag;

pub use registry::Registry;
pub use tag::parse_tag;

use crate::error::{OrmError, OrmResult};
use crate::naming::camel_to_snake;
use crate::reflect::{FieldType, RawAccess, StructInfo, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;

/// Tag key that overrides a field's column name.
pub const TAG_COLUMN: &str = "column";

/// Column metadata for one struct field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub column: String,
    pub ty: FieldType,
    pub offset: usize,
    pub raw: RawAccess,
}

/// Mapping between an entity type and its table.
#[derive(Debug, Clone)]
pub struct Model {
    table_name: String,
    entity_type: TypeId,
    fields: Vec<Field>,
    by_field: HashMap<&'static str, usize>,
    by_column: HashMap<String, usize>,
}

/// Explicit override applied by [`Registry::register`].
#[derive(Debug, Clone)]
pub enum ModelOption {
    TableName(String),
    ColumnName { field: String, column: String },
}

impl ModelOption {
    /// Override the table name.
    pub fn table_name(name: impl Into<String>) -> Self {
        Self::TableName(name.into())
    }

    /// Override the column name of one field.
    pub fn column_name(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnName {
            field: field.into(),
            column: column.into(),
        }
    }
}

impl Model {
    /// Build a model from reflected type metadata.
    ///
    /// Accepts a struct or a single-level pointer to a struct. Models are only
    /// built from [`Reflect`](crate::reflect::Reflect) impls, whose offsets
    /// the pointer resolver trusts.
    pub(crate) fn parse(info: TypeInfo) -> OrmResult<Self> {
        let info = match info {
            TypeInfo::Struct(s) => s,
            TypeInfo::Pointer(inner) => match *inner {
                TypeInfo::Struct(s) => s,
                _ => return Err(OrmError::InvalidModelType),
            },
            TypeInfo::Other(_) => return Err(OrmError::InvalidModelType),
        };
        Self::from_struct(info)
    }

    fn from_struct(info: StructInfo) -> OrmResult<Self> {
        let mut fields = Vec::with_capacity(info.fields.len());
        let mut by_field = HashMap::with_capacity(info.fields.len());
        let mut by_column = HashMap::with_capacity(info.fields.len());

        for fi in info.fields {
            if fi.offset.checked_add(fi.ty.size).is_none_or(|end| end > info.size) {
                return Err(OrmError::InvalidModelType);
            }
            let mut column = None;
            if let Some(tag) = fi.tag {
                let pairs = parse_tag(tag)?;
                column = pairs.get(TAG_COLUMN).cloned();
            }
            let column = column.unwrap_or_else(|| camel_to_snake(fi.name));

            let idx = fields.len();
            if let Some(&other) = by_column.get(&column) {
                let other: &Field = &fields[other];
                return Err(OrmError::InvalidTag(format!(
                    "column {column} is mapped by both {} and {}",
                    other.name, fi.name
                )));
            }
            by_field.insert(fi.name, idx);
            by_column.insert(column.clone(), idx);
            fields.push(Field {
                name: fi.name,
                column,
                ty: fi.ty,
                offset: fi.offset,
                raw: fi.raw,
            });
        }

        let table_name = match info.table_name {
            Some(name) => name.to_string(),
            None => camel_to_snake(info.name),
        };

        Ok(Self {
            table_name,
            entity_type: info.type_id,
            fields,
            by_field,
            by_column,
        })
    }

    /// Apply one registration option.
    pub fn apply(&mut self, option: ModelOption) -> OrmResult<()> {
        match option {
            ModelOption::TableName(name) => {
                if name.is_empty() {
                    return Err(OrmError::InvalidModelOption(
                        "table name must not be empty".to_string(),
                    ));
                }
                self.table_name = name;
            }
            ModelOption::ColumnName { field, column } => {
                if column.is_empty() {
                    return Err(OrmError::InvalidModelOption(format!(
                        "column name for field {field} must not be empty"
                    )));
                }
                let idx = *self
                    .by_field
                    .get(field.as_str())
                    .ok_or_else(|| OrmError::invalid_field(&field))?;
                if let Some(&other) = self.by_column.get(&column)
                    && other != idx
                {
                    return Err(OrmError::InvalidModelOption(format!(
                        "column {column} is mapped by both {} and {field}",
                        self.fields[other].name
                    )));
                }
                let old = std::mem::replace(&mut self.fields[idx].column, column.clone());
                self.by_column.remove(&old);
                self.by_column.insert(column, idx);
            }
        }
        Ok(())
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `TypeId` of the struct this model was parsed from
    pub fn entity_type(&self) -> TypeId {
        self.entity_type
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by its Rust name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_field.get(name).map(|&idx| &self.fields[idx])
    }

    /// Look up a field by its column name.
    pub fn column(&self, column: &str) -> Option<&Field> {
        self.by_column.get(column).map(|&idx| &self.fields[idx])
    }

    /// Like [`Model::field`], failing with `InvalidField`.
    pub fn require_field(&self, name: &str) -> OrmResult<&Field> {
        self.field(name).ok_or_else(|| OrmError::invalid_field(name))
    }
}
