//! Value resolvers: move values between entity fields and row columns.
//!
//! Two interchangeable strategies produce identical results:
//!
//! - [`ReflectResolver`] goes through the derive-generated by-name accessors.
//! - [`PointerResolver`] writes straight to precomputed field offsets.

mod pointer;
mod reflect;

pub use pointer::PointerResolver;
pub use reflect::ReflectResolver;

use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::reflect::Entity;
use crate::session::Row;
use crate::value::Value;

/// Reads and writes entity fields for a given model.
pub trait ValueResolver {
    /// Read one field by its Rust name.
    fn read_field<E: Entity>(&self, model: &Model, entity: &E, field: &str) -> OrmResult<Value>;

    /// Write one value into the field mapped to `column`.
    ///
    /// Unmapped columns are ignored.
    fn write_column<E: Entity>(
        &self,
        model: &Model,
        entity: &mut E,
        column: &str,
        value: Value,
    ) -> OrmResult<()>;

    /// Write every mapped column of `row`.
    ///
    /// A column the driver could not decode only fails if it is mapped.
    fn write_row<E: Entity>(&self, model: &Model, entity: &mut E, row: &Row) -> OrmResult<()> {
        for (idx, (column, value)) in row.iter().enumerate() {
            if let Some(reason) = row.undecodable(idx) {
                if model.column(column).is_some() {
                    return Err(OrmError::decode(column, reason));
                }
                continue;
            }
            self.write_column(model, entity, column, value.clone())?;
        }
        Ok(())
    }
}

/// Resolver selection for a [`Db`](crate::Db).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
    Reflect,
    #[default]
    Pointer,
}

impl ValueResolver for ResolverKind {
    fn read_field<E: Entity>(&self, model: &Model, entity: &E, field: &str) -> OrmResult<Value> {
        match self {
            ResolverKind::Reflect => ReflectResolver.read_field(model, entity, field),
            ResolverKind::Pointer => PointerResolver.read_field(model, entity, field),
        }
    }

    fn write_column<E: Entity>(
        &self,
        model: &Model,
        entity: &mut E,
        column: &str,
        value: Value,
    ) -> OrmResult<()> {
        match self {
            ResolverKind::Reflect => ReflectResolver.write_column(model, entity, column, value),
            ResolverKind::Pointer => PointerResolver.write_column(model, entity, column, value),
        }
    }
}

/// Decode every row of a result into fresh entities.
pub fn decode_rows<E: Entity>(
    resolver: &impl ValueResolver,
    model: &Model,
    rows: impl IntoIterator<Item = Row>,
) -> OrmResult<Vec<E>> {
    rows.into_iter()
        .map(|row| {
            let mut entity = E::default();
            resolver.write_row(model, &mut entity, &row)?;
            Ok(entity)
        })
        .collect()
}

fn check_model<E: Entity>(model: &Model) -> OrmResult<()> {
    if model.entity_type() == std::any::TypeId::of::<E>() {
        Ok(())
    } else {
        Err(OrmError::InvalidModelType)
    }
}
