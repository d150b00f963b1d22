use super::{ValueResolver, check_model};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::reflect::Entity;
use crate::value::Value;

/// Resolver backed by [`Entity::read_field`] / [`Entity::write_field`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectResolver;

impl ValueResolver for ReflectResolver {
    fn read_field<E: Entity>(&self, model: &Model, entity: &E, field: &str) -> OrmResult<Value> {
        check_model::<E>(model)?;
        model.require_field(field)?;
        entity
            .read_field(field)
            .ok_or_else(|| OrmError::invalid_field(field))
    }

    fn write_column<E: Entity>(
        &self,
        model: &Model,
        entity: &mut E,
        column: &str,
        value: Value,
    ) -> OrmResult<()> {
        check_model::<E>(model)?;
        let Some(field) = model.column(column) else {
            return Ok(());
        };
        match entity.write_field(field.name, value) {
            Some(result) => result.map_err(|message| OrmError::decode(column, message)),
            None => Err(OrmError::invalid_field(field.name)),
        }
    }
}
