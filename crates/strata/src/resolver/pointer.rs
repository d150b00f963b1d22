use super::{ValueResolver, check_model};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::reflect::Entity;
use crate::value::Value;

/// Resolver that reads and writes fields through their byte offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerResolver;

impl ValueResolver for PointerResolver {
    fn read_field<E: Entity>(&self, model: &Model, entity: &E, field: &str) -> OrmResult<Value> {
        check_model::<E>(model)?;
        let field = model.require_field(field)?;
        let base = (entity as *const E).cast::<u8>();
        // SAFETY: the model was parsed from `E` (checked above), so `offset`
        // came from `offset_of!` on `E` and `raw` was built for that field's
        // type. `entity` is a live shared reference.
        let value = unsafe { field.raw.read(base.add(field.offset)) };
        Ok(value)
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
        let base = (entity as *mut E).cast::<u8>();
        // SAFETY: as in `read_field`; `entity` is a unique reference so the
        // write cannot alias.
        unsafe { field.raw.write(base.add(field.offset), value) }
            .map_err(|message| OrmError::decode(column, message))
    }
}
