use super::{Model, ModelOption};
use crate::error::{OrmError, OrmResult};
use crate::reflect::{Reflect, TypeInfo};
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Cache of parsed models keyed by entity type.
///
/// Each type is parsed at most once, also under concurrent first use.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<TypeId, Arc<Model>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the model for `T`, parsing it on first use.
    pub fn get<T: Reflect>(&self) -> OrmResult<Arc<Model>> {
        let key = TypeId::of::<T>();
        {
            let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(model) = models.get(&key) {
                return Ok(Arc::clone(model));
            }
        }

        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        // another caller may have parsed it while we waited for the write lock
        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(parse::<T>()?);
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Parse `T`, apply `options` in order, then cache the result,
    /// replacing any existing entry.
    ///
    /// Nothing is cached if parsing or any option fails.
    pub fn register<T: Reflect>(
        &self,
        options: impl IntoIterator<Item = ModelOption>,
    ) -> OrmResult<Arc<Model>> {
        let mut model = parse::<T>()?;
        for option in options {
            model.apply(option)?;
        }

        let model = Arc::new(model);
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::clone(&model));
        Ok(model)
    }

    /// Number of cached models
    pub fn len(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse<T: Reflect>() -> OrmResult<Model> {
    let info = T::type_info();
    if let TypeInfo::Struct(s) = &info
        && s.type_id != TypeId::of::<T>()
    {
        return Err(OrmError::InvalidModelType);
    }
    let model = Model::parse(info)?;
    tracing::debug!(
        target: "strata.sql",
        entity = type_name::<T>(),
        table = model.table_name(),
        fields = model.fields().len(),
        "parsed model"
    );
    Ok(model)
}
