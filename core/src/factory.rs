//! Model instantiation.
//!
//! Instances are created through the instantiators a model declares on its
//! descriptor, tried in a fixed order: the designated constructor, then the
//! designated factory, then the fallback `Default` constructor.

use std::any::Any;

use tracing::debug;

use crate::error::{MappingError, Result};
use crate::model::{Model, ModelDescriptor};

/// Creates a new instance of `M`.
///
/// # Errors
///
/// Returns [`MappingError::ConstructionError`] if `M` declares no usable
/// instantiator or its factory fails.
pub fn create<M: Model>() -> Result<M> {
    let descriptor = M::descriptor();
    create_boxed(descriptor)?
        .downcast::<M>()
        .map(|boxed| *boxed)
        .map_err(|_| {
            MappingError::ConstructionError(format!(
                "{}: instantiator returned a different type",
                descriptor.type_name()
            ))
        })
}

/// Creates a type-erased instance of the model `descriptor` describes.
pub(crate) fn create_boxed(descriptor: &ModelDescriptor) -> Result<Box<dyn Any>> {
    if let Some(ctor) = descriptor.designated() {
        return Ok(ctor());
    }
    if let Some(factory) = descriptor.factory() {
        return factory().map_err(|reason| {
            debug!(model = descriptor.type_name(), %reason, "Model factory failed");
            MappingError::ConstructionError(format!("{}: {reason}", descriptor.type_name()))
        });
    }
    if let Some(ctor) = descriptor.fallback() {
        return Ok(ctor());
    }
    Err(MappingError::ConstructionError(format!(
        "{}: no instantiator declared",
        descriptor.type_name()
    )))
}
