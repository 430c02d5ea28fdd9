//! Type-erased field accessors.
//!
//! A descriptor stores one accessor per field. Each is built from a pair of
//! plain function pointers (`fn(&M) -> &T`, `fn(&mut M) -> &mut T`) and
//! works on `&dyn Any` owners, so the resolver can walk a model graph
//! without knowing the concrete types on the way. A `None` result always
//! means the owner was not of the accessor's model type.

use std::any::Any;

use super::{LeftoverMap, Model};
use crate::error::Result;
use crate::value::Value;

/// A typed value that can live in a model field.
pub trait FieldValue: Sized {
    /// The declared type converters target when writing this field.
    fn value_type() -> crate::value::ValueType;

    /// Reads the field as a dynamic value; `Value::Null` means "no value".
    fn to_value(&self) -> Result<Value>;

    /// Builds the field from a converted value.
    fn from_value(value: Value) -> Result<Self>;
}

/// A field slot holding an optional nested model.
///
/// Implemented for `Option<N>`. Boxed slots (`Option<Box<N>>`, what
/// self-referencing models use) are declared with
/// [`nested_boxed`](super::ModelDescriptorBuilder::nested_boxed) instead.
pub trait NestedSlot: 'static {
    type Target: Model;

    fn nested(&self) -> Option<&Self::Target>;
    fn nested_mut(&mut self) -> Option<&mut Self::Target>;
    fn attach(&mut self, value: Self::Target);
}

impl<N: Model> NestedSlot for Option<N> {
    type Target = N;

    fn nested(&self) -> Option<&N> {
        self.as_ref()
    }

    fn nested_mut(&mut self) -> Option<&mut N> {
        self.as_mut()
    }

    fn attach(&mut self, value: N) {
        *self = Some(value);
    }
}

/// A field slot that receives unclaimed columns.
pub trait LeftoverSlot: 'static {
    fn leftovers(&self) -> Option<&LeftoverMap>;
    fn store(&mut self, map: LeftoverMap);
}

impl LeftoverSlot for LeftoverMap {
    fn leftovers(&self) -> Option<&LeftoverMap> {
        Some(self)
    }

    fn store(&mut self, map: LeftoverMap) {
        *self = map;
    }
}

impl LeftoverSlot for Option<LeftoverMap> {
    fn leftovers(&self) -> Option<&LeftoverMap> {
        self.as_ref()
    }

    fn store(&mut self, map: LeftoverMap) {
        *self = Some(map);
    }
}

pub(crate) trait ValueAccess: Send + Sync {
    fn read(&self, owner: &dyn Any) -> Option<Result<Value>>;
    fn write(&self, owner: &mut dyn Any, value: Value) -> Option<Result<()>>;
}

pub(crate) trait NestedAccess: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<Option<&'a dyn Any>>;
    fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>>;
    /// Returns `false` if either the owner or the instance has the wrong type.
    fn attach(&self, owner: &mut dyn Any, instance: Box<dyn Any>) -> bool;
}

pub(crate) trait LeftoverAccess: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<Option<&'a LeftoverMap>>;
    fn store(&self, owner: &mut dyn Any, map: LeftoverMap) -> bool;
}

pub(crate) struct Lens<M, T> {
    pub(crate) get: fn(&M) -> &T,
    pub(crate) get_mut: fn(&mut M) -> &mut T,
}

impl<M: 'static, T: FieldValue + 'static> ValueAccess for Lens<M, T> {
    fn read(&self, owner: &dyn Any) -> Option<Result<Value>> {
        owner.downcast_ref::<M>().map(|m| (self.get)(m).to_value())
    }

    fn write(&self, owner: &mut dyn Any, value: Value) -> Option<Result<()>> {
        let m = owner.downcast_mut::<M>()?;
        Some(T::from_value(value).map(|v| *(self.get_mut)(m) = v))
    }
}

impl<M: 'static, S: NestedSlot> NestedAccess for Lens<M, S> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let m = owner.downcast_ref::<M>()?;
        Some((self.get)(m).nested().map(|n| n as &dyn Any))
    }

    fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let m = owner.downcast_mut::<M>()?;
        Some((self.get_mut)(m).nested_mut().map(|n| n as &mut dyn Any))
    }

    fn attach(&self, owner: &mut dyn Any, instance: Box<dyn Any>) -> bool {
        let Some(m) = owner.downcast_mut::<M>() else {
            return false;
        };
        match instance.downcast::<S::Target>() {
            Ok(nested) => {
                (self.get_mut)(m).attach(*nested);
                true
            }
            Err(_) => false,
        }
    }
}

pub(crate) struct BoxedLens<M, N> {
    pub(crate) get: fn(&M) -> &Option<Box<N>>,
    pub(crate) get_mut: fn(&mut M) -> &mut Option<Box<N>>,
}

impl<M: 'static, N: Model> NestedAccess for BoxedLens<M, N> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let m = owner.downcast_ref::<M>()?;
        Some((self.get)(m).as_deref().map(|n| n as &dyn Any))
    }

    fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let m = owner.downcast_mut::<M>()?;
        Some((self.get_mut)(m).as_deref_mut().map(|n| n as &mut dyn Any))
    }

    fn attach(&self, owner: &mut dyn Any, instance: Box<dyn Any>) -> bool {
        let Some(m) = owner.downcast_mut::<M>() else {
            return false;
        };
        match instance.downcast::<N>() {
            Ok(nested) => {
                *(self.get_mut)(m) = Some(nested);
                true
            }
            Err(_) => false,
        }
    }
}

pub(crate) struct LeftoverLens<M, S> {
    pub(crate) get: fn(&M) -> &S,
    pub(crate) get_mut: fn(&mut M) -> &mut S,
}

impl<M: 'static, S: LeftoverSlot> LeftoverAccess for LeftoverLens<M, S> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<Option<&'a LeftoverMap>> {
        owner.downcast_ref::<M>().map(|m| (self.get)(m).leftovers())
    }

    fn store(&self, owner: &mut dyn Any, map: LeftoverMap) -> bool {
        match owner.downcast_mut::<M>() {
            Some(m) => {
                (self.get_mut)(m).store(map);
                true
            }
            None => false,
        }
    }
}
