//! Flat-name to field-path resolution.
//!
//! A camelCase flat name such as `addressUserProfileAvatarUrl` is resolved
//! against a model descriptor by trying, in order, a direct field match and
//! then every proper word prefix that names a nested model field, descending
//! with the remainder. The route is a property of the types alone; found
//! routes are cached on the root descriptor, misses are not.
//!
//! Resolving against an instance ([`resolve`]) additionally decides, for
//! every nested hop, whether the nested object already exists. Missing ones
//! are created up front but kept detached inside the returned [`FieldTuple`];
//! nothing reaches the object graph until [`FieldTuple::settle`] runs, and a
//! tuple that is dropped instead leaves the graph exactly as it was.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::factory;
use crate::model::{FieldDescriptor, ModelDescriptor};
use crate::naming::{decapitalize, word_boundaries};
use crate::value::Value;

/// A class-level path from a root model to a value field.
#[derive(Debug, Clone)]
pub struct FieldRoute {
    hops: Vec<&'static FieldDescriptor>,
    leaf: &'static FieldDescriptor,
}

impl FieldRoute {
    /// The nested model fields walked through, outermost first.
    pub fn hops(&self) -> &[&'static FieldDescriptor] {
        &self.hops
    }

    /// The value field at the end of the route.
    pub fn leaf(&self) -> &'static FieldDescriptor {
        self.leaf
    }

    /// Dotted field path, e.g. `address.userProfile.avatarUrl`.
    pub fn path(&self) -> String {
        let mut parts: Vec<&str> = self.hops.iter().map(|f| f.name()).collect();
        parts.push(self.leaf.name());
        parts.join(".")
    }
}

/// Finds the route for `flat_name` under `descriptor`, using the cache.
pub fn route(descriptor: &'static ModelDescriptor, flat_name: &str) -> Option<Arc<FieldRoute>> {
    if let Some(cached) = descriptor.cached_route(flat_name) {
        return Some(cached);
    }
    let found = find_route(descriptor, flat_name).map(Arc::new);
    trace!(
        model = descriptor.type_name(),
        name = flat_name,
        found = found.is_some(),
        "Resolved field route"
    );
    if let Some(route) = &found {
        descriptor.cache_route(flat_name, Arc::clone(route));
    }
    found
}

fn find_route(descriptor: &'static ModelDescriptor, flat_name: &str) -> Option<FieldRoute> {
    if let Some(field) = descriptor.field(flat_name) {
        if !field.is_nested() && !field.is_leftover() {
            return Some(FieldRoute {
                hops: Vec::new(),
                leaf: field,
            });
        }
    }

    for end in word_boundaries(flat_name) {
        let Some(field) = descriptor.field(&flat_name[..end]) else {
            continue;
        };
        let Some(nested) = field.nested_descriptor() else {
            continue;
        };
        let remainder = decapitalize(&flat_name[end..]);
        if let Some(mut inner) = find_route(nested, &remainder) {
            inner.hops.insert(0, field);
            return Some(inner);
        }
    }
    None
}

enum Hop {
    /// The nested object is already attached to its owner.
    Existing(&'static FieldDescriptor),
    /// A fresh nested object, attached by `settle`.
    Pending(&'static FieldDescriptor, Box<dyn Any>),
}

impl Hop {
    fn field(&self) -> &'static FieldDescriptor {
        match self {
            Hop::Existing(field) | Hop::Pending(field, _) => *field,
        }
    }
}

/// A resolved field together with the nested objects that must be attached
/// to reach it.
pub struct FieldTuple {
    route: Arc<FieldRoute>,
    hops: Vec<Hop>,
}

impl FieldTuple {
    /// The value field the route ends at.
    pub fn field(&self) -> &'static FieldDescriptor {
        self.route.leaf
    }

    pub fn route(&self) -> &FieldRoute {
        &self.route
    }

    /// Number of nested objects this tuple will attach on settle.
    pub fn pending(&self) -> usize {
        self.hops
            .iter()
            .filter(|h| matches!(h, Hop::Pending(..)))
            .count()
    }

    /// Writes `value` into the leaf and attaches every pending nested
    /// object, innermost first.
    ///
    /// # Errors
    ///
    /// Returns the field's conversion error if `value` does not fit the leaf
    /// type. In that case no pending object has been attached yet.
    pub fn settle(self, root: &mut dyn Any, value: Value) -> Result<()> {
        commit(root, self.hops.into_iter(), self.route.leaf, value)
    }
}

impl fmt::Debug for FieldTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTuple")
            .field("path", &self.route.path())
            .field("pending", &self.pending())
            .finish()
    }
}

fn commit(
    owner: &mut dyn Any,
    mut hops: std::vec::IntoIter<Hop>,
    leaf: &'static FieldDescriptor,
    value: Value,
) -> Result<()> {
    match hops.next() {
        None => leaf.write(owner, value),
        Some(Hop::Existing(field)) => {
            let nested = field
                .nested_mut(owner)?
                .ok_or_else(|| field.access_error("nested object disappeared before settle"))?;
            commit(nested, hops, leaf, value)
        }
        Some(Hop::Pending(field, mut instance)) => {
            commit(instance.as_mut(), hops, leaf, value)?;
            field.attach(owner, instance)
        }
    }
}

/// Resolves `flat_name` against a live instance.
///
/// Returns `Ok(None)` when no field matches at any depth. Nested objects
/// missing along the route are constructed through the model's
/// instantiator but not attached.
///
/// # Errors
///
/// Returns [`ConstructionError`](crate::MappingError::ConstructionError) if a missing nested object
/// cannot be constructed.
pub fn resolve(
    root: &dyn Any,
    descriptor: &'static ModelDescriptor,
    flat_name: &str,
) -> Result<Option<FieldTuple>> {
    let Some(route) = route(descriptor, flat_name) else {
        return Ok(None);
    };

    let mut hops: Vec<Hop> = Vec::with_capacity(route.hops.len());
    for &field in &route.hops {
        let exists = {
            let owner = current_owner(root, &hops)?;
            field.nested_ref(owner)?.is_some()
        };
        if exists {
            hops.push(Hop::Existing(field));
        } else {
            let nested = field
                .nested_descriptor()
                .ok_or_else(|| field.access_error("not a nested field"))?;
            hops.push(Hop::Pending(field, factory::create_boxed(nested)?));
        }
    }

    Ok(Some(FieldTuple { route, hops }))
}

/// The object the next hop starts from: the last pending instance (or the
/// root), followed down through the existing hops after it.
fn current_owner<'a>(root: &'a dyn Any, hops: &'a [Hop]) -> Result<&'a dyn Any> {
    let last_pending = hops.iter().rposition(|h| matches!(h, Hop::Pending(..)));
    let (mut owner, rest): (&dyn Any, &[Hop]) = match last_pending.map(|i| (i, &hops[i])) {
        Some((i, Hop::Pending(_, instance))) => (instance.as_ref(), &hops[i + 1..]),
        _ => (root, hops),
    };
    for hop in rest {
        let field = hop.field();
        owner = field
            .nested_ref(owner)?
            .ok_or_else(|| field.access_error("expected nested object is missing"))?;
    }
    Ok(owner)
}

/// Read-only resolution for the write path.
///
/// Returns `Ok(None)` when nothing matches; otherwise the leaf field and its
/// current value, which is `None` when the field or any nested object on the
/// way holds nothing.
pub fn lookup(
    root: &dyn Any,
    descriptor: &'static ModelDescriptor,
    flat_name: &str,
) -> Result<Option<(&'static FieldDescriptor, Option<Value>)>> {
    let Some(route) = route(descriptor, flat_name) else {
        return Ok(None);
    };
    let mut owner = root;
    for field in &route.hops {
        match field.nested_ref(owner)? {
            Some(nested) => owner = nested,
            None => return Ok(Some((route.leaf, None))),
        }
    }
    Ok(Some((route.leaf, route.leaf.read(owner)?)))
}
