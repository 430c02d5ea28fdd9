//! Model descriptors.
//!
//! A model type describes itself once, through [`ModelDescriptorBuilder`],
//! and the engine works from that precomputed description: field names and
//! declared types, which fields are nested models, which field collects
//! leftovers, and how to construct an instance. Descriptors are built lazily
//! and cached for the life of the process.
//!
//! # Example
//!
//! ```
//! use std::sync::OnceLock;
//! use rowbind_core::{Model, ModelDescriptor};
//!
//! #[derive(Debug, Default)]
//! struct Address {
//!     city: Option<String>,
//! }
//!
//! impl Model for Address {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .field("city", |a| &a.city, |a| &mut a.city)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("Address descriptor is valid")
//!         })
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     name: Option<String>,
//!     address: Option<Address>,
//! }
//!
//! impl Model for User {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
//!         DESCRIPTOR.get_or_init(|| {
//!             ModelDescriptor::builder::<Self>()
//!                 .field("name", |u| &u.name, |u| &mut u.name)
//!                 .nested("address", |u| &u.address, |u| &mut u.address)
//!                 .default_constructor()
//!                 .build()
//!                 .expect("User descriptor is valid")
//!         })
//!     }
//! }
//!
//! let descriptor = User::descriptor();
//! assert!(descriptor.field("name").is_some());
//! assert!(descriptor.field("address").unwrap().is_nested());
//! ```

mod access;
mod field_value;

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

pub use access::{FieldValue, LeftoverSlot, NestedSlot};
pub use field_value::Json;

use access::{BoxedLens, LeftoverAccess, LeftoverLens, Lens, NestedAccess, ValueAccess};

use crate::error::{MappingError, Result};
use crate::naming::{self, CaseStyle};
use crate::resolve::FieldRoute;
use crate::row::ColumnDef;
use crate::value::{Value, ValueType};

/// Columns nobody claimed, keyed by camelCase column name.
pub type LeftoverMap = HashMap<String, Value>;

/// Most flat names whose routes one descriptor remembers.
pub(crate) const ROUTE_CACHE_CAPACITY: usize = 1024;

/// A type that rows can be mapped onto.
pub trait Model: Any + Sized {
    /// The cached descriptor of this type.
    fn descriptor() -> &'static ModelDescriptor;

    /// Called once per mapped instance, after all fields and leftovers have
    /// been assigned.
    fn post_mapping(&mut self) {}
}

type Constructor = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type Factory = Box<dyn Fn() -> std::result::Result<Box<dyn Any>, String> + Send + Sync>;

pub(crate) struct ScalarSupport {
    pub(crate) value_type: ValueType,
    pub(crate) from_value: fn(Value) -> Result<Box<dyn Any>>,
}

fn scalar_from_value<T: FieldValue + 'static>(value: Value) -> Result<Box<dyn Any>> {
    T::from_value(value).map(|v| Box::new(v) as Box<dyn Any>)
}

pub(crate) enum FieldKind {
    Value(Box<dyn ValueAccess>),
    Nested {
        descriptor: fn() -> &'static ModelDescriptor,
        access: Box<dyn NestedAccess>,
    },
    Leftover(Box<dyn LeftoverAccess>),
}

/// One field of a model.
pub struct FieldDescriptor {
    owner: &'static str,
    name: String,
    value_type: ValueType,
    transient: bool,
    immutable: bool,
    kind: FieldKind,
}

impl FieldDescriptor {
    /// The camelCase name the field is looked up by.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Transient fields are never written to rows.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Immutable fields are not written by updates.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Nested { .. })
    }

    pub fn is_leftover(&self) -> bool {
        matches!(self.kind, FieldKind::Leftover(_))
    }

    /// Descriptor of the nested model type, for nested fields.
    pub fn nested_descriptor(&self) -> Option<&'static ModelDescriptor> {
        match &self.kind {
            FieldKind::Nested { descriptor, .. } => Some(descriptor()),
            _ => None,
        }
    }

    pub(crate) fn access_error(&self, reason: &str) -> MappingError {
        MappingError::field_access(self.owner, &self.name, reason)
    }

    /// Reads a value field; `None` when the field holds no value.
    pub(crate) fn read(&self, owner: &dyn Any) -> Result<Option<Value>> {
        let FieldKind::Value(access) = &self.kind else {
            return Err(self.access_error("not a value field"));
        };
        let value = access
            .read(owner)
            .ok_or_else(|| self.access_error("owner has the wrong type"))??;
        Ok((!value.is_null()).then_some(value))
    }

    pub(crate) fn write(&self, owner: &mut dyn Any, value: Value) -> Result<()> {
        let FieldKind::Value(access) = &self.kind else {
            return Err(self.access_error("not a value field"));
        };
        access
            .write(owner, value)
            .ok_or_else(|| self.access_error("owner has the wrong type"))?
    }

    fn nested_access(&self) -> Result<&dyn NestedAccess> {
        match &self.kind {
            FieldKind::Nested { access, .. } => Ok(access.as_ref()),
            _ => Err(self.access_error("not a nested field")),
        }
    }

    pub(crate) fn nested_ref<'a>(&self, owner: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        self.nested_access()?
            .get(owner)
            .ok_or_else(|| self.access_error("owner has the wrong type"))
    }

    pub(crate) fn nested_mut<'a>(
        &self,
        owner: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>> {
        self.nested_access()?
            .get_mut(owner)
            .ok_or_else(|| self.access_error("owner has the wrong type"))
    }

    pub(crate) fn attach(&self, owner: &mut dyn Any, instance: Box<dyn Any>) -> Result<()> {
        if self.nested_access()?.attach(owner, instance) {
            Ok(())
        } else {
            Err(self.access_error("nested instance has the wrong type"))
        }
    }

    pub(crate) fn leftovers<'a>(&self, owner: &'a dyn Any) -> Result<Option<&'a LeftoverMap>> {
        let FieldKind::Leftover(access) = &self.kind else {
            return Err(self.access_error("not a leftover collector"));
        };
        access
            .get(owner)
            .ok_or_else(|| self.access_error("owner has the wrong type"))
    }

    pub(crate) fn store_leftovers(&self, owner: &mut dyn Any, map: LeftoverMap) -> Result<()> {
        let FieldKind::Leftover(access) = &self.kind else {
            return Err(self.access_error("not a leftover collector"));
        };
        if access.store(owner, map) {
            Ok(())
        } else {
            Err(self.access_error("owner has the wrong type"))
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.kind {
            FieldKind::Value(_) => "value",
            FieldKind::Nested { .. } => "nested",
            FieldKind::Leftover(_) => "leftover",
        };
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("role", &role)
            .field("transient", &self.transient)
            .field("immutable", &self.immutable)
            .finish()
    }
}

/// The precomputed description of a model type.
pub struct ModelDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    leftover: Option<usize>,
    designated: Option<Constructor>,
    factory: Option<Factory>,
    fallback: Option<Constructor>,
    scalar: Option<ScalarSupport>,
    routes: RwLock<HashMap<String, Arc<FieldRoute>>>,
}

impl ModelDescriptor {
    /// Starts describing model type `M`.
    pub fn builder<M: Model>() -> ModelDescriptorBuilder<M> {
        ModelDescriptorBuilder {
            fields: Vec::new(),
            designated: None,
            factory: None,
            fallback: None,
            _model: PhantomData,
        }
    }

    /// Descriptor for a scalar type mapped from single-column rows.
    fn scalar<T: FieldValue + 'static>() -> Self {
        ModelDescriptor {
            type_name: type_name::<T>(),
            fields: Vec::new(),
            index: HashMap::new(),
            leftover: None,
            designated: None,
            factory: None,
            fallback: None,
            scalar: Some(ScalarSupport {
                value_type: T::value_type(),
                from_value: scalar_from_value::<T>,
            }),
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by its exact camelCase name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// The field collecting unclaimed columns, if the model declares one.
    pub fn leftover_field(&self) -> Option<&FieldDescriptor> {
        self.leftover.map(|i| &self.fields[i])
    }

    /// `true` for the built-in scalar models (`i64`, `String`, ...).
    pub fn is_scalar(&self) -> bool {
        self.scalar.is_some()
    }

    pub(crate) fn scalar_support(&self) -> Option<&ScalarSupport> {
        self.scalar.as_ref()
    }

    pub(crate) fn designated(&self) -> Option<&Constructor> {
        self.designated.as_ref()
    }

    pub(crate) fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub(crate) fn fallback(&self) -> Option<&Constructor> {
        self.fallback.as_ref()
    }

    pub(crate) fn cached_route(&self, flat_name: &str) -> Option<Arc<FieldRoute>> {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.get(flat_name).cloned()
    }

    /// Remembers a found route. Once [`ROUTE_CACHE_CAPACITY`] names are
    /// cached, further routes are resolved on every call instead.
    pub(crate) fn cache_route(&self, flat_name: &str, route: Arc<FieldRoute>) {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        if routes.len() < ROUTE_CACHE_CAPACITY {
            routes.insert(flat_name.to_string(), route);
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_route_count(&self) -> usize {
        self.routes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Flattened column list for this model, named in `style`.
    ///
    /// Value fields become one column each; nested model fields contribute
    /// their own columns under the field's name as prefix. Transient fields
    /// and the leftover collector are skipped, as is any nested type already
    /// on the current path.
    pub fn columns(&self, style: CaseStyle) -> Vec<ColumnDef> {
        let mut out = Vec::new();
        let mut path = vec![self.type_name];
        self.collect_columns(style, "", &mut path, &mut out);
        out
    }

    fn collect_columns(
        &self,
        style: CaseStyle,
        prefix: &str,
        path: &mut Vec<&'static str>,
        out: &mut Vec<ColumnDef>,
    ) {
        for field in &self.fields {
            if field.transient {
                continue;
            }
            let flat = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}{}", naming::capitalize(&field.name))
            };
            match &field.kind {
                FieldKind::Value(_) => {
                    let declared = match &field.value_type {
                        ValueType::Document(_) | ValueType::Map => ValueType::Json,
                        other => other.clone(),
                    };
                    out.push(ColumnDef::new(naming::from_camel(style, &flat), declared));
                }
                FieldKind::Nested { descriptor, .. } => {
                    let nested = descriptor();
                    if path.contains(&nested.type_name) {
                        continue;
                    }
                    path.push(nested.type_name);
                    nested.collect_columns(style, &flat, path, out);
                    path.pop();
                }
                FieldKind::Leftover(_) => {}
            }
        }
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("designated", &self.designated.is_some())
            .field("factory", &self.factory.is_some())
            .field("fallback", &self.fallback.is_some())
            .field("scalar", &self.scalar.is_some())
            .finish()
    }
}

/// Builds a [`ModelDescriptor`] for `M`.
///
/// Field names are given as Rust identifiers; `birth_date` is looked up as
/// `birthDate`.
pub struct ModelDescriptorBuilder<M> {
    fields: Vec<FieldDescriptor>,
    designated: Option<Constructor>,
    factory: Option<Factory>,
    fallback: Option<Constructor>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ModelDescriptorBuilder<M> {
    fn push(
        mut self,
        name: &str,
        value_type: ValueType,
        kind: FieldKind,
        transient: bool,
        immutable: bool,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            owner: type_name::<M>(),
            name: naming::field_name(name),
            value_type,
            transient,
            immutable,
            kind,
        });
        self
    }

    fn value_kind<T: FieldValue + 'static>(
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> FieldKind {
        FieldKind::Value(Box::new(Lens { get, get_mut }))
    }

    /// Declares a value field.
    pub fn field<T: FieldValue + 'static>(
        self,
        name: &str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self {
        let kind = Self::value_kind(get, get_mut);
        self.push(name, T::value_type(), kind, false, false)
    }

    /// Declares a value field that is mapped from rows but never written to
    /// them.
    pub fn transient_field<T: FieldValue + 'static>(
        self,
        name: &str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self {
        let kind = Self::value_kind(get, get_mut);
        self.push(name, T::value_type(), kind, true, false)
    }

    /// Declares a value field that inserts write but updates skip.
    pub fn immutable_field<T: FieldValue + 'static>(
        self,
        name: &str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self {
        let kind = Self::value_kind(get, get_mut);
        self.push(name, T::value_type(), kind, false, true)
    }

    /// Declares a nested model field held in an `Option<N>`.
    pub fn nested<S: NestedSlot>(
        self,
        name: &str,
        get: fn(&M) -> &S,
        get_mut: fn(&mut M) -> &mut S,
    ) -> Self {
        let kind = FieldKind::Nested {
            descriptor: <S::Target as Model>::descriptor,
            access: Box::new(Lens { get, get_mut }),
        };
        self.push(
            name,
            ValueType::Model(type_name::<S::Target>()),
            kind,
            false,
            false,
        )
    }

    /// Declares a nested model field held in an `Option<Box<N>>`.
    pub fn nested_boxed<N: Model>(
        self,
        name: &str,
        get: fn(&M) -> &Option<Box<N>>,
        get_mut: fn(&mut M) -> &mut Option<Box<N>>,
    ) -> Self {
        let kind = FieldKind::Nested {
            descriptor: N::descriptor,
            access: Box::new(BoxedLens { get, get_mut }),
        };
        self.push(name, ValueType::Model(type_name::<N>()), kind, false, false)
    }

    /// Declares the field that collects unclaimed columns.
    pub fn leftover<S: LeftoverSlot>(
        self,
        name: &str,
        get: fn(&M) -> &S,
        get_mut: fn(&mut M) -> &mut S,
    ) -> Self {
        let kind = FieldKind::Leftover(Box::new(LeftoverLens { get, get_mut }));
        self.push(name, ValueType::Map, kind, false, false)
    }

    /// Designated constructor; preferred over every other way of creating
    /// an instance.
    pub fn instantiator(mut self, ctor: fn() -> M) -> Self {
        self.designated = Some(Box::new(move || Box::new(ctor()) as Box<dyn Any>));
        self
    }

    /// Designated factory, used when no designated constructor is declared.
    /// An `Err` aborts mapping with a construction error.
    pub fn factory(mut self, factory: fn() -> std::result::Result<M, String>) -> Self {
        self.factory = Some(Box::new(move || {
            factory().map(|m| Box::new(m) as Box<dyn Any>)
        }));
        self
    }

    /// Falls back to `M::default()` when nothing designated is declared.
    pub fn default_constructor(mut self) -> Self
    where
        M: Default,
    {
        self.fallback = Some(Box::new(|| Box::new(M::default()) as Box<dyn Any>));
        self
    }

    /// Finishes the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidModel`] if two fields share a name or
    /// more than one leftover collector is declared.
    pub fn build(self) -> Result<ModelDescriptor> {
        let owner = type_name::<M>();
        let mut index = HashMap::with_capacity(self.fields.len());
        let mut leftover = None;
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(MappingError::InvalidModel(format!(
                    "{owner} declares field '{}' twice",
                    field.name
                )));
            }
            if field.is_leftover() && leftover.replace(i).is_some() {
                return Err(MappingError::InvalidModel(format!(
                    "{owner} declares more than one leftover collector"
                )));
            }
        }

        Ok(ModelDescriptor {
            type_name: owner,
            fields: self.fields,
            index,
            leftover,
            designated: self.designated,
            factory: self.factory,
            fallback: self.fallback,
            scalar: None,
            routes: RwLock::new(HashMap::new()),
        })
    }
}

macro_rules! scalar_model {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Model for $ty {
                fn descriptor() -> &'static ModelDescriptor {
                    static DESCRIPTOR: OnceLock<ModelDescriptor> = OnceLock::new();
                    DESCRIPTOR.get_or_init(ModelDescriptor::scalar::<$ty>)
                }
            }
        )*
    };
}

scalar_model!(
    bool,
    i32,
    i64,
    f32,
    f64,
    Decimal,
    String,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Inner {
        code: Option<String>,
    }

    impl Model for Inner {
        fn descriptor() -> &'static ModelDescriptor {
            static D: OnceLock<ModelDescriptor> = OnceLock::new();
            D.get_or_init(|| {
                ModelDescriptor::builder::<Self>()
                    .field("code", |m| &m.code, |m| &mut m.code)
                    .default_constructor()
                    .build()
                    .unwrap()
            })
        }
    }

    #[derive(Debug, Default)]
    struct Node {
        label: Option<String>,
        secret: Option<String>,
        inner: Option<Inner>,
        next: Option<Box<Node>>,
        extras: Option<LeftoverMap>,
    }

    impl Model for Node {
        fn descriptor() -> &'static ModelDescriptor {
            static D: OnceLock<ModelDescriptor> = OnceLock::new();
            D.get_or_init(|| {
                ModelDescriptor::builder::<Self>()
                    .field("label", |m| &m.label, |m| &mut m.label)
                    .transient_field("secret", |m| &m.secret, |m| &mut m.secret)
                    .nested("inner", |m| &m.inner, |m| &mut m.inner)
                    .nested_boxed("next", |m| &m.next, |m| &mut m.next)
                    .leftover("extras", |m| &m.extras, |m| &mut m.extras)
                    .default_constructor()
                    .build()
                    .unwrap()
            })
        }
    }

    #[test]
    fn test_field_lookup_and_roles() {
        let d = Node::descriptor();
        assert_eq!(d.fields().len(), 5);
        assert!(d.field("label").is_some());
        assert!(d.field("inner").unwrap().is_nested());
        assert_eq!(
            d.field("inner").unwrap().value_type(),
            &ValueType::Model(type_name::<Inner>())
        );
        assert_eq!(d.leftover_field().unwrap().name(), "extras");
        assert!(d.field("secret").unwrap().is_transient());
        assert!(d.field("missing").is_none());
    }

    #[test]
    fn test_snake_identifiers_become_camel_names() {
        #[derive(Default)]
        struct Snake {
            avatar_url: Option<String>,
        }
        impl Model for Snake {
            fn descriptor() -> &'static ModelDescriptor {
                static D: OnceLock<ModelDescriptor> = OnceLock::new();
                D.get_or_init(|| {
                    ModelDescriptor::builder::<Self>()
                        .field("avatar_url", |m| &m.avatar_url, |m| &mut m.avatar_url)
                        .build()
                        .unwrap()
                })
            }
        }
        assert!(Snake::descriptor().field("avatarUrl").is_some());
        assert!(Snake::descriptor().field("avatar_url").is_none());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = ModelDescriptor::builder::<Inner>()
            .field("code", |m| &m.code, |m| &mut m.code)
            .field("code", |m| &m.code, |m| &mut m.code)
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidModel(_)));
    }

    #[test]
    fn test_second_leftover_rejected() {
        let err = ModelDescriptor::builder::<Node>()
            .leftover("extras", |m| &m.extras, |m| &mut m.extras)
            .leftover("more", |m| &m.extras, |m| &mut m.extras)
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidModel(_)));
    }

    #[test]
    fn test_read_write_through_descriptor() {
        let mut node = Node::default();
        let field = Node::descriptor().field("label").unwrap();
        assert_eq!(field.read(&node).unwrap(), None);

        field.write(&mut node, Value::Text("root".into())).unwrap();
        assert_eq!(node.label.as_deref(), Some("root"));
        assert_eq!(
            field.read(&node).unwrap(),
            Some(Value::Text("root".into()))
        );
    }

    #[test]
    fn test_wrong_owner_is_field_access_error() {
        let inner = Inner::default();
        let field = Node::descriptor().field("label").unwrap();
        assert!(matches!(
            field.read(&inner),
            Err(MappingError::FieldAccessError { .. })
        ));
    }

    #[test]
    fn test_attach_nested_instance() {
        let mut node = Node::default();
        let field = Node::descriptor().field("inner").unwrap();
        assert!(field.nested_ref(&node).unwrap().is_none());

        field
            .attach(&mut node, Box::new(Inner { code: Some("x".into()) }))
            .unwrap();
        assert_eq!(node.inner.unwrap().code.as_deref(), Some("x"));
    }

    #[test]
    fn test_boxed_and_inline_nested_fields() {
        let d = Node::descriptor();
        let next = d.field("next").unwrap();
        assert!(next.is_nested());
        assert_eq!(next.value_type(), &ValueType::Model(type_name::<Node>()));
        assert!(d.field("inner").unwrap().is_nested());

        let mut node = Node::default();
        assert!(next.nested_ref(&node).unwrap().is_none());
        next.attach(
            &mut node,
            Box::new(Node {
                label: Some("child".into()),
                ..Node::default()
            }),
        )
        .unwrap();
        assert!(next.nested_ref(&node).unwrap().is_some());
        assert_eq!(node.next.unwrap().label.as_deref(), Some("child"));
    }

    #[test]
    fn test_attach_rejects_wrong_instance_type() {
        let mut node = Node::default();
        let field = Node::descriptor().field("inner").unwrap();
        assert!(field.attach(&mut node, Box::new(42i64)).is_err());
        assert!(node.inner.is_none());
    }

    #[test]
    fn test_columns_flatten_nested_and_stop_at_cycles() {
        let names: Vec<String> = Node::descriptor()
            .columns(CaseStyle::SnakeCase)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["label", "inner_code"]);
    }

    #[test]
    fn test_scalar_descriptors() {
        assert!(i64::descriptor().is_scalar());
        assert!(i64::descriptor().fields().is_empty());
        assert!(!Node::descriptor().is_scalar());
    }
}
