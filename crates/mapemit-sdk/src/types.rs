//! Type descriptors
//!
//! A [`TypeRef`] is a shared, immutable handle to a [`TypeDef`]. Class and enum
//! descriptors compare by identity; scalars, `Any` and the initializing-data
//! type compare by kind, so `TypeRef::scalar(ScalarKind::I32)` built twice is
//! the same type.

use crate::error::{Fault, FaultResult};
use crate::object::ObjectRef;
use crate::property_info::SetInfoFn;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Interface implemented by nullable scalar wrappers
pub const INULLABLE: &str = "INullable";

/// Interface implemented by every synthesized concrete type
pub const IMAP_GENERATED: &str = "IMapGenerated";

/// Interface of field types that want to know which property owns them
pub const IMAP_SET_PROPERTY_INFO: &str = "IMapSetPropertyInfo";

// ============================================================================
// Scalars
// ============================================================================

/// Built-in scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Boolean
    Bool,
    /// Unicode scalar value
    Char,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Text (a reference type, defaults to null)
    Str,
    /// Date and time without zone
    DateTime,
    /// 128-bit GUID
    Guid,
}

impl ScalarKind {
    /// Type name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Str => "string",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Guid => "guid",
        }
    }

    /// Whether values of this kind are copied rather than referenced
    pub fn is_value_kind(self) -> bool {
        self != ScalarKind::Str
    }

    /// Whether this is one of the integer kinds
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
        )
    }

    /// Zero value of this kind
    pub fn default_value(self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Char => Value::Char('\0'),
            ScalarKind::I8 => Value::I8(0),
            ScalarKind::I16 => Value::I16(0),
            ScalarKind::I32 => Value::I32(0),
            ScalarKind::I64 => Value::I64(0),
            ScalarKind::U8 => Value::U8(0),
            ScalarKind::U16 => Value::U16(0),
            ScalarKind::U32 => Value::U32(0),
            ScalarKind::U64 => Value::U64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Str => Value::Null,
            ScalarKind::DateTime => Value::DateTime(chrono::NaiveDateTime::default()),
            ScalarKind::Guid => Value::Guid(uuid::Uuid::nil()),
        }
    }
}

// ============================================================================
// Members
// ============================================================================

/// Property getter body
pub type GetterFn = Arc<dyn Fn(&ObjectRef) -> FaultResult<Value> + Send + Sync>;

/// Property setter body
pub type SetterFn = Arc<dyn Fn(&ObjectRef, Value) -> FaultResult<()> + Send + Sync>;

/// Constructor body, run against a freshly allocated object
pub type CtorFn = Arc<dyn Fn(&ObjectRef, &[Value]) -> FaultResult<()> + Send + Sync>;

/// Static field initializer; receives the declaring type
pub type StaticInitFn = Arc<dyn Fn(&TypeRef) -> FaultResult<Value> + Send + Sync>;

/// A declared accessor: either abstract or backed by a body
#[derive(Clone)]
pub enum Accessor<F> {
    /// Declared without a body
    Abstract,
    /// Implemented
    Body(F),
}

impl<F> Accessor<F> {
    /// Whether the accessor has no body
    pub fn is_abstract(&self) -> bool {
        matches!(self, Accessor::Abstract)
    }

    /// The body, if any
    pub fn body(&self) -> Option<&F> {
        match self {
            Accessor::Abstract => None,
            Accessor::Body(f) => Some(f),
        }
    }
}

/// Mapping metadata attached to a property declaration
#[derive(Debug, Clone)]
pub enum PropertyAttribute {
    /// Store the property in a field of this type instead of the declared one
    MapType(TypeRef),
    /// Construction parameters for the backing field's value
    Parameters(Vec<Value>),
}

/// Instance field in a class layout
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeRef,
    /// Visible to member lookup by other types
    pub is_public: bool,
}

/// Property declaration
#[derive(Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Declared property type
    pub ty: TypeRef,
    /// Visible to member lookup by other types
    pub is_public: bool,
    /// Getter, if declared
    pub getter: Option<Accessor<GetterFn>>,
    /// Setter, if declared
    pub setter: Option<Accessor<SetterFn>>,
    /// Mapping attributes in declaration order
    pub attributes: Vec<PropertyAttribute>,
}

impl PropertyDef {
    /// Public property with no accessors yet
    pub fn new(name: impl Into<String>, ty: &TypeRef) -> Self {
        Self {
            name: name.into(),
            ty: ty.clone(),
            is_public: true,
            getter: None,
            setter: None,
            attributes: Vec::new(),
        }
    }

    /// Mark as non-public
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Declare abstract getter and setter
    pub fn abstract_accessors(mut self) -> Self {
        self.getter = Some(Accessor::Abstract);
        self.setter = Some(Accessor::Abstract);
        self
    }

    /// Declare only an abstract getter
    pub fn abstract_getter(mut self) -> Self {
        self.getter = Some(Accessor::Abstract);
        self
    }

    /// Implement the getter
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectRef) -> FaultResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Accessor::Body(Arc::new(f)));
        self
    }

    /// Implement the setter
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectRef, Value) -> FaultResult<()> + Send + Sync + 'static,
    {
        self.setter = Some(Accessor::Body(Arc::new(f)));
        self
    }

    /// Add a `MapType` override
    pub fn map_type(mut self, ty: &TypeRef) -> Self {
        self.attributes.push(PropertyAttribute::MapType(ty.clone()));
        self
    }

    /// Attach construction parameters
    pub fn parameters(mut self, values: Vec<Value>) -> Self {
        self.attributes.push(PropertyAttribute::Parameters(values));
        self
    }

    /// Whether either accessor is declared abstract
    pub fn is_abstract(&self) -> bool {
        self.getter.as_ref().is_some_and(Accessor::is_abstract)
            || self.setter.as_ref().is_some_and(Accessor::is_abstract)
    }

    /// Whether a getter is declared
    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether a setter is declared
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("getter", &self.getter.as_ref().map(Accessor::is_abstract))
            .field("setter", &self.setter.as_ref().map(Accessor::is_abstract))
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Constructor declaration
#[derive(Clone)]
pub struct CtorDef {
    /// Exact parameter types
    pub params: Vec<TypeRef>,
    /// Callable from outside the class
    pub is_public: bool,
    /// Body
    pub body: CtorFn,
}

impl fmt::Debug for CtorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CtorDef({})", signature(&self.params))
    }
}

/// Lazily initialized static field
pub struct StaticDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeRef,
    init: StaticInitFn,
    cell: OnceCell<Value>,
}

impl StaticDef {
    /// Create a static whose value is computed on first read
    pub fn new<F>(name: impl Into<String>, ty: &TypeRef, init: F) -> Self
    where
        F: Fn(&TypeRef) -> FaultResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ty: ty.clone(),
            init: Arc::new(init),
            cell: OnceCell::new(),
        }
    }
}

/// Render a parameter list
pub fn signature(params: &[TypeRef]) -> String {
    params
        .iter()
        .map(|p| p.name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Type definitions
// ============================================================================

/// Class descriptor
pub struct ClassDef {
    /// Base class
    pub base: Option<TypeRef>,
    /// Cannot be instantiated directly
    pub is_abstract: bool,
    /// Instances are copied on store
    pub is_value_type: bool,
    /// Carries the serializable marker
    pub is_serializable: bool,
    /// Implemented interface names (own only)
    pub interfaces: Vec<String>,
    /// Full instance layout, inherited fields first
    pub layout: Vec<FieldDef>,
    /// Index of the first field declared by this class
    pub declared_field_start: usize,
    /// Properties declared by this class
    pub properties: Vec<PropertyDef>,
    /// Constructors declared by this class
    pub constructors: Vec<CtorDef>,
    /// Static fields declared by this class
    pub statics: Vec<StaticDef>,
    /// Receiver for property info, see [`IMAP_SET_PROPERTY_INFO`]
    pub set_info: Option<SetInfoFn>,
    /// Owned member slots of a synthesized class
    pub created_members: Option<Vec<usize>>,
}

/// Enum descriptor
#[derive(Debug, Clone)]
pub struct EnumDef {
    /// Underlying integer kind
    pub underlying: ScalarKind,
    /// Named values
    pub variants: Vec<(String, i64)>,
}

/// Kind of a type
pub enum TypeKind {
    /// Universal base type
    Any,
    /// Built-in scalar
    Scalar(ScalarKind),
    /// Enumeration over an integer kind
    Enum(EnumDef),
    /// User or synthesized class
    Class(ClassDef),
    /// The initializing-data carrier
    InitData,
}

/// Named type definition
pub struct TypeDef {
    name: String,
    kind: TypeKind,
}

/// Identity key of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// `Any`
    Any,
    /// The initializing-data type
    InitData,
    /// Scalar by kind
    Scalar(ScalarKind),
    /// Class or enum by address
    Named(usize),
}

/// Shared handle to a type definition
#[derive(Clone)]
pub struct TypeRef(Arc<TypeDef>);

/// Iterator over a type and its bases, most derived first
pub struct Ancestors<'a> {
    next: Option<&'a TypeRef>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeRef;

    fn next(&mut self) -> Option<&'a TypeRef> {
        let current = self.next?;
        self.next = current.base();
        Some(current)
    }
}

impl TypeRef {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self(Arc::new(TypeDef {
            name: name.into(),
            kind,
        }))
    }

    /// The universal base type
    pub fn any() -> Self {
        Self::new("object", TypeKind::Any)
    }

    /// A scalar type
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(kind.name(), TypeKind::Scalar(kind))
    }

    /// The initializing-data carrier type
    pub fn init_data() -> Self {
        Self::new("MapInitializingData", TypeKind::InitData)
    }

    /// An enum over `underlying`
    pub fn enumeration(
        name: impl Into<String>,
        underlying: ScalarKind,
        variants: Vec<(String, i64)>,
    ) -> Self {
        Self::new(
            name,
            TypeKind::Enum(EnumDef {
                underlying,
                variants,
            }),
        )
    }

    /// A class from a finished definition
    pub fn class(name: impl Into<String>, def: ClassDef) -> Self {
        Self::new(name, TypeKind::Class(def))
    }

    /// Full type name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name without namespace
    pub fn short_name(&self) -> &str {
        self.0.name.rsplit('.').next().unwrap_or(&self.0.name)
    }

    /// Kind of this type
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Identity key
    pub fn key(&self) -> TypeKey {
        match &self.0.kind {
            TypeKind::Any => TypeKey::Any,
            TypeKind::InitData => TypeKey::InitData,
            TypeKind::Scalar(kind) => TypeKey::Scalar(*kind),
            TypeKind::Enum(_) | TypeKind::Class(_) => TypeKey::Named(Arc::as_ptr(&self.0) as usize),
        }
    }

    /// Class definition, if this is a class
    pub fn as_class(&self) -> Option<&ClassDef> {
        match &self.0.kind {
            TypeKind::Class(def) => Some(def),
            _ => None,
        }
    }

    /// Scalar kind, if this is a scalar
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match &self.0.kind {
            TypeKind::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Underlying kind, if this is an enum
    pub fn enum_underlying(&self) -> Option<ScalarKind> {
        match &self.0.kind {
            TypeKind::Enum(def) => Some(def.underlying),
            _ => None,
        }
    }

    /// Whether this is an enum
    pub fn is_enum(&self) -> bool {
        matches!(self.0.kind, TypeKind::Enum(_))
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        matches!(self.0.kind, TypeKind::Class(_))
    }

    /// Whether this is a class with reference semantics
    pub fn is_reference_class(&self) -> bool {
        self.as_class().is_some_and(|c| !c.is_value_type)
    }

    /// Whether this is an abstract class
    pub fn is_abstract(&self) -> bool {
        self.as_class().is_some_and(|c| c.is_abstract)
    }

    /// Whether this is a value-type class
    pub fn is_value_type(&self) -> bool {
        self.as_class().is_some_and(|c| c.is_value_type)
    }

    /// Whether this class carries the serializable marker
    pub fn is_serializable(&self) -> bool {
        self.as_class().is_some_and(|c| c.is_serializable)
    }

    /// Base class
    pub fn base(&self) -> Option<&TypeRef> {
        self.as_class().and_then(|c| c.base.as_ref())
    }

    /// This type followed by its bases
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Whether `other` is a proper base of this type. `Any` is the base of everything else.
    pub fn is_subclass_of(&self, other: &TypeRef) -> bool {
        if matches!(other.kind(), TypeKind::Any) {
            return !matches!(self.kind(), TypeKind::Any);
        }
        self.ancestors().skip(1).any(|t| t == other)
    }

    /// Whether a value of this type can be stored where `target` is expected
    pub fn is_assignable_to(&self, target: &TypeRef) -> bool {
        self == target || self.is_subclass_of(target)
    }

    /// Whether this type or a base implements `interface`
    pub fn implements(&self, interface: &str) -> bool {
        self.ancestors()
            .filter_map(TypeRef::as_class)
            .any(|c| c.interfaces.iter().any(|i| i == interface))
    }

    /// Full instance layout
    pub fn fields(&self) -> &[FieldDef] {
        self.as_class().map(|c| c.layout.as_slice()).unwrap_or(&[])
    }

    /// Slot of the field named `name`
    pub fn field_slot(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    /// Public instance fields: those declared here first, then each base's
    pub fn public_fields(&self) -> Vec<(usize, &FieldDef)> {
        let mut out = Vec::new();
        for ty in self.ancestors() {
            if let Some(class) = ty.as_class() {
                for (slot, field) in class.layout.iter().enumerate().skip(class.declared_field_start)
                {
                    if field.is_public {
                        out.push((slot, field));
                    }
                }
            }
        }
        out
    }

    /// Public properties: most derived declaration of each name, derived classes first
    pub fn public_properties(&self) -> Vec<(TypeRef, &PropertyDef)> {
        let mut out: Vec<(TypeRef, &PropertyDef)> = Vec::new();
        for ty in self.ancestors() {
            if let Some(class) = ty.as_class() {
                for prop in &class.properties {
                    if prop.is_public && !out.iter().any(|(_, p)| p.name == prop.name) {
                        out.push((ty.clone(), prop));
                    }
                }
            }
        }
        out
    }

    /// Most derived declaration of property `name`, with its declaring type
    pub fn find_property(&self, name: &str) -> Option<(TypeRef, &PropertyDef)> {
        self.ancestors().find_map(|ty| {
            ty.as_class()
                .and_then(|c| c.properties.iter().find(|p| p.name == name))
                .map(|p| (ty.clone(), p))
        })
    }

    /// Constructors declared by this class
    pub fn constructors(&self) -> &[CtorDef] {
        self.as_class()
            .map(|c| c.constructors.as_slice())
            .unwrap_or(&[])
    }

    /// Constructor whose parameter types match `params` exactly
    pub fn find_constructor(&self, params: &[TypeRef]) -> Option<(usize, &CtorDef)> {
        self.constructors()
            .iter()
            .enumerate()
            .find(|(_, c)| c.params.as_slice() == params)
    }

    /// Zero-argument constructor of any visibility
    pub fn default_constructor(&self) -> Option<(usize, &CtorDef)> {
        self.find_constructor(&[])
    }

    /// Whether this class declares a static field `name`
    pub fn has_static(&self, name: &str) -> bool {
        self.as_class()
            .is_some_and(|c| c.statics.iter().any(|s| s.name == name))
    }

    /// Read a static field, running its initializer on first access
    pub fn static_value(&self, name: &str) -> FaultResult<Value> {
        let def = self
            .as_class()
            .and_then(|c| c.statics.iter().find(|s| s.name == name))
            .ok_or_else(|| Fault::MissingMember {
                ty: self.name().to_string(),
                member: name.to_string(),
            })?;
        let value = def.cell.get_or_try_init(|| (def.init)(self))?;
        Ok(value.assign_copy())
    }

    /// Value a field of this type holds before anything is stored in it
    pub fn default_value(&self) -> Value {
        match &self.0.kind {
            TypeKind::Scalar(kind) => kind.default_value(),
            TypeKind::Enum(def) => def.underlying.default_value(),
            TypeKind::Class(class) if class.is_value_type => Value::Object(ObjectRef::zeroed(self)),
            _ => Value::Null,
        }
    }

    /// Allocate an instance and run constructor `index`
    pub fn construct(&self, index: usize, args: &[Value]) -> FaultResult<ObjectRef> {
        let class = self
            .as_class()
            .filter(|c| !c.is_abstract)
            .ok_or_else(|| Fault::AbstractInstantiation(self.name().to_string()))?;
        let ctor = class
            .constructors
            .get(index)
            .ok_or_else(|| self.missing_ctor(index))?;
        check_arity(self, ctor, args)?;
        let obj = ObjectRef::zeroed(self);
        (ctor.body)(&obj, args)?;
        Ok(obj)
    }

    /// Run constructor `index` of this class against an existing instance
    ///
    /// Used by derived constructors to chain to their base.
    pub fn invoke_constructor(
        &self,
        index: usize,
        obj: &ObjectRef,
        args: &[Value],
    ) -> FaultResult<()> {
        let ctor = self
            .constructors()
            .get(index)
            .ok_or_else(|| self.missing_ctor(index))?;
        check_arity(self, ctor, args)?;
        (ctor.body)(obj, args)
    }

    /// Property-info receiver of this class or the nearest base that has one
    pub fn property_info_sink(&self) -> Option<&SetInfoFn> {
        self.ancestors()
            .filter_map(TypeRef::as_class)
            .find_map(|c| c.set_info.as_ref())
    }

    /// Owned member slots recorded by synthesis
    pub fn created_member_slots(&self) -> Option<&[usize]> {
        self.ancestors()
            .filter_map(TypeRef::as_class)
            .find_map(|c| c.created_members.as_deref())
    }

    pub(crate) fn getter_for(&self, name: &str) -> FaultResult<GetterFn> {
        for ty in self.ancestors() {
            let Some(prop) = ty
                .as_class()
                .and_then(|c| c.properties.iter().find(|p| p.name == name))
            else {
                continue;
            };
            match &prop.getter {
                Some(Accessor::Body(f)) => return Ok(f.clone()),
                Some(Accessor::Abstract) => return Err(self.abstract_member(name)),
                None => continue,
            }
        }
        Err(Fault::MissingMember {
            ty: self.name().to_string(),
            member: format!("get_{}", name),
        })
    }

    pub(crate) fn setter_for(&self, name: &str) -> FaultResult<SetterFn> {
        for ty in self.ancestors() {
            let Some(prop) = ty
                .as_class()
                .and_then(|c| c.properties.iter().find(|p| p.name == name))
            else {
                continue;
            };
            match &prop.setter {
                Some(Accessor::Body(f)) => return Ok(f.clone()),
                Some(Accessor::Abstract) => return Err(self.abstract_member(name)),
                None => continue,
            }
        }
        Err(Fault::MissingMember {
            ty: self.name().to_string(),
            member: format!("set_{}", name),
        })
    }

    fn abstract_member(&self, name: &str) -> Fault {
        Fault::AbstractMember {
            ty: self.name().to_string(),
            member: name.to_string(),
        }
    }

    fn missing_ctor(&self, index: usize) -> Fault {
        Fault::MissingMember {
            ty: self.name().to_string(),
            member: format!(".ctor#{}", index),
        }
    }
}

fn check_arity(ty: &TypeRef, ctor: &CtorDef, args: &[Value]) -> FaultResult<()> {
    if ctor.params.len() != args.len() {
        return Err(Fault::TypeMismatch {
            expected: format!("{}({})", ty.name(), signature(&ctor.params)),
            got: format!("{} argument(s)", args.len()),
        });
    }
    Ok(())
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}
