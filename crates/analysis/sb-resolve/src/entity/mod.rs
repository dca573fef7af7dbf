//! Entity model: every nameable declared thing
//!
//! Entities live in the [`SymbolForest`](crate::SymbolForest) arena and are
//! referred to by generation-checked [`EntityId`] handles. Identity is the
//! handle, never the contents.

pub mod ty;

use crate::table::SymbolTable;
use derive_more::Display;
use sb_arena::Handle;
use sb_intern::Symbol;
use sb_span::FileSpan;

pub use ty::{BaseKind, BaseType, CallConv, Cv, Derived, FunctionSig, Sign, Size, Type};

/// Handle to an entity
pub type EntityId = Handle<Entity>;

/// Handle to a symbol table
pub type TableId = Handle<SymbolTable>;

/// Member and base-class access level, ordered from least to most restrictive
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Access {
    /// `public`
    #[default]
    #[display("public")]
    Public,
    /// `protected`
    #[display("protected")]
    Protected,
    /// `private`
    #[display("private")]
    Private,
}

impl Access {
    /// The more restrictive of the two
    #[must_use]
    pub fn stricter(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Storage class written on a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Storage {
    /// None written
    #[default]
    None,
    /// `extern`
    Extern,
    /// `static`
    Static,
    /// `auto`
    Auto,
    /// `register`
    Register,
    /// `mutable`
    Mutable,
}

/// Variable or data member
#[derive(Debug, Clone)]
pub struct ObjectData {
    /// Declared type
    pub ty: Type,
    /// Storage class
    pub storage: Storage,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct ParameterData {
    /// Declared type
    pub ty: Type,
    /// Zero-based position in the parameter list
    pub position: usize,
    /// Whether a default argument was given
    pub has_default: bool,
}

/// Which special form a function takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionFlavor {
    /// Ordinary function, or ordinary member function when owned by a class
    #[default]
    Plain,
    /// Constructor
    Constructor,
    /// Destructor
    Destructor,
    /// `operator@`, free or member depending on the owner
    Operator,
    /// `operator T()`
    Cast,
}

/// Template form of a function or class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateForm {
    /// Not a template
    #[default]
    None,
    /// Primary template
    Template,
    /// Explicit specialization
    Specialization,
}

/// Function, method, constructor, destructor or operator
#[derive(Debug, Clone)]
pub struct FunctionData {
    /// Declared type; always starts with exactly one signature node
    pub ty: Type,
    /// Special form
    pub flavor: FunctionFlavor,
    /// Template form
    pub template: TemplateForm,
    /// Storage class
    pub storage: Storage,
    /// `virtual`
    pub is_virtual: bool,
}

impl FunctionData {
    /// Plain non-template function of type `ty`
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            flavor: FunctionFlavor::Plain,
            template: TemplateForm::None,
            storage: Storage::None,
            is_virtual: false,
        }
    }

    /// Same function with another flavor
    #[must_use]
    pub fn with_flavor(mut self, flavor: FunctionFlavor) -> Self {
        self.flavor = flavor;
        self
    }
}

/// Class key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassKey {
    /// `class`
    #[default]
    Class,
    /// `struct`
    Struct,
    /// `union`
    Union,
}

/// Class, struct or union
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassData {
    /// Class key
    pub key: ClassKey,
    /// Whether this is a class template
    pub is_template: bool,
}

/// What a using-alias (typedef or using-declaration) stands for
#[derive(Debug, Clone)]
pub enum AliasTarget {
    /// Another declared entity (`using N::f;`, `typedef A B;` of a class)
    Entity(EntityId),
    /// An arbitrary type (`typedef int *P;`)
    Type(Type),
}

/// Template parameter category
#[derive(Debug, Clone)]
pub enum TemplateParamKind {
    /// `typename T`
    Type,
    /// `int N`
    NonType(Type),
    /// `template <class> class C`
    Template,
}

/// Kind-specific payload of an entity
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// Variable; a data member when owned by a class table
    Object(ObjectData),
    /// Function parameter
    Parameter(ParameterData),
    /// Function-like entity
    Function(FunctionData),
    /// Class, struct or union
    Class(ClassData),
    /// Enumeration
    Enum,
    /// Enumerator
    EnumConstant {
        /// Value of the enumerator
        value: i64,
        /// Enclosing enumeration
        enumeration: Option<EntityId>,
    },
    /// Namespace
    Namespace,
    /// `namespace A = B;`
    NamespaceAlias {
        /// Aliased namespace
        target: EntityId,
    },
    /// Typedef or using-declaration
    UsingAlias(AliasTarget),
    /// Template parameter
    TemplateParam(TemplateParamKind),
    /// Statement label
    Label,
    /// Declared but not yet classified
    Unspecified,
}

impl EntityKind {
    /// Short human-readable kind name
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Parameter(_) => "parameter",
            Self::Function(data) => match data.flavor {
                FunctionFlavor::Plain => "function",
                FunctionFlavor::Constructor => "constructor",
                FunctionFlavor::Destructor => "destructor",
                FunctionFlavor::Operator => "operator",
                FunctionFlavor::Cast => "conversion operator",
            },
            Self::Class(data) => match data.key {
                ClassKey::Union => "union",
                ClassKey::Class | ClassKey::Struct => "class",
            },
            Self::Enum => "enum",
            Self::EnumConstant { .. } => "enumerator",
            Self::Namespace => "namespace",
            Self::NamespaceAlias { .. } => "namespace alias",
            Self::UsingAlias(_) => "typedef",
            Self::TemplateParam(_) => "template parameter",
            Self::Label => "label",
            Self::Unspecified => "entity",
        }
    }

    /// Declared type, for kinds that carry one
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Self::Object(data) => Some(&data.ty),
            Self::Parameter(data) => Some(&data.ty),
            Self::Function(data) => Some(&data.ty),
            Self::TemplateParam(TemplateParamKind::NonType(ty)) => Some(ty),
            Self::UsingAlias(AliasTarget::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Function payload
    pub fn as_function(&self) -> Option<&FunctionData> {
        match self {
            Self::Function(data) => Some(data),
            _ => None,
        }
    }

    /// Whether this entity opens its own declarative region when inserted
    pub fn opens_region(&self) -> bool {
        matches!(self, Self::Class(_) | Self::Namespace)
    }
}

/// A declared entity owned by exactly one symbol table
#[derive(Debug, Clone)]
pub struct Entity {
    /// Short name
    pub name: Symbol,
    /// Declarative region that owns the entity
    pub owner: TableId,
    /// Kind and payload
    pub kind: EntityKind,
    /// Declared access
    pub access: Access,
    /// Declaration position
    pub span: FileSpan,
    /// Region opened by this entity (class body, namespace body, function body)
    pub scope: Option<TableId>,
}

impl Entity {
    /// Declared type, for kinds that carry one
    pub fn ty(&self) -> Option<&Type> {
        self.kind.ty()
    }
}

/// An entity under construction, not yet inserted anywhere
#[derive(Debug, Clone)]
pub struct EntityDraft {
    /// Short name
    pub name: Symbol,
    /// Kind and payload
    pub kind: EntityKind,
    /// Declared access
    pub access: Access,
    /// Declaration position
    pub span: FileSpan,
}

impl EntityDraft {
    /// Public draft
    pub fn new(name: Symbol, kind: EntityKind, span: FileSpan) -> Self {
        Self {
            name,
            kind,
            access: Access::Public,
            span,
        }
    }

    /// Same draft with another access level
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Object draft
    pub fn object(name: Symbol, ty: Type, storage: Storage, span: FileSpan) -> Self {
        Self::new(name, EntityKind::Object(ObjectData { ty, storage }), span)
    }

    /// Plain function draft
    pub fn function(name: Symbol, ty: Type, span: FileSpan) -> Self {
        Self::new(name, EntityKind::Function(FunctionData::new(ty)), span)
    }

    /// Class draft
    pub fn class(name: Symbol, key: ClassKey, span: FileSpan) -> Self {
        Self::new(
            name,
            EntityKind::Class(ClassData {
                key,
                is_template: false,
            }),
            span,
        )
    }

    /// Namespace draft
    pub fn namespace(name: Symbol, span: FileSpan) -> Self {
        Self::new(name, EntityKind::Namespace, span)
    }

    /// Parameter draft at `position`
    pub fn parameter(name: Symbol, ty: Type, position: usize, span: FileSpan) -> Self {
        Self::new(
            name,
            EntityKind::Parameter(ParameterData {
                ty,
                position,
                has_default: false,
            }),
            span,
        )
    }

    /// Typedef or using-declaration draft
    pub fn alias(name: Symbol, target: AliasTarget, span: FileSpan) -> Self {
        Self::new(name, EntityKind::UsingAlias(target), span)
    }

    /// Label draft
    pub fn label(name: Symbol, span: FileSpan) -> Self {
        Self::new(name, EntityKind::Label, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_stricter() {
        assert_eq!(Access::Public.stricter(Access::Private), Access::Private);
        assert_eq!(Access::Protected.stricter(Access::Public), Access::Protected);
    }

    #[test]
    fn test_kind_type() {
        let kind = EntityKind::Object(ObjectData {
            ty: Type::int(),
            storage: Storage::None,
        });
        assert!(kind.ty().is_some());
        assert!(EntityKind::Namespace.ty().is_none());
        assert_eq!(kind.describe(), "object");
        assert!(EntityKind::Namespace.opens_region());
    }
}
