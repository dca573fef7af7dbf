//! Roles: how an entity is seen through one particular lookup

use crate::entity::{
    ClassKey, EntityId, EntityKind, FunctionFlavor, TemplateForm, TemplateParamKind,
};
use derive_more::Display;

/// Semantic classification of a lookup hit
///
/// Computed from the entity's kind and its owning table, never stored on
/// the entity: the same entity can be reached under different roles.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Variable outside a class
    #[display("object")]
    Object,
    /// Variable owned by a class
    #[display("data member")]
    DataMember,
    /// Function parameter
    #[display("parameter")]
    Parameter,
    /// Free function
    #[display("function")]
    Function,
    /// Member function
    #[display("method")]
    Method,
    /// Constructor
    #[display("constructor")]
    Constructor,
    /// Destructor
    #[display("destructor")]
    Destructor,
    /// Free operator function
    #[display("operator")]
    FreeOperator,
    /// Member operator function
    #[display("member operator")]
    MemberOperator,
    /// Conversion operator
    #[display("conversion operator")]
    CastOperator,
    /// Function template
    #[display("function template")]
    TemplateFunction,
    /// Explicit function template specialization
    #[display("function template specialization")]
    TemplateSpecialization,
    /// Class or struct
    #[display("class")]
    Class,
    /// Union
    #[display("union")]
    Union,
    /// Enumeration
    #[display("enum")]
    Enum,
    /// Class template
    #[display("class template")]
    TemplateClass,
    /// `typename T`
    #[display("template type parameter")]
    TypeTemplateParam,
    /// `int N`
    #[display("template value parameter")]
    NonTypeTemplateParam,
    /// `template <class> class C`
    #[display("template template parameter")]
    TemplateTemplateParam,
    /// Namespace
    #[display("namespace")]
    Namespace,
    /// Namespace alias that was not followed
    #[display("namespace alias")]
    NamespaceAlias,
    /// Enumerator outside a class
    #[display("enumerator")]
    EnumConstant,
    /// Enumerator owned by a class
    #[display("member enumerator")]
    MemberEnumConstant,
    /// Typedef naming a type
    #[display("typedef")]
    Typedef,
    /// Statement label
    #[display("label")]
    Label,
    /// Unclassified entity
    #[display("unknown")]
    Unknown,
}

impl Role {
    /// Derive the role of an entity from its kind and whether its owner is a class
    pub fn derive(kind: &EntityKind, in_class: bool) -> Self {
        match kind {
            EntityKind::Object(_) if in_class => Self::DataMember,
            EntityKind::Object(_) => Self::Object,
            EntityKind::Function(data) => match (data.template, data.flavor) {
                (TemplateForm::Template, _) => Self::TemplateFunction,
                (TemplateForm::Specialization, _) => Self::TemplateSpecialization,
                (TemplateForm::None, FunctionFlavor::Operator) if in_class => Self::MemberOperator,
                (TemplateForm::None, FunctionFlavor::Constructor) => Self::Constructor,
                (TemplateForm::None, FunctionFlavor::Destructor) => Self::Destructor,
                (TemplateForm::None, FunctionFlavor::Cast) => Self::CastOperator,
                (TemplateForm::None, FunctionFlavor::Plain) if in_class => Self::Method,
                (TemplateForm::None, FunctionFlavor::Operator) => Self::FreeOperator,
                (TemplateForm::None, FunctionFlavor::Plain) => Self::Function,
            },
            EntityKind::Class(data) if data.is_template => Self::TemplateClass,
            EntityKind::Class(data) => match data.key {
                ClassKey::Union => Self::Union,
                ClassKey::Class | ClassKey::Struct => Self::Class,
            },
            EntityKind::Enum => Self::Enum,
            EntityKind::TemplateParam(TemplateParamKind::Type) => Self::TypeTemplateParam,
            EntityKind::TemplateParam(TemplateParamKind::NonType(_)) => Self::NonTypeTemplateParam,
            EntityKind::TemplateParam(TemplateParamKind::Template) => Self::TemplateTemplateParam,
            EntityKind::Namespace => Self::Namespace,
            EntityKind::NamespaceAlias { .. } => Self::NamespaceAlias,
            EntityKind::Parameter(_) => Self::Parameter,
            EntityKind::EnumConstant { .. } if in_class => Self::MemberEnumConstant,
            EntityKind::EnumConstant { .. } => Self::EnumConstant,
            EntityKind::UsingAlias(_) => Self::Typedef,
            EntityKind::Label => Self::Label,
            EntityKind::Unspecified => Self::Unknown,
        }
    }

    /// Class, union, enum or class template: names that may coexist with
    /// a non-type name of the same spelling
    pub fn is_type(self) -> bool {
        matches!(self, Self::Class | Self::Union | Self::Enum | Self::TemplateClass)
    }

    /// Class, union or class template
    pub fn is_class(self) -> bool {
        matches!(self, Self::Class | Self::Union | Self::TemplateClass)
    }

    /// Any function-like role
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Method
                | Self::Constructor
                | Self::Destructor
                | Self::FreeOperator
                | Self::MemberOperator
                | Self::CastOperator
                | Self::TemplateFunction
                | Self::TemplateSpecialization
        )
    }

    /// Non-member function roles, the ones that form free overload sets
    pub fn is_free_function(self) -> bool {
        matches!(
            self,
            Self::Function | Self::FreeOperator | Self::TemplateFunction | Self::TemplateSpecialization
        )
    }

    /// Whether a hit with this role answers a query for `query`
    ///
    /// Roles match themselves; a data member also answers a query for an
    /// object and a member enumerator a query for an enumerator.
    pub fn is_a(self, query: Self) -> bool {
        self == query
            || matches!(
                (self, query),
                (Self::DataMember, Self::Object) | (Self::MemberEnumConstant, Self::EnumConstant)
            )
    }
}

/// One lookup hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleEntry {
    /// The entity found
    pub entity: EntityId,
    /// How it was seen
    pub role: Role,
}

/// Ordered lookup result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleList {
    entries: Vec<RoleEntry>,
}

impl RoleList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unless the same entity is already present
    pub fn push(&mut self, entity: EntityId, role: Role) {
        if !self.contains(entity) {
            self.entries.push(RoleEntry { entity, role });
        }
    }

    /// Whether the entity is present
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.iter().any(|entry| entry.entity == entity)
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First entry
    pub fn first(&self) -> Option<RoleEntry> {
        self.entries.first().copied()
    }

    /// Entries in lookup order
    pub fn iter(&self) -> impl Iterator<Item = RoleEntry> + '_ {
        self.entries.iter().copied()
    }

    /// Entities in lookup order
    pub fn entities(&self) -> Vec<EntityId> {
        self.entries.iter().map(|entry| entry.entity).collect()
    }

    /// Entries answering a query for `role`
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = RoleEntry> + '_ {
        self.iter().filter(move |entry| entry.role.is_a(role))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<RoleEntry> for RoleList {
    fn from_iter<I: IntoIterator<Item = RoleEntry>>(iter: I) -> Self {
        let mut list = Self::new();
        for entry in iter {
            list.push(entry.entity, entry.role);
        }
        list
    }
}

impl Extend<RoleEntry> for RoleList {
    fn extend<I: IntoIterator<Item = RoleEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry.entity, entry.role);
        }
    }
}

impl IntoIterator for RoleList {
    type Item = RoleEntry;
    type IntoIter = std::vec::IntoIter<RoleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
