//! Structural types of objects and functions
//!
//! A type is a base type (with its own cv-qualification) plus an ordered
//! list of derived-type nodes, outermost first: `int *const p` is
//! `int` + `[Pointer(const)]`, `int (*f)(char)` is
//! `int` + `[Pointer, Function(char)]`, and the declared type of a function
//! `int *g(void)` is `int` + `[Function(), Pointer]`.

use super::EntityId;

/// Fundamental type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    /// `void`
    Void,
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `wchar_t`
    WChar,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `double`
    Double,
    /// A declared class, union, enum or template type parameter
    Named(EntityId),
}

/// Sign modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sign {
    /// No explicit sign
    #[default]
    Default,
    /// `signed`
    Signed,
    /// `unsigned`
    Unsigned,
}

/// Size modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Size {
    /// No explicit size
    #[default]
    Default,
    /// `short`
    Short,
    /// `long`
    Long,
    /// `long long`
    LongLong,
}

/// Base type code with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseType {
    /// Type code
    pub kind: BaseKind,
    /// Sign modifier
    pub sign: Sign,
    /// Size modifier
    pub size: Size,
}

impl BaseType {
    /// Unmodified base type
    pub fn new(kind: BaseKind) -> Self {
        Self {
            kind,
            sign: Sign::Default,
            size: Size::Default,
        }
    }
}

/// const/volatile qualification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cv {
    /// `const`
    pub is_const: bool,
    /// `volatile`
    pub is_volatile: bool,
}

impl Cv {
    /// Unqualified
    pub const NONE: Self = Self {
        is_const: false,
        is_volatile: false,
    };
    /// `const`
    pub const CONST: Self = Self {
        is_const: true,
        is_volatile: false,
    };
    /// `volatile`
    pub const VOLATILE: Self = Self {
        is_const: false,
        is_volatile: true,
    };
    /// `const volatile`
    pub const CONST_VOLATILE: Self = Self {
        is_const: true,
        is_volatile: true,
    };
}

/// Calling convention of a function type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallConv {
    /// Platform default
    #[default]
    Default,
    /// `__cdecl`
    Cdecl,
    /// `__stdcall`
    Stdcall,
    /// `__fastcall`
    Fastcall,
}

/// A function signature node
#[derive(Debug, Clone, Default)]
pub struct FunctionSig {
    /// Parameter types in declaration order
    pub params: Vec<Type>,
    /// Qualification of the implicit object (`void f() const`)
    pub cv: Cv,
    /// `None` when no exception specification is given; `Some(vec![])` is `throw()`
    pub throws: Option<Vec<Type>>,
    /// Trailing `...`
    pub variadic: bool,
    /// Calling convention
    pub convention: CallConv,
}

impl FunctionSig {
    /// Signature with the given parameters and nothing else
    pub fn new(params: Vec<Type>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

/// One derived-type modifier
#[derive(Debug, Clone)]
pub enum Derived {
    /// Pointer, qualified by its own cv
    Pointer(Cv),
    /// Reference
    Reference,
    /// Array with a declared size, or unknown bound
    Array(Option<u64>),
    /// Pointer to member of `class`
    MemberPointer {
        /// The owning class
        class: EntityId,
        /// Qualification of the pointer itself
        cv: Cv,
    },
    /// Function taking and returning the surrounding type
    Function(FunctionSig),
}

/// A complete structural type
#[derive(Debug, Clone)]
pub struct Type {
    /// Base type
    pub base: BaseType,
    /// Qualification of the base type
    pub cv: Cv,
    /// Derived-type nodes, outermost first
    pub derived: Vec<Derived>,
}

impl Type {
    /// Unqualified base type with no derived nodes
    pub fn builtin(kind: BaseKind) -> Self {
        Self {
            base: BaseType::new(kind),
            cv: Cv::NONE,
            derived: Vec::new(),
        }
    }

    /// `int`
    pub fn int() -> Self {
        Self::builtin(BaseKind::Int)
    }

    /// `void`
    pub fn void() -> Self {
        Self::builtin(BaseKind::Void)
    }

    /// A declared class, union or enum type
    pub fn named(entity: EntityId) -> Self {
        Self::builtin(BaseKind::Named(entity))
    }

    /// Same type with a sign modifier
    #[must_use]
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.base.sign = sign;
        self
    }

    /// Same type with a size modifier
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.base.size = size;
        self
    }

    /// Same type with the base type qualified by `cv`
    #[must_use]
    pub fn with_cv(mut self, cv: Cv) -> Self {
        self.cv = cv;
        self
    }

    /// Pointer to this type
    #[must_use]
    pub fn pointer(self) -> Self {
        self.wrap(Derived::Pointer(Cv::NONE))
    }

    /// Pointer to this type, the pointer itself qualified by `cv`
    #[must_use]
    pub fn qualified_pointer(self, cv: Cv) -> Self {
        self.wrap(Derived::Pointer(cv))
    }

    /// Reference to this type
    #[must_use]
    pub fn reference(self) -> Self {
        self.wrap(Derived::Reference)
    }

    /// Array of this type
    #[must_use]
    pub fn array(self, size: Option<u64>) -> Self {
        self.wrap(Derived::Array(size))
    }

    /// Pointer to a member of `class` having this type
    #[must_use]
    pub fn member_pointer(self, class: EntityId) -> Self {
        self.wrap(Derived::MemberPointer { class, cv: Cv::NONE })
    }

    /// Function type returning `ret`
    pub fn function(ret: Self, sig: FunctionSig) -> Self {
        ret.wrap(Derived::Function(sig))
    }

    fn wrap(mut self, node: Derived) -> Self {
        self.derived.insert(0, node);
        self
    }

    /// The leading signature node of a function type
    pub fn signature(&self) -> Option<&FunctionSig> {
        match self.derived.first() {
            Some(Derived::Function(sig)) => Some(sig),
            _ => None,
        }
    }

    /// Whether this is a function type
    pub fn is_function(&self) -> bool {
        self.signature().is_some()
    }

    /// Return type of a function type
    pub fn return_type(&self) -> Option<Self> {
        self.signature()?;
        Some(Self {
            base: self.base,
            cv: self.cv,
            derived: self.derived[1..].to_vec(),
        })
    }

    /// The class denoted by this type when it is a plain (possibly
    /// cv-qualified) class or enum name with no derived nodes
    pub fn named_entity(&self) -> Option<EntityId> {
        match self.base.kind {
            BaseKind::Named(entity) if self.derived.is_empty() => Some(entity),
            _ => None,
        }
    }
}
