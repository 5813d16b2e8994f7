//! The Zinc type model.
//!
//! Primitive types compare by kind, function types structurally, and struct
//! types by identity: two structs with the same name and fields declared in
//! different scopes are different types.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use zinc_core::Span;

/// A language type.
#[derive(Debug, Clone)]
pub enum Type {
    /// `num`, a 64-bit float
    Number,
    /// `char`
    Char,
    /// `bool`
    Bool,
    /// `str`
    Str,
    /// `()`, the value of expressions evaluated for effect
    Unit,
    /// The type of `return`; control never continues past it
    Nothing,
    /// `(params) -> ret`
    Function(Rc<FunctionType>),
    /// A declared struct
    Struct(Rc<StructType>),
}

impl Type {
    /// Build a function type.
    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(Rc::new(FunctionType { params, ret }))
    }

    pub fn as_function(&self) -> Option<&Rc<FunctionType>> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Rc<StructType>> {
        match self {
            Type::Struct(struct_type) => Some(struct_type),
            _ => None,
        }
    }

    /// Primitive types that `==` and `!=` accept.
    pub fn supports_equality(&self) -> bool {
        matches!(self, Type::Number | Type::Char | Type::Bool | Type::Str)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Number, Type::Number)
            | (Type::Char, Type::Char)
            | (Type::Bool, Type::Bool)
            | (Type::Str, Type::Str)
            | (Type::Unit, Type::Unit)
            | (Type::Nothing, Type::Nothing) => true,
            (Type::Function(a), Type::Function(b)) => a == b,
            (Type::Struct(a), Type::Struct(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Number => f.write_str("num"),
            Type::Char => f.write_str("char"),
            Type::Bool => f.write_str("bool"),
            Type::Str => f.write_str("str"),
            Type::Unit => f.write_str("()"),
            Type::Nothing => f.write_str("nothing"),
            Type::Function(function) => write!(f, "{function}"),
            Type::Struct(struct_type) => f.write_str(&struct_type.name),
        }
    }
}

/// Parameter and return types of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", TypeList(&self.params), self.ret)
    }
}

/// Displays a list of types as `(a, b)`.
pub struct TypeList<'a>(pub &'a [Type]);

impl fmt::Display for TypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}

/// One field of a struct.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    /// `name: Type` in the declaration
    pub span: Span,
}

/// A declared struct.
///
/// The name is registered before the fields are resolved so fields may
/// refer to any struct in scope, including this one. The field list is set
/// exactly once.
pub struct StructType {
    pub name: String,
    /// The whole declaration
    pub span: Span,
    fields: OnceCell<Vec<Field>>,
}

impl StructType {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            fields: OnceCell::new(),
        }
    }

    /// Set the resolved fields. Returns `false` if they were already set.
    pub fn set_fields(&self, fields: Vec<Field>) -> bool {
        self.fields.set(fields).is_ok()
    }

    /// Fields in declaration order; empty until resolved.
    pub fn fields(&self) -> &[Field] {
        self.fields.get().map(Vec::as_slice).unwrap_or_default()
    }

    /// Find a field and its position.
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields()
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
    }
}

// Fields may refer back to the struct itself, so only the name is printed.
impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("name", &self.name)
            .field("fields", &self.fields().len())
            .finish()
    }
}

/// Resolve one of the built-in type names.
pub fn builtin(name: &str) -> Option<Type> {
    match name {
        "num" => Some(Type::Number),
        "str" => Some(Type::Str),
        "bool" => Some(Type::Bool),
        "char" => Some(Type::Char),
        _ => None,
    }
}

/// The built-in type names, registered in the global scope.
pub const BUILTIN_NAMES: [&str; 4] = ["num", "str", "bool", "char"];

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Rc<StructType> {
        Rc::new(StructType::new("Point", Span::new(0, 10, 1)))
    }

    #[test]
    fn display_names() {
        assert_eq!(Type::Number.to_string(), "num");
        assert_eq!(Type::Unit.to_string(), "()");
        assert_eq!(Type::Nothing.to_string(), "nothing");
        assert_eq!(
            Type::function(vec![Type::Number, Type::Str], Type::Bool).to_string(),
            "(num, str) -> bool"
        );
        assert_eq!(Type::function(vec![], Type::Unit).to_string(), "() -> ()");
        assert_eq!(Type::Struct(point()).to_string(), "Point");
    }

    #[test]
    fn functions_compare_structurally() {
        let a = Type::function(vec![Type::Number], Type::Number);
        let b = Type::function(vec![Type::Number], Type::Number);
        let c = Type::function(vec![Type::Char], Type::Number);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn structs_compare_by_identity() {
        let a = point();
        let b = point();
        assert_eq!(Type::Struct(a.clone()), Type::Struct(a));
        assert_ne!(Type::Struct(point()), Type::Struct(b));
    }

    #[test]
    fn fields_are_set_once() {
        let point = point();
        assert!(point.fields().is_empty());
        let fields = vec![
            Field {
                name: "x".into(),
                ty: Type::Number,
                span: Span::default(),
            },
            Field {
                name: "y".into(),
                ty: Type::Number,
                span: Span::default(),
            },
        ];
        assert!(point.set_fields(fields.clone()));
        assert!(!point.set_fields(fields));

        let (index, field) = point.field("y").unwrap();
        assert_eq!(index, 1);
        assert_eq!(field.ty, Type::Number);
        assert!(point.field("z").is_none());
    }

    #[test]
    fn self_referential_struct_debug_terminates() {
        let node = Rc::new(StructType::new("Node", Span::default()));
        node.set_fields(vec![Field {
            name: "next".into(),
            ty: Type::Struct(node.clone()),
            span: Span::default(),
        }]);
        assert!(format!("{:?}", Type::Struct(node)).contains("Node"));
    }

    #[test]
    fn builtins() {
        assert_eq!(builtin("num"), Some(Type::Number));
        assert_eq!(builtin("Point"), None);
        for name in BUILTIN_NAMES {
            assert!(builtin(name).is_some());
        }
    }
}
