//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use zinc_compiler::Constant;

/// A value on the VM's operand stack.
///
/// Groups (struct instances) are shared handles on the stack so `SET_IND`
/// can update the instance a local refers to. `ALLOC` deep-copies any group
/// it packs into a new one, so struct fields never alias.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Char(char),
    Str(Rc<str>),
    Bool(bool),
    /// `()`
    Unit,
    /// A struct instance, fields in declared order.
    Group(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Closure>),
}

/// A function value: where its code starts and what it captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub address: usize,
    pub captures: Vec<Value>,
}

impl Value {
    /// Build a group from field values, copying nested groups.
    pub fn group(fields: Vec<Value>) -> Self {
        Value::Group(Rc::new(RefCell::new(
            fields.into_iter().map(|v| v.deep_copy()).collect(),
        )))
    }

    /// A copy that shares no group with `self`.
    pub fn deep_copy(&self) -> Self {
        match self {
            Value::Group(fields) => Value::group(fields.borrow().clone()),
            other => other.clone(),
        }
    }

    /// Load a pooled literal. Function prototypes are not values on their own.
    pub fn from_constant(constant: &Constant) -> Option<Self> {
        match constant {
            Constant::Number(n) => Some(Value::Number(*n)),
            Constant::Char(c) => Some(Value::Char(*c)),
            Constant::Str(s) => Some(Value::Str(s.clone())),
            Constant::Function(_) => None,
        }
    }

    /// Kind name used in defect reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "num",
            Value::Char(_) => "char",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::Unit => "()",
            Value::Group(_) => "group",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Group(a), Value::Group(b)) => *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Unit => f.write_str("()"),
            Value::Group(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("}")
            }
            Value::Function(closure) => write!(f, "<fn @{}>", closure.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Char('z').to_string(), "z");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
        assert_eq!(Value::Unit.to_string(), "()");
        let group = Value::group(vec![Value::Number(1.0), Value::Bool(true)]);
        assert_eq!(group.to_string(), "{1, true}");
        let closure = Value::Function(Rc::new(Closure {
            address: 12,
            captures: Vec::new(),
        }));
        assert_eq!(closure.to_string(), "<fn @12>");
    }

    #[test]
    fn packing_copies_nested_groups() {
        let inner = Value::group(vec![Value::Number(1.0)]);
        let outer = Value::group(vec![inner.clone()]);

        if let Value::Group(fields) = &inner {
            fields.borrow_mut()[0] = Value::Number(9.0);
        }
        assert_eq!(outer.to_string(), "{{1}}");
        assert_eq!(inner.to_string(), "{9}");
    }
}
