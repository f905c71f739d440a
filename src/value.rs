use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance};

/// A runtime value.  Heap‑backed variants are shared handles, so copying a
/// `Value` never deep‑copies a function, class or instance.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// Entry of the read‑only native table.
    Native(&'static NativeFunction),

    Function(Rc<LoxFunction>),

    Class(Rc<LoxClass>),

    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The callable capability, if this value has it.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Native(native) => Some(*native),
            Value::Function(function) => Some(function.as_ref()),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// `nil` equals only `nil`; heap values compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => std::ptr::eq(*a, *b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // 3.0 → "3", 2.5 → "2.5"
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Native(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name()),

            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class().name())
            }
        }
    }
}

/// Debug output stays shallow: functions, classes and instances may form
/// reference cycles through their environments and fields.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn nil_equals_only_nil() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
    }
}
