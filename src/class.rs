use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxFunction};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class value: name, optional superclass and unbound methods.
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    /// Looks `name` up on this class, then along the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        match self.methods.get(name) {
            Some(method) => Some(method),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// Calling a class constructs an instance and runs `init` on it, if any.
impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self)))));

        if let Some(init) = self.find_method("init") {
            init.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

/// An object: its class plus per‑instance fields.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property read: fields shadow methods; methods come back bound to
    /// `instance`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value, RuntimeError> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match this.class.find_method(&name.lexeme) {
            Some(method) => {
                let bound = method.bind(Value::Instance(Rc::clone(instance)));
                Ok(Value::Function(Rc::new(bound)))
            }

            None => Err(RuntimeError::new(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Property write; fields need no declaration.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
