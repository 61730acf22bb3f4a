// ABOUTME: Tagged object variants and the handles used to reference them

use crate::error::EvalError;
use crate::heap::Heap;
use crate::interp::Interp;

/// Handle to an object slot in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

/// Handle to an environment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvRef(pub(crate) u32);

/// A Lisp value is a reference into the heap, or nil.
///
/// The empty list, an unbound lookup, and the unit result of a form like
/// `define` all collapse to `None`.
pub type Value = Option<ObjRef>;

/// Signature of a built-in function. Built-ins receive the interpreter,
/// the frame of the caller, and the already-collected argument vector.
pub type NativeFn = fn(&mut Interp, EnvRef, &[Value]) -> Result<Value, EvalError>;

/// A user-defined function or macro: parameter list, body, and the frame
/// that was current when it was constructed.
#[derive(Debug, Clone)]
pub struct Closure {
    pub params: Value,
    pub body: Value,
    pub env: EnvRef,
    /// Index of the parameter that collects the remaining arguments,
    /// present when `&` appeared in the parameter list.
    pub rest: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum Object {
    Number(i64),
    Symbol(String),
    Str(String),
    Bool(bool),
    /// A diagnostic carried as a value; falsy, and fatal at the top level.
    Error(String),
    Cons { car: Value, cdr: Value },
    Builtin {
        name: &'static str,
        f: NativeFn,
        /// Error arguments normally short-circuit the apply path; the few
        /// builtins that inspect Error values opt out.
        handles_errors: bool,
    },
    Function(Closure),
    Macro(Closure),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Number(_) => "number",
            Object::Symbol(_) => "symbol",
            Object::Str(_) => "string",
            Object::Bool(_) => "bool",
            Object::Error(_) => "error",
            Object::Cons { .. } => "cons",
            Object::Builtin { .. } | Object::Function(_) => "function",
            Object::Macro(_) => "macro",
        }
    }
}

/// Type name of a value, treating nil as its own type.
pub fn type_name(heap: &Heap, v: Value) -> &'static str {
    match v {
        None => "nil",
        Some(r) => heap.get(r).type_name(),
    }
}
