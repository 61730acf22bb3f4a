//! List manipulation: cons, car, cdr, list, append, length, apply,
//! setcar, setcdr
//!
//! `car` and `cdr` of a non-cons are nil. The list-consuming functions
//! stop at the first non-cons cdr, so dotted pairs lose their tails.

use crate::builtins::define_builtin;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::{apply_function, list_elements};
use crate::interp::Interp;
use crate::value::{type_name, EnvRef, Object, Value};

pub fn builtin_cons(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("cons", ARITY_TWO, args.len()));
    }
    Ok(interp.heap.cons_new(args[0], args[1]))
}

pub fn builtin_car(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("car", ARITY_ONE, args.len()));
    }
    Ok(interp.heap.car(args[0]))
}

pub fn builtin_cdr(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("cdr", ARITY_ONE, args.len()));
    }
    Ok(interp.heap.cdr(args[0]))
}

pub fn builtin_list(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    Ok(interp.heap.list_from(args))
}

pub fn builtin_length(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("length", ARITY_ONE, args.len()));
    }
    if args[0].is_some() && !interp.heap.is_cons(args[0]) {
        return Err(EvalError::type_error(
            "length",
            "list",
            type_name(&interp.heap, args[0]),
            1,
        ));
    }
    let n = list_elements(&interp.heap, args[0]).len() as i64;
    Ok(interp.heap.number_new(n))
}

pub fn builtin_append(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let mut items = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if arg.is_some() && !interp.heap.is_cons(*arg) {
            return Err(EvalError::type_error(
                "append",
                "list",
                type_name(&interp.heap, *arg),
                i + 1,
            ));
        }
        items.extend(list_elements(&interp.heap, *arg));
    }
    Ok(interp.heap.list_from(&items))
}

pub fn builtin_apply(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("apply", ARITY_TWO, args.len()));
    }
    if args[1].is_some() && !interp.heap.is_cons(args[1]) {
        return Err(EvalError::type_error(
            "apply",
            "list",
            type_name(&interp.heap, args[1]),
            2,
        ));
    }
    let argv = list_elements(&interp.heap, args[1]);
    apply_function(interp, env, args[0], &argv, "apply")
}

pub fn builtin_setcar(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("setcar", ARITY_TWO, args.len()));
    }
    let Some(r) = args[0] else {
        return Err(EvalError::type_error("setcar", "cons", "nil", 1));
    };
    match interp.heap.get_mut(r) {
        Object::Cons { car, .. } => {
            *car = args[1];
            Ok(None)
        }
        other => Err(EvalError::type_error(
            "setcar",
            "cons",
            other.type_name(),
            1,
        )),
    }
}

pub fn builtin_setcdr(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("setcdr", ARITY_TWO, args.len()));
    }
    let Some(r) = args[0] else {
        return Err(EvalError::type_error("setcdr", "cons", "nil", 1));
    };
    match interp.heap.get_mut(r) {
        Object::Cons { cdr, .. } => {
            *cdr = args[1];
            Ok(None)
        }
        other => Err(EvalError::type_error(
            "setcdr",
            "cons",
            other.type_name(),
            1,
        )),
    }
}

/// Register all list builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_builtin(interp, "cons", builtin_cons);
    define_builtin(interp, "car", builtin_car);
    define_builtin(interp, "cdr", builtin_cdr);
    define_builtin(interp, "list", builtin_list);
    define_builtin(interp, "length", builtin_length);
    define_builtin(interp, "append", builtin_append);
    define_builtin(interp, "apply", builtin_apply);
    define_builtin(interp, "setcar", builtin_setcar);
    define_builtin(interp, "setcdr", builtin_setcdr);
}
