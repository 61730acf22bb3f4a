// ABOUTME: Macro expansion, separate from evaluation: expand-1 and expand

use crate::error::{EvalError, ARITY_ONE};
use crate::eval::{apply_closure, list_elements};
use crate::interp::Interp;
use crate::value::{EnvRef, Object, Value};

/// Performs exactly one macro-call step of the head of `form`: binds the
/// unevaluated arguments and evaluates the macro body, without evaluating
/// the result. Returns the form unchanged (and `false`) when the head
/// does not name a macro.
pub fn expand_1(
    interp: &mut Interp,
    env: EnvRef,
    form: Value,
) -> Result<(Value, bool), EvalError> {
    if !interp.heap.is_cons(form) {
        return Ok((form, false));
    }
    let head = interp.heap.car(form);
    let Some(name) = interp.heap.symbol_text(head).map(str::to_string) else {
        return Ok((form, false));
    };
    let Some(binding) = interp.heap.env_get(env, &name).flatten() else {
        return Ok((form, false));
    };
    let Object::Macro(closure) = interp.heap.get(binding) else {
        return Ok((form, false));
    };
    let closure = closure.clone();
    let args = list_elements(&interp.heap, interp.heap.cdr(form));
    let expansion = apply_closure(interp, &closure, &args)?;
    Ok((expansion, true))
}

/// Drives `expand_1` to its fixed point: the result's head no longer
/// names a macro.
pub fn expand(interp: &mut Interp, env: EnvRef, form: Value) -> Result<Value, EvalError> {
    let mut current = form;
    loop {
        let (next, stepped) = expand_1(interp, env, current)?;
        if !stepped {
            return Ok(next);
        }
        current = next;
    }
}

pub fn builtin_expand_1(
    interp: &mut Interp,
    env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("expand-1", ARITY_ONE, args.len()));
    }
    expand_1(interp, env, args[0]).map(|(form, _)| form)
}

pub fn builtin_expand(
    interp: &mut Interp,
    env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("expand", ARITY_ONE, args.len()));
    }
    expand(interp, env, args[0])
}
