//! Error values: error, error?, error-msg
//!
//! `error?` and `error-msg` are error-aware: they receive Error arguments
//! instead of the apply path short-circuiting on them.

use crate::builtins::{define_builtin, define_error_aware_builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::interp::Interp;
use crate::value::{type_name, EnvRef, Object, Value};

/// Constructs an Error value from a string message (or the rendering of
/// any other value).
pub fn builtin_error(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("error", ARITY_ONE, args.len()));
    }
    let message = match args[0] {
        Some(r) => match interp.heap.get(r) {
            Object::Str(s) => s.clone(),
            _ => interp.heap.render(args[0]),
        },
        None => interp.heap.render(args[0]),
    };
    Ok(interp.heap.error_new(message))
}

pub fn builtin_is_error(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("error?", ARITY_ONE, args.len()));
    }
    let is = interp.heap.is_error(args[0]);
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_error_msg(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("error-msg", ARITY_ONE, args.len()));
    }
    let Some(message) = interp.heap.error_message(args[0]).map(str::to_string) else {
        return Err(EvalError::type_error(
            "error-msg",
            "error",
            type_name(&interp.heap, args[0]),
            1,
        ));
    };
    Ok(interp.heap.str_new(&message))
}

/// Register the error builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_builtin(interp, "error", builtin_error);
    define_error_aware_builtin(interp, "error?", builtin_is_error);
    define_error_aware_builtin(interp, "error-msg", builtin_error_msg);
}

#[cfg(test)]
mod tests {
    use crate::interp::Interp;

    fn run(src: &str) -> String {
        let mut interp = Interp::new();
        let v = interp.eval_str(src).expect("evaluation failed");
        interp.heap.render(v)
    }

    #[test]
    fn test_error_constructs_a_value() {
        let mut interp = Interp::new();
        let v = interp.eval_str("(error \"boom\")").unwrap();
        assert!(interp.heap.is_error(v));
        assert_eq!(interp.heap.error_message(v), Some("boom"));
    }

    #[test]
    fn test_error_predicate_sees_the_error() {
        assert_eq!(run("(error? (error \"x\"))"), "true");
        assert_eq!(run("(error? 1)"), "false");
        assert_eq!(run("(error? nil)"), "false");
    }

    #[test]
    fn test_error_msg_extracts_message() {
        assert_eq!(run("(error-msg (error \"out of cheese\"))"), "out of cheese");
    }

    #[test]
    fn test_error_is_falsy() {
        assert_eq!(run("(if (error \"x\") 1 2)"), "2");
        assert_eq!(run("(not (error \"x\"))"), "true");
    }
}
