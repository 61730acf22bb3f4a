//! Comparison operations: =, <, >, <=, >=
//!
//! `=` compares atoms by value and aggregates by identity; the ordering
//! operators are numeric only.

use crate::builtins::define_builtin;
use crate::error::{EvalError, ARITY_TWO};
use crate::heap::Heap;
use crate::interp::Interp;
use crate::value::{EnvRef, Object, Value};

/// Structural equality for atoms, reference equality for everything else.
pub fn values_equal(heap: &Heap, a: Value, b: Value) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => {
            if x == y {
                return true;
            }
            match (heap.get(x), heap.get(y)) {
                (Object::Number(m), Object::Number(n)) => m == n,
                (Object::Bool(p), Object::Bool(q)) => p == q,
                (Object::Str(s), Object::Str(t)) => s == t,
                (Object::Symbol(s), Object::Symbol(t)) => s == t,
                _ => false,
            }
        }
        _ => false,
    }
}

fn number_pair(
    interp: &Interp,
    function: &str,
    args: &[Value],
) -> Result<(i64, i64), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error(function, ARITY_TWO, args.len()));
    }
    let mut pair = [0_i64; 2];
    for (i, arg) in args.iter().enumerate() {
        pair[i] = match arg {
            Some(r) => match interp.heap.get(*r) {
                Object::Number(n) => *n,
                other => {
                    return Err(EvalError::type_error(
                        function,
                        "number",
                        other.type_name(),
                        i + 1,
                    ));
                }
            },
            None => return Err(EvalError::type_error(function, "number", "nil", i + 1)),
        };
    }
    Ok((pair[0], pair[1]))
}

pub fn builtin_eq(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("=", ARITY_TWO, args.len()));
    }
    let eq = values_equal(&interp.heap, args[0], args[1]);
    Ok(interp.heap.bool_new(eq))
}

pub fn builtin_lt(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = number_pair(interp, "<", args)?;
    Ok(interp.heap.bool_new(a < b))
}

pub fn builtin_gt(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = number_pair(interp, ">", args)?;
    Ok(interp.heap.bool_new(a > b))
}

pub fn builtin_le(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = number_pair(interp, "<=", args)?;
    Ok(interp.heap.bool_new(a <= b))
}

pub fn builtin_ge(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = number_pair(interp, ">=", args)?;
    Ok(interp.heap.bool_new(a >= b))
}

/// Register all comparison builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_builtin(interp, "=", builtin_eq);
    define_builtin(interp, "<", builtin_lt);
    define_builtin(interp, ">", builtin_gt);
    define_builtin(interp, "<=", builtin_le);
    define_builtin(interp, ">=", builtin_ge);
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::Interp;

    fn run(src: &str) -> String {
        let mut interp = Interp::new();
        let v = interp.eval_str(src).expect("evaluation failed");
        interp.heap.render(v)
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(run("(= 1 1)"), "true");
        assert_eq!(run("(= 1 2)"), "false");
    }

    #[test]
    fn test_atom_equality_by_value() {
        assert_eq!(run("(= \"a\" \"a\")"), "true");
        assert_eq!(run("(= 'x 'x)"), "true");
        assert_eq!(run("(= true (< 1 2))"), "true");
        assert_eq!(run("(= 1 \"1\")"), "false");
        assert_eq!(run("(= nil nil)"), "true");
        assert_eq!(run("(= nil 0)"), "false");
    }

    #[test]
    fn test_cons_equality_is_identity() {
        assert_eq!(run("(= '(1 2) '(1 2))"), "false");
        assert_eq!(run("(define l '(1 2)) (= l l)"), "true");
    }

    #[test]
    fn test_ordering() {
        assert_eq!(run("(< 1 2)"), "true");
        assert_eq!(run("(> 1 2)"), "false");
        assert_eq!(run("(<= 2 2)"), "true");
        assert_eq!(run("(>= 1 2)"), "false");
    }

    #[test]
    fn test_ordering_rejects_non_numbers() {
        let mut interp = Interp::new();
        assert!(matches!(
            interp.eval_str("(< 1 \"two\")"),
            Err(EvalError::Type { .. })
        ));
    }
}
