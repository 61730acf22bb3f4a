//! Boolean negation over the evaluator's truthiness rules

use crate::builtins::define_error_aware_builtin;
use crate::error::{EvalError, ARITY_ONE};
use crate::eval::is_truthy;
use crate::interp::Interp;
use crate::value::{EnvRef, Value};

pub fn builtin_not(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("not", ARITY_ONE, args.len()));
    }
    let negated = !is_truthy(&interp.heap, args[0]);
    Ok(interp.heap.bool_new(negated))
}

/// Register the logic builtins in the global frame
pub fn register(interp: &mut Interp) {
    // Error values are falsy, so `not` must receive them rather than
    // have the apply path short-circuit.
    define_error_aware_builtin(interp, "not", builtin_not);
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
    fn test_not() {
        assert_eq!(run("(not true)"), "false");
        assert_eq!(run("(not false)"), "true");
        assert_eq!(run("(not nil)"), "true");
        assert_eq!(run("(not 0)"), "true");
        assert_eq!(run("(not 1)"), "false");
        assert_eq!(run("(not '(1))"), "false");
    }

    #[test]
    fn test_not_of_an_error_is_true() {
        assert_eq!(run("(not (error \"x\"))"), "true");
    }
}
