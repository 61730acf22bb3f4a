//! Output and reading back: print, read

use crate::builtins::{define_builtin, define_error_aware_builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::interp::Interp;
use crate::reader::Reader;
use crate::value::{type_name, EnvRef, Object, Value};

/// Prints the rendered arguments, space separated, followed by a newline.
pub fn builtin_print(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let rendered: Vec<String> = args.iter().map(|arg| interp.heap.render(*arg)).collect();
    println!("{}", rendered.join(" "));
    Ok(None)
}

/// Reads the first form out of a string. Reader failures come back as
/// Error values, like everywhere else.
pub fn builtin_read(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("read", ARITY_ONE, args.len()));
    }
    let source = match args[0] {
        Some(r) => match interp.heap.get(r) {
            Object::Str(s) => s.clone(),
            other => {
                return Err(EvalError::type_error(
                    "read",
                    "string",
                    other.type_name(),
                    1,
                ));
            }
        },
        None => {
            return Err(EvalError::type_error(
                "read",
                "string",
                type_name(&interp.heap, args[0]),
                1,
            ));
        }
    };
    Ok(Reader::new(&source)
        .next_form(&mut interp.heap)
        .unwrap_or(None))
}

/// Register the console builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_error_aware_builtin(interp, "print", builtin_print);
    define_builtin(interp, "read", builtin_read);
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
    fn test_print_returns_nil() {
        assert_eq!(run("(print 42)"), "nil");
    }

    #[test]
    fn test_read_parses_a_form() {
        assert_eq!(run("(read \"(+ 1 2)\")"), "(+ 1 2)");
        assert_eq!(run("(read \"42\")"), "42");
        assert_eq!(run("(read \"\")"), "nil");
    }

    #[test]
    fn test_eval_of_read_matches_direct_evaluation() {
        assert_eq!(run("(eval (read \"(+ 1 2 3)\"))"), run("(+ 1 2 3)"));
        assert_eq!(
            run("(define x 5) (eval (read \"(* x x)\"))"),
            run("(define x 5) (* x x)")
        );
    }

    #[test]
    fn test_read_error_is_a_value() {
        let mut interp = Interp::new();
        let v = interp.eval_str("(read \"(1 2\")").unwrap();
        assert!(interp.heap.is_error(v));
    }
}
