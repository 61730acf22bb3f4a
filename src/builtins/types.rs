//! Type inspection: type plus the type predicates

use crate::builtins::{define_builtin, define_error_aware_builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::interp::Interp;
use crate::value::{type_name, EnvRef, Object, Value};

pub fn builtin_type(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("type", ARITY_ONE, args.len()));
    }
    let name = type_name(&interp.heap, args[0]);
    Ok(interp.heap.str_new(name))
}

fn one_arg(name: &'static str, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error(name, ARITY_ONE, args.len()));
    }
    Ok(args[0])
}

pub fn builtin_is_number(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("number?", args)?;
    let is = matches!(v, Some(r) if matches!(interp.heap.get(r), Object::Number(_)));
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_is_string(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("string?", args)?;
    let is = matches!(v, Some(r) if matches!(interp.heap.get(r), Object::Str(_)));
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_is_symbol(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("symbol?", args)?;
    let is = matches!(v, Some(r) if matches!(interp.heap.get(r), Object::Symbol(_)));
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_is_bool(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("bool?", args)?;
    let is = matches!(v, Some(r) if matches!(interp.heap.get(r), Object::Bool(_)));
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_is_cons(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("cons?", args)?;
    let is = interp.heap.is_cons(v);
    Ok(interp.heap.bool_new(is))
}

pub fn builtin_is_nil(
    interp: &mut Interp,
    _env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    let v = one_arg("nil?", args)?;
    Ok(interp.heap.bool_new(v.is_none()))
}

/// Register the type builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_error_aware_builtin(interp, "type", builtin_type);
    define_builtin(interp, "number?", builtin_is_number);
    define_builtin(interp, "string?", builtin_is_string);
    define_builtin(interp, "symbol?", builtin_is_symbol);
    define_builtin(interp, "bool?", builtin_is_bool);
    define_builtin(interp, "cons?", builtin_is_cons);
    define_builtin(interp, "nil?", builtin_is_nil);
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
    fn test_type_names() {
        assert_eq!(run("(type 1)"), "number");
        assert_eq!(run("(type \"s\")"), "string");
        assert_eq!(run("(type 'x)"), "symbol");
        assert_eq!(run("(type true)"), "bool");
        assert_eq!(run("(type '(1))"), "cons");
        assert_eq!(run("(type nil)"), "nil");
        assert_eq!(run("(type (lambda (x) x))"), "function");
        assert_eq!(run("(type car)"), "function");
        assert_eq!(run("(type (macro (x) x))"), "macro");
        assert_eq!(run("(type (error \"e\"))"), "error");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(run("(number? 1)"), "true");
        assert_eq!(run("(number? \"1\")"), "false");
        assert_eq!(run("(string? \"s\")"), "true");
        assert_eq!(run("(symbol? 'x)"), "true");
        assert_eq!(run("(bool? false)"), "true");
        assert_eq!(run("(cons? '(1))"), "true");
        assert_eq!(run("(cons? nil)"), "false");
        assert_eq!(run("(nil? nil)"), "true");
        assert_eq!(run("(nil? '())"), "true");
        assert_eq!(run("(nil? 0)"), "false");
    }
}
