//! Arithmetic operations: +, -, *, /, %
//!
//! Machine-width integer arithmetic with wrapping overflow.
//!
//! - `+`: Sum of all arguments (identity: 0)
//! - `-`: Subtract subsequent args from first, or negate if single arg
//! - `*`: Product of all arguments (identity: 1)
//! - `/`: Divide first by subsequent args, or reciprocal if single arg
//! - `%`: Remainder operation - exactly 2 args required

use crate::builtins::define_builtin;
use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_TWO};
use crate::interp::Interp;
use crate::value::{EnvRef, Object, Value};

fn number_arg(
    interp: &Interp,
    function: &str,
    args: &[Value],
    i: usize,
) -> Result<i64, EvalError> {
    match args[i] {
        Some(r) => match interp.heap.get(r) {
            Object::Number(n) => Ok(*n),
            other => Err(EvalError::type_error(
                function,
                "number",
                other.type_name(),
                i + 1,
            )),
        },
        None => Err(EvalError::type_error(function, "number", "nil", i + 1)),
    }
}

/// Returns the sum of all arguments.
pub fn builtin_add(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let mut sum: i64 = 0;
    for i in 0..args.len() {
        sum = sum.wrapping_add(number_arg(interp, "+", args, i)?);
    }
    Ok(interp.heap.number_new(sum))
}

/// Subtracts subsequent arguments from the first; negates a single one.
pub fn builtin_sub(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("-", ARITY_AT_LEAST_ONE, 0));
    }
    let first = number_arg(interp, "-", args, 0)?;
    if args.len() == 1 {
        return Ok(interp.heap.number_new(first.wrapping_neg()));
    }
    let mut result = first;
    for i in 1..args.len() {
        result = result.wrapping_sub(number_arg(interp, "-", args, i)?);
    }
    Ok(interp.heap.number_new(result))
}

/// Returns the product of all arguments.
pub fn builtin_mul(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    let mut product: i64 = 1;
    for i in 0..args.len() {
        product = product.wrapping_mul(number_arg(interp, "*", args, i)?);
    }
    Ok(interp.heap.number_new(product))
}

/// Divides the first argument by subsequent arguments.
pub fn builtin_div(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("/", ARITY_AT_LEAST_ONE, 0));
    }
    let first = number_arg(interp, "/", args, 0)?;
    if args.len() == 1 {
        if first == 0 {
            return Err(EvalError::runtime_error("/", "division by zero"));
        }
        return Ok(interp.heap.number_new(1_i64.wrapping_div(first)));
    }
    let mut result = first;
    for i in 1..args.len() {
        let divisor = number_arg(interp, "/", args, i)?;
        if divisor == 0 {
            return Err(EvalError::runtime_error("/", "division by zero"));
        }
        result = result.wrapping_div(divisor);
    }
    Ok(interp.heap.number_new(result))
}

/// Returns the remainder when the first argument is divided by the second.
pub fn builtin_mod(interp: &mut Interp, _env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("%", ARITY_TWO, args.len()));
    }
    let a = number_arg(interp, "%", args, 0)?;
    let b = number_arg(interp, "%", args, 1)?;
    if b == 0 {
        return Err(EvalError::runtime_error("%", "division by zero"));
    }
    Ok(interp.heap.number_new(a.wrapping_rem(b)))
}

/// Register all arithmetic builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_builtin(interp, "+", builtin_add);
    define_builtin(interp, "-", builtin_sub);
    define_builtin(interp, "*", builtin_mul);
    define_builtin(interp, "/", builtin_div);
    define_builtin(interp, "%", builtin_mod);
}
