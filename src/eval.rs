// ABOUTME: Evaluator: special forms, invocation, quasiquote, truthiness

use crate::error::{
    EvalError, ARITY_AT_LEAST_ONE, ARITY_AT_MOST_MAX, ARITY_ONE, ARITY_TWO, ARITY_TWO_OR_THREE,
};
use crate::heap::Heap;
use crate::interp::Interp;
use crate::value::{type_name, Closure, EnvRef, Object, Value};

/// Hard cap on positional arguments in a single call.
pub const MAX_ARGS: usize = 64;

/// Evaluates one form in the given frame.
///
/// Numbers, strings, bools, callables, errors, nil, and keyword symbols
/// are themselves; other symbols are looked up along the chain (a miss is
/// nil); a cons is a special form or a call.
pub fn eval(interp: &mut Interp, env: EnvRef, form: Value) -> Result<Value, EvalError> {
    let Some(r) = form else {
        return Ok(None);
    };
    match interp.heap.get(r) {
        Object::Symbol(name) => {
            if name.starts_with(':') {
                return Ok(form);
            }
            let name = name.clone();
            Ok(interp.heap.env_get(env, &name).unwrap_or(None))
        }
        Object::Cons { .. } => eval_form(interp, env, form),
        _ => Ok(form),
    }
}

/// Collects the elements of a proper list; a dotted tail ends the walk.
pub fn list_elements(heap: &Heap, list: Value) -> Vec<Value> {
    let mut items = Vec::new();
    let mut cur = list;
    while let Some(r) = cur {
        match heap.get(r) {
            Object::Cons { car, cdr } => {
                items.push(*car);
                cur = *cdr;
            }
            _ => break,
        }
    }
    items
}

/// nil, false, 0, and errors are falsy; everything else is truthy.
pub fn is_truthy(heap: &Heap, v: Value) -> bool {
    match v {
        None => false,
        Some(r) => match heap.get(r) {
            Object::Bool(b) => *b,
            Object::Number(n) => *n != 0,
            Object::Error(_) => false,
            _ => true,
        },
    }
}

fn eval_form(interp: &mut Interp, env: EnvRef, form: Value) -> Result<Value, EvalError> {
    let head = interp.heap.car(form);
    let special = interp.heap.symbol_text(head).map(str::to_string);
    let args = list_elements(&interp.heap, interp.heap.cdr(form));

    if let Some(name) = special.as_deref() {
        match name {
            "quote" => return eval_quote(&args),
            "quasiquote" => return eval_quasiquote(interp, env, &args),
            "eval" => return eval_eval(interp, env, &args),
            "define" => return eval_define(interp, env, &args),
            "set" => return eval_set(interp, env, &args),
            "let" => return eval_let(interp, env, &args),
            "lambda" => return eval_lambda(interp, env, &args, false),
            "macro" => return eval_lambda(interp, env, &args, true),
            "do" => return eval_sequence(interp, env, &args),
            "if" => return eval_if(interp, env, &args),
            "deftest" => return eval_deftest(interp, env, &args),
            _ => {}
        }
    }

    eval_call(interp, env, head, &args)
}

// ===== Special forms =====

fn eval_quote(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("quote", ARITY_ONE, args.len()));
    }
    Ok(args[0])
}

fn eval_eval(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("eval", ARITY_ONE, args.len()));
    }
    let once = eval(interp, env, args[0])?;
    eval(interp, env, once)
}

fn eval_define(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("define", ARITY_TWO, args.len()));
    }
    let Some(name) = interp.heap.symbol_text(args[0]).map(str::to_string) else {
        return Err(EvalError::type_error(
            "define",
            "symbol",
            type_name(&interp.heap, args[0]),
            1,
        ));
    };
    let value = eval(interp, env, args[1])?;
    interp.heap.env_define_at_root(env, &name, value);
    Ok(None)
}

/// (set name val) or (set (n1 v1) (n2 v2) ...)
fn eval_set(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("set", ARITY_AT_LEAST_ONE, 0));
    }

    if let Some(name) = interp.heap.symbol_text(args[0]).map(str::to_string) {
        if args.len() != 2 {
            return Err(EvalError::arity_error("set", ARITY_TWO, args.len()));
        }
        let value = eval(interp, env, args[1])?;
        interp.heap.env_set(env, &name, value);
        return Ok(None);
    }

    for (i, pair) in args.iter().enumerate() {
        let items = list_elements(&interp.heap, *pair);
        let name = if items.len() == 2 {
            interp.heap.symbol_text(items[0]).map(str::to_string)
        } else {
            None
        };
        let Some(name) = name else {
            return Err(EvalError::type_error(
                "set",
                "(name value) pair",
                type_name(&interp.heap, *pair),
                i + 1,
            ));
        };
        let value = eval(interp, env, items[1])?;
        interp.heap.env_set(env, &name, value);
    }
    Ok(None)
}

/// (let (n1 v1 n2 v2 ...) body...) - binding values are evaluated in the
/// enclosing frame, left to right; the body runs in the fresh frame.
fn eval_let(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("let", ARITY_AT_LEAST_ONE, 0));
    }
    if args[0].is_some() && !interp.heap.is_cons(args[0]) {
        return Err(EvalError::type_error(
            "let",
            "binding list",
            type_name(&interp.heap, args[0]),
            1,
        ));
    }
    let bindings = list_elements(&interp.heap, args[0]);
    if bindings.len() % 2 != 0 {
        return Err(EvalError::Syntax(
            "let: bindings must be name/value pairs".to_string(),
        ));
    }

    let frame = interp.heap.env_new(Some(env));
    for pair in bindings.chunks(2) {
        let Some(name) = interp.heap.symbol_text(pair[0]).map(str::to_string) else {
            return Err(EvalError::type_error(
                "let",
                "symbol",
                type_name(&interp.heap, pair[0]),
                1,
            ));
        };
        let value = eval(interp, env, pair[1])?;
        interp.heap.env_put(frame, &name, value);
    }

    interp.env_stack.push(frame);
    let result = eval_sequence(interp, frame, &args[1..]);
    interp.env_stack.pop();
    result
}

fn eval_lambda(
    interp: &mut Interp,
    env: EnvRef,
    args: &[Value],
    is_macro: bool,
) -> Result<Value, EvalError> {
    let form_name = if is_macro { "macro" } else { "lambda" };
    if args.len() != 2 {
        return Err(EvalError::arity_error(form_name, ARITY_TWO, args.len()));
    }
    let rest = parse_params(&interp.heap, args[0], form_name)?;
    let closure = Closure {
        params: args[0],
        body: args[1],
        env,
        rest,
    };
    Ok(if is_macro {
        interp.heap.macro_new(closure)
    } else {
        interp.heap.function_new(closure)
    })
}

/// Evaluates forms in order, returning the last result (nil if empty).
fn eval_sequence(interp: &mut Interp, env: EnvRef, forms: &[Value]) -> Result<Value, EvalError> {
    let mut result = None;
    for form in forms {
        result = eval(interp, env, *form)?;
    }
    Ok(result)
}

fn eval_if(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if !(2..=3).contains(&args.len()) {
        return Err(EvalError::arity_error("if", ARITY_TWO_OR_THREE, args.len()));
    }
    let cond = eval(interp, env, args[0])?;
    if is_truthy(&interp.heap, cond) {
        eval(interp, env, args[1])
    } else if args.len() == 3 {
        eval(interp, env, args[2])
    } else {
        Ok(None)
    }
}

/// (deftest name body...) - the name is not evaluated; the body runs like
/// `do`. The test runner picks these out of test files by head symbol.
fn eval_deftest(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("deftest", ARITY_AT_LEAST_ONE, 0));
    }
    if interp.heap.symbol_text(args[0]).is_none() {
        return Err(EvalError::type_error(
            "deftest",
            "symbol",
            type_name(&interp.heap, args[0]),
            1,
        ));
    }
    eval_sequence(interp, env, &args[1..])
}

// ===== Quasiquote =====

fn eval_quasiquote(interp: &mut Interp, env: EnvRef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("quasiquote", ARITY_ONE, args.len()));
    }
    quasi_copy(interp, env, args[0])
}

/// Structurally copies the template, replacing each (unquote e) with the
/// result of evaluating e. The copy leaves the source template untouched.
fn quasi_copy(interp: &mut Interp, env: EnvRef, template: Value) -> Result<Value, EvalError> {
    if !interp.heap.is_cons(template) {
        return Ok(template);
    }
    if let Some(expr) = unquote_payload(interp, template)? {
        return eval(interp, env, expr);
    }
    let car = interp.heap.car(template);
    let cdr = interp.heap.cdr(template);
    let new_car = quasi_copy(interp, env, car)?;
    let new_cdr = quasi_copy(interp, env, cdr)?;
    Ok(interp.heap.cons_new(new_car, new_cdr))
}

fn unquote_payload(interp: &Interp, form: Value) -> Result<Option<Value>, EvalError> {
    let head = interp.heap.car(form);
    if interp.heap.symbol_text(head) != Some("unquote") {
        return Ok(None);
    }
    let args = list_elements(&interp.heap, interp.heap.cdr(form));
    if args.len() != 1 {
        return Err(EvalError::arity_error("unquote", ARITY_ONE, args.len()));
    }
    Ok(Some(args[0]))
}

// ===== Invocation =====

fn eval_call(
    interp: &mut Interp,
    env: EnvRef,
    head: Value,
    arg_forms: &[Value],
) -> Result<Value, EvalError> {
    let callee = eval(interp, env, head)?;
    let head_text = interp.heap.render(head);
    let Some(cr) = callee else {
        return Err(EvalError::Name(format!(
            "function '{}' is undefined",
            head_text
        )));
    };
    if arg_forms.len() > MAX_ARGS {
        return Err(EvalError::arity_error(
            &head_text,
            ARITY_AT_MOST_MAX,
            arg_forms.len(),
        ));
    }

    if let Object::Macro(closure) = interp.heap.get(cr) {
        // Macro arguments stay unevaluated; the expansion is evaluated in
        // the caller's frame.
        let closure = closure.clone();
        let expansion = apply_closure(interp, &closure, arg_forms)?;
        return eval(interp, env, expansion);
    }

    let error_aware = matches!(
        interp.heap.get(cr),
        Object::Builtin {
            handles_errors: true,
            ..
        }
    );
    let argv = match eval_args(interp, env, arg_forms, error_aware)? {
        Ok(argv) => argv,
        Err(bubbled) => return Ok(bubbled),
    };
    apply_function(interp, env, callee, &argv, &head_text)
}

/// Evaluates argument forms in the caller's frame. Unless the callee is
/// an error-aware builtin, an argument that evaluates to an Error value
/// short-circuits the call.
fn eval_args(
    interp: &mut Interp,
    env: EnvRef,
    forms: &[Value],
    error_aware: bool,
) -> Result<Result<Vec<Value>, Value>, EvalError> {
    let mut argv = Vec::with_capacity(forms.len());
    for form in forms {
        let v = eval(interp, env, *form)?;
        if !error_aware && interp.heap.is_error(v) {
            return Ok(Err(v));
        }
        argv.push(v);
    }
    Ok(Ok(argv))
}

/// Applies a callable to already-evaluated arguments. Built-ins run
/// against the caller's frame; user-defined functions bind their
/// parameters in a fresh child of the frame they captured. The argument
/// cap holds here so that `apply` cannot smuggle in an oversized vector.
pub fn apply_function(
    interp: &mut Interp,
    env: EnvRef,
    callee: Value,
    argv: &[Value],
    label: &str,
) -> Result<Value, EvalError> {
    let Some(cr) = callee else {
        return Err(EvalError::Name(format!(
            "function '{}' is undefined",
            label
        )));
    };
    if argv.len() > MAX_ARGS {
        return Err(EvalError::arity_error(label, ARITY_AT_MOST_MAX, argv.len()));
    }
    match interp.heap.get(cr) {
        Object::Builtin { f, .. } => {
            let f = *f;
            f(interp, env, argv)
        }
        Object::Function(closure) => {
            let closure = closure.clone();
            apply_closure(interp, &closure, argv)
        }
        other => Err(EvalError::runtime_error(
            label,
            format!("value of type {} is not callable", other.type_name()),
        )),
    }
}

/// Binds arguments in a fresh child of the captured frame and evaluates
/// the body there. Shared by function calls and macro expansion.
pub(crate) fn apply_closure(
    interp: &mut Interp,
    closure: &Closure,
    argv: &[Value],
) -> Result<Value, EvalError> {
    let frame = interp.heap.env_new(Some(closure.env));
    let names = param_names(&interp.heap, closure.params);

    match closure.rest {
        None => {
            for (i, name) in names.iter().enumerate() {
                let v = argv.get(i).copied().flatten();
                interp.heap.env_put(frame, name, v);
            }
        }
        Some(r) => {
            for (i, name) in names.iter().take(r).enumerate() {
                let v = argv.get(i).copied().flatten();
                interp.heap.env_put(frame, name, v);
            }
            let rest = argv.get(r..).unwrap_or(&[]).to_vec();
            let rest_list = interp.heap.list_from(&rest);
            interp.heap.env_put(frame, &names[r], rest_list);
        }
    }

    interp.env_stack.push(frame);
    let result = eval(interp, frame, closure.body);
    interp.env_stack.pop();
    result
}

/// Checks the parameter list at construction time and locates the `&`
/// marker; returns the rest-arg position when present.
fn parse_params(heap: &Heap, params: Value, form_name: &str) -> Result<Option<usize>, EvalError> {
    if params.is_some() && !heap.is_cons(params) {
        return Err(EvalError::type_error(
            form_name,
            "parameter list",
            type_name(heap, params),
            1,
        ));
    }

    let mut rest = None;
    let mut saw_amp = false;
    let mut bound = 0;
    for param in list_elements(heap, params) {
        let Some(name) = heap.symbol_text(param) else {
            return Err(EvalError::type_error(
                form_name,
                "symbol",
                type_name(heap, param),
                bound + 1,
            ));
        };
        if name == "&" {
            if saw_amp {
                return Err(EvalError::Syntax(format!(
                    "{}: only one & marker is allowed",
                    form_name
                )));
            }
            saw_amp = true;
        } else {
            if saw_amp && rest.is_some() {
                return Err(EvalError::Syntax(format!(
                    "{}: only one parameter may follow &",
                    form_name
                )));
            }
            if saw_amp {
                rest = Some(bound);
            }
            bound += 1;
        }
    }
    if saw_amp && rest.is_none() {
        return Err(EvalError::Syntax(format!(
            "{}: expected parameter name after &",
            form_name
        )));
    }
    Ok(rest)
}

/// Parameter names in binding order, with the `&` marker dropped.
fn param_names(heap: &Heap, params: Value) -> Vec<String> {
    list_elements(heap, params)
        .into_iter()
        .filter_map(|p| heap.symbol_text(p).map(str::to_string))
        .filter(|name| name != "&")
        .collect()
}
