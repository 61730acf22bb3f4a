//! File ingestion: import
//!
//! `import` reads a file relative to the process working directory and
//! runs it through EXEC against the calling frame, so imported
//! definitions land wherever the caller's chain roots them.

use crate::builtins::define_builtin;
use crate::error::{EvalError, ARITY_ONE};
use crate::interp::Interp;
use crate::value::{type_name, EnvRef, Object, Value};

pub fn builtin_import(
    interp: &mut Interp,
    env: EnvRef,
    args: &[Value],
) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("import", ARITY_ONE, args.len()));
    }
    let path = match args[0] {
        Some(r) => match interp.heap.get(r) {
            Object::Str(s) => s.clone(),
            other => {
                return Err(EvalError::type_error(
                    "import",
                    "string",
                    other.type_name(),
                    1,
                ));
            }
        },
        None => {
            return Err(EvalError::type_error(
                "import",
                "string",
                type_name(&interp.heap, args[0]),
                1,
            ));
        }
    };

    let source = std::fs::read_to_string(&path)
        .map_err(|_| EvalError::Io(format!("import error: '{}' file not found", path)))?;
    interp.exec(env, &source);
    Ok(None)
}

/// Register the filesystem builtins in the global frame
pub fn register(interp: &mut Interp) {
    define_builtin(interp, "import", builtin_import);
}
