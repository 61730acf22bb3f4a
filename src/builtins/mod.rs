//! # Built-in Functions
//!
//! The primitives that close the evaluator, organized by category. Each
//! sub-module exposes a `register` function that binds its functions into
//! the global frame.
//!
//! - **[arithmetic]**: `+` `-` `*` `/` `%`
//! - **[comparison]**: `=` `<` `>` `<=` `>=`
//! - **[logic]**: `not`
//! - **[types]**: `type` and the type predicates
//! - **[lists]**: `cons` `car` `cdr` `list` `append` `length` `apply`
//!   `setcar` `setcdr`
//! - **[console]**: `print` `read`
//! - **[filesystem]**: `import`
//! - **[errors]**: `error` `error?` `error-msg`
//! - **[gc]**: `gc-mark` `gc-sweep` `gc-count`
//!
//! The macro-expansion primitives `expand-1` and `expand` live with the
//! expander and are registered here alongside the rest.

use crate::interp::Interp;
use crate::value::NativeFn;

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod errors;
pub mod filesystem;
pub mod gc;
pub mod lists;
pub mod logic;
pub mod types;

pub(crate) fn define_builtin(interp: &mut Interp, name: &'static str, f: NativeFn) {
    let value = interp.heap.builtin_new(name, f, false);
    interp.heap.env_put(interp.root, name, value);
}

/// Registers a builtin that receives Error arguments instead of having
/// the apply path short-circuit on them.
pub(crate) fn define_error_aware_builtin(interp: &mut Interp, name: &'static str, f: NativeFn) {
    let value = interp.heap.builtin_new(name, f, true);
    interp.heap.env_put(interp.root, name, value);
}

/// Register all built-in functions in the global frame
pub fn register_builtins(interp: &mut Interp) {
    arithmetic::register(interp);
    comparison::register(interp);
    logic::register(interp);
    types::register(interp);
    lists::register(interp);
    console::register(interp);
    filesystem::register(interp);
    errors::register(interp);
    gc::register(interp);

    define_builtin(interp, "expand-1", crate::expander::builtin_expand_1);
    define_builtin(interp, "expand", crate::expander::builtin_expand);
}
