// ABOUTME: Interpreter state and the EXEC / RUN-TESTS drivers

use crate::builtins::register_builtins;
use crate::error::EvalError;
use crate::eval;
use crate::heap::Heap;
use crate::reader::Reader;
use crate::value::{EnvRef, Object, Value};

/// Counters reported by the test runner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TestOutcome {
    pub passed: usize,
    pub failed: usize,
}

/// The interpreter: the heap, the global frame, and the bookkeeping the
/// collector needs to find its roots.
pub struct Interp {
    pub heap: Heap,
    pub root: EnvRef,
    /// Frames of calls and `let` bodies currently being evaluated.
    pub(crate) env_stack: Vec<EnvRef>,
    /// Values held alive while no frame references them yet (the form
    /// currently under evaluation at the top level).
    temp_roots: Vec<Value>,
}

impl Interp {
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let root = heap.env_new(None);
        let mut interp = Interp {
            heap,
            root,
            env_stack: Vec::new(),
            temp_roots: Vec::new(),
        };

        let t = interp.heap.bool_new(true);
        let f = interp.heap.bool_new(false);
        interp.heap.env_put(root, "nil", None);
        interp.heap.env_put(root, "true", t);
        interp.heap.env_put(root, "false", f);

        register_builtins(&mut interp);
        interp
    }

    /// EXEC: reads and evaluates each top-level form, printing non-nil
    /// results. The first Error - whether a reader Error value or an
    /// evaluation failure - goes to stderr and stops the rest of this
    /// source. The collector runs between forms when the heap asks for it.
    pub fn exec(&mut self, env: EnvRef, source: &str) {
        let mut reader = Reader::new(source);
        while let Some(form) = reader.next_form(&mut self.heap) {
            self.temp_roots.push(form);
            let result = eval::eval(self, env, form);
            self.temp_roots.pop();

            match result {
                Err(e) => {
                    eprintln!("{}", e);
                    break;
                }
                Ok(v) if self.heap.is_error(v) => {
                    let msg = self.heap.error_message(v).unwrap_or_default().to_string();
                    eprintln!("{}", msg);
                    break;
                }
                Ok(None) => {}
                Ok(v) => println!("{}", self.heap.render(v)),
            }

            if self.between_forms() && self.heap.should_collect() {
                self.collect();
            }
        }
    }

    /// Evaluates every form in `source` against the global frame and
    /// returns the last result. Reader failures come back as Error
    /// values. This is the library-facing entry point; nothing is
    /// printed and the collector is not triggered.
    pub fn eval_str(&mut self, source: &str) -> Result<Value, EvalError> {
        let mut reader = Reader::new(source);
        let mut last = None;
        while let Some(form) = reader.next_form(&mut self.heap) {
            if self.heap.is_error(form) {
                return Ok(form);
            }
            self.temp_roots.push(form);
            let result = eval::eval(self, self.root, form);
            self.temp_roots.pop();
            last = result?;
        }
        Ok(last)
    }

    /// RUN-TESTS: streams top-level forms and evaluates only those whose
    /// head symbol is `deftest`. A test passes when it evaluates to the
    /// Bool `true`. Prints one PASS/FAIL line per test.
    pub fn run_tests(&mut self, env: EnvRef, filename: &str, source: &str) -> TestOutcome {
        let mut outcome = TestOutcome::default();
        let mut reader = Reader::new(source);

        while let Some(form) = reader.next_form(&mut self.heap) {
            if self.heap.is_error(form) {
                let msg = self.heap.error_message(form).unwrap_or_default().to_string();
                eprintln!("{}: {}", filename, msg);
                outcome.failed += 1;
                break;
            }
            if !self.is_deftest(form) {
                continue;
            }

            let name = self.heap.render(self.heap.car(self.heap.cdr(form)));
            self.temp_roots.push(form);
            let result = eval::eval(self, env, form);
            self.temp_roots.pop();

            let passed = match &result {
                Ok(Some(r)) => matches!(self.heap.get(*r), Object::Bool(true)),
                Ok(None) => false,
                Err(e) => {
                    eprintln!("{}: {}", filename, e);
                    false
                }
            };
            if passed {
                println!("PASS {}", name);
                outcome.passed += 1;
            } else {
                println!("FAIL {}", name);
                outcome.failed += 1;
            }

            if self.between_forms() && self.heap.should_collect() {
                self.collect();
            }
        }
        outcome
    }

    fn is_deftest(&self, form: Value) -> bool {
        self.heap.is_cons(form) && self.heap.symbol_text(self.heap.car(form)) == Some("deftest")
    }

    /// True only at a genuine top-level boundary: no call or `let` frame
    /// is active and no form is mid-evaluation. A nested EXEC (via
    /// `import`) always sees the importing form on the root stack, so it
    /// never collects.
    fn between_forms(&self) -> bool {
        self.env_stack.is_empty() && self.temp_roots.is_empty()
    }

    /// Marks everything reachable from the collector's roots: the global
    /// frame, every frame on the active stack, and the temporary roots.
    pub fn mark_roots(&mut self) {
        let mut frames = vec![self.root];
        frames.extend(self.env_stack.iter().copied());
        let values = self.temp_roots.clone();
        self.heap.mark(&frames, &values);
    }

    /// One full mark-and-sweep cycle.
    pub fn collect(&mut self) {
        self.mark_roots();
        self.heap.sweep();
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_str_returns_last_value() {
        let mut interp = Interp::new();
        let v = interp.eval_str("1 2 3").unwrap();
        assert_eq!(interp.heap.render(v), "3");
    }

    #[test]
    fn test_eval_str_reader_error_is_a_value() {
        let mut interp = Interp::new();
        let v = interp.eval_str("(+ 1 2").unwrap();
        assert!(interp.heap.is_error(v));
    }

    #[test]
    fn test_true_false_nil_bound_in_global_frame() {
        let mut interp = Interp::new();
        let t = interp.eval_str("true").unwrap();
        assert_eq!(interp.heap.render(t), "true");
        let f = interp.eval_str("false").unwrap();
        assert_eq!(interp.heap.render(f), "false");
        let n = interp.eval_str("nil").unwrap();
        assert_eq!(interp.heap.render(n), "nil");
    }

    #[test]
    fn test_run_tests_counts() {
        let mut interp = Interp::new();
        let root = interp.root;
        let outcome = interp.run_tests(
            root,
            "sample_test.lisp",
            "(define helper 1) \
             (deftest passes (= 1 1)) \
             (deftest fails (= 1 2)) \
             (+ 1 2)",
        );
        // The helper define and the stray addition are not invoked.
        assert_eq!(outcome, TestOutcome { passed: 1, failed: 1 });
        assert_eq!(interp.eval_str("helper"), Ok(None));
    }

    #[test]
    fn test_run_tests_non_bool_result_fails() {
        let mut interp = Interp::new();
        let root = interp.root;
        let outcome = interp.run_tests(root, "t_test.lisp", "(deftest not-a-bool 1)");
        assert_eq!(outcome.failed, 1);
    }

    #[test]
    fn test_collect_reclaims_garbage() {
        let mut interp = Interp::new();
        interp.collect();
        let baseline = interp.heap.live_count();

        interp.eval_str("(list 1 2 3 4 5 6 7 8)").unwrap();
        assert!(interp.heap.live_count() > baseline);

        interp.collect();
        assert_eq!(interp.heap.live_count(), baseline);
    }

    #[test]
    fn test_collect_keeps_global_bindings() {
        let mut interp = Interp::new();
        interp.eval_str("(define keep '(1 2 3))").unwrap();
        interp.collect();
        let v = interp.eval_str("keep").unwrap();
        assert_eq!(interp.heap.render(v), "(1 2 3)");
    }
}
