mod common;

#[cfg(test)]
mod interpreter_tests {
    use std::thread;

    use pretty_assertions::assert_eq;
    use rox::error::{BufferedReporter, Reporter};
    use rox::interpreter::{
        max_call_depth_for_stack, Interpreter, DEFAULT_MAX_CALL_DEPTH, DEFAULT_STACK_SIZE,
    };

    use crate::common::{run, SharedBuffer};

    fn assert_prints(source: &str, expected: &[&str]) {
        let outcome = run(source);

        assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
        assert_eq!(outcome.output, expected);
    }

    fn assert_runtime_error(source: &str, expected: &str) {
        let outcome = run(source);

        assert!(outcome.had_runtime_error);
        assert!(!outcome.had_syntax_error);
        assert_eq!(outcome.errors, vec![expected.to_string()]);
    }

    // ─────────────────────────── expressions ───────────────────────────

    #[test]
    fn test_arithmetic_and_number_formatting() {
        assert_prints(
            "print 1 + 2; print 7 / 2; print -3 * 2; print (1 + 2) * 3;",
            &["3", "3.5", "-6", "9"],
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_prints("print 1 / 0; print -1 / 0;", &["inf", "-inf"]);
    }

    #[test]
    fn test_string_concatenation() {
        assert_prints(r#"print "foo" + "bar";"#, &["foobar"]);
    }

    #[test]
    fn test_truthiness_and_logic() {
        assert_prints(
            r#"print !nil; print !0; print nil or "x"; print false and 1; print 1 and 2;"#,
            &["true", "false", "x", "false", "2"],
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_prints(
            r#"
var calls = 0;
fun bump() { calls = calls + 1; return true; }
true or bump();
false and bump();
print calls;
"#,
            &["0"],
        );
    }

    #[test]
    fn test_equality() {
        assert_prints(
            r#"print nil == nil; print nil == false; print 1 == 1; print "a" == "a"; print 1 == "1"; print 1 != 2;"#,
            &["true", "false", "true", "true", "false", "true"],
        );
    }

    #[test]
    fn test_comparison() {
        assert_prints(
            "print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;",
            &["true", "true", "false", "false"],
        );
    }

    // ─────────────────────── variables and scope ───────────────────────

    #[test]
    fn test_block_shadowing() {
        assert_prints(
            r#"
var a = "outer";
{
  var a = "inner";
  print a;
}
print a;
"#,
            &["inner", "outer"],
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_prints("var a; print a;", &["nil"]);
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_prints("var a = 1; { a = 2; } print a;", &["2"]);
    }

    #[test]
    fn test_undefined_variable() {
        assert_runtime_error("print nope;", "[line 1] Error at 'nope': Undefined variable 'nope'.");
    }

    #[test]
    fn test_assign_to_undefined_variable() {
        assert_runtime_error("nope = 1;", "[line 1] Error at 'nope': Undefined variable 'nope'.");
    }

    // ─────────────────────────── control flow ──────────────────────────

    #[test]
    fn test_if_else() {
        assert_prints(
            r#"if (1 > 2) print "a"; else print "b"; if (nil) print "c";"#,
            &["b"],
        );
    }

    #[test]
    fn test_while_loop() {
        assert_prints("var i = 0; while (i < 3) { print i; i = i + 1; }", &["0", "1", "2"]);
    }

    #[test]
    fn test_for_loop() {
        assert_prints("for (var i = 0; i < 3; i = i + 1) print i;", &["0", "1", "2"]);
    }

    #[test]
    fn test_break_and_continue() {
        assert_prints(
            r#"
for (var i = 0; i < 10; i = i + 1) {
  if (i == 1) continue;
  if (i == 4) break;
  print i;
}
"#,
            &["0", "2", "3"],
        );
    }

    #[test]
    fn test_break_only_leaves_innermost_loop() {
        assert_prints(
            r#"
for (var i = 0; i < 2; i = i + 1) {
  while (true) break;
  print i;
}
"#,
            &["0", "1"],
        );
    }

    // ──────────────────────────── functions ────────────────────────────

    #[test]
    fn test_function_call_and_return() {
        assert_prints(
            r#"
fun add(a, b) { return a + b; }
print add(1, 2);
fun noReturn() {}
print noReturn();
"#,
            &["3", "nil"],
        );
    }

    #[test]
    fn test_return_unwinds_nested_loops() {
        assert_prints(
            r#"
fun find() {
  for (var i = 0; ; i = i + 1) {
    while (true) { if (i == 3) return i; break; }
  }
}
print find();
"#,
            &["3"],
        );
    }

    #[test]
    fn test_recursion() {
        assert_prints(
            r#"
fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
print fib(15);
"#,
            &["610"],
        );
    }

    #[test]
    fn test_closure_counter() {
        assert_prints(
            r#"
fun makeCounter() {
  var i = 0;
  fun count() { i = i + 1; print i; }
  return count;
}
var counter = makeCounter();
counter();
counter();
"#,
            &["1", "2"],
        );
    }

    #[test]
    fn test_closures_are_independent() {
        assert_prints(
            r#"
fun makeCounter() {
  var i = 0;
  fun count() { i = i + 1; return i; }
  return count;
}
var a = makeCounter();
var b = makeCounter();
a(); a();
print a();
print b();
"#,
            &["3", "1"],
        );
    }

    #[test]
    fn test_callable_display() {
        assert_prints(
            "fun f() {} print f; print clock; class C {} print C; print C();",
            &["<fn f>", "<native fn>", "C", "C instance"],
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_prints("print clock() > 0;", &["true"]);
    }

    #[test]
    fn test_arity_mismatch() {
        assert_runtime_error(
            "fun f(a, b) {}\nf(1);",
            "[line 2] Error at ')': Expected 2 arguments but got 1.",
        );
    }

    #[test]
    fn test_calling_a_non_callable() {
        assert_runtime_error(
            r#""not a function"();"#,
            "[line 1] Error at ')': Can only call functions and classes.",
        );
    }

    /// Runs `f` on a thread with `stack_size` bytes of stack.
    fn with_stack<T, F>(stack_size: usize, f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        thread::Builder::new()
            .stack_size(stack_size)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let (errors, had_runtime_error) = with_stack(DEFAULT_STACK_SIZE, || {
            let outcome = run("fun f() { f(); }\nf();");
            (outcome.errors, outcome.had_runtime_error)
        });

        assert!(had_runtime_error);
        assert_eq!(errors, vec!["[line 1] Error at ')': Stack overflow.".to_string()]);
    }

    #[test]
    fn test_deep_recursion_within_limit_succeeds() {
        let (output, errors) = with_stack(DEFAULT_STACK_SIZE, || {
            let outcome = run(
                "fun f(n) { if (n == 0) return 0; return f(n - 1) + 1; }\nprint f(300);\nprint f(3000);",
            );
            (outcome.output, outcome.errors)
        });

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(output, vec!["300", "3000"]);
    }

    #[test]
    fn test_depth_limit_sized_for_a_small_stack() {
        const SMALL_STACK: usize = 2 * 1024 * 1024;

        let (output, errors) = with_stack(SMALL_STACK, || {
            let out = SharedBuffer::default();
            let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
            interpreter.set_max_call_depth(max_call_depth_for_stack(SMALL_STACK));
            let mut reporter = BufferedReporter::new();

            rox::run(
                "fun f(n) { if (n == 0) return 0; return f(n - 1) + 1; }\nprint f(20);\nprint f(1000);",
                &mut interpreter,
                &mut reporter,
            );

            (out.lines(), reporter.take_messages())
        });

        assert_eq!(output, vec!["20"]);
        assert_eq!(errors, vec!["[line 1] Error at ')': Stack overflow.".to_string()]);
    }

    #[test]
    fn test_default_depth_matches_default_stack() {
        assert_eq!(DEFAULT_MAX_CALL_DEPTH, max_call_depth_for_stack(DEFAULT_STACK_SIZE));
        assert!(DEFAULT_MAX_CALL_DEPTH >= 1000);
        assert_eq!(max_call_depth_for_stack(0), 1);
    }

    #[test]
    fn test_call_depth_limit_is_configurable() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        interpreter.set_max_call_depth(3);
        let mut reporter = BufferedReporter::new();

        rox::run(
            "fun down(n) { print n; if (n > 0) down(n - 1); }\ndown(5);",
            &mut interpreter,
            &mut reporter,
        );

        assert_eq!(out.lines(), vec!["5", "4", "3"]);
        assert_eq!(
            reporter.messages(),
            &["[line 1] Error at ')': Stack overflow.".to_string()]
        );
    }

    // ───────────────────────── classes and instances ─────────────────────

    #[test]
    fn test_fields_and_methods() {
        assert_prints(
            r#"
class Point {
  init(x, y) { this.x = x; this.y = y; }
  sum() { return this.x + this.y; }
}
var p = Point(1, 2);
print p.sum();
p.x = 10;
print p.sum();
"#,
            &["3", "12"],
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_prints(
            r#"
class A { m() { return "method"; } }
var a = A();
a.m = "field";
print a.m;
"#,
            &["field"],
        );
    }

    #[test]
    fn test_bound_method_remembers_receiver() {
        assert_prints(
            r#"
class Person {
  init(name) { this.name = name; }
  greet() { print "hi " + this.name; }
}
var greet = Person("ann").greet;
greet();
"#,
            &["hi ann"],
        );
    }

    #[test]
    fn test_initializer_returns_this() {
        assert_prints(
            r#"
class A { init() { this.v = 1; } }
var a = A();
print a.init() == a;
"#,
            &["true"],
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_prints(
            r#"
class A { method() { print "A method"; } }
class B < A {
  method() { print "B method"; }
  test() { super.method(); }
}
class C < B {}
C().test();
C().method();
"#,
            &["A method", "B method"],
        );
    }

    #[test]
    fn test_inherited_initializer() {
        assert_prints(
            r#"
class A { init(v) { this.v = v; } }
class B < A {}
print B(7).v;
"#,
            &["7"],
        );
    }

    #[test]
    fn test_class_arity_comes_from_init() {
        assert_runtime_error(
            "class A { init(a) {} }\nA();",
            "[line 2] Error at ')': Expected 1 arguments but got 0.",
        );
    }

    #[test]
    fn test_undefined_property() {
        assert_runtime_error(
            "class A {}\nprint A().nope;",
            "[line 2] Error at 'nope': Undefined property 'nope'.",
        );
    }

    #[test]
    fn test_property_on_non_instance() {
        assert_runtime_error(
            "var x = 1;\nprint x.y;",
            "[line 2] Error at 'y': Only instances have properties.",
        );
    }

    #[test]
    fn test_field_on_non_instance() {
        assert_runtime_error(
            "var x = 1;\nx.y = 2;",
            "[line 2] Error at 'y': Only instances have fields.",
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_runtime_error(
            "var NotAClass = 1;\nclass B < NotAClass {}",
            "[line 2] Error at 'NotAClass': Superclass must be a class.",
        );
    }

    // ───────────────────────────── errors ──────────────────────────────

    #[test]
    fn test_mixed_plus_operands() {
        assert_runtime_error(
            r#"print 1 + "a";"#,
            "[line 1] Error at '+': Operands must be two numbers or two strings.",
        );
    }

    #[test]
    fn test_minus_on_string() {
        assert_runtime_error(
            r#"print "a" - 1;"#,
            "[line 1] Error at '-': Operands must be numbers.",
        );
    }

    #[test]
    fn test_negate_non_number() {
        assert_runtime_error(
            r#"print -"a";"#,
            "[line 1] Error at '-': Operand must be a number.",
        );
    }

    #[test]
    fn test_runtime_error_stops_execution() {
        let outcome = run("print 1;\nprint -nil;\nprint 2;");

        assert_eq!(outcome.output, vec!["1"]);
        assert!(outcome.had_runtime_error);
    }

    #[test]
    fn test_syntax_error_prevents_execution() {
        let outcome = run("print 1;\nprint ;");

        assert!(outcome.output.is_empty());
        assert!(outcome.had_syntax_error);
        assert!(!outcome.had_runtime_error);
    }

    #[test]
    fn test_lex_error_prevents_execution() {
        let outcome = run("print 1; @");

        assert!(outcome.output.is_empty());
        assert_eq!(
            outcome.errors,
            vec!["[line 1] Error: Unexpected character: '@'.".to_string()]
        );
    }

    // ───────────────────────────── sessions ────────────────────────────

    #[test]
    fn test_globals_persist_across_runs() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        let mut reporter = BufferedReporter::new();

        rox::run("var a = 1; fun inc() { a = a + 1; }", &mut interpreter, &mut reporter);
        rox::run("print -nil;", &mut interpreter, &mut reporter);
        assert!(reporter.had_runtime_error());

        reporter.reset();
        rox::run("inc(); print a;", &mut interpreter, &mut reporter);

        assert!(!reporter.had_runtime_error());
        assert_eq!(out.lines(), vec!["2"]);
    }

    #[test]
    fn test_closure_from_earlier_run_keeps_its_bindings() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        let mut reporter = BufferedReporter::new();

        rox::run(
            "fun make() { var n = 0; fun step() { n = n + 1; return n; } return step; }\nvar step = make();",
            &mut interpreter,
            &mut reporter,
        );
        rox::run("print step();", &mut interpreter, &mut reporter);
        rox::run("{ var n = 100; print step(); }", &mut interpreter, &mut reporter);

        assert!(reporter.messages().is_empty());
        assert_eq!(out.lines(), vec!["1", "2"]);
    }

    #[test]
    fn test_environment_restored_after_error_in_block() {
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        let mut reporter = BufferedReporter::new();

        rox::run(
            r#"var a = "global"; { var a = "local"; print -nil; }"#,
            &mut interpreter,
            &mut reporter,
        );
        reporter.reset();
        rox::run("print a;", &mut interpreter, &mut reporter);

        assert_eq!(out.lines(), vec!["global"]);
    }
}
