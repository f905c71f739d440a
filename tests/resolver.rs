mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use crate::common::run;

    fn assert_static_error(source: &str, expected: &str) {
        let outcome = run(source);

        assert!(outcome.had_syntax_error, "expected a static error for {source:?}");
        assert!(!outcome.had_runtime_error);
        assert!(outcome.output.is_empty(), "nothing may run after a static error");
        assert_eq!(outcome.errors, vec![expected.to_string()]);
    }

    #[test]
    fn test_binding_is_fixed_at_declaration_site() {
        let outcome = run(
            r#"
var a = "global";
{
  fun showA() { print a; }
  showA();
  var a = "block";
  showA();
}
"#,
        );

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.output, vec!["global", "global"]);
    }

    #[test]
    fn test_local_in_own_initializer() {
        assert_static_error(
            "{ var a = 1; { var a = a; } }",
            "[line 1] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_global_self_reference_is_not_static_error() {
        let outcome = run("var a = a;");

        assert!(!outcome.had_syntax_error);
        assert_eq!(
            outcome.errors,
            vec!["[line 1] Error at 'a': Undefined variable 'a'.".to_string()]
        );
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_static_error(
            "{ var a = 1; var a = 2; }",
            "[line 1] Error at 'a': Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        let outcome = run("var a = 1; var a = 2; print a;");

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.output, vec!["2"]);
    }

    #[test]
    fn test_return_at_top_level() {
        assert_static_error(
            "return 1;",
            "[line 1] Error at 'return': Can't return from top-level code.",
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_static_error(
            "class A { init() { return 1; } }",
            "[line 1] Error at 'return': Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        let outcome = run("class A { init() { return; } } print A();");

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.output, vec!["A instance"]);
    }

    #[test]
    fn test_this_outside_class() {
        assert_static_error(
            "print this;",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_this_in_plain_function() {
        assert_static_error(
            "fun f() { return this; }",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_static_error(
            "super.foo();",
            "[line 1] Error at 'super': Can't use 'super' outside of a class.",
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_static_error(
            "class A { m() { super.m(); } }",
            "[line 1] Error at 'super': Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_static_error(
            "class A < A {}",
            "[line 1] Error at 'A': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_break_outside_loop() {
        assert_static_error(
            "break;",
            "[line 1] Error at 'break': Can't use 'break' outside of a loop.",
        );
    }

    #[test]
    fn test_continue_inside_function_inside_loop() {
        assert_static_error(
            "while (true) { fun f() { continue; } }",
            "[line 1] Error at 'continue': Can't use 'continue' outside of a loop.",
        );
    }

    #[test]
    fn test_every_static_error_is_reported() {
        let outcome = run("return 1;\nprint this;\n{ var b = 1; var b = 2; }");

        assert_eq!(
            outcome.errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.".to_string(),
                "[line 2] Error at 'this': Can't use 'this' outside of a class.".to_string(),
                "[line 3] Error at 'b': Already a variable with this name in this scope."
                    .to_string(),
            ]
        );
    }
}
