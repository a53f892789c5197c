mod common;

use pretty_assertions::assert_eq;

use common::{output_of, run, session, Capture};
use rox::error::RuntimeError;
use rox::interpreter::Interpreter;
use rox::session::{RunError, Session};
use rox::value::Value;

/// Run `source`, expecting a runtime error; returns the output printed
/// before it and the error.
fn runtime_error(source: &str) -> (String, RuntimeError) {
    match run(source) {
        (out, Err(RunError::Runtime(e))) => (out, e),
        (out, other) => panic!("expected a runtime error, got {:?} after {:?}", other, out),
    }
}

fn error_message(source: &str) -> String {
    runtime_error(source).1.to_string()
}

// ───────────────────────────── expressions ─────────────────────────────

#[test]
fn arithmetic_and_number_formatting() {
    assert_eq!(
        output_of("print 1 + 2; print 7 / 2; print -0; print 1 / 0; print 2 * 3 - 4;"),
        "3\n3.5\n-0\ninf\n2\n"
    );
}

#[test]
fn string_concatenation() {
    assert_eq!(output_of("print \"a\" + \"b\";"), "ab\n");
}

#[test]
fn equality_is_strict() {
    assert_eq!(
        output_of(
            "print 1 == 1; print \"a\" == \"a\"; print nil == false; \
             print 1 == \"1\"; print nil == nil; print 1 != 2;"
        ),
        "true\ntrue\nfalse\nfalse\ntrue\ntrue\n"
    );
}

#[test]
fn nan_is_equal_to_itself() {
    assert_eq!(
        output_of("var n = 0 / 0; print n == n; print n != n; print n == 0;"),
        "true\nfalse\nfalse\n"
    );
}

#[test]
fn truthiness() {
    assert_eq!(
        output_of("print !nil; print !false; print !0; print !\"\";"),
        "true\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn logical_operators_return_deciding_operand() {
    assert_eq!(
        output_of(
            "print nil or \"x\"; print 0 and 1; print false and boom; print true or boom;"
        ),
        "x\n1\nfalse\ntrue\n"
    );
}

// ───────────────────────────── statements ──────────────────────────────

#[test]
fn block_shadowing() {
    assert_eq!(
        output_of("var a = 1; { var b = a + 1; var a = b; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn uninitialized_variable_is_nil() {
    assert_eq!(output_of("var a; print a;"), "nil\n");
}

#[test]
fn while_and_for_loops() {
    assert_eq!(
        output_of(
            "var i = 0; while (i < 3) { print i; i = i + 1; }\n\
             for (var j = 0; j < 2; j = j + 1) print j;"
        ),
        "0\n1\n2\n0\n1\n"
    );
}

#[test]
fn if_else() {
    assert_eq!(
        output_of("if (1 > 2) print \"yes\"; else print \"no\"; if (nil) print \"never\";"),
        "no\n"
    );
}

// ───────────────────────────── functions ───────────────────────────────

#[test]
fn recursion() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                  print fib(10);";

    assert_eq!(output_of(source), "55\n");
}

#[test]
fn return_unwinds_loops() {
    assert_eq!(
        output_of("fun f() { while (true) { return \"done\"; } } print f();"),
        "done\n"
    );
}

#[test]
fn missing_return_yields_nil() {
    assert_eq!(output_of("fun f() {} print f();"), "nil\n");
}

#[test]
fn closures_keep_mutable_state() {
    let source = r#"
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                return i;
            }
            return count;
        }

        var c = makeCounter();
        print c();
        print c();
        var d = makeCounter();
        print d();
    "#;

    assert_eq!(output_of(source), "1\n2\n1\n");
}

#[test]
fn closures_capture_variables_not_values() {
    let source = r#"
        var f;
        {
            var a = "one";
            fun g() { print a; }
            f = g;
            a = "two";
        }
        f();
    "#;

    assert_eq!(output_of(source), "two\n");
}

#[test]
fn callable_display() {
    assert_eq!(
        output_of("fun f() {} print f; print clock; print clock() > 0;"),
        "<fn f>\n<native fn>\ntrue\n"
    );
}

// ───────────────────────────── classes ─────────────────────────────────

#[test]
fn fields_methods_and_initializer() {
    let source = r#"
        class Point {
            init(x, y) {
                this.x = x;
                this.y = y;
            }
            sum() { return this.x + this.y; }
        }

        var p = Point(1, 2);
        print p.sum();
        print p;
        print Point;
        p.x = 10;
        print p.sum();
    "#;

    assert_eq!(output_of(source), "3\nPoint instance\nPoint\n12\n");
}

#[test]
fn initializer_always_returns_this() {
    let source = r#"
        class A {
            init() {
                this.v = 1;
                return;
            }
        }

        var a = A();
        print a.init() == a;
        print a.v;
    "#;

    assert_eq!(output_of(source), "true\n1\n");
}

#[test]
fn bound_methods_remember_their_instance() {
    let source = r#"
        class A {
            init() { this.n = "x"; }
            get() { return this.n; }
        }

        var m = A().get;
        print m();
    "#;

    assert_eq!(output_of(source), "x\n");
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output_of("class A { m() { return 1; } } var a = A(); a.m = 2; print a.m;"),
        "2\n"
    );
}

#[test]
fn inheritance_and_super_chains() {
    let source = r#"
        class A {
            hi() { return "A"; }
            name() { return "a"; }
        }
        class B < A {
            hi() { return "B" + super.hi(); }
        }
        class C < B {
            hi() { return "C" + super.hi(); }
        }

        print C().hi();
        print C().name();
    "#;

    assert_eq!(output_of(source), "CBA\na\n");
}

#[test]
fn super_methods_keep_the_subclass_instance_as_this() {
    let source = r#"
        class A {
            m() { return this.tag; }
        }
        class B < A {
            m() { return "B" + super.m(); }
        }

        var b = B();
        b.tag = "b";
        print b.m();
    "#;

    assert_eq!(output_of(source), "Bb\n");
}

#[test]
fn initializer_is_inherited() {
    assert_eq!(
        output_of("class A { init(n) { this.n = n; } } class B < A {} print B(3).n;"),
        "3\n"
    );
}

// ───────────────────────────── runtime errors ──────────────────────────

#[test]
fn operand_type_errors() {
    assert_eq!(error_message("print -\"a\";"), "Operand must be a number.\n[line 1]");
    assert_eq!(
        error_message("print \"a\" + 1;"),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
    assert_eq!(error_message("print 1 < \"a\";"), "Operands must be numbers.\n[line 1]");
}

#[test]
fn undefined_variables() {
    assert_eq!(
        error_message("print missing;"),
        "Undefined variable 'missing'.\n[line 1]"
    );
    assert_eq!(error_message("x = 1;"), "Undefined variable 'x'.\n[line 1]");
}

#[test]
fn arity_mismatch() {
    assert_eq!(
        error_message("fun f(a, b) {} f(1);"),
        "Expected 2 arguments but got 1.\n[line 1]"
    );
    assert_eq!(
        error_message("fun f(a, b) {} f(1, 2, 3);"),
        "Expected 2 arguments but got 3.\n[line 1]"
    );
    assert_eq!(
        error_message("class A { init(a) {} } A();"),
        "Expected 1 arguments but got 0.\n[line 1]"
    );
}

#[test]
fn calling_non_callables() {
    assert_eq!(
        error_message("\"s\"();"),
        "Can only call functions and classes.\n[line 1]"
    );
}

#[test]
fn property_errors() {
    assert_eq!(
        error_message("class A {} print A().nope;"),
        "Undefined property 'nope'.\n[line 1]"
    );
    assert_eq!(
        error_message("var x = 1; print x.y;"),
        "Only instances have properties.\n[line 1]"
    );
    assert_eq!(
        error_message("var x = 1; x.y = 2;"),
        "Only instances have fields.\n[line 1]"
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_eq!(
        error_message("var NotClass = 1;\nclass B < NotClass {}"),
        "Superclass must be a class.\n[line 2]"
    );
}

#[test]
fn runtime_error_stops_the_program() {
    let (out, error) = runtime_error("print 1;\n\nprint nil + 1;\nprint 2;");

    assert_eq!(out, "1\n");
    assert_eq!(error.line, 3);
    assert_eq!(RunError::Runtime(error).exit_code(), 70);
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    // Debug builds use large frames; give the interpreter room to reach its
    // own depth limit.
    let outcome = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let (mut session, capture) = session();

            let overflow = session
                .run("fun f() { f(); }\nf();")
                .map_err(|e| e.to_string());
            session
                .run("fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); }\nprint count(200);")
                .expect("bounded recursion runs");

            (overflow, capture.contents())
        })
        .expect("spawns")
        .join()
        .expect("no crash");

    assert_eq!(outcome, (Err("Stack overflow.\n[line 1]".to_string()), "200\n".to_string()));
}

// ───────────────────────────── sessions ────────────────────────────────

#[test]
fn runs_are_deterministic() {
    let source = "var s = \"\"; for (var i = 0; i < 5; i = i + 1) s = s + \"*\"; print s;";

    assert_eq!(output_of(source), output_of(source));
    assert_eq!(output_of(source), "*****\n");
}

#[test]
fn globals_persist_across_runs() {
    let (mut session, capture) = session();

    session.run("var a = 1; fun inc() { a = a + 1; }").expect("defines");
    session.run("inc(); print a;").expect("runs");
    assert!(session.run("print b;").is_err());
    session.run("print a;").expect("still usable after an error");

    assert_eq!(capture.contents(), "2\n2\n");
}

#[test]
fn host_functions() {
    let capture = Capture::default();
    let mut interpreter = Interpreter::with_output(Box::new(capture.clone()));

    interpreter.define_native("double", 1, |args| match &args[0] {
        Value::Number(n) => Ok(Value::Number(n * 2.0)),
        _ => Err("double expects a number".to_string()),
    });

    let mut session = Session::with_interpreter(interpreter);
    session.run("print double(21);").expect("runs");

    match session.run("\ndouble(\"x\");") {
        Err(RunError::Runtime(e)) => assert_eq!(e.to_string(), "double expects a number\n[line 2]"),
        other => panic!("expected native failure, got {:?}", other),
    }

    assert_eq!(capture.contents(), "42\n");
}

#[test]
fn class_values_are_visible_to_the_host() {
    let (mut session, _capture) = session();
    session
        .run("class A { init() {} } class B < A { m() {} }")
        .expect("runs");

    let value = session.interpreter().globals().borrow().get("B").expect("B is defined");
    let Value::Class(b) = &value else {
        panic!("expected a class, got {}", value);
    };

    assert_eq!(b.superclass().map(|s| s.name()), Some("A"));
    assert!(b.find_method("init").expect("inherited").is_initializer());
    assert!(!b.find_method("m").expect("own method").is_initializer());
    assert!(b.find_method("missing").is_none());
}
