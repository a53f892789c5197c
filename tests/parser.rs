use pretty_assertions::assert_eq;

use rox::ast_printer::Ast;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::parse_source;

fn printed(source: &str) -> Vec<String> {
    let statements = parse_source(source)
        .unwrap_or_else(|errors| panic!("unexpected parse errors: {:?}", errors));

    statements.iter().map(|s| Ast.print_stmt(s)).collect()
}

fn parse_errors(source: &str) -> Vec<String> {
    match parse_source(source) {
        Ok(statements) => panic!("expected errors, parsed {:?}", statements),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(
        printed("print -1 * (2 + 3) == !false;"),
        vec!["(print (== (* (- 1.0) (group (+ 2.0 3.0))) (! false)))"]
    );
}

#[test]
fn logical_and_binds_tighter_than_or() {
    assert_eq!(printed("a or b and c;"), vec!["(; (or a (and b c)))"]);
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(printed("a = b = 1;"), vec!["(; (= a (= b 1.0)))"]);
}

#[test]
fn property_chains_and_calls() {
    assert_eq!(
        printed("a.b(1, \"two\").c = nil;"),
        vec!["(; (= (. (call (. a b) 1.0 two) c) nil))"]
    );
}

#[test]
fn for_loop_desugars_to_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
    );
}

#[test]
fn empty_for_clauses_loop_forever() {
    assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
}

#[test]
fn if_else_and_while() {
    assert_eq!(
        printed("if (x) print 1; else { print 2; }\nwhile (false) x = 1;"),
        vec![
            "(if x (print 1.0) (block (print 2.0)))",
            "(while false (; (= x 1.0)))",
        ]
    );
}

#[test]
fn functions_and_returns() {
    assert_eq!(
        printed("fun add(a, b) { return a + b; }\nfun nothing() { return; }"),
        vec![
            "(fun add (a b) (block (return (+ a b))))",
            "(fun nothing () (block (return)))",
        ]
    );
}

#[test]
fn class_with_superclass_and_methods() {
    let source = "class B < A { init(x) { this.x = x; } get() { return super.get(); } }";

    assert_eq!(
        printed(source),
        vec![
            "(class B < A (fun init (x) (block (; (= (. this x) x)))) \
             (fun get () (block (return (call (super get))))))"
        ]
    );
}

#[test]
fn errors_are_collected_across_statements() {
    assert_eq!(
        parse_errors("print ;\nvar x = ;\nprint 1;"),
        vec![
            "[line 1] Error: Expected expression",
            "[line 2] Error: Expected expression",
        ]
    );
}

#[test]
fn scanner_and_parser_errors_are_merged_by_line() {
    assert_eq!(
        parse_errors("print 1 +;\n@"),
        vec![
            "[line 1] Error: Expected expression",
            "[line 2] Error: Unexpected character: @",
        ]
    );
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(
        parse_errors("a + b = c;"),
        vec!["[line 1] Error: Invalid assignment target"]
    );
}

#[test]
fn missing_semicolon() {
    assert_eq!(
        parse_errors("var a = 1\nprint a;"),
        vec!["[line 2] Error: Expected ';' after variable declaration"]
    );
}

#[test]
fn argument_limit() {
    let args = |n: usize| vec!["0"; n].join(", ");

    assert!(parse_source(&format!("f({});", args(255))).is_ok());
    assert_eq!(
        parse_errors(&format!("f({});", args(256))),
        vec!["[line 1] Error: Can't have more than 255 arguments"]
    );
}

#[test]
fn parameter_limit() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    assert_eq!(
        parse_errors(&source),
        vec!["[line 1] Error: Can't have more than 255 parameters"]
    );
}

#[test]
fn single_expression() {
    let (tokens, errors) = Scanner::new("(1 + 2) * 3").scan_all();
    assert!(errors.is_empty());

    let expr = Parser::new(&tokens).parse_expression().expect("parses");
    assert_eq!(Ast.print(&expr), "(* (group (+ 1.0 2.0)) 3.0)");

    let (tokens, _) = Scanner::new("1 2").scan_all();
    let err = Parser::new(&tokens).parse_expression().unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Error: Expected end of expression");
}

#[test]
fn json_tree() {
    let statements = parse_source("print 1;").expect("parses");
    let json = serde_json::to_value(&statements).expect("serializes");

    assert_eq!(json, serde_json::json!([{ "Print": { "Literal": { "Number": 1.0 } } }]));
}
