use plang::ast::ANONYMOUS_FUNCTION;
use plang::{
    lex, parse_str, ASTNode, Expression, Function, Parser, ParserError, PrecedenceTable, Prototype,
    Token,
};
use pretty_assertions::assert_eq;

fn num(value: f64) -> Box<Expression> {
    Box::new(Expression::Literal(value))
}

fn body_of(source: &str) -> Expression {
    let table = PrecedenceTable::default();
    match parse_str(source, &table).unwrap().pop() {
        Some(ASTNode::Function(func)) => func.body,
        other => panic!("expected a function, found {:?}", other),
    }
}

#[test]
fn decimal_literals_lex_to_one_number() {
    let literals = [("0", 0.0), ("3.14", 3.14), ("10.", 10.0), (".25", 0.25), ("007", 7.0)];
    for (input, value) in &literals {
        assert_eq!(lex(input).unwrap(), vec![Token::Number(*value)]);
    }
}

#[test]
fn identifiers_keep_their_text() {
    for name in &["foo123", "x", "Def", "externs", "a1b2"] {
        assert_eq!(lex(name).unwrap(), vec![Token::Ident(name.to_string())]);
    }
}

#[test]
fn comment_then_number() {
    assert_eq!(lex("# note\n42").unwrap(), vec![Token::Number(42.0)]);
}

#[test]
fn definition_with_two_parameters() {
    let table = PrecedenceTable::default();
    assert_eq!(
        parse_str("def foo(x y) x+y", &table).unwrap(),
        vec![ASTNode::Function(Function {
            prototype: Prototype {
                name: "foo".to_string(),
                args: vec!["x".to_string(), "y".to_string()],
            },
            body: Expression::Binary(
                '+',
                Box::new(Expression::Variable("x".to_string())),
                Box::new(Expression::Variable("y".to_string())),
            ),
        })]
    );
}

#[test]
fn binary_chains() {
    assert_eq!(
        body_of("1+2*3"),
        Expression::Binary('+', num(1.0), Box::new(Expression::Binary('*', num(2.0), num(3.0))))
    );
    assert_eq!(
        body_of("1*2+3"),
        Expression::Binary('+', Box::new(Expression::Binary('*', num(1.0), num(2.0))), num(3.0))
    );
    assert_eq!(
        body_of("1-2-3"),
        Expression::Binary('-', Box::new(Expression::Binary('-', num(1.0), num(2.0))), num(3.0))
    );
}

#[test]
fn calls_keep_argument_order() {
    assert_eq!(
        body_of("foo(1, 2)"),
        Expression::Call(
            "foo".to_string(),
            vec![Expression::Literal(1.0), Expression::Literal(2.0)]
        )
    );
    assert_eq!(body_of("foo()"), Expression::Call("foo".to_string(), vec![]));
}

#[test]
fn malformed_input_produces_no_item() {
    let table = PrecedenceTable::default();
    assert!(matches!(
        parse_str("foo(1 2)", &table),
        Err(ParserError::ExpectedArgumentDelimiter { .. })
    ));
    assert!(matches!(
        parse_str("(1+2", &table),
        Err(ParserError::ExpectedCloseParen { .. })
    ));
}

#[test]
fn bare_expressions_become_anonymous_functions() {
    let table = PrecedenceTable::default();
    let mut parser = Parser::new("x < 2", &table).unwrap();
    match parser.next() {
        Some(Ok(ASTNode::Function(func))) => {
            assert!(func.is_anonymous());
            assert_eq!(func.prototype.name, ANONYMOUS_FUNCTION);
        }
        other => panic!("unexpected item {:?}", other),
    }
    assert!(parser.next().is_none());
}

#[test]
fn user_functions_are_never_anonymous() {
    let table = PrecedenceTable::default();
    for source in &["def lambda() 1", "def anon() 1", "def f() 1"] {
        match parse_str(source, &table).unwrap().pop() {
            Some(ASTNode::Function(func)) => assert!(!func.is_anonymous(), "{}", source),
            other => panic!("unexpected item {:?}", other),
        }
    }
}

#[test]
fn parsing_is_repeatable() {
    let table = PrecedenceTable::default();
    let source = "extern cos(t)\ndef f(a b) cos(a) * (b - 1) < 2\nf(1, 2)";
    let first = parse_str(source, &table).unwrap();
    let second = parse_str(source, &table).unwrap();
    assert_eq!(first, second);
}

#[test]
fn printed_items_parse_back_to_the_same_tree() {
    let table = PrecedenceTable::default();
    let source = "extern cos(t); def f(a b) cos(a) * (b - 1) < 2 + a; f(1.5, 2)";
    let ast = parse_str(source, &table).unwrap();
    let printed = ast.iter().map(|node| node.to_string()).collect::<Vec<_>>().join("\n");
    assert_eq!(parse_str(&printed, &table).unwrap(), ast);
}

#[test]
fn independent_tables_do_not_interfere() {
    let defaults = PrecedenceTable::default();
    let mut custom = PrecedenceTable::default();
    custom.register('^', 8).unwrap();

    assert!(parse_str("2 ^ 3", &defaults).is_err());
    assert_eq!(
        parse_str("2 ^ 3", &custom).unwrap(),
        vec![ASTNode::Function(Function::anonymous(Expression::Binary('^', num(2.0), num(3.0))))]
    );
}
