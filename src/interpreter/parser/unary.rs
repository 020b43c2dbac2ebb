use std::rc::Rc;

use crate::{
    ast::{Expr, ExprKind, FuncDecl, LiteralValue, Stmt, StmtKind, UnaryOperator},
    interpreter::{
        lexer::TokenKind,
        parser::{
            binary::{parse_exponent, parse_relational},
            core::{ParseResult, TokenStream, parse_expression},
            statement::parse_block,
            types::parse_type,
            utils::{parse_comma_separated, parse_number, parse_params, unescape},
        },
        types::Type,
    },
    util::span::Span,
};

fn unary(stream: &mut TokenStream<'_>, op: UnaryOperator, expr: Expr, span: Span) -> Expr {
    Expr::new(stream.fresh_id(),
              ExprKind::Unary { op,
                                expr: Box::new(expr) },
              span)
}

/// Parses logical negation.
///
/// Grammar: `logical_not := "~" logical_not | relational`
pub fn parse_logical_not(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    if let Some(tilde) = stream.eat(TokenKind::Tilde) {
        let expr = stream.nested(parse_logical_not)?;
        let span = tilde.span + expr.span;
        return Ok(unary(stream, UnaryOperator::Not, expr, span));
    }
    parse_relational(stream)
}

/// Parses arithmetic negation.
///
/// Grammar: `negation := "-" negation | exponent`
pub fn parse_negation(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    if let Some(minus) = stream.eat(TokenKind::Minus) {
        let expr = stream.nested(parse_negation)?;
        let span = minus.span + expr.span;
        return Ok(unary(stream, UnaryOperator::Neg, expr, span));
    }
    parse_exponent(stream)
}

/// Parses postfix factorial, which may repeat: `3!!` is `(3!)!`.
///
/// Grammar: `factorial := postfix "!"*`
pub fn parse_factorial(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let mut expr = parse_postfix(stream)?;
    let mut levels = 0;
    while let Some(bang) = stream.eat(TokenKind::Bang) {
        stream.descend()?;
        levels += 1;
        let span = expr.span + bang.span;
        expr = unary(stream, UnaryOperator::Fact, expr, span);
    }
    stream.ascend(levels);
    Ok(expr)
}

/// Parses a left-associative chain of calls and index operations.
///
/// Grammar:
/// ```text
///     postfix := primary ( "(" arguments? ")" | "[" expression "]" )*
/// ```
fn parse_postfix(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let mut node = parse_primary(stream)?;
    let mut levels = 0;
    loop {
        if stream.at(TokenKind::LParen) || stream.at(TokenKind::LBracket) {
            stream.descend()?;
            levels += 1;
        }
        if stream.eat(TokenKind::LParen).is_some() {
            let (args, close) = parse_comma_separated(stream, parse_expression, TokenKind::RParen)?;
            let span = node.span + close;
            node = Expr::new(stream.fresh_id(),
                             ExprKind::Call { callee: Box::new(node),
                                              args },
                             span);
        } else if stream.eat(TokenKind::LBracket).is_some() {
            let index = parse_expression(stream)?;
            let close = stream.expect(TokenKind::RBracket)?;
            let span = node.span + close.span;
            node = Expr::new(stream.fresh_id(),
                             ExprKind::Index { base:  Box::new(node),
                                               index: Box::new(index), },
                             span);
        } else {
            stream.ascend(levels);
            return Ok(node);
        }
    }
}

/// Parses a primary (atomic) expression.
///
/// Primary expressions form the base of the expression grammar:
/// - numeric, string and boolean literals, and `void`
/// - identifiers
/// - parenthesized expressions and tuples
/// - lambdas
///
/// # Errors
/// A `ParserError` when the next token cannot start an expression, or a
/// numeric literal is malformed.
pub fn parse_primary(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let token = stream.current(0);
    let kind = match token.kind {
        TokenKind::Number => {
            stream.advance();
            ExprKind::Literal(parse_number(token.text, token.span)?)
        },
        TokenKind::Str => {
            stream.advance();
            ExprKind::Literal(LiteralValue::Str(unescape(token.text).into()))
        },
        TokenKind::True | TokenKind::False => {
            stream.advance();
            ExprKind::Literal(LiteralValue::Bool(token.kind == TokenKind::True))
        },
        TokenKind::Void => {
            stream.advance();
            ExprKind::Literal(LiteralValue::Void)
        },
        TokenKind::Identifier => {
            stream.advance();
            ExprKind::Id(token.text.to_string())
        },
        TokenKind::LParen => return parse_grouping(stream),
        TokenKind::Lambda => return parse_lambda(stream),
        _ => return Err(stream.unexpected("an expression")),
    };
    Ok(Expr::new(stream.fresh_id(), kind, token.span))
}

/// Parses a parenthesized expression or tuple.
///
/// `()` is the void object and a single element in parentheses is just that
/// element; there are no one-element tuples.
///
/// Grammar: `grouping := "(" (expression ("," expression)*)? ")"`
fn parse_grouping(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let open = stream.expect(TokenKind::LParen)?;
    let (mut items, close) = parse_comma_separated(stream, parse_expression, TokenKind::RParen)?;
    let span = open.span + close;
    match items.len() {
        0 => Ok(Expr::new(stream.fresh_id(), ExprKind::Literal(LiteralValue::Void), span)),
        1 => Ok(items.remove(0)),
        _ => Ok(Expr::new(stream.fresh_id(), ExprKind::Tuple(items), span)),
    }
}

/// Parses a lambda.
///
/// Grammar:
/// ```text
///     lambda := ("\lambda" | "λ") "(" params? ")" (":" type)? ("=>" expression | block)
/// ```
///
/// `=> e` is shorthand for a body holding `return e;`. Without a written
/// return type the checker infers one from the body's top-level `return`,
/// so both body forms are typed the same way.
fn parse_lambda(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let keyword = stream.expect(TokenKind::Lambda)?;
    let params = parse_params(stream)?;
    let written = if stream.eat(TokenKind::Colon).is_some() {
        Some(parse_type(stream)?)
    } else {
        None
    };
    let (ret, body, end) = if stream.eat(TokenKind::FatArrow).is_some() {
        let value = parse_expression(stream)?;
        let span = value.span;
        let ret = written.unwrap_or(Type::Any);
        let id = stream.fresh_id();
        (ret, vec![Stmt::new(id, StmtKind::Return(value), span)], span)
    } else {
        let (body, span) = parse_block(stream)?;
        (written.unwrap_or(Type::Any), body, span)
    };
    let span = keyword.span + end;
    let func = FuncDecl { name: None,
                          params,
                          ret,
                          body,
                          span };
    Ok(Expr::new(stream.fresh_id(), ExprKind::FuncDecl(Rc::new(func)), span))
}

#[cfg(test)]
mod tests {
    use crate::{
        error::ErrorKind,
        interpreter::{lexer::tokenize, parser::core::parse_program},
    };

    fn tree(source: &str) -> String {
        parse_program(tokenize(source).unwrap()).unwrap().to_string()
    }

    #[test]
    fn calls_and_indexes_chain_left_to_right() {
        assert_eq!(tree("f(1)(2)[0];"), "Program(ExprStmt(Index(Call(Call(f,1),2),0)))");
        assert_eq!(tree("g();"), "Program(ExprStmt(Call(g)))");
    }

    #[test]
    fn parentheses_build_tuples_or_collapse() {
        assert_eq!(tree("(1, \"a\", true);"), "Program(ExprStmt(Tuple(1,\"a\",true)))");
        assert_eq!(tree("(x);"), "Program(ExprStmt(x))");
        assert_eq!(tree("();"), "Program(ExprStmt(void))");
    }

    #[test]
    fn literals_render_as_written() {
        assert_eq!(tree("print 0;"), "Program(Print(0))");
        assert_eq!(tree("print 1.50;"), "Program(Print(1.50))");
        assert_eq!(tree("print \"a\\nb\";"), "Program(Print(\"a\\nb\"))");
    }

    #[test]
    fn lambdas_accept_both_body_forms() {
        assert_eq!(tree("f: Z->Z = \\lambda(x: Z): Z => x;"),
                   "Program(DeclAssignStmt(f,Z->Z,FuncDecl(Params(x:Z),Z,Body(Return(x)))))");
        assert_eq!(tree("g = λ() { print 1; };"),
                   "Program(AssignStmt(g,FuncDecl(Params(),any,Body(Print(1)))))");
    }

    #[test]
    fn malformed_numbers_are_parser_errors() {
        for source in ["print 1.2.3;", "print 1.;", "print 99999999999999999999;"] {
            let error = parse_program(tokenize(source).unwrap()).unwrap_err();
            assert_eq!(error.kind, ErrorKind::ParserError, "{source}");
        }
    }
}
