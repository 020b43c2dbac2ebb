use std::rc::Rc;

use crate::{
    ast::{BinaryOperator, Expr, ExprKind, FuncDecl, LiteralValue, PrintMode, Stmt, StmtKind},
    interpreter::{
        lexer::TokenKind,
        parser::{
            core::{ParseResult, TokenStream, parse_expression},
            types::parse_type,
            utils::parse_params,
        },
    },
    util::span::Span,
};

/// Parses statements until `end` is the next token, without consuming it.
///
/// Comments met in statement position become [`StmtKind::Comment`] nodes.
///
/// Grammar: `statements := (comment | statement)*`
///
/// # Parameters
/// - `stream`: Token stream positioned at the first statement.
/// - `end`: The token that closes the list (`}` or end of input).
///
/// # Errors
/// Propagates the first statement error. Hitting end of input while looking
/// for `}` is a `ParserError`.
pub fn parse_statement_list(stream: &mut TokenStream<'_>, end: TokenKind) -> ParseResult<Vec<Stmt>> {
    let mut statements = Vec::new();
    loop {
        if let Some(comment) = stream.next_comment() {
            let id = stream.fresh_id();
            statements.push(Stmt::new(id, StmtKind::Comment(comment.text.to_string()), comment.span));
            continue;
        }
        if stream.at(end) {
            return Ok(statements);
        }
        if stream.at(TokenKind::Eof) {
            return Err(stream.unexpected(&end.to_string()));
        }
        statements.push(parse_statement(stream)?);
    }
}

/// Parses a single statement.
///
/// The statement form is chosen by lookahead:
/// - a print keyword starts a print statement,
/// - `if`, `while` and `for` start control flow,
/// - `name ( ... ) :` starts a function declaration,
/// - anything else is a simple statement terminated by `;`.
///
/// # Parameters
/// - `stream`: Token stream positioned at the statement.
///
/// # Returns
/// A parsed [`Stmt`] node.
///
/// # Errors
/// The first mismatch, or a `ParserError` when blocks and expressions nest
/// deeper than [`MAX_NESTING`](super::core::MAX_NESTING).
pub fn parse_statement(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    stream.nested(parse_statement_at_depth)
}

fn parse_statement_at_depth(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let mode = match stream.current(0).kind {
        TokenKind::Print => Some(PrintMode::Print),
        TokenKind::Println => Some(PrintMode::Println),
        TokenKind::PPrint => Some(PrintMode::PPrint),
        TokenKind::PPrintln => Some(PrintMode::PPrintln),
        TokenKind::If => return parse_if(stream),
        TokenKind::While => return parse_while(stream),
        TokenKind::For => return parse_for(stream),
        TokenKind::Identifier if is_function_declaration(stream) => {
            return parse_function_declaration(stream);
        },
        _ => None,
    };
    if let Some(mode) = mode {
        let keyword = stream.advance();
        let expr = parse_expression(stream)?;
        let end = stream.expect(TokenKind::Semicolon)?;
        let id = stream.fresh_id();
        return Ok(Stmt::new(id, StmtKind::Print { mode, expr }, keyword.span + end.span));
    }
    let mut statement = parse_simple(stream)?;
    let end = stream.expect(TokenKind::Semicolon)?;
    statement.span += end.span;
    Ok(statement)
}

/// Parses a statement that may appear before `;` or inside a `for` header.
///
/// Grammar:
/// ```text
/// simple := ID ":" type ("=" expr)?
///         | ID "=" expr
///         | ID ("+=" | "-=" | "*=" | "/=" | "%=") expr
///         | "return" expr?
///         | expr
/// ```
///
/// Compound assignment `x op= e` is desugared to `x = x op e`.
pub fn parse_simple(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let first = stream.current(0);
    if first.kind == TokenKind::Return {
        stream.advance();
        let value = if stream.at(TokenKind::Semicolon) {
            let id = stream.fresh_id();
            Expr::new(id, ExprKind::Literal(LiteralValue::Void), first.span)
        } else {
            parse_expression(stream)?
        };
        let id = stream.fresh_id();
        let span = first.span + value.span;
        return Ok(Stmt::new(id, StmtKind::Return(value), span));
    }
    if first.kind == TokenKind::Identifier {
        let name = first.text.to_string();
        let compound = match stream.current(1).kind {
            TokenKind::PlusAssign => Some(BinaryOperator::Add),
            TokenKind::MinusAssign => Some(BinaryOperator::Sub),
            TokenKind::MulAssign => Some(BinaryOperator::Mul),
            TokenKind::DivAssign => Some(BinaryOperator::Div),
            TokenKind::ModAssign => Some(BinaryOperator::Mod),
            _ => None,
        };
        if let Some(op) = compound {
            stream.advance();
            stream.advance();
            let operand = parse_expression(stream)?;
            let span = first.span + operand.span;
            let target = Expr::new(stream.fresh_id(), ExprKind::Id(name.clone()), first.span);
            let value = Expr::new(stream.fresh_id(),
                                  ExprKind::Binary { op,
                                                     left: Box::new(target),
                                                     right: Box::new(operand) },
                                  span);
            let id = stream.fresh_id();
            return Ok(Stmt::new(id, StmtKind::Assignment { name, value }, span));
        }
        match stream.current(1).kind {
            TokenKind::Colon => {
                stream.advance();
                stream.advance();
                let ty = parse_type(stream)?;
                let id = stream.fresh_id();
                if stream.eat(TokenKind::Equals).is_some() {
                    let value = parse_expression(stream)?;
                    let span = first.span + value.span;
                    return Ok(Stmt::new(id,
                                        StmtKind::DeclarationAndAssignment { name, ty, value },
                                        span));
                }
                return Ok(Stmt::new(id, StmtKind::Declaration { name, ty }, first.span));
            },
            TokenKind::Equals => {
                stream.advance();
                stream.advance();
                let value = parse_expression(stream)?;
                let id = stream.fresh_id();
                let span = first.span + value.span;
                return Ok(Stmt::new(id, StmtKind::Assignment { name, value }, span));
            },
            _ => {},
        }
    }
    let expr = parse_expression(stream)?;
    let id = stream.fresh_id();
    let span = expr.span;
    Ok(Stmt::new(id, StmtKind::Expr(expr), span))
}

/// Parses a brace-delimited block.
///
/// Grammar: `block := "{" statements "}"`
///
/// # Returns
/// The statements of the block and the span from `{` to `}`.
pub fn parse_block(stream: &mut TokenStream<'_>) -> ParseResult<(Vec<Stmt>, Span)> {
    let open = stream.expect(TokenKind::LBrace)?;
    let body = parse_statement_list(stream, TokenKind::RBrace)?;
    let close = stream.expect(TokenKind::RBrace)?;
    Ok((body, open.span + close.span))
}

/// Parses an `if` statement with optional `else` and chained `else if`.
///
/// Grammar: `if := "if" "(" expr ")" block ("else" (if | block))?`
///
/// An `else if` is stored as an else body holding a single nested `If`.
fn parse_if(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let keyword = stream.expect(TokenKind::If)?;
    let condition = parse_condition(stream)?;
    let (then_branch, mut span) = parse_block(stream)?;
    let else_branch = if stream.eat(TokenKind::Else).is_some() {
        if stream.at(TokenKind::If) {
            let nested = stream.nested(parse_if)?;
            span += nested.span;
            Some(vec![nested])
        } else {
            let (body, body_span) = parse_block(stream)?;
            span += body_span;
            Some(body)
        }
    } else {
        None
    };
    let id = stream.fresh_id();
    Ok(Stmt::new(id,
                 StmtKind::If { condition,
                                then_branch,
                                else_branch },
                 keyword.span + span))
}

/// Parses a `while` loop.
///
/// Grammar: `while := "while" "(" expr ")" block`
fn parse_while(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let keyword = stream.expect(TokenKind::While)?;
    let condition = parse_condition(stream)?;
    let (body, span) = parse_block(stream)?;
    let id = stream.fresh_id();
    Ok(Stmt::new(id, StmtKind::While { condition, body }, keyword.span + span))
}

/// The parenthesized condition of `if` and `while`. The parentheses are
/// not part of the condition node.
fn parse_condition(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    stream.expect(TokenKind::LParen)?;
    let condition = parse_expression(stream)?;
    stream.expect(TokenKind::RParen)?;
    Ok(condition)
}

/// Parses a C-style `for` loop. Initializer and step are optional; the
/// condition is not.
///
/// Grammar: `for := "for" "(" simple? ";" expr ";" simple? ")" block`
fn parse_for(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let keyword = stream.expect(TokenKind::For)?;
    stream.expect(TokenKind::LParen)?;
    let init = if stream.at(TokenKind::Semicolon) {
        None
    } else {
        Some(Box::new(parse_simple(stream)?))
    };
    stream.expect(TokenKind::Semicolon)?;
    let condition = parse_expression(stream)?;
    stream.expect(TokenKind::Semicolon)?;
    let step = if stream.at(TokenKind::RParen) {
        None
    } else {
        Some(Box::new(parse_simple(stream)?))
    };
    stream.expect(TokenKind::RParen)?;
    let (body, span) = parse_block(stream)?;
    let id = stream.fresh_id();
    Ok(Stmt::new(id,
                 StmtKind::For { init,
                                 condition,
                                 step,
                                 body },
                 keyword.span + span))
}

/// Whether the upcoming tokens read `name ( ... ) :`. Scans once, up to
/// the parenthesis that closes the first one.
fn is_function_declaration(stream: &TokenStream<'_>) -> bool {
    let mut kinds = stream.upcoming().skip(1).map(|token| token.kind);
    if kinds.next() != Some(TokenKind::LParen) {
        return false;
    }
    let mut depth = 1usize;
    while let Some(kind) = kinds.next() {
        match kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return kinds.next() == Some(TokenKind::Colon);
                }
            },
            _ => {},
        }
    }
    false
}

/// Parses a named function declaration.
///
/// Grammar: `func_decl := ID "(" params? ")" ":" type block`
///
/// The declaration is sugar for `name: domain -> type = <function literal>`
/// and is returned in that form.
fn parse_function_declaration(stream: &mut TokenStream<'_>) -> ParseResult<Stmt> {
    let name = stream.expect(TokenKind::Identifier)?;
    let params = parse_params(stream)?;
    stream.expect(TokenKind::Colon)?;
    let ret = parse_type(stream)?;
    let (body, body_span) = parse_block(stream)?;
    let span = name.span + body_span;
    let func = FuncDecl { name: Some(name.text.to_string()),
                          params,
                          ret,
                          body,
                          span };
    let ty = func.ty();
    let value = Expr::new(stream.fresh_id(), ExprKind::FuncDecl(Rc::new(func)), span);
    let id = stream.fresh_id();
    Ok(Stmt::new(id,
                 StmtKind::DeclarationAndAssignment { name: name.text.to_string(),
                                                      ty,
                                                      value },
                 span))
}
