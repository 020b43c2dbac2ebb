use crate::{
    ast::{BinaryOperator, Expr, ExprKind},
    interpreter::{
        lexer::TokenKind,
        parser::{
            core::{ParseResult, TokenStream},
            unary::{parse_factorial, parse_logical_not, parse_negation},
        },
    },
};

/// Maps a token to the binary operator it spells, if any.
const fn token_to_binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    Some(match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Sub,
        TokenKind::Star => BinaryOperator::Mul,
        TokenKind::Slash => BinaryOperator::Div,
        TokenKind::Percent => BinaryOperator::Mod,
        TokenKind::Caret => BinaryOperator::Pow,
        TokenKind::EqualEqual => BinaryOperator::Eq,
        TokenKind::TildeEqual => BinaryOperator::Neq,
        TokenKind::Less => BinaryOperator::Lt,
        TokenKind::LessEqual => BinaryOperator::Le,
        TokenKind::Greater => BinaryOperator::Gt,
        TokenKind::GreaterEqual => BinaryOperator::Ge,
        TokenKind::AndAnd => BinaryOperator::And,
        TokenKind::PipePipe => BinaryOperator::Or,
        _ => return None,
    })
}

/// Builds a binary node spanning both operands.
fn binary(stream: &mut TokenStream<'_>, op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    let span = left.span + right.span;
    Expr::new(stream.fresh_id(),
              ExprKind::Binary { op,
                                 left: Box::new(left),
                                 right: Box::new(right) },
              span)
}

/// Parses one left-associative precedence level.
///
/// Each operator of a chain nests the tree built so far one level deeper,
/// and counts against the nesting limit like a parenthesis would.
///
/// # Parameters
/// - `stream`: Token stream.
/// - `ops`: Operators accepted at this level.
/// - `operand`: Parser for the next tighter level.
fn parse_left_assoc(stream: &mut TokenStream<'_>,
                    ops: &[BinaryOperator],
                    operand: fn(&mut TokenStream<'_>) -> ParseResult<Expr>)
                    -> ParseResult<Expr> {
    let mut left = operand(stream)?;
    let mut levels = 0;
    while let Some(op) = token_to_binary_operator(stream.current(0).kind)
          && ops.contains(&op)
    {
        stream.advance();
        stream.descend()?;
        levels += 1;
        let right = operand(stream)?;
        left = binary(stream, op, left, right);
    }
    stream.ascend(levels);
    Ok(left)
}

/// Parses logical disjunction.
///
/// The rule is: `logical_or := logical_and ("||" logical_and)*`
pub fn parse_logical_or(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream, &[BinaryOperator::Or], parse_logical_and)
}

/// Parses logical conjunction.
///
/// The rule is: `logical_and := equality ("&&" equality)*`
pub fn parse_logical_and(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream, &[BinaryOperator::And], parse_equality)
}

/// Parses equality tests. Both sides sit above logical negation, so
/// `~a == b` reads as `(~a) == b`.
///
/// The rule is: `equality := logical_not (("==" | "~=") logical_not)*`
pub fn parse_equality(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream, &[BinaryOperator::Eq, BinaryOperator::Neq], parse_logical_not)
}

/// Parses ordering comparisons.
///
/// The rule is: `relational := additive (("<" | "<=" | ">" | ">=") additive)*`
pub fn parse_relational(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream,
                     &[BinaryOperator::Lt, BinaryOperator::Le, BinaryOperator::Gt, BinaryOperator::Ge],
                     parse_additive)
}

/// Parses addition and subtraction expressions.
///
/// The rule is: `additive := multiplicative (("+" | "-") multiplicative)*`
pub fn parse_additive(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream, &[BinaryOperator::Add, BinaryOperator::Sub], parse_multiplicative)
}

/// Parses multiplication-level expressions.
///
/// The rule is: `multiplicative := negation (("*" | "/" | "%") negation)*`
pub fn parse_multiplicative(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    parse_left_assoc(stream,
                     &[BinaryOperator::Mul, BinaryOperator::Div, BinaryOperator::Mod],
                     parse_negation)
}

/// Parses exponentiation.
///
/// `a ^ b ^ c` parses as `a ^ (b ^ c)`. The exponent may carry its own sign,
/// so `2 ^ -1` is accepted, while `-2 ^ 2` is `-(2 ^ 2)`.
///
/// The rule is: `exponent := factorial ("^" negation)?`
pub fn parse_exponent(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    let base = parse_factorial(stream)?;
    if stream.eat(TokenKind::Caret).is_none() {
        return Ok(base);
    }
    let exponent = stream.nested(parse_negation)?;
    Ok(binary(stream, BinaryOperator::Pow, base, exponent))
}
