use crate::{
    ast::{LiteralValue, Param},
    error::{Diagnostic, ErrorKind},
    interpreter::{
        lexer::TokenKind,
        parser::{
            core::{ParseResult, TokenStream},
            types::parse_type,
        },
        value::{integer::Integer, natural::Natural, rational::Rational},
    },
    util::span::Span,
};

/// Parses a comma-separated list of items until a closing token.
///
/// This utility is shared by tuples, argument lists and parameter lists. The
/// opening token must already be consumed. After each item it expects either:
///
/// - a comma, to continue the list, or
/// - the specified closing token, to end it.
///
/// An immediately encountered closing token produces an empty list.
///
/// Grammar (simplified): `list := (item ("," item)*)? closing`
///
/// # Parameters
/// - `stream`: Token stream positioned at the first item or closing token.
/// - `parse_item`: Function used to parse each list element.
/// - `closing`: The token that terminates the list, e.g. `)`.
///
/// # Returns
/// The parsed items and the span of the closing token.
///
/// # Errors
/// Returns a `ParserError` if an item fails to parse or anything other than a
/// comma or `closing` follows an item.
pub(in crate::interpreter::parser) fn parse_comma_separated<T>(
    stream: &mut TokenStream<'_>,
    parse_item: impl Fn(&mut TokenStream<'_>) -> ParseResult<T>,
    closing: TokenKind)
    -> ParseResult<(Vec<T>, Span)> {
    let mut items = Vec::new();
    if let Some(close) = stream.eat(closing) {
        return Ok((items, close.span));
    }
    loop {
        items.push(parse_item(stream)?);
        if stream.eat(TokenKind::Comma).is_some() {
            continue;
        }
        if let Some(close) = stream.eat(closing) {
            return Ok((items, close.span));
        }
        return Err(stream.unexpected(&format!("`,` or {closing}")));
    }
}

/// Parses a parenthesized parameter list.
///
/// Grammar: `params := "(" (ID ":" type ("," ID ":" type)*)? ")"`
///
/// Every parameter gets its own node id, which the binder uses to attach the
/// parameter's symbol.
pub(in crate::interpreter::parser) fn parse_params(stream: &mut TokenStream<'_>) -> ParseResult<Vec<Param>> {
    stream.expect(TokenKind::LParen)?;
    let (params, _) = parse_comma_separated(stream, parse_param, TokenKind::RParen)?;
    Ok(params)
}

fn parse_param(stream: &mut TokenStream<'_>) -> ParseResult<Param> {
    let name = stream.expect(TokenKind::Identifier)?;
    stream.expect(TokenKind::Colon)?;
    let ty = parse_type(stream)?;
    let id = stream.fresh_id();
    Ok(Param { id,
               name: name.text.to_string(),
               ty,
               span: name.span })
}

/// Builds the literal for a numeric token.
///
/// The tokenizer accepts any run of digits and dots; validation happens here:
///
/// - no dot: `0` is an integer literal, anything larger a natural literal,
/// - exactly one dot with digits on both sides: a decimal rational literal,
///   kept unreduced (`1.25` is `125/100`),
/// - anything else is malformed.
///
/// # Errors
/// A `ParserError` for malformed or out-of-range literals.
pub(in crate::interpreter::parser) fn parse_number(text: &str, span: Span) -> ParseResult<LiteralValue> {
    let malformed = |reason: &str| {
        Diagnostic::new(ErrorKind::ParserError, span, format!("malformed number `{text}`: {reason}"))
    };
    match text.split_once('.') {
        None => {
            let value = text.parse::<u64>().map_err(|_| malformed("out of range"))?;
            if value == 0 {
                return Ok(LiteralValue::Integer(Integer::zero()));
            }
            let natural = Natural::new(value).map_err(|e| malformed(&e.to_string()))?;
            Ok(LiteralValue::Natural(natural))
        },
        Some((whole, fraction)) => {
            if whole.is_empty() || fraction.is_empty() || fraction.contains('.') {
                return Err(malformed("expected digits on both sides of one decimal point"));
            }
            let value = Rational::from_decimal(whole, fraction).map_err(|e| malformed(&e.to_string()))?;
            Ok(LiteralValue::Rational { value,
                                        text: text.into() })
        },
    }
}

/// Resolves the escapes of a string token and strips its quotes.
///
/// Recognized escapes are `\"`, `\\`, `\n` and `\t`; any other backslash
/// pair is kept as written.
pub(in crate::interpreter::parser) fn unescape(token: &str) -> String {
    let inner = token.strip_prefix('"').unwrap_or(token);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            },
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_split_on_zero() {
        let span = Span::default();
        assert_eq!(parse_number("0", span).unwrap(), LiteralValue::Integer(Integer::zero()));
        assert_eq!(parse_number("42", span).unwrap(), LiteralValue::Natural(Natural::new(42).unwrap()));
    }

    #[test]
    fn decimals_keep_their_text() {
        let LiteralValue::Rational { value, text } = parse_number("1.25", Span::default()).unwrap() else {
            panic!("expected a rational literal");
        };
        assert_eq!(&*text, "1.25");
        assert_eq!(value.denominator().to_string(), "100");
    }

    #[test]
    fn malformed_numbers() {
        for text in ["1.", "1..2", "1.2.3", "18446744073709551616"] {
            assert!(parse_number(text, Span::default()).is_err(), "{text}");
        }
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r#""a\"b\\c\nd\te""#), "a\"b\\c\nd\te");
        assert_eq!(unescape(r#""\q""#), "\\q");
        assert_eq!(unescape(r#""""#), "");
    }
}
