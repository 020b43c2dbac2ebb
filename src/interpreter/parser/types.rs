use crate::{
    error::{Diagnostic, ErrorKind},
    interpreter::{
        lexer::TokenKind,
        parser::core::{ParseResult, TokenStream},
        types::Type,
    },
    util::span::Span,
};

/// Bound on the nodes a written type may expand to, counting `T ^ k` as `k`
/// copies of `T`. Types must stay below it.
pub const MAX_TYPE_SIZE: usize = 1 << 16;

fn too_large(span: Span) -> Diagnostic {
    Diagnostic::new(ErrorKind::ParserError,
                    span,
                    format!("type is too large (limit {MAX_TYPE_SIZE} components)"))
}

/// Parses a type annotation.
///
/// Types have their own precedence ladder, from loosest to tightest:
///
/// ```text
///     type    := product ("->" type)?
///     product := power ("*" power)*
///     power   := primary ("^" NUMBER)?
///     primary := "Z" | "N" | "Q" | "Str" | "Bool" | "void"
///              | "Z" "/" NUMBER "Z"
///              | "(" type ")"
/// ```
///
/// The arrow is right-associative, so `Z -> Z -> Z` is `Z -> (Z -> Z)`. The
/// left side of an arrow is a domain: a product domain spreads into several
/// parameters and `void` means no parameters.
///
/// # Errors
/// A `ParserError` on malformed input, or when the type would reach
/// [`MAX_TYPE_SIZE`] nodes.
///
/// # Example
/// ```
/// use ecru::interpreter::{lexer::tokenize, parser::{core::TokenStream, types::parse_type}};
///
/// let mut stream = TokenStream::new(tokenize("Z^2 -> Z/7Z").unwrap());
///
/// assert_eq!(parse_type(&mut stream).unwrap().to_string(), "Z*Z->Z/7Z");
/// ```
pub fn parse_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    stream.nested(parse_arrow_type)
}

fn parse_arrow_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    let domain = parse_product_type(stream)?;
    let Some(arrow) = stream.eat(TokenKind::Arrow) else {
        return Ok(domain);
    };
    let ret = parse_type(stream)?;
    if domain.size().saturating_add(ret.size()) >= MAX_TYPE_SIZE {
        return Err(too_large(arrow.span));
    }
    Ok(Type::from_domain(domain, ret))
}

fn parse_product_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    let first = parse_power_type(stream)?;
    if !stream.at(TokenKind::Star) {
        return Ok(first);
    }
    let mut size = first.size();
    let mut components = vec![first];
    while let Some(star) = stream.eat(TokenKind::Star) {
        let component = parse_power_type(stream)?;
        size = size.saturating_add(component.size());
        if size >= MAX_TYPE_SIZE {
            return Err(too_large(star.span));
        }
        components.push(component);
    }
    Ok(Type::Product(components))
}

/// `T ^ k` is the `k`-fold product of `T`; `T ^ 1` is `T` itself.
///
/// The product is only built once `k` copies of `T` fit in
/// [`MAX_TYPE_SIZE`]; otherwise the error points at `k`.
fn parse_power_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    let base = parse_primary_type(stream)?;
    if stream.eat(TokenKind::Caret).is_none() {
        return Ok(base);
    }
    let exponent = stream.current(0).span;
    let count = parse_positive(stream)?;
    if count == 1 {
        return Ok(base);
    }
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count.saturating_mul(base.size()) >= MAX_TYPE_SIZE {
        return Err(too_large(exponent));
    }
    Ok(Type::Product(vec![base; count]))
}

fn parse_primary_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    let token = stream.current(0);
    match token.kind {
        TokenKind::Void => {
            stream.advance();
            Ok(Type::Void)
        },
        TokenKind::LParen => {
            stream.advance();
            let inner = parse_type(stream)?;
            stream.expect(TokenKind::RParen)?;
            Ok(inner)
        },
        TokenKind::Identifier => {
            let ty = match token.text {
                "Z" => Type::Integer,
                "N" => Type::Natural,
                "Q" => Type::Rational,
                "Str" => Type::Str,
                "Bool" => Type::Bool,
                _ => return Err(stream.unexpected("a type")),
            };
            stream.advance();
            if ty == Type::Integer && stream.eat(TokenKind::Slash).is_some() {
                let modulus = parse_positive(stream)?;
                let suffix = stream.current(0);
                if suffix.kind != TokenKind::Identifier || suffix.text != "Z" {
                    return Err(stream.unexpected("`Z` closing a modulus type"));
                }
                stream.advance();
                return Ok(Type::Modulus(modulus));
            }
            Ok(ty)
        },
        _ => Err(stream.unexpected("a type")),
    }
}

/// A whole number of at least one, as used in `Z/nZ` and `T^k`.
fn parse_positive(stream: &mut TokenStream<'_>) -> ParseResult<u64> {
    let token = stream.expect(TokenKind::Number)?;
    match token.text.parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Diagnostic::new(ErrorKind::ParserError,
                                 token.span,
                                 format!("expected a positive whole number, found `{}`", token.text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lexer::tokenize;

    fn ty(source: &str) -> ParseResult<Type> {
        let mut stream = TokenStream::new(tokenize(source).unwrap());
        parse_type(&mut stream)
    }

    #[test]
    fn base_types() {
        assert_eq!(ty("Z").unwrap(), Type::Integer);
        assert_eq!(ty("N").unwrap(), Type::Natural);
        assert_eq!(ty("Q").unwrap(), Type::Rational);
        assert_eq!(ty("Str").unwrap(), Type::Str);
        assert_eq!(ty("Bool").unwrap(), Type::Bool);
        assert_eq!(ty("void").unwrap(), Type::Void);
        assert_eq!(ty("Z/12Z").unwrap(), Type::Modulus(12));
    }

    #[test]
    fn products_and_powers() {
        assert_eq!(ty("Z*N").unwrap(), Type::Product(vec![Type::Integer, Type::Natural]));
        assert_eq!(ty("Q^3").unwrap(), Type::Product(vec![Type::Rational; 3]));
        assert_eq!(ty("Q^1").unwrap(), Type::Rational);
        assert_eq!(ty("(Z*Z)").unwrap(), ty("Z^2").unwrap());
    }

    #[test]
    fn arrows_spread_their_domain() {
        assert_eq!(ty("Z*Z->Bool").unwrap(), Type::function(vec![Type::Integer, Type::Integer], Type::Bool));
        assert_eq!(ty("void->Z").unwrap(), Type::function(vec![], Type::Integer));
        assert_eq!(ty("N->N->N").unwrap(),
                   Type::function(vec![Type::Natural], Type::function(vec![Type::Natural], Type::Natural)));
        assert_eq!(ty("(N->N)->N").unwrap(),
                   Type::function(vec![Type::function(vec![Type::Natural], Type::Natural)], Type::Natural));
    }

    #[test]
    fn oversized_types_are_rejected_before_they_are_built() {
        let error = ty("Z^4000000000").unwrap_err();
        assert_eq!(error.kind, ErrorKind::ParserError);
        assert_eq!(error.span, tokenize("Z^4000000000").unwrap()[2].span);

        for source in ["(Z^60000)^60000", "Z^65536", "Z^40000*Z^40000", "Z^40000->Z^40000"] {
            assert_eq!(ty(source).unwrap_err().kind, ErrorKind::ParserError, "{source}");
        }
        assert_eq!(ty("Z^1000").unwrap().size(), 1001);
    }

    #[test]
    fn malformed_types_are_rejected() {
        for source in ["Y", "Z/0Z", "Z/5", "Z^0", "(Z", "->Z"] {
            assert_eq!(ty(source).unwrap_err().kind, ErrorKind::ParserError, "{source}");
        }
    }
}
