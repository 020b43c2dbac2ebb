use tracing::{debug, instrument};

use crate::{
    ast::{Expr, NodeId, Program},
    error::{Diagnostic, EcruResult, ErrorKind},
    interpreter::{
        lexer::{Token, TokenKind},
        parser::{binary::parse_logical_or, statement::parse_statement_list},
    },
    util::span::Span,
};

pub type ParseResult<T> = EcruResult<T>;

/// Deepest nesting of statements, expressions and types the parser accepts.
/// Every later pass walks the tree recursively, so this bounds them too.
pub const MAX_NESTING: usize = 256;

/// The parser's view of the token sequence.
///
/// Comments are invisible to lookahead; only statement parsing asks for them
/// explicitly through [`TokenStream::next_comment`]. The stream also hands
/// out node ids, so every node of one program gets a distinct id, and
/// tracks how deeply the construct being parsed is nested.
#[derive(Debug)]
pub struct TokenStream<'src> {
    tokens:  Vec<Token<'src>>,
    pos:     usize,
    eof:     Token<'src>,
    next_id: u32,
    depth:   usize,
}

impl<'src> TokenStream<'src> {
    #[must_use]
    pub fn new(tokens: Vec<Token<'src>>) -> Self {
        let eof = tokens.last()
                        .copied()
                        .filter(|t| t.kind == TokenKind::Eof)
                        .unwrap_or(Token { kind: TokenKind::Eof,
                                           text: "",
                                           span: Span::default() });
        Self { tokens,
               pos: 0,
               eof,
               next_id: 0,
               depth: 0 }
    }

    /// The tokens not yet consumed, without comments.
    pub fn upcoming(&self) -> impl Iterator<Item = Token<'src>> + '_ {
        self.tokens[self.pos.min(self.tokens.len())..].iter()
                                                       .filter(|t| !t.kind.is_comment())
                                                       .copied()
    }

    /// The `n`-th upcoming token, not counting comments. Past the end this
    /// is the end-of-input token.
    #[must_use]
    pub fn current(&self, n: usize) -> Token<'src> {
        self.upcoming().nth(n).unwrap_or(self.eof)
    }

    /// Whether the next token has the given kind.
    #[must_use]
    pub fn at(&self, kind: TokenKind) -> bool {
        self.current(0).kind == kind
    }

    /// Consumes and returns the next non-comment token.
    pub fn advance(&mut self) -> Token<'src> {
        while self.tokens.get(self.pos).is_some_and(|t| t.kind.is_comment()) {
            self.pos += 1;
        }
        let token = self.tokens.get(self.pos).copied().unwrap_or(self.eof);
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// Consumes the next token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        self.at(kind).then(|| self.advance())
    }

    /// Consumes the next token, which must have the given kind.
    ///
    /// # Errors
    /// `MissingSemicolonError` when a `;` was expected, `ParserError`
    /// otherwise. The error points at the offending token.
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'src>> {
        if let Some(token) = self.eat(kind) {
            return Ok(token);
        }
        let found = self.current(0);
        let error_kind = if kind == TokenKind::Semicolon {
            ErrorKind::MissingSemicolonError
        } else {
            ErrorKind::ParserError
        };
        Err(Diagnostic::new(error_kind, found.span, format!("expected {kind}, found {}", found.kind)))
    }

    /// Consumes the next raw token if it is a comment.
    pub fn next_comment(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.pos).copied()?;
        token.kind.is_comment().then(|| {
                                   self.pos += 1;
                                   token
                               })
    }

    /// A `ParserError` at the next token.
    #[must_use]
    pub fn unexpected(&self, expected: &str) -> Diagnostic {
        let found = self.current(0);
        Diagnostic::new(ErrorKind::ParserError,
                        found.span,
                        format!("expected {expected}, found {}", found.kind))
    }

    /// Enters one more level of nesting.
    ///
    /// # Errors
    /// A `ParserError` at the next token when the level would pass
    /// [`MAX_NESTING`].
    pub fn descend(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(Diagnostic::new(ErrorKind::ParserError,
                                       self.current(0).span,
                                       format!("expression nested too deeply (limit {MAX_NESTING})")));
        }
        self.depth += 1;
        Ok(())
    }

    /// Leaves `levels` levels entered with [`TokenStream::descend`].
    pub const fn ascend(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    /// Runs `parse` one level deeper.
    ///
    /// # Errors
    /// The nesting error of [`TokenStream::descend`], or whatever `parse`
    /// returns.
    pub fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.descend()?;
        let result = parse(self);
        self.ascend(1);
        result
    }

    /// Allocates a fresh node id.
    pub const fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of node ids handed out so far.
    #[must_use]
    pub const fn node_count(&self) -> u32 {
        self.next_id
    }
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing. It begins at the
/// lowest-precedence level, logical OR, and recursively descends through the
/// precedence hierarchy.
///
/// Grammar: `expression := logical_or`
///
/// # Errors
/// A `ParserError` on malformed input, or when expressions nest deeper than
/// [`MAX_NESTING`].
pub fn parse_expression(stream: &mut TokenStream<'_>) -> ParseResult<Expr> {
    stream.nested(parse_logical_or)
}

/// Parses a whole token sequence into a [`Program`].
///
/// Grammar: `program := (comment | statement)* EOF`
///
/// The first mismatch aborts the parse; there is no recovery.
///
/// # Example
/// ```
/// use ecru::interpreter::{lexer::tokenize, parser::core::parse_program};
///
/// let program = parse_program(tokenize("x = 3;").unwrap()).unwrap();
///
/// assert_eq!(program.to_string(), "Program(AssignStmt(x,3))");
/// ```
#[instrument(skip_all)]
pub fn parse_program(tokens: Vec<Token<'_>>) -> ParseResult<Program> {
    let mut stream = TokenStream::new(tokens);
    let start = stream.current(0).span;
    let statements = parse_statement_list(&mut stream, TokenKind::Eof)?;
    let span = statements.iter().fold(start, |span, stmt| span + stmt.span);
    debug!(statements = statements.len(), nodes = stream.node_count(), "parsed program");
    Ok(Program { statements,
                 span,
                 node_count: stream.node_count() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lexer::tokenize;

    #[test]
    fn nesting_is_bounded_and_given_back() {
        let mut stream = TokenStream::new(tokenize("x").unwrap());
        for _ in 0..MAX_NESTING {
            stream.descend().unwrap();
        }
        let error = stream.descend().unwrap_err();
        assert_eq!(error.kind, ErrorKind::ParserError);
        assert!(error.message.contains("nested too deeply"), "{}", error.message);
        assert_eq!(error.span, stream.current(0).span);

        stream.ascend(2);
        assert!(stream.nested(|s| s.descend()).is_ok());
        assert!(stream.descend().is_ok());
        assert!(stream.descend().is_err());
    }

    #[test]
    fn lookahead_skips_comments() {
        let stream = TokenStream::new(tokenize("a /* b */ c // d").unwrap());
        let texts = stream.upcoming().map(|t| t.text).collect::<Vec<_>>();
        assert_eq!(texts, ["a", "c", ""]);
        assert_eq!(stream.current(1).text, "c");
        assert_eq!(stream.current(5).kind, TokenKind::Eof);
    }
}
