use std::fmt;

use logos::Logos;
use tracing::{debug, instrument};

use crate::{
    error::{Diagnostic, EcruResult, ErrorKind},
    util::span::{LineIndex, Span},
};

/// Failures the lexer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexError {
    /// No token starts with the current character.
    #[default]
    UnknownCharacter,
    /// A `"` with no closing quote before the end of input.
    UnterminatedString,
    /// A `/*` with no closing `*/` before the end of input.
    UnterminatedComment,
}

impl LexError {
    const fn kind(self) -> ErrorKind {
        match self {
            Self::UnknownCharacter => ErrorKind::UnknownCharacterError,
            Self::UnterminatedString | Self::UnterminatedComment => ErrorKind::ParserError,
        }
    }

    fn message(self, slice: &str) -> String {
        match self {
            Self::UnknownCharacter => format!("unknown character '{slice}'"),
            Self::UnterminatedString => "unterminated string literal".to_string(),
            Self::UnterminatedComment => "unterminated block comment".to_string(),
        }
    }
}

/// Represents the kind of a lexical token.
///
/// The token text and position live on [`Token`]; kinds carry no data so the
/// parser can match on them cheaply.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `// ...` up to the end of the line.
    #[regex(r"//[^\n]*")]
    LineComment,
    /// `/* ... */`, possibly spanning lines.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    #[regex(r"/\*([^*]|\*+[^*/])*\**", unterminated_comment)]
    BlockComment,
    /// Numeric literal tokens, such as `42` or `1.25`. Malformed numbers
    /// such as `1.2.3` are rejected by the parser.
    #[regex(r"[0-9][0-9.]*")]
    Number,
    /// String literal tokens, quotes and escapes included.
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#""([^"\\]|\\.)*"#, unterminated_string)]
    Str,
    /// Identifier tokens; variable, function and base type names.
    #[regex(r"[A-Za-z$_][A-Za-z0-9$_]*")]
    Identifier,
    /// `print`
    #[token("print")]
    Print,
    /// `println`
    #[token("println")]
    Println,
    /// `pprint`
    #[token("pprint")]
    PPrint,
    /// `pprintln`
    #[token("pprintln")]
    PPrintln,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `while`
    #[token("while")]
    While,
    /// `for`
    #[token("for")]
    For,
    /// `return`
    #[token("return")]
    Return,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `void`, both the type and its only value.
    #[token("void")]
    Void,
    /// `\lambda` or `λ`
    #[token("\\lambda")]
    #[token("λ")]
    Lambda,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `~=`
    #[token("~=")]
    TildeEqual,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `->`
    #[token("->")]
    Arrow,
    /// `=>`
    #[token("=>")]
    FatArrow,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    MulAssign,
    /// `/=`
    #[token("/=")]
    DivAssign,
    /// `%=`
    #[token("%=")]
    ModAssign,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `^`
    #[token("^")]
    Caret,
    /// `!`
    #[token("!")]
    Bang,
    /// `~`
    #[token("~")]
    Tilde,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `=`
    #[token("=")]
    Equals,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `:`
    #[token(":")]
    Colon,
    /// End of input. Appended by [`tokenize`], never matched.
    Eof,
}

impl TokenKind {
    /// Whether the token is a comment of either form.
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LineComment | Self::BlockComment => "comment",
            Self::Number => "number",
            Self::Str => "string",
            Self::Identifier => "identifier",
            Self::Print => "'print'",
            Self::Println => "'println'",
            Self::PPrint => "'pprint'",
            Self::PPrintln => "'pprintln'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::While => "'while'",
            Self::For => "'for'",
            Self::Return => "'return'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Void => "'void'",
            Self::Lambda => "lambda",
            Self::EqualEqual => "'=='",
            Self::TildeEqual => "'~='",
            Self::AndAnd => "'&&'",
            Self::PipePipe => "'||'",
            Self::LessEqual => "'<='",
            Self::GreaterEqual => "'>='",
            Self::Arrow => "'->'",
            Self::FatArrow => "'=>'",
            Self::PlusAssign => "'+='",
            Self::MinusAssign => "'-='",
            Self::MulAssign => "'*='",
            Self::DivAssign => "'/='",
            Self::ModAssign => "'%='",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Caret => "'^'",
            Self::Bang => "'!'",
            Self::Tilde => "'~'",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::Equals => "'='",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Eof => "end of input",
        };
        write!(f, "{text}")
    }
}

fn unterminated_string(_: &mut logos::Lexer<TokenKind>) -> Result<(), LexError> {
    Err(LexError::UnterminatedString)
}

fn unterminated_comment(_: &mut logos::Lexer<TokenKind>) -> Result<(), LexError> {
    Err(LexError::UnterminatedComment)
}

/// A token: its kind, the exact source text it covers, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

/// Splits source text into tokens, ending with a single [`TokenKind::Eof`].
///
/// Whitespace is dropped; comments are kept so the parser can turn them into
/// comment statements.
///
/// # Errors
/// - `UnknownCharacterError` on a character no token starts with.
/// - `ParserError` on an unterminated string or block comment.
///
/// # Example
/// ```
/// use ecru::interpreter::lexer::{TokenKind, tokenize};
///
/// let tokens = tokenize("x: Z = 3;").unwrap();
/// let kinds = tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
///
/// assert_eq!(kinds,
///            [TokenKind::Identifier,
///             TokenKind::Colon,
///             TokenKind::Identifier,
///             TokenKind::Equals,
///             TokenKind::Number,
///             TokenKind::Semicolon,
///             TokenKind::Eof]);
/// ```
#[instrument(skip_all)]
pub fn tokenize(source: &str) -> EcruResult<Vec<Token<'_>>> {
    let index = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = index.span(lexer.span());
        match result {
            Ok(kind) => tokens.push(Token { kind,
                                            text: lexer.slice(),
                                            span }),
            Err(error) => {
                return Err(Diagnostic::new(error.kind(), span, error.message(lexer.slice())));
            },
        }
    }
    tokens.push(Token { kind: TokenKind::Eof,
                        text: "",
                        span: index.span(source.len()..source.len()) });
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn two_character_punctuation_wins() {
        assert_eq!(kinds("a==b~=c<=d->e=>f"),
                   [TokenKind::Identifier,
                    TokenKind::EqualEqual,
                    TokenKind::Identifier,
                    TokenKind::TildeEqual,
                    TokenKind::Identifier,
                    TokenKind::LessEqual,
                    TokenKind::Identifier,
                    TokenKind::Arrow,
                    TokenKind::Identifier,
                    TokenKind::FatArrow,
                    TokenKind::Identifier,
                    TokenKind::Eof]);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(kinds("print printer void $x_1"),
                   [TokenKind::Print,
                    TokenKind::Identifier,
                    TokenKind::Void,
                    TokenKind::Identifier,
                    TokenKind::Eof]);
        assert_eq!(kinds("\\lambda λ"), [TokenKind::Lambda, TokenKind::Lambda, TokenKind::Eof]);
    }

    #[test]
    fn numbers_keep_every_dot() {
        let tokens = tokenize("1.2.3 42").unwrap();
        assert_eq!(tokens[0].text, "1.2.3");
        assert_eq!(tokens[1].text, "42");
    }

    #[test]
    fn comments_are_tokens() {
        let tokens = tokenize("// hi\nx /* a\n* b */ y").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[2].kind, TokenKind::BlockComment);
        assert_eq!(tokens[2].span, Span::new(2, 3, 3, 7));
    }

    #[test]
    fn token_texts_rebuild_the_source() {
        let source = "f(x:Z):Z{\n  return x+1; // done\n}\nprint \"a\\\"b\";";
        let rebuilt = tokenize(source).unwrap()
                                      .iter()
                                      .filter(|t| !t.kind.is_comment())
                                      .map(|t| t.text)
                                      .collect::<String>();
        let expected = "f(x:Z):Z{returnx+1;}print\"a\\\"b\";";
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn spans_never_go_backwards() {
        let source = "x: Z = 1;\nwhile (x < 10) {\n\tx += 1;\n}\n";
        let tokens = tokenize(source).unwrap();
        for pair in tokens.windows(2) {
            assert!(pair[0].span.start() <= pair[1].span.start(),
                    "{} then {}",
                    pair[0].span,
                    pair[1].span);
        }
    }

    #[test]
    fn unknown_characters_are_errors() {
        let error = tokenize("x = 1 # 2;").unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnknownCharacterError);
        assert_eq!(error.span, Span::new(1, 7, 1, 8));
    }

    #[test]
    fn unterminated_literals_are_errors() {
        assert_eq!(tokenize("\"abc").unwrap_err().kind, ErrorKind::ParserError);
        assert_eq!(tokenize("/* abc").unwrap_err().kind, ErrorKind::ParserError);
    }
}
