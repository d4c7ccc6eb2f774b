//! Lexer for Omerta source.
//!
//! Built on logos. Whitespace and comments (`# ...`, `// ...`) are skipped, so
//! the parser only ever sees meaningful tokens. The lexer does not recover: the
//! first unrecognized input ends tokenization with a [`LexError`].

use std::fmt;

use logos::Logos;
use thiserror::Error;

use crate::span::{LineIndex, Span};

/// Omerta tokens.
#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    // Declaration keywords
    #[token("transaction")]
    Transaction,
    #[token("actor")]
    Actor,
    #[token("message")]
    Message,
    #[token("block")]
    Block,
    #[token("function")]
    Function,
    #[token("entry")]
    Entry,

    // Body keywords
    #[token("role")]
    Role,
    #[token("send")]
    Send,
    #[token("call")]
    Call,
    #[token("goto")]
    Goto,
    #[token("when")]
    When,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,

    // Operators
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Bang,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Trivia
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,
    #[regex(r"#[^\n]*", logos::skip, allow_greedy = true)]
    HashComment,
    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    LineComment,
}

impl Token {
    /// Keywords that open a top-level declaration. The recovering parser
    /// resynchronizes on these.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self,
            Token::Transaction
                | Token::Actor
                | Token::Message
                | Token::Block
                | Token::Function
                | Token::Entry
        )
    }
}

/// Spelling of every keyword, for callers that must avoid producing one.
pub const KEYWORDS: &[&str] = &[
    "transaction",
    "actor",
    "message",
    "block",
    "function",
    "entry",
    "role",
    "send",
    "call",
    "goto",
    "when",
    "true",
    "false",
];

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Transaction => write!(f, "transaction"),
            Token::Actor => write!(f, "actor"),
            Token::Message => write!(f, "message"),
            Token::Block => write!(f, "block"),
            Token::Function => write!(f, "function"),
            Token::Entry => write!(f, "entry"),
            Token::Role => write!(f, "role"),
            Token::Send => write!(f, "send"),
            Token::Call => write!(f, "call"),
            Token::Goto => write!(f, "goto"),
            Token::When => write!(f, "when"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Arrow => write!(f, "->"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Whitespace | Token::HashComment | Token::LineComment => Ok(()),
        }
    }
}

/// A token with its source text and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub span: Span,
}

/// Input that matches no token rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected character {character:?} at {span}")]
pub struct LexError {
    /// First character of the rejected input.
    pub character: char,
    /// The full rejected slice (e.g. an unterminated string).
    pub text: String,
    pub span: Span,
}

/// Tokenize Omerta source.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, LexError> {
    let index = LineIndex::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = index.span(range.start, range.end);
        let text = lexer.slice().to_string();
        match result {
            Ok(token) => tokens.push(Spanned { token, text, span }),
            Err(()) => {
                return Err(LexError {
                    character: text.chars().next().unwrap_or('\0'),
                    text,
                    span,
                });
            }
        }
    }

    Ok(tokens)
}

/// Strip quotes and process escapes. Unknown escapes reject the literal.
fn unescape(raw: &str) -> Option<String> {
    let inner = raw.get(1..raw.len().saturating_sub(1))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            _ => return None,
        }
    }
    Some(out)
}

/// Re-escape a string for printing as an Omerta literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src)
            .expect("lexes")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("transaction Escrow { actor Buyer {} }"),
            vec![
                Token::Transaction,
                Token::Ident("Escrow".into()),
                Token::LBrace,
                Token::Actor,
                Token::Ident("Buyer".into()),
                Token::LBrace,
                Token::RBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_identifier() {
        assert_eq!(kinds("actors"), vec![Token::Ident("actors".into())]);
        assert_eq!(kinds("entry_point"), vec![Token::Ident("entry_point".into())]);
    }

    #[test]
    fn arrow_and_comparisons() {
        assert_eq!(
            kinds("Buyer -> Seller a <= b != c"),
            vec![
                Token::Ident("Buyer".into()),
                Token::Arrow,
                Token::Ident("Seller".into()),
                Token::Ident("a".into()),
                Token::LtEq,
                Token::Ident("b".into()),
                Token::NotEq,
                Token::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let src = "# heading\nactor // trailing\nBuyer";
        assert_eq!(kinds(src), vec![Token::Actor, Token::Ident("Buyer".into())]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"\n""#),
            vec![Token::Str("say \"hi\"\n".into())]
        );
    }

    #[test]
    fn spans_track_lines() {
        let tokens = tokenize("actor\n  Buyer").expect("lexes");
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
        assert_eq!(tokens[1].span.offset, 8);
        assert_eq!(tokens[1].text, "Buyer");
    }

    #[test]
    fn rejects_unknown_character() {
        let err = tokenize("actor $Buyer").expect_err("should fail");
        assert_eq!(err.character, '$');
        assert_eq!(err.span.column, 7);
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn rejects_bad_escape() {
        assert!(tokenize(r#""\q""#).is_err());
    }

    #[test]
    fn quote_round_trips_through_lexer() {
        let original = "tab\there \"quoted\" back\\slash";
        let tokens = kinds(&quote(original));
        assert_eq!(tokens, vec![Token::Str(original.into())]);
    }
}
