//! Parser for Omerta source.
//!
//! Transforms the lexer's token stream into a [`Schema`]. Uses chumsky parser
//! combinators over a token slice.
//!
//! Two modes:
//! - [`parse`] / [`parse_file`] fail fast on the first lex or syntax error.
//! - [`parse_recovering`] keeps going after a syntax error by resuming at the
//!   next top-level declaration keyword, so a linter can report several
//!   independent mistakes at once. It never produces a repaired AST.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chumsky::{error::RichPattern, input::ValueInput, prelude::*};
use thiserror::Error;

use crate::ast::{
    Action, ActorDecl, BinaryOp, BlockDecl, Expr, Field, FunctionDecl, MessageDecl, NameRef,
    Param, Schema, Statement, Transaction, TypeRef,
};
use crate::lexer::{self, LexError, Spanned, Token};
use crate::span::{LineIndex, Span};

/// Span type handed to chumsky: byte ranges into the source.
type TokSpan = SimpleSpan;

type Extra<'tokens> = extra::Err<Rich<'tokens, Token, TokSpan>>;

/// File name every transaction directory holds.
pub const TRANSACTION_FILE: &str = "transaction.omt";

/// Syntax error with the constructs the parser was looking for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {span}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    /// Constructs that would have been accepted here.
    pub expected: Vec<String>,
    /// The token actually found; `None` at end of input.
    pub found: Option<String>,
}

/// Any error that stops a parse: malformed token or malformed syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(e) => e.span,
            SyntaxError::Parse(e) => e.span,
        }
    }
}

/// Errors from the file-level entry points.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<LexError> for FrontendError {
    fn from(e: LexError) -> Self {
        FrontendError::Syntax(SyntaxError::Lex(e))
    }
}

impl From<ParseError> for FrontendError {
    fn from(e: ParseError) -> Self {
        FrontendError::Syntax(SyntaxError::Parse(e))
    }
}

/// Outcome of a recovering parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// Present only when the source had no errors at all.
    pub schema: Option<Schema>,
    /// Errors in source order.
    pub errors: Vec<SyntaxError>,
}

/// Parse Omerta source into a Schema, stopping at the first error.
pub fn parse(source: &str) -> Result<Schema, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    parse_tokens(source, &tokens).map_err(SyntaxError::Parse)
}

/// Read and parse a `.omt` file.
pub fn parse_file(path: &Path) -> Result<Schema, FrontendError> {
    let source = std::fs::read_to_string(path).map_err(|source| FrontendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "parsing file");
    Ok(parse(&source)?)
}

/// Load the transaction declared in `<tx_dir>/transaction.omt`.
///
/// The file must parse; when it declares several transactions the first one
/// is returned.
pub fn load_transaction_ast(tx_dir: &Path) -> Result<Transaction, FrontendError> {
    let schema = parse_file(&tx_dir.join(TRANSACTION_FILE))?;
    // A parsed schema always holds at least one transaction.
    schema
        .transactions
        .into_iter()
        .next()
        .ok_or_else(|| {
            FrontendError::from(ParseError {
                span: Span::default(),
                message: "no transaction declared".to_string(),
                expected: vec!["transaction".to_string()],
                found: None,
            })
        })
}

/// Parse, collecting every independent syntax error instead of stopping.
pub fn parse_recovering(source: &str) -> Recovered {
    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            return Recovered {
                schema: None,
                errors: vec![SyntaxError::Lex(e)],
            };
        }
    };

    let first = match parse_tokens(source, &tokens) {
        Ok(schema) => {
            return Recovered {
                schema: Some(schema),
                errors: Vec::new(),
            };
        }
        Err(e) => e,
    };

    let index = LineIndex::new(source);
    let bounds = chunk_bounds(&tokens);
    let mut errors = vec![first.clone()];

    // The fail-fast error already speaks for the chunk it falls in. When it
    // sits on a chunk's first token, the chunk before was left unterminated
    // and reports the same problem; parsing resumes at that token.
    let owner = bounds
        .iter()
        .rposition(|&(start, _)| tokens[start].span.offset <= first.span.offset)
        .unwrap_or(0);
    let at_boundary = owner > 0 && tokens[bounds[owner].0].span.offset == first.span.offset;
    let reported = if at_boundary { owner - 1 } else { owner };

    for (i, &(start, end)) in bounds.iter().enumerate() {
        if i == reported {
            continue;
        }
        let chunk_end = tokens
            .get(end)
            .map(|t| t.span.offset)
            .unwrap_or(source.len());
        if let Err(e) = parse_chunk(&index, &tokens[start..end], chunk_end) {
            errors.push(e);
        }
    }

    errors.sort_by_key(|e| e.span.offset);
    errors.dedup_by_key(|e| e.span.offset);
    tracing::debug!(errors = errors.len(), "recovered from syntax errors");

    Recovered {
        schema: None,
        errors: errors.into_iter().map(SyntaxError::Parse).collect(),
    }
}

/// Split a token stream at every top-level declaration keyword.
///
/// `entry block` stays together. Returns half-open token index ranges.
fn chunk_bounds(tokens: &[Spanned]) -> Vec<(usize, usize)> {
    let mut starts: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.token.starts_declaration()
                && !(t.token == Token::Block
                    && *i > 0
                    && tokens[*i - 1].token == Token::Entry)
        })
        .map(|(i, _)| i)
        .collect();
    if starts.first() != Some(&0) && !tokens.is_empty() {
        starts.insert(0, 0);
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| (start, starts.get(i + 1).copied().unwrap_or(tokens.len())))
        .collect()
}

fn parse_tokens(source: &str, tokens: &[Spanned]) -> Result<Schema, ParseError> {
    let index = LineIndex::new(source);
    let tokens: Vec<(Token, TokSpan)> = tokens
        .iter()
        .map(|t| (t.token.clone(), (t.span.offset..t.span.end()).into()))
        .collect();

    // End-of-input span
    let end_span: TokSpan = (source.len()..source.len()).into();

    let result = schema_parser(&index).parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));

    result.into_result().map_err(|errs| {
        errs.into_iter()
            .next()
            .map(|e| convert_error(&index, e))
            .unwrap_or_else(|| ParseError {
                span: index.eof(),
                message: "invalid input".to_string(),
                expected: Vec::new(),
                found: None,
            })
    })
}

/// Parse one recovery chunk: a transaction header or a single declaration,
/// optionally followed by closing braces.
fn parse_chunk(index: &LineIndex<'_>, tokens: &[Spanned], end: usize) -> Result<(), ParseError> {
    let tokens: Vec<(Token, TokSpan)> = tokens
        .iter()
        .map(|t| (t.token.clone(), (t.span.offset..t.span.end()).into()))
        .collect();
    let end_span: TokSpan = (end..end).into();

    let result = chunk_parser(index).parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));

    result.into_result().map_err(|errs| {
        errs.into_iter()
            .next()
            .map(|e| convert_error(index, e))
            .unwrap_or_else(|| ParseError {
                span: index.span(end, end),
                message: "invalid input".to_string(),
                expected: Vec::new(),
                found: None,
            })
    })
}

fn convert_error(index: &LineIndex<'_>, e: Rich<'_, Token, TokSpan>) -> ParseError {
    let span = to_span(index, *e.span());
    let expected: Vec<String> = e
        .expected()
        .map(describe_pattern)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found = e.found().map(|t| t.to_string());

    let found_text = match &found {
        Some(tok) => format!("unexpected `{tok}`"),
        None => "unexpected end of input".to_string(),
    };
    let message = if expected.is_empty() {
        found_text
    } else {
        format!("{found_text}, expected {}", expected.join(", "))
    };

    ParseError {
        span,
        message,
        expected,
        found,
    }
}

/// Tokens in backticks, like the `found` side of the message. Labels stay bare.
fn describe_pattern(pattern: &RichPattern<'_, Token>) -> String {
    match pattern {
        RichPattern::Token(tok) => format!("`{}`", &**tok),
        RichPattern::Identifier(word) => format!("`{word}`"),
        RichPattern::Label(label) => label.to_string(),
        RichPattern::Any => "any token".to_string(),
        RichPattern::SomethingElse => "something else".to_string(),
        RichPattern::EndOfInput => "end of input".to_string(),
    }
}

fn to_span(index: &LineIndex<'_>, span: TokSpan) -> Span {
    index.span(span.start, span.end)
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// A parsed declaration before it is sorted into its transaction.
enum Item {
    Actor(ActorDecl),
    Message(MessageDecl),
    Block(BlockDecl),
    Function(FunctionDecl),
}

/// Top-level schema parser: one or more transactions.
fn schema_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, Schema, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    transaction_parser(lines)
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|transactions| Schema { transactions })
}

/// Recovery chunk: a transaction header or one declaration.
fn chunk_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, (), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    choice((
        transaction_header_parser(lines).ignored(),
        declaration_parser(lines).ignored(),
    ))
    .then_ignore(just(Token::RBrace).repeated())
    .then_ignore(end())
}

/// `transaction Name "description"? {`
fn transaction_header_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, ((String, Span), Option<String>), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    just(Token::Transaction)
        .ignore_then(spanned_ident_parser(lines))
        .then(string_parser().or_not())
        .then_ignore(just(Token::LBrace))
        .labelled("transaction")
}

/// Transaction: `transaction Name "description"? { declarations }`
fn transaction_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, Transaction, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    transaction_header_parser(lines)
        .then(declaration_parser(lines).repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::RBrace))
        .map(|(((name, span), description), items)| {
            let mut tx = Transaction {
                name,
                description,
                actors: Vec::new(),
                messages: Vec::new(),
                blocks: Vec::new(),
                functions: Vec::new(),
                span,
            };
            for item in items {
                match item {
                    Item::Actor(a) => tx.actors.push(a),
                    Item::Message(m) => tx.messages.push(m),
                    Item::Block(b) => tx.blocks.push(b),
                    Item::Function(f) => tx.functions.push(f),
                }
            }
            tx
        })
        .boxed()
}

/// Any declaration inside a transaction body.
fn declaration_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, Item, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    choice((
        actor_parser(lines).map(Item::Actor),
        message_parser(lines).map(Item::Message),
        function_parser(lines).map(Item::Function),
        block_parser(lines).map(Item::Block),
    ))
    .labelled("declaration")
    .boxed()
}

/// Actor: `actor Name { role: "description" }`
fn actor_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, ActorDecl, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    let role = just(Token::Role)
        .ignore_then(just(Token::Colon))
        .ignore_then(choice((string_parser(), ident_parser())))
        .then_ignore(just(Token::Comma).or_not())
        .labelled("role");

    just(Token::Actor)
        .ignore_then(spanned_ident_parser(lines))
        .then(
            role.or_not()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|((name, span), role)| ActorDecl { name, role, span })
        .labelled("actor declaration")
        .boxed()
}

/// Message: `message Name Sender -> Receiver { field: type, ... }`
fn message_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, MessageDecl, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    let field = spanned_ident_parser(lines)
        .then_ignore(just(Token::Colon))
        .then(type_parser(lines))
        .map(|((name, span), ty)| Field { name, ty, span })
        .labelled("field");

    just(Token::Message)
        .ignore_then(spanned_ident_parser(lines))
        .then(name_ref_parser(lines))
        .then_ignore(just(Token::Arrow))
        .then(name_ref_parser(lines))
        .then(
            field
                .then_ignore(just(Token::Comma).or_not())
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|((((name, span), sender), receiver), fields)| MessageDecl {
            name,
            sender,
            receiver,
            fields,
            span,
        })
        .labelled("message declaration")
        .boxed()
}

/// Function: `function name(param: type, ...) -> type { "description" }`
fn function_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, FunctionDecl, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    let param = spanned_ident_parser(lines)
        .then_ignore(just(Token::Colon))
        .then(type_parser(lines))
        .map(|((name, span), ty)| Param { name, ty, span })
        .labelled("parameter");

    just(Token::Function)
        .ignore_then(spanned_ident_parser(lines))
        .then(
            param
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(just(Token::Arrow).ignore_then(type_parser(lines)).or_not())
        .then(
            string_parser()
                .or_not()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|((((name, span), params), returns), description)| FunctionDecl {
            returns: returns.unwrap_or_else(|| TypeRef {
                name: "unit".to_string(),
                args: Vec::new(),
                span,
            }),
            name,
            params,
            description,
            span,
        })
        .labelled("function declaration")
        .boxed()
}

/// Block: `entry? block Name { statements }`
fn block_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, BlockDecl, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    just(Token::Entry)
        .or_not()
        .then_ignore(just(Token::Block))
        .then(spanned_ident_parser(lines))
        .then(
            statement_parser(lines)
                .then_ignore(just(Token::Semi).or_not())
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|((entry, (name, span)), statements)| BlockDecl {
            name,
            entry: entry.is_some(),
            statements,
            span,
        })
        .labelled("block declaration")
        .boxed()
}

/// Statement: `send Msg | call func(args) | goto Block`, then `when cond`.
fn statement_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, Statement, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    let send = just(Token::Send)
        .ignore_then(name_ref_parser(lines))
        .map(Action::Send);

    let goto = just(Token::Goto)
        .ignore_then(name_ref_parser(lines))
        .map(Action::Goto);

    let call = just(Token::Call)
        .ignore_then(name_ref_parser(lines))
        .then(
            expr_parser()
                .separated_by(just(Token::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map(|(function, args)| Action::Call { function, args });

    choice((send, call, goto))
        .then(just(Token::When).ignore_then(expr_parser()).or_not())
        .map_with(move |(action, guard), e| Statement {
            action,
            guard,
            span: to_span(lines, e.span()),
        })
        .labelled("statement")
        .boxed()
}

/// Type: `name` or `name<type, ...>`
fn type_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, TypeRef, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    recursive(move |ty| {
        ident_parser()
            .then(
                ty.separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::Lt), just(Token::Gt))
                    .or_not(),
            )
            .map_with(move |(name, args), e| TypeRef {
                name,
                args: args.unwrap_or_default(),
                span: to_span(lines, e.span()),
            })
    })
    .labelled("type")
    .boxed()
}

/// Guard/argument expression parser.
///
/// Grammar:
///   expr    = and_expr { "||" and_expr }
///   and     = unary { "&&" unary }
///   unary   = "!" unary | cmp
///   cmp     = operand [ comp_op operand ]
///   operand = path | int | string | bool | "(" expr ")"
fn expr_parser<'tokens, I>() -> impl Parser<'tokens, I, Expr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(n) => Expr::Int(n),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
        };

        let path = ident_parser()
            .separated_by(just(Token::Dot))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(Expr::Path);

        let operand = choice((
            literal,
            path,
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .labelled("expression");

        let comparison_op = select! {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
        };

        // cmp: operand [ comp_op operand ]
        let cmp = operand
            .clone()
            .then(comparison_op.then(operand).or_not())
            .map(|(left, rest)| match rest {
                Some((op, right)) => Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                None => left,
            });

        // unary: "!" unary | cmp
        let unary = recursive(|unary| {
            just(Token::Bang)
                .ignore_then(unary)
                .map(|inner| Expr::Not(Box::new(inner)))
                .or(cmp)
        });

        // and: unary { "&&" unary }
        let and_expr = unary.clone().foldl(
            just(Token::And).ignore_then(unary).repeated(),
            |left, right| Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
            },
        );

        // or: and { "||" and }
        and_expr.clone().foldl(
            just(Token::Or).ignore_then(and_expr).repeated(),
            |left, right| Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
            },
        )
    })
    .labelled("condition")
    .boxed()
}

/// Reference to a declared name.
fn name_ref_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, NameRef, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    spanned_ident_parser(lines).map(|(name, span)| NameRef { name, span })
}

/// Identifier with its span.
fn spanned_ident_parser<'tokens, I>(
    lines: &'tokens LineIndex<'tokens>,
) -> impl Parser<'tokens, I, (String, Span), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    ident_parser().map_with(move |name, e| (name, to_span(lines, e.span())))
}

/// Identifier parser.
fn ident_parser<'tokens, I>() -> impl Parser<'tokens, I, String, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}

/// String literal parser.
fn string_parser<'tokens, I>() -> impl Parser<'tokens, I, String, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = TokSpan>,
{
    select! {
        Token::Str(s) => s,
    }
    .labelled("string")
}
