//! AST type definitions.
//!
//! These types represent parsed Omerta source. The parser builds them once;
//! the validator and linter only read them.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Root of a parsed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub transactions: Vec<Transaction>,
}

/// One protocol definition: `transaction Name "description" { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub name: String,
    pub description: Option<String>,
    pub actors: Vec<ActorDecl>,
    pub messages: Vec<MessageDecl>,
    pub blocks: Vec<BlockDecl>,
    pub functions: Vec<FunctionDecl>,
    /// Span of the transaction name.
    pub span: Span,
}

/// `actor Name { role: "..." }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorDecl {
    pub name: String,
    pub role: Option<String>,
    pub span: Span,
}

/// `message Name Sender -> Receiver { field: type, ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    pub name: String,
    pub sender: NameRef,
    pub receiver: NameRef,
    pub fields: Vec<Field>,
    pub span: Span,
}

/// A typed message field: `amount: uint`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// `entry block Name { statements }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDecl {
    pub name: String,
    /// Marked with the `entry` keyword.
    pub entry: bool,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// One step of a block, optionally guarded: `send Offer when ready`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub action: Action,
    pub guard: Option<Expr>,
    pub span: Span,
}

/// What a statement does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Action {
    /// `send MessageName`
    Send(NameRef),
    /// `call function_name(arg, ...)`
    Call { function: NameRef, args: Vec<Expr> },
    /// `goto BlockName`
    Goto(NameRef),
}

impl Action {
    /// The referenced name and the category it must resolve in.
    pub fn target(&self) -> (&NameRef, DeclKind) {
        match self {
            Action::Send(name) => (name, DeclKind::Message),
            Action::Call { function, .. } => (function, DeclKind::Function),
            Action::Goto(name) => (name, DeclKind::Block),
        }
    }
}

/// `function name(param: type, ...) -> type { "description" }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: TypeRef,
    pub description: Option<String>,
    pub span: Span,
}

/// Function parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// A declared type: `hash`, `list<signature>`, `map<address, amount>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub span: Span,
}

/// A use of a declared name, kept with the span of the identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameRef {
    pub name: String,
    pub span: Span,
}

/// Guard and argument expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Dotted path: `offer.amount`
    Path(Vec<String>),
    Int(i64),
    Str(String),
    Bool(bool),
    Not(Box<Expr>),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::GtEq => write!(f, ">="),
        }
    }
}

/// Declaration categories. Each has its own namespace inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Actor,
    Message,
    Block,
    Function,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Actor => "actor",
            DeclKind::Message => "message",
            DeclKind::Block => "block",
            DeclKind::Function => "function",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of any declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'a> {
    Actor(&'a ActorDecl),
    Message(&'a MessageDecl),
    Block(&'a BlockDecl),
    Function(&'a FunctionDecl),
}

impl<'a> Decl<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Decl::Actor(d) => &d.name,
            Decl::Message(d) => &d.name,
            Decl::Block(d) => &d.name,
            Decl::Function(d) => &d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Actor(d) => d.span,
            Decl::Message(d) => d.span,
            Decl::Block(d) => d.span,
            Decl::Function(d) => d.span,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Actor(_) => DeclKind::Actor,
            Decl::Message(_) => DeclKind::Message,
            Decl::Block(_) => DeclKind::Block,
            Decl::Function(_) => DeclKind::Function,
        }
    }
}

impl Transaction {
    /// All declarations, grouped by category in the order actors, messages,
    /// blocks, functions. Source order is kept within each group.
    pub fn declarations(&self) -> impl Iterator<Item = Decl<'_>> {
        self.actors
            .iter()
            .map(Decl::Actor)
            .chain(self.messages.iter().map(Decl::Message))
            .chain(self.blocks.iter().map(Decl::Block))
            .chain(self.functions.iter().map(Decl::Function))
    }

    /// Declarations of one category.
    pub fn declarations_of(&self, kind: DeclKind) -> impl Iterator<Item = Decl<'_>> {
        self.declarations().filter(move |d| d.kind() == kind)
    }

    /// Every block statement, with the block it belongs to.
    pub fn statements(&self) -> impl Iterator<Item = (&BlockDecl, &Statement)> {
        self.blocks
            .iter()
            .flat_map(|b| b.statements.iter().map(move |s| (b, s)))
    }

    /// Whether any block moves control with `goto`.
    pub fn uses_transitions(&self) -> bool {
        self.statements()
            .any(|(_, s)| matches!(s.action, Action::Goto(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn tx(src: &str) -> Transaction {
        let mut schema = parse(src).expect("parses");
        schema.transactions.remove(0)
    }

    #[test]
    fn declarations_are_grouped_by_category() {
        let tx = tx("transaction T { function f() {} block B {} message M A -> A {} actor A {} }");
        let seen: Vec<(DeclKind, &str)> = tx.declarations().map(|d| (d.kind(), d.name())).collect();
        assert_eq!(
            seen,
            vec![
                (DeclKind::Actor, "A"),
                (DeclKind::Message, "M"),
                (DeclKind::Block, "B"),
                (DeclKind::Function, "f"),
            ]
        );
        assert_eq!(tx.declarations_of(DeclKind::Block).count(), 1);
    }

    #[test]
    fn statements_carry_their_block() {
        let tx = tx("transaction T { block A { send M } block B { goto A call f() } }");
        let owners: Vec<&str> = tx.statements().map(|(b, _)| b.name.as_str()).collect();
        assert_eq!(owners, vec!["A", "B", "B"]);
        assert!(tx.uses_transitions());
    }

    #[test]
    fn action_targets_name_their_category() {
        let tx = tx("transaction T { block A { send M call f() goto A } }");
        let targets: Vec<(&str, DeclKind)> = tx
            .statements()
            .map(|(_, s)| {
                let (target, kind) = s.action.target();
                (target.name.as_str(), kind)
            })
            .collect();
        assert_eq!(
            targets,
            vec![
                ("M", DeclKind::Message),
                ("f", DeclKind::Function),
                ("A", DeclKind::Block),
            ]
        );
    }

    #[test]
    fn logic_binds_looser_than_comparison() {
        assert!(BinaryOp::Or.precedence() < BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() < BinaryOp::Lt.precedence());
        assert_eq!(DeclKind::Function.to_string(), "function");
    }
}
