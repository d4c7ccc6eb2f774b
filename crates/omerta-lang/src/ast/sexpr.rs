//! S-expression formatter for golden tests.
//!
//! Renders structure only; spans are omitted so that two parses of
//! equivalent source produce identical output.
//!
//! ```text
//! (transaction Escrow
//!   (actor Buyer)
//!   (message Offer Buyer Seller (field amount uint))
//!   (block Start entry (send Offer (when (> amount 0)))))
//! ```

use super::types::*;
use crate::lexer::quote;

/// Format a whole schema, one transaction per line.
pub fn format_schema(schema: &Schema) -> String {
    schema
        .transactions
        .iter()
        .map(format_transaction)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a transaction and all its declarations.
pub fn format_transaction(tx: &Transaction) -> String {
    let mut parts = vec![format!("transaction {}", tx.name)];
    if let Some(desc) = &tx.description {
        parts.push(quote(desc));
    }
    parts.extend(tx.declarations().map(format_decl));
    format!("({})", parts.join(" "))
}

/// Format a single declaration.
pub fn format_decl(decl: Decl<'_>) -> String {
    match decl {
        Decl::Actor(actor) => match &actor.role {
            Some(role) => format!("(actor {} (role {}))", actor.name, quote(role)),
            None => format!("(actor {})", actor.name),
        },
        Decl::Message(msg) => {
            let mut parts = vec![format!(
                "message {} {} {}",
                msg.name, msg.sender.name, msg.receiver.name
            )];
            parts.extend(
                msg.fields
                    .iter()
                    .map(|f| format!("(field {} {})", f.name, format_type(&f.ty))),
            );
            format!("({})", parts.join(" "))
        }
        Decl::Function(func) => {
            let mut parts = vec![format!("function {}", func.name)];
            parts.extend(
                func.params
                    .iter()
                    .map(|p| format!("(param {} {})", p.name, format_type(&p.ty))),
            );
            parts.push(format!("(returns {})", format_type(&func.returns)));
            if let Some(desc) = &func.description {
                parts.push(quote(desc));
            }
            format!("({})", parts.join(" "))
        }
        Decl::Block(block) => {
            let mut parts = vec![format!("block {}", block.name)];
            if block.entry {
                parts.push("entry".to_string());
            }
            parts.extend(block.statements.iter().map(format_statement));
            format!("({})", parts.join(" "))
        }
    }
}

/// Format a block statement.
pub fn format_statement(stmt: &Statement) -> String {
    let mut head = match &stmt.action {
        Action::Send(msg) => format!("send {}", msg.name),
        Action::Goto(block) => format!("goto {}", block.name),
        Action::Call { function, args } => {
            let mut s = format!("call {}", function.name);
            for arg in args {
                s.push(' ');
                s.push_str(&format_expr(arg));
            }
            s
        }
    };
    if let Some(guard) = &stmt.guard {
        head.push_str(&format!(" (when {})", format_expr(guard)));
    }
    format!("({head})")
}

/// Format a type reference; generic types become `(list hash)`.
pub fn format_type(ty: &TypeRef) -> String {
    if ty.args.is_empty() {
        ty.name.clone()
    } else {
        let args: Vec<_> = ty.args.iter().map(format_type).collect();
        format!("({} {})", ty.name, args.join(" "))
    }
}

/// Format an expression.
pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Path(segments) => segments.join("."),
        Expr::Int(n) => n.to_string(),
        Expr::Str(s) => quote(s),
        Expr::Bool(b) => b.to_string(),
        Expr::Not(inner) => format!("(! {})", format_expr(inner)),
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", op, format_expr(left), format_expr(right))
        }
    }
}
