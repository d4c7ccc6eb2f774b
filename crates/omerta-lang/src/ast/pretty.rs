//! Canonical source printer.
//!
//! `parse(&schema.to_string())` yields a schema structurally equal to the
//! original (spans aside).

use std::fmt;

use super::types::*;
use crate::lexer::quote;

const INDENT: &str = "    ";

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tx) in self.transactions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{tx}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction {}", self.name)?;
        if let Some(desc) = &self.description {
            write!(f, " {}", quote(desc))?;
        }
        writeln!(f, " {{")?;

        let mut written = false;
        if !self.actors.is_empty() {
            separate(f, &mut written)?;
            for actor in &self.actors {
                writeln!(f, "{INDENT}{actor}")?;
            }
        }
        if !self.messages.is_empty() {
            separate(f, &mut written)?;
            for message in &self.messages {
                write!(f, "{message}")?;
            }
        }
        if !self.functions.is_empty() {
            separate(f, &mut written)?;
            for function in &self.functions {
                writeln!(f, "{INDENT}{function}")?;
            }
        }
        if !self.blocks.is_empty() {
            separate(f, &mut written)?;
            for block in &self.blocks {
                write!(f, "{block}")?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for ActorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "actor {} {{ role: {} }}", self.name, quote(role)),
            None => write!(f, "actor {} {{}}", self.name),
        }
    }
}

impl fmt::Display for MessageDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{INDENT}message {} {} -> {} {{",
            self.name, self.sender.name, self.receiver.name
        )?;
        if self.fields.is_empty() {
            return writeln!(f, "}}");
        }
        writeln!(f)?;
        for field in &self.fields {
            writeln!(f, "{INDENT}{INDENT}{}: {},", field.name, field.ty)?;
        }
        writeln!(f, "{INDENT}}}")
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
        }
        write!(f, ") -> {} {{", self.returns)?;
        match &self.description {
            Some(desc) => write!(f, " {} }}", quote(desc)),
            None => write!(f, "}}"),
        }
    }
}

impl fmt::Display for BlockDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{INDENT}")?;
        if self.entry {
            write!(f, "entry ")?;
        }
        write!(f, "block {} {{", self.name)?;
        if self.statements.is_empty() {
            return writeln!(f, "}}");
        }
        writeln!(f)?;
        for stmt in &self.statements {
            writeln!(f, "{INDENT}{INDENT}{stmt}")?;
        }
        writeln!(f, "{INDENT}}}")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Action::Send(msg) => write!(f, "send {}", msg.name)?,
            Action::Goto(block) => write!(f, "goto {}", block.name)?,
            Action::Call { function, args } => {
                write!(f, "call {}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")?;
            }
        }
        if let Some(guard) = &self.guard {
            write!(f, " when {guard}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Path(segments) => write!(f, "{}", segments.join(".")),
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Str(s) => write!(f, "{}", quote(s)),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Not(inner) => {
                if matches!(**inner, Expr::Binary { op, .. } if op.precedence() < 3) {
                    write!(f, "!({inner})")
                } else {
                    write!(f, "!{inner}")
                }
            }
            Expr::Binary { left, op, right } => {
                let prec = op.precedence();
                let comparison = prec == 3;
                let wrap_left = if comparison {
                    !left.is_atom()
                } else {
                    left.binary_precedence().is_some_and(|p| p < prec)
                };
                let wrap_right = if comparison {
                    !right.is_atom()
                } else {
                    right.binary_precedence().is_some_and(|p| p <= prec)
                };
                write_operand(f, left, wrap_left)?;
                write!(f, " {op} ")?;
                write_operand(f, right, wrap_right)
            }
        }
    }
}

/// Blank line between declaration groups.
fn separate(f: &mut fmt::Formatter<'_>, written: &mut bool) -> fmt::Result {
    if *written {
        writeln!(f)?;
    }
    *written = true;
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, wrap: bool) -> fmt::Result {
    if wrap {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl Expr {
    fn is_atom(&self) -> bool {
        matches!(
            self,
            Expr::Path(_) | Expr::Int(_) | Expr::Str(_) | Expr::Bool(_)
        )
    }

    fn binary_precedence(&self) -> Option<u8> {
        match self {
            Expr::Binary { op, .. } => Some(op.precedence()),
            _ => None,
        }
    }
}
