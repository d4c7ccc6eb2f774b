//! Diagnostic output.
//!
//! Two formats: a grep-friendly single line per diagnostic, and an ariadne
//! source snippet for terminals.

use std::io::Write;
use std::path::Path;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

use super::Diagnostic;
use crate::validator::Severity;

/// `path:line:col: severity[code]: message (did you mean `X`?)`
pub fn render_plain(path: &Path, diag: &Diagnostic) -> String {
    let mut line = if diag.span.line == 0 {
        format!(
            "{}: {}[{}]: {}",
            path.display(),
            diag.severity,
            diag.code(),
            diag.message
        )
    } else {
        format!(
            "{}:{}: {}[{}]: {}",
            path.display(),
            diag.span,
            diag.severity,
            diag.code(),
            diag.message
        )
    };
    if let Some(name) = &diag.suggestion {
        line.push_str(&format!(" (did you mean `{name}`?)"));
    }
    if diag.fix.is_some() {
        line.push_str(" [fixable]");
    }
    line
}

/// Render diagnostics as annotated source snippets.
///
/// Diagnostics without a source location (I/O failures) fall back to the
/// plain format.
pub fn render_pretty<W: Write>(
    path: &Path,
    source: &str,
    diagnostics: &[Diagnostic],
    mut out: W,
) -> std::io::Result<()> {
    let id = path.display().to_string();
    for diag in diagnostics {
        if diag.span.line == 0 {
            writeln!(out, "{}", render_plain(path, diag))?;
            continue;
        }

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        // Zero-width spans (end of input) still get a one-character marker.
        let end = diag.span.end().max(diag.span.offset + 1).min(source.len());
        let range = diag.span.offset.min(end)..end;
        let note = match &diag.suggestion {
            Some(name) => format!("{} (did you mean `{name}`?)", diag.message),
            None => diag.message.clone(),
        };
        let label = Label::new((id.clone(), range.clone())).with_message(note);

        let mut report = Report::build(kind, (id.clone(), range))
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_code(diag.code())
            .with_message(&diag.message)
            .with_label(label);
        if diag.fix.is_some() {
            report = report.with_help("run with --fix to apply the suggestion");
        }
        report
            .finish()
            .write((id.clone(), Source::from(source)), &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_source;

    const SRC: &str = "transaction T {\n  actor A {}\n  message M A -> B {}\n  block S { send M }\n}";

    #[test]
    fn plain_line_format() {
        let diags = lint_source(SRC);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            render_plain(Path::new("t.omt"), &diags[0]),
            "t.omt:3:18: error[E002]: unknown actor `B` (did you mean `A`?) [fixable]"
        );
    }

    #[test]
    fn pretty_contains_code_and_snippet() {
        let diags = lint_source(SRC);
        let mut out = Vec::new();
        render_pretty(Path::new("t.omt"), SRC, &diags, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("E002"), "{text}");
        assert!(text.contains("message M A -> B {}"), "{text}");
        assert!(text.contains("did you mean `A`?"), "{text}");
    }
}
