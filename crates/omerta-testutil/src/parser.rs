//! Golden cases for the omerta parser.
//!
//! ```text
//! # test: actor_with_role
//! # expect: ok
//! ---
//! transaction T { actor A { role: "pays" } }
//! ---
//! (transaction T (actor A (role "pays")))
//! ===
//! ```
//!
//! Header lines before the first `---` name the case and hold directives:
//! `# expect: ok|error` (default `ok`) and `# skip: reason`. With
//! `expect: error` the last section is a fragment the error message must
//! contain. S-expressions compare with whitespace collapsed, so long
//! expectations may wrap.

use omerta_lang::ast::sexpr::format_schema;
use omerta_lang::parser::parse;

use crate::{TestResult, TestSummary};

#[derive(Debug, Clone)]
pub struct GoldenCase {
    pub name: String,
    /// 1-based line of the `# test:` header.
    pub line: usize,
    pub input: String,
    pub expect: Expectation,
    pub skip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Structure as rendered by `format_schema`.
    Sexpr(String),
    /// Substring of the error message.
    ErrorContaining(String),
}

/// Where the reader is within a case.
enum Section {
    Between,
    Header,
    Input,
    Expected,
}

/// Read every case from a `.test` file.
pub fn parse_golden(content: &str) -> Vec<GoldenCase> {
    let mut cases = Vec::new();
    let mut section = Section::Between;
    let mut current: Option<(GoldenCase, bool)> = None;
    let mut input = Vec::new();
    let mut expected = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        match section {
            Section::Between => {
                if let Some(name) = line.strip_prefix("# test:") {
                    let case = GoldenCase {
                        name: name.trim().to_string(),
                        line: idx + 1,
                        input: String::new(),
                        expect: Expectation::Sexpr(String::new()),
                        skip: None,
                    };
                    current = Some((case, true));
                    section = Section::Header;
                }
            }
            Section::Header => {
                let Some((case, expect_ok)) = current.as_mut() else {
                    section = Section::Between;
                    continue;
                };
                if line == "---" {
                    section = Section::Input;
                } else if let Some(mode) = line.strip_prefix("# expect:") {
                    *expect_ok = mode.trim() == "ok";
                } else if let Some(reason) = line.strip_prefix("# skip:") {
                    case.skip = Some(reason.trim().to_string());
                }
            }
            Section::Input => {
                if line == "---" {
                    section = Section::Expected;
                } else {
                    input.push(raw);
                }
            }
            Section::Expected => {
                if line != "===" {
                    expected.push(raw);
                    continue;
                }
                if let Some((mut case, expect_ok)) = current.take() {
                    case.input = input.join("\n");
                    let text = expected.join("\n").trim().to_string();
                    case.expect = if expect_ok {
                        Expectation::Sexpr(text)
                    } else {
                        Expectation::ErrorContaining(text)
                    };
                    cases.push(case);
                }
                input.clear();
                expected.clear();
                section = Section::Between;
            }
        }
    }
    cases
}

impl GoldenCase {
    pub fn run(&self) -> TestResult {
        if let Some(reason) = &self.skip {
            return TestResult::Skip {
                reason: reason.clone(),
            };
        }

        let outcome = parse(&self.input);
        let pass = match (&outcome, &self.expect) {
            (Ok(schema), Expectation::Sexpr(want)) => {
                collapse(&format_schema(schema)) == collapse(want)
            }
            (Err(e), Expectation::ErrorContaining(fragment)) => {
                e.to_string().contains(fragment.as_str())
            }
            _ => false,
        };
        if pass {
            return TestResult::Pass;
        }

        let expected = match &self.expect {
            Expectation::Sexpr(want) => want.clone(),
            Expectation::ErrorContaining(fragment) => format!("error containing `{fragment}`"),
        };
        let actual = match outcome {
            Ok(schema) => format_schema(&schema),
            Err(e) => format!("error: {e}"),
        };
        TestResult::Fail { expected, actual }
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run cases in file order.
pub fn run_golden(cases: &[GoldenCase]) -> TestSummary {
    cases.iter().fold(TestSummary::new(), |mut summary, case| {
        summary.record(&case.name, case.line, case.run());
        summary
    })
}
