//! End-to-end command tests against a temporary protocol tree.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use omerta_cli::{Cli, run};
use rstest::rstest;
use tempfile::TempDir;

const ESCROW: &str = r#"transaction EscrowLock "Lock funds until delivery" {
    actor Buyer { role: "pays" }
    actor Seller {}
    message Offer Buyer -> Seller { amount: uint }
    function release(amount: uint) -> bool {}
    entry block Start {
        send Offer
        goto Settle when amount > 0
    }
    block Settle {
        call release(amount)
    }
}
"#;

const BROKEN: &str = "transaction Broken { actor A {} }\n";

const TYPO: &str = r#"transaction Typo {
    actor Buyer {}
    message Offer Buyer -> Buyer {}
    entry block Start { send Ofer }
}
"#;

const UNSENT: &str = r#"transaction Unsent {
    actor Buyer {}
    message Offer Buyer -> Buyer {}
    message Refund Buyer -> Buyer {}
    entry block Start { send Offer }
}
"#;

struct Run {
    code: u8,
    out: String,
    err: String,
}

fn omerta<S: AsRef<str>>(args: &[S]) -> Run {
    let argv = std::iter::once("omerta").chain(args.iter().map(AsRef::as_ref));
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = run(cli, &mut out, &mut err).expect("command runs");
    Run {
        code,
        out: String::from_utf8(out).expect("utf8 stdout"),
        err: String::from_utf8(err).expect("utf8 stderr"),
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// `<root>/protocol/transactions/<name>/transaction.omt` for each entry,
/// plus a `graphs` directory that must be ignored.
fn protocol_tree(transactions: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let root = TempDir::new().expect("tempdir");
    let protocol = root.path().join("protocol");
    let txs = protocol.join("transactions");
    fs::create_dir_all(txs.join("graphs")).expect("graphs dir");
    fs::write(txs.join("graphs").join("transaction.omt"), BROKEN).expect("decoy");
    for (name, source) in transactions {
        let dir = txs.join(name);
        fs::create_dir_all(&dir).expect("tx dir");
        fs::write(dir.join("transaction.omt"), source).expect("tx file");
    }
    (root, protocol)
}

#[test]
fn generate_both_artifacts_into_output_dir() {
    let (root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW)]);
    let tx_dir = protocol.join("transactions").join("00_escrow_lock");
    let out_dir = root.path().join("out");

    let result = omerta(&[
        "generate".to_string(),
        path_arg(&tx_dir),
        "--markdown".to_string(),
        "--python".to_string(),
        "--output-dir".to_string(),
        path_arg(&out_dir),
    ]);

    assert_eq!(result.code, 0, "{}", result.err);
    let markdown = out_dir.join("00_escrow_lock.md");
    let python = out_dir.join("escrow_lock_generated.py");
    assert_eq!(
        result.out,
        format!(
            "Generated: {}\nGenerated: {}\n",
            markdown.display(),
            python.display()
        )
    );
    let doc = fs::read_to_string(&markdown).expect("markdown written");
    assert!(doc.starts_with("# EscrowLock"), "{doc}");
    let code = fs::read_to_string(&python).expect("python written");
    assert!(code.contains("class Offer"), "{code}");
}

#[test]
fn generate_markdown_defaults_next_to_transactions() {
    let (_root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW)]);
    let tx_dir = protocol.join("transactions").join("00_escrow_lock");

    let result = omerta(&["generate".to_string(), path_arg(&tx_dir), "--markdown".to_string()]);

    assert_eq!(result.code, 0, "{}", result.err);
    assert!(protocol.join("transactions").join("00_escrow_lock.md").is_file());
}

#[test]
fn generate_missing_directory() {
    let root = TempDir::new().expect("tempdir");
    let missing = root.path().join("nope");
    let result = omerta(&["generate".to_string(), path_arg(&missing), "--python".to_string()]);
    assert_eq!(result.code, 1);
    assert_eq!(
        result.err,
        format!("Error: Directory not found: {}\n", missing.display())
    );
}

#[test]
fn generate_needs_an_artifact_flag() {
    let (_root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW)]);
    let tx_dir = protocol.join("transactions").join("00_escrow_lock");
    let result = omerta(&["generate".to_string(), path_arg(&tx_dir)]);
    assert_eq!(result.code, 1);
    assert_eq!(result.out, "Specify --markdown and/or --python to generate output\n");
}

#[test]
fn generate_refuses_invalid_transaction() {
    let (root, protocol) = protocol_tree(&[("01_broken", BROKEN)]);
    let tx_dir = protocol.join("transactions").join("01_broken");
    let out_dir = root.path().join("out");
    let result = omerta(&[
        "generate".to_string(),
        path_arg(&tx_dir),
        "--python".to_string(),
        "--output-dir".to_string(),
        path_arg(&out_dir),
    ]);
    assert_eq!(result.code, 1);
    assert!(result.err.starts_with("Error: "), "{}", result.err);
    assert!(result.err.contains("validation error"), "{}", result.err);
    assert!(!out_dir.join("broken_generated.py").exists());
}

#[test]
fn regenerate_reports_each_transaction() {
    let (root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW), ("01_broken", BROKEN)]);
    let python_out = root.path().join("sim");

    let result = omerta(&[
        "regenerate".to_string(),
        "--protocol-dir".to_string(),
        path_arg(&protocol),
        "--python-output".to_string(),
        path_arg(&python_out),
    ]);

    assert_eq!(result.code, 1);
    assert_eq!(
        result.out,
        "Found 2 transaction(s)\n\n\
         Processing: 00_escrow_lock\n\n\
         Processing: 01_broken\n\n\
         Done: 1 succeeded, 1 failed\n"
    );
    assert!(result.err.contains("  Error generating markdown: "), "{}", result.err);
    assert!(result.err.contains("  Error generating Python: "), "{}", result.err);
    assert!(python_out.join("escrow_lock_generated.py").is_file());
    assert!(protocol.join("transactions").join("00_escrow_lock.md").is_file());
    assert!(!python_out.join("broken_generated.py").exists());
}

#[test]
fn regenerate_verbose_single_transaction() {
    let (root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW), ("01_broken", BROKEN)]);
    let python_out = root.path().join("sim");

    let result = omerta(&[
        "regenerate".to_string(),
        "-v".to_string(),
        "-t".to_string(),
        "00_escrow_lock".to_string(),
        "--python-only".to_string(),
        "--protocol-dir".to_string(),
        path_arg(&protocol),
        "--python-output".to_string(),
        path_arg(&python_out),
    ]);

    assert_eq!(result.code, 0, "{}", result.err);
    let generated = python_out.join("escrow_lock_generated.py");
    assert_eq!(
        result.out,
        format!(
            "Found 1 transaction(s)\n\nProcessing: 00_escrow_lock\n  Generated: {}\n\nDone: 1 succeeded, 0 failed\n",
            generated.display()
        )
    );
    assert!(!protocol.join("transactions").join("00_escrow_lock.md").exists());
}

#[rstest]
#[case::unknown_transaction(&[("00_escrow_lock", ESCROW)], Some("99_missing"), "Transaction not found: 99_missing\n")]
#[case::empty_tree(&[], None, "No transaction directories found in ")]
fn regenerate_failures(
    #[case] transactions: &[(&str, &str)],
    #[case] only: Option<&str>,
    #[case] expected_err: &str,
) {
    let (_root, protocol) = protocol_tree(transactions);
    let mut args = vec![
        "regenerate".to_string(),
        "--protocol-dir".to_string(),
        path_arg(&protocol),
    ];
    if let Some(name) = only {
        args.extend(["--transaction".to_string(), name.to_string()]);
    }
    let result = omerta(args.as_slice());
    assert_eq!(result.code, 1);
    assert!(result.out.is_empty(), "{}", result.out);
    assert!(result.err.starts_with(expected_err), "{}", result.err);
}

#[test]
fn lint_all_skips_graphs_and_summarizes() {
    let (_root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW), ("02_typo", TYPO)]);
    let result = omerta(&[
        "lint".to_string(),
        "--all".to_string(),
        "--protocol-dir".to_string(),
        path_arg(&protocol),
    ]);

    assert_eq!(result.code, 1);
    let typo = protocol.join("transactions").join("02_typo").join("transaction.omt");
    let expected = format!(
        "{path}:3:13: warning[W011]: message `Offer` is never sent\n\
         {path}:4:30: error[E002]: unknown message `Ofer` (did you mean `Offer`?) [fixable]\n\
         \n1 error(s), 1 warning(s)\n\
         \n1 issue(s) can be auto-fixed. Run with --fix to apply.\n",
        path = typo.display()
    );
    assert_eq!(result.out, expected);
}

#[test]
fn lint_single_file_fix_cycle() {
    let (_root, protocol) = protocol_tree(&[("02_typo", TYPO)]);
    let file = protocol.join("transactions").join("02_typo").join("transaction.omt");

    let report = omerta(&["lint".to_string(), path_arg(&file)]);
    assert_eq!(report.code, 1);
    assert!(
        report
            .out
            .ends_with(&format!("Run:\n  omerta lint --fix {}\n", file.display())),
        "{}",
        report.out
    );

    let fixed = omerta(&["lint".to_string(), "--fix".to_string(), path_arg(&file)]);
    assert_eq!(fixed.code, 0, "{}", fixed.out);
    assert_eq!(fixed.out, format!("Fixed 1 issue(s) in {}\n", file.display()));
    assert!(
        fs::read_to_string(&file)
            .expect("read back")
            .contains("send Offer }")
    );
}

#[test]
fn lint_clean_file_prints_nothing() {
    let (_root, protocol) = protocol_tree(&[("00_escrow_lock", ESCROW)]);
    let file = protocol.join("transactions").join("00_escrow_lock").join("transaction.omt");
    let result = omerta(&["lint".to_string(), path_arg(&file)]);
    assert_eq!(result.code, 0);
    assert_eq!(result.out, "");
}

#[test]
fn lint_warnings_alone_exit_zero() {
    let (_root, protocol) = protocol_tree(&[("03_unsent", UNSENT)]);
    let file = protocol.join("transactions").join("03_unsent").join("transaction.omt");
    let result = omerta(&["lint".to_string(), path_arg(&file)]);
    assert_eq!(result.code, 0, "{}", result.out);
    assert_eq!(
        result.out,
        format!(
            "{}:4:13: warning[W011]: message `Refund` is never sent\n\n0 error(s), 1 warning(s)\n",
            file.display()
        )
    );
}

#[test]
fn lint_all_with_nothing_found() {
    let (_root, protocol) = protocol_tree(&[]);
    let result = omerta(&[
        "lint".to_string(),
        "--all".to_string(),
        "--protocol-dir".to_string(),
        path_arg(&protocol),
    ]);
    assert_eq!(result.code, 1);
    assert_eq!(result.out, "No transaction files found\n");
}

#[test]
fn lint_json_report() {
    let (_root, protocol) = protocol_tree(&[("02_typo", TYPO)]);
    let file = protocol.join("transactions").join("02_typo").join("transaction.omt");
    let result = omerta(&[
        "lint".to_string(),
        "--format".to_string(),
        "json".to_string(),
        path_arg(&file),
    ]);
    assert_eq!(result.code, 1);
    let report: serde_json::Value = serde_json::from_str(&result.out).expect("json output");
    let outcome = &report["outcomes"][0];
    assert_eq!(outcome["fixable"], 1);
    assert_eq!(outcome["diagnostics"].as_array().map(Vec::len), Some(2));
    assert_eq!(outcome["diagnostics"][1]["suggestion"], "Offer");
}

#[test]
fn lint_pretty_shows_source() {
    let (_root, protocol) = protocol_tree(&[("02_typo", TYPO)]);
    let file = protocol.join("transactions").join("02_typo").join("transaction.omt");
    let result = omerta(&["lint".to_string(), "--pretty".to_string(), path_arg(&file)]);
    assert_eq!(result.code, 1);
    assert!(result.out.contains("entry block Start { send Ofer }"), "{}", result.out);
    assert!(result.out.contains("1 error(s), 1 warning(s)"), "{}", result.out);
}
