use dsla::error::{CompileError, ErrorKind, LineError};

fn compile_errors(source: &str) -> CompileError {
    dsla::compile(source.lines()).expect_err("source should not compile")
}

#[test]
fn test_every_broken_line_is_reported() {
    let err = compile_errors(include_str!("errors.dsla"));

    assert!(!err.is_fatal());

    let kinds: Vec<_> = err
        .errors()
        .iter()
        .map(|err| (err.line, err.kind.name()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            (2, "DuplicateVariable"),
            (3, "InvalidDeclaration"),
            (5, "UnknownInstruction"),
            (6, "ArityError"),
            (8, "DuplicateLabel"),
            (9, "MalformedOperand"),
            (10, "MalformedOperand"),
        ],
    );

    let message = err.to_string();
    assert_eq!(message.lines().count(), 7);
    assert_eq!(
        message.lines().next(),
        Some("DuplicateVariable 2: already have a variable 'x'"),
    );
}

#[test]
fn test_unknown_instruction_does_not_stop_scan() {
    let err = compile_errors(".text\nfrobnicate a b\nadd x y\nhalt");

    assert_eq!(
        err.errors(),
        &[
            LineError {
                line: 1,
                kind: ErrorKind::UnknownInstruction {
                    mnemonic: "frobnicate".into(),
                    suggestion: None,
                },
            },
            LineError {
                line: 2,
                kind: ErrorKind::Arity {
                    mnemonic: "add".into(),
                    expected: 3,
                    got: 2,
                    missing: Some("parameter 3 (Source)".into()),
                },
            },
        ][..],
    );
}

#[test]
fn test_open_array_before_text() {
    let err = compile_errors(".data\nvar x array = 1 2\n.text\nfrobnicate");

    assert_eq!(
        err,
        CompileError::Fatal(LineError {
            line: 2,
            kind: ErrorKind::IncompleteDeclaration { name: "x".into() },
        }),
    );
}

#[test]
fn test_section_order() {
    let err = compile_errors("var x number = 1\n.data");

    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "SectionOrderError 0: .text or .data must be first in program");
}

#[test]
fn test_undefined_symbols_reported_after_scan() {
    let err = compile_errors(".text\ngoto @nowhere\nmove y x\n@nowhere2\nhalt");

    assert_eq!(
        err.to_string(),
        [
            "UndefinedSymbol 1: cannot find label 'nowhere'",
            "UndefinedSymbol 2: cannot find variable 'x'",
            "UndefinedSymbol 2: cannot find variable 'y'",
        ]
        .join("\n"),
    );
}

#[test]
fn test_duplicates_keep_first_declaration() {
    let err = compile_errors(".text\n@a\nnoop\n@a\nhalt");

    assert_eq!(
        err.errors(),
        &[LineError {
            line: 3,
            kind: ErrorKind::DuplicateLabel("a".into()),
        }][..],
    );
}
