use dsla::{
    emitter::parse_words,
    layout::{Image, PROLOGUE_LEN},
};

fn source_lines() -> Vec<&'static str> {
    include_str!("countdown.dsla").lines().collect()
}

fn assemble_program() -> Image {
    dsla::assemble(source_lines()).expect("could not assemble countdown.dsla")
}

#[test]
fn test_countdown_addresses() {
    let image = assemble_program();

    assert_eq!(image.global_address("n"), Some(3));
    assert_eq!(image.global_address("zero"), Some(4));
    assert_eq!(image.global_address("message"), Some(5));
    assert_eq!(image.data_len(), 7);
    assert_eq!(image.label_address("top"), Some(10));

    let words = image.to_words();
    assert_eq!(&words[5..10], &[100, 111, 110, 101, 0]);
}

#[test]
fn test_countdown_words() {
    let words = assemble_program().to_words();

    // syscall 1 n
    assert_eq!(&words[10..14], &[1, 3, 21, 1]);

    // addi n n -1
    assert_eq!(&words[14..23], &[1, 3, 25, 24, -1, 9, 16, 2, 3]);

    // bgt n zero @top
    assert_eq!(&words[23..32], &[1, 3, 25, 1, 4, 29, 2, 14, 10]);

    // syscall 2 message, halt, implicit halt
    assert_eq!(&words[32..], &[1, 5, 21, 2, 100, 100]);
}

#[test]
fn test_prefixes_agree_with_full_program() {
    let lines = source_lines();
    let full = assemble_program();

    for end in 0..=lines.len() {
        let prefix = dsla::assemble(lines[..end].iter().copied())
            .unwrap_or_else(|err| panic!("prefix of {} lines failed: {}", end, err));

        for (name, address) in prefix.globals() {
            assert_eq!(full.global_address(name), Some(*address), "variable {} in prefix {}", name, end);
        }

        for (name, address) in prefix.labels() {
            assert_eq!(full.label_address(name), Some(*address), "label {} in prefix {}", name, end);
        }
    }
}

#[test]
fn test_single_variable_program() {
    let source = ".data\nvar x number = 0\n.text\nloadi x 5\nhalt";
    let image = dsla::assemble(source.lines()).unwrap();

    assert_eq!(image.global_address("x"), Some(PROLOGUE_LEN as i32));
    assert_eq!(image.code_start(), PROLOGUE_LEN as i32 + 1);

    // prologue, x, loadi, halt and the implicit halt
    assert_eq!(image.len(), PROLOGUE_LEN + 1 + 4 + 1 + 1);

    let text = dsla::compile(source.lines()).unwrap();
    assert_eq!(parse_words(&text).unwrap(), vec![24, 4, 13, 0, 24, 5, 2, 3, 100, 100]);
}

#[test]
fn test_number_then_text_compiles() {
    assert!(dsla::assemble(".data\nvar x number = 5\n.text".lines()).is_ok());
    assert!(dsla::assemble(".data\nvar x number = 5;\n.text".lines()).is_ok());
}

#[test]
fn test_countdown_with_terminal_logger() {
    use slog::{o, Drain, Logger};
    use slog_term::{FullFormat, TermDecorator};

    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let logger = Logger::root(drain, o!("test" => "countdown"));

    let image = dsla::assemble_with_logger(source_lines(), logger).unwrap();

    assert_eq!(image, assemble_program());
}

#[test]
fn test_incremental_feed_agrees_with_full_program() {
    use dsla::{assembler::Assembler, instruction::STANDARD_INSTRUCTIONS, layout::layout};

    let full = assemble_program();
    let mut assembler = Assembler::new(&STANDARD_INSTRUCTIONS);

    for (index, line) in source_lines().into_iter().enumerate() {
        assembler.feed_line(line).unwrap();

        assert_eq!(assembler.line(), index + 1);
        assert!(assembler.errors().is_empty());

        let partial = layout(assembler.program().clone()).unwrap();

        for (name, address) in partial.globals() {
            assert_eq!(full.global_address(name), Some(*address), "variable {} after line {}", name, index);
        }

        for (name, address) in partial.labels() {
            assert_eq!(full.label_address(name), Some(*address), "label {} after line {}", name, index);
        }
    }
}
