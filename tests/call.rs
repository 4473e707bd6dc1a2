use dsla::{layout::Image, opcode::OpCode};

fn assemble_program() -> Image {
    let source = include_str!("call.dsla");

    dsla::assemble(source.lines()).expect("could not assemble call.dsla")
}

#[test]
fn test_call_layout() {
    let image = assemble_program();

    assert_eq!(image.global_address("link"), Some(5));
    assert_eq!(image.code_start(), 7);
    assert_eq!(image.label_address("double"), Some(22));
    assert_eq!(image.len(), 42);
}

#[test]
fn test_return_resumes_after_linking_branch() {
    let image = assemble_program();
    let words = image.to_words();

    // beqal a, b, @double
    let link = 14;
    assert_eq!(OpCode::from_word(words[link]), Some(OpCode::LinkIfBranched));
    assert_eq!(OpCode::from_word(words[link + 1]), Some(OpCode::BranchTo));
    assert_eq!(words[link + 2], 22);

    // return adds three to the link, landing on the syscall
    assert_eq!(&words[33..41], &[1, 5, 25, 24, 3, 9, 16, 13]);
    assert_eq!(&words[link + 3..link + 7], &[1, 6, 21, 1]);
}

#[test]
fn test_forward_and_backward_references() {
    let forward = dsla::assemble(".text\ngoto @end\n@end:\nhalt".lines()).unwrap();
    let backward = dsla::assemble(".text\n@end:\nhalt\ngoto @end".lines()).unwrap();

    assert_eq!(forward.label_address("end"), Some(6));
    assert_eq!(&forward.to_words()[3..6], &[24, 6, 13]);

    assert_eq!(backward.label_address("end"), Some(3));
    assert_eq!(&backward.to_words()[4..7], &[24, 3, 13]);
}
