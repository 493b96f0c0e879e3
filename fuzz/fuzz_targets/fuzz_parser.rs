#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vformat::{
    Parser, ParserOptions, WriteError, WriteScope, WriterOptions, chunk_utils::split_at_offsets,
    parse, write_to_vec,
};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    splits: Vec<u16>,
    fold_width: Option<u8>,
    base64_line_width: u8,
    siblings: bool,
    data: &'a [u8],
}

fn run(input: Input<'_>) {
    let splits: Vec<usize> = input.splits.iter().map(|&s| usize::from(s)).collect();
    let mut parser = Parser::new(ParserOptions {
        panic_on_error: false,
    });
    for chunk in split_at_offsets(input.data, &splits) {
        if parser.feed(chunk).is_err() {
            // The stored error comes back from `finish`.
            break;
        }
    }
    let Ok(doc) = parser.finish() else {
        return;
    };

    // A one-shot parse sees the same bytes, so it must agree.
    let whole = parse(input.data).expect("chunked parse succeeded");
    assert_eq!(doc.roots().count(), whole.roots().count());

    let Some(root) = doc.root() else {
        return;
    };
    let options = WriterOptions {
        scope: if input.siblings {
            WriteScope::Siblings
        } else {
            WriteScope::Object
        },
        fold_width: input.fold_width.map(usize::from),
        base64_line_width: usize::from(input.base64_line_width),
        ..WriterOptions::default()
    };
    match write_to_vec(&doc, root, options) {
        // Object kinds decoded from QP or BASE64 may hold line breaks, so
        // the output is re-parsed without insisting that it succeeds.
        Ok(out) => drop(parse(&out)),
        // 8-bit values have no wire form.
        Err(WriteError::UnsupportedEncoding(_)) => {}
        Err(err) => panic!("write failed: {err}"),
    }
}

fuzz_target!(|input: Input<'_>| run(input));
