use rstest::rstest;

use crate::{ParseErrorKind, Parser, SyntaxError, chunk_utils::produce_chunks, parse};

#[rstest]
#[case::escape_before_any_object(b"A\\X:v".as_slice(), SyntaxError::InvalidNameEscape(b'X'), (1, 3))]
#[case::escape_at_line_end(
    b"BEGIN:VCARD\r\nX\\\r\n".as_slice(),
    SyntaxError::InvalidNameEscape(b'\r'),
    (2, 3)
)]
#[case::escape_after_fold(
    b"BEGIN:VCARD\r\nNOTE:a\r\n b\r\nX\\:y\r\n".as_slice(),
    SyntaxError::InvalidNameEscape(b':'),
    (4, 3)
)]
#[case::qp_first_digit(
    b"BEGIN:VCARD\r\nN;QUOTED-PRINTABLE:=G1\r\n".as_slice(),
    SyntaxError::InvalidQuotedPrintableDigit(b'G'),
    (2, 21)
)]
#[case::qp_truncated_escape(
    b"BEGIN:VCARD\r\nN;QUOTED-PRINTABLE:=4\r\n".as_slice(),
    SyntaxError::InvalidQuotedPrintableDigit(b'\r'),
    (2, 22)
)]
#[case::base64_trailer(
    b"BEGIN:VCARD\r\nX;BASE64:\r\nA\\B:v\r\n".as_slice(),
    SyntaxError::InvalidNameEscape(b'B'),
    (3, 4)
)]
fn syntax_errors(
    #[case] input: &[u8],
    #[case] expected: SyntaxError,
    #[case] position: (usize, usize),
    #[values(1, 3, 1000)] parts: usize,
) {
    let mut parser = Parser::default();
    let mut failure = None;
    for chunk in produce_chunks(input, parts) {
        if let Err(err) = parser.feed(chunk) {
            failure = Some(err);
            break;
        }
    }
    let err = failure.expect("input should be rejected");
    assert_eq!(err.kind(), &ParseErrorKind::Syntax(expected));
    assert_eq!((err.line(), err.column()), position);
    assert!(parser.document().is_empty());
    assert_eq!(parser.finish().unwrap_err(), err);
}

#[test_log::test]
fn error_in_nested_object_discards_the_parents() {
    let err = parse(b"BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nA\\B:x\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n")
        .unwrap_err();
    assert_eq!((err.line(), err.column()), (3, 3));
}

#[test_log::test]
fn later_input_is_refused() {
    let mut parser = Parser::default();
    let err = parser.feed(b"BEGIN:VCARD\r\nA\\B:x\r\n").unwrap_err();
    assert_eq!(parser.feed(b"BEGIN:VCARD\r\nFN:ok\r\nEND:VCARD\r\n"), Err(err.clone()));
    assert_eq!(parser.root(), None);
    assert_eq!(parser.finish().unwrap_err(), err);
}

#[test_log::test]
fn error_display_names_the_position() {
    let err = parse(b"BEGIN:VCARD\r\nA\\B:x\r\n").unwrap_err();
    assert_eq!(
        alloc::string::ToString::to_string(&err),
        "syntax error: invalid escape '\\B' in property name at 2:3"
    );
}
