use alloc::vec::Vec;

use bstr::BStr;
use test_log::test;

use super::*;
use crate::{
    error::SyntaxError,
    tree::{Property, PropertyId},
};

fn properties(doc: &Document, object: ObjectId) -> Vec<&Property> {
    doc.object(object)
        .unwrap()
        .properties()
        .iter()
        .map(|&p: &PropertyId| doc.property(p).unwrap())
        .collect()
}

fn strings(property: &Property) -> Vec<Option<&BStr>> {
    property.value().strings().unwrap().iter().collect()
}

fn names(property: &Property) -> Vec<Option<&BStr>> {
    property.name().iter().collect()
}

fn card(body: &str) -> Document {
    let mut input = Vec::new();
    input.extend_from_slice(b"BEGIN:VCARD\r\n");
    input.extend_from_slice(body.as_bytes());
    input.extend_from_slice(b"END:VCARD\r\n");
    parse(&input).unwrap()
}

#[test]
fn dotted_prefix_becomes_the_group() {
    let doc = card("X-PHONE.ENTRY.TEL:555-1234\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].group().unwrap(), "X-PHONE.ENTRY");
    assert_eq!(names(props[0]), [Some(BStr::new("TEL"))]);
    assert_eq!(strings(props[0]), [Some(BStr::new("555-1234"))]);
}

#[test]
fn dots_after_a_qualifier_stay_in_the_name() {
    let doc = card("NOTE;X-V.1:x\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].group(), None);
    assert_eq!(
        names(props[0]),
        [Some(BStr::new("NOTE")), Some(BStr::new("X-V.1"))]
    );
}

#[test]
fn nested_objects() {
    let doc = parse(
        b"BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Meeting\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
    )
    .unwrap();
    let calendar = doc.root().unwrap();
    assert_eq!(doc.roots().count(), 1);
    assert_eq!(doc.object(calendar).unwrap().kind(), "VCALENDAR");

    let props = properties(&doc, calendar);
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].encoding(), Encoding::Object);
    assert_eq!(names(props[0]), [Some(BStr::new("VEVENT"))]);

    let event = props[0].value_object().unwrap();
    assert_eq!(doc.object(event).unwrap().kind(), "VEVENT");
    assert_eq!(doc.object(event).unwrap().parent(), Some(calendar));
    let inner = properties(&doc, event);
    assert_eq!(inner.len(), 1);
    assert_eq!(names(inner[0]), [Some(BStr::new("SUMMARY"))]);
    assert_eq!(strings(inner[0]), [Some(BStr::new("Meeting"))]);
}

#[test]
fn concatenated_objects_become_siblings() {
    let doc = parse(b"BEGIN:VCARD\r\nFN:A\r\nEND:VCARD\r\nBEGIN:VCARD\r\nFN:B\r\nEND:VCARD\r\n").unwrap();
    let roots: Vec<_> = doc.roots().collect();
    assert_eq!(roots.len(), 2);
    assert_eq!(properties(&doc, roots[1])[0].value_string(0).unwrap(), "B");
}

#[test]
fn markers_ignore_case() {
    let doc = parse(b"begin:vcard\r\nfn:a\r\nend:vcard\r\nBEGIN:VCARD\r\nEND:VCARD\r\n").unwrap();
    assert_eq!(doc.object(doc.root().unwrap()).unwrap().kind(), "vcard");
    assert_eq!(doc.roots().count(), 2);
}

#[test]
fn properties_outside_an_object_are_dropped() {
    let doc = parse(b"VERSION:2.1\r\nBEGIN:VCARD\r\nFN:x\r\nEND:VCARD\r\nNOTE:after\r\nEND:VCARD\r\n")
        .unwrap();
    assert_eq!(doc.roots().count(), 1);
    assert_eq!(properties(&doc, doc.root().unwrap()).len(), 1);
}

#[test]
fn value_strings_and_empty_slots() {
    let doc = card("ADR;;HOME:;;Street;City\r\n;X:v\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(
        names(props[0]),
        [Some(BStr::new("ADR")), None, Some(BStr::new("HOME"))]
    );
    assert_eq!(
        strings(props[0]),
        [None, None, Some(BStr::new("Street")), Some(BStr::new("City"))]
    );
    assert_eq!(names(props[1]), [None, Some(BStr::new("X"))]);
}

#[test]
fn empty_value_has_one_absent_string() {
    let doc = card("NOTE:\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(strings(props[0]), [None::<&BStr>]);
}

#[test]
fn escaped_semicolon_in_name() {
    let doc = card("X-A\\;B;WORK:v\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(
        names(props[0]),
        [Some(BStr::new("X-A;B")), Some(BStr::new("WORK"))]
    );
}

#[test]
fn folded_lines_are_joined() {
    let doc = card("NOTE:Hello\r\n World\r\n\tagain\r\nFN:x\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].value_string(0).unwrap(), "HelloWorldagain");
}

#[test]
fn blank_lines_are_ignored() {
    let doc = card("FN:x\r\n\r\n\r\nTEL:1\r\n");
    assert_eq!(properties(&doc, doc.root().unwrap()).len(), 2);
}

#[test]
fn quoted_printable_values() {
    let doc = card("N;ENCODING=QUOTED-PRINTABLE:D=C3=B6e;Jane\r\nNOTE;QUOTED-PRINTABLE:abc=\r\ndef=3B\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].encoding(), Encoding::QuotedPrintable);
    assert_eq!(
        strings(props[0]),
        [Some(BStr::new("D\u{f6}e")), Some(BStr::new("Jane"))]
    );
    assert_eq!(strings(props[1]), [Some(BStr::new("abcdef;"))]);
}

#[test]
fn base64_value_followed_by_blank_line() {
    let doc = card("PHOTO;ENCODING=BASE64:\r\n    TWFu\r\n    TWE=\r\n\r\nTEL:1\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].encoding(), Encoding::Base64);
    assert_eq!(props[0].value_bytes().unwrap(), b"ManMa");
    assert_eq!(props[1].value_string(0).unwrap(), "1");
}

#[test]
fn base64_lines_separated_by_blank_lines() {
    let doc = parse(b"BEGIN:VCARD\r\nPHOTO;BASE64:\r\n TWFu\r\n\r\n TWE=\r\n\r\nTEL:1\r\nEND:VCARD\r\n").unwrap();
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].value_bytes().unwrap(), b"ManMa");
    assert_eq!(names(props[1]), [Some(BStr::new("TEL"))]);
    assert_eq!(props[1].value_string(0).unwrap(), "1");
}

#[test]
fn base64_trailer_is_read_as_the_next_property() {
    let doc = card("PHOTO;BASE64:TWFu\r\nX-Y;WORK:1\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].value_bytes().unwrap(), b"Man");
    assert_eq!(
        names(props[1]),
        [Some(BStr::new("X-Y")), Some(BStr::new("WORK"))]
    );
}

#[test]
fn base64_at_end_of_object() {
    let doc = parse(b"BEGIN:VCARD\r\nKEY;BASE64:TWE\r\nEND:VCARD\r\nBEGIN:VCARD\r\nEND:VCARD\r\n").unwrap();
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].value_bytes().unwrap(), b"Ma");
    assert_eq!(doc.roots().count(), 2);
}

#[test]
fn eight_bit_values_keep_raw_bytes() {
    let doc = card("NOTE;8BIT:a;b\u{e9}\r\n");
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].encoding(), Encoding::EightBit);
    assert_eq!(props[0].value_bytes().unwrap(), "a;b\u{e9}".as_bytes());
}

#[test]
fn finish_commits_the_last_value() {
    let mut parser = Parser::default();
    parser.feed(b"BEGIN:VCARD\r\nFN:Jane").unwrap();
    let doc = parser.finish().unwrap();
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].value_string(0).unwrap(), "Jane");
}

#[test]
fn unmatched_end_is_ignored() {
    let doc = parse(b"END:VCARD\r\nBEGIN:VCARD\r\nEND:VCARD\r\nEND:VCARD\r\n").unwrap();
    assert_eq!(doc.roots().count(), 1);
}

#[test]
fn byte_at_a_time_matches_one_chunk() {
    let input = b"BEGIN:VCARD\r\nA.B.FN:x;y\r\n z\r\nPHOTO;BASE64:\r\n TWFu\r\nN;QUOTED-PRINTABLE:=C3=\r\n=A9\r\nBEGIN:VCARD\r\nEND:VCARD\r\nEND:VCARD\r\n";
    let whole = parse(input).unwrap();

    let mut parser = Parser::default();
    for byte in input {
        parser.feed(core::slice::from_ref(byte)).unwrap();
    }
    let split = parser.finish().unwrap();
    assert!(whole.object_eq(whole.root().unwrap(), &split, split.root().unwrap()));
}

#[test]
fn invalid_name_escape_discards_everything() {
    let mut parser = Parser::default();
    parser
        .feed(b"BEGIN:VCARD\r\nFN:ok\r\nEND:VCARD\r\nBEGIN:VCARD\r\n")
        .unwrap();
    assert!(parser.root().is_some());

    let err = parser.feed(b"FN\\X:y\r\n").unwrap_err();
    assert_eq!(
        err.kind(),
        &ParseErrorKind::Syntax(SyntaxError::InvalidNameEscape(b'X'))
    );
    assert_eq!((err.line(), err.column()), (5, 4));
    assert_eq!(parser.root(), None);
    assert!(parser.document().is_empty());

    assert_eq!(parser.feed(b"END:VCARD\r\n"), Err(err.clone()));
    assert_eq!(parser.finish().unwrap_err(), err);
}

#[test]
fn invalid_quoted_printable_digit() {
    let err = parse(b"BEGIN:VCARD\r\nNOTE;QUOTED-PRINTABLE:=4G\r\n").unwrap_err();
    assert_eq!(
        err.kind(),
        &ParseErrorKind::Syntax(SyntaxError::InvalidQuotedPrintableDigit(b'G'))
    );
    assert_eq!((err.line(), err.column()), (2, 25));
}

#[test]
#[should_panic(expected = "invalid escape")]
fn panic_on_error_stops_at_the_failing_byte() {
    let mut parser = Parser::new(ParserOptions {
        panic_on_error: true,
    });
    let _ = parser.feed(b"BEGIN:VCARD\r\nFN\\X:y\r\n");
}
