use alloc::vec::Vec;

use bstr::{BStr, ByteSlice};
use rstest::rstest;

use super::{properties, same_documents};
use crate::{
    DateTime, Document, Encoding, ObjectId, Parser, Period, PropertyId, PropertyQuery, Value,
    WriterOptions, chunk_utils::produce_chunks, parse, write_to_vec,
};

// Leading whitespace after a `\` line continuation is dropped from the
// literal, so indented lines start with `\x20`.
const ADDRESS_BOOK: &[u8] = b"BEGIN:VCARD\r\n\
VERSION:2.1\r\n\
N:Doe;Jane;;Dr.;\r\n\
FN:Jane Doe\r\n\
TEL;WORK;VOICE:+1-555-0100\r\n\
TEL;HOME;VOICE:+1-555-0199\r\n\
ADR;WORK;ENCODING=QUOTED-PRINTABLE:;;12 Main St.=0D=0A=\r\n\
Suite 4;Springfield;;12345;USA\r\n\
item1.EMAIL;INTERNET;PREF:jane@example.com\r\n\
PHOTO;ENCODING=BASE64;TYPE=GIF:\r\n\
\x20   TWFuIGlzIGRp\r\n\
\x20   c3Rpbmd1aXNoZWQ=\r\n\
\r\n\
NOTE;CHARSET=UTF-8:This note is folded\r\n\
\x20 across two lines\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:2.1\r\n\
FN:John Roe\r\n\
END:VCARD\r\n";

const CALENDAR: &[u8] = b"BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Design review\r\n\
DTSTART:20240229T093000Z\r\n\
DURATION:PT1H30M\r\n\
BEGIN:VALARM\r\n\
TRIGGER:P0D\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
BEGIN:VTODO\r\n\
SUMMARY:Send minutes\r\n\
DUE:20240301\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

fn find(doc: &Document, object: ObjectId, name: &str) -> PropertyId {
    doc.find_property(object, PropertyQuery::new(name)).unwrap()
}

fn strings<'a>(doc: &'a Document, property: PropertyId) -> Vec<Option<&'a BStr>> {
    doc.property(property)
        .unwrap()
        .value()
        .strings()
        .unwrap()
        .iter()
        .collect()
}

#[test_log::test]
fn address_book() {
    let doc = parse(ADDRESS_BOOK).unwrap();
    let cards: Vec<ObjectId> = doc.roots().collect();
    assert_eq!(cards.len(), 2);
    let jane = cards[0];

    let n = find(&doc, jane, "N");
    assert_eq!(
        strings(&doc, n),
        [
            Some(BStr::new("Doe")),
            Some(BStr::new("Jane")),
            None,
            Some(BStr::new("Dr.")),
            None
        ]
    );

    let tels: Vec<PropertyId> = doc.find_properties(jane, PropertyQuery::new("tel")).collect();
    assert_eq!(tels.len(), 2);
    let home = doc
        .find_property(jane, PropertyQuery::new("TEL").qualifiers(&["home"]))
        .unwrap();
    assert_eq!(home, tels[1]);
    assert_eq!(doc.property(home).unwrap().qualifier_choice(&["WORK", "HOME"]), Some((1, 1)));

    let adr = doc.property(find(&doc, jane, "ADR")).unwrap();
    assert_eq!(adr.encoding(), Encoding::QuotedPrintable);
    assert_eq!(adr.value_string(2).unwrap(), "12 Main St.\r\nSuite 4");
    assert_eq!(adr.value_string(3).unwrap(), "Springfield");
    assert_eq!(adr.value_string(6).unwrap(), "USA");
    assert_eq!(adr.qualifier_value("encoding").unwrap(), "QUOTED-PRINTABLE");

    let email = doc
        .find_property(jane, PropertyQuery::new(crate::ANY).group("ITEM1"))
        .unwrap();
    assert_eq!(doc.property_name(email).unwrap(), "item1.EMAIL;INTERNET;PREF");

    let photo = doc.property(find(&doc, jane, "PHOTO")).unwrap();
    assert_eq!(photo.value_bytes().unwrap().as_bstr(), "Man is distinguished");
    assert_eq!(photo.qualifier_value("TYPE").unwrap(), "GIF");

    let note = doc.property(find(&doc, jane, "NOTE")).unwrap();
    assert_eq!(note.value_string(0).unwrap(), "This note is folded across two lines");
    assert_eq!(note.charset().unwrap(), "UTF-8");

    let john = doc.next_object(jane).unwrap();
    assert_eq!(
        doc.property(find(&doc, john, "fn")).unwrap().value_string(0).unwrap(),
        "John Roe"
    );
    assert_eq!(doc.next_object(john), None);
}

#[test_log::test]
fn calendar_with_nested_components() {
    let doc = parse(CALENDAR).unwrap();
    let calendar = doc.root().unwrap();
    let props = properties(&doc, calendar);
    assert_eq!(props.len(), 3);
    assert_eq!(props[1].encoding(), Encoding::Object);

    let event = props[1].value_object().unwrap();
    assert_eq!(doc.object(event).unwrap().kind(), "VEVENT");
    assert_eq!(doc.object(event).unwrap().parent(), Some(calendar));

    let start = find(&doc, event, "DTSTART");
    assert_eq!(
        doc.value_date_time(start, 0),
        Some(DateTime::date(2024, 2, 29).unwrap().at(9, 30, 0, true).unwrap())
    );
    let duration = find(&doc, event, "duration");
    assert_eq!(
        doc.value_period(duration, 0),
        Some(Period {
            hours: 1,
            minutes: 30,
            ..Period::default()
        })
    );

    let alarm = doc.property(find(&doc, event, "VALARM")).unwrap();
    let alarm = alarm.value_object().unwrap();
    assert_eq!(doc.value_period(find(&doc, alarm, "TRIGGER"), 0), Some(Period::default()));
    assert!(doc.property_belongs_to(find(&doc, alarm, "TRIGGER"), calendar));

    let todo = props[2].value_object().unwrap();
    assert_eq!(
        doc.value_date_time(find(&doc, todo, "DUE"), 0),
        Some(DateTime::date(2024, 3, 1).unwrap())
    );
}

#[test_log::test]
fn calendar_writes_back_unchanged() {
    let doc = parse(CALENDAR).unwrap();
    let out = write_to_vec(&doc, doc.root().unwrap(), WriterOptions::default()).unwrap();
    assert_eq!(out.as_bstr(), CALENDAR.as_bstr());
}

#[rstest]
#[case::address_book(ADDRESS_BOOK)]
#[case::calendar(CALENDAR)]
fn chunk_count_does_not_matter(#[case] input: &[u8], #[values(1, 2, 3, 7, 64, 1000)] parts: usize) {
    let whole = parse(input).unwrap();
    let mut parser = Parser::default();
    for chunk in produce_chunks(input, parts) {
        parser.feed(chunk).unwrap();
    }
    let split = parser.finish().unwrap();
    assert!(same_documents(&whole, &split));
}

#[rstest]
#[case::crlf(b"BEGIN:VCARD\r\nFN:Ann\r\nEND:VCARD\r\n".as_slice())]
#[case::lf_only(b"BEGIN:VCARD\nFN:Ann\nEND:VCARD\n".as_slice())]
#[case::cr_only(b"BEGIN:VCARD\rFN:Ann\rEND:VCARD\r".as_slice())]
#[case::lowercase(b"begin:VCARD\r\nFN:Ann\r\nend:VCARD\r\n".as_slice())]
#[case::no_final_newline(b"BEGIN:VCARD\r\nFN:Ann\r\nEND:VCARD".as_slice())]
#[case::leading_garbage(b"X-JUNK:before\r\n\r\nBEGIN:VCARD\r\nFN:Ann\r\nEND:VCARD\r\n".as_slice())]
#[case::tab_fold(b"BEGIN:VCARD\r\nFN:A\r\n\tnn\r\nEND:VCARD\r\n".as_slice())]
fn line_end_variants(#[case] input: &[u8]) {
    let doc = parse(input).unwrap();
    assert_eq!(doc.roots().count(), 1);
    let card = doc.root().unwrap();
    let props = properties(&doc, card);
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].name_string(0).unwrap(), "FN");
    assert_eq!(props[0].value(), &Value::Text(["Ann"].into_iter().collect()));
}

#[rstest]
#[case::text(b"X:a;b".as_slice(), Encoding::SevenBit)]
#[case::quoted_printable(b"X;QUOTED-PRINTABLE:a".as_slice(), Encoding::QuotedPrintable)]
#[case::encoding_qualifier(b"X;ENCODING=quoted-printable:a".as_slice(), Encoding::QuotedPrintable)]
#[case::base64(b"X;BASE64:YQ==".as_slice(), Encoding::Base64)]
#[case::eight_bit(b"X;8bit:a".as_slice(), Encoding::EightBit)]
fn encoding_is_deduced_from_the_name(#[case] line: &[u8], #[case] expected: Encoding) {
    let mut input = Vec::from(b"BEGIN:VCARD\r\n".as_slice());
    input.extend_from_slice(line);
    input.extend_from_slice(b"\r\nEND:VCARD\r\n");
    let doc = parse(&input).unwrap();
    let props = properties(&doc, doc.root().unwrap());
    assert_eq!(props[0].encoding(), expected);
}
