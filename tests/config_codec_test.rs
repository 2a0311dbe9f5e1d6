//! `.cfg` annotation format tests

use idis::{AnnotationStore, ConfigCodec, DisasmError};

#[test]
fn test_malformed_label_line_is_reported_and_skipped() {
    let text = "offset\n0000\t0\nlabel\n0010\tLOOP\nZZZZ\tFoo\n0020\tDONE\n";
    let (data, errors) = ConfigCodec::decode(text, "prog.bin.cfg");

    assert_eq!(errors.len(), 1);
    match &errors[0] {
        DisasmError::ConfigParse { file, line, text } => {
            assert_eq!(file, "prog.bin.cfg");
            assert_eq!(*line, 5);
            assert!(text.contains("ZZZZ"));
        }
        other => panic!("expected config parse error, got {:?}", other),
    }

    assert_eq!(data.annotations.label(0x0010), Some("LOOP"));
    assert_eq!(data.annotations.label(0x0020), Some("DONE"));
    assert_eq!(data.origin, Some(0x0000));
}

#[test]
fn test_error_message_names_file_and_line() {
    let (_, errors) = ConfigCodec::decode("comment\nnot an entry\n", "a.cfg");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("config error file:a.cfg line:2"));
}

#[test]
fn test_sections_can_repeat_and_interleave() {
    let text = "label\n0000\tA\ndb\n0004\t2\nlabel\n0008\tB\n";
    let (data, errors) = ConfigCodec::decode(text, "x.cfg");

    assert!(errors.is_empty());
    assert_eq!(data.annotations.label(0x0000), Some("A"));
    assert_eq!(data.annotations.label(0x0008), Some("B"));
    assert_eq!(data.annotations.db(0x0004), Some(2));
    assert_eq!(data.origin, None);
}

#[test]
fn test_wide_origin_round_trips() {
    let annotations = AnnotationStore::new();
    let text = ConfigCodec::encode(0x1_2000, &annotations);
    let (data, errors) = ConfigCodec::decode(&text, "x.cfg");

    assert!(errors.is_empty());
    assert_eq!(data.origin, Some(0x1_2000));
}

#[test]
fn test_full_round_trip() {
    let mut annotations = AnnotationStore::new();
    annotations.set_dw(0x8000, 1);
    annotations.set_dw(0x8002, 8);
    annotations.set_db(0x8100, 16);
    annotations.set_label(0x8000, "VECTOR");
    annotations.set_label(0x8200, "MAIN");
    annotations.set_comment(0x8100, "message text");

    let text = ConfigCodec::encode(0x8000, &annotations);
    let (data, errors) = ConfigCodec::decode(&text, "x.cfg");

    assert!(errors.is_empty());
    assert_eq!(data.origin, Some(0x8000));
    assert_eq!(data.annotations, annotations);
}
