use super::*;

#[test]
fn parse_extracts_mime_and_payload() {
    let uri = DataUri::parse("data:video/mp4;base64,aGVsbG8=").unwrap();
    assert_eq!(uri.mime, "video/mp4");
    assert_eq!(uri.data, b"hello");
}

#[test]
fn parse_accepts_comma_bearing_parameters() {
    let uri = DataUri::parse("data:video/webm;codecs=vp8,opus;base64,AAEC").unwrap();
    assert_eq!(uri.mime, "video/webm");
    assert_eq!(uri.data, vec![0u8, 1, 2]);
}

#[test]
fn parse_defaults_empty_media_type() {
    let uri = DataUri::parse("data:;base64,eA==").unwrap();
    assert_eq!(uri.mime, "text/plain");
    assert_eq!(uri.data, b"x");
}

#[test]
fn parse_ignores_whitespace_in_payload() {
    let uri = DataUri::parse("  data:image/jpeg;base64,aGVs\nbG8=\n").unwrap();
    assert_eq!(uri.data, b"hello");
}

#[test]
fn parse_is_case_insensitive_on_scheme_and_marker() {
    assert!(DataUri::parse("DATA:audio/mpeg;base64,AA==").is_ok());

    let uri = DataUri::parse("data:video/mp4;BASE64,aGVsbG8=").unwrap();
    assert_eq!(uri.mime, "video/mp4");
    assert_eq!(uri.data, b"hello");
    let uri = DataUri::parse("data:video/webm;codecs=vp8,opus;Base64,AAEC").unwrap();
    assert_eq!(uri.mime, "video/webm");
    assert_eq!(
        estimated_decoded_len("data:video/mp4;BASE64,aGVsbG8=").unwrap(),
        5
    );
}

#[test]
fn malformed_uris_are_format_errors() {
    for bad in [
        "",
        "hello world",
        "/no/such/file.mp4",
        "data:video/mp4,plain-text-payload",
        "data:video/mp4;base64",
        "data:video/mp4;base64,not base64!!",
        "data:nonsense;base64,AA==",
        "http://example.com/clip.mp4",
    ] {
        let err = DataUri::parse(bad).unwrap_err();
        assert!(err.is_format(), "{bad:?}: {err}");
    }
}

#[test]
fn encode_bytes_produces_data_uri() {
    assert_eq!(
        encode_bytes("audio/mpeg", b"hello"),
        "data:audio/mpeg;base64,aGVsbG8="
    );
}

#[test]
fn file_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<Vec<u8>> = vec![
        vec![0],
        vec![0xff; 3],
        (0u8..=255).collect(),
        b"not really a video".to_vec(),
        (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect(),
    ];

    for (i, bytes) in samples.iter().enumerate() {
        let path = dir.path().join(format!("sample-{i}.mp4"));
        std::fs::write(&path, bytes).unwrap();

        let uri = encode_file(&path).unwrap();
        assert!(uri.starts_with("data:video/mp4;base64,"));

        let tmp = decode_to_tempfile(&uri).unwrap();
        assert_eq!(&std::fs::read(tmp.path()).unwrap(), bytes);
    }
}

#[test]
fn tempfile_suffix_follows_mime_and_is_removed_on_drop() {
    let uri = DataUri::new("video/webm", vec![1, 2, 3]);
    let tmp = uri.to_tempfile().unwrap();
    let path = tmp.path().to_path_buf();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("webm"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

    drop(tmp);
    assert!(!path.exists());
}

#[test]
fn tempfile_in_places_file_under_dir() {
    let dir = tempfile::tempdir().unwrap();
    let tmp = DataUri::new("video/mp4", vec![9])
        .to_tempfile_in(dir.path())
        .unwrap();
    assert_eq!(tmp.path().parent(), Some(dir.path()));
}

#[test]
fn from_file_reports_missing_file_as_io() {
    let err = DataUri::from_file("/definitely/not/here.mov").unwrap_err();
    assert!(err.is_io());
    assert_eq!(err.stage(), Some(Stage::InputDecode));
}

#[test]
fn from_file_infers_mime_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("question.MOV");
    std::fs::write(&path, b"moov").unwrap();
    let uri = DataUri::from_file(&path).unwrap();
    assert_eq!(uri.mime, "video/quicktime");
    assert_eq!(uri.to_uri_string(), "data:video/quicktime;base64,bW9vdg==");
}

#[test]
fn mime_tables_agree_for_pipeline_outputs() {
    assert_eq!(mime_for_path(Path::new("audio.mp3")), AUDIO_MIME);
    assert_eq!(mime_for_path(Path::new("frame-0001.jpg")), IMAGE_MIME);
    assert_eq!(mime_for_path(Path::new("blob")), "application/octet-stream");
    assert_eq!(extension_for_mime(AUDIO_MIME), "mp3");
    assert_eq!(extension_for_mime("application/x-unknown"), "bin");
}

#[test]
fn estimated_len_matches_decoded_len() {
    let uri = encode_bytes("video/mp4", &[7u8; 100]);
    assert_eq!(estimated_decoded_len(&uri).unwrap(), 100);
    assert_eq!(
        estimated_decoded_len("data:video/mp4;base64,AAEC").unwrap(),
        3
    );
    assert!(estimated_decoded_len("no scheme").unwrap_err().is_format());
}
