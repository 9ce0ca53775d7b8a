fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{DateTime, Utc};
    use filedrop_file_ops::FileStatus;
    use filedrop_protocol::{
        ConnectedPayload, ErrorResponse, EventName, PushMessage, UploadProgressPayload,
        UploadResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn fixture_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&fixture_text(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_str(&fixture_text(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  client: {fixture}\n  server: {reserialized}"
        );
    }

    // --- Push channel ---

    #[test]
    fn fixture_upload_progress() {
        roundtrip_test::<UploadProgressPayload>("upload_progress.json");
    }

    #[test]
    fn fixture_connected() {
        roundtrip_test::<ConnectedPayload>("connected.json");
    }

    #[test]
    fn fixture_push_file_upload() {
        roundtrip_test::<PushMessage>("push_file_upload.json");

        let msg: PushMessage = serde_json::from_str(&fixture_text("push_file_upload.json")).unwrap();
        assert_eq!(msg.event, EventName::FileUpload);
        let payload: UploadProgressPayload = msg.parse_payload().unwrap().unwrap();
        assert_eq!(payload.process_already, 8);
        assert_eq!(payload.file_name, "testing.txt");
    }

    #[test]
    fn fixture_push_connected() {
        roundtrip_test::<PushMessage>("push_connected.json");
    }

    #[test]
    fn built_progress_message_matches_fixture() {
        let msg = PushMessage::new(
            EventName::FileUpload,
            Some(&UploadProgressPayload {
                process_already: 8,
                file_name: "testing.txt".into(),
            }),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            load_fixture("push_file_upload.json")
        );
    }

    // --- HTTP bodies ---

    #[test]
    fn fixture_upload_response() {
        roundtrip_test::<UploadResponse>("upload_response.json");
        assert_eq!(
            serde_json::to_value(UploadResponse::success()).unwrap(),
            load_fixture("upload_response.json")
        );
    }

    #[test]
    fn upload_response_exact_bytes() {
        assert_eq!(
            serde_json::to_string(&UploadResponse::success()).unwrap(),
            r#"{"result":"Files uploaded with sucess!"}"#
        );
    }

    #[test]
    fn fixture_error_response() {
        roundtrip_test::<ErrorResponse>("error_response.json");
    }

    #[test]
    fn file_listing_matches_fixture() {
        let listing = vec![FileStatus {
            file: "mockingFile.txt".into(),
            size: "0 B".into(),
            last_modified: DateTime::parse_from_rfc3339("2021-09-06T22:09:02.787Z")
                .unwrap()
                .with_timezone(&Utc),
            owner: "memoria".into(),
        }];

        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            load_fixture("files_status.json")
        );
    }
}
