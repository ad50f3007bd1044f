fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chunkup_protocol::constants::{self, fields};
    use chunkup_protocol::{
        CheckRequest, CheckResponse, MergeRequest, MergeResponse, TaskProgress, TaskStatus,
        WorkerMessage, WorkerRequest,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Server endpoints ---

    #[test]
    fn fixture_check_request() {
        let req: CheckRequest = roundtrip_test("check_request.json");
        assert_eq!(req.file_size, 5_000_000);
    }

    #[test]
    fn fixture_check_response_uploaded() {
        let resp: CheckResponse = roundtrip_test("check_response_uploaded.json");
        assert!(resp.uploaded);
    }

    #[test]
    fn fixture_check_response_missing() {
        let resp: CheckResponse = roundtrip_test("check_response_missing.json");
        assert!(!resp.uploaded);
        assert!(resp.message.is_none());
    }

    #[test]
    fn fixture_merge_request() {
        let req: MergeRequest = roundtrip_test("merge_request.json");
        assert_eq!(req.size, 5_000_000);
    }

    #[test]
    fn fixture_merge_response() {
        let resp: MergeResponse = roundtrip_test("merge_response.json");
        assert_eq!(resp.url.as_deref(), Some("/files/holiday.mp4"));
    }

    #[test]
    fn chunk_form_field_names() {
        assert_eq!(fields::CHUNK, "chunk");
        assert_eq!(
            fields::TEXT_FIELDS,
            ["hash", "fileHash", "fileName", "chunkIndex", "totalChunks"]
        );
        assert_eq!(constants::chunk_id("abc", 12), "abc-12");
    }

    // --- Background task messages ---

    #[test]
    fn fixture_worker_request() {
        let req: WorkerRequest = roundtrip_test("worker_request.json");
        assert_eq!(req.chunk_size, constants::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn fixture_worker_progress() {
        let msg: WorkerMessage = roundtrip_test("worker_progress.json");
        assert!(matches!(msg, WorkerMessage::Progress(p) if p.percent == 67));
    }

    #[test]
    fn fixture_worker_complete() {
        let msg: WorkerMessage = roundtrip_test("worker_complete.json");
        let WorkerMessage::Complete {
            total_size,
            chunk_sizes,
            ..
        } = msg
        else {
            panic!("expected complete message");
        };
        assert_eq!(chunk_sizes.iter().sum::<u64>(), total_size);
    }

    #[test]
    fn fixture_worker_error() {
        let msg: WorkerMessage = roundtrip_test("worker_error.json");
        assert!(matches!(msg, WorkerMessage::Error { .. }));
    }

    // --- Task snapshots ---

    #[test]
    fn fixture_task_progress() {
        let p: TaskProgress = roundtrip_test("task_progress.json");
        assert_eq!(p.status, TaskStatus::Uploading);
    }

    #[test]
    fn fixture_task_progress_failed() {
        let p: TaskProgress = roundtrip_test("task_progress_failed.json");
        assert_eq!(p.status, TaskStatus::Failed);
        assert!(p.file_hash.is_empty());
    }

    #[test]
    fn all_fixtures_are_valid_json() {
        let dir = fixtures_dir();
        let mut count = 0;
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().is_some_and(|e| e == "json") {
                load_fixture(path.file_name().unwrap().to_str().unwrap());
                count += 1;
            }
        }
        assert_eq!(count, 11);
    }
}
