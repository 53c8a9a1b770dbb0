use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use evremixes::app::App;
use evremixes::config::RunConfig;
use evremixes::download::{AudioClient, AudioHttpClient};
use evremixes::error::RemixError;
use evremixes::manifest::{ManifestClient, ManifestHttpClient};
use evremixes::output::JsonOutput;
use evremixes::tagging::{CoverArt, Tagger, TrackTags};

// Bodies served here are placeholders, not real audio.
struct SkipTags;

impl Tagger for SkipTags {
    fn apply(&self, _: &Utf8Path, _: &TrackTags, _: Option<&CoverArt>) -> Result<(), RemixError> {
        Ok(())
    }
}

// The blocking client owns its own runtime, so every call runs off the test's executor.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn scratch() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

#[tokio::test(flavor = "multi_thread")]
async fn streams_body_to_file() {
    let server = MockServer::start().await;
    let body = vec![7u8; 256 * 1024];
    Mock::given(method("GET"))
        .and(path("/bmtl.m4a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let (_temp, root) = scratch();
    let target = root.join("01 - Bring Me To Life.m4a.temp");
    let url = format!("{}/bmtl.m4a", server.uri());
    let written = {
        let target = target.clone();
        blocking(move || AudioHttpClient::new().unwrap().download_to(&url, &target)).await
    }
    .unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(fs::read(target.as_std_path()).unwrap(), body);
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_creates_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.m4a"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_temp, root) = scratch();
    let target = root.join("01 - Missing.m4a.temp");
    let url = format!("{}/missing.m4a", server.uri());
    let result = {
        let target = target.clone();
        blocking(move || AudioHttpClient::new().unwrap().download_to(&url, &target)).await
    };

    assert_matches!(result, Err(RemixError::HttpStatus { status: 404, .. }));
    assert!(!target.as_std_path().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_body_is_network_error_and_keeps_staging_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/haunted.m4a"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "100000")
                .set_body_bytes(vec![1u8; 1000]),
        )
        .mount(&server)
        .await;

    let (_temp, root) = scratch();
    let target = root.join("02 - Haunted.m4a.temp");
    let url = format!("{}/haunted.m4a", server.uri());
    let result = {
        let target = target.clone();
        blocking(move || AudioHttpClient::new().unwrap().download_to(&url, &target)).await
    };

    assert_matches!(result, Err(RemixError::Network(_)));
    assert!(target.as_std_path().is_file());
    assert!(!root.join("02 - Haunted.m4a").as_std_path().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn cover_bytes_are_fetched_whole() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cover.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8; 4096]))
        .mount(&server)
        .await;

    let url = format!("{}/cover.jpg", server.uri());
    let bytes = blocking(move || AudioHttpClient::new().unwrap().fetch_bytes(&url))
        .await
        .unwrap();

    assert_eq!(bytes.len(), 4096);
}

#[tokio::test(flavor = "multi_thread")]
async fn manifest_server_error_is_network_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/evtracks.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}/evtracks.json", server.uri());
    let err = blocking(move || ManifestHttpClient::new(url).unwrap().fetch_manifest())
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert_matches!(err, RemixError::HttpStatus { status: 503, .. });
}

#[tokio::test(flavor = "multi_thread")]
async fn manifest_garbage_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/evtracks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let url = format!("{}/evtracks.json", server.uri());
    let err = blocking(move || ManifestHttpClient::new(url).unwrap().fetch_manifest())
        .await
        .unwrap_err();

    assert_matches!(err, RemixError::ManifestParse(_));
}

#[tokio::test(flavor = "multi_thread")]
async fn full_run_against_server() {
    let server = MockServer::start().await;
    let manifest = format!(
        r#"{{"tracks": [
            {{"track_number": 2, "track_name": "Haunted", "file_url": "{uri}/haunted.flac"}},
            {{"track_number": 1, "track_name": "Bring Me To Life", "file_url": "{uri}/bmtl.m4a"}}
        ]}}"#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/evtracks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bmtl.m4a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bmtl".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/haunted.m4a"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"haunted".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp, root) = scratch();
    let folder = root.join("Evanescence Remixes");
    let mut config = RunConfig::for_folder(folder.clone());
    config.manifest_url = format!("{}/evtracks.json", server.uri());

    let report = blocking(move || {
        let manifest = ManifestHttpClient::new(config.manifest_url.clone()).unwrap();
        let audio = AudioHttpClient::new().unwrap();
        App::new(config, manifest, audio, SkipTags).run(&JsonOutput)
    })
    .await
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(
        fs::read(folder.join("01 - Bring Me To Life.m4a").as_std_path()).unwrap(),
        b"bmtl"
    );
    assert_eq!(
        fs::read(folder.join("02 - Haunted.m4a").as_std_path()).unwrap(),
        b"haunted"
    );
}
