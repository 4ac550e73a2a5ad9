mod common;

use httpmock::prelude::*;
use reel_relay::adapters::HttpSession;
use reel_relay::config::relay_config::ApiConfig;
use reel_relay::domain::model::{Credentials, DownloadOutcome, LinkList, LoginOutcome};
use reel_relay::domain::ports::{Authenticator, MediaFetcher, Publisher};
use reel_relay::{ChallengeHandler, DownloadAgent, RelayError};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn session_for(server: &MockServer) -> HttpSession {
    let config = ApiConfig {
        base_url: server.base_url(),
        ..ApiConfig::default()
    };
    HttpSession::new(&config).unwrap()
}

fn creds() -> Credentials {
    Credentials::new("source_account", "source_pass")
}

fn mock_login<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    let token = token.to_string();
    server.mock(move |when, then| {
        when.method(POST)
            .path("/accounts/login")
            .json_body(json!({"username": "source_account", "password": "source_pass"}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"status": "ok", "session_id": token}));
    })
}

#[tokio::test]
async fn test_login_then_resolve_and_download() {
    let server = MockServer::start();
    let login_mock = mock_login(&server, "tok-1");
    let media_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/media/C3xYz12")
            .header("Authorization", "Bearer tok-1");
        then.status(200).json_body(json!({
            "shortcode": "C3xYz12",
            "caption": "original caption",
            "resources": [
                {"url": "/files/C3xYz12.mp4", "kind": "video"},
                {"url": "/files/cover", "kind": "image"}
            ]
        }));
    });
    let video_mock = server.mock(|when, then| {
        when.method(GET).path("/files/C3xYz12.mp4");
        then.status(200).body("fake video bytes");
    });
    let cover_mock = server.mock(|when, then| {
        when.method(GET).path("/files/cover");
        then.status(200).body("fake jpeg bytes");
    });

    let session = session_for(&server);
    assert_eq!(session.login(&creds()).await.unwrap(), LoginOutcome::LoggedIn);
    assert!(session.is_logged_in());

    let post = session.resolve("C3xYz12").await.unwrap();
    assert_eq!(post.resources.len(), 2);

    let temp_dir = TempDir::new().unwrap();
    session.download(&post, temp_dir.path()).await.unwrap();

    login_mock.assert();
    media_mock.assert();
    video_mock.assert();
    cover_mock.assert();
    assert_eq!(
        std::fs::read(temp_dir.path().join("C3xYz12_1.mp4")).unwrap(),
        b"fake video bytes"
    );
    assert!(temp_dir.path().join("C3xYz12_2.jpg").exists());
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("C3xYz12.txt")).unwrap(),
        "original caption"
    );
}

#[tokio::test]
async fn test_challenge_flow() {
    let server = MockServer::start();
    let login_mock = server.mock(|when, then| {
        when.method(POST).path("/accounts/login");
        then.status(400).json_body(json!({
            "status": "fail",
            "message": "challenge_required",
            "challenge_id": "ch-42"
        }));
    });
    let challenge_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/challenge/ch-42")
            .json_body(json!({"code": "123456"}));
        then.status(200)
            .json_body(json!({"status": "ok", "session_id": "tok-after-challenge"}));
    });

    let session = session_for(&server);
    assert_eq!(
        session.login(&creds()).await.unwrap(),
        LoginOutcome::ChallengeRequired
    );
    assert!(!session.is_logged_in());

    session.submit_challenge_code("123456").await.unwrap();

    login_mock.assert();
    challenge_mock.assert();
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn test_bad_credentials() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/accounts/login");
        then.status(400).json_body(json!({
            "status": "fail",
            "message": "The password you entered is incorrect."
        }));
    });

    let session = session_for(&server);
    let result = session.login(&creds()).await;
    assert!(matches!(result, Err(RelayError::AuthenticationFailed { .. })));
}

#[tokio::test]
async fn test_rate_limit_and_expiry_are_classified() {
    let server = MockServer::start();
    mock_login(&server, "tok-1");
    server.mock(|when, then| {
        when.method(GET).path("/media/SLOW");
        then.status(429).json_body(json!({
            "status": "fail",
            "message": "Please wait a few minutes before you try again."
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/media/GONE");
        then.status(403)
            .json_body(json!({"status": "fail", "message": "login_required"}));
    });

    let session = session_for(&server);
    session.login(&creds()).await.unwrap();

    assert!(matches!(
        session.resolve("SLOW").await,
        Err(RelayError::RateLimited { .. })
    ));
    assert!(matches!(
        session.resolve("GONE").await,
        Err(RelayError::SessionExpired { .. })
    ));
}

#[tokio::test]
async fn test_requests_before_login_fail_without_network() {
    let server = MockServer::start();
    let media_mock = server.mock(|when, then| {
        when.method(GET).path("/media/ANY");
        then.status(200).json_body(json!({"shortcode": "ANY"}));
    });

    let session = session_for(&server);
    assert!(matches!(
        session.resolve("ANY").await,
        Err(RelayError::SessionExpired { .. })
    ));
    media_mock.assert_hits(0);
}

#[tokio::test]
async fn test_upload_clip_sends_caption_and_file() {
    let server = MockServer::start();
    mock_login(&server, "tok-up");
    let upload_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/clips/upload")
            .header("Authorization", "Bearer tok-up")
            .body_contains("Shared caption #reels")
            .body_contains("clip payload");
        then.status(200)
            .json_body(json!({"status": "ok", "media_id": "3141592653"}));
    });

    let temp_dir = TempDir::new().unwrap();
    let video = temp_dir.path().join("1.mp4");
    std::fs::write(&video, "clip payload").unwrap();

    let session = session_for(&server);
    session.login(&creds()).await.unwrap();
    let media_id = session
        .upload_clip(&video, "Shared caption #reels")
        .await
        .unwrap();

    upload_mock.assert();
    assert_eq!(media_id, "3141592653");
}

#[tokio::test]
async fn test_download_agent_over_http() {
    let server = MockServer::start();
    mock_login(&server, "tok-1");
    server.mock(|when, then| {
        when.method(GET).path("/media/AAA111");
        then.status(200).json_body(json!({
            "shortcode": "AAA111",
            "resources": [{"url": "/files/AAA111.mp4", "kind": "video"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/files/AAA111.mp4");
        then.status(200).body("reel one");
    });
    server.mock(|when, then| {
        when.method(GET).path("/media/BBB222");
        then.status(429).body("rate limited");
    });

    let temp_dir = TempDir::new().unwrap();
    let config = common::test_config(temp_dir.path());
    let agent = DownloadAgent::new(
        session_for(&server),
        config.download.clone(),
        Arc::new(common::RecordingPacer::default()),
        ChallengeHandler::new(common::ScriptedPrompt::new(&[]), 1, None),
    );
    let links = LinkList::new(vec![
        "https://www.instagram.com/reel/AAA111/".to_string(),
        "https://www.instagram.com/reel/BBB222/".to_string(),
    ]);

    let report = agent.run(&links).await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(
        report.items[0].1,
        DownloadOutcome::Saved(config.download.output_dir.join("1.mp4"))
    );
    assert_eq!(
        std::fs::read(config.download.output_dir.join("1.mp4")).unwrap(),
        b"reel one"
    );
    assert!(!config.download.temp_dir.exists());
}
