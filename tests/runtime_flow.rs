use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use scheduleBot::cli::Cli;
use scheduleBot::runtime;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("scheduleBot_{}_{}", uuid::Uuid::new_v4(), name));
    fs::write(&path, content).unwrap();
    path
}

fn standup_page() -> serde_json::Value {
    json!({
        "id": "p1",
        "properties": {
            "名前": { "type": "title", "title": [ { "text": { "content": "Standup" } } ] },
            "日付": { "type": "date", "date": { "start": "2025-01-16T10:00:00.000+09:00", "end": null } },
            "開催場所": { "type": "rich_text", "rich_text": [ { "plain_text": "Room A" } ] },
            "ロール": { "type": "rich_text", "rich_text": [ { "plain_text": "eng" } ] }
        }
    })
}

fn write_config(server: &MockServer, projects: serde_json::Value) -> (PathBuf, PathBuf) {
    let projects_path = temp_file("projects.json", &projects.to_string());
    let settings = format!(
        "# test settings\nTIMEZONE=Asia/Tokyo\nNOTION_API_BASE={}/v1\nPROJECTS_FILE={}\nHTTP_TIMEOUT_SECS=5\n",
        server.uri(),
        projects_path.display()
    );
    (temp_file("settings.env", &settings), projects_path)
}

fn cli_for(settings: &PathBuf) -> Cli {
    Cli {
        settings: Some(settings.display().to_string()),
        now: Some(Utc.with_ymd_and_hms(2025, 1, 15, 3, 0, 0).unwrap()),
        ..Cli::default()
    }
}

#[tokio::test]
async fn full_run_sends_tomorrows_event_and_survives_a_broken_project() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/good/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [standup_page()] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/bad/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/good"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, projects) = write_config(
        &server,
        json!({
            "broken": {
                "notion_api_token": "t",
                "notion_database_id": "bad",
                "discord_webhook": format!("{}/hooks/bad", server.uri())
            },
            "team": {
                "notion_api_token": "t",
                "notion_database_id": "good",
                "discord_webhook": format!("{}/hooks/good", server.uri())
            }
        }),
    );

    let outcomes = runtime::run(&cli_for(&settings)).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].project, "broken");
    assert!(outcomes[0].result.is_err());
    assert_eq!(outcomes[1].result.as_ref().unwrap().sent, 1);

    let hook_calls: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/hooks/good")
        .collect();
    assert_eq!(hook_calls.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&hook_calls[0].body).unwrap();
    assert_eq!(body["content"], "@eng");
    assert_eq!(body["embeds"][0]["fields"][2]["value"], "2025-01-16 10:00:00 -> TBD");

    let _ = fs::remove_file(settings);
    let _ = fs::remove_file(projects);
}

#[tokio::test]
async fn project_selection_limits_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/good/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, projects) = write_config(
        &server,
        json!({
            "other": { "notion_api_token": "t", "notion_database_id": "other", "discord_webhook": "w" },
            "team": { "notion_api_token": "t", "notion_database_id": "good", "discord_webhook": "w" }
        }),
    );
    let mut cli = cli_for(&settings);
    cli.only = vec!["team".to_string()];

    let outcomes = runtime::run(&cli).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].project, "team");

    cli.only = vec!["missing".to_string()];
    assert!(runtime::run(&cli).await.is_err());

    let _ = fs::remove_file(settings);
    let _ = fs::remove_file(projects);
}

#[tokio::test]
async fn invalid_project_aborts_before_any_request() {
    let server = MockServer::start().await;
    let (settings, projects) = write_config(
        &server,
        json!({
            "team": { "notion_api_token": "", "notion_database_id": "good", "discord_webhook": "w" }
        }),
    );

    let err = runtime::run(&cli_for(&settings)).await.unwrap_err();
    assert!(format!("{err:#}").contains("team"));
    assert!(server.received_requests().await.unwrap().is_empty());

    let _ = fs::remove_file(settings);
    let _ = fs::remove_file(projects);
}

#[tokio::test]
async fn dry_run_only_queries_the_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/good/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [standup_page()] })))
        .mount(&server)
        .await;

    let (settings, projects) = write_config(
        &server,
        json!({
            "team": {
                "notion_api_token": "t",
                "notion_database_id": "good",
                "discord_webhook": format!("{}/hooks/good", server.uri())
            }
        }),
    );
    let mut cli = cli_for(&settings);
    cli.dry_run = true;

    runtime::run(&cli).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/v1/databases/good/query");

    let _ = fs::remove_file(settings);
    let _ = fs::remove_file(projects);
}
