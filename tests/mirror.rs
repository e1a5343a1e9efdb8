use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use habit_arena::competition;
use habit_arena::config::RemoteConfig;
use habit_arena::models::AppData;
use habit_arena::remote::RemoteError;
use habit_arena::storage::persist_data;
use habit_arena::{initialize_data, load_data, AppState, RemoteMirror};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Stand-in for the spreadsheet web app: one stored document plus every POST body.
#[derive(Clone, Default)]
struct FakeSheet {
    document: Arc<Mutex<Option<Value>>>,
    posts: Arc<Mutex<Vec<Value>>>,
    /// Holds the next save back for a while before storing it.
    slow_save: Arc<AtomicBool>,
}

impl FakeSheet {
    fn posted_actions(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body["action"].as_str().map(str::to_string))
            .collect()
    }
}

async fn sheet_get(
    State(sheet): State<FakeSheet>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let body = match params.get("action").map(String::as_str) {
        Some("load") => sheet
            .document
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| json!({ "success": false, "data": null })),
        Some("getAllHistory") => json!({
            "history": [{ "date": "2026-01-14", "time": "08:00:00", "activity": "joined", "participant": "amal" }]
        }),
        Some("getHistory") => json!({
            "history": [{ "participant": params.get("participant").cloned().unwrap_or_default() }]
        }),
        _ => json!({ "error": "Invalid action" }),
    };
    Json(body)
}

async fn sheet_post(State(sheet): State<FakeSheet>, Json(body): Json<Value>) -> Json<Value> {
    if body["action"] == "save" {
        if sheet.slow_save.swap(false, Ordering::SeqCst) {
            sleep(Duration::from_millis(300)).await;
        }
        *sheet.document.lock().unwrap() = Some(body["data"].clone());
    }
    sheet.posts.lock().unwrap().push(body);
    Json(json!({ "success": true }))
}

async fn spawn_sheet() -> (FakeSheet, RemoteConfig) {
    let sheet = FakeSheet::default();
    let app = Router::new()
        .route("/exec", get(sheet_get).post(sheet_post))
        .with_state(sheet.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = RemoteConfig {
        url: format!("http://{addr}/exec"),
        timeout: Duration::from_secs(2),
    };
    (sheet, config)
}

fn unreachable_remote() -> RemoteConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    RemoteConfig {
        url: format!("http://127.0.0.1:{port}/exec"),
        timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn mirror_load_is_empty_until_saved() {
    let (_sheet, config) = spawn_sheet().await;
    let mirror = RemoteMirror::new(&config).unwrap();

    assert!(mirror.load().await.unwrap().is_none());

    let mut data = AppData::default();
    competition::create_participant(&mut data, "amal", chrono::Local::now()).unwrap();
    mirror.save(&data).await.unwrap();

    let loaded = mirror.load().await.unwrap().expect("document");
    assert!(loaded.participants.contains_key("amal"));
}

#[tokio::test]
async fn initialize_prefers_remote_document() {
    let (sheet, config) = spawn_sheet().await;
    let mut remote = AppData::default();
    competition::create_participant(&mut remote, "badr", chrono::Local::now()).unwrap();
    *sheet.document.lock().unwrap() = Some(serde_json::to_value(&remote).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mirror = RemoteMirror::new(&config).unwrap();

    let data = initialize_data(&path, Some(&mirror)).await.unwrap();
    assert!(data.participants.contains_key("badr"));

    let local = load_data(&path).await.unwrap().expect("local copy");
    assert!(local.participants.contains_key("badr"));
}

#[tokio::test]
async fn initialize_pushes_fresh_document_to_empty_remote() {
    let (sheet, config) = spawn_sheet().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mirror = RemoteMirror::new(&config).unwrap();

    let data = initialize_data(&path, Some(&mirror)).await.unwrap();
    assert!(data.participants.is_empty());
    assert_eq!(sheet.posted_actions(), vec!["save".to_string()]);
}

#[tokio::test]
async fn initialize_falls_back_when_remote_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mirror = RemoteMirror::new(&unreachable_remote()).unwrap();

    let data = initialize_data(&path, Some(&mirror)).await.unwrap();
    assert_eq!(data.global_habits.len(), 3);
    assert!(load_data(&path).await.unwrap().is_some());
}

#[tokio::test]
async fn mutations_replicate_document_and_activities() {
    let (sheet, config) = spawn_sheet().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mirror = Arc::new(RemoteMirror::new(&config).unwrap());
    let state = AppState::new(path.clone(), AppData::default(), Some(mirror));

    state
        .mutate(|data, now| competition::create_participant(data, "kareem", now))
        .await
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let actions = sheet.posted_actions();
        if actions == vec!["save".to_string(), "logActivity".to_string()] {
            break;
        }
        if Instant::now() > deadline {
            panic!("remote never received the change, saw {actions:?}");
        }
        sleep(Duration::from_millis(50)).await;
    }

    let posts = sheet.posts.lock().unwrap().clone();
    assert_eq!(posts[1]["activity"]["participant"], "kareem");
    let local = load_data(&path).await.unwrap().expect("local copy");
    assert!(local.participants.contains_key("kareem"));
}

async fn wait_for_posts(sheet: &FakeSheet, count: usize) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let actions = sheet.posted_actions();
        if actions.len() >= count {
            return actions;
        }
        if Instant::now() > deadline {
            panic!("remote saw only {actions:?}");
        }
        sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn slow_remote_still_ends_with_latest_document() {
    let (sheet, config) = spawn_sheet().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mirror = Arc::new(RemoteMirror::new(&config).unwrap());
    let state = AppState::new(path, AppData::default(), Some(mirror));

    sheet.slow_save.store(true, Ordering::SeqCst);
    for name in ["amal", "badr"] {
        state
            .mutate(|data, now| competition::create_participant(data, name, now))
            .await
            .unwrap();
    }

    let actions = wait_for_posts(&sheet, 4).await;
    assert_eq!(actions, vec!["save", "logActivity", "save", "logActivity"]);

    let document = sheet.document.lock().unwrap().clone().expect("document");
    let remote: AppData = serde_json::from_value(document).unwrap();
    assert!(remote.participants.contains_key("amal"));
    assert!(remote.participants.contains_key("badr"));
}

#[tokio::test]
async fn remote_error_payload_does_not_replace_local_file() {
    let (sheet, config) = spawn_sheet().await;
    *sheet.document.lock().unwrap() = Some(json!({ "error": "Invalid action" }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut local = AppData::default();
    competition::create_participant(&mut local, "zaid", chrono::Local::now()).unwrap();
    persist_data(&path, &local).await.unwrap();

    let mirror = RemoteMirror::new(&config).unwrap();
    let data = initialize_data(&path, Some(&mirror)).await.unwrap();
    assert!(data.participants.contains_key("zaid"));

    let on_disk = load_data(&path).await.unwrap().expect("local copy");
    assert!(on_disk.participants.contains_key("zaid"));
    assert!(sheet.posted_actions().is_empty());
}

#[tokio::test]
async fn mirror_load_rejects_empty_object() {
    let (sheet, config) = spawn_sheet().await;
    *sheet.document.lock().unwrap() = Some(json!({}));

    let mirror = RemoteMirror::new(&config).unwrap();
    assert!(matches!(mirror.load().await, Err(RemoteError::NotADocument)));
}

#[tokio::test]
async fn failed_mutation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let state = AppState::new(path.clone(), AppData::default(), None);

    let err = state
        .mutate(|data, now| competition::give_reward(data, "ghost", "Bonus", 5, now))
        .await
        .unwrap_err();
    assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    assert!(load_data(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn remote_history_passes_rows_through() {
    let (_sheet, config) = spawn_sheet().await;
    let mirror = RemoteMirror::new(&config).unwrap();

    let all = mirror.competition_history().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["participant"], "amal");

    let mine = mirror.participant_history("dana").await.unwrap();
    assert_eq!(mine[0]["participant"], "dana");
}

#[tokio::test]
async fn remote_history_is_an_error_when_remote_is_down() {
    let mirror = RemoteMirror::new(&unreachable_remote()).unwrap();
    assert!(mirror.competition_history().await.is_err());
}
