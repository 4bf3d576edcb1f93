//! End-to-end tests for the admin console workflows.
//!
//! Each test starts an in-process mock of the backend on an ephemeral port
//! and drives the real client and workflows against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use quizdesk_client::{ApiClient, Console};
use quizdesk_core::{
    Catalog, Config, HardFilter, Question, QuestionType, Selection, TokenStore, Topic,
    TopicSelection, TopicTag, User,
};
use serde_json::{json, Value};

const PASSWORD: &str = "admin-pass";
const TOKEN: &str = "session-token";

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Default)]
struct Backend {
    hits: HashMap<&'static str, usize>,
    users: Vec<User>,
    catalog: Catalog,
    questions: Vec<Question>,
    trainings: Vec<Value>,
    sent: Vec<Value>,
    next_id: u64,
}

impl Backend {
    fn hit(&mut self, name: &'static str) {
        *self.hits.entry(name).or_insert(0) += 1;
    }

    fn hits(&self, name: &str) -> usize {
        self.hits.get(name).copied().unwrap_or(0)
    }

    fn topic_mut(&mut self, id: u64) -> Option<&mut Topic> {
        self.catalog
            .values_mut()
            .flat_map(|topics| topics.iter_mut())
            .find(|t| t.id == id)
    }
}

type Shared = Arc<Mutex<Backend>>;
type Reply = Result<Json<Value>, StatusCode>;

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn ok() -> Reply {
    Ok(Json(json!({"ok": true})))
}

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if body["password"] == PASSWORD {
        Ok(Json(json!({"token": TOKEN})))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Неверный пароль"})),
        ))
    }
}

async fn verify(headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    ok()
}

async fn list_users(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.hit("users");
    Ok(Json(json!(backend.users)))
}

async fn rename_user(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(telegram_id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    let user = backend
        .users
        .iter_mut()
        .find(|u| u.telegram_id == telegram_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    user.name = body["name"].as_str().unwrap_or_default().to_string();
    ok()
}

async fn list_topics(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.hit("topics");
    Ok(Json(json!(backend.catalog)))
}

async fn create_topic(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.next_id += 1;
    let id = backend.next_id;
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let volume = body["volume"].as_str().unwrap_or_default().to_string();
    backend.catalog.entry(volume.clone()).or_default().push(Topic {
        id,
        name: name.clone(),
        tags: vec![],
    });
    Ok(Json(json!({"id": id, "name": name, "volume": volume})))
}

async fn update_topic(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    let topic = backend.topic_mut(id).ok_or(StatusCode::NOT_FOUND)?;
    topic.tags = body["tags_list"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|tag| TopicTag::new(tag, 0))
        .collect();
    ok()
}

async fn delete_topic(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.hit("delete-topic");
    for topics in backend.catalog.values_mut() {
        topics.retain(|t| t.id != id);
    }
    backend.catalog.retain(|_, topics| !topics.is_empty());
    ok()
}

async fn create_hand_work(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.hit("hand-works");
    backend.next_id += 1;
    let id = backend.next_id;
    let name = body["name"].clone();
    backend.trainings.push(body);
    Ok(Json(json!({
        "id": id,
        "name": name,
        "identificator": format!("HW{id}"),
        "link": format!("https://t.me/bot?start=HW{id}")
    })))
}

async fn send_training(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    s.lock().unwrap().sent.push(body);
    ok()
}

async fn list_pool(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let backend = s.lock().unwrap();
    let rows: Vec<_> = backend.questions.iter().map(Question::summary).collect();
    Ok(Json(json!(rows)))
}

async fn get_question(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    authorize(&headers)?;
    let backend = s.lock().unwrap();
    let question = backend
        .questions
        .iter()
        .find(|q| q.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!(question)))
}

async fn update_question(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut backend = s.lock().unwrap();
    backend.hit("update-question");
    let question = backend
        .questions
        .iter_mut()
        .find(|q| q.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut merged = json!(question);
    for (key, value) in body.as_object().into_iter().flatten() {
        merged[key] = value.clone();
    }
    *question = serde_json::from_value(merged).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
    ok()
}

async fn delete_question(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    authorize(&headers)?;
    s.lock().unwrap().questions.retain(|q| q.id != id);
    ok()
}

fn seeded_backend() -> Backend {
    let mut catalog = Catalog::new();
    catalog.insert(
        "Неорганика".to_string(),
        vec![Topic {
            id: 1,
            name: "Соли".to_string(),
            tags: vec![TopicTag::new("соли", 5), TopicTag::new("оксиды", 3)],
        }],
    );
    let question = |id: u64, text: &str, tags: &[&str]| Question {
        id,
        text: text.to_string(),
        answer: "ответ".to_string(),
        level: 2,
        full_mark: 1,
        tags_list: tags.iter().map(|t| (*t).to_string()).collect(),
        is_rotate: 0,
        is_selfcheck: 0,
        question_image: false,
        answer_image: false,
        question_type: QuestionType::Ege,
    };
    Backend {
        users: vec![
            User {
                id: 1,
                telegram_id: 1001,
                name: "Анна".to_string(),
            },
            User {
                id: 2,
                telegram_id: 1002,
                name: "Борис".to_string(),
            },
        ],
        catalog,
        questions: vec![
            question(10, "Формула оксида натрия", &["оксиды"]),
            question(11, "Назовите соль NaCl", &["соли"]),
        ],
        next_id: 100,
        ..Backend::default()
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:telegram_id", put(rename_user))
        .route("/api/admin/topics", get(list_topics).post(create_topic))
        .route(
            "/api/admin/topics/:id",
            put(update_topic).delete(delete_topic),
        )
        .route("/api/admin/hand-works", post(create_hand_work))
        .route("/api/admin/send-training", post(send_training))
        .route("/api/admin/pool", get(list_pool))
        .route(
            "/api/admin/pool/:id",
            get(get_question)
                .put(update_question)
                .delete(delete_question),
        )
        .with_state(state)
}

/// Finds an available port on localhost.
fn find_available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Starts the mock backend and returns its state and API base URL.
async fn start_backend() -> (Shared, String) {
    let state: Shared = Arc::new(Mutex::new(seeded_backend()));
    let port = find_available_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind backend");
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Backend failed");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (state, format!("http://127.0.0.1:{port}/api"))
}

fn console(base: &str) -> Console {
    let config = Config {
        api_base_url: base.to_string(),
        ..Config::default()
    };
    let client = ApiClient::from_config(&config)
        .expect("Failed to build client")
        .with_token(TOKEN);
    Console::new(client, &config)
}

// ============================================================================
// Tests
// ============================================================================

/// Tests that a login survives into a fresh client through the token file.
#[tokio::test]
async fn test_login_token_persists_across_sessions() {
    let (_state, base) = start_backend().await;
    let token_path = std::env::temp_dir()
        .join(format!("quizdesk-it-{}", std::process::id()))
        .join("token");
    let store = TokenStore::new(&token_path);

    let mut client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");
    let err = client.login("wrong").await.expect_err("wrong password");
    assert_eq!(err.to_string(), "Неверный пароль");

    let token = client.login(PASSWORD).await.expect("login");
    store.save(&token).expect("save token");

    let restored = store.load().expect("load token").expect("token present");
    let fresh = ApiClient::new(&base, Duration::from_secs(5))
        .expect("client")
        .with_token(restored);
    assert!(fresh.verify().await.expect("verify"));

    store.clear().expect("clear token");
    assert!(store.load().expect("load after clear").is_none());
    let _ = std::fs::remove_dir_all(token_path.parent().expect("parent"));
}

/// Tests that a rejected token surfaces as an auth rejection.
#[tokio::test]
async fn test_expired_token_forces_login() {
    let (_state, base) = start_backend().await;
    let config = Config {
        api_base_url: base,
        ..Config::default()
    };
    let client = ApiClient::from_config(&config)
        .expect("client")
        .with_token("expired");
    let mut console = Console::new(client, &config);

    let err = console.users().await.expect_err("rejected");
    assert!(err.is_auth_rejection());
}

/// Tests that the user list is cached and a rename invalidates it.
#[tokio::test]
async fn test_user_list_cache_and_rename() {
    let (state, base) = start_backend().await;
    let mut console = console(&base);

    assert_eq!(console.users().await.expect("users").len(), 2);
    assert_eq!(console.users().await.expect("users").len(), 2);
    assert_eq!(state.lock().unwrap().hits("users"), 1);

    console.rename_user(1001, " Анна П. ").await.expect("rename");
    let users = console.users().await.expect("users");
    assert_eq!(state.lock().unwrap().hits("users"), 2);
    assert_eq!(users[0].name, "Анна П.");

    let err = console.rename_user(1001, "  ").await.expect_err("blank");
    assert!(err.is_validation());
}

/// Tests the catalog lifecycle from a new volume to its deletion.
#[tokio::test]
async fn test_catalog_volume_lifecycle() {
    let (state, base) = start_backend().await;
    let mut console = console(&base);
    let mut tree = console.catalog_tree().await.expect("tree");

    let volume = tree.add_pending_volume("Органика").expect("pending");
    assert!(tree.is_pending(&volume));

    let first = console
        .create_topic(&mut tree, "Спирты", &volume)
        .await
        .expect("create");
    let second = console
        .create_topic(&mut tree, "Кислоты", &volume)
        .await
        .expect("create");
    assert!(!tree.is_pending(&volume));
    assert_eq!(tree.topics(&volume).len(), 2);

    console
        .add_topic_tag(&mut tree, first, " Ёлочные СПИРТЫ ")
        .await
        .expect("add tag");
    {
        let backend = state.lock().unwrap();
        let topic = backend.catalog[&volume].iter().find(|t| t.id == first).unwrap();
        assert_eq!(topic.tags, vec![TopicTag::new("елочные спирты", 0)]);
    }

    console
        .remove_topic_tag(&mut tree, first, "елочные спирты")
        .await
        .expect("remove tag");
    assert!(tree.find_topic(first).unwrap().tags.is_empty());

    let deleted = console
        .delete_volume(&mut tree, &volume)
        .await
        .expect("delete volume");
    assert_eq!(deleted, 2);
    assert!(!tree.has_volume(&volume));
    assert!(tree.find_topic(second).is_none());

    let backend = state.lock().unwrap();
    assert!(!backend.catalog.contains_key(&volume));
    assert_eq!(backend.hits("delete-topic"), 2);
}

/// Tests composing a training by tag counts and sending it to a student.
#[tokio::test]
async fn test_training_by_topics_is_clamped_and_sent() {
    let (state, base) = start_backend().await;
    let mut console = console(&base);
    let catalog = console.catalog().await.expect("catalog");

    let mut selection = TopicSelection::new();
    assert_eq!(selection.set_count_from_catalog(&catalog, "соли", 9), 5);
    assert_eq!(selection.set_count_from_catalog(&catalog, "оксиды", 2), 2);
    assert_eq!(selection.set_count_from_catalog(&catalog, "металлы", 4), 0);

    let created = console
        .create_training_by_topics(&mut selection, "Контрольная")
        .await
        .expect("create");
    assert!(selection.is_empty());
    assert_eq!(created.share_target(), format!("https://t.me/bot?start=HW{}", created.id));

    let request = quizdesk_core::SendTrainingRequest::for_training(&created, 1001);
    console
        .client()
        .send_training(&request)
        .await
        .expect("send");

    let backend = state.lock().unwrap();
    assert_eq!(
        backend.trainings[0],
        json!({"name": "Контрольная", "questions": {"оксиды": 2, "соли": 5}, "mode": "tags"})
    );
    assert_eq!(backend.sent[0]["telegram_id"], 1001);
    assert_eq!(backend.sent[0]["name"], "Контрольная");
}

/// Tests that invalid compositions never reach the backend.
#[tokio::test]
async fn test_invalid_compositions_send_nothing() {
    let (state, base) = start_backend().await;
    let console = console(&base);

    let mut filter = HardFilter::new();
    filter.set_slot(0, "соли");
    filter.set_slot(1, " Соли ");
    let err = console
        .create_training_hard_filter(&filter, "")
        .await
        .expect_err("one distinct tag");
    assert!(err.is_validation());

    let mut selection = TopicSelection::new();
    let err = console
        .create_training_by_topics(&mut selection, "")
        .await
        .expect_err("empty selection");
    assert!(err.is_validation());

    assert_eq!(state.lock().unwrap().hits("hand-works"), 0);

    filter.set_slot(1, "оксиды");
    filter.set_count(4);
    console
        .create_training_hard_filter(&filter, "")
        .await
        .expect("create");
    let backend = state.lock().unwrap();
    assert_eq!(backend.trainings[0]["mode"], "hard_filter");
    assert_eq!(backend.trainings[0]["hard_tags"], json!(["соли", "оксиды"]));
    assert_eq!(backend.trainings[0]["questions_count"], 4);
    assert!(backend.trainings[0]["name"]
        .as_str()
        .unwrap()
        .starts_with("Тренировка по тегам"));
}

/// Tests search, edit, save and delete of a pool question.
#[tokio::test]
async fn test_pool_edit_and_delete() {
    let (state, base) = start_backend().await;
    let console = console(&base);
    let mut pool = console.pool_index().await.expect("pool");

    let page = pool.search("ОКСИД", 100);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, 10);

    let mut selection = Selection::new();
    let mut draft = console
        .load_question(&mut selection, 10)
        .await
        .expect("load")
        .expect("selected");
    assert!(console
        .load_question(&mut selection, 10)
        .await
        .expect("reload")
        .is_none());

    draft.set_text("Формула оксида калия");
    draft.add_tag("Щелочные металлы").expect("tag");
    assert!(console.save_question(&mut pool, &mut draft).await.expect("save"));
    assert!(!draft.is_dirty());
    assert!(!console.save_question(&mut pool, &mut draft).await.expect("noop"));

    {
        let backend = state.lock().unwrap();
        assert_eq!(backend.hits("update-question"), 1);
        let stored = backend.questions.iter().find(|q| q.id == 10).unwrap();
        assert_eq!(stored.text, "Формула оксида калия");
        assert_eq!(stored.tags_list, vec!["оксиды", "щелочные металлы"]);
    }
    assert_eq!(pool.search("калия", 100).total, 1);

    console
        .delete_question(&mut pool, &mut selection, 10)
        .await
        .expect("delete");
    assert!(pool.get(10).is_none());
    assert_eq!(selection.current(), None);
    assert_eq!(state.lock().unwrap().questions.len(), 1);
}
