//! End-to-end tests for the Stats Viewer.
//!
//! A completed work is fetched through its share token and rendered to
//! Markdown and JSON; a student's history is fetched and rendered as a table.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use quizdesk_client::ApiClient;
use quizdesk_report::{
    json::JsonGenerator, HistoryMarkdown, HistoryReport, MarkdownGenerator, WorkReport,
};
use serde_json::{json, Value};

const SHARE_TOKEN: &str = "c0ffee";

fn work_detail() -> Value {
    json!({
        "general": {
            "telegram_id": 1001,
            "user_name": "Анна",
            "name": "Соли и оксиды",
            "start": "2024-05-01 10:00:00",
            "end": "2024-05-01 11:02:03",
            "final_mark": 4,
            "max_mark": 6,
            "fully": 1,
            "semi": 1,
            "zero": 1
        },
        "questions": [
            {"index": 3, "question_id": 12, "text": "Оксид меди", "answer": "CuO",
             "user_answer": "Cu2O", "user_mark": 0, "full_mark": 2,
             "question_image": false, "answer_image": false},
            {"index": 1, "question_id": 10, "text": "Соль натрия", "answer": "NaCl",
             "user_answer": "NaCl", "user_mark": 2, "full_mark": 2,
             "question_image": true, "answer_image": false},
            {"index": 2, "question_id": 11, "text": "Соль калия", "answer": "KCl, K2SO4",
             "user_answer": "KCl", "user_mark": 2, "full_mark": 4,
             "question_image": false, "answer_image": true}
        ]
    })
}

async fn work_stats(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    if q.get("token").map(String::as_str) == Some(SHARE_TOKEN) {
        Ok(Json(work_detail()))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn user_stats(
    headers: HeaderMap,
    Path(telegram_id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    if headers.get("authorization").is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if telegram_id != 1001 {
        return Ok(Json(json!([])));
    }
    Ok(Json(json!([
        {"work_id": 7, "share_token": SHARE_TOKEN, "name": "Соли и оксиды", "type": "topic",
         "start": "2024-05-01T10:00:00Z", "end": "2024-05-01T11:02:03Z",
         "final_mark": 4, "max_mark": 6, "fully": 1, "semi": 1, "zero": 1,
         "questions_amount": 3},
        {"work_id": 8, "name": "Вариант 12", "type": "ege", "start": null, "end": null}
    ])))
}

/// Finds an available port on localhost.
fn find_available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

async fn start_backend() -> String {
    let app = Router::new()
        .route("/api/student/work-stats", get(work_stats))
        .route("/api/admin/users/:telegram_id/stats", get(user_stats));
    let port = find_available_port();
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .await
        .expect("Failed to bind backend");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Backend failed");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}/api")
}

/// Tests the public view: fetch by share token, then render Markdown.
#[tokio::test]
async fn test_shared_work_renders_markdown() {
    let base = start_backend().await;
    let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");

    let detail = client.work_stats(SHARE_TOKEN).await.expect("work stats");
    let report = WorkReport::from_detail(&detail, client.base_url(), 3).expect("report");
    let markdown = MarkdownGenerator::new(&report).generate();

    assert!(markdown.starts_with("# Соли и оксиды"));
    assert!(markdown.contains(&format!("![Аватар]({base}/images/user/1001)")));
    assert!(markdown.contains("| Баллы | 4/6 |"));
    assert!(markdown.contains("| Время выполнения | 1ч 2м 3с |"));
    assert!(markdown.contains("| Начало | 01.05.2024, 13:00 |"));

    let first = markdown.find("### 1. ✅ Верно (2/2)").expect("q1");
    let second = markdown.find("### 2. 🟡 Частично (2/4)").expect("q2");
    let third = markdown.find("### 3. ❌ Неверно (0/2)").expect("q3");
    assert!(first < second && second < third);

    assert!(markdown.contains(&format!("![Вопрос 1]({base}/images/question/10)")));
    assert!(markdown.contains(&format!("![Ответ 2]({base}/images/answer/11)")));
    assert!(!markdown.contains("![Ответ 1]"));
    assert!(!markdown.contains("images/question/12"));
}

/// Tests that the JSON rendering keeps outcome and omits absent images.
#[tokio::test]
async fn test_shared_work_renders_json() {
    let base = start_backend().await;
    let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");

    let detail = client.work_stats(SHARE_TOKEN).await.expect("work stats");
    let report = WorkReport::from_detail(&detail, client.base_url(), 0).expect("report");
    let json: Value =
        serde_json::from_str(&JsonGenerator::new(&report).generate().expect("json")).expect("parse");

    let outcomes: Vec<&str> = json["questions"]
        .as_array()
        .expect("questions")
        .iter()
        .map(|q| q["outcome"].as_str().expect("outcome"))
        .collect();
    assert_eq!(outcomes, vec!["full", "partial", "zero"]);
    assert!(json["questions"][2].get("question_image").is_none());
    assert_eq!(json["started_at"], "01.05.2024, 10:00");
}

/// Tests that an unknown share token surfaces the backend status.
#[tokio::test]
async fn test_unknown_share_token() {
    let base = start_backend().await;
    let client = ApiClient::new(&base, Duration::from_secs(5)).expect("client");

    let err = client.work_stats("nope").await.expect_err("not found");
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Ошибка 404");
}

/// Tests rendering a student's work history.
#[tokio::test]
async fn test_student_history_table() {
    let base = start_backend().await;
    let client = ApiClient::new(&base, Duration::from_secs(5))
        .expect("client")
        .with_token("any");

    let stats = client.user_stats(1001).await.expect("stats");
    let history = HistoryReport::from_stats(Some("Анна"), &stats, 3);
    let markdown = HistoryMarkdown::new(&history).generate();

    assert!(markdown.starts_with("# Работы: Анна"));
    assert!(markdown.contains("| 7 | Соли и оксиды | Тема | 01.05.2024, 13:00 | 1ч 2м 3с | 4/6 | 1 / 1 / 1 |"));
    assert!(markdown.contains("| 8 | Вариант 12 | ЕГЭ | — | — | 0/0 | 0 / 0 / 0 |"));

    let empty = client.user_stats(1002).await.expect("stats");
    let markdown = HistoryMarkdown::new(&HistoryReport::from_stats(None, &empty, 3)).generate();
    assert!(markdown.contains("ни одной работы"));
}
