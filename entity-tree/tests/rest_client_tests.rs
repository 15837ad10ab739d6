use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use entity_tree::config::ServerConfig;
use entity_tree::transport::{CommandSurface, RecordSource};
use entity_tree::{ConsoleError, EntityType, RestClient, ViewName};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    puts: Arc<Mutex<Vec<(String, Value)>>>,
}

fn token_of(headers: &HeaderMap) -> Value {
    headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .map(|v| json!(v))
        .unwrap_or(Value::Null)
}

async fn nested(
    Path((id, view)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if id == "broken" {
        return Json(json!({"data": []})).into_response();
    }
    if view == "children" {
        return Json(json!({"result": [
            {"id": "t1", "type": "Content", "name": "Intro", "resourceId": query.get("resourceId")},
            {"id": "d1", "type": "Folder", "files": [{"id": "f1", "type": "File"}]}
        ]}))
        .into_response();
    }
    Json(json!({"result": [{
        "id": id,
        "view": view,
        "pageSize": query.get("pageSize"),
        "token": token_of(&headers)
    }]}))
    .into_response()
}

async fn get_entity(Path(id): Path<String>) -> Response {
    if id == "ghost" {
        return Json(json!({"result": []})).into_response();
    }
    Json(json!({"result": {"id": id, "ownerId": "admin", "visibleToPublicUsers": true}}))
        .into_response()
}

async fn put_entity(
    State(state): State<Recorded>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.puts.lock().unwrap().push((id, body));
    StatusCode::OK
}

async fn delete_entity(Path(id): Path<String>) -> StatusCode {
    match id.as_str() {
        "t1" => StatusCode::OK,
        "locked" => StatusCode::FORBIDDEN,
        _ => StatusCode::NOT_FOUND,
    }
}

async fn spawn_server(state: Recorded) -> String {
    let app = Router::new()
        .route("/rest/:id", get(get_entity).put(put_entity).delete(delete_entity))
        .route("/rest/:id/:view", get(nested))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/rest", addr)
}

fn client(root: &str, token: Option<&str>) -> RestClient {
    RestClient::new(&ServerConfig {
        root_url: root.to_string(),
        session_token: token.map(str::to_string),
        page_size: 10,
        ..ServerConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn view_fetch_sends_page_size_and_token() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, Some("secret"));

    let records = rest.fetch_view("n1", ViewName::All, 10).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["view"], json!("all"));
    assert_eq!(records[0]["pageSize"], json!("10"));
    assert_eq!(records[0]["token"], json!("secret"));
}

#[tokio::test]
async fn html_view_uses_prefixed_segment() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, None);

    let records = rest.fetch_view("n1", ViewName::Html, 10).await.unwrap();

    assert_eq!(records[0]["view"], json!("_html_"));
    assert_eq!(records[0]["token"], Value::Null);
}

#[tokio::test]
async fn missing_result_is_malformed() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, None);

    let err = rest.fetch_view("broken", ViewName::In, 10).await.unwrap_err();
    assert!(matches!(err, ConsoleError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn children_are_typed_entities() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, None);

    let children = rest.children("c1", Some("r1")).await.unwrap();

    assert_eq!(children.len(), 2);
    assert_eq!(children[0].resource_id.as_deref(), Some("r1"));
    assert_eq!(children[1].entity_type(), EntityType::Folder);
    assert!(children[1].has_typed_children());
}

#[tokio::test]
async fn set_property_puts_single_key() {
    let state = Recorded::default();
    let root = spawn_server(state.clone()).await;
    let rest = client(&root, None);

    rest.set_property("n1", "name", &json!("Bar")).await.unwrap();

    assert_eq!(
        state.puts.lock().unwrap().clone(),
        vec![("n1".to_string(), json!({"name": "Bar"}))]
    );
}

#[tokio::test]
async fn get_property_reads_single_object_envelope() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, None);

    assert_eq!(rest.get_property("n1", "ownerId").await.unwrap(), json!("admin"));
    assert_eq!(rest.get_property("n1", "missing").await.unwrap(), Value::Null);
    assert_eq!(rest.get_property("ghost", "ownerId").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn delete_maps_statuses() {
    let root = spawn_server(Recorded::default()).await;
    let rest = client(&root, None);

    assert!(rest.delete_node("t1").await.unwrap());
    assert!(!rest.delete_node("gone").await.unwrap());
    assert!(matches!(
        rest.delete_node("locked").await,
        Err(ConsoleError::Status { status: 403, .. })
    ));
}
