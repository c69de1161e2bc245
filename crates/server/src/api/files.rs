// Workspace file endpoints consumed by the explorer, editor and search panel.
//
// Routes:
//   GET    /api/files/tree
//   GET    /api/files/directory?path=
//   GET    /api/files/read?path=
//   POST   /api/files/write             {path, content}
//   POST   /api/files/create            {path, content?}
//   POST   /api/files/create-directory  {path}
//   DELETE /api/files/delete?path=
//   DELETE /api/files/delete-directory?path=
//   PUT    /api/files/rename            {oldPath, newPath}
//   POST   /api/files/set-workspace     {path}
//   GET    /api/files/workspace
//   POST   /api/files/validate-path     {path}
//   POST   /api/files/search            {query, ...options}

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Json, Router,
};
use codelab_common::protocol::ApiResponse;
use codelab_common::types::{FileNode, PathValidation, SearchOptions, SearchOutcome, WorkspaceInfo};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    validation::{require, require_present, ValidatedJson, ValidatedQuery},
    workspace::{validate_path as validate_workspace_path, WorkspaceStore},
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Clone)]
struct FilesState {
    store: WorkspaceStore,
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PathRequest {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteRequest {
    path: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameRequest {
    old_path: Option<String>,
    new_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: Option<String>,
    #[serde(flatten)]
    options: SearchOptions,
}

#[derive(Debug, Serialize)]
struct FileContent {
    path: String,
    content: String,
}

pub fn router(store: WorkspaceStore) -> Router {
    Router::new()
        .route("/api/files/tree", get(file_tree))
        .route("/api/files/directory", get(read_directory))
        .route("/api/files/read", get(read_file))
        .route("/api/files/write", post(write_file))
        .route("/api/files/create", post(create_file))
        .route("/api/files/create-directory", post(create_directory))
        .route("/api/files/delete", delete(delete_file))
        .route("/api/files/delete-directory", delete(delete_directory))
        .route("/api/files/rename", put(rename))
        .route("/api/files/set-workspace", post(set_workspace))
        .route("/api/files/workspace", get(get_workspace))
        .route("/api/files/validate-path", post(validate_path))
        .route("/api/files/search", post(search))
        .with_state(FilesState { store })
}

async fn file_tree(State(state): State<FilesState>) -> ApiResult<Vec<FileNode>> {
    let nodes = state.store.snapshot().await.file_tree().await?;
    Ok(Json(ApiResponse::ok(nodes)))
}

async fn read_directory(
    State(state): State<FilesState>,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> ApiResult<Vec<FileNode>> {
    let path = query.path.unwrap_or_default();
    let nodes = state.store.snapshot().await.read_directory(&path).await?;
    Ok(Json(ApiResponse::ok(nodes)))
}

async fn read_file(
    State(state): State<FilesState>,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> ApiResult<FileContent> {
    let path = require(query.path, "path")?;
    let content = state.store.snapshot().await.read_file(&path).await?;
    Ok(Json(ApiResponse::ok(FileContent { path, content })))
}

async fn write_file(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<WriteRequest>,
) -> ApiResult<()> {
    let path = require(body.path, "path")?;
    let content = require_present(body.content, "content")?;
    state.store.snapshot().await.write_file(&path, &content).await?;
    Ok(Json(ApiResponse::done()))
}

async fn create_file(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<WriteRequest>,
) -> ApiResult<()> {
    let path = require(body.path, "path")?;
    state.store.snapshot().await.create_file(&path, body.content.as_deref()).await?;
    Ok(Json(ApiResponse::done()))
}

async fn create_directory(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<PathRequest>,
) -> ApiResult<()> {
    let path = require(body.path, "path")?;
    state.store.snapshot().await.create_directory(&path).await?;
    Ok(Json(ApiResponse::done()))
}

async fn delete_file(
    State(state): State<FilesState>,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> ApiResult<()> {
    let path = require(query.path, "path")?;
    state.store.snapshot().await.delete_file(&path).await?;
    Ok(Json(ApiResponse::done()))
}

async fn delete_directory(
    State(state): State<FilesState>,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> ApiResult<()> {
    let path = require(query.path, "path")?;
    state.store.snapshot().await.delete_directory(&path).await?;
    Ok(Json(ApiResponse::done()))
}

async fn rename(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<RenameRequest>,
) -> ApiResult<()> {
    let old_path = require(body.old_path, "oldPath")?;
    let new_path = require(body.new_path, "newPath")?;
    state.store.snapshot().await.rename(&old_path, &new_path).await?;
    Ok(Json(ApiResponse::done()))
}

async fn set_workspace(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<PathRequest>,
) -> ApiResult<WorkspaceInfo> {
    let path = require(body.path, "path")?;
    let root = state.store.set(&path).await?;
    Ok(Json(ApiResponse::ok(WorkspaceInfo { path: root.display().to_string() })))
}

async fn get_workspace(State(state): State<FilesState>) -> ApiResult<WorkspaceInfo> {
    let root = state.store.path().await;
    Ok(Json(ApiResponse::ok(WorkspaceInfo { path: root.display().to_string() })))
}

async fn validate_path(ValidatedJson(body): ValidatedJson<PathRequest>) -> ApiResult<PathValidation> {
    let path = require(body.path, "path")?;
    Ok(Json(ApiResponse::ok(validate_workspace_path(&path).await)))
}

async fn search(
    State(state): State<FilesState>,
    ValidatedJson(body): ValidatedJson<SearchRequest>,
) -> ApiResult<SearchOutcome> {
    let query = require(body.query, "query")?;
    let outcome = state.store.snapshot().await.search(&query, &body.options).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    use super::*;

    async fn test_router() -> (TempDir, WorkspaceStore, Router) {
        let tmp = tempdir().expect("tempdir should be created");
        let store = WorkspaceStore::open(tmp.path()).await.expect("store should open");
        (tmp, store.clone(), router(store))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn write_then_read_through_routes() {
        let (_tmp, _store, app) = test_router().await;

        let write = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/files/write",
                json!({ "path": "src/a.js", "content": "let a = 1;" }),
            ))
            .await
            .unwrap();
        assert_eq!(write.status(), StatusCode::OK);
        assert_eq!(body_json(write).await, json!({ "success": true }));

        let read = app.oneshot(empty_request("GET", "/api/files/read?path=src/a.js")).await.unwrap();
        assert_eq!(read.status(), StatusCode::OK);
        let body = body_json(read).await;
        assert_eq!(body["data"]["content"], "let a = 1;");
    }

    #[tokio::test]
    async fn write_without_content_is_bad_request() {
        let (_tmp, _store, app) = test_router().await;
        let response = app
            .oneshot(json_request("POST", "/api/files/write", json!({ "path": "a.js" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "content is required");
    }

    #[tokio::test]
    async fn write_with_empty_content_is_allowed() {
        let (tmp, _store, app) = test_router().await;
        let response = app
            .oneshot(json_request("POST", "/api/files/write", json!({ "path": "a.js", "content": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(tmp.path().join("a.js").is_file());
    }

    #[tokio::test]
    async fn read_without_path_is_bad_request() {
        let (_tmp, _store, app) = test_router().await;
        let response = app.oneshot(empty_request("GET", "/api/files/read")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn directory_defaults_to_root() {
        let (tmp, _store, app) = test_router().await;
        std::fs::create_dir(tmp.path().join("src")).unwrap();

        let response = app.oneshot(empty_request("GET", "/api/files/directory")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["data"],
            json!([{ "name": "src", "path": "src", "type": "directory", "children": [] }])
        );
    }

    #[tokio::test]
    async fn malformed_query_string_gets_envelope() {
        let (_tmp, _store, app) = test_router().await;
        let response = app
            .oneshot(empty_request("GET", "/api/files/read?path=a.txt&path=b.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn search_requires_query() {
        let (_tmp, _store, app) = test_router().await;
        let response = app
            .oneshot(json_request("POST", "/api/files/search", json!({ "caseSensitive": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_regex_is_reported_as_server_error() {
        let (_tmp, _store, app) = test_router().await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/files/search",
                json!({ "query": "(", "useRegex": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "INVALID_PATTERN");
    }

    #[tokio::test]
    async fn get_workspace_reports_current_root() {
        let (_tmp, store, app) = test_router().await;
        let response = app.oneshot(empty_request("GET", "/api/files/workspace")).await.unwrap();
        assert_eq!(
            body_json(response).await["data"]["path"],
            store.path().await.display().to_string()
        );
    }
}
