//! HTTP tests for stored (named) templates, backed by a local directory.

use std::sync::Arc;

use async_trait::async_trait;
use athena_query_api::backend::MockQueryBackend;
use athena_query_api::template::TemplateStore;
use axum::http::StatusCode;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use super::common::{post_json, router};

const RUN_S3_QUERY: &str = "/athena/run_s3_query_template";

fn template_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("reports")).unwrap();
    std::fs::create_dir_all(dir.path().join("common")).unwrap();
    std::fs::write(
        dir.path().join("reports/daily.sql"),
        "SELECT * FROM events WHERE day = '{{.Day}}' {{> limit}}",
    )
    .unwrap();
    std::fs::write(dir.path().join("common/limit"), "LIMIT {{.Limit}}").unwrap();
    dir
}

/// Lists like the wrapped store but fails every read.
#[derive(Debug, Default)]
struct UnreadableStore {
    inner: InMemory,
}

impl std::fmt::Display for UnreadableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnreadableStore")
    }
}

#[async_trait]
impl ObjectStore for UnreadableStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        _location: &ObjectPath,
        _options: GetOptions,
    ) -> object_store::Result<GetResult> {
        Err(object_store::Error::Generic {
            store: "UnreadableStore",
            source: "access denied".into(),
        })
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

fn store(dir: &TempDir) -> TemplateStore {
    TemplateStore::open(dir.path().to_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_named_template_with_partial() {
    let dir = template_dir();
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend.clone(), Some(store(&dir)));

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["reports/*.sql", "common/*"],
            "templateData": {"Day": "2024-05-01", "Limit": 10}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["queryExecutionId"].is_string());
    assert_eq!(
        backend.submissions()[0].query,
        "SELECT * FROM events WHERE day = '2024-05-01' LIMIT 10"
    );
}

#[tokio::test]
async fn test_unknown_template_name_is_bad_request() {
    let dir = template_dir();
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend.clone(), Some(store(&dir)));

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({
            "templateName": "weekly.sql",
            "templateParsePatterns": ["reports/*.sql"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "failed to lookup template");
    assert!(backend.submissions().is_empty());
}

#[tokio::test]
async fn test_pattern_matching_nothing_is_bad_request() {
    let dir = template_dir();
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend.clone(), Some(store(&dir)));

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["missing/*.sql"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "failed to parse template");
    assert!(backend.submissions().is_empty());
}

#[tokio::test]
async fn test_missing_store_is_internal_error() {
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend.clone(), None);

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["reports/*.sql"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "query templates are not configured");
    assert!(backend.submissions().is_empty());
}

#[tokio::test]
async fn test_missing_patterns_field_is_bad_request() {
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend, None);

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({"templateName": "daily.sql"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "failed to parse request");
}

#[tokio::test]
async fn test_later_pattern_wins_for_shared_name() {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in [
        ("queries/daily.sql", "SELECT * FROM events {{> filter}}"),
        ("base/filter", "WHERE 1 = 1"),
        ("override/filter", "WHERE region = '{{.Region}}'"),
    ] {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    let backend = Arc::new(MockQueryBackend::new());

    let (status, _) = post_json(
        router(backend.clone(), Some(store(&dir))),
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["queries/*.sql", "override/*", "base/*"],
            "templateData": {"Region": "eu"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        router(backend.clone(), Some(store(&dir))),
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["queries/*.sql", "base/*", "override/*"],
            "templateData": {"Region": "eu"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let queries: Vec<String> = backend.submissions().into_iter().map(|s| s.query).collect();
    assert_eq!(
        queries,
        vec![
            "SELECT * FROM events WHERE 1 = 1".to_string(),
            "SELECT * FROM events WHERE region = 'eu'".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unreadable_template_is_bad_request() {
    let unreadable = UnreadableStore::default();
    unreadable
        .put(
            &ObjectPath::from("reports/daily.sql"),
            PutPayload::from("SELECT 1".to_string()),
        )
        .await
        .unwrap();
    let templates = TemplateStore::new(Arc::new(unreadable), "memory://");
    let backend = Arc::new(MockQueryBackend::new());
    let app = router(backend.clone(), Some(templates));

    let (status, body) = post_json(
        app,
        RUN_S3_QUERY,
        json!({
            "templateName": "daily.sql",
            "templateParsePatterns": ["reports/*.sql"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "failed to read template"}));
    assert!(backend.submissions().is_empty());
}
