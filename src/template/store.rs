//! Read-only template file store with glob lookup.
//!
//! Backed by `object_store`, so local directories, S3 buckets and in-memory
//! stores all behave the same way.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::TryStreamExt;
use glob::{MatchOptions, Pattern};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::prefix::PrefixStore;
use object_store::ObjectStore;
use url::Url;

use crate::error::{ApiError, RenderError, Result};

/// `*` and `?` never match a path separator.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// The part of the store a pattern can match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ListScope {
    /// Literal directory before the first wildcard segment; `None` is the root.
    prefix: Option<String>,
    /// Whether matches can sit below the prefix's immediate children.
    recursive: bool,
}

impl ListScope {
    fn for_pattern(pattern: &str) -> Self {
        let segments: Vec<&str> = pattern.split('/').collect();
        let literal = segments
            .iter()
            .take_while(|segment| !segment.contains(['*', '?', '[']))
            .count();
        let dir_len = literal.min(segments.len() - 1);
        let prefix = segments[..dir_len].join("/");

        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
            recursive: segments.len() - dir_len > 1,
        }
    }
}

/// A template file loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Store-relative path, e.g. `reports/daily.sql`.
    pub path: String,
    pub content: String,
}

impl TemplateFile {
    /// Returns the final path segment, which names the template.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Store of query template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl TemplateStore {
    /// Wraps an existing object store.
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
        }
    }

    /// Opens a store from a location string.
    ///
    /// `s3://bucket/prefix` opens an S3 bucket using credentials from the
    /// standard AWS environment; anything else is treated as a local directory.
    pub fn open(location: &str) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = if location.starts_with("s3://") {
            open_s3(location)?
        } else {
            let dir = location.strip_prefix("file://").unwrap_or(location);
            open_local(PathBuf::from(dir))?
        };

        Ok(Self::new(store, location))
    }

    /// Returns the location this store was opened from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Loads every file matched by any of the glob patterns.
    ///
    /// A pattern that is invalid or matches nothing fails at the parse stage.
    /// Files come back in pattern order, sorted by path within each pattern,
    /// each at most once. Only the directory a pattern names is listed.
    pub async fn load_matching(
        &self,
        patterns: &[String],
    ) -> std::result::Result<Vec<TemplateFile>, RenderError> {
        if patterns.is_empty() {
            return Err(RenderError::parse("no template parse patterns given"));
        }

        let compiled = patterns
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| RenderError::parse(format!("invalid pattern '{p}': {e}")))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut listings: HashMap<ListScope, Vec<String>> = HashMap::new();
        let mut selected: Vec<String> = Vec::new();
        for (pattern, raw) in compiled.iter().zip(patterns) {
            let scope = ListScope::for_pattern(raw);
            if !listings.contains_key(&scope) {
                let mut paths = self.list_scope(&scope).await?;
                paths.sort();
                listings.insert(scope.clone(), paths);
            }

            let matches: Vec<&String> = listings[&scope]
                .iter()
                .filter(|path| pattern.matches_with(path, MATCH_OPTIONS))
                .collect();
            if matches.is_empty() {
                return Err(RenderError::parse(format!(
                    "pattern matches no files: '{raw}'"
                )));
            }
            for path in matches {
                if !selected.contains(path) {
                    selected.push(path.clone());
                }
            }
        }

        let mut files = Vec::with_capacity(selected.len());
        for path in selected {
            let content = self.read(&path).await?;
            files.push(TemplateFile { path, content });
        }
        Ok(files)
    }

    async fn list_scope(
        &self,
        scope: &ListScope,
    ) -> std::result::Result<Vec<String>, RenderError> {
        let prefix = scope.prefix.as_deref().map(ObjectPath::from);
        let list_err =
            |e: object_store::Error| RenderError::io(format!("failed to list templates: {e}"));

        if scope.recursive {
            self.store
                .list(prefix.as_ref())
                .map_ok(|meta| meta.location.to_string())
                .try_collect()
                .await
                .map_err(list_err)
        } else {
            let listing = self
                .store
                .list_with_delimiter(prefix.as_ref())
                .await
                .map_err(list_err)?;
            Ok(listing
                .objects
                .into_iter()
                .map(|meta| meta.location.to_string())
                .collect())
        }
    }

    async fn read(&self, path: &str) -> std::result::Result<String, RenderError> {
        let location = ObjectPath::from(path);
        let bytes = self
            .store
            .get(&location)
            .await
            .map_err(|e| RenderError::io(format!("failed to read '{path}': {e}")))?
            .bytes()
            .await
            .map_err(|e| RenderError::io(format!("failed to read '{path}': {e}")))?;

        String::from_utf8(bytes.to_vec())
            .map_err(|_| RenderError::parse(format!("template '{path}' is not valid UTF-8")))
    }
}

fn open_s3(location: &str) -> Result<Arc<dyn ObjectStore>> {
    let url = Url::parse(location)
        .map_err(|e| ApiError::config(format!("Invalid template location '{location}': {e}")))?;
    let bucket = url
        .host_str()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::config(format!("No bucket in template location '{location}'")))?;

    let s3 = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .build()
        .map_err(|e| ApiError::config(format!("S3 template store: {e}")))?;

    let prefix = url.path().trim_matches('/');
    if prefix.is_empty() {
        Ok(Arc::new(s3) as Arc<dyn ObjectStore>)
    } else {
        Ok(Arc::new(PrefixStore::new(s3, prefix)) as Arc<dyn ObjectStore>)
    }
}

fn open_local(dir: PathBuf) -> Result<Arc<dyn ObjectStore>> {
    let absolute = dir.canonicalize().map_err(|e| {
        ApiError::config(format!(
            "Template directory '{}' is not accessible: {e}",
            dir.display()
        ))
    })?;

    LocalFileSystem::new_with_prefix(absolute)
        .map(|fs| Arc::new(fs) as Arc<dyn ObjectStore>)
        .map_err(|e| ApiError::config(format!("Local template store: {e}")))
}
