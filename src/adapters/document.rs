use crate::core::{Document, DocumentContext, DocumentSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Serializes the document by reading it from disk at publish time.
#[derive(Debug, Clone)]
pub struct JsonFileDocument {
    path: PathBuf,
}

impl JsonFileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for JsonFileDocument {
    async fn serialize(&self) -> Result<Document> {
        let content = tokio::fs::read(&self.path).await?;
        let mut document: Value = serde_json::from_slice(&content)?;

        // `{ "output": {...} }` as produced by the editor's graph-to-prompt export.
        if let Some(output) = document.get_mut("output").filter(|o| o.is_object()) {
            return Ok(output.take());
        }
        Ok(document)
    }
}

/// Sidecar file remembering the last endpoint name of a document.
#[derive(Debug, Clone)]
pub struct ContextFile {
    path: PathBuf,
}

impl ContextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `workflow.json` → `workflow.json.connect.json`
    pub fn beside(document: &Path) -> Self {
        let mut name = document.as_os_str().to_owned();
        name.push(".connect.json");
        Self::new(PathBuf::from(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable sidecar yields an empty context.
    pub async fn load(&self) -> DocumentContext {
        match tokio::fs::read(&self.path).await {
            Ok(content) => serde_json::from_slice(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring context file {}: {}", self.path.display(), e);
                DocumentContext::default()
            }),
            Err(_) => DocumentContext::default(),
        }
    }

    pub async fn save(&self, context: &DocumentContext) -> Result<()> {
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(context)?).await?;
        Ok(())
    }
}
