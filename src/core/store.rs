use crate::core::workflow::{TaggedInputs, Workflow};
use crate::utils::error::{ConnectError, Result};
use crate::utils::validation::validate_endpoint_name;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub inputs: TaggedInputs,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedNode {
    pub workflow_name: String,
    pub node: Value,
}

#[derive(Debug, Default)]
struct StoreState {
    workflows: BTreeMap<String, Value>,
    cached_nodes: Vec<CachedNode>,
}

impl StoreState {
    fn refresh_cached_nodes(&mut self) {
        self.cached_nodes = self
            .workflows
            .iter()
            .filter_map(|(name, value)| {
                Workflow::from_value(value.clone())
                    .ok()
                    .map(|workflow| (name, workflow))
            })
            .flat_map(|(name, workflow)| {
                workflow
                    .tagged_nodes(Some("!cache"))
                    .into_iter()
                    .map(|tagged| CachedNode {
                        workflow_name: name.clone(),
                        node: tagged.node,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
    }
}

/// Published workflows, one `<name>.json` file each, mirrored in memory.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    dir: PathBuf,
    state: Arc<RwLock<StoreState>>,
}

impl WorkflowStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let mut state = StoreState::default();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            match load_file(&path).await {
                Ok(workflow) => {
                    state.workflows.insert(name.to_string(), workflow);
                }
                Err(e) => {
                    tracing::error!("Error loading file '{}': {}", path.display(), e);
                }
            }
        }

        state.refresh_cached_nodes();
        tracing::info!(
            "Loaded {} workflows from {}",
            state.workflows.len(),
            dir.display()
        );

        Ok(Self {
            dir,
            state: Arc::new(RwLock::new(state)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Writes the workflow under `name`, replacing any previous one.
    pub async fn save(&self, name: &str, workflow: Value) -> Result<()> {
        validate_endpoint_name(name)?;
        Workflow::from_value(workflow.clone())?;

        let mut state = self.state.write().await;
        tokio::fs::write(self.file_path(name), serde_json::to_vec(&workflow)?).await?;
        state.workflows.insert(name.to_string(), workflow);
        state.refresh_cached_nodes();

        tracing::info!("Saved workflow '{}'", name);
        Ok(())
    }

    /// Deleting an unknown workflow is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_endpoint_name(name)?;

        let mut state = self.state.write().await;
        match tokio::fs::remove_file(self.file_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        state.workflows.remove(name);
        state.refresh_cached_nodes();

        tracing::info!("Deleted workflow '{}'", name);
        Ok(())
    }

    pub async fn names(&self) -> Vec<String> {
        self.state.read().await.workflows.keys().cloned().collect()
    }

    pub async fn get(&self, name: &str) -> Result<Workflow> {
        let state = self.state.read().await;
        let value = state
            .workflows
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectError::WorkflowNotFound {
                name: name.to_string(),
            })?;
        Workflow::from_value(value)
    }

    pub async fn summary(&self, name: &str) -> Result<WorkflowSummary> {
        let workflow = self.get(name).await?;
        Ok(WorkflowSummary {
            name: name.to_string(),
            inputs: workflow.tagged_inputs(),
            outputs: workflow.tagged_outputs(),
        })
    }

    pub async fn summaries(&self) -> Result<Vec<WorkflowSummary>> {
        let mut summaries = Vec::new();
        for name in self.names().await {
            summaries.push(self.summary(&name).await?);
        }
        Ok(summaries)
    }

    pub async fn cached_nodes(&self) -> Vec<CachedNode> {
        self.state.read().await.cached_nodes.clone()
    }

    /// `!cache` nodes of every workflow other than `name`.
    pub async fn cached_nodes_except(&self, name: &str) -> Vec<Value> {
        self.state
            .read()
            .await
            .cached_nodes
            .iter()
            .filter(|cached| cached.workflow_name != name)
            .map(|cached| cached.node.clone())
            .collect()
    }
}

async fn load_file(path: &Path) -> Result<Value> {
    let content = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cached_workflow(title: &str) -> Value {
        json!({
            "1": {"class_type": "Loader", "inputs": {}, "_meta": {"title": title}},
            "2": {"class_type": "KSampler", "inputs": {"seed": 1}, "_meta": {"title": "$sampler #image"}}
        })
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::open(dir.path()).await.unwrap();

        store.save("portrait", cached_workflow("x")).await.unwrap();
        assert!(dir.path().join("portrait.json").exists());
        assert_eq!(store.names().await, vec!["portrait".to_string()]);

        let summary = store.summary("portrait").await.unwrap();
        assert_eq!(summary.inputs["sampler"]["seed"], "int");
        assert_eq!(summary.outputs, vec!["image".to_string()]);

        store.delete("portrait").await.unwrap();
        assert!(!dir.path().join("portrait.json").exists());
        assert!(matches!(
            store.get("portrait").await,
            Err(ConnectError::WorkflowNotFound { .. })
        ));

        store.delete("portrait").await.unwrap();
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::open(dir.path()).await.unwrap();

        store.save("same", json!({"1": {"inputs": {"v": 1}}})).await.unwrap();
        store.save("same", json!({"1": {"inputs": {"v": 2}}})).await.unwrap();

        let workflow = store.get("same").await.unwrap();
        assert_eq!(workflow.nodes()["1"]["inputs"]["v"], json!(2));

        let reopened = WorkflowStore::open(dir.path()).await.unwrap();
        let workflow = reopened.get("same").await.unwrap();
        assert_eq!(workflow.nodes()["1"]["inputs"]["v"], json!(2));
    }

    #[tokio::test]
    async fn test_open_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.json"), r#"{"1": {}}"#).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = WorkflowStore::open(dir.path()).await.unwrap();
        assert_eq!(store.names().await, vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_bad_names_and_documents() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.save("../escape", json!({})).await,
            Err(ConnectError::InvalidNameError { .. })
        ));
        assert!(matches!(
            store.save("list", json!([1])).await,
            Err(ConnectError::InvalidWorkflowError { .. })
        ));
        assert!(store.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_cached_nodes_index() {
        let dir = TempDir::new().unwrap();
        let store = WorkflowStore::open(dir.path()).await.unwrap();

        store.save("a", cached_workflow("Loader !cache")).await.unwrap();
        store.save("b", cached_workflow("Loader")).await.unwrap();

        let cached = store.cached_nodes().await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].workflow_name, "a");

        assert!(store.cached_nodes_except("a").await.is_empty());
        assert_eq!(store.cached_nodes_except("b").await.len(), 1);

        store.delete("a").await.unwrap();
        assert!(store.cached_nodes().await.is_empty());
    }
}
