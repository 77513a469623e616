use crate::core::store::WorkflowStore;
use crate::core::workflow::Workflow;
use crate::core::PromptRunner;
use crate::utils::error::{ConnectError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Ids given to nodes borrowed from other workflows start after this one.
pub const CACHED_NODE_KEY_START: u64 = 1000;

pub struct WorkflowExecutor<R: PromptRunner> {
    store: WorkflowStore,
    runner: R,
    input_dir: PathBuf,
    http: Client,
}

impl<R: PromptRunner> WorkflowExecutor<R> {
    pub fn new(store: WorkflowStore, runner: R, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            runner,
            input_dir: input_dir.into(),
            http: Client::new(),
        }
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    /// Builds the prompt that would be sent to ComfyUI for `name` and `params`.
    pub async fn prepare(&self, name: &str, params: &Map<String, Value>) -> Result<Workflow> {
        let mut workflow = self.store.get(name).await?;
        workflow.bypass_nodes("!bypass");

        let mut key = CACHED_NODE_KEY_START;
        for node in self.store.cached_nodes_except(name).await {
            key += 1;
            workflow.insert_node(key.to_string(), node);
        }

        for (tag, payload) in params {
            match payload {
                Value::Bool(false) => {
                    workflow.bypass_nodes(&format!("${}", tag));
                    workflow.bypass_nodes(&format!("#{}", tag));
                }
                Value::Object(inputs) => {
                    for (input_name, value) in inputs {
                        self.apply_input(&mut workflow, tag, input_name, value)
                            .await?;
                    }
                }
                _ => {}
            }
        }

        Ok(workflow)
    }

    async fn apply_input(
        &self,
        workflow: &mut Workflow,
        tag: &str,
        input_name: &str,
        value: &Value,
    ) -> Result<()> {
        let Value::Object(spec) = value else {
            return workflow.update_tagged_input(tag, input_name, value.clone());
        };

        if spec.get("type").and_then(Value::as_str) != Some("file") {
            return Ok(());
        }

        match self.materialize_file(spec).await {
            Ok(Some(filename)) => {
                tracing::info!("File {} specified into {}.{}", filename, tag, input_name);
                if let Err(e) =
                    workflow.update_tagged_input(tag, input_name, Value::String(filename.clone()))
                {
                    tracing::error!("Error writing file {} : {}", filename, e);
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let filename = spec
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown file");
                tracing::error!("Error writing file {} : {}", filename, e);
                Ok(())
            }
        }
    }

    /// Writes an uploaded or downloaded file into the input directory and
    /// returns its name. Existing files are reused as-is.
    async fn materialize_file(&self, spec: &Map<String, Value>) -> Result<Option<String>> {
        let non_empty = |key: &str| {
            spec.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };

        if let Some(content) = non_empty("content") {
            let filename = non_empty("name").ok_or_else(|| ConnectError::FileInputError {
                name: "unknown file".to_string(),
                message: "File name is required with content.".to_string(),
            })?;
            let path = self.input_path(filename)?;
            if tokio::fs::try_exists(&path).await? {
                tracing::info!("File {} already exists, using existing file", filename);
            } else {
                tokio::fs::write(&path, STANDARD.decode(content)?).await?;
            }
            return Ok(Some(filename.to_string()));
        }

        if let Some(url) = non_empty("url") {
            let filename = match non_empty("name") {
                Some(name) => name.to_string(),
                None => url.rsplit('/').next().unwrap_or_default().to_string(),
            };
            let path = self.input_path(&filename)?;
            if tokio::fs::try_exists(&path).await? {
                tracing::info!("File {} already exists, using existing file", filename);
            } else {
                let bytes = self
                    .http
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                tokio::fs::write(&path, &bytes).await?;
                tracing::info!("File {} downloaded from {}", filename, url);
            }
            return Ok(Some(filename));
        }

        tracing::warn!(
            "No valid content/url for {}",
            non_empty("name").unwrap_or("unknown file")
        );
        Ok(None)
    }

    fn input_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(ConnectError::FileInputError {
                name: filename.to_string(),
                message: "File name must be a plain file name".to_string(),
            });
        }
        Ok(self.input_dir.join(filename))
    }

    /// Runs a stored workflow and returns its images keyed by output tag name.
    /// A single image is returned bare, several as a list.
    pub async fn execute(
        &self,
        name: &str,
        params: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<Map<String, Value>> {
        tokio::fs::create_dir_all(&self.input_dir).await?;
        let workflow = self.prepare(name, params).await?;
        let prompt = workflow.clone().into_value();
        let images = self.runner.run_prompt(&prompt, token).await?;

        let mut response = Map::new();
        for (node_id, mut node_images) in images {
            let value = if node_images.len() == 1 {
                Value::String(node_images.remove(0))
            } else {
                Value::from(node_images)
            };
            for tag in workflow.node_tags(&node_id) {
                response.insert(tag[1..].to_string(), value.clone());
            }
        }

        Ok(response)
    }
}
