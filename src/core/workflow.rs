//! Tag-aware view over an API-format ComfyUI prompt.
//!
//! Nodes are tagged through their `_meta.title`:
//!
//! * `$name` exposes the node's inputs under `name`; `$name()` exposes none
//!   and `$name(a, b)` only `a` and `b`.
//! * `#name` marks the node's images as the `name` output.
//! * `!name` is internal (`!bypass`, `!cache`).

use crate::utils::error::{ConnectError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$[a-zA-Z0-9_-]+|#[a-zA-Z0-9_-]+|![a-zA-Z0-9_-]+)(\(([^)]*)\))?")
            .expect("tag pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Input,
    Output,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Sigil plus name, e.g. `$prompt`.
    pub base: String,
    pub kind: TagKind,
    pub name: String,
    /// `None` without parentheses, otherwise the listed input names.
    pub filter: Option<Vec<String>>,
}

impl Tag {
    pub fn parse_all(title: &str) -> Vec<Tag> {
        tag_pattern()
            .captures_iter(title)
            .map(|caps| {
                let base = caps[1].to_string();
                let kind = match base.as_bytes()[0] {
                    b'$' => TagKind::Input,
                    b'#' => TagKind::Output,
                    _ => TagKind::Internal,
                };
                let filter = caps.get(3).map(|inner| {
                    inner
                        .as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                });
                Tag {
                    name: base[1..].to_string(),
                    base,
                    kind,
                    filter,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TaggedNode {
    pub id: String,
    pub node: Value,
    pub tags: Vec<Tag>,
}

impl TaggedNode {
    pub fn has_tag(&self, base: &str) -> bool {
        self.tags.iter().any(|t| t.base == base)
    }
}

/// Tag name → input name → scalar type name.
pub type TaggedInputs = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    nodes: Map<String, Value>,
}

impl Workflow {
    pub fn new(nodes: Map<String, Value>) -> Self {
        Self { nodes }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(nodes) => Ok(Self { nodes }),
            other => Err(ConnectError::InvalidWorkflowError {
                message: format!("expected an object of nodes, got {}", type_name(&other)),
            }),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.nodes)
    }

    pub fn nodes(&self) -> &Map<String, Value> {
        &self.nodes
    }

    pub fn insert_node(&mut self, id: impl Into<String>, node: Value) {
        self.nodes.insert(id.into(), node);
    }

    pub fn tagged_nodes(&self, filter: Option<&str>) -> Vec<TaggedNode> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| {
                let title = node.pointer("/_meta/title").and_then(Value::as_str)?;
                let tags = Tag::parse_all(title);
                if tags.is_empty() {
                    return None;
                }
                Some(TaggedNode {
                    id: id.clone(),
                    node: node.clone(),
                    tags,
                })
            })
            .filter(|tagged| filter.map_or(true, |base| tagged.has_tag(base)))
            .collect()
    }

    /// Base tags (`$x`, `#y`, `!z`) of one node.
    pub fn node_tags(&self, node_id: &str) -> Vec<String> {
        self.tagged_nodes(None)
            .into_iter()
            .find(|tagged| tagged.id == node_id)
            .map(|tagged| tagged.tags.into_iter().map(|t| t.base).collect())
            .unwrap_or_default()
    }

    pub fn tagged_inputs(&self) -> TaggedInputs {
        let mut inputs_by_tag = TaggedInputs::new();

        for tagged in self.tagged_nodes(None) {
            let node_inputs = tagged.node.get("inputs").and_then(Value::as_object);

            for tag in tagged.tags.iter().filter(|t| t.kind == TagKind::Input) {
                let group = inputs_by_tag.entry(tag.name.clone()).or_default();
                let Some(node_inputs) = node_inputs else {
                    continue;
                };

                for (key, value) in node_inputs {
                    let exposed = match &tag.filter {
                        None => true,
                        Some(only) => only.iter().any(|name| name == key),
                    };
                    if exposed {
                        group.insert(key.clone(), type_name(value).to_string());
                    }
                }
            }
        }

        inputs_by_tag
    }

    /// Output tag names; `#name(...)` does not count as an output.
    pub fn tagged_outputs(&self) -> Vec<String> {
        let outputs: BTreeSet<String> = self
            .tagged_nodes(None)
            .into_iter()
            .flat_map(|tagged| tagged.tags)
            .filter(|tag| tag.kind == TagKind::Output && tag.filter.is_none())
            .map(|tag| tag.name)
            .collect();
        outputs.into_iter().collect()
    }

    pub fn update_tagged_input(&mut self, tag: &str, input_key: &str, value: Value) -> Result<()> {
        let inputs = self.tagged_inputs();
        let exposed = inputs.get(tag).ok_or_else(|| ConnectError::TagInputError {
            message: format!(
                "No inputs available for tag '{}'. Ensure this tag exists and is not excluded.",
                tag
            ),
        })?;

        if !exposed.contains_key(input_key) {
            return Err(ConnectError::TagInputError {
                message: format!(
                    "The input '{}' does not exist for tag '{}' (possibly not in the filtered list?).",
                    input_key, tag
                ),
            });
        }

        let tagged = self.tagged_nodes(Some(&format!("${}", tag)));
        if tagged.is_empty() {
            return Err(ConnectError::TagInputError {
                message: format!("Could not update node: no node with tag '{}' found.", tag),
            });
        }

        for node in tagged {
            let slot = self
                .nodes
                .get_mut(&node.id)
                .and_then(|n| n.get_mut("inputs"))
                .and_then(Value::as_object_mut)
                .and_then(|inputs| inputs.get_mut(input_key))
                .ok_or_else(|| ConnectError::TagInputError {
                    message: format!(
                        "Could not update node: no input '{}' in node with tag '{}' (node found at id {}).",
                        input_key, tag, node.id
                    ),
                })?;

            tracing::debug!(
                "Updating input '{}' of node {} with tag '{}'",
                input_key,
                node.id,
                tag
            );
            *slot = value.clone();
        }

        Ok(())
    }

    /// Removes every node carrying `tag` and reconnects its consumers to the
    /// removed node's own input wire of the same (lower, singular) name.
    pub fn bypass_nodes(&mut self, tag: &str) {
        for skipped in self.tagged_nodes(Some(tag)) {
            tracing::debug!(
                "Bypassing node {} (id {}) tagged {}",
                class_type(&skipped.node),
                skipped.id,
                tag
            );
            // Live copy: earlier passes may have rewired its inputs.
            let Some(removed) = self.nodes.remove(&skipped.id) else {
                continue;
            };

            let wires: BTreeMap<String, Value> = removed
                .get("inputs")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
                .filter(|(_, value)| value.is_array())
                .map(|(name, value)| (lower_singular(name), value.clone()))
                .collect();

            for (ref_id, ref_node) in self.nodes.iter_mut() {
                let ref_class = class_type(ref_node).to_string();
                let Some(inputs) = ref_node.get_mut("inputs").and_then(Value::as_object_mut)
                else {
                    continue;
                };

                for (input_name, input_value) in inputs.iter_mut() {
                    if !wired_to(input_value, &skipped.id) {
                        continue;
                    }
                    match wires.get(&lower_singular(input_name)) {
                        Some(wire) => *input_value = wire.clone(),
                        None => tracing::warn!(
                            "Could not find wire for {} in {} (id {})",
                            input_name,
                            ref_class,
                            ref_id
                        ),
                    }
                }
            }
        }
    }
}

fn wired_to(input: &Value, node_id: &str) -> bool {
    match input.as_array().and_then(|wire| wire.first()) {
        Some(Value::String(id)) => id == node_id,
        Some(Value::Number(id)) => id.to_string() == node_id,
        _ => false,
    }
}

fn lower_singular(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_suffix('s') {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

fn class_type(node: &Value) -> &str {
    node.get("class_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

/// Scalar type names as exposed in workflow summaries.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
