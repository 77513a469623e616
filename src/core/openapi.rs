use crate::core::store::WorkflowSummary;
use serde_json::{json, Map, Value};

pub const OPENAPI_VERSION: &str = "3.0.0";
pub const API_TITLE: &str = "Workflow API Documentation";
pub const API_VERSION: &str = "1.0.0";

pub struct OpenApiGenerator<'a> {
    workflows: &'a [WorkflowSummary],
}

impl<'a> OpenApiGenerator<'a> {
    pub fn new(workflows: &'a [WorkflowSummary]) -> Self {
        Self { workflows }
    }

    pub fn map_type(type_name: &str) -> Value {
        match type_name {
            "int" => json!({"type": "integer"}),
            "str" => json!({"type": "string"}),
            "float" => json!({"type": "number"}),
            "list" => json!({"type": "array", "items": {"type": "string"}}),
            _ => json!({"type": "string"}),
        }
    }

    pub fn generate(&self) -> Value {
        let mut paths = Map::new();
        for workflow in self.workflows {
            paths.insert(
                format!("/api/connect/workflows/{}", workflow.name),
                json!({
                    "post": {
                        "summary": workflow.name,
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": request_schema(workflow)}}
                        },
                        "responses": {
                            "200": {
                                "description": "Success response",
                                "content": {"application/json": {"schema": response_schema(workflow)}}
                            }
                        }
                    }
                }),
            );
        }

        json!({
            "openapi": OPENAPI_VERSION,
            "info": {"title": API_TITLE, "version": API_VERSION},
            "paths": paths,
        })
    }
}

fn request_schema(workflow: &WorkflowSummary) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (group, fields) in &workflow.inputs {
        let group_properties: Map<String, Value> = fields
            .iter()
            .map(|(field, type_name)| (field.clone(), OpenApiGenerator::map_type(type_name)))
            .collect();

        let mut object_schema = json!({"type": "object", "properties": group_properties});
        if !fields.is_empty() {
            object_schema["required"] = json!(fields.keys().collect::<Vec<_>>());
        }

        // A group is either filled in or `false` to bypass its nodes.
        properties.insert(
            group.clone(),
            json!({"oneOf": [object_schema, {"type": "boolean", "enum": [false]}]}),
        );
        required.push(group.clone());
    }

    let mut schema = json!({"type": "object", "properties": properties});
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn response_schema(workflow: &WorkflowSummary) -> Value {
    let properties: Map<String, Value> = workflow
        .outputs
        .iter()
        .map(|output| {
            (
                output.clone(),
                json!({"type": "array", "items": {"type": "string"}}),
            )
        })
        .collect();
    json!({"type": "object", "properties": properties})
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn summary() -> WorkflowSummary {
        let mut sampler = BTreeMap::new();
        sampler.insert("seed".to_string(), "int".to_string());
        sampler.insert("cfg".to_string(), "float".to_string());
        let mut inputs = BTreeMap::new();
        inputs.insert("sampler".to_string(), sampler);
        inputs.insert("empty".to_string(), BTreeMap::new());

        WorkflowSummary {
            name: "portrait".to_string(),
            inputs,
            outputs: vec!["image".to_string()],
        }
    }

    #[test]
    fn test_generate_paths() {
        let workflows = vec![summary()];
        let spec = OpenApiGenerator::new(&workflows).generate();

        assert_eq!(spec["openapi"], "3.0.0");
        assert_eq!(spec["info"]["title"], "Workflow API Documentation");

        let post = &spec["paths"]["/api/connect/workflows/portrait"]["post"];
        assert_eq!(post["summary"], "portrait");

        let schema = &post["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(schema["required"], json!(["empty", "sampler"]));

        let sampler = &schema["properties"]["sampler"]["oneOf"];
        assert_eq!(sampler[0]["properties"]["seed"], json!({"type": "integer"}));
        assert_eq!(sampler[0]["properties"]["cfg"], json!({"type": "number"}));
        assert_eq!(sampler[0]["required"], json!(["cfg", "seed"]));
        assert_eq!(sampler[1], json!({"type": "boolean", "enum": [false]}));

        let empty = &schema["properties"]["empty"]["oneOf"][0];
        assert!(empty.get("required").is_none());

        let response = &post["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(response["properties"]["image"]["type"], "array");
    }

    #[test]
    fn test_no_workflows() {
        let spec = OpenApiGenerator::new(&[]).generate();
        assert_eq!(spec["paths"], json!({}));
    }

    #[test]
    fn test_unknown_type_is_string() {
        assert_eq!(OpenApiGenerator::map_type("dict"), json!({"type": "string"}));
        assert_eq!(
            OpenApiGenerator::map_type("list"),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }
}
