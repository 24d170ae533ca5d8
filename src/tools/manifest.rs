use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, RouteFlowError};

/// What a model sees when a tool is bound: name, description and input schema.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ToolField>,
}

impl ToolSpec {
    pub fn builder(name: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder::new(name)
    }

    /// JSON schema of the input object, as sent in a function declaration.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.inputs {
            let mut property = json!({ "type": field.field_type.as_str() });
            if let Some(description) = &field.description {
                property["description"] = json!(description);
            }
            properties.insert(field.name.clone(), property);
            if field.required {
                required.push(json!(field.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Builds a spec from a remote tool's JSON schema. Unknown types fall back
    /// to string.
    pub fn from_json_schema(name: &str, description: Option<&str>, schema: &Value) -> Self {
        let required: Vec<&str> = schema["required"]
            .as_array()
            .map(|values| values.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let inputs = schema["properties"]
            .as_object()
            .map(|properties| {
                properties
                    .iter()
                    .map(|(field_name, info)| ToolField {
                        name: field_name.clone(),
                        field_type: FieldType::from_json_type(info["type"].as_str()),
                        required: required.contains(&field_name.as_str()),
                        description: info["description"].as_str().map(|s| s.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            description: description
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("Tool: {}", name)),
            inputs,
        }
    }

    /// Checks required fields and primitive types. Extra keys are accepted.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<()> {
        for field in &self.inputs {
            match input.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(RouteFlowError::InvalidArguments {
                        tool: self.name.clone(),
                        reason: format!("missing required field `{}`", field.name),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.field_type.accepts(value) => {
                    return Err(RouteFlowError::InvalidArguments {
                        tool: self.name.clone(),
                        reason: format!(
                            "field `{}` expects {}, got `{}`",
                            field.name,
                            field.field_type.as_str(),
                            value
                        ),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    fn from_json_type(value: Option<&str>) -> Self {
        match value {
            Some("integer") => FieldType::Integer,
            Some("number") => FieldType::Number,
            Some("boolean") => FieldType::Boolean,
            _ => FieldType::String,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ToolSpecBuilder {
    spec: ToolSpec,
}

impl ToolSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: ToolSpec {
                name: name.into(),
                description: String::new(),
                inputs: Vec::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn input(mut self, field: ToolField) -> Self {
        self.spec.inputs.push(field);
        self
    }

    pub fn build(self) -> ToolSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_spec() -> ToolSpec {
        ToolSpec::builder("search")
            .description("find facts")
            .input(
                ToolField::new("query", FieldType::String)
                    .required()
                    .with_description("text to look up"),
            )
            .input(ToolField::new("limit", FieldType::Integer))
            .build()
    }

    #[test]
    fn parameters_schema_lists_required_fields() {
        let schema = search_spec().parameters_schema();
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn validate_reports_missing_and_mistyped_fields() {
        let spec = search_spec();
        let missing = Map::new();
        assert!(spec.validate(&missing).is_err());

        let mut wrong = Map::new();
        wrong.insert("query".into(), json!("q"));
        wrong.insert("limit".into(), json!("ten"));
        assert!(spec.validate(&wrong).is_err());

        let mut ok = Map::new();
        ok.insert("query".into(), json!("q"));
        ok.insert("limit".into(), json!(10));
        assert!(spec.validate(&ok).is_ok());
    }

    #[test]
    fn from_json_schema_maps_types() {
        let schema = json!({
            "type": "object",
            "properties": {
                "warehouse_id": {"type": "string"},
                "limit": {"type": "integer"},
                "ratio": {"type": "number"},
                "verbose": {"type": "boolean"},
                "tags": {"type": "array"}
            },
            "required": ["warehouse_id"]
        });
        let spec = ToolSpec::from_json_schema("list_tables", None, &schema);
        assert_eq!(spec.description, "Tool: list_tables");
        let field = |n: &str| spec.inputs.iter().find(|f| f.name == n).unwrap().clone();
        assert!(field("warehouse_id").required);
        assert_eq!(field("limit").field_type, FieldType::Integer);
        assert_eq!(field("ratio").field_type, FieldType::Number);
        assert_eq!(field("verbose").field_type, FieldType::Boolean);
        assert_eq!(field("tags").field_type, FieldType::String);
    }
}
