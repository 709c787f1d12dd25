use crate::routes::{BodyShape, FieldSource, QueryShape, Resource, Route, RouteDef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    Text,
    Boolean,
    Json,
    /// Comma-separated identifiers.
    IdList,
}

/// One input an operation reads from the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InputField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub default_value: Option<Value>,
    pub description: String,
}

impl InputField {
    fn text(name: &str, required: bool, description: String) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Text,
            required,
            default_value: if required { None } else { Some(json!("")) },
            description,
        }
    }

    /// The inputs a route reads, in path, body, query order.
    pub fn for_route(def: &RouteDef) -> Vec<InputField> {
        let mut fields: Vec<InputField> = def
            .path_params()
            .map(|name| InputField::text(name, true, format!("Identifier used in {}", def.path)))
            .collect();

        match def.body {
            BodyShape::None => {}
            BodyShape::Json(name) => fields.push(InputField {
                name: name.to_string(),
                field_type: FieldType::Json,
                required: false,
                default_value: Some(json!("{}")),
                description: "JSON object sent as the request body".to_string(),
            }),
            BodyShape::Fields(body) => {
                for field in body {
                    let input = match field.source {
                        FieldSource::Text(name) => {
                            InputField::text(name, true, format!("Sent as \"{}\"", field.key))
                        }
                        FieldSource::TextOr(name, default) => InputField {
                            default_value: Some(json!(default)),
                            ..InputField::text(name, false, format!("Sent as \"{}\"", field.key))
                        },
                        FieldSource::Flag(name, default) => InputField {
                            name: name.to_string(),
                            field_type: FieldType::Boolean,
                            required: false,
                            default_value: Some(json!(default)),
                            description: format!("Sent as \"{}\"", field.key),
                        },
                        FieldSource::IdList(name) => InputField {
                            name: name.to_string(),
                            field_type: FieldType::IdList,
                            required: true,
                            default_value: None,
                            description: format!("Comma-separated, sent as \"{}\"", field.key),
                        },
                        FieldSource::Const(_) => continue,
                    };
                    fields.push(input);
                }
            }
        }

        if let QueryShape::JsonFilter(name) = def.query {
            fields.push(InputField {
                name: name.to_string(),
                field_type: FieldType::Json,
                required: false,
                default_value: Some(json!("")),
                description: "JSON object sent as the query string; empty sends none".to_string(),
            });
        }

        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationDescription {
    pub value: String,
    pub name: String,
    pub method: String,
    pub path: String,
    pub inputs: Vec<InputField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceDescription {
    pub value: String,
    pub name: String,
    pub operations: Vec<OperationDescription>,
}

/// What a host needs to render the node: every resource, its operations
/// and the inputs each one reads.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeDescription {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub credentials: String,
    pub resources: Vec<ResourceDescription>,
}

impl NodeDescription {
    pub fn operation(&self, resource: &str, operation: &str) -> Option<&OperationDescription> {
        self.resources
            .iter()
            .find(|r| r.value == resource)?
            .operations
            .iter()
            .find(|o| o.value == operation)
    }
}

pub fn describe() -> NodeDescription {
    let resources = Resource::ALL
        .iter()
        .map(|resource| ResourceDescription {
            value: resource.as_str().to_string(),
            name: resource.display_name().to_string(),
            operations: resource.routes().map(describe_route).collect(),
        })
        .collect();

    NodeDescription {
        name: "frontapp".to_string(),
        display_name: "Frontapp".to_string(),
        description: "Consume the Frontapp API".to_string(),
        credentials: "frontappApi".to_string(),
        resources,
    }
}

fn describe_route(route: Route) -> OperationDescription {
    let def = route.definition();
    OperationDescription {
        value: def.operation.to_string(),
        name: def.name.to_string(),
        method: def.method.to_string(),
        path: def.path.to_string(),
        inputs: InputField::for_route(&def),
    }
}
