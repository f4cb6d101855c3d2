//! Declarative node surface.
//!
//! The host introspects nodes through declared rows: input fields with
//! types/defaults/constraints, typed outputs, and display names. This is
//! the single registry for the whole pack; operations live in `ops`.

use serde::{Deserialize, Serialize};

pub const NODE_SURFACE_KIND: &str = "latchq.node_surface.v1";
pub const NODE_SURFACE_SCHEMA: u32 = 1;

/// Category shown by the host for every latchq node.
pub const NODE_CATEGORY: &str = "latchq";

/// The full declared surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSurface {
    pub schema: u32,
    pub surface_kind: String,
    pub nodes: Vec<NodeSpec>,
}

/// One node declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

/// One declared input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub name: String,
    #[serde(flatten)]
    pub field: FieldSpec,
}

/// Field type, default, and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    String { default: String },
    Bool { default: bool },
    Int { default: i64, min: i64, max: i64 },
    Choice { options: Vec<String>, default: String },
    /// Opaque latent payload port.
    Latent,
    /// Opaque conditioning payload port.
    Conditioning,
}

/// One declared output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    pub name: String,
    pub kind: String,
}

fn input(name: &str, field: FieldSpec) -> InputSpec {
    InputSpec {
        name: name.to_string(),
        field,
    }
}

fn output(name: &str, kind: &str) -> OutputSpec {
    OutputSpec {
        name: name.to_string(),
        kind: kind.to_string(),
    }
}

fn choice(options: &[&str], default: &str) -> FieldSpec {
    FieldSpec::Choice {
        options: options.iter().map(|o| o.to_string()).collect(),
        default: default.to_string(),
    }
}

fn node(
    name: &str,
    display_name: &str,
    inputs: Vec<InputSpec>,
    outputs: Vec<OutputSpec>,
) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        display_name: display_name.to_string(),
        category: NODE_CATEGORY.to_string(),
        inputs,
        outputs,
    }
}

fn pick_inputs(with_extensions: bool) -> Vec<InputSpec> {
    let mut inputs = vec![
        input(
            "root_dir",
            FieldSpec::String {
                default: String::new(),
            },
        ),
        input(
            "index",
            FieldSpec::Int {
                default: 0,
                min: -1_000_000,
                max: 1_000_000,
            },
        ),
        input(
            "sort",
            choice(
                &["natural", "name", "name_desc", "mtime", "mtime_desc"],
                "natural",
            ),
        ),
        input(
            "on_out_of_range",
            choice(&["wrap", "clamp", "error"], "wrap"),
        ),
        input(
            "include",
            FieldSpec::String {
                default: String::new(),
            },
        ),
        input(
            "exclude",
            FieldSpec::String {
                default: String::new(),
            },
        ),
    ];
    if with_extensions {
        inputs.push(input(
            "extensions",
            FieldSpec::String {
                default: String::new(),
            },
        ));
    }
    inputs.push(input(
        "max_list_items",
        FieldSpec::Int {
            default: 20,
            min: 0,
            max: 500,
        },
    ));
    inputs
}

fn pick_outputs() -> Vec<OutputSpec> {
    vec![
        output("path", "string"),
        output("name", "string"),
        output("stem", "string"),
        output("index", "int"),
        output("total", "int"),
        output("preview", "string"),
    ]
}

/// Declare every node in the pack.
pub fn node_surface() -> NodeSurface {
    let queue_name = || {
        input(
            "queue_name",
            FieldSpec::String {
                default: "default".to_string(),
            },
        )
    };
    let storage = || input("storage", choice(&["memory", "disk"], "memory"));

    NodeSurface {
        schema: NODE_SURFACE_SCHEMA,
        surface_kind: NODE_SURFACE_KIND.to_string(),
        nodes: vec![
            node(
                "SaveTriplet",
                "Save Latent + Cond (Queue)",
                vec![
                    input("latent", FieldSpec::Latent),
                    input("positive", FieldSpec::Conditioning),
                    input("negative", FieldSpec::Conditioning),
                    storage(),
                    queue_name(),
                    input("store_device", choice(&["cpu", "keep"], "cpu")),
                ],
                vec![
                    output("latent", "latent"),
                    output("positive", "conditioning"),
                    output("negative", "conditioning"),
                    output("status", "string"),
                ],
            ),
            node(
                "LoadTriplet",
                "Load Latent + Cond (Queue)",
                vec![
                    storage(),
                    queue_name(),
                    input("consume", FieldSpec::Bool { default: true }),
                    input("reset_cursor", FieldSpec::Bool { default: false }),
                    input(
                        "index",
                        FieldSpec::Int {
                            default: -1,
                            min: -1,
                            max: 1_000_000,
                        },
                    ),
                    input("load_device", choice(&["auto", "cpu"], "auto")),
                ],
                vec![
                    output("latent", "latent"),
                    output("positive", "conditioning"),
                    output("negative", "conditioning"),
                    output("cursor", "int"),
                    output("status", "string"),
                ],
            ),
            node(
                "QueueStatus",
                "Queue Status",
                vec![
                    storage(),
                    queue_name(),
                    input("reset_cursor", FieldSpec::Bool { default: false }),
                    input(
                        "max_list_items",
                        FieldSpec::Int {
                            default: 20,
                            min: 0,
                            max: 500,
                        },
                    ),
                ],
                vec![
                    output("total", "int"),
                    output("cursor", "int"),
                    output("unread", "int"),
                    output("preview", "string"),
                ],
            ),
            node(
                "PickSubdirectory",
                "Pick Subdirectory (Index)",
                pick_inputs(false),
                pick_outputs(),
            ),
            node(
                "PickFileByIndex",
                "Pick File By Index",
                pick_inputs(true),
                pick_outputs(),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_declares_all_five_nodes() {
        let surface = node_surface();
        let names: Vec<&str> = surface.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SaveTriplet",
                "LoadTriplet",
                "QueueStatus",
                "PickSubdirectory",
                "PickFileByIndex"
            ]
        );
        assert!(surface.nodes.iter().all(|n| n.category == NODE_CATEGORY));
    }

    #[test]
    fn only_the_file_picker_declares_extensions() {
        let surface = node_surface();
        let has_ext = |name: &str| {
            surface
                .nodes
                .iter()
                .find(|n| n.name == name)
                .expect("node should exist")
                .inputs
                .iter()
                .any(|i| i.name == "extensions")
        };
        assert!(has_ext("PickFileByIndex"));
        assert!(!has_ext("PickSubdirectory"));
    }

    #[test]
    fn load_index_defaults_to_unset() {
        let surface = node_surface();
        let load = surface
            .nodes
            .iter()
            .find(|n| n.name == "LoadTriplet")
            .expect("LoadTriplet should exist");
        let index = load
            .inputs
            .iter()
            .find(|i| i.name == "index")
            .expect("index input should exist");
        assert!(matches!(
            index.field,
            FieldSpec::Int { default: -1, min: -1, .. }
        ));
    }

    #[test]
    fn surface_serializes_with_stable_kind() {
        let encoded =
            serde_json::to_value(node_surface()).expect("surface should serialize");
        assert_eq!(encoded["surfaceKind"], NODE_SURFACE_KIND);
        assert_eq!(encoded["schema"], 1);
        assert!(encoded["nodes"].as_array().expect("nodes array").len() == 5);
    }
}
