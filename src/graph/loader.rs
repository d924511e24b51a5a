//! Wire-format ingestion. Raw DTO shapes mirror the JSON tree one-to-one;
//! conversion into domain types drops malformed edges with a warning and
//! never drops nodes.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::LoadError;
use crate::models::{EdgeType, GraphEdge, GraphNode, NodeType, Tile};
use crate::requirements::Requirement;

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    x: i32,
    y: i32,
    #[serde(default)]
    z: i32,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    from: String,
    to: String,
    #[serde(rename = "type")]
    edge_type: String,
    #[serde(default)]
    cost_ticks: i64,
    #[serde(default)]
    bidirectional: bool,
    #[serde(default)]
    requirements: Vec<Value>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    #[serde(default)]
    from_plane: Option<i32>,
    #[serde(default)]
    to_plane: Option<i32>,
    #[serde(default)]
    object_id: Option<i32>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    agility_level: Option<i32>,
    #[serde(default)]
    failure_rate: f64,
    #[serde(default)]
    toll_cost: i64,
    #[serde(default)]
    free_passage_quest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
    #[serde(default)]
    regions: Vec<RawData>,
}

/// One converted node/edge set: the base document or a region overlay.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, Debug, Default)]
pub struct GraphDocument {
    pub base: GraphData,
    pub regions: Vec<GraphData>,
}

pub fn parse_graph(json: &str) -> Result<GraphDocument, LoadError> {
    let raw: RawDocument = serde_json::from_str(json)?;
    Ok(GraphDocument {
        base: convert(raw.nodes, raw.edges),
        regions: raw.regions.into_iter().map(|r| convert(r.nodes, r.edges)).collect(),
    })
}

fn convert(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> GraphData {
    let nodes: Vec<GraphNode> = nodes
        .into_iter()
        .map(|n| GraphNode {
            id: n.id,
            tile: Some(Tile::new(n.x, n.y, n.z)),
            node_type: n.node_type.as_deref().map_or(NodeType::Generic, NodeType::from_wire),
            tags: n.tags,
            metadata: n.metadata,
        })
        .collect();
    let edges = edges.into_iter().filter_map(convert_edge).collect();
    GraphData { nodes, edges }
}

fn convert_edge(raw: RawEdge) -> Option<GraphEdge> {
    let Some(edge_type) = EdgeType::from_wire(&raw.edge_type) else {
        warn!(from = %raw.from, to = %raw.to, kind = %raw.edge_type, "dropped_unknown_edge_type");
        return None;
    };
    let mut requirements = Vec::with_capacity(raw.requirements.len());
    for value in raw.requirements {
        match serde_json::from_value::<Requirement>(value) {
            Ok(req) => requirements.push(req),
            Err(err) => {
                warn!(from = %raw.from, to = %raw.to, %err, "dropped_edge_unknown_requirement");
                return None;
            }
        }
    }
    Some(GraphEdge {
        from: raw.from,
        to: raw.to,
        edge_type,
        cost_ticks: raw.cost_ticks,
        bidirectional: raw.bidirectional,
        requirements,
        metadata: raw.metadata,
        from_plane: raw.from_plane,
        to_plane: raw.to_plane,
        object_id: raw.object_id,
        action: raw.action,
        agility_level: raw.agility_level,
        failure_rate: raw.failure_rate,
        toll_cost: raw.toll_cost,
        free_passage_quest: raw.free_passage_quest,
    })
}
