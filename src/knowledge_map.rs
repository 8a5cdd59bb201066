//! Knowledge map viewer.
//!
//! Fetches a document's node/edge graph and converts it into the element
//! list and stylesheet a graph-layout engine consumes (Cytoscape's JSON
//! shape). Layout itself happens elsewhere.
//!
//! # States
//!
//! ```text
//!  Idle ──load──▶ Loading ──ok──▶ Ready
//!                    │
//!                    └──err──▶ Failed(msg)
//! ```
//!
//! Every load replaces the previous graph wholesale. Each load takes a new
//! epoch; a response for an older epoch is dropped, so switching documents
//! while a fetch is in flight cannot paint the wrong graph.

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::Backend;
use crate::error::ApiError;
use crate::i18n::Language;
use crate::models::{KnowledgeMap, KnowledgeMapResponse, KnowledgeNode, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Handle for one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTicket {
    pub document_id: String,
    epoch: u64,
}

// ============ Layout-engine format ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphElement {
    pub data: ElementData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementData {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl GraphElement {
    pub fn is_edge(&self) -> bool {
        self.data.source.is_some()
    }
}

/// Visual variant for one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
    pub color: &'static str,
    pub shape: Option<&'static str>,
    pub font_size_px: Option<u8>,
    pub bold: bool,
}

pub const BASE_NODE_STYLE: NodeStyle = NodeStyle {
    color: "#6b7280",
    shape: None,
    font_size_px: Some(12),
    bold: false,
};

pub fn node_style(kind: NodeKind) -> NodeStyle {
    match kind {
        NodeKind::Chapter => NodeStyle {
            color: "#3b82f6",
            shape: None,
            font_size_px: Some(14),
            bold: true,
        },
        NodeKind::Topic => NodeStyle {
            color: "#10b981",
            ..NodeStyle::variant()
        },
        NodeKind::Formula => NodeStyle {
            color: "#f59e0b",
            shape: Some("rectangle"),
            ..NodeStyle::variant()
        },
        NodeKind::Example => NodeStyle {
            color: "#8b5cf6",
            shape: Some("ellipse"),
            ..NodeStyle::variant()
        },
        NodeKind::Unclassified => BASE_NODE_STYLE,
    }
}

impl NodeStyle {
    /// A variant only overrides what it sets; the rest inherits the base rule.
    const fn variant() -> Self {
        NodeStyle {
            color: BASE_NODE_STYLE.color,
            shape: None,
            font_size_px: None,
            bold: false,
        }
    }

    fn to_css(self) -> Value {
        let mut style = serde_json::Map::new();
        style.insert("background-color".into(), json!(self.color));
        if let Some(shape) = self.shape {
            style.insert("shape".into(), json!(shape));
        }
        if let Some(px) = self.font_size_px {
            style.insert("font-size".into(), json!(format!("{}px", px)));
        }
        if self.bold {
            style.insert("font-weight".into(), json!("bold"));
        }
        Value::Object(style)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleRule {
    pub selector: String,
    pub style: Value,
}

/// Stylesheet: base node rule, one rule per known kind, then edges.
pub fn stylesheet() -> Vec<StyleRule> {
    let mut base = BASE_NODE_STYLE.to_css();
    if let Value::Object(ref mut m) = base {
        m.insert("label".into(), json!("data(label)"));
        m.insert("color".into(), json!("#374151"));
        m.insert("text-valign".into(), json!("center"));
        m.insert("text-halign".into(), json!("center"));
    }

    let mut rules = vec![StyleRule {
        selector: "node".into(),
        style: base,
    }];

    for kind in [
        NodeKind::Chapter,
        NodeKind::Topic,
        NodeKind::Formula,
        NodeKind::Example,
    ] {
        rules.push(StyleRule {
            selector: format!("node[type=\"{}\"]", kind.as_str()),
            style: node_style(kind).to_css(),
        });
    }

    rules.push(StyleRule {
        selector: "edge".into(),
        style: json!({
            "width": 2,
            "line-color": "#d1d5db",
            "target-arrow-color": "#d1d5db",
            "target-arrow-shape": "triangle",
        }),
    });
    rules
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutOptions {
    pub name: &'static str,
    pub animate: bool,
    pub fit: bool,
    pub padding: u32,
}

pub const LAYOUT: LayoutOptions = LayoutOptions {
    name: "cose",
    animate: true,
    fit: true,
    padding: 50,
};

/// Nodes first, then edges. Edge ids are `"{source}-{target}"`.
pub fn to_elements(map: &KnowledgeMap) -> Vec<GraphElement> {
    let nodes = map.nodes.iter().map(|n| GraphElement {
        data: ElementData {
            id: n.id.clone(),
            label: Some(n.label.clone()),
            kind: Some(n.raw_type.clone()),
            source: None,
            target: None,
        },
    });
    let edges = map.edges.iter().map(|e| GraphElement {
        data: ElementData {
            id: format!("{}-{}", e.source, e.target),
            label: e.label.clone(),
            kind: None,
            source: Some(e.source.clone()),
            target: Some(e.target.clone()),
        },
    });
    nodes.chain(edges).collect()
}

// ============ Viewer ============

#[derive(Debug, Clone)]
pub struct MapViewer {
    language: Language,
    document_id: Option<String>,
    epoch: u64,
    state: MapState,
    map: KnowledgeMap,
    elements: Vec<GraphElement>,
    selected: Option<KnowledgeNode>,
}

impl MapViewer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            document_id: None,
            epoch: 0,
            state: MapState::Idle,
            map: KnowledgeMap::default(),
            elements: Vec::new(),
            selected: None,
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn map(&self) -> &KnowledgeMap {
        &self.map
    }

    pub fn elements(&self) -> &[GraphElement] {
        &self.elements
    }

    pub fn selected(&self) -> Option<&KnowledgeNode> {
        self.selected.as_ref()
    }

    /// Start a load. Returns `None` (and changes nothing) for an empty id.
    pub fn begin_load(&mut self, document_id: &str) -> Option<MapTicket> {
        if document_id.is_empty() {
            return None;
        }
        self.epoch += 1;
        self.document_id = Some(document_id.to_string());
        self.state = MapState::Loading;
        self.selected = None;
        Some(MapTicket {
            document_id: document_id.to_string(),
            epoch: self.epoch,
        })
    }

    /// Drop the current graph and any in-flight load. The viewer returns to
    /// `Idle` until the next `load`.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.document_id = None;
        self.state = MapState::Idle;
        self.map = KnowledgeMap::default();
        self.elements.clear();
        self.selected = None;
    }

    /// Apply a load result. Returns `false` if the ticket is stale and the
    /// result was discarded.
    pub fn finish_load(
        &mut self,
        ticket: &MapTicket,
        result: Result<KnowledgeMapResponse, ApiError>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            debug!(document_id = %ticket.document_id, "discarding stale knowledge map");
            return false;
        }

        match result {
            Ok(resp) => {
                self.map = KnowledgeMap::from(resp);
                self.elements = to_elements(&self.map);
                self.state = MapState::Ready;
            }
            Err(e) => {
                warn!(error = %e, document_id = %ticket.document_id, "failed to fetch knowledge map");
                self.map = KnowledgeMap::default();
                self.elements.clear();
                self.state = MapState::Failed(self.language.strings().load_map_failed.to_string());
            }
        }
        true
    }

    /// Fetch and apply the map for `document_id`.
    pub async fn load(&mut self, backend: &dyn Backend, document_id: &str) -> &MapState {
        if let Some(ticket) = self.begin_load(document_id) {
            let result = backend.knowledge_map(&ticket.document_id).await;
            self.finish_load(&ticket, result);
        }
        &self.state
    }

    /// Local selection only; no request. Unknown ids are ignored.
    pub fn select_node(&mut self, id: &str) -> Option<&KnowledgeNode> {
        if let Some(node) = self.map.nodes.iter().find(|n| n.id == id) {
            self.selected = Some(node.clone());
        }
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

/// Ask the backend to extract knowledge for a document. Returns the number
/// of chapters found, or the user-facing failure message.
pub async fn extract(
    backend: &dyn Backend,
    language: Language,
    document_id: &str,
    level: &str,
) -> Result<usize, String> {
    match backend.extract_knowledge(document_id, level).await {
        Ok(resp) => Ok(resp.chapters.len()),
        Err(e) => {
            warn!(error = %e, document_id, "knowledge extraction failed");
            Err(e.user_message(language.strings().extract_failed))
        }
    }
}

/// CLI entry point for `studyflow map <document_id>`.
pub async fn run_map(
    backend: &dyn Backend,
    language: Language,
    document_id: &str,
    as_json: bool,
) -> Result<()> {
    let mut viewer = MapViewer::new(language);
    if let MapState::Failed(msg) = viewer.load(backend, document_id).await {
        anyhow::bail!(msg.clone());
    }

    if as_json {
        let out = json!({
            "elements": viewer.elements(),
            "stylesheet": stylesheet(),
            "layout": LAYOUT,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let s = language.strings();
    let map = viewer.map();
    println!(
        "{} ({}): {} nodes, {} edges",
        s.knowledge_map,
        document_id,
        map.nodes.len(),
        map.edges.len()
    );
    println!();
    println!("{:<16} {:<12} {:<9} LABEL", "NODE", "TYPE", "COLOR");
    for n in &map.nodes {
        println!(
            "{:<16} {:<12} {:<9} {}",
            n.id,
            n.raw_type,
            node_style(n.kind).color,
            n.label
        );
    }
    if !map.edges.is_empty() {
        println!();
        for e in &map.edges {
            match &e.label {
                Some(label) => println!("{} -> {}  ({})", e.source, e.target, label),
                None => println!("{} -> {}", e.source, e.target),
            }
        }
    }
    Ok(())
}

/// CLI entry point for `studyflow extract <document_id>`.
pub async fn run_extract(
    backend: &dyn Backend,
    language: Language,
    document_id: &str,
    level: &str,
) -> Result<()> {
    match extract(backend, language, document_id, level).await {
        Ok(n) => {
            println!("extracted {} chapter(s) from {}", n, document_id);
            Ok(())
        }
        Err(msg) => anyhow::bail!(msg),
    }
}
