//! Route tree construction and traversal.
//!
//! # Responsibilities
//! - Build the segment tree from registered patterns
//! - Walk the tree for a request path, capturing dynamic segments
//! - Keep per-node method sets and handlers for terminal nodes
//! - Remember, per method, which raw pattern registered the handler
//!
//! # Design Decisions
//! - Nodes live in an arena (`Vec<Node>`) and refer to each other by `NodeId`
//! - A node has at most one parametric child and one wildcard child
//! - The first parameter name registered at a level wins; later names are ignored
//! - Literal children are always preferred; there is no backtracking
//! - A wildcard captures the whole trimmed request path and ends the walk

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::http::endpoint::Handler;
use crate::routing::params::{Params, ParamsPool};

/// Pattern segment (and parameter key) of a catch-all branch.
pub const WILDCARD: &str = "*";

/// Prefix marking a parametric pattern segment.
pub const PARAM_PREFIX: char = ':';

/// Index of a node inside the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node stands for in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Static,
    Param,
    CatchAll,
}

/// A vertex of the route tree.
pub struct Node {
    path: String,
    kind: NodeKind,
    children: HashMap<String, NodeId>,
    param_child: Option<NodeId>,
    param_name: Option<Arc<str>>,
    wildcard: Option<NodeId>,
    handlers: HashMap<Method, (Handler, Arc<str>)>,
}

impl Node {
    fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            children: HashMap::new(),
            param_child: None,
            param_name: None,
            wildcard: None,
            handlers: HashMap::new(),
        }
    }

    /// Segment or marker this node represents. Diagnostic only.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Name captured by this node's parametric child, if it has one.
    pub fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    /// Raw pattern that registered the handler for `method`.
    pub fn pattern(&self, method: &Method) -> Option<&Arc<str>> {
        self.handlers.get(method).map(|(_, pattern)| pattern)
    }

    /// True when at least one pattern ends here.
    pub fn is_terminal(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn handler(&self, method: &Method) -> Option<&Handler> {
        self.handlers.get(method).map(|(handler, _)| handler)
    }

    /// Accepted methods, sorted by name.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("param_name", &self.param_name)
            .field("wildcard", &self.wildcard)
            .field("methods", &self.methods())
            .finish()
    }
}

/// Result of a successful tree walk.
#[derive(Debug)]
pub struct Walk {
    pub node: NodeId,
    pub params: Option<Params>,
}

/// Arena-backed route tree.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    wildcard_key: Arc<str>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("", NodeKind::Root)],
            wildcard_key: Arc::from(WILDCARD),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn add_node(&mut self, path: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(path, kind));
        id
    }

    /// Register `handler` for `method` at the node `pattern` leads to.
    ///
    /// Re-registering a method on the same pattern replaces its handler.
    pub fn insert(&mut self, method: Method, pattern: &str, handler: Handler) -> NodeId {
        let mut id = self.root();
        for segment in split_segments(pattern) {
            id = if let Some(name) = segment.strip_prefix(PARAM_PREFIX) {
                self.param_child(id, name)
            } else if segment == WILDCARD {
                self.wildcard_child(id)
            } else {
                self.static_child(id, segment)
            };
        }

        self.node_mut(id)
            .handlers
            .insert(method, (handler, Arc::from(pattern)));
        id
    }

    fn static_child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        if let Some(&id) = self.node(parent).children.get(segment) {
            return id;
        }
        let id = self.add_node(segment, NodeKind::Static);
        self.node_mut(parent).children.insert(segment.to_string(), id);
        id
    }

    fn param_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let node = self.node(parent);
        if let Some(id) = node.param_child {
            if node.param_name() != Some(name) {
                tracing::debug!(
                    kept = node.param_name().unwrap_or_default(),
                    ignored = name,
                    "Parameter name conflicts with an existing branch"
                );
            }
            return id;
        }

        let id = self.add_node(format!("{PARAM_PREFIX}{name}"), NodeKind::Param);
        let node = self.node_mut(parent);
        node.param_child = Some(id);
        node.param_name = Some(Arc::from(name));
        id
    }

    fn wildcard_child(&mut self, parent: NodeId) -> NodeId {
        if let Some(id) = self.node(parent).wildcard {
            return id;
        }
        let id = self.add_node(WILDCARD, NodeKind::CatchAll);
        self.node_mut(parent).wildcard = Some(id);
        id
    }

    /// Walk the tree for `path`.
    ///
    /// Captured values go into a buffer taken from `pool` on the first
    /// capture. Returns `None` when some segment has no matching branch; the
    /// buffer is released in that case.
    pub fn walk(&self, path: &str, pool: Option<&Arc<ParamsPool>>) -> Option<Walk> {
        let mut id = self.root();
        let mut params: Option<Params> = None;

        for segment in split_segments(path) {
            let node = self.node(id);
            if let Some(&child) = node.children.get(segment) {
                id = child;
            } else if let (Some(child), Some(name)) = (node.param_child, &node.param_name) {
                capture(&mut params, pool).push(Arc::clone(name), segment);
                id = child;
            } else if let Some(child) = node.wildcard {
                capture(&mut params, pool).push(Arc::clone(&self.wildcard_key), path.trim_matches('/'));
                id = child;
                break;
            } else {
                return None;
            }
        }

        Some(Walk { node: id, params })
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

fn capture<'a>(params: &'a mut Option<Params>, pool: Option<&Arc<ParamsPool>>) -> &'a mut Params {
    params.get_or_insert_with(|| match pool {
        Some(pool) => pool.acquire(),
        None => Params::new(),
    })
}

/// Split a path or pattern into segments after trimming surrounding `/`.
///
/// An empty (or all-slash) input yields no segments.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.trim_matches('/');
    (!trimmed.is_empty())
        .then(|| trimmed.split('/'))
        .into_iter()
        .flatten()
}

/// Number of `:` and `*` characters in a raw pattern.
pub fn count_dynamic(pattern: &str) -> usize {
    pattern.bytes().filter(|b| matches!(b, b':' | b'*')).count()
}
