//! In-process document tree standing in for the host page DOM
//!
//! The host kanban application owns the real element lifecycle; this module
//! models the slice of it the overlay needs: elements with tags, class
//! lists, attributes, ordered children, and text nodes. Every mutating
//! operation appends a [`MutationRecord`] to a journal, which is what the
//! watcher classifies - exactly like the record stream a subtree observer
//! would deliver. The journal doubles as the write counter the idempotence
//! tests probe.

use indexmap::IndexMap;

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Tag used for text nodes.
pub const TEXT_TAG: &str = "#text";

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: Option<String>,
}

/// What a single mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children added to / removed from the target
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute (or the class list) of the target changed
    Attribute { name: String },
    /// The text payload of a text node changed
    CharacterData,
}

/// One observed mutation, in the shape a subtree observer reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

/// Arena-backed document tree with a mutation journal.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    journal: Vec<MutationRecord>,
}

impl Dom {
    /// A fresh document with a bare root element.
    pub fn new() -> Self {
        let root_node = Node {
            tag: "body".to_string(),
            classes: Vec::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            text: None,
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
            journal: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ===================
    // Construction
    // ===================

    /// Create a detached element. No mutation is journaled until it is
    /// inserted somewhere.
    pub fn create_element(&mut self, tag: &str, classes: &[&str]) -> NodeId {
        self.push_node(Node {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            text: None,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(Node {
            tag: TEXT_TAG.to_string(),
            classes: Vec::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            text: Some(text.to_string()),
        })
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // ===================
    // Structure
    // ===================

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` immediately before `before`, or append when `before`
    /// is absent or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.detach_quiet(child);
        let index = before
            .and_then(|b| self.nodes[parent.0].children.iter().position(|&c| c == b))
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.journal.push(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![child],
                removed: vec![],
            },
        });
    }

    /// Detach a node from its parent. No-op for detached nodes.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent {
            self.detach_quiet(node);
            self.journal.push(MutationRecord {
                target: parent,
                kind: MutationKind::ChildList {
                    added: vec![],
                    removed: vec![node],
                },
            });
        }
    }

    fn detach_quiet(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.last().copied()
    }

    // ===================
    // Node data
    // ===================

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].classes
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    /// Add a class if missing. Journals an `Attribute { "class" }` record,
    /// matching how class mutations surface to an observer.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node.0].classes.push(class.to_string());
            self.journal.push(MutationRecord {
                target: node,
                kind: MutationKind::Attribute {
                    name: "class".to_string(),
                },
            });
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
        self.journal.push(MutationRecord {
            target: node,
            kind: MutationKind::Attribute {
                name: name.to_string(),
            },
        });
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if self.nodes[node.0].attributes.shift_remove(name).is_some() {
            self.journal.push(MutationRecord {
                target: node,
                kind: MutationKind::Attribute {
                    name: name.to_string(),
                },
            });
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].text.as_deref()
    }

    /// Set the payload of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = Some(text.to_string());
        self.journal.push(MutationRecord {
            target: node,
            kind: MutationKind::CharacterData,
        });
    }

    // ===================
    // Queries
    // ===================

    /// First descendant of `scope` (excluding `scope` itself) carrying the
    /// class, depth-first document order.
    pub fn find_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.has_class(n, class))
    }

    /// All descendants of `scope` carrying the class, document order.
    pub fn find_all_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    /// True if `node` is still reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // ===================
    // Mutation journal
    // ===================

    /// Drain the journal, handing the accumulated records to the watcher.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.journal)
    }

    /// Writes journaled since the last drain. The idempotence tests use
    /// this as their write counter.
    pub fn pending_mutations(&self) -> usize {
        self.journal.len()
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
