use crate::unit::{RenderedUnit, UnitKind};

/// Handle to a node owned by a [`Surface`].
///
/// Ids are only meaningful for the surface that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A collapsible wrapper materialized from a run of groupable units.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// Derived caption, e.g. "2 tool calls · Thought for 12s".
    pub label: String,
    /// Aggregate status: true when any member currently shows an error.
    pub has_errors: bool,
    /// Set while the live turn is still open; a streaming group shows
    /// neither a success nor an error icon.
    pub streaming: bool,
    /// Expand/collapse flag; groups start collapsed.
    pub expanded: bool,
}

impl Group {
    pub fn new(label: impl Into<String>, streaming: bool) -> Self {
        Self {
            label: label.into(),
            has_errors: false,
            streaming,
            expanded: false,
        }
    }
}

enum NodeKind {
    Root,
    Unit(RenderedUnit),
    Group(Group),
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Flat structural view of a surface, used by replay/streaming equivalence
/// checks, tests, and text dumps.
#[derive(Clone, Debug, PartialEq)]
pub enum OutlineNode {
    Unit {
        kind: UnitKind,
        caption: String,
    },
    Group {
        label: String,
        has_errors: bool,
        streaming: bool,
        members: Vec<OutlineNode>,
    },
}

/// UI-agnostic transcript container: an id-indexed node arena exposing only
/// the capabilities the grouping engine needs — append child, insert before,
/// remove, child listing, and node lookup.
///
/// Detached nodes stay allocated for the lifetime of the surface; a
/// transcript never churns enough nodes for reclamation to matter.
pub struct Surface {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Surface {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// The implicit top-level container.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a unit node and appends it to `parent`.
    pub fn append_unit(&mut self, parent: NodeId, unit: RenderedUnit) -> NodeId {
        let id = self.alloc(NodeKind::Unit(unit));
        self.append_child(parent, id);
        id
    }

    /// Creates a detached group node; attach it with [`Surface::insert_before`]
    /// or [`Surface::append_child`].
    pub fn create_group(&mut self, group: Group) -> NodeId {
        self.alloc(NodeKind::Group(group))
    }

    /// Moves `child` to the end of `parent`'s children, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Moves `child` into `parent` immediately before `before`. Falls back to
    /// appending when the anchor is not among `parent`'s children.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|existing| *existing == before) {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detaches `node` from its parent; the node becomes unreachable.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn unit(&self, node: NodeId) -> Option<&RenderedUnit> {
        match &self.nodes[node.0].kind {
            NodeKind::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn unit_mut(&mut self, node: NodeId) -> Option<&mut RenderedUnit> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn group(&self, node: NodeId) -> Option<&Group> {
        match &self.nodes[node.0].kind {
            NodeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, node: NodeId) -> Option<&mut Group> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Depth-first search below `from` for a unit matching `predicate`.
    pub fn find_descendant(
        &self,
        from: NodeId,
        predicate: impl Fn(&RenderedUnit) -> bool,
    ) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if let Some(unit) = self.unit(node)
                && predicate(unit)
            {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Structural snapshot starting at the root.
    pub fn outline(&self) -> Vec<OutlineNode> {
        self.outline_of(self.root)
    }

    fn outline_of(&self, node: NodeId) -> Vec<OutlineNode> {
        self.children(node)
            .iter()
            .map(|child| match &self.nodes[child.0].kind {
                NodeKind::Unit(unit) => OutlineNode::Unit {
                    kind: unit.kind,
                    caption: unit.caption.clone(),
                },
                NodeKind::Group(group) => OutlineNode::Group {
                    label: group.label.clone(),
                    has_errors: group.has_errors,
                    streaming: group.streaming,
                    members: self.outline_of(*child),
                },
                NodeKind::Root => OutlineNode::Unit {
                    kind: UnitKind::Text,
                    caption: String::new(),
                },
            })
            .collect()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0]
                .children
                .retain(|child| *child != node);
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::RenderedUnit;

    fn captions(surface: &Surface, node: NodeId) -> Vec<String> {
        surface
            .children(node)
            .iter()
            .filter_map(|child| surface.unit(*child))
            .map(|unit| unit.caption.clone())
            .collect()
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut surface = Surface::new();
        let root = surface.root();
        surface.append_unit(root, RenderedUnit::text("a"));
        surface.append_unit(root, RenderedUnit::text("b"));
        surface.append_unit(root, RenderedUnit::text("c"));
        assert_eq!(captions(&surface, root), vec!["a", "b", "c"]);
    }

    #[test]
    fn insert_before_places_node_at_anchor() {
        let mut surface = Surface::new();
        let root = surface.root();
        let a = surface.append_unit(root, RenderedUnit::text("a"));
        surface.append_unit(root, RenderedUnit::text("b"));
        let group = surface.create_group(Group::new("g", false));
        surface.insert_before(root, group, a);
        assert_eq!(surface.children(root)[0], group);
        assert_eq!(surface.parent(group), Some(root));
    }

    #[test]
    fn append_child_relocates_between_parents() {
        let mut surface = Surface::new();
        let root = surface.root();
        let a = surface.append_unit(root, RenderedUnit::text("a"));
        let group = surface.create_group(Group::new("g", false));
        surface.append_child(root, group);
        surface.append_child(group, a);
        assert_eq!(surface.children(group), &[a]);
        assert_eq!(surface.parent(a), Some(group));
        assert_eq!(surface.children(root), &[group]);
    }

    #[test]
    fn remove_detaches_from_parent() {
        let mut surface = Surface::new();
        let root = surface.root();
        let a = surface.append_unit(root, RenderedUnit::text("a"));
        surface.remove(a);
        assert!(surface.children(root).is_empty());
        assert_eq!(surface.parent(a), None);
    }

    #[test]
    fn find_descendant_reaches_into_groups() {
        let mut surface = Surface::new();
        let root = surface.root();
        let group = surface.create_group(Group::new("g", false));
        surface.append_child(root, group);
        surface.append_unit(group, RenderedUnit::text("inner"));
        let found = surface.find_descendant(root, |unit| unit.caption == "inner");
        assert!(found.is_some());
    }

    #[test]
    fn outline_mirrors_the_tree() {
        let mut surface = Surface::new();
        let root = surface.root();
        surface.append_unit(root, RenderedUnit::text("before"));
        let group = surface.create_group(Group::new("2 tool calls", false));
        surface.append_child(root, group);
        surface.append_unit(group, RenderedUnit::new(UnitKind::ToolCall, "Bash: ls"));
        let outline = surface.outline();
        assert_eq!(outline.len(), 2);
        match &outline[1] {
            OutlineNode::Group { label, members, .. } => {
                assert_eq!(label, "2 tool calls");
                assert_eq!(members.len(), 1);
            }
            other => panic!("expected group, got {other:?}"),
        }
    }
}
