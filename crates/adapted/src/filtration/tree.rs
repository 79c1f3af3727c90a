//! Arena-backed filtration tree.

use std::fmt::Write as _;

use crate::process::ProcessError;

/// Index of a node inside its `FiltrationTree` arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One information cell.
///
/// Invariants (checked by `FiltrationTree::validate`):
/// - `subset` is the disjoint union of the children's subsets.
/// - `depth` equals the parent's depth plus one; the root has depth 0.
#[derive(Clone, Debug, PartialEq)]
pub struct FiltrationNode {
    pub label: String,
    pub depth: usize,
    pub subset: Vec<usize>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl FiltrationNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Nested partition of `{0, …, n-1}`; the root is always `NodeId(0)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FiltrationTree {
    nodes: Vec<FiltrationNode>,
}

impl FiltrationTree {
    /// Tree with a single root cell.
    pub fn new(root_subset: Vec<usize>) -> Self {
        Self::with_root_label("root", root_subset)
    }

    pub fn with_root_label(label: impl Into<String>, root_subset: Vec<usize>) -> Self {
        Self {
            nodes: vec![FiltrationNode {
                label: label.into(),
                depth: 0,
                subset: root_subset,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    /// Trivial filtration over `n` outcomes: the root reveals nothing, every
    /// outcome becomes its own leaf at depth 1.
    pub fn trivial(n: usize) -> Self {
        let mut tree = Self::new((0..n).collect());
        for i in 0..n {
            tree.add_child(tree.root(), vec![i]);
        }
        tree
    }

    /// Append a child cell below `parent`; children keep insertion order.
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, subset: Vec<usize>) -> NodeId {
        let label = format!("{}.{}", self.nodes[parent.0].label, self.nodes[parent.0].children.len());
        self.add_labeled_child(parent, label, subset)
    }

    pub fn add_labeled_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        subset: Vec<usize>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(FiltrationNode {
            label: label.into(),
            depth,
            subset,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &FiltrationNode {
        &self.nodes[id.0]
    }

    /// Number of nodes (cells across all depths).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in pre-order (parent before children, children in insertion order).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Maximum depth over all nodes.
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Finest cells in pre-order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[id.0].is_leaf())
            .collect()
    }

    /// Cells at depth `t` in pre-order; stable across calls.
    pub fn nodes_at_depth(&self, t: usize) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[id.0].depth == t)
            .collect()
    }

    /// Check that the tree is a filtration of `{0, …, n-1}`.
    ///
    /// - the root cell contains every index exactly once;
    /// - no cell is empty and depths increase by one per level;
    /// - every inner cell is the disjoint union of its children.
    ///
    /// Together these imply that the leaf cells partition the index set.
    pub fn validate(&self, n: usize) -> Result<(), ProcessError> {
        let root = &self.nodes[0];
        if root.depth != 0 || root.parent.is_some() {
            return Err(ProcessError::filtration("root must have depth 0 and no parent"));
        }
        let mut seen = vec![false; n];
        for &i in &root.subset {
            if i >= n {
                return Err(ProcessError::filtration(format!(
                    "root subset holds index {i} but the process has {n} outcomes"
                )));
            }
            if std::mem::replace(&mut seen[i], true) {
                return Err(ProcessError::filtration(format!(
                    "root subset repeats index {i}"
                )));
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(ProcessError::filtration(format!(
                "root subset misses index {missing}"
            )));
        }
        for id in self.preorder() {
            let node = &self.nodes[id.0];
            if node.subset.is_empty() {
                return Err(ProcessError::filtration(format!(
                    "cell '{}' is empty",
                    node.label
                )));
            }
            if node.is_leaf() {
                continue;
            }
            let mut owner = vec![None::<NodeId>; n];
            for &i in &node.subset {
                owner[i] = Some(id);
            }
            let mut covered = 0usize;
            for &child in &node.children {
                let c = &self.nodes[child.0];
                if c.depth != node.depth + 1 || c.parent != Some(id) {
                    return Err(ProcessError::filtration(format!(
                        "cell '{}' has inconsistent depth or parent link",
                        c.label
                    )));
                }
                for &i in &c.subset {
                    match owner.get(i).copied().flatten() {
                        Some(o) if o == id => {
                            owner[i] = Some(child);
                            covered += 1;
                        }
                        Some(_) => {
                            return Err(ProcessError::filtration(format!(
                                "index {i} appears in two children of '{}'",
                                node.label
                            )))
                        }
                        None => {
                            return Err(ProcessError::filtration(format!(
                                "child '{}' holds index {i} outside its parent '{}'",
                                c.label, node.label
                            )))
                        }
                    }
                }
            }
            if covered != node.subset.len() {
                return Err(ProcessError::filtration(format!(
                    "children of '{}' cover {covered} of {} indices",
                    node.label,
                    node.subset.len()
                )));
            }
        }
        Ok(())
    }

    /// Graphviz DOT text, one box per cell labelled with its subset.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph filtration {\n    node [shape=box];\n");
        for id in self.preorder() {
            let node = &self.nodes[id.0];
            let subset: Vec<String> = node.subset.iter().map(|i| i.to_string()).collect();
            let _ = writeln!(
                out,
                "    n{} [label=\"{}\\n{{{}}}\"];",
                id.0,
                node.label.replace('"', "\\\""),
                subset.join(",")
            );
            if let Some(parent) = node.parent {
                let _ = writeln!(out, "    n{} -> n{};", parent.0, id.0);
            }
        }
        out.push_str("}\n");
        out
    }
}
