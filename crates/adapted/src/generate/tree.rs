//! Probability trees of states (the raw experiments filtrations are read from).

/// Index into an `ExperimentTree`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// One state: absolute probability of reaching it and its value.
#[derive(Clone, Debug, PartialEq)]
pub struct StateNode {
    pub label: String,
    /// Probability of the path root → this node (root has 1).
    pub p: f64,
    pub s: f64,
    pub depth: usize,
    pub children: Vec<StateId>,
    pub parent: Option<StateId>,
}

/// Arena tree of states; the root is `StateId(0)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentTree {
    nodes: Vec<StateNode>,
}

impl ExperimentTree {
    pub fn new(label: impl Into<String>, s: f64) -> Self {
        Self {
            nodes: vec![StateNode {
                label: label.into(),
                p: 1.0,
                s,
                depth: 0,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn add_child(
        &mut self,
        parent: StateId,
        label: impl Into<String>,
        p: f64,
        s: f64,
    ) -> StateId {
        let id = StateId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(StateNode {
            label: label.into(),
            p,
            s,
            depth,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    #[inline]
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    #[inline]
    pub fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn preorder(&self) -> Vec<StateId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Leaves in pre-order; position in this list is the outcome index.
    pub fn leaves(&self) -> Vec<StateId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[id.0].children.is_empty())
            .collect()
    }

    /// Values `s` along root → `id`.
    pub fn path(&self, id: StateId) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.nodes[id.0].depth + 1);
        let mut cur = Some(id);
        while let Some(c) = cur {
            values.push(self.nodes[c.0].s);
            cur = self.nodes[c.0].parent;
        }
        values.reverse();
        values
    }
}
