use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use classgate_core::{AppError, AppResult};

use crate::{ClassificationCode, ClassificationNode};

/// Validated in-memory index of a classification forest.
///
/// Construction rejects duplicate codes, dangling parent references and
/// cycles, so every traversal on a built index terminates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationTreeIndex {
    nodes: HashMap<ClassificationCode, ClassificationNode>,
    children: HashMap<ClassificationCode, Vec<ClassificationCode>>,
    roots: Vec<ClassificationCode>,
}

impl ClassificationTreeIndex {
    /// Builds an index and checks the forest invariant.
    pub fn build(nodes: impl IntoIterator<Item = ClassificationNode>) -> AppResult<Self> {
        let mut by_code: HashMap<ClassificationCode, ClassificationNode> = HashMap::new();
        for node in nodes {
            let code = node.code().clone();
            if by_code.insert(code.clone(), node).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate classification code '{code}'"
                )));
            }
        }

        let mut children: HashMap<ClassificationCode, Vec<ClassificationCode>> = HashMap::new();
        let mut roots = Vec::new();
        for node in by_code.values() {
            match node.parent_code() {
                Some(parent) if !by_code.contains_key(parent) => {
                    return Err(AppError::MalformedTree(format!(
                        "node '{}' references missing parent '{parent}'",
                        node.code()
                    )));
                }
                Some(parent) => children
                    .entry(parent.clone())
                    .or_default()
                    .push(node.code().clone()),
                None => roots.push(node.code().clone()),
            }
        }

        for codes in children.values_mut() {
            codes.sort();
        }
        roots.sort();

        let index = Self {
            nodes: by_code,
            children,
            roots,
        };
        index.ensure_acyclic()?;

        Ok(index)
    }

    /// Returns the number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the index holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether the code is a known node.
    #[must_use]
    pub fn contains(&self, code: &ClassificationCode) -> bool {
        self.nodes.contains_key(code)
    }

    /// Returns the node for a code.
    #[must_use]
    pub fn node(&self, code: &ClassificationCode) -> Option<&ClassificationNode> {
        self.nodes.get(code)
    }

    /// Returns all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &ClassificationNode> {
        self.nodes.values()
    }

    /// Returns the parent of a code, or `None` for roots and unknown codes.
    #[must_use]
    pub fn parent_of(&self, code: &ClassificationCode) -> Option<&ClassificationCode> {
        self.nodes.get(code).and_then(ClassificationNode::parent_code)
    }

    /// Returns the sorted direct children of a code.
    #[must_use]
    pub fn children_of(&self, code: &ClassificationCode) -> &[ClassificationCode] {
        self.children.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the sorted top-level codes.
    #[must_use]
    pub fn roots(&self) -> &[ClassificationCode] {
        self.roots.as_slice()
    }

    /// Returns the ancestor chain of a code, nearest parent first.
    #[must_use]
    pub fn ancestors(&self, code: &ClassificationCode) -> Vec<&ClassificationCode> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(code);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent_of(parent);
        }

        chain
    }

    /// Returns every code below `code`, optionally including `code` itself.
    ///
    /// Unknown codes are treated as leaves.
    #[must_use]
    pub fn descendants(
        &self,
        code: &ClassificationCode,
        include_self: bool,
    ) -> BTreeSet<ClassificationCode> {
        let mut result = BTreeSet::new();
        if include_self {
            result.insert(code.clone());
        }

        let mut queue: VecDeque<&ClassificationCode> =
            self.children_of(code).iter().collect();
        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                queue.extend(self.children_of(current));
            }
        }

        result
    }

    fn ensure_acyclic(&self) -> AppResult<()> {
        let mut visited: HashSet<&ClassificationCode> = HashSet::with_capacity(self.nodes.len());
        let mut queue: VecDeque<&ClassificationCode> = self.roots.iter().collect();
        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                queue.extend(self.children_of(current));
            }
        }

        if visited.len() == self.nodes.len() {
            return Ok(());
        }

        // Nodes unreachable from any root can only sit on a parent cycle.
        let mut stranded: Vec<&ClassificationCode> = self
            .nodes
            .keys()
            .filter(|code| !visited.contains(code))
            .collect();
        stranded.sort();

        Err(AppError::MalformedTree(format!(
            "parent cycle detected involving '{}'",
            stranded
                .first()
                .map(|code| code.as_str())
                .unwrap_or_default()
        )))
    }
}
