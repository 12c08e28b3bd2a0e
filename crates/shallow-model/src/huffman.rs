//! Huffman tree over output classes for hierarchical softmax.
//!
//! Nodes live in one flat array: ids `0..C` are leaves (classes), ids
//! `C..2C-1` are internal nodes in creation order, and the root is `2C-2`.
//! Internal node `n` owns output-table row `n - C`.

/// One node of the tree. Links are node ids into [`HuffmanTree::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub weight: f64,
    /// Set on the second child chosen at each merge; its code bit is 1.
    pub is_right: bool,
}

impl Node {
    fn unlinked(weight: f64) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            weight,
            is_right: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Immutable Huffman tree plus the per-class path and code tables.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    paths: Vec<Vec<usize>>,
    codes: Vec<Vec<bool>>,
    classes: usize,
}

impl HuffmanTree {
    /// Build the tree from per-class frequencies.
    ///
    /// `counts` must be sorted in non-decreasing order: the merge keeps one
    /// cursor over leaves (lowest weight first) and one over internal nodes
    /// (created in non-decreasing weight order), and always takes the lighter
    /// head. Unsorted input still yields a full binary tree, but not a
    /// minimum-weight one; debug builds assert the order.
    ///
    /// # Panics
    ///
    /// Panics if `counts` is empty.
    pub fn build(counts: &[u64]) -> Self {
        assert!(!counts.is_empty(), "cannot build a tree over zero classes");
        debug_assert!(
            counts.windows(2).all(|w| w[0] <= w[1]),
            "class frequencies must be sorted in non-decreasing order"
        );

        let classes = counts.len();
        let mut nodes: Vec<Node> = counts.iter().map(|&c| Node::unlinked(c as f64)).collect();
        nodes.extend((classes..2 * classes - 1).map(|_| Node::unlinked(f64::INFINITY)));

        let mut leaf = 0;
        let mut node = classes;
        for i in classes..2 * classes - 1 {
            let mut pick = [0usize; 2];
            for slot in pick.iter_mut() {
                if leaf < classes && nodes[leaf].weight < nodes[node].weight {
                    *slot = leaf;
                    leaf += 1;
                } else {
                    *slot = node;
                    node += 1;
                }
            }
            let [first, second] = pick;
            nodes[i].left = Some(first);
            nodes[i].right = Some(second);
            nodes[i].weight = nodes[first].weight + nodes[second].weight;
            nodes[first].parent = Some(i);
            nodes[second].parent = Some(i);
            nodes[second].is_right = true;
        }

        let mut paths = Vec::with_capacity(classes);
        let mut codes = Vec::with_capacity(classes);
        for class in 0..classes {
            let mut path = Vec::new();
            let mut code = Vec::new();
            let mut j = class;
            while let Some(parent) = nodes[j].parent {
                path.push(parent - classes);
                code.push(nodes[j].is_right);
                j = parent;
            }
            paths.push(path);
            codes.push(code);
        }

        Self {
            nodes,
            paths,
            codes,
            classes,
        }
    }

    /// Number of leaves.
    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Output-table rows on the way from `class` up to the root.
    pub fn path(&self, class: usize) -> &[usize] {
        &self.paths[class]
    }

    /// Branch bits aligned with [`path`](Self::path), leaf side first.
    pub fn code(&self, class: usize) -> &[bool] {
        &self.codes[class]
    }

    /// Longest code length over all classes.
    pub fn depth(&self) -> usize {
        self.codes.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Follow a leaf-first code from the root and return the leaf reached.
    ///
    /// Returns `None` if the code ends on an internal node or runs past a leaf.
    pub fn decode(&self, code: &[bool]) -> Option<usize> {
        let mut id = self.root();
        for &bit in code.iter().rev() {
            let node = &self.nodes[id];
            id = if bit { node.right? } else { node.left? };
        }
        self.nodes[id].is_leaf().then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequent_class_gets_shortest_code() {
        let tree = HuffmanTree::build(&[1, 1, 2, 4]);
        assert_eq!(tree.nodes().len(), 7);
        assert_eq!(tree.code(3).len(), 1);
        assert_eq!(tree.code(2).len(), 2);
        assert_eq!(tree.code(0).len(), 3);
        assert_eq!(tree.code(1).len(), 3);
        assert_eq!(tree.node(tree.root()).weight, 8.0);
    }

    #[test]
    fn test_paths_are_internal_rows() {
        let tree = HuffmanTree::build(&[1, 1, 2, 4]);
        for class in 0..4 {
            assert_eq!(tree.path(class).len(), tree.code(class).len());
            assert!(tree.path(class).iter().all(|&row| row < 3));
            // Last step of every path is the root, row C - 2
            assert_eq!(*tree.path(class).last().unwrap(), 2);
        }
    }

    #[test]
    fn test_decode_reaches_every_leaf() {
        let tree = HuffmanTree::build(&[1, 2, 3, 5, 8, 13]);
        for class in 0..tree.classes() {
            assert_eq!(tree.decode(tree.code(class)), Some(class));
        }
        assert_eq!(tree.decode(&[]), None);
    }

    #[test]
    fn test_two_classes() {
        let tree = HuffmanTree::build(&[3, 9]);
        assert_eq!(tree.root(), 2);
        assert_eq!(tree.code(0), &[false]);
        assert_eq!(tree.code(1), &[true]);
        assert_eq!(tree.path(0), &[0]);
    }

    #[test]
    fn test_single_class_has_empty_path() {
        let tree = HuffmanTree::build(&[5]);
        assert_eq!(tree.root(), 0);
        assert!(tree.path(0).is_empty());
        assert_eq!(tree.depth(), 0);
    }
}
