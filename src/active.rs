use slab::Slab;

use crate::element::ElementId;

/// Key of a node in [`ActiveEdges`].
pub type EdgeKey = usize;

#[derive(Debug)]
struct Node {
    element: ElementId,
    parent: Option<EdgeKey>,
    left: Option<EdgeKey>,
    right: Option<EdgeKey>,
    red: bool,
}

/// The ordered set of elements crossing the sweep line.
///
/// This is a red-black tree whose order is purely positional: callers
/// decide where a node goes (see [`ActiveEdges::insert_after`]), and
/// may walk the tree from the root to search it. Nodes live in a
/// `Slab`; a node keeps its key for as long as it is in the tree, so
/// elements can hold on to it.
#[derive(Debug, Default)]
pub struct ActiveEdges {
    nodes: Slab<Node>,
    root: Option<EdgeKey>,
}

impl ActiveEdges {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<EdgeKey> {
        self.root
    }

    #[inline]
    pub fn left(&self, key: EdgeKey) -> Option<EdgeKey> {
        self.nodes[key].left
    }

    #[inline]
    pub fn right(&self, key: EdgeKey) -> Option<EdgeKey> {
        self.nodes[key].right
    }

    #[inline]
    pub fn element(&self, key: EdgeKey) -> ElementId {
        self.nodes[key].element
    }

    #[inline]
    pub fn set_element(&mut self, key: EdgeKey, element: ElementId) {
        self.nodes[key].element = element;
    }

    pub fn front(&self) -> Option<EdgeKey> {
        self.root.map(|r| self.leftmost(r))
    }

    pub fn back(&self) -> Option<EdgeKey> {
        self.root.map(|r| self.rightmost(r))
    }

    /// In-order successor.
    pub fn next(&self, key: EdgeKey) -> Option<EdgeKey> {
        if let Some(r) = self.nodes[key].right {
            return Some(self.leftmost(r));
        }
        let mut key = key;
        while let Some(p) = self.nodes[key].parent {
            if self.nodes[p].left == Some(key) {
                return Some(p);
            }
            key = p;
        }
        None
    }

    /// In-order predecessor.
    pub fn previous(&self, key: EdgeKey) -> Option<EdgeKey> {
        if let Some(l) = self.nodes[key].left {
            return Some(self.rightmost(l));
        }
        let mut key = key;
        while let Some(p) = self.nodes[key].parent {
            if self.nodes[p].right == Some(key) {
                return Some(p);
            }
            key = p;
        }
        None
    }

    /// Insert `element` right after the node `after`, or at the front if
    /// `after` is `None`. Returns the key of the new node.
    pub fn insert_after(&mut self, after: Option<EdgeKey>, element: ElementId) -> EdgeKey {
        let key = self.nodes.insert(Node {
            element,
            parent: None,
            left: None,
            right: None,
            red: true,
        });

        let root = match self.root {
            None => {
                self.root = Some(key);
                self.nodes[key].red = false;
                return key;
            }
            Some(root) => root,
        };

        match after {
            None => {
                let first = self.leftmost(root);
                self.nodes[first].left = Some(key);
                self.nodes[key].parent = Some(first);
            }
            Some(after) => match self.nodes[after].right {
                None => {
                    self.nodes[after].right = Some(key);
                    self.nodes[key].parent = Some(after);
                }
                Some(r) => {
                    let succ = self.leftmost(r);
                    self.nodes[succ].left = Some(key);
                    self.nodes[key].parent = Some(succ);
                }
            },
        }
        self.insert_fixup(key);
        key
    }

    /// Remove the node `key`. The keys of all other nodes are unchanged.
    pub fn remove(&mut self, key: EdgeKey) {
        let z = key;
        let mut removed_red = self.nodes[z].red;
        let x;
        let x_parent;

        match (self.nodes[z].left, self.nodes[z].right) {
            (None, right) => {
                x = right;
                x_parent = self.nodes[z].parent;
                self.transplant(z, right);
            }
            (left, None) => {
                x = left;
                x_parent = self.nodes[z].parent;
                self.transplant(z, left);
            }
            (Some(z_left), Some(z_right)) => {
                let y = self.leftmost(z_right);
                removed_red = self.nodes[y].red;
                x = self.nodes[y].right;
                if self.nodes[y].parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.nodes[y].parent;
                    self.transplant(y, x);
                    self.nodes[y].right = Some(z_right);
                    self.nodes[z_right].parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.nodes[y].left = Some(z_left);
                self.nodes[z_left].parent = Some(y);
                self.nodes[y].red = self.nodes[z].red;
            }
        }

        if !removed_red {
            self.remove_fixup(x, x_parent);
        }
        self.nodes.remove(z);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn leftmost(&self, mut key: EdgeKey) -> EdgeKey {
        while let Some(l) = self.nodes[key].left {
            key = l;
        }
        key
    }

    fn rightmost(&self, mut key: EdgeKey) -> EdgeKey {
        while let Some(r) = self.nodes[key].right {
            key = r;
        }
        key
    }

    #[inline]
    fn is_red(&self, key: Option<EdgeKey>) -> bool {
        key.map_or(false, |k| self.nodes[k].red)
    }

    #[inline]
    fn set_black(&mut self, key: Option<EdgeKey>) {
        if let Some(k) = key {
            self.nodes[k].red = false;
        }
    }

    /// Point the link that referenced `old` (from its parent or the
    /// root) at `new`.
    fn replace_child(&mut self, parent: Option<EdgeKey>, old: EdgeKey, new: Option<EdgeKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    debug_assert_eq!(self.nodes[p].right, Some(old));
                    self.nodes[p].right = new;
                }
            }
        }
    }

    /// Replace the subtree at `u` by the subtree at `v`.
    fn transplant(&mut self, u: EdgeKey, v: Option<EdgeKey>) {
        let parent = self.nodes[u].parent;
        self.replace_child(parent, u, v);
        if let Some(v) = v {
            self.nodes[v].parent = parent;
        }
    }

    fn rotate_left(&mut self, x: EdgeKey) {
        let y = self.nodes[x]
            .right
            .expect("rotate_left: node must have a right child");
        let y_left = self.nodes[y].left;
        self.nodes[x].right = y_left;
        if let Some(b) = y_left {
            self.nodes[b].parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: EdgeKey) {
        let y = self.nodes[x]
            .left
            .expect("rotate_right: node must have a left child");
        let y_right = self.nodes[y].right;
        self.nodes[x].left = y_right;
        if let Some(b) = y_right {
            self.nodes[b].parent = Some(x);
        }
        self.transplant(x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: EdgeKey) {
        while let Some(p) = self.nodes[z].parent.filter(|&p| self.nodes[p].red) {
            // A red node is never the root.
            let g = self.nodes[p]
                .parent
                .expect("insert_fixup: red node without parent");
            if self.nodes[g].left == Some(p) {
                let uncle = self.nodes[g].right;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.set_black(uncle);
                    self.nodes[g].red = true;
                    z = g;
                } else {
                    let mut p = p;
                    if self.nodes[p].right == Some(z) {
                        z = p;
                        self.rotate_left(z);
                        p = self.nodes[z].parent.expect("rotated node has a parent");
                    }
                    self.nodes[p].red = false;
                    self.nodes[g].red = true;
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.nodes[g].left;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.set_black(uncle);
                    self.nodes[g].red = true;
                    z = g;
                } else {
                    let mut p = p;
                    if self.nodes[p].left == Some(z) {
                        z = p;
                        self.rotate_right(z);
                        p = self.nodes[z].parent.expect("rotated node has a parent");
                    }
                    self.nodes[p].red = false;
                    self.nodes[g].red = true;
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_black(root);
    }

    fn remove_fixup(&mut self, mut x: Option<EdgeKey>, mut parent: Option<EdgeKey>) {
        while x != self.root && !self.is_red(x) {
            let p = match parent {
                Some(p) => p,
                None => break,
            };
            if self.nodes[p].left == x {
                let mut w = self.nodes[p]
                    .right
                    .expect("remove_fixup: missing sibling");
                if self.nodes[w].red {
                    self.nodes[w].red = false;
                    self.nodes[p].red = true;
                    self.rotate_left(p);
                    w = self.nodes[p].right.expect("remove_fixup: missing sibling");
                }
                if !self.is_red(self.nodes[w].left) && !self.is_red(self.nodes[w].right) {
                    self.nodes[w].red = true;
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if !self.is_red(self.nodes[w].right) {
                        let wl = self.nodes[w].left;
                        self.set_black(wl);
                        self.nodes[w].red = true;
                        self.rotate_right(w);
                        w = self.nodes[p].right.expect("remove_fixup: missing sibling");
                    }
                    self.nodes[w].red = self.nodes[p].red;
                    self.nodes[p].red = false;
                    let wr = self.nodes[w].right;
                    self.set_black(wr);
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let mut w = self.nodes[p]
                    .left
                    .expect("remove_fixup: missing sibling");
                if self.nodes[w].red {
                    self.nodes[w].red = false;
                    self.nodes[p].red = true;
                    self.rotate_right(p);
                    w = self.nodes[p].left.expect("remove_fixup: missing sibling");
                }
                if !self.is_red(self.nodes[w].left) && !self.is_red(self.nodes[w].right) {
                    self.nodes[w].red = true;
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if !self.is_red(self.nodes[w].left) {
                        let wr = self.nodes[w].right;
                        self.set_black(wr);
                        self.nodes[w].red = true;
                        self.rotate_left(w);
                        w = self.nodes[p].left.expect("remove_fixup: missing sibling");
                    }
                    self.nodes[w].red = self.nodes[p].red;
                    self.nodes[p].red = false;
                    let wl = self.nodes[w].left;
                    self.set_black(wl);
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }
        self.set_black(x);
    }

    /// Validate the red-black properties; returns the black height.
    #[cfg(test)]
    fn check(&self) -> usize {
        fn walk(tree: &ActiveEdges, key: Option<EdgeKey>, parent: Option<EdgeKey>) -> usize {
            let key = match key {
                None => return 1,
                Some(k) => k,
            };
            let node = &tree.nodes[key];
            assert_eq!(node.parent, parent, "broken parent link");
            if node.red {
                assert!(
                    !tree.is_red(node.left) && !tree.is_red(node.right),
                    "red node with red child"
                );
            }
            let lh = walk(tree, node.left, Some(key));
            let rh = walk(tree, node.right, Some(key));
            assert_eq!(lh, rh, "unequal black heights");
            lh + if node.red { 0 } else { 1 }
        }
        assert!(!self.is_red(self.root));
        walk(self, self.root, None)
    }
}
