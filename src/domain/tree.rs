//! In-memory ordered store of routes.
//!
//! The [`RouteTree`] is an unbalanced binary search tree keyed by [`RouteId`].
//! It knows nothing about files, geocoding or validation; it stores whatever
//! well-typed routes it is given and guards two invariants: identifiers are
//! unique, and names are unique ignoring case.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to their children by
//! index. No node refers back to its parent, and every walk is iterative, so
//! a degenerate tree (ids inserted in increasing order) costs depth but never
//! call-stack space.

use std::{cmp::Ordering, iter::FusedIterator};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::route::{Route, RouteData, RouteId};

/// Index of a node in the arena.
type NodeIndex = usize;

/// A structural position in the tree holding one route payload.
///
/// The payload of a node can be replaced when a node with two children is
/// deleted, so the route a node holds is not fixed for the node's lifetime.
#[derive(Debug, Clone)]
struct Node {
    route: Route,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
}

impl Node {
    const fn leaf(route: Route) -> Self {
        Self {
            route,
            left: None,
            right: None,
        }
    }
}

/// The link through which a node is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Left(NodeIndex),
    Right(NodeIndex),
}

/// An ordered collection of routes, keyed by [`RouteId`].
///
/// Lookups and insertions cost O(depth). The tree is never rebalanced.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    /// Node arena. Every element is reachable from `root`.
    nodes: Vec<Node>,

    /// Index of the root node, `None` when the tree is empty.
    root: Option<NodeIndex>,
}

/// Errors returned by [`RouteTree`] operations.
///
/// A failed operation leaves the tree exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A route with this identifier is already stored.
    #[error("a route with ID {0} already exists")]
    DuplicateIdentifier(RouteId),
    /// Another route already uses this name (ignoring case).
    #[error("a route named '{0}' already exists")]
    DuplicateName(String),
    /// No route with this identifier is stored.
    #[error("route {0} not found")]
    NotFound(RouteId),
}

impl RouteTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Creates an empty tree with room for `capacity` routes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of stored routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The route held by the root node.
    #[must_use]
    pub fn root(&self) -> Option<&Route> {
        self.root.map(|index| &self.nodes[index].route)
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeIndex, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();

        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[index];
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }

        deepest
    }

    /// Inserts a route.
    ///
    /// The identifier is chosen by the caller, see [`RouteTree::next_id`].
    ///
    /// # Errors
    ///
    /// - [`TreeError::DuplicateIdentifier`] if the identifier is taken.
    /// - [`TreeError::DuplicateName`] if another route has the same name,
    ///   ignoring case.
    #[instrument(level = "debug", skip_all, fields(id = %route.id, name = %route.data.name))]
    pub fn insert(&mut self, route: Route) -> Result<(), TreeError> {
        if self.find_by_id(route.id).is_some() {
            return Err(TreeError::DuplicateIdentifier(route.id));
        }
        if self.find_by_name(route.name()).is_some() {
            return Err(TreeError::DuplicateName(route.data.name.to_string()));
        }

        // Equal keys would go right; uniqueness means none reach this walk.
        let mut slot = Slot::Root;
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            if route.id < node.route.id {
                slot = Slot::Left(index);
                cursor = node.left;
            } else {
                slot = Slot::Right(index);
                cursor = node.right;
            }
        }

        let index = self.nodes.len();
        self.nodes.push(Node::leaf(route));
        self.set_slot(slot, Some(index));

        debug!("route inserted");
        Ok(())
    }

    /// Finds a route by identifier.
    #[must_use]
    pub fn find_by_id(&self, id: RouteId) -> Option<&Route> {
        self.locate(id).map(|(_, index)| &self.nodes[index].route)
    }

    /// Finds a route by name, ignoring case and surrounding whitespace.
    ///
    /// Names are not ordered, so this walks the whole tree in order and stops
    /// at the first match.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Route> {
        let name = name.trim();
        self.iter().find(|route| route.name().matches(name))
    }

    /// Removes a route, returning it.
    ///
    /// A node with one child or none is replaced by that child. A node with two
    /// children takes over the payload of its in-order successor (the left-most
    /// node of its right subtree), and the successor's node is unlinked
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if no route has this identifier.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: RouteId) -> Result<Route, TreeError> {
        let (slot, target) = self.locate(id).ok_or(TreeError::NotFound(id))?;

        let vacated = match (self.nodes[target].left, self.nodes[target].right) {
            (None, right) => {
                self.set_slot(slot, right);
                target
            }
            (left, None) => {
                self.set_slot(slot, left);
                target
            }
            (Some(_), Some(right)) => {
                let (successor_slot, successor) = self.leftmost(Slot::Right(target), right);

                // The successor has no left child: its right child takes its place.
                let successor_right = self.nodes[successor].right;
                self.set_slot(successor_slot, successor_right);

                // The target node keeps its position and takes the successor's
                // payload; the unlinked node carries the deleted route out.
                self.swap_payloads(target, successor);
                debug!(successor = %self.nodes[target].route.id, "spliced in-order successor");
                successor
            }
        };

        Ok(self.release(vacated))
    }

    /// Replaces every mutable attribute of a route.
    ///
    /// The route keeps its identifier and therefore its position in the tree.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotFound`] if no route has this identifier.
    /// - [`TreeError::DuplicateName`] if a *different* route already uses the
    ///   new name, ignoring case.
    #[instrument(level = "debug", skip(self, data), fields(name = %data.name))]
    pub fn update(&mut self, id: RouteId, data: RouteData) -> Result<(), TreeError> {
        let (_, index) = self.locate(id).ok_or(TreeError::NotFound(id))?;

        if let Some(other) = self.find_by_name(&data.name) {
            if other.id != id {
                return Err(TreeError::DuplicateName(data.name.to_string()));
            }
        }

        self.nodes[index].route.data = data;
        debug!("route updated");
        Ok(())
    }

    /// Returns an iterator over all routes in ascending identifier order.
    ///
    /// Each call starts a fresh in-order pass.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
            cursor: self.root,
            remaining: self.nodes.len(),
        }
    }

    /// The largest stored identifier.
    #[must_use]
    pub fn max_id(&self) -> Option<RouteId> {
        let mut index = self.root?;
        while let Some(right) = self.nodes[index].right {
            index = right;
        }
        Some(self.nodes[index].route.id)
    }

    /// The identifier to give the next new route: one past the largest stored
    /// identifier, or [`RouteId::FIRST`] when the tree is empty.
    ///
    /// Returns `None` once the largest stored identifier is `u64::MAX`.
    #[must_use]
    pub fn next_id(&self) -> Option<RouteId> {
        self.max_id().map_or(Some(RouteId::FIRST), RouteId::successor)
    }
}

impl RouteTree {
    /// Walks from the root to the node holding `id`, returning the node and
    /// the link it hangs from.
    fn locate(&self, id: RouteId) -> Option<(Slot, NodeIndex)> {
        let mut slot = Slot::Root;
        let mut cursor = self.root;

        while let Some(index) = cursor {
            let node = &self.nodes[index];
            match id.cmp(&node.route.id) {
                Ordering::Equal => return Some((slot, index)),
                Ordering::Less => {
                    slot = Slot::Left(index);
                    cursor = node.left;
                }
                Ordering::Greater => {
                    slot = Slot::Right(index);
                    cursor = node.right;
                }
            }
        }

        None
    }

    /// Follows left links from `start` (reached through `slot`) to the
    /// smallest node of that subtree.
    fn leftmost(&self, mut slot: Slot, start: NodeIndex) -> (Slot, NodeIndex) {
        let mut index = start;
        while let Some(left) = self.nodes[index].left {
            slot = Slot::Left(index);
            index = left;
        }
        (slot, index)
    }

    fn set_slot(&mut self, slot: Slot, child: Option<NodeIndex>) {
        match slot {
            Slot::Root => self.root = child,
            Slot::Left(parent) => self.nodes[parent].left = child,
            Slot::Right(parent) => self.nodes[parent].right = child,
        }
    }

    fn swap_payloads(&mut self, a: NodeIndex, b: NodeIndex) {
        debug_assert_ne!(a, b);
        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.nodes.split_at_mut(high);
        std::mem::swap(&mut head[low].route, &mut tail[0].route);
    }

    /// Drops an already unlinked node from the arena and returns its payload.
    ///
    /// The arena stays dense: the last node moves into the freed index and the
    /// link pointing at it is redirected.
    fn release(&mut self, index: NodeIndex) -> Route {
        let last = self.nodes.len() - 1;

        if index != last {
            let moved = self.nodes[last].route.id;
            if let Some((slot, _)) = self.locate(moved) {
                self.set_slot(slot, Some(index));
            }
        }

        self.nodes.swap_remove(index).route
    }
}

impl<'a> IntoIterator for &'a RouteTree {
    type Item = &'a Route;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the routes of a [`RouteTree`].
///
/// Holds an explicit stack of pending ancestors, so auxiliary space is
/// O(depth).
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    nodes: &'a [Node],
    stack: Vec<NodeIndex>,
    cursor: Option<NodeIndex>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Route;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.cursor {
            self.stack.push(index);
            self.cursor = self.nodes[index].left;
        }

        let index = self.stack.pop()?;
        self.cursor = self.nodes[index].right;
        self.remaining -= 1;
        Some(&self.nodes[index].route)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::route::{Endpoint, RouteName};

    fn id(value: u64) -> RouteId {
        RouteId::new(value).unwrap()
    }

    fn route(value: u64, name: &str) -> Route {
        Route::new(
            id(value),
            RouteData {
                name: RouteName::new(name).unwrap(),
                distance_km: value as f64 * 1.5,
                origin: Endpoint::new(format!("origin {value}")),
                destination: Endpoint::new(format!("destination {value}")),
                capacity: 100.0,
                current_load: value as f64,
            },
        )
    }

    fn tree_of(ids: &[u64]) -> RouteTree {
        let mut tree = RouteTree::new();
        for &value in ids {
            tree.insert(route(value, &format!("Route {value}"))).unwrap();
        }
        tree
    }

    fn ids(tree: &RouteTree) -> Vec<u64> {
        tree.iter().map(|route| route.id.get()).collect()
    }

    /// Checks ordering, reachability and name uniqueness from the root down.
    fn assert_invariants(tree: &RouteTree) {
        let mut reached = 0;
        let mut stack: Vec<(NodeIndex, Option<RouteId>, Option<RouteId>)> =
            tree.root.map(|root| (root, None, None)).into_iter().collect();

        while let Some((index, lower, upper)) = stack.pop() {
            reached += 1;
            let node = &tree.nodes[index];
            let key = node.route.id;
            assert!(lower.is_none_or(|lower| key > lower), "{key} breaks lower bound");
            assert!(upper.is_none_or(|upper| key < upper), "{key} breaks upper bound");
            stack.extend(node.left.map(|child| (child, lower, Some(key))));
            stack.extend(node.right.map(|child| (child, Some(key), upper)));
        }
        assert_eq!(reached, tree.len(), "every arena node must be reachable");

        let mut names: Vec<String> = tree.iter().map(|r| r.name().to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tree.len(), "names must be unique ignoring case");
    }

    #[test]
    fn empty_tree() {
        let tree = RouteTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.root().is_none());
        assert!(tree.find_by_id(id(1)).is_none());
        assert!(tree.find_by_name("anything").is_none());
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.next_id(), Some(RouteId::FIRST));
    }

    #[test]
    fn insert_then_find_returns_equal_route() {
        let mut tree = RouteTree::new();
        let original = route(42, "Ruta Costera");

        tree.insert(original.clone()).unwrap();

        assert_eq!(tree.find_by_id(id(42)), Some(&original));
        assert_eq!(tree.find_by_name("RUTA COSTERA"), Some(&original));
    }

    #[test]
    fn enumerates_in_ascending_order() {
        let tree = tree_of(&[50, 20, 80, 10, 30, 70, 90, 25, 85]);
        assert_eq!(ids(&tree), vec![10, 20, 25, 30, 50, 70, 80, 85, 90]);
        assert_eq!(tree.iter().len(), 9);
        assert_invariants(&tree);
    }

    #[test]
    fn find_by_name_ignores_surrounding_whitespace() {
        let tree = tree_of(&[1, 2]);

        assert_eq!(tree.find_by_name("  route 2 ").map(|r| r.id), Some(id(2)));
        assert!(tree.find_by_name("   ").is_none());
    }

    #[test]
    fn rejects_duplicate_identifier_without_change() {
        let mut tree = tree_of(&[5, 3, 8]);
        let before: Vec<Route> = tree.iter().cloned().collect();

        let err = tree.insert(route(3, "Something else")).unwrap_err();

        assert_eq!(err, TreeError::DuplicateIdentifier(id(3)));
        let after: Vec<Route> = tree.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rejects_duplicate_name_ignoring_case() {
        let mut tree = tree_of(&[1]);

        let err = tree.insert(route(2, "route 1")).unwrap_err();

        assert_eq!(err, TreeError::DuplicateName("route 1".to_string()));
        assert_eq!(ids(&tree), vec![1]);
    }

    #[test]
    fn delete_leaf_and_single_child_nodes() {
        let mut tree = tree_of(&[5, 3, 8, 1, 9]);

        // leaf
        assert_eq!(tree.delete(id(1)).unwrap().id, id(1));
        assert_eq!(ids(&tree), vec![3, 5, 8, 9]);

        // only a right child
        tree.delete(id(8)).unwrap();
        assert_eq!(ids(&tree), vec![3, 5, 9]);
        assert_invariants(&tree);

        // only a left child
        let mut tree = tree_of(&[5, 3, 2]);
        tree.delete(id(3)).unwrap();
        assert_eq!(ids(&tree), vec![2, 5]);
        assert_invariants(&tree);
    }

    #[test]
    fn delete_node_with_two_children_splices_successor() {
        let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
        let successor = tree.find_by_id(id(7)).cloned().unwrap();

        let removed = tree.delete(id(5)).unwrap();

        assert_eq!(removed.id, id(5));
        assert_eq!(removed.name().as_str(), "Route 5");
        assert_eq!(ids(&tree), vec![1, 3, 4, 7, 8, 9]);
        assert_eq!(tree.root(), Some(&successor));
        assert_eq!(tree.find_by_id(id(7)), Some(&successor));
        assert!(tree.find_by_id(id(5)).is_none());
        assert_invariants(&tree);
    }

    #[test]
    fn delete_successor_with_right_child() {
        // 10's successor is 12, which has a right child 13.
        let mut tree = tree_of(&[10, 5, 15, 12, 20, 13]);

        tree.delete(id(10)).unwrap();

        assert_eq!(ids(&tree), vec![5, 12, 13, 15, 20]);
        assert_eq!(tree.root().unwrap().id, id(12));
        assert_invariants(&tree);
    }

    #[test]
    fn delete_root_until_empty() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

        while let Some(root) = tree.root().map(|route| route.id) {
            let before = tree.len();
            tree.delete(root).unwrap();
            assert_eq!(tree.len(), before - 1);
            assert!(tree.find_by_id(root).is_none());
            assert_invariants(&tree);
        }

        assert!(tree.is_empty());
    }

    #[test]
    fn delete_missing_route_is_not_found() {
        let mut tree = tree_of(&[2, 1]);
        assert_eq!(tree.delete(id(3)), Err(TreeError::NotFound(id(3))));
        assert_eq!(ids(&tree), vec![1, 2]);
    }

    #[test]
    fn deleted_name_can_be_reused() {
        let mut tree = tree_of(&[1, 2]);
        tree.delete(id(1)).unwrap();
        tree.insert(route(3, "ROUTE 1")).unwrap();
        assert_eq!(ids(&tree), vec![2, 3]);
    }

    #[test]
    fn update_replaces_fields_in_place() {
        let mut tree = tree_of(&[2, 1, 3]);
        let mut data = route(2, "Renamed").data;
        data.capacity = 10.0;
        data.current_load = 9.0;

        tree.update(id(2), data.clone()).unwrap();

        let stored = tree.find_by_id(id(2)).unwrap();
        assert_eq!(stored.data, data);
        assert_eq!(tree.root().unwrap().id, id(2));
        assert_eq!(ids(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn update_may_change_case_of_own_name() {
        let mut tree = tree_of(&[1]);
        let data = route(1, "ROUTE 1").data;

        tree.update(id(1), data).unwrap();

        assert_eq!(tree.find_by_id(id(1)).unwrap().name().as_str(), "ROUTE 1");
    }

    #[test]
    fn update_rejects_name_of_other_route() {
        let mut tree = RouteTree::new();
        tree.insert(route(1, "A")).unwrap();
        tree.insert(route(2, "B")).unwrap();
        let before: Vec<Route> = tree.iter().cloned().collect();

        let err = tree.update(id(2), route(2, "a").data).unwrap_err();

        assert_eq!(err, TreeError::DuplicateName("a".to_string()));
        let after: Vec<Route> = tree.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn update_missing_route_is_not_found() {
        let mut tree = tree_of(&[1]);
        assert_eq!(
            tree.update(id(9), route(9, "Nine").data),
            Err(TreeError::NotFound(id(9)))
        );
    }

    #[test]
    fn next_id_follows_largest_identifier() {
        let mut tree = tree_of(&[3, 9, 4]);
        assert_eq!(tree.next_id(), Some(id(10)));

        tree.delete(id(9)).unwrap();
        assert_eq!(tree.next_id(), Some(id(5)));
    }

    #[test]
    fn next_id_is_none_after_largest_identifier() {
        let tree = tree_of(&[1, u64::MAX]);
        assert_eq!(tree.max_id(), Some(id(u64::MAX)));
        assert_eq!(tree.next_id(), None);
    }

    #[test]
    fn increasing_inserts_degenerate_without_recursion() {
        let count = 5_000;
        let mut tree = RouteTree::with_capacity(count);
        for value in 1..=count as u64 {
            tree.insert(route(value, &format!("r{value}"))).unwrap();
        }

        assert_eq!(tree.depth(), count);
        assert_eq!(tree.iter().count(), count);
        assert!(tree.find_by_id(id(count as u64)).is_some());

        for value in (1..=count as u64).step_by(2) {
            tree.delete(id(value)).unwrap();
        }
        assert_eq!(tree.len(), count / 2);
        assert!(ids(&tree).iter().all(|value| value % 2 == 0));
    }

    #[test]
    fn random_operations_agree_with_ordered_map() {
        // xorshift keeps the sequence reproducible without extra crates
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut tree = RouteTree::new();
        let mut model: BTreeMap<u64, Route> = BTreeMap::new();

        for _ in 0..2_000 {
            let key = next() % 64 + 1;
            match next() % 3 {
                0 | 1 => {
                    let candidate = route(key, &format!("Route {key}"));
                    let result = tree.insert(candidate.clone());
                    if model.contains_key(&key) {
                        assert_eq!(result, Err(TreeError::DuplicateIdentifier(id(key))));
                    } else {
                        assert_eq!(result, Ok(()));
                        model.insert(key, candidate);
                    }
                }
                _ => {
                    let result = tree.delete(id(key));
                    match model.remove(&key) {
                        Some(expected) => assert_eq!(result, Ok(expected)),
                        None => assert_eq!(result, Err(TreeError::NotFound(id(key)))),
                    }
                }
            }

            let expected: Vec<&Route> = model.values().collect();
            let actual: Vec<&Route> = tree.iter().collect();
            assert_eq!(actual, expected);
        }

        assert_invariants(&tree);
    }
}
