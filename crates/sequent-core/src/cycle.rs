//! Cycle detection over a dependency provider
//!
//! The engine applies this to the union of tree edges (parent → child),
//! `dependencies`, and `validation_deps`. The provider abstraction keeps
//! the walk independent of where the edges come from, so a proposed edge
//! can be overlaid virtually before anything is committed.

use crate::identifiers::NodeId;
use std::collections::HashSet;

/// Source of outgoing dependency edges for a node.
pub trait DepProvider {
    /// The ids `id` depends on (edges point from dependent to dependency).
    fn deps_of(&self, id: &NodeId) -> Vec<NodeId>;
}

impl<F> DepProvider for F
where
    F: Fn(&NodeId) -> Vec<NodeId>,
{
    fn deps_of(&self, id: &NodeId) -> Vec<NodeId> {
        self(id)
    }
}

/// Overlay of one extra edge on top of an existing provider.
struct WithEdge<'a, P: DepProvider> {
    inner: &'a P,
    from: &'a NodeId,
    to: &'a NodeId,
}

impl<P: DepProvider> DepProvider for WithEdge<'_, P> {
    fn deps_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut deps = self.inner.deps_of(id);
        if id == self.from {
            deps.push(self.to.clone());
        }
        deps
    }
}

/// Search for a cycle reachable from `start`.
///
/// Returns the cycle path with the entry node repeated at the end
/// (`[a, b, c, a]`), or `None` if no cycle is reachable.
pub fn find_cycle(start: &NodeId, provider: &impl DepProvider) -> Option<Vec<NodeId>> {
    let mut path: Vec<NodeId> = Vec::new();
    let mut on_path: HashSet<NodeId> = HashSet::new();
    let mut finished: HashSet<NodeId> = HashSet::new();
    dfs(start, provider, &mut path, &mut on_path, &mut finished)
}

fn dfs(
    current: &NodeId,
    provider: &impl DepProvider,
    path: &mut Vec<NodeId>,
    on_path: &mut HashSet<NodeId>,
    finished: &mut HashSet<NodeId>,
) -> Option<Vec<NodeId>> {
    if finished.contains(current) {
        return None;
    }
    if on_path.contains(current) {
        let entry = path.iter().position(|id| id == current)?;
        let mut cycle: Vec<NodeId> = path[entry..].to_vec();
        cycle.push(current.clone());
        return Some(cycle);
    }

    path.push(current.clone());
    on_path.insert(current.clone());
    for dep in provider.deps_of(current) {
        if let Some(cycle) = dfs(&dep, provider, path, on_path, finished) {
            return Some(cycle);
        }
    }
    path.pop();
    on_path.remove(current);
    finished.insert(current.clone());
    None
}

/// Check whether adding the edge `from → to` would close a cycle,
/// returning the resulting cycle path if so.
pub fn would_create_cycle(
    from: &NodeId,
    to: &NodeId,
    provider: &impl DepProvider,
) -> Option<Vec<NodeId>> {
    if from == to {
        return Some(vec![from.clone(), from.clone()]);
    }
    let overlay = WithEdge {
        inner: provider,
        from,
        to,
    };
    find_cycle(from, &overlay)
}
