//! Path analysis: bounded DFS enumeration, BFS shortest path, k-shortest
//! paths and a lazy all-simple-paths iterator.
//!
//! Every traversal visits successors in adjacency insertion order, so all
//! results are deterministic for a given snapshot.

use std::collections::VecDeque;

use crate::error::Result;
use crate::graph::AttackGraph;

/// Distance marker for nodes that cannot reach the target.
const UNREACHABLE: usize = usize::MAX;

/// Lazy DFS over simple paths from one node to another.
///
/// Yields node-index paths in DFS discovery order. The iterator owns its
/// working state (path stack, on-path marks, cursors); dropping it early
/// skips the rest of the enumeration.
pub struct SimplePaths<'g> {
    graph: &'g AttackGraph,
    target: usize,
    cutoff: usize,
    /// When set, only paths with exactly this many edges are produced.
    exact: Option<usize>,
    /// Edge distance from each node to `target`, used to prune exact-length
    /// searches.
    dist_to_target: Option<&'g [usize]>,
    path: Vec<usize>,
    on_path: Vec<bool>,
    /// Next successor position to try, one per path frame.
    cursors: Vec<usize>,
}

impl<'g> SimplePaths<'g> {
    /// All simple paths with at most `cutoff` edges.
    pub fn new(graph: &'g AttackGraph, source: usize, target: usize, cutoff: usize) -> Self {
        let mut on_path = vec![false; graph.node_count()];
        on_path[source] = true;
        Self {
            graph,
            target,
            cutoff,
            exact: None,
            dist_to_target: None,
            path: vec![source],
            on_path,
            cursors: vec![0],
        }
    }

    /// Simple paths with exactly `length` edges.
    ///
    /// `dist_to_target` must hold the BFS edge distance from every node to
    /// `target` (`usize::MAX` when unreachable).
    fn exact_length(
        graph: &'g AttackGraph,
        source: usize,
        target: usize,
        length: usize,
        dist_to_target: &'g [usize],
    ) -> Self {
        let mut paths = Self::new(graph, source, target, length);
        paths.exact = Some(length);
        paths.dist_to_target = Some(dist_to_target);
        paths
    }

    /// Whether stepping onto `next` at `depth` edges can still produce a
    /// path of the requested exact length.
    fn admits(&self, next: usize, depth: usize) -> bool {
        match (self.exact, self.dist_to_target) {
            (Some(length), Some(dist)) => {
                dist[next] != UNREACHABLE && depth + dist[next] <= length
            }
            _ => true,
        }
    }
}

impl Iterator for SimplePaths<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        while let Some(&node) = self.path.last() {
            let frame = self.path.len() - 1;
            let depth = frame; // edges used so far
            let successors = self.graph.successors(node);

            if depth < self.cutoff && self.cursors[frame] < successors.len() {
                let next = successors[self.cursors[frame]];
                self.cursors[frame] += 1;

                if self.on_path[next] || !self.admits(next, depth + 1) {
                    continue;
                }
                if next == self.target {
                    if self.exact.map_or(true, |length| depth + 1 == length) {
                        let mut found = self.path.clone();
                        found.push(next);
                        return Some(found);
                    }
                    // A simple path cannot pass through its own target.
                    continue;
                }

                self.path.push(next);
                self.on_path[next] = true;
                self.cursors.push(0);
            } else {
                self.on_path[node] = false;
                self.path.pop();
                self.cursors.pop();
            }
        }
        None
    }
}

/// Enumerate simple paths from `source` to `target` by depth-first search.
///
/// Branches stop at `max_depth` edges and the search stops once `max_paths`
/// paths are collected. Returns an empty list when nothing is found or when
/// `source == target`.
pub fn find_paths(
    graph: &AttackGraph,
    source: &str,
    target: &str,
    max_paths: usize,
    max_depth: usize,
) -> Result<Vec<Vec<String>>> {
    let src = graph.resolve(source)?;
    let tgt = graph.resolve(target)?;

    let paths: Vec<Vec<String>> = SimplePaths::new(graph, src, tgt, max_depth)
        .take(max_paths)
        .map(|p| graph.path_ids(&p))
        .collect();

    tracing::debug!(source, target, found = paths.len(), "find_paths");
    Ok(paths)
}

/// Breadth-first shortest path by edge count.
///
/// Ties are broken by adjacency insertion order. Returns `[source]` when
/// `source == target` and an empty list when `target` is unreachable.
pub fn shortest_path(graph: &AttackGraph, source: &str, target: &str) -> Result<Vec<String>> {
    let src = graph.resolve(source)?;
    let tgt = graph.resolve(target)?;
    Ok(shortest_path_indices(graph, src, tgt)
        .map(|p| graph.path_ids(&p))
        .unwrap_or_default())
}

pub(crate) fn shortest_path_indices(
    graph: &AttackGraph,
    source: usize,
    target: usize,
) -> Option<Vec<usize>> {
    if source == target {
        return Some(vec![source]);
    }

    let mut parent: Vec<Option<usize>> = vec![None; graph.node_count()];
    let mut visited = vec![false; graph.node_count()];
    visited[source] = true;
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        for &next in graph.successors(node) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            parent[next] = Some(node);
            if next == target {
                let mut path = vec![target];
                let mut current = target;
                while let Some(p) = parent[current] {
                    path.push(p);
                    current = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

/// The first `k` simple paths in order of increasing length.
///
/// Paths of equal length keep DFS discovery order. The search runs one
/// pruned DFS per length, starting at the BFS distance and stopping once `k`
/// paths are found or the length exceeds `n - 1`.
pub fn k_shortest_paths(
    graph: &AttackGraph,
    source: &str,
    target: &str,
    k: usize,
) -> Result<Vec<Vec<String>>> {
    let src = graph.resolve(source)?;
    let tgt = graph.resolve(target)?;
    if k == 0 || src == tgt {
        return Ok(Vec::new());
    }

    let dist = distances_to(graph, tgt);
    if dist[src] == UNREACHABLE {
        return Ok(Vec::new());
    }

    let max_length = graph.node_count().saturating_sub(1);
    let mut found: Vec<Vec<String>> = Vec::new();

    for length in dist[src]..=max_length {
        let remaining = k - found.len();
        found.extend(
            SimplePaths::exact_length(graph, src, tgt, length, &dist)
                .take(remaining)
                .map(|p| graph.path_ids(&p)),
        );
        if found.len() >= k {
            break;
        }
    }

    tracing::debug!(source, target, k, found = found.len(), "k_shortest_paths");
    Ok(found)
}

/// Lazily enumerate every simple path with at most `cutoff` edges.
///
/// The iterator is finite and cannot be restarted; stopping early skips the
/// remaining work.
pub fn all_paths_between<'g>(
    graph: &'g AttackGraph,
    source: &str,
    target: &str,
    cutoff: usize,
) -> Result<impl Iterator<Item = Vec<String>> + 'g> {
    let src = graph.resolve(source)?;
    let tgt = graph.resolve(target)?;
    Ok(SimplePaths::new(graph, src, tgt, cutoff).map(move |p| graph.path_ids(&p)))
}

/// Reverse BFS: edge distance from every node to `target`.
fn distances_to(graph: &AttackGraph, target: usize) -> Vec<usize> {
    let mut dist = vec![UNREACHABLE; graph.node_count()];
    dist[target] = 0;
    let mut queue = VecDeque::from([target]);

    while let Some(node) = queue.pop_front() {
        for &prev in graph.predecessors(node) {
            if dist[prev] == UNREACHABLE {
                dist[prev] = dist[node] + 1;
                queue.push_back(prev);
            }
        }
    }
    dist
}
