//! Structural analysis: elementary cycles, strongly connected components,
//! density and diameter.

use std::collections::VecDeque;

use crate::graph::AttackGraph;

/// Enumerate every elementary cycle (Johnson's algorithm).
///
/// Each cycle starts at its lowest-index node and is listed without
/// repeating that node at the end; a self-loop is the one-node cycle `[v]`.
/// Returns an empty list for an acyclic graph.
pub fn find_cycles(graph: &AttackGraph) -> Vec<Vec<String>> {
    find_cycles_limited(graph, usize::MAX)
}

/// Like [`find_cycles`], stopping once `limit` cycles have been found.
pub fn find_cycles_limited(graph: &AttackGraph, limit: usize) -> Vec<Vec<String>> {
    let n = graph.node_count();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    if limit == 0 {
        return cycles;
    }

    // Johnson works on the subgraph induced by nodes `s..n`.
    let mut allowed = vec![true; n];
    let mut blocked = vec![false; n];
    let mut block_map: Vec<Vec<usize>> = vec![Vec::new(); n];

    'search: for start in 0..n {
        let component = tarjan(graph, &allowed)
            .into_iter()
            .find(|c| c.contains(&start))
            .unwrap_or_default();
        let self_loop = graph.successors(start).contains(&start);
        if component.len() < 2 && !self_loop {
            allowed[start] = false;
            continue;
        }

        let mut in_component = vec![false; n];
        for &node in &component {
            in_component[node] = true;
            blocked[node] = false;
            block_map[node].clear();
        }

        let mut path = vec![start];
        blocked[start] = true;
        // (node, next successor position, found a cycle below)
        let mut frames: Vec<(usize, usize, bool)> = vec![(start, 0, false)];

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            let successors = graph.successors(v);

            if frame.1 < successors.len() {
                let w = successors[frame.1];
                frame.1 += 1;
                if !in_component[w] {
                    continue;
                }
                if w == start {
                    frame.2 = true;
                    cycles.push(graph.path_ids(&path));
                    if cycles.len() >= limit {
                        break 'search;
                    }
                } else if !blocked[w] {
                    path.push(w);
                    blocked[w] = true;
                    frames.push((w, 0, false));
                }
            } else {
                let found = frame.2;
                frames.pop();
                if found {
                    unblock(v, &mut blocked, &mut block_map);
                } else {
                    for &w in successors {
                        if in_component[w] && !block_map[w].contains(&v) {
                            block_map[w].push(v);
                        }
                    }
                }
                path.pop();
                if let Some(parent) = frames.last_mut() {
                    parent.2 |= found;
                }
            }
        }

        allowed[start] = false;
    }

    tracing::debug!(cycles = cycles.len(), "find_cycles");
    cycles
}

fn unblock(node: usize, blocked: &mut [bool], block_map: &mut [Vec<usize>]) {
    let mut stack = vec![node];
    while let Some(x) = stack.pop() {
        if blocked[x] {
            blocked[x] = false;
            stack.append(&mut block_map[x]);
        }
    }
}

/// Partition all nodes into strongly connected components (Tarjan).
///
/// Components are ordered by their earliest-inserted node; members keep
/// insertion order. Every node appears in exactly one component.
pub fn strongly_connected_components(graph: &AttackGraph) -> Vec<Vec<String>> {
    let allowed = vec![true; graph.node_count()];
    let mut components = tarjan(graph, &allowed);
    components.sort_by_key(|c| c.first().copied().unwrap_or(usize::MAX));
    components
        .iter()
        .map(|c| graph.path_ids(c))
        .collect()
}

/// Iterative Tarjan over the subgraph induced by `allowed` nodes.
/// Each returned component is sorted by node index.
fn tarjan(graph: &AttackGraph, allowed: &[bool]) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut counter = 0usize;

    for root in 0..n {
        if !allowed[root] || index[root].is_some() {
            continue;
        }

        index[root] = Some(counter);
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = calls.last_mut() {
            let v = frame.0;
            let successors = graph.successors(v);

            if frame.1 < successors.len() {
                let w = successors[frame.1];
                frame.1 += 1;
                if !allowed[w] {
                    continue;
                }
                match index[w] {
                    None => {
                        index[w] = Some(counter);
                        lowlink[w] = counter;
                        counter += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        calls.push((w, 0));
                    }
                    Some(iw) if on_stack[w] => {
                        lowlink[v] = lowlink[v].min(iw);
                    }
                    Some(_) => {}
                }
            } else {
                calls.pop();
                if let Some(&(parent, _)) = calls.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if index[v] == Some(lowlink[v]) {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }
    }
    components
}

/// `edges / (n(n-1))`; `0.0` for graphs with fewer than two nodes.
pub fn graph_density(graph: &AttackGraph) -> f64 {
    let n = graph.node_count();
    if n <= 1 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Longest shortest-path length over all ordered pairs joined by a directed
/// path; `0` when no pair is connected.
pub fn diameter(graph: &AttackGraph) -> usize {
    let n = graph.node_count();
    let mut longest = 0;

    for source in 0..n {
        let mut dist: Vec<Option<usize>> = vec![None; n];
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let dv = dist[v].unwrap_or(0);
            for &w in graph.successors(v) {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    longest = longest.max(dv + 1);
                    queue.push_back(w);
                }
            }
        }
    }
    longest
}
