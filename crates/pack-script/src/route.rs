//! Version routing over changelist deltas
//!
//! Every changelist header is an edge `from -> to`. A route is found by
//! enumerating every cycle-free path from the start version and keeping the
//! one with the fewest hops. Equal-length routes are broken by comparing the
//! version sequences lexicographically, so the result never depends on the
//! order headers appear in the file.

use std::collections::BTreeMap;

/// An ordered sequence of versions from a start version to a target version.
///
/// Every consecutive pair is an edge that exists in the graph the route was
/// computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRoute {
    versions: Vec<String>,
}

impl VersionRoute {
    /// All versions on the route, start and target included.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// The versions before the target, i.e. the route without its last hop's
    /// destination.
    pub fn intermediate(&self) -> &[String] {
        &self.versions[..self.versions.len().saturating_sub(1)]
    }

    /// Consecutive `(from, to)` pairs along the route.
    pub fn hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.versions
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    pub fn hop_count(&self) -> usize {
        self.versions.len().saturating_sub(1)
    }
}

/// Find the shortest route from `start` to `target` over `edges`.
///
/// Returns `None` when `target` is unreachable. A route from a version to
/// itself is the zero-hop route `[start]`.
pub fn find_route<'a, I>(edges: I, start: &str, target: &str) -> Option<VersionRoute>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if start == target {
        return Some(VersionRoute {
            versions: vec![start.to_string()],
        });
    }

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, to) in edges {
        let targets = adjacency.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    let mut path = vec![start];
    let mut best: Option<Vec<&str>> = None;
    walk(&adjacency, target, &mut path, &mut best);

    best.map(|versions| VersionRoute {
        versions: versions.into_iter().map(str::to_string).collect(),
    })
}

fn walk<'a>(
    adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
    target: &'a str,
    path: &mut Vec<&'a str>,
    best: &mut Option<Vec<&'a str>>,
) {
    let Some(current) = path.last().copied() else {
        return;
    };
    let Some(nexts) = adjacency.get(current) else {
        return;
    };

    for &next in nexts {
        if next == target {
            let mut candidate = path.clone();
            candidate.push(next);
            if is_better(&candidate, best.as_deref()) {
                *best = Some(candidate);
            }
            continue;
        }
        // cycle guard: never revisit a version already on this path
        if path.contains(&next) {
            continue;
        }
        path.push(next);
        walk(adjacency, target, path, best);
        path.pop();
    }
}

fn is_better(candidate: &[&str], best: Option<&[&str]>) -> bool {
    match best {
        None => true,
        Some(best) => {
            candidate.len() < best.len() || (candidate.len() == best.len() && candidate < best)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_edge() {
        let route = find_route([("1.0.0", "1.1.0")], "1.0.0", "1.1.0").unwrap();
        assert_eq!(route.versions(), ["1.0.0", "1.1.0"]);
        assert_eq!(route.intermediate(), ["1.0.0"]);
        assert_eq!(route.hop_count(), 1);
    }

    #[test]
    fn test_same_start_and_target_is_zero_hops() {
        let route = find_route(Vec::<(&str, &str)>::new(), "2.0.0", "2.0.0").unwrap();
        assert_eq!(route.hop_count(), 0);
        assert_eq!(route.hops().count(), 0);
    }

    #[test]
    fn test_prefers_fewest_hops() {
        let edges = [("A", "B"), ("B", "C"), ("C", "D"), ("A", "D")];
        let route = find_route(edges, "A", "D").unwrap();
        assert_eq!(route.versions(), ["A", "D"]);
    }

    #[test]
    fn test_tie_break_is_lexicographic_and_order_independent() {
        let forward = [("A", "C"), ("C", "D"), ("A", "B"), ("B", "D")];
        let reversed = [("B", "D"), ("A", "B"), ("C", "D"), ("A", "C")];
        let a = find_route(forward, "A", "D").unwrap();
        let b = find_route(reversed, "A", "D").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.versions(), ["A", "B", "D"]);
    }

    #[test]
    fn test_cycle_terminates_without_route() {
        let edges = [("A", "B"), ("B", "A")];
        assert!(find_route(edges, "A", "Z").is_none());
    }

    #[test]
    fn test_cycle_on_the_way_to_target() {
        let edges = [("A", "B"), ("B", "A"), ("B", "C")];
        let route = find_route(edges, "A", "C").unwrap();
        assert_eq!(route.versions(), ["A", "B", "C"]);
    }

    #[test]
    fn test_hops_pairs() {
        let edges = [("1", "2"), ("2", "3")];
        let route = find_route(edges, "1", "3").unwrap();
        let hops: Vec<_> = route.hops().collect();
        assert_eq!(hops, vec![("1", "2"), ("2", "3")]);
    }
}
