use pack_script::find_route;
use proptest::prelude::*;

fn edges_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[A-F]", "[A-F]"), 0..16)
}

fn as_pairs(edges: &[(String, String)]) -> Vec<(&str, &str)> {
    edges.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect()
}

proptest! {
    #[test]
    fn test_route_hops_are_existing_edges(edges in edges_strategy()) {
        let pairs = as_pairs(&edges);
        if let Some(route) = find_route(pairs.iter().copied(), "A", "F") {
            prop_assert_eq!(route.versions().first().map(String::as_str), Some("A"));
            prop_assert_eq!(route.versions().last().map(String::as_str), Some("F"));
            for hop in route.hops() {
                prop_assert!(pairs.contains(&hop));
            }
        }
    }

    #[test]
    fn test_route_never_repeats_a_version(edges in edges_strategy()) {
        let pairs = as_pairs(&edges);
        if let Some(route) = find_route(pairs.iter().copied(), "A", "F") {
            let mut seen = route.versions().to_vec();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), route.versions().len());
        }
    }

    #[test]
    fn test_route_is_independent_of_edge_order(edges in edges_strategy()) {
        let pairs = as_pairs(&edges);
        let reversed: Vec<_> = pairs.iter().rev().copied().collect();
        prop_assert_eq!(
            find_route(pairs.iter().copied(), "A", "F"),
            find_route(reversed.iter().copied(), "A", "F")
        );
    }
}
