//! Bounded transitive closure over the link graph.

use crate::domain::NoteId;
use crate::index::IndexResult;
use crate::query::LinkDirection;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Upper bound on path extensions explored by one traversal.
pub const MAX_TRAVERSAL_STEPS: usize = 100_000;

/// Distance at which `related` notes are found.
pub const RELATED_DISTANCE: usize = 2;

/// One resolved link, oriented away from the node it was reached from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub from: NoteId,
    pub to: NoteId,
    pub title: String,
    pub snippet: String,
}

/// Read access to resolved links.
pub trait LinkGraph {
    /// Returns the resolved links touching `nodes` in `direction`, each
    /// oriented so that `from` is one of `nodes`.
    fn hops(&self, nodes: &[NoteId], direction: LinkDirection) -> IndexResult<Vec<Hop>>;
}

/// Surrounding text of a link that led to a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSnippet {
    pub title: String,
    pub text: String,
}

/// How a note was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reach {
    /// Minimum number of hops from any seed.
    pub distance: usize,
    /// Snippets of the links arriving at the note, first-seen order.
    pub snippets: Vec<LinkSnippet>,
}

/// Notes reachable from a seed set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closure {
    reached: BTreeMap<NoteId, Reach>,
    truncated: bool,
}

impl Closure {
    pub fn ids(&self) -> BTreeSet<NoteId> {
        self.reached.keys().copied().collect()
    }

    pub fn get(&self, id: NoteId) -> Option<&Reach> {
        self.reached.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &Reach)> {
        self.reached.iter().map(|(id, reach)| (*id, reach))
    }

    pub fn len(&self) -> usize {
        self.reached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reached.is_empty()
    }

    /// Returns true if the step cap cut the traversal short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn record(&mut self, hop: &Hop, distance: usize) {
        let reach = self.reached.entry(hop.to).or_insert(Reach {
            distance,
            snippets: Vec::new(),
        });
        reach.distance = reach.distance.min(distance);

        if !hop.snippet.is_empty() {
            let snippet = LinkSnippet {
                title: hop.title.clone(),
                text: hop.snippet.clone(),
            };
            if !reach.snippets.contains(&snippet) {
                reach.snippets.push(snippet);
            }
        }
    }
}

/// Breadth-first expansion from `seeds`, one hop per round.
///
/// Each traversal path keeps its own visited list, so a node may be reached
/// again along a different path but never twice on the same one. Expansion
/// stops when the frontier empties, after `max_distance` rounds (0 means
/// unbounded) or after [`MAX_TRAVERSAL_STEPS`] path extensions.
pub fn closure<G: LinkGraph + ?Sized>(
    graph: &G,
    seeds: &[NoteId],
    direction: LinkDirection,
    max_distance: usize,
) -> IndexResult<Closure> {
    let mut result = Closure::default();

    let mut unique_seeds: Vec<NoteId> = Vec::new();
    for seed in seeds {
        if !unique_seeds.contains(seed) {
            unique_seeds.push(*seed);
        }
    }
    let mut frontier: Vec<Vec<NoteId>> = unique_seeds.into_iter().map(|s| vec![s]).collect();

    let mut distance = 0;
    let mut steps = 0;

    'rounds: while !frontier.is_empty() && (max_distance == 0 || distance < max_distance) {
        distance += 1;

        let tips: Vec<NoteId> = frontier
            .iter()
            .filter_map(|path| path.last().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut by_source: HashMap<NoteId, Vec<Hop>> = HashMap::new();
        for hop in graph.hops(&tips, direction)? {
            by_source.entry(hop.from).or_default().push(hop);
        }

        let mut next = Vec::new();
        for path in &frontier {
            let Some(tip) = path.last() else { continue };
            let Some(hops) = by_source.get(tip) else {
                continue;
            };

            for hop in hops {
                if path.contains(&hop.to) {
                    continue;
                }
                if steps >= MAX_TRAVERSAL_STEPS {
                    result.truncated = true;
                    break 'rounds;
                }
                steps += 1;

                result.record(hop, distance);
                let mut extended = path.clone();
                extended.push(hop.to);
                next.push(extended);
            }
        }
        frontier = next;
    }

    if result.truncated {
        warn!(
            seeds = seeds.len(),
            steps, distance, "link traversal stopped at the step limit"
        );
    }
    Ok(result)
}

/// Notes exactly [`RELATED_DISTANCE`] hops from `seeds` in either direction,
/// excluding the seeds themselves.
pub fn related<G: LinkGraph + ?Sized>(graph: &G, seeds: &[NoteId]) -> IndexResult<BTreeSet<NoteId>> {
    let closure = closure(graph, seeds, LinkDirection::Both, RELATED_DISTANCE)?;
    Ok(closure
        .iter()
        .filter(|(id, reach)| reach.distance == RELATED_DISTANCE && !seeds.contains(id))
        .map(|(id, _)| id)
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// In-memory link graph keyed by raw ids.
    #[derive(Default)]
    pub(crate) struct FakeGraph {
        links: Vec<(i64, i64, &'static str)>,
    }

    impl FakeGraph {
        pub(crate) fn new(links: &[(i64, i64)]) -> Self {
            Self {
                links: links.iter().map(|&(s, t)| (s, t, "")).collect(),
            }
        }

        pub(crate) fn with_snippets(links: &[(i64, i64, &'static str)]) -> Self {
            Self {
                links: links.to_vec(),
            }
        }
    }

    impl LinkGraph for FakeGraph {
        fn hops(&self, nodes: &[NoteId], direction: LinkDirection) -> IndexResult<Vec<Hop>> {
            let mut hops = Vec::new();
            let hop = |from: i64, to: i64, snippet: &str| Hop {
                from: NoteId::from_raw(from),
                to: NoteId::from_raw(to),
                title: String::new(),
                snippet: snippet.to_string(),
            };
            if direction != LinkDirection::Incoming {
                for &(s, t, snip) in &self.links {
                    if nodes.contains(&NoteId::from_raw(s)) {
                        hops.push(hop(s, t, snip));
                    }
                }
            }
            if direction != LinkDirection::Outgoing {
                for &(s, t, snip) in &self.links {
                    if nodes.contains(&NoteId::from_raw(t)) {
                        hops.push(hop(t, s, snip));
                    }
                }
            }
            Ok(hops)
        }
    }

    fn ids(raw: &[i64]) -> BTreeSet<NoteId> {
        raw.iter().copied().map(NoteId::from_raw).collect()
    }

    fn seed(raw: i64) -> Vec<NoteId> {
        vec![NoteId::from_raw(raw)]
    }

    #[test]
    fn bounded_closure_stops_at_max_distance() {
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (3, 4)]);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 2).unwrap();
        assert_eq!(result.ids(), ids(&[2, 3]));
        assert_eq!(result.get(NoteId::from_raw(3)).unwrap().distance, 2);
    }

    #[test]
    fn unbounded_closure_reaches_everything() {
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (3, 4)]);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 0).unwrap();
        assert_eq!(result.ids(), ids(&[2, 3, 4]));
        assert!(!result.is_truncated());
    }

    #[test]
    fn incoming_closure_walks_backwards() {
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (3, 4)]);
        let result = closure(&graph, &seed(4), LinkDirection::Incoming, 0).unwrap();
        assert_eq!(result.ids(), ids(&[1, 2, 3]));
        assert_eq!(result.get(NoteId::from_raw(1)).unwrap().distance, 3);
    }

    #[test]
    fn cycles_terminate() {
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (3, 1)]);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 0).unwrap();
        // The hop from 3 back to the seed is already on the path
        assert_eq!(result.ids(), ids(&[2, 3]));
    }

    #[test]
    fn minimum_distance_wins() {
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (1, 3)]);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 0).unwrap();
        assert_eq!(result.get(NoteId::from_raw(3)).unwrap().distance, 1);
    }

    #[test]
    fn snippets_come_from_arriving_links() {
        let graph = FakeGraph::with_snippets(&[(1, 2, "to two"), (2, 3, "to three"), (1, 3, "")]);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 0).unwrap();
        let reach = result.get(NoteId::from_raw(3)).unwrap();
        let texts: Vec<&str> = reach.snippets.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["to three"]);
    }

    #[test]
    fn step_cap_truncates_dense_graphs() {
        let mut links = Vec::new();
        for a in 1..=12 {
            for b in 1..=12 {
                if a != b {
                    links.push((a, b));
                }
            }
        }
        let graph = FakeGraph::new(&links);
        let result = closure(&graph, &seed(1), LinkDirection::Outgoing, 0).unwrap();
        assert!(result.is_truncated());
        assert_eq!(result.len(), 11);
    }

    #[test]
    fn related_keeps_second_degree_neighbours() {
        // 1 -> 2 <- 3, and 2 -> 4
        let graph = FakeGraph::new(&[(1, 2), (3, 2), (2, 4)]);
        let result = related(&graph, &seed(1)).unwrap();
        assert_eq!(result, ids(&[3, 4]));
    }

    #[test]
    fn related_excludes_direct_neighbours() {
        // 3 is both one and two hops away; its minimum distance is 1
        let graph = FakeGraph::new(&[(1, 2), (2, 3), (1, 3)]);
        let result = related(&graph, &seed(1)).unwrap();
        assert!(result.is_empty());
    }
}
