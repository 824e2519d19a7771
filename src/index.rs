use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entity::EntityId;
use crate::report::IntelReport;

pub type Adjacency = BTreeMap<EntityId, u64>;

/// Weighted adjacency index: entity -> (connected entity -> frequency).
///
/// Every entity referenced on the value side is also a top-level key, so
/// traversal never dereferences a missing entity. Frequencies are strictly
/// positive; an absent edge means frequency zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndex {
    entries: BTreeMap<EntityId, Adjacency>,
}

impl EntityIndex {
    /// Register an entity, keeping any adjacency it already has.
    pub fn ensure(&mut self, id: &EntityId) {
        self.entries.entry(id.clone()).or_default();
    }

    /// Pin an edge to an exact weight, registering both endpoints.
    pub fn set_edge(&mut self, from: &EntityId, to: &EntityId, weight: u64) {
        self.ensure(to);
        self.entries
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), weight);
    }

    /// Increment an edge weight, registering both endpoints.
    pub fn bump_edge(&mut self, from: &EntityId, to: &EntityId, by: u64) {
        self.ensure(to);
        *self
            .entries
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_insert(0) += by;
    }

    pub fn has_edge(&self, from: &EntityId, to: &EntityId) -> bool {
        self.entries
            .get(from)
            .map(|adj| adj.contains_key(to))
            .unwrap_or(false)
    }

    /// Replace an entity's adjacency wholesale.
    pub fn replace_adjacency<I>(&mut self, id: &EntityId, adjacency: I)
    where
        I: IntoIterator<Item = (EntityId, u64)>,
    {
        let adjacency: Adjacency = adjacency.into_iter().collect();
        for target in adjacency.keys() {
            self.ensure(target);
        }
        self.entries.insert(id.clone(), adjacency);
    }

    pub fn adjacency(&self, id: &EntityId) -> Option<&Adjacency> {
        self.entries.get(id)
    }

    /// Total outgoing edge weight; the frequency the filter bounds apply to.
    pub fn out_weight(&self, id: &EntityId) -> u64 {
        self.entries
            .get(id)
            .map(|adj| adj.values().sum())
            .unwrap_or(0)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Adjacency> {
        self.entries.remove(id)
    }

    /// Drop every edge in the index that targets `id`.
    pub fn strip_edges_to(&mut self, id: &EntityId) {
        for adjacency in self.entries.values_mut() {
            adjacency.remove(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Adjacency)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut Adjacency)> {
        self.entries.iter_mut()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closure invariant: every adjacency target exists as a top-level key.
    pub fn is_closed(&self) -> bool {
        self.entries
            .values()
            .flat_map(|adj| adj.keys())
            .all(|target| self.entries.contains_key(target))
    }
}

static THREAD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"thread_([^_]*)").unwrap());

/// Thread bucket for a post id: the `thread_XXX` marker embedded in the id,
/// or the shared `thread[unknown]` bucket when no marker is present.
fn thread_for_post(post_id: &str) -> EntityId {
    match THREAD_MARKER.captures(post_id) {
        Some(caps) => EntityId::Thread(caps[1].to_string()),
        None => EntityId::Thread("unknown".to_string()),
    }
}

/// Build the entity index from a decoded report.
///
/// Per post: author->post and thread->post edges are pinned to weight 1, the
/// page-URL edge replaces the post's adjacency wholesale (entity mention
/// edges are then added alongside it), and every entity mention bumps the
/// post->entity and thread->entity counters.
pub fn index_report(report: &IntelReport) -> EntityIndex {
    let mut index = EntityIndex::default();

    for (post_id, post) in report {
        let post_entity = EntityId::Post {
            author: post.author.clone(),
            post_id: post_id.clone(),
        };
        let author_entity = EntityId::Person(post.author.clone());
        let page_entity = EntityId::PageUrl(post.page_url.clone());
        let thread_entity = thread_for_post(post_id);

        index.set_edge(&author_entity, &post_entity, 1);
        index.set_edge(&thread_entity, &post_entity, 1);

        index.replace_adjacency(&post_entity, [(page_entity, 1)]);

        for extractions in post.sentences.values() {
            for extraction in extractions {
                for label in &extraction.entity {
                    let entity = EntityId::parse(label);
                    index.ensure(&entity);

                    // first mention in this post seeds both counters; the
                    // thread counter tracks the post-local one on purpose
                    if index.has_edge(&post_entity, &entity) {
                        index.bump_edge(&post_entity, &entity, 1);
                        index.bump_edge(&thread_entity, &entity, 1);
                    } else {
                        index.set_edge(&post_entity, &entity, 1);
                        index.set_edge(&thread_entity, &entity, 1);
                    }
                }
            }
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{entity, report_from_json};
    use serde_json::json;

    fn two_post_report() -> IntelReport {
        report_from_json(json!({
            "p1_thread_7_a": {
                "author": "alice",
                "page_url": "https://example.org/t/7",
                "sent_0": [ { "entity": ["entity:kuth"] } ],
                "sent_1": [ { "entity": ["entity:kuth"] } ]
            },
            "p2_thread_7_b": {
                "author": "alice",
                "page_url": "https://example.org/t/7",
                "sent_0": [ { "entity": ["entity:kuth", "entity:kostum"] } ]
            }
        }))
    }

    #[test]
    fn test_closure_invariant() {
        let index = index_report(&two_post_report());
        assert!(index.is_closed());
    }

    #[test]
    fn test_author_and_thread_edges() {
        let index = index_report(&two_post_report());
        let author = entity("NER-PERSON:alice");
        let thread = entity("thread[7]");
        let p1 = entity("posts[alice]@@@p1_thread_7_a");
        let p2 = entity("posts[alice]@@@p2_thread_7_b");

        assert_eq!(index.adjacency(&author).unwrap()[&p1], 1);
        assert_eq!(index.adjacency(&author).unwrap()[&p2], 1);
        assert_eq!(index.adjacency(&thread).unwrap()[&p1], 1);
        assert_eq!(index.adjacency(&thread).unwrap()[&p2], 1);
    }

    #[test]
    fn test_post_adjacency_has_page_url_and_mentions() {
        let index = index_report(&two_post_report());
        let p1 = entity("posts[alice]@@@p1_thread_7_a");
        let adj = index.adjacency(&p1).unwrap();

        assert_eq!(adj[&entity("PAGE-URL:https://example.org/t/7")], 1);
        // two mentions of the same entity in one post
        assert_eq!(adj[&entity("entity:kuth")], 2);
        assert_eq!(adj.len(), 2);
    }

    #[test]
    fn test_thread_counter_follows_post_local_mentions() {
        let index = index_report(&two_post_report());
        let thread = entity("thread[7]");
        let adj = index.adjacency(&thread).unwrap();

        // p1 mentions kuth twice (1 then +1), p2's first mention re-seeds to 1
        assert_eq!(adj[&entity("entity:kuth")], 1);
        assert_eq!(adj[&entity("entity:kostum")], 1);
    }

    #[test]
    fn test_thread_unknown_bucket_is_shared() {
        let report = report_from_json(json!({
            "p1": { "author": "a", "page_url": "u" },
            "p2": { "author": "b", "page_url": "u" }
        }));
        let index = index_report(&report);
        let unknown = entity("thread[unknown]");
        assert_eq!(index.adjacency(&unknown).unwrap().len(), 2);
    }

    #[test]
    fn test_thread_marker_extraction() {
        assert_eq!(thread_for_post("p_thread_42_x"), EntityId::Thread("42".to_string()));
        assert_eq!(thread_for_post("thread_9"), EntityId::Thread("9".to_string()));
        assert_eq!(thread_for_post("plainpost"), EntityId::Thread("unknown".to_string()));
        // empty marker is kept literally, not mapped to unknown
        assert_eq!(thread_for_post("p_thread__x"), EntityId::Thread(String::new()));
    }

    #[test]
    fn test_out_weight_sums_outgoing_edges() {
        let index = index_report(&two_post_report());
        let p1 = entity("posts[alice]@@@p1_thread_7_a");
        assert_eq!(index.out_weight(&p1), 3); // page url 1 + kuth 2
    }
}
