//! Thread building algorithm.
//!
//! This module assembles an ordered forest of discussion threads from the
//! flat engagement list returned by the backend.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::response::Engagement;

use super::types::{DiscussionForest, ThreadNode};

/// Bucket key for messages without a parent.
const ROOT_BUCKET: &str = "";

/// Build a discussion forest from a flat list of engagements.
///
/// Steps:
/// 1. Groups engagements into buckets keyed by parent id (`""` for roots)
/// 2. Sorts the root bucket newest first and every reply bucket oldest first
/// 3. Walks the buckets from the roots, attaching each engagement's own bucket
///    as its children
/// 4. Reports messages that could not be reached
///
/// A message whose parent is not in the list is left out of the forest along
/// with its replies; the ids are available through [`DiscussionForest::dropped`].
/// Timestamps that fail to parse sort as the epoch.
///
/// # Errors
///
/// Returns [`Error::CyclicThread`] when an engagement is its own ancestor.
///
/// # Example
///
/// ```
/// use gradian_client::response::Engagement;
/// use gradian_client::threading::build_threads;
///
/// let forest = build_threads(vec![
///     Engagement::new("a", "2024-01-01T00:00:00Z", "first"),
///     Engagement::new("b", "2024-01-02T00:00:00Z", "reply").in_reply_to("a"),
///     Engagement::new("c", "2024-01-03T00:00:00Z", "second"),
/// ]).unwrap();
///
/// let roots: Vec<&str> = forest.roots().iter().map(|n| n.id()).collect();
/// assert_eq!(roots, vec!["c", "a"]);
/// assert_eq!(forest.roots()[1].children[0].id(), "b");
/// ```
pub fn build_threads(engagements: Vec<Engagement>) -> Result<DiscussionForest> {
    if engagements.is_empty() {
        return Ok(DiscussionForest::default());
    }

    let message_count = engagements.len();

    // Id -> parent id, kept to classify unreachable messages afterwards
    let mut parent_of: HashMap<String, Option<String>> = HashMap::with_capacity(message_count);
    let input_order: Vec<String> = engagements.iter().map(|e| e.id.clone()).collect();

    // Step 1: bucket by parent
    let mut buckets: HashMap<String, Vec<(i64, Engagement)>> = HashMap::new();
    for engagement in engagements {
        let parent = engagement.parent_id().map(str::to_string);
        parent_of
            .entry(engagement.id.clone())
            .or_insert_with(|| parent.clone());
        let key = parent.unwrap_or_else(|| ROOT_BUCKET.to_string());
        let created = engagement.created_at_millis();
        buckets.entry(key).or_default().push((created, engagement));
    }

    // Step 2: sort buckets (stable, so ties keep input order)
    for (key, bucket) in buckets.iter_mut() {
        if key == ROOT_BUCKET {
            bucket.sort_by_key(|(created, _)| Reverse(*created));
        } else {
            bucket.sort_by_key(|(created, _)| *created);
        }
    }

    // Step 3: assemble
    let roots = buckets.remove(ROOT_BUCKET).unwrap_or_default();
    let forest_roots = assemble(roots, &mut buckets)?;

    // Step 4: whatever is left in the buckets was never reached
    let dropped = unreachable_messages(&buckets, &parent_of, &input_order)?;
    if !dropped.is_empty() {
        debug!(
            count = dropped.len(),
            "Dropping discussion messages whose parent is missing"
        );
    }

    Ok(DiscussionForest::new(forest_roots, dropped))
}

/// Iteratively build the trees under the given roots.
///
/// Builds pre-order into an arena and then links nodes bottom-up, so deep
/// threads cannot overflow the stack.
fn assemble(
    roots: Vec<(i64, Engagement)>,
    buckets: &mut HashMap<String, Vec<(i64, Engagement)>>,
) -> Result<Vec<ThreadNode>> {
    // Phase 1: pre-order walk into an arena of (engagement, parent index)
    let mut arena: Vec<(Option<Engagement>, Option<usize>)> = Vec::new();
    let mut children_of: Vec<Vec<usize>> = Vec::new();
    let mut root_indices: Vec<usize> = Vec::new();

    let mut stack: Vec<(Engagement, Option<usize>)> =
        roots.into_iter().rev().map(|(_, e)| (e, None)).collect();

    // Arena indices and ids of the current node's ancestors
    let mut path: Vec<usize> = Vec::new();
    let mut on_path: HashSet<String> = HashSet::new();

    while let Some((engagement, parent)) = stack.pop() {
        // Pre-order: the parent is always on the path of the node popped last
        while let Some(&top) = path.last() {
            if Some(top) == parent {
                break;
            }
            path.pop();
            if let (Some(left), _) = &arena[top] {
                on_path.remove(&left.id);
            }
        }

        // An id that already occurs on its own ancestor path closes a cycle
        if on_path.contains(&engagement.id) {
            return Err(Error::CyclicThread { id: engagement.id });
        }

        let index = arena.len();
        match parent {
            Some(parent_index) => children_of[parent_index].push(index),
            None => root_indices.push(index),
        }

        if let Some(replies) = buckets.remove(&engagement.id) {
            // Reverse so the oldest reply is processed first
            for (_, reply) in replies.into_iter().rev() {
                stack.push((reply, Some(index)));
            }
        }

        path.push(index);
        on_path.insert(engagement.id.clone());
        arena.push((Some(engagement), parent));
        children_of.push(Vec::new());
    }

    // Phase 2: children always have higher indices than their parent
    let mut built: Vec<Option<ThreadNode>> = (0..arena.len()).map(|_| None).collect();
    for index in (0..arena.len()).rev() {
        let Some(engagement) = arena[index].0.take() else {
            continue;
        };
        let children = children_of[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(ThreadNode {
            engagement,
            children,
        });
    }

    Ok(root_indices
        .into_iter()
        .filter_map(|index| built[index].take())
        .collect())
}

/// Classify messages left in the buckets after assembly.
///
/// A leftover message either hangs below a missing parent (dropped) or below
/// a parent chain that loops back on itself (cycle).
fn unreachable_messages(
    leftover: &HashMap<String, Vec<(i64, Engagement)>>,
    parent_of: &HashMap<String, Option<String>>,
    input_order: &[String],
) -> Result<Vec<String>> {
    if leftover.is_empty() {
        return Ok(Vec::new());
    }

    // Chains already known to end at a root or a missing parent
    let mut terminates: HashSet<&str> = HashSet::new();
    for parent_id in leftover.keys() {
        let mut chain: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = parent_id.as_str();
        loop {
            if terminates.contains(current) {
                break;
            }
            if !seen.insert(current) {
                return Err(Error::CyclicThread {
                    id: current.to_string(),
                });
            }
            chain.push(current);
            match parent_of.get(current) {
                Some(Some(next)) => current = next,
                // Missing parent or a root: the chain terminates
                _ => break,
            }
        }
        terminates.extend(chain);
    }

    let unreachable: HashSet<&str> = leftover
        .values()
        .flatten()
        .map(|(_, e)| e.id.as_str())
        .collect();
    // Replies below a dropped message were never reached either, so the
    // leftover buckets already hold every dropped descendant
    let mut dropped: Vec<String> = Vec::with_capacity(unreachable.len());
    let mut emitted: HashSet<&str> = HashSet::with_capacity(unreachable.len());
    for id in input_order {
        if unreachable.contains(id.as_str()) && emitted.insert(id.as_str()) {
            dropped.push(id.clone());
        }
    }

    Ok(dropped)
}
