//! Core types for discussion threads.

use crate::response::Engagement;

/// A node in the thread tree, containing an engagement and its replies.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadNode {
    /// The engagement at this node
    pub engagement: Engagement,
    /// Direct replies, oldest first
    pub children: Vec<ThreadNode>,
}

impl ThreadNode {
    /// Create a new thread node with no replies.
    pub fn new(engagement: Engagement) -> Self {
        Self {
            engagement,
            children: Vec::new(),
        }
    }

    /// Id of the engagement at this node.
    pub fn id(&self) -> &str {
        &self.engagement.id
    }

    /// Get the number of direct replies.
    pub fn reply_count(&self) -> usize {
        self.children.len()
    }

    /// Check if this engagement has any replies.
    pub fn has_replies(&self) -> bool {
        !self.children.is_empty()
    }

    /// Find a node by engagement id in this subtree.
    pub fn find(&self, id: &str) -> Option<&ThreadNode> {
        ThreadNodeIterator::new(std::slice::from_ref(self)).find(|node| node.id() == id)
    }

    /// Count all engagements in this subtree, including this one.
    pub fn count_messages(&self) -> usize {
        ThreadNodeIterator::new(std::slice::from_ref(self)).count()
    }

    /// Get the maximum depth of the subtree (0 if no replies).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        max
    }

    /// The most recent `createdAt` in this subtree, in epoch milliseconds.
    pub fn latest_activity_millis(&self) -> i64 {
        ThreadNodeIterator::new(std::slice::from_ref(self))
            .map(|node| node.engagement.created_at_millis())
            .max()
            .unwrap_or(0)
    }
}

impl Drop for ThreadNode {
    // Detach descendants onto a heap stack so long chains drop without recursion
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// An ordered forest of discussion threads.
///
/// Roots are ordered newest first. Messages whose parent was not part of
/// the input are not in the forest; their ids are kept in [`dropped`](Self::dropped).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscussionForest {
    roots: Vec<ThreadNode>,
    dropped: Vec<String>,
}

impl DiscussionForest {
    /// Create a forest from ordered roots and the ids of dropped messages.
    pub fn new(roots: Vec<ThreadNode>, dropped: Vec<String>) -> Self {
        Self { roots, dropped }
    }

    /// The root nodes, newest first.
    pub fn roots(&self) -> &[ThreadNode] {
        &self.roots
    }

    /// Number of threads (root messages).
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if the forest has no threads.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of engagements in the forest.
    pub fn total_messages(&self) -> usize {
        self.iter().count()
    }

    /// Ids of messages excluded because their parent was missing.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Find a node anywhere in the forest.
    pub fn find(&self, id: &str) -> Option<&ThreadNode> {
        self.iter().find(|node| node.id() == id)
    }

    /// Longest reply chain across all threads.
    pub fn max_depth(&self) -> usize {
        self.roots.iter().map(ThreadNode::max_depth).max().unwrap_or(0)
    }

    /// Iterate over all nodes depth-first, in display order.
    pub fn iter(&self) -> ThreadNodeIterator<'_> {
        ThreadNodeIterator::new(&self.roots)
    }

    /// Consume the forest, returning its roots.
    pub fn into_roots(self) -> Vec<ThreadNode> {
        self.roots
    }
}

impl IntoIterator for DiscussionForest {
    type Item = ThreadNode;
    type IntoIter = std::vec::IntoIter<ThreadNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiscussionForest {
    type Item = &'a ThreadNode;
    type IntoIter = ThreadNodeIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first iterator over thread nodes.
pub struct ThreadNodeIterator<'a> {
    stack: Vec<&'a ThreadNode>,
}

impl<'a> ThreadNodeIterator<'a> {
    /// Create a new iterator over the given sibling nodes.
    pub fn new(nodes: &'a [ThreadNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for ThreadNodeIterator<'a> {
    type Item = &'a ThreadNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order so they're processed left-to-right
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
