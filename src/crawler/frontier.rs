//! Crawl frontier: breadth-first work queue plus visited set
//!
//! The frontier has a single owner (the coordinator). Fetch tasks never touch
//! it; discovered references are fed back through the coordinator, so every
//! claim check and insertion happens on one task.

use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// Ordered pending URLs and the set of URLs already handed out
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, oldest first
    pending: VecDeque<CanonicalUrl>,

    /// Membership index for `pending`
    pending_set: HashSet<CanonicalUrl>,

    /// URLs handed out by `next` or claimed explicitly
    visited: HashSet<CanonicalUrl>,

    /// Stop handing out URLs once `next` has returned this many
    max_iterations: Option<usize>,

    /// Number of URLs handed out by `next`
    iterations: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_iterations` - Optional cap on the number of URLs handed out;
    ///   claimed redirect destinations do not count toward it
    pub fn new(max_iterations: Option<usize>) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Adds a URL unless it is already visited or pending
    ///
    /// Returns true if the URL was added.
    pub fn enqueue(&mut self, url: CanonicalUrl) -> bool {
        if self.visited.contains(&url) || self.pending_set.contains(&url) {
            return false;
        }
        self.pending_set.insert(url.clone());
        self.pending.push_back(url);
        true
    }

    /// Removes and returns the earliest pending URL, marking it visited
    ///
    /// Returns `None` when nothing is pending or the cap is reached.
    pub fn next(&mut self) -> Option<CanonicalUrl> {
        if self.is_capped() {
            return None;
        }

        let url = self.pending.pop_front()?;
        self.pending_set.remove(&url);
        self.visited.insert(url.clone());
        self.iterations += 1;
        Some(url)
    }

    /// Atomically claims a URL that was not obtained through `next`
    ///
    /// Returns false if the URL was already visited. A pending URL is removed
    /// from the queue, so it is never fetched.
    pub fn claim(&mut self, url: &CanonicalUrl) -> bool {
        if self.visited.contains(url) {
            return false;
        }
        if self.pending_set.remove(url) {
            self.pending.retain(|u| u != url);
        }
        self.visited.insert(url.clone());
        true
    }

    /// Marks a URL visited without handing it out
    pub fn mark_visited(&mut self, url: CanonicalUrl) {
        if self.pending_set.remove(&url) {
            self.pending.retain(|u| u != &url);
        }
        self.visited.insert(url);
    }

    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &CanonicalUrl) -> bool {
        self.pending_set.contains(url)
    }

    /// Returns true if no URL can be handed out
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() || self.is_capped()
    }

    /// Returns true if `next` has handed out the maximum number of URLs
    pub fn is_capped(&self) -> bool {
        self.max_iterations.is_some_and(|max| self.iterations >= max)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs handed out by `next`
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Drains the URLs that were never handed out
    pub fn drain_pending(&mut self) -> Vec<CanonicalUrl> {
        self.pending_set.clear();
        self.pending.drain(..).collect()
    }
}
