//! The action queue: an ordered FIFO of pending action strings.
//!
//! Actions are flattened strings of the form `"<elementId>:<property>=<value>"`.
//! Elements push actions during their `set()`/`tick()` calls; the board pops
//! and delivers them after the current element sweep, so every element sees a
//! consistent view during its own tick. Queue order is strictly FIFO: actions
//! pushed earlier are always delivered earlier.
//!
//! Templates may contain the two-character placeholder `$v`, replaced by the
//! dispatched value before queuing, and may be comma separated lists that fan
//! out to several queued actions:
//!
//! ```
//! use tickboard::ActionQueue;
//!
//! let mut q = ActionQueue::new();
//! q.push("lamp1:value=$v,lamp2:value=$v", Some("1"), true);
//! assert_eq!(q.pop().as_deref(), Some("lamp1:value=1"));
//! assert_eq!(q.pop().as_deref(), Some("lamp2:value=1"));
//! assert_eq!(q.pop(), None);
//! ```

use std::collections::VecDeque;

use crate::list;

/// Placeholder replaced by the dispatched value before queuing.
pub const VALUE_PLACEHOLDER: &str = "$v";

/// FIFO of pending action invocations. Owned by the board; elements reach it
/// through their [`Context`](crate::Context).
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: VecDeque<String>,
}

impl ActionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action for later dispatching.
    ///
    /// An empty `action` is a no-op. When `value` is given, every `$v` in the
    /// template is replaced by it first. When `split` is true the substituted
    /// string is treated as a comma separated list and each item is queued
    /// independently; pass `split = false` when the value itself may contain
    /// commas (color lists and the like).
    pub fn push(&mut self, action: &str, value: Option<&str>, split: bool) {
        if action.is_empty() {
            return;
        }

        let resolved = match value {
            Some(v) => action.replace(VALUE_PLACEHOLDER, v),
            None => action.to_string(),
        };

        if split {
            for item in resolved.split(',') {
                if item.is_empty() {
                    tracing::trace!("skipping empty action item");
                } else {
                    self.actions.push_back(item.to_string());
                }
            }
        } else {
            self.actions.push_back(resolved);
        }
    }

    /// Queue an action without a value, split on commas.
    pub fn push_action(&mut self, action: &str) {
        self.push(action, None, true);
    }

    /// Queue an action with a string value, split on commas.
    pub fn push_value(&mut self, action: &str, value: &str) {
        self.push(action, Some(value), true);
    }

    /// Queue an action with an integer value (decimal ASCII).
    pub fn push_int(&mut self, action: &str, value: i64) {
        self.push(action, Some(&value.to_string()), true);
    }

    /// Queue `action` with the n-th comma separated item of `values` as its
    /// value. Used by sensors producing several readings in one string, each
    /// routed to a different downstream action.
    pub fn push_item(&mut self, action: &str, values: &str, n: usize) {
        if let Some(item) = list::at(values, n) {
            self.push(action, Some(item), true);
        }
    }

    /// Remove and return the oldest queued action.
    pub fn pop(&mut self) -> Option<String> {
        self.actions.pop_front()
    }

    /// True when no action is queued. Multi-step elements use this as a
    /// barrier: the next step is only issued once all previously queued
    /// actions have been delivered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = ActionQueue::new();
        q.push_action("a:p=1");
        q.push_action("b:p=2");
        q.push_action("c:p=3");
        assert_eq!(q.pop().as_deref(), Some("a:p=1"));
        assert_eq!(q.pop().as_deref(), Some("b:p=2"));
        assert_eq!(q.pop().as_deref(), Some("c:p=3"));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_placeholder_substitution() {
        let mut q = ActionQueue::new();
        q.push_value("x:onvalue=$v", "42");
        assert_eq!(q.pop().as_deref(), Some("x:onvalue=42"));
    }

    #[test]
    fn test_placeholder_all_occurrences() {
        let mut q = ActionQueue::new();
        q.push("a:p=$v,b:p=$v", Some("7"), true);
        assert_eq!(q.pop().as_deref(), Some("a:p=7"));
        assert_eq!(q.pop().as_deref(), Some("b:p=7"));
    }

    #[test]
    fn test_list_splitting() {
        let mut q = ActionQueue::new();
        q.push("a:p=1,b:p=2", None, true);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().as_deref(), Some("a:p=1"));
        assert_eq!(q.pop().as_deref(), Some("b:p=2"));

        // without splitting the commas stay part of the single action
        q.push("a:p=1,b:p=2", None, false);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop().as_deref(), Some("a:p=1,b:p=2"));
    }

    #[test]
    fn test_split_operates_on_substituted_template() {
        // the value introduces a comma only visible after substitution
        let mut q = ActionQueue::new();
        q.push("strip:color=$v", Some("red,blue"), false);
        assert_eq!(q.pop().as_deref(), Some("strip:color=red,blue"));

        q.push("strip:color=$v", Some("red,blue"), true);
        assert_eq!(q.pop().as_deref(), Some("strip:color=red"));
        assert_eq!(q.pop().as_deref(), Some("blue"));
    }

    #[test]
    fn test_empty_action_is_noop() {
        let mut q = ActionQueue::new();
        q.push("", Some("42"), true);
        q.push("", None, false);
        q.push_int("", 7);
        assert!(q.is_empty());
    }

    #[test]
    fn test_push_int() {
        let mut q = ActionQueue::new();
        q.push_int("v:value=$v", -3);
        assert_eq!(q.pop().as_deref(), Some("v:value=-3"));
    }

    #[test]
    fn test_push_item() {
        let mut q = ActionQueue::new();
        q.push_item("t:value=$v", "20.5,52", 0);
        q.push_item("h:value=$v", "20.5,52", 1);
        q.push_item("x:value=$v", "20.5,52", 2); // past the end: no-op
        assert_eq!(q.pop().as_deref(), Some("t:value=20.5"));
        assert_eq!(q.pop().as_deref(), Some("h:value=52"));
        assert_eq!(q.pop(), None);
    }
}
