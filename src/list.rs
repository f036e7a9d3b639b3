//! Helpers for strings used as comma separated lists.
//!
//! Action templates and multi-value sensor readings both travel as comma
//! separated lists ("temperature,humidity" or "lamp1:value=1,lamp2:value=1").
//! Compare functions are case-insensitive.

/// Number of items in the list. The empty string counts as one empty item.
pub fn length(list: &str) -> usize {
    list.split(',').count()
}

/// The item at `index`, or `None` past the end of the list.
///
/// # Example
///
/// ```
/// use tickboard::list;
///
/// assert_eq!(list::at("20.5,52", 1), Some("52"));
/// assert_eq!(list::at("20.5,52", 2), None);
/// ```
pub fn at(list: &str, index: usize) -> Option<&str> {
    list.split(',').nth(index)
}

/// First index of `item` in the list (case-insensitive), or `None`.
pub fn index_of(list: &str, item: &str) -> Option<usize> {
    list.split(',').position(|i| i.eq_ignore_ascii_case(item))
}
