//! Small collection helpers

/// Remove the first element matching `predicate`
///
/// Returns `true` if an element was found and removed.
pub fn remove_first<T>(items: &mut Vec<T>, predicate: impl FnMut(&T) -> bool) -> bool {
    match items.iter().position(predicate) {
        Some(index) => {
            items.remove(index);
            true
        },
        None => false,
    }
}
