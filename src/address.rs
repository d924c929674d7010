//src/address.rs

//! Tree addresses: the root has the empty address, and a node's address is
//! its parent's address extended by the 1-based index of the node among its
//! parent's children, tokens joined by `.` (e.g. `"1.2.3"`).

/// Separator between the per-level tokens of an address.
pub const SEPARATOR: char = '.';

/// Address of the `index`-th (0-based) child of the node at `parent`.
pub fn child_address(parent: &str, index: usize) -> String {
    if parent.is_empty() {
        (index + 1).to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, index + 1)
    }
}

/// True if `ancestor` denotes `descendant` itself or one of its ancestors.
pub fn is_ancestor_or_self(ancestor: &str, descendant: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    match descendant.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Sorts the addresses and drops every entry that is an ancestor of (or equal
/// to) its successor. Because all descendants of `A` sort directly after `A`,
/// one left-to-right compaction pass suffices.
pub fn remove_nested<S: AsRef<str> + Ord>(addresses: &mut Vec<S>) {
    addresses.sort_unstable();
    if addresses.len() < 2 {
        return;
    }
    let n = addresses.len();
    let mut keep = 0;
    for i in 0..n {
        let nested = i + 1 < n
            && is_ancestor_or_self(addresses[i].as_ref(), addresses[i + 1].as_ref());
        if !nested {
            addresses.swap(keep, i);
            keep += 1;
        }
    }
    addresses.truncate(keep);
}

/// Longest common prefix of the given addresses, cut back to a full token so
/// that it is itself the address of a node. Empty input yields the root.
pub fn longest_common_prefix<S: AsRef<str>>(addresses: &[S]) -> String {
    let first = match addresses.first() {
        Some(a) => a.as_ref(),
        None => return String::new(),
    };

    let mut len = first.len();
    for other in &addresses[1..] {
        let other = other.as_ref();
        len = first
            .bytes()
            .zip(other.bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
        if len == 0 {
            return String::new();
        }
    }

    let prefix = &first[..len];
    let ends_on_token = addresses.iter().all(|a| {
        let a = a.as_ref();
        a.len() == len || a[len..].starts_with(SEPARATOR)
    });
    if ends_on_token {
        return prefix.to_string();
    }
    match prefix.rfind(SEPARATOR) {
        Some(pos) => prefix[..pos].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_address() {
        assert_eq!(child_address("", 0), "1");
        assert_eq!(child_address("1.2", 2), "1.2.3");
    }

    #[test]
    fn test_ancestor_is_token_aware() {
        assert!(is_ancestor_or_self("1.2", "1.2.3"));
        assert!(is_ancestor_or_self("1.2", "1.2"));
        assert!(is_ancestor_or_self("", "7.1"));
        assert!(!is_ancestor_or_self("1.2", "1.23"));
        assert!(!is_ancestor_or_self("1.2.3", "1.2"));
    }

    #[test]
    fn test_remove_nested() {
        let mut addresses = vec!["1.2.4", "1.2.3.5", "1.2.3"];
        remove_nested(&mut addresses);
        assert_eq!(addresses, vec!["1.2.3.5", "1.2.4"]);

        let mut duplicates = vec!["3.1", "3.1", "3"];
        remove_nested(&mut duplicates);
        assert_eq!(duplicates, vec!["3.1"]);

        let mut siblings = vec!["1.23", "1.2"];
        remove_nested(&mut siblings);
        assert_eq!(siblings, vec!["1.2", "1.23"]);
    }

    #[test]
    fn test_common_prefix_scenario() {
        let mut addresses = vec!["1.2.3", "1.2.4", "1.2.3.5"];
        remove_nested(&mut addresses);
        assert_eq!(longest_common_prefix(&addresses), "1.2");
    }

    #[test]
    fn test_common_prefix_never_splits_a_token() {
        assert_eq!(longest_common_prefix(&["1.2", "1.23"]), "1");
        assert_eq!(longest_common_prefix(&["12.1", "13.1"]), "");
        assert_eq!(longest_common_prefix(&["1.10.2", "1.11"]), "1");
        assert_eq!(longest_common_prefix(&["2.5.1", "2.5.1"]), "2.5.1");
        assert_eq!(longest_common_prefix(&["2.5", "2.5.1"]), "2.5");
        assert_eq!(longest_common_prefix(&["4.1"]), "4.1");
        assert_eq!(longest_common_prefix::<&str>(&[]), "");
    }
}
