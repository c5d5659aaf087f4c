//! Expanding stops to the quays a rider can actually board at.

use std::collections::BTreeSet;

use crate::feed::FeedIndex;

/// The stop itself, plus its members if it is a parent, plus its siblings if
/// it is a member.
///
/// Unknown ids are returned as-is so they simply never match a trip.
pub fn expand_to_boardable(index: &FeedIndex, stop_id: &str) -> BTreeSet<String> {
    let mut expanded = BTreeSet::from([stop_id.to_string()]);

    if let Some(members) = index.members(stop_id) {
        expanded.extend(members.iter().cloned());
    }

    let parent = index.stop(stop_id).and_then(|s| s.parent_id.as_deref());
    if let Some(siblings) = parent.and_then(|p| index.members(p)) {
        expanded.extend(siblings.iter().cloned());
    }

    expanded
}

/// Union of [`expand_to_boardable`] over several ids.
pub fn expand_all<'a>(index: &FeedIndex, ids: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    ids.into_iter()
        .flat_map(|id| expand_to_boardable(index, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::fixture::FeedBuilder;

    fn index() -> FeedIndex {
        FeedBuilder::new()
            .station("GARE", "Gare", 45.187, 0.706)
            .quay("GARE_A", "Gare A", 45.1871, 0.7061, Some("GARE"))
            .quay("GARE_B", "Gare B", 45.1869, 0.7059, Some("GARE"))
            .quay("LONE", "Mairie", 45.19, 0.71, None)
            .build()
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn parent_expands_to_members() {
        let set = expand_to_boardable(&index(), "GARE");
        assert_eq!(ids(&set), ["GARE", "GARE_A", "GARE_B"]);
    }

    #[test]
    fn quay_expands_to_siblings() {
        let set = expand_to_boardable(&index(), "GARE_A");
        assert!(set.contains("GARE_B"));
        assert!(!set.contains("GARE"));
    }

    #[test]
    fn lone_and_unknown_stops() {
        assert_eq!(ids(&expand_to_boardable(&index(), "LONE")), ["LONE"]);
        assert_eq!(ids(&expand_to_boardable(&index(), "NOPE")), ["NOPE"]);
    }

    #[test]
    fn expand_all_unions() {
        let set = expand_all(&index(), ["LONE", "GARE_B"]);
        assert_eq!(ids(&set), ["GARE_A", "GARE_B", "LONE"]);
    }
}
