//! Search query helpers

use crate::normalize::normalize;

/// Quick-pick searches offered next to the search box
pub const POPULAR_SEARCHES: [&str; 3] = ["Pikachu", "Ditto", "Charizard"];

/// Clean a query as typed into the search box
pub fn clean_query(raw: &str) -> &str {
    raw.trim()
}

/// True if `candidate` is the entry currently being searched for
pub fn is_active_search(candidate: &str, query: &str) -> bool {
    let query = normalize(query);
    !query.is_empty() && normalize(candidate) == query
}

/// Popular searches on one line, with the active one in brackets
pub fn popular_nav(query: &str) -> String {
    POPULAR_SEARCHES
        .iter()
        .map(|candidate| {
            if is_active_search(candidate, query) {
                format!("[{}]", candidate)
            } else {
                candidate.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
