use crate::CatalogIndex;
use cubegate_core::{GatewayError, IndexedMember, MemberType};
use serde::Serialize;

/// One fuzzy-search result: the member plus the score it matched with
/// (higher is a closer match).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub member: IndexedMember,
    pub score: f64,
}

/// Narrows a [`search`] call beyond the free-text query. `types`/`cubes`
/// restrict the member kind/owning cube; `include_hidden` lifts the
/// default exclusion of `isVisible=false` members. `public=false` members
/// are never returned regardless of `include_hidden`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub types: Option<Vec<MemberType>>,
    pub cubes: Option<Vec<String>>,
    pub include_hidden: bool,
}

const MAX_SEARCH_LIMIT: usize = 50;

/// Fuzzy-search exposed, non-PII members by name/title/description.
/// Matching uses Jaro-Winkler similarity against the query, case
/// insensitively, and keeps results above a low relevance floor so an
/// empty or garbage query doesn't return the whole catalog.
pub fn search(index: &CatalogIndex, query: &str, limit: usize, filter: &SearchFilter) -> Vec<SearchHit> {
    const RELEVANCE_FLOOR: f64 = 0.35;
    let needle = query.to_lowercase();

    let mut hits: Vec<SearchHit> = index
        .all()
        .into_iter()
        .filter(|m| m.exposed && !m.pii)
        .filter(|m| m.public)
        .filter(|m| filter.include_hidden || m.is_visible)
        .filter(|m| {
            filter
                .types
                .as_ref()
                .map_or(true, |types| types.contains(&m.member_type))
        })
        .filter(|m| {
            filter
                .cubes
                .as_ref()
                .map_or(true, |cubes| cubes.iter().any(|c| c == &m.cube_name))
        })
        .filter_map(|m| {
            let score = member_score(&m, &needle);
            (score >= RELEVANCE_FLOOR).then_some(SearchHit { member: m, score })
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    hits.truncate(limit.min(MAX_SEARCH_LIMIT));
    hits
}

fn member_score(member: &IndexedMember, needle: &str) -> f64 {
    let candidates = [
        member.name.to_lowercase(),
        member.title.to_lowercase(),
        member
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase(),
    ];

    candidates
        .iter()
        .map(|c| {
            if c.contains(needle) {
                1.0
            } else {
                strsim::jaro_winkler(c, needle)
            }
        })
        .fold(0.0_f64, f64::max)
}

/// Name-only suggestions for an unknown-member error, regardless of
/// exposure (a caller who mistyped an internal name still deserves a
/// useful hint, even though they can't query it).
pub fn suggest(index: &CatalogIndex, name: &str, limit: usize) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut scored: Vec<(f64, String)> = index
        .all()
        .into_iter()
        .map(|m| (strsim::jaro_winkler(&m.name.to_lowercase(), &needle), m.name))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
    scored.truncate(limit);
    scored.into_iter().map(|(_, name)| name).collect()
}

/// Describe a single member: full metadata plus related members (siblings
/// in the same cube, and anything it lists in `drillMembers`).
pub fn describe(index: &CatalogIndex, name: &str) -> Result<DescribeResult, GatewayError> {
    let member = index.require(name)?;
    if !member.exposed {
        return Err(GatewayError::MemberNotExposed(name.to_string()));
    }

    let related: Vec<IndexedMember> = index
        .all()
        .into_iter()
        .filter(|m| m.name != member.name)
        .filter(|m| m.exposed)
        .filter(|m| m.public && m.is_visible)
        .filter(|m| m.cube_name == member.cube_name || member.drill_members.contains(&m.name))
        .collect();

    Ok(DescribeResult { member, related })
}

#[derive(Debug, Clone, Serialize)]
pub struct DescribeResult {
    pub member: IndexedMember,
    pub related: Vec<IndexedMember>,
}
