use std::cmp::Ordering;

use crate::models::Project;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    NoMatch,
    Unique(&'a Project),
    Ambiguous(Vec<&'a Project>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MatchScore {
    gaps: usize,
    start: usize,
}

/// Resolves a user-typed name to a single project.
///
/// A case-insensitive exact name match wins outright when it is unique;
/// otherwise the fuzzy matches decide.
pub fn resolve<'a>(query: &str, projects: &'a [Project]) -> Resolution<'a> {
    let folded = fold(query);
    let exact: Vec<&Project> = projects
        .iter()
        .filter(|project| fold(&project.name) == folded)
        .collect();
    if let [project] = exact.as_slice() {
        return Resolution::Unique(*project);
    }

    let mut matches = find_projects(query, projects);
    match matches.len() {
        0 => Resolution::NoMatch,
        1 => Resolution::Unique(matches.remove(0)),
        _ => Resolution::Ambiguous(matches),
    }
}

/// Projects whose short name contains every query character in order,
/// ignoring case, best match first.
pub fn find_projects<'a>(query: &str, projects: &'a [Project]) -> Vec<&'a Project> {
    let needle = fold(query);
    let mut scored: Vec<(MatchScore, &Project)> = projects
        .iter()
        .filter_map(|project| {
            let hay = fold(&project.name);
            match_score(&needle, &hay).map(|score| (score, project))
        })
        .collect();

    scored.sort_by(|(left_score, left), (right_score, right)| {
        left_score
            .cmp(right_score)
            .then_with(|| left.name.chars().count().cmp(&right.name.chars().count()))
            .then_with(|| compare_names(&left.name, &right.name))
    });

    scored.into_iter().map(|(_, project)| project).collect()
}

/// Case-insensitive ordering used wherever project names are listed.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    fold(left)
        .cmp(&fold(right))
        .then_with(|| left.cmp(right))
}

fn fold(value: &str) -> Vec<char> {
    value.chars().flat_map(char::to_lowercase).collect()
}

/// Tightest window of `hay` holding `needle` as a subsequence.
fn match_score(needle: &[char], hay: &[char]) -> Option<MatchScore> {
    let Some(&first) = needle.first() else {
        return Some(MatchScore { gaps: 0, start: 0 });
    };

    let mut best: Option<MatchScore> = None;
    for (start, _) in hay.iter().enumerate().filter(|(_, c)| **c == first) {
        let Some(end) = subsequence_end(&needle[1..], &hay[start + 1..]) else {
            // No later start can finish either.
            break;
        };
        let window = (end + 2) as usize;
        let score = MatchScore {
            gaps: window - needle.len(),
            start,
        };
        if best.is_none_or(|current| score < current) {
            best = Some(score);
        }
    }
    best
}

fn subsequence_end(needle: &[char], hay: &[char]) -> Option<isize> {
    let mut position: isize = -1;
    let mut rest = hay;
    for c in needle {
        let offset = rest.iter().position(|h| h == c)?;
        position += offset as isize + 1;
        rest = &rest[offset + 1..];
    }
    Some(position)
}
