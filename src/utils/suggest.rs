fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn normalize(value: &str) -> Vec<char> {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Closest known names to `input`, best first. Used for "did you mean" hints
/// on mistyped tool names.
pub fn suggest(input: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    let needle = normalize(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let allowed = (needle.len() / 3).max(1);
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let hay = normalize(candidate);
            let score = if hay == needle {
                0
            } else if contains(&hay, &needle) || contains(&needle, &hay) {
                1
            } else {
                levenshtein(&needle, &hay)
            };
            (score <= allowed).then_some((score, *candidate))
        })
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn contains(hay: &[char], needle: &[char]) -> bool {
    !needle.is_empty() && hay.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::suggest;

    const TOOLS: &[&str] = &["http_get", "http_post", "http_raw_request"];

    #[test]
    fn suggests_close_tool_names() {
        assert_eq!(suggest("http_gte", TOOLS, 3), vec!["http_get".to_string()]);
        assert_eq!(suggest("raw_request", TOOLS, 3), vec!["http_raw_request".to_string()]);
    }

    #[test]
    fn unrelated_input_yields_nothing() {
        assert!(suggest("ssh_exec", TOOLS, 3).is_empty());
        assert!(suggest("", TOOLS, 3).is_empty());
    }
}
