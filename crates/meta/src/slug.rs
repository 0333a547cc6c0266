// ABOUTME: Derives a readable title from URL path slugs.
// ABOUTME: Last-resort title source when no page content or title is available.

use url::Url;

/// Minimum number of words for a path segment to count as a slug.
const MIN_SLUG_WORDS: usize = 2;

/// Minimum combined length of the words (separators excluded).
const MIN_SLUG_CHARS: usize = 10;

/// Words of a path segment if it looks like a title slug.
fn slug_words(segment: &str) -> Option<Vec<&str>> {
    let cut = segment
        .find(|c| matches!(c, '?' | '=' | '&'))
        .unwrap_or(segment.len());
    let words = split_words(&segment[..cut]);

    let letters: usize = words.iter().map(|w| w.chars().count()).sum();
    if words.len() >= MIN_SLUG_WORDS && letters >= MIN_SLUG_CHARS {
        Some(words)
    } else {
        None
    }
}

fn split_words(segment: &str) -> Vec<&str> {
    segment
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case a single slug without any qualification thresholds.
pub(crate) fn humanize(segment: &str) -> String {
    title_case(&split_words(segment))
}

/// Title from the most title-like path segment, else the hostname.
///
/// Never fails: an unparseable input is returned as-is.
pub fn title_from_url(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };
    let host = parsed.host_str().unwrap_or(url).to_string();

    let mut best: Option<(usize, String)> = None;
    for raw in parsed.path_segments().into_iter().flatten() {
        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        if let Some(words) = slug_words(&decoded) {
            let len = decoded.chars().count();
            if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
                best = Some((len, title_case(&words)));
            }
        }
    }

    best.map(|(_, title)| title).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn underscores_become_title_case_words() {
        assert_eq!(
            title_from_url("https://example.com/docs/getting_started_with_obsidian"),
            "Getting Started With Obsidian"
        );
    }

    #[test]
    fn root_path_falls_back_to_host() {
        assert_eq!(title_from_url("https://example.com/"), "example.com");
    }

    #[test]
    fn query_only_paths_fall_back_to_host() {
        assert_eq!(
            title_from_url("https://news.ycombinator.com/item?id=12345"),
            "news.ycombinator.com"
        );
    }

    #[test]
    fn short_ids_and_locales_do_not_qualify() {
        assert_eq!(title_from_url("https://example.com/en-us/p/ab-12"), "example.com");
        // two words but only nine letters
        assert_eq!(title_from_url("https://example.com/abcd-efghi"), "example.com");
        // one long word
        assert_eq!(
            title_from_url("https://example.com/supercalifragilistic"),
            "example.com"
        );
    }

    #[test]
    fn longest_segment_wins() {
        assert_eq!(
            title_from_url("https://blog.example.com/2024/rust-async-tips/why-pinning-matters-in-practice"),
            "Why Pinning Matters In Practice"
        );
    }

    #[test]
    fn ties_keep_the_first_segment() {
        assert_eq!(
            title_from_url("https://example.com/alpha-bravo-one/delta-echo-four"),
            "Alpha Bravo One"
        );
    }

    #[test]
    fn percent_encoded_segments_are_decoded() {
        assert_eq!(
            title_from_url("https://example.com/wiki/caf%C3%A9%20culture%20history"),
            "Café Culture History"
        );
    }

    #[test]
    fn segment_is_cut_at_query_like_characters() {
        assert_eq!(
            title_from_url("https://example.com/best-pizza-places%3Fref=home"),
            "Best Pizza Places"
        );
    }

    #[test]
    fn only_first_letter_is_changed() {
        assert_eq!(
            title_from_url("https://example.com/iPhone-vs-macOS-comparison"),
            "IPhone Vs MacOS Comparison"
        );
    }

    #[test]
    fn unparseable_input_is_returned() {
        assert_eq!(title_from_url("not a url"), "not a url");
    }
}
