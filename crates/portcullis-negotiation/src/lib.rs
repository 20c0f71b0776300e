#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-negotiation

`Accept`, `Accept-Language`, and `Accept-Encoding` q-factor negotiation,
plus URL-extension-first content-type resolution (spec.md §4.8).
*/

mod qfactor;

pub use qfactor::{parse_quality_list, QualifiedValue};

use mime::Mime;

/// Picks the best of `available` against an `Accept-Language` (or
/// `Accept-Encoding`) header's q-sorted preference list. A `*` entry
/// in the header matches any available value not otherwise named.
/// Returns `None` if the header is absent/empty and there's no way to
/// pick a default; callers typically fall back to their own default
/// value in that case.
pub fn negotiate(header: Option<&str>, available: &[&str]) -> Option<String> {
    let header = header?;
    let preferences = parse_quality_list(header);
    for pref in &preferences {
        if pref.q == 0 {
            continue;
        }
        if pref.value == "*" {
            if let Some(first) = available.first() {
                return Some((*first).to_string());
            }
            continue;
        }
        if let Some(found) = available.iter().find(|a| a.eq_ignore_ascii_case(&pref.value)) {
            return Some((*found).to_string());
        }
    }
    None
}

/// Resolves the response content type for `path` given an `Accept`
/// header, preferring a file-extension match on the URL over the
/// `Accept` header's preference order (spec.md §4.8).
pub fn resolve_content_type(path: &str, accept_header: Option<&str>, available: &[Mime]) -> Option<Mime> {
    if let Some(ext) = path.rsplit('.').next().filter(|_| path.contains('.')) {
        if let Some(guessed) = mime_guess::from_ext(ext).first() {
            if let Some(matched) = available.iter().find(|m| mimes_match(m, &guessed)) {
                return Some(matched.clone());
            }
        }
    }

    let header = accept_header?;
    let preferences = parse_quality_list(header);
    for pref in &preferences {
        if pref.q == 0 {
            continue;
        }
        if pref.value == "*/*" {
            if let Some(first) = available.first() {
                return Some(first.clone());
            }
            continue;
        }
        if let Ok(requested) = pref.value.parse::<Mime>() {
            if let Some(matched) = available.iter().find(|m| mimes_match(m, &requested)) {
                return Some(matched.clone());
            }
        }
    }
    None
}

fn mimes_match(candidate: &Mime, pattern: &Mime) -> bool {
    let type_matches = pattern.type_() == mime::STAR || candidate.type_() == pattern.type_();
    let subtype_matches = pattern.subtype() == mime::STAR || candidate.subtype() == pattern.subtype();
    type_matches && subtype_matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiates_best_available_language() {
        let chosen = negotiate(Some("fr;q=0.5, en;q=0.9"), &["en", "fr"]);
        assert_eq!(chosen.as_deref(), Some("en"));
    }

    #[test]
    fn falls_back_to_wildcard_entry() {
        let chosen = negotiate(Some("de;q=0.9, *;q=0.1"), &["en"]);
        assert_eq!(chosen.as_deref(), Some("en"));
    }

    #[test]
    fn zero_q_is_never_chosen() {
        let chosen = negotiate(Some("en;q=0"), &["en"]);
        assert_eq!(chosen, None);
    }

    #[test]
    fn url_extension_wins_over_accept_header() {
        let json: Mime = "application/json".parse().unwrap();
        let html: Mime = "text/html".parse().unwrap();
        let chosen = resolve_content_type(
            "/report.json",
            Some("text/html;q=1.0"),
            &[html, json.clone()],
        );
        assert_eq!(chosen, Some(json));
    }

    #[test]
    fn falls_back_to_accept_header_without_extension() {
        let json: Mime = "application/json".parse().unwrap();
        let html: Mime = "text/html".parse().unwrap();
        let chosen = resolve_content_type("/report", Some("application/json"), &[html, json.clone()]);
        assert_eq!(chosen, Some(json));
    }

    #[test]
    fn wildcard_accept_picks_first_available() {
        let json: Mime = "application/json".parse().unwrap();
        let chosen = resolve_content_type("/report", Some("*/*"), &[json.clone()]);
        assert_eq!(chosen, Some(json));
    }
}
