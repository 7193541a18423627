//! URL matching against the target route.
//!
//! The target is a single-page app, so the route lives in the fragment
//! (`#/subpages/...`). Anything after the first `?` inside the fragment is
//! client-side query state and never takes part in matching. Hash paths are
//! compared for exact equality, never by prefix.

use url::Url;

use crate::config::TargetLocation;

/// Truncates a hash at its first `?`.
pub fn strip_query(hash: &str) -> &str {
    match hash.split_once('?') {
        Some((path, _)) => path,
        None => hash,
    }
}

/// The `#`-prefixed fragment of `url`, or an empty string when there is none.
pub fn hash_of(url: &Url) -> String {
    match url.fragment() {
        Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
        _ => String::new(),
    }
}

impl TargetLocation {
    /// Whether a `location.hash` value routes to the target page.
    pub fn matches_route(&self, hash: &str) -> bool {
        strip_query(hash) == self.hash_path
    }

    /// Origin + hash-path match, used by the coordinator to drive icon and wake-lock.
    ///
    /// Unparseable input (internal pages, empty tabs) is treated as off target.
    pub fn is_target_page(&self, raw_url: &str) -> bool {
        let Ok(url) = Url::parse(raw_url) else {
            return false;
        };
        url.origin().ascii_serialization() == self.origin && self.matches_route(&hash_of(&url))
    }

    /// Stricter match used by the popup: origin, path and hash path must all equal
    /// the target's.
    pub fn is_exact_page(&self, raw_url: &str) -> bool {
        let (Ok(url), Ok(target)) = (Url::parse(raw_url), Url::parse(&self.full_url)) else {
            return false;
        };
        url.origin() == target.origin()
            && url.path() == target.path()
            && self.matches_route(&hash_of(&url))
    }

    /// Whether a tab belongs to the target site and may host a page watcher.
    pub fn is_on_site(&self, raw_url: &str) -> bool {
        raw_url.starts_with(&self.site_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetLocation {
        TargetLocation::default()
    }

    #[test]
    fn strip_query_cuts_at_first_question_mark() {
        assert_eq!(strip_query("#/a/b?x=1?y=2"), "#/a/b");
        assert_eq!(strip_query("#/a/b"), "#/a/b");
        assert_eq!(strip_query(""), "");
    }

    #[test]
    fn matches_exact_target() {
        assert!(target().is_target_page(
            "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder"
        ));
    }

    #[test]
    fn query_in_hash_does_not_change_result() {
        let t = target();
        for query in ["", "?x=1", "?", "?a=1&b=2", "?next=#/elsewhere"] {
            let matching = format!("https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder{query}");
            assert!(t.is_target_page(&matching), "{matching}");

            let other = format!("https://h5.feedov.com/#/subpages/other{query}");
            assert!(!t.is_target_page(&other), "{other}");
        }
    }

    #[test]
    fn prefix_of_route_is_not_a_match() {
        let t = target();
        assert!(!t.is_target_page(
            "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrderExtra"
        ));
        assert!(!t.is_target_page("https://h5.feedov.com/#/subpages/tuidanOrder"));
    }

    #[test]
    fn origin_must_match() {
        let t = target();
        assert!(!t.is_target_page(
            "http://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder"
        ));
        assert!(!t.is_target_page(
            "https://evil.example/#/subpages/tuidanOrder/tuidanOrder"
        ));
        assert!(!t.is_target_page(
            "https://h5.feedov.com:8443/#/subpages/tuidanOrder/tuidanOrder"
        ));
    }

    #[test]
    fn unparseable_urls_are_off_target() {
        let t = target();
        assert!(!t.is_target_page(""));
        assert!(!t.is_target_page("not a url"));
        assert!(!t.is_exact_page("chrome://newtab/"));
    }

    #[test]
    fn exact_page_also_checks_path() {
        let t = target();
        assert!(t.is_exact_page(
            "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder?x=1"
        ));
        // The coordinator only looks at origin + hash, the popup also pins the path.
        let other_path = "https://h5.feedov.com/index.html#/subpages/tuidanOrder/tuidanOrder";
        assert!(t.is_target_page(other_path));
        assert!(!t.is_exact_page(other_path));
    }

    #[test]
    fn site_prefix_is_plain_string_prefix() {
        let t = target();
        assert!(t.is_on_site("https://h5.feedov.com/#/anything"));
        assert!(!t.is_on_site("https://h5.feedov.community/"));
    }
}
