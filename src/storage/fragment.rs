//! Chapter text cleanup
//!
//! Chapter pages carry their own chrome: a top heading, the book heading,
//! cross references, navigation links and an `<h1>` title. Day bundles
//! supply their own headings, so those elements are dropped and only the
//! page body is kept.

use regex::Regex;

/// Element ids that are dropped with their contents
const DROPPED_IDS: &[&str] = &["topheading"];

/// Classes whose elements are dropped with their contents
const DROPPED_CLASSES: &[&str] = &["bsbheading", "cross", "nav"];

/// Tags dropped wherever they appear
const DROPPED_TAGS: &[&str] = &["h1"];

/// Strips page chrome from chapter HTML
#[derive(Debug, Clone)]
pub struct FragmentCleaner {
    /// Any open or close tag: (slash, name, attributes)
    tag: Regex,
    attribute: Regex,
    body: Regex,
}

impl FragmentCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>")?,
            attribute: Regex::new(
                r#"(?i)(?:^|\s)(id|class)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
            )?,
            body: Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>")?,
        })
    }

    /// Returns the body content of `html` without dropped elements.
    ///
    /// Input without a `<body>` is treated as a bare fragment. An unclosed
    /// dropped element swallows the rest of the input.
    pub fn clean(&self, html: &str) -> String {
        let content = self
            .body
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map_or(html, |m| m.as_str());

        let mut out = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(caps) = self.tag.captures(rest) {
            let (Some(tag), Some(name)) = (caps.get(0), caps.get(2)) else {
                break;
            };
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let attrs = caps.get(3).map_or("", |m| m.as_str());

            if closing || !self.is_dropped(name.as_str(), attrs) {
                out.push_str(&rest[..tag.end()]);
                rest = &rest[tag.end()..];
                continue;
            }

            out.push_str(&rest[..tag.start()]);
            let after = &rest[tag.end()..];
            rest = if attrs.trim_end().ends_with('/') {
                after
            } else {
                &after[self.element_end(name.as_str(), after)..]
            };
        }

        out.push_str(rest);
        out.trim().to_string()
    }

    fn is_dropped(&self, name: &str, attrs: &str) -> bool {
        if DROPPED_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t)) {
            return true;
        }

        self.attribute.captures_iter(attrs).any(|caps| {
            let Some(key) = caps.get(1) else {
                return false;
            };
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());

            if key.as_str().eq_ignore_ascii_case("id") {
                DROPPED_IDS.contains(&value)
            } else {
                value.split_whitespace().any(|c| DROPPED_CLASSES.contains(&c))
            }
        })
    }

    /// Offset just past the close tag matching an element named `name`
    /// whose open tag ends where `after` begins
    fn element_end(&self, name: &str, after: &str) -> usize {
        let mut depth = 1usize;

        for caps in self.tag.captures_iter(after) {
            let (Some(tag), Some(tag_name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            if !tag_name.as_str().eq_ignore_ascii_case(name) {
                continue;
            }

            if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                depth -= 1;
                if depth == 0 {
                    return tag.end();
                }
            } else if !tag.as_str().ends_with("/>") {
                depth += 1;
            }
        }

        after.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        FragmentCleaner::new().unwrap().clean(html)
    }

    const PAGE: &str = r#"<html><head><title>Genesis 1</title></head>
<body class="calibre">
<div id="topheading">Genesis 1</div>
<div class="bsbheading"><div class="x">The Creation</div></div>
<h1 class="chapter">Genesis 1</h1>
<p class="reg">In the beginning God created the heavens and the earth.</p>
<div class="calibre8"><p class="cross">(John 1:1-5)</p></div>
<span class="nav right">Next</span>
<br/>
</body></html>"#;

    #[test]
    fn page_chrome_is_removed() {
        let text = clean(PAGE);

        assert!(text.starts_with("<p class=\"reg\">In the beginning"));
        assert!(text.contains("<div class=\"calibre8\"></div>"));
        assert!(text.ends_with("<br/>"));
        for gone in ["<title>", "Genesis 1", "The Creation", "John 1:1", "Next", "<body"] {
            assert!(!text.contains(gone), "{} survived cleanup", gone);
        }
    }

    #[test]
    fn bare_fragments_pass_through() {
        assert_eq!(clean("<p>kept</p>"), "<p>kept</p>");
        assert_eq!(clean("<233>"), "<233>");
        assert_eq!(clean("plain text"), "plain text");
    }

    #[test]
    fn nested_same_name_elements_are_matched() {
        let html = r#"<div class="bsbheading"><div>a</div><div>b</div></div><p>c</p>"#;
        assert_eq!(clean(html), "<p>c</p>");
    }

    #[test]
    fn matching_is_on_whole_attribute_names_and_classes() {
        assert_eq!(
            clean(r#"<p data-id="topheading">x</p><p class="navy">y</p>"#),
            r#"<p data-id="topheading">x</p><p class="navy">y</p>"#
        );
        assert_eq!(clean("<H1>Title</H1>after"), "after");
        assert_eq!(clean("<p id='topheading'>x</p>after"), "after");
    }

    #[test]
    fn unclosed_dropped_element_swallows_the_rest() {
        assert_eq!(clean(r#"<p>a</p><div class="nav"><p>b"#), "<p>a</p>");
    }
}
