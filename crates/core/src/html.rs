//! HTML helpers for API extracts and REST lead sections.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Elements dropped from lead HTML: citations, edit links, styles and
/// print-hidden furniture.
const SNIPPED: [&str; 7] = [
    "sup.reference",
    "sup.noprint",
    "span.mw-ref",
    "span.mw-editsection",
    "span.noprint",
    "style",
    "link",
];

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
pub fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_default()
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
pub fn html_to_markdown(html: &str) -> String {
    html_to_text(html)
}

/// Convert HTML to plain text by stripping tags
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}

/// Remove references, edit links and comments from lead HTML.
///
/// Returns the input unchanged if the rewriter rejects it.
pub fn snip_html(html: &str) -> String {
    let html = COMMENT.replace_all(html, "");

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: SNIPPED
                .iter()
                .map(|selector| {
                    lol_html::element!(*selector, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.into_owned();
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.into_owned(),
    }

    output.trim().to_string()
}

/// Make root-relative `href`s absolute against `base` (`scheme://host`).
pub fn absolutize_links(html: &str, base: &str) -> String {
    html.replace("href=\"/", &format!("href=\"{}/", base.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_tags() {
        let html = r#"<p>Text with <b>bold</b> and <i>italic</i>.</p>"#;
        assert_eq!(html_to_text(html), "Text with bold and italic.");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_html_to_markdown_bold() {
        let md = html_to_markdown("<p><b>Ada Lovelace</b> was a mathematician.</p>");
        assert!(md.contains("**Ada Lovelace**"));
        assert!(md.contains("mathematician"));
    }

    #[test]
    fn test_snip_removes_references() {
        let html = r##"<p>Ada wrote notes.<sup class="reference"><a href="#cite_note-1">[1]</a></sup></p>"##;
        assert_eq!(snip_html(html), "<p>Ada wrote notes.</p>");
    }

    #[test]
    fn test_snip_removes_comments_and_styles() {
        let html = "<style>.x{}</style><!-- hidden\ncomment --><p>Kept</p>";
        assert_eq!(snip_html(html), "<p>Kept</p>");
    }

    #[test]
    fn test_snip_keeps_plain_markup() {
        let html = r#"<p>See <a href="/wiki/Analytical_Engine">the engine</a>.</p>"#;
        assert_eq!(snip_html(html), html);
    }

    #[test]
    fn test_absolutize_links() {
        let html = r#"<a href="/wiki/Rust">Rust</a> <a href="https://x.org/">x</a>"#;
        assert_eq!(
            absolutize_links(html, "https://en.wikipedia.org"),
            r#"<a href="https://en.wikipedia.org/wiki/Rust">Rust</a> <a href="https://x.org/">x</a>"#
        );
    }
}
