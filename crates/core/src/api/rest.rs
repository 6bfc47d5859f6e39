//! REST API `page/mobile-text` responses and the lead HTML built from them.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::fetch::Response;
use crate::html::{absolutize_links, snip_html};
use crate::media::{COMMONS, media_url};
use crate::page::underscore;
use crate::{Page, Result};

/// Section items that are not lead prose.
const SKIPPED_ITEMS: [&str; 2] = ["hatnote", "image"];

#[derive(Debug, Deserialize)]
struct RestDocument {
    #[serde(default)]
    detail: Value,
    description: Option<String>,
    image: Option<Value>,
    thumb: Option<Value>,
    displaytitle: Option<String>,
    redirected: Option<String>,
    lastmodified: Option<String>,
    id: Option<u64>,
    #[serde(default)]
    sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
struct Section {
    #[serde(default)]
    items: Vec<serde_json::Map<String, Value>>,
}

impl RestDocument {
    /// REST errors carry `detail` as `{error: ...}` or as a plain message.
    fn error(&self) -> Option<String> {
        match &self.detail {
            Value::Object(detail) => detail.get("error").map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            Value::String(message) => Some(message.clone()),
            _ => None,
        }
    }
}

impl Page {
    /// Store a REST mobile-text response and set the attributes it carries.
    ///
    /// REST values overwrite `description`, `pageimage`, `thumbnail`,
    /// `title`, `modified` and `pageid`.
    pub fn apply_rest(&mut self, response: Response) -> Result<()> {
        let document: Option<RestDocument> = self.decode(&response);
        let base = Url::parse(&response.query).ok();
        self.requests.rest = Some(response);

        let Some(document) = document else {
            return Ok(());
        };

        if let Some(error) = document.error() {
            warn!("RESTBase error: {}", error);
            return Ok(());
        }

        let scheme = base.as_ref().map(Url::scheme).unwrap_or("https").to_string();
        let origin = base
            .as_ref()
            .and_then(|url| url.host_str().map(|host| format!("{}://{}", url.scheme(), host)))
            .unwrap_or_else(|| format!("https://{}", self.site.host()));

        if let Some(description) = document.description.filter(|d| !d.is_empty()) {
            self.description = Some(description);
        }

        if let Some(image) = document.image {
            if let Some(file) = image.get("file").and_then(Value::as_str) {
                self.pageimage = Some(media_url(file, COMMONS));
            }
            self.images.insert("rimage".to_string(), image);
        }

        if let Some(thumb) = document.thumb {
            if let Some(url) = thumb.get("url").and_then(Value::as_str) {
                self.thumbnail = Some(if url.starts_with("//") { format!("{}:{}", scheme, url) } else { url.to_string() });
            }
            self.images.insert("rthumb".to_string(), thumb);
        }

        if let Some(title) = document.redirected.or(document.displaytitle) {
            self.title = Some(underscore(&title));
        }

        self.modified = document.lastmodified;
        self.pageid = document.id;

        if let Some(title) = &self.title {
            self.set_url(format!("{}/wiki/{}", origin, title));
        }

        if let Some(first) = document.sections.first()
            && let Some(lead) = self.lead_html(first, &origin)
        {
            self.lead = Some(lead);
        }

        Ok(())
    }

    fn lead_html(&self, section: &Section, origin: &str) -> Option<String> {
        let parts = [
            self.lead_image(),
            self.lead_heading(),
            lead_rest(section, origin),
            self.lead_metadata(),
        ];

        let html = parts.into_iter().flatten().collect::<Vec<_>>().join("\n");
        if html.is_empty() { None } else { Some(html) }
    }

    /// `<img>` from thumbnail, page image or image, in that order.
    fn lead_image(&self) -> Option<String> {
        let (src, class) = [
            (&self.thumbnail, "thumbnail"),
            (&self.pageimage, "pageimage"),
            (&self.image, "image"),
        ]
        .into_iter()
        .find_map(|(src, class)| src.as_ref().map(|s| (s, class)))?;

        let alt = self.label.as_deref().or(self.title.as_deref()).unwrap_or_default();

        Some(format!(
            "<img {} src=\"{}\" alt=\"{}\" title=\"{}\" align=right width=120>",
            class, src, alt, alt
        ))
    }

    fn lead_heading(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let title = self.title.as_deref()?;

        let mut heading = format!("<a href=\"{}\">{}</a>", url, title);
        match self.description.as_deref() {
            Some(description) => heading.push_str(&format!("&mdash;<i>{}</i>. ", description)),
            None => heading.push(':'),
        }

        Some(format!("<span heading>{}</span>", heading))
    }

    fn lead_metadata(&self) -> Option<String> {
        self.modified
            .as_deref()
            .map(|modified| format!("<span metadata>Modified: {}</span>", modified))
    }
}

/// Paragraphs of the first section, snipped, with site-relative links made absolute.
fn lead_rest(section: &Section, origin: &str) -> Option<String> {
    let paragraphs: Vec<String> = section
        .items
        .iter()
        .filter(|item| {
            let kind = item.get("type").and_then(Value::as_str).unwrap_or_default();
            !SKIPPED_ITEMS.contains(&kind)
        })
        .map(|item| match item.get("text").and_then(Value::as_str) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => item.keys().cloned().collect::<Vec<_>>().join(", "),
        })
        .collect();

    if paragraphs.is_empty() {
        return None;
    }

    let snipped = snip_html(&paragraphs.join("\n"));
    Some(absolutize_links(&format!("<span snipped>{}</span>", snipped), origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://en.wikipedia.org/api/rest_v1/page/mobile-text/Ada_Lovelace";

    fn rest_body() -> String {
        serde_json::json!({
            "displaytitle": "Ada Lovelace",
            "description": "English mathematician and writer",
            "lastmodified": "2026-09-30T12:00:00Z",
            "id": 7259,
            "image": {"file": "Ada Lovelace portrait.jpg", "urls": {"320": "//upload.wikimedia.org/320px.jpg"}},
            "thumb": {"url": "//upload.wikimedia.org/wikipedia/commons/thumb/a/a4/Ada_Lovelace_portrait.jpg/320px-Ada_Lovelace_portrait.jpg"},
            "sections": [
                {"id": 0, "items": [
                    {"type": "hatnote", "text": "For the film, see ..."},
                    {"type": "image", "text": "ignored"},
                    {"type": "p", "text": "<b>Ada</b> worked on the <a href=\"/wiki/Analytical_Engine\">Analytical Engine</a>.<sup class=\"reference\">[1]</sup>"},
                    {"type": "p", "text": "Second paragraph."}
                ]},
                {"id": 1, "items": [{"type": "p", "text": "Not the lead."}]}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_apply_rest_sets_attributes() {
        let mut page = Page::new("ada").unwrap();
        page.apply_rest(Response::from_body(URL, rest_body())).unwrap();

        assert_eq!(page.title.as_deref(), Some("Ada_Lovelace"));
        assert_eq!(page.description.as_deref(), Some("English mathematician and writer"));
        assert_eq!(page.pageid, Some(7259));
        assert_eq!(page.modified.as_deref(), Some("2026-09-30T12:00:00Z"));
        assert_eq!(page.url.as_deref(), Some("https://en.wikipedia.org/wiki/Ada_Lovelace"));
        assert!(page.thumbnail.as_deref().unwrap().starts_with("https://upload.wikimedia.org/"));
        assert_eq!(
            page.pageimage.as_deref(),
            Some("https://upload.wikimedia.org/wikipedia/commons/a/a4/Ada_Lovelace_portrait.jpg")
        );
        assert!(page.images.contains_key("rimage"));
        assert!(page.images.contains_key("rthumb"));
    }

    #[test]
    fn test_lead_html_composition() {
        let mut page = Page::new("ada").unwrap();
        page.apply_rest(Response::from_body(URL, rest_body())).unwrap();
        let lead = page.lead.unwrap();
        let lines: Vec<&str> = lead.lines().collect();

        assert!(lines[0].starts_with("<img thumbnail src=\"https://upload.wikimedia.org/"));
        assert!(lines[0].contains("alt=\"Ada_Lovelace\""));
        assert_eq!(
            lines[1],
            "<span heading><a href=\"https://en.wikipedia.org/wiki/Ada_Lovelace\">Ada_Lovelace</a>&mdash;<i>English mathematician and writer</i>. </span>"
        );
        assert!(lead.contains("href=\"https://en.wikipedia.org/wiki/Analytical_Engine\""));
        assert!(!lead.contains("For the film"));
        assert!(!lead.contains("[1]"));
        assert!(!lead.contains("Not the lead."));
        assert!(lead.contains("Second paragraph."));
        assert!(lead.ends_with("<span metadata>Modified: 2026-09-30T12:00:00Z</span>"));
    }

    #[test]
    fn test_redirected_title_wins() {
        let body = r#"{"displaytitle": "Lady Lovelace", "redirected": "Ada Lovelace", "id": 1}"#;
        let mut page = Page::new("Lady Lovelace").unwrap();
        page.apply_rest(Response::from_body(URL, body)).unwrap();
        assert_eq!(page.title.as_deref(), Some("Ada_Lovelace"));
        assert!(page.lead.is_none());
    }

    #[test]
    fn test_rest_error_leaves_page_untouched() {
        let body = r#"{"type": "https://mediawiki.org/wiki/HyperSwitch/errors/not_found", "detail": {"error": "Page or revision not found."}}"#;
        let mut page = Page::new("Nope").unwrap();
        page.apply_rest(Response::from_body(URL, body)).unwrap();
        assert!(page.url.is_none());
        assert!(!page.fatal);
        assert!(page.requests.rest.is_some());
    }

    #[test]
    fn test_heading_without_description() {
        let mut page = Page::new("Ada").unwrap();
        page.url = Some("https://en.wikipedia.org/wiki/Ada".to_string());
        assert_eq!(
            page.lead_heading().as_deref(),
            Some("<span heading><a href=\"https://en.wikipedia.org/wiki/Ada\">Ada</a>:</span>")
        );
    }

    #[test]
    fn test_lead_image_prefers_label_for_alt() {
        let mut page = Page::new("Ada").unwrap();
        page.label = Some("Ada Lovelace".to_string());
        page.image = Some("https://x/a.jpg".to_string());
        assert_eq!(
            page.lead_image().as_deref(),
            Some("<img image src=\"https://x/a.jpg\" alt=\"Ada Lovelace\" title=\"Ada Lovelace\" align=right width=120>")
        );
    }

    #[test]
    fn test_item_without_text_lists_keys() {
        let section: Section = serde_json::from_str(r#"{"items":[{"type":"table","rows":3}]}"#).unwrap();
        let rest = lead_rest(&section, "https://en.wikipedia.org").unwrap();
        assert!(rest.contains("type, rows") || rest.contains("rows, type"));
    }
}
