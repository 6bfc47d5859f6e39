//! `action=parse` responses.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::endpoint::strip_format;
use crate::fetch::Response;
use crate::infobox::get_infobox;
use crate::media::media_url;
use crate::page::{ImageSource, underscore};
use crate::{Page, Result, WikiError};

/// Infobox parameters holding the lead image, in order of preference.
const INFOBOX_IMAGE_KEYS: [&str; 2] = ["image", "Cover"];

#[derive(Debug, Deserialize)]
struct ParseDocument {
    parse: Option<ParseData>,
}

#[derive(Debug, Deserialize)]
struct ParseData {
    title: Option<String>,
    pageid: Option<u64>,
    parsetree: Option<String>,
    wikitext: Option<String>,
    #[serde(default)]
    iwlinks: Vec<InterwikiLink>,
    #[serde(default)]
    properties: Value,
}

#[derive(Debug, Deserialize)]
struct InterwikiLink {
    url: Option<String>,
}

/// `wikibase_item` from page properties, as an object (formatversion 2) or
/// as a list of `{name, *}` pairs (formatversion 1).
fn wikibase_item(properties: &Value) -> Option<String> {
    match properties {
        Value::Object(map) => map.get("wikibase_item").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("name").and_then(Value::as_str) == Some("wikibase_item"))
            .and_then(|item| item.get("*").or_else(|| item.get("value")))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

impl Page {
    /// Store an `action=parse` response and set the attributes it carries.
    ///
    /// The infobox image is namespaced by the page language, since infobox
    /// images may be local uploads rather than Commons media.
    pub fn apply_parse(&mut self, response: Response) -> Result<()> {
        let document: Option<ParseDocument> = self.decode(&response);
        let query = strip_format(&response.query);
        self.requests.parse = Some(response);

        let Some(document) = document else {
            return Ok(());
        };
        let data = document.parse.ok_or(WikiError::NotFound(query))?;

        if let Some(parsetree) = &data.parsetree {
            match get_infobox(parsetree) {
                Ok(Some(infobox)) => {
                    let image = INFOBOX_IMAGE_KEYS
                        .iter()
                        .filter_map(|key| infobox.get(*key))
                        .find(|value| !value.trim().is_empty())
                        .map(|value| value.replace("[[", "").replace("]]", ""));

                    if let Some(image) = image {
                        let url = media_url(&image, &self.site.lang);
                        self.merge_image(url, ImageSource::Infobox);
                        self.images.insert("pimage".to_string(), Value::String(image));
                    }
                    self.infobox = Some(infobox);
                }
                Ok(None) => {}
                Err(e) => warn!("Could not read infobox from parse tree: {}", e),
            }
        }

        self.links = data.iwlinks.into_iter().filter_map(|link| link.url).collect();
        self.pageid = data.pageid;
        self.parsetree = data.parsetree;

        if self.title.is_none() {
            self.title = data.title.map(|t| underscore(&t));
        }

        if let Some(wikibase) = wikibase_item(&data.properties) {
            self.set_wikibase(&wikibase);
        }

        self.wikitext = data.wikitext;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(parsetree: &str) -> String {
        serde_json::json!({
            "parse": {
                "title": "Ada Lovelace",
                "pageid": 7259,
                "iwlinks": [
                    {"prefix": "commons", "url": "https://commons.wikimedia.org/wiki/Category:Ada_Lovelace", "title": "commons:Category:Ada Lovelace"},
                    {"prefix": "s", "url": "https://en.wikisource.org/wiki/Author:Ada_Lovelace", "title": "s:Author:Ada Lovelace"}
                ],
                "wikitext": "{{Infobox person}}\n'''Ada''' was a mathematician.",
                "parsetree": parsetree,
                "properties": {"wikibase_item": "Q7259", "page_image_free": "Ada_Lovelace_portrait.jpg"}
            }
        })
        .to_string()
    }

    #[test]
    fn test_wikibase_item_shapes() {
        assert_eq!(wikibase_item(&serde_json::json!({"wikibase_item": "Q1"})).as_deref(), Some("Q1"));
        assert_eq!(
            wikibase_item(&serde_json::json!([{"name": "wikibase_item", "*": "Q2"}])).as_deref(),
            Some("Q2")
        );
        assert_eq!(wikibase_item(&Value::Null), None);
    }

    #[test]
    fn test_apply_parse_sets_attributes() {
        let mut page = Page::with_config(crate::PageConfig::builder().pageid(7259).build()).unwrap();
        page.apply_parse(Response::from_body("q", parse_body("<root>plain</root>"))).unwrap();

        assert_eq!(page.title.as_deref(), Some("Ada_Lovelace"));
        assert_eq!(page.wikibase.as_deref(), Some("Q7259"));
        assert_eq!(page.links.len(), 2);
        assert!(page.links[0].starts_with("https://commons.wikimedia.org/"));
        assert!(page.wikitext.as_deref().unwrap().contains("mathematician"));
        assert!(page.infobox.is_none());
        assert!(page.image.is_none());
    }

    #[cfg(feature = "infobox")]
    #[test]
    fn test_apply_parse_infobox_image() {
        let tree = "<root><template><title>Infobox person</title><part><name>image</name><equals>=</equals><value>[[Example.jpg]]</value></part></template></root>";
        let mut page = Page::new("Ada Lovelace").unwrap();
        page.apply_parse(Response::from_body("q", parse_body(tree))).unwrap();

        assert_eq!(page.image.as_deref(), Some("https://upload.wikimedia.org/wikipedia/en/a/a9/Example.jpg"));
        assert_eq!(page.images.get("pimage"), Some(&Value::from("Example.jpg")));
        assert!(page.infobox.is_some());
    }

    #[cfg(feature = "infobox")]
    #[test]
    fn test_apply_parse_cover_and_existing_image() {
        let tree = "<root><template><title>Infobox book</title><part><name>Cover</name><equals>=</equals><value>Example.jpg</value></part></template></root>";
        let mut page = Page::new("Some book").unwrap();
        page.image = Some("https://upload.wikimedia.org/wikipedia/commons/x/xy/Other.jpg".to_string());
        page.apply_parse(Response::from_body("q", parse_body(tree))).unwrap();

        assert_eq!(page.image.as_deref(), Some("https://upload.wikimedia.org/wikipedia/commons/x/xy/Other.jpg"));
        assert_eq!(
            page.image_infobox.as_deref(),
            Some("https://upload.wikimedia.org/wikipedia/en/a/a9/Example.jpg")
        );
    }

    #[test]
    fn test_apply_parse_missing() {
        let body = r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#;
        let mut page = Page::new("Nope").unwrap();
        let result = page.apply_parse(Response::from_body("https://x/w/api.php?page=Nope&format=json", body));
        assert!(matches!(result, Err(WikiError::NotFound(q)) if q == "https://x/w/api.php?page=Nope"));
    }
}
