//! Wikidata `wbgetentities` responses: the page entity and claim labels.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::strip_format;
use crate::fetch::Response;
use crate::media::{COMMONS, media_url};
use crate::page::{ImageSource, underscore};
use crate::{Page, Result, WikiError};

static ENTITY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Q\d+").expect("valid entity id regex"));

/// Wikidata properties kept on a page, by id, with the label they are stored under.
pub const WIKIPROPS: [(&str, &str); 39] = [
    ("P17", "country"),
    ("P18", "image"),
    ("P27", "citizenship"),
    ("P30", "continent"),
    ("P31", "instance"),
    ("P50", "author"),
    ("P57", "director"),
    ("P86", "composer"),
    ("P105", "taxon rank"),
    ("P110", "illustrator"),
    ("P123", "publisher"),
    ("P135", "movement"),
    ("P136", "genre"),
    ("P144", "based on"),
    ("P161", "cast"),
    ("P170", "creator"),
    ("P171", "parent taxon"),
    ("P175", "performer"),
    ("P186", "material"),
    ("P195", "collection"),
    ("P212", "ISBN"),
    ("P217", "inventory"),
    ("P225", "taxon name"),
    ("P276", "location"),
    ("P279", "subclass"),
    ("P301", "topic"),
    ("P345", "IMDB"),
    ("P569", "birth"),
    ("P570", "death"),
    ("P577", "pubdate"),
    ("P585", "datetime"),
    ("P625", "coordinates"),
    ("P655", "translator"),
    ("P658", "tracklist"),
    ("P800", "work"),
    ("P856", "website"),
    ("P910", "category"),
    ("P1773", "attribution"),
    ("P1779", "creator"),
];

/// Label for a Wikidata property id, if the property is kept.
pub fn property_label(property: &str) -> Option<&'static str> {
    WIKIPROPS.iter().find(|(id, _)| *id == property).map(|(_, label)| *label)
}

#[derive(Debug, Deserialize)]
struct EntitiesDocument {
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    labels: Value,
    #[serde(default)]
    descriptions: Value,
    #[serde(default)]
    claims: BTreeMap<String, Vec<Claim>>,
    #[serde(default)]
    sitelinks: BTreeMap<String, Sitelink>,
    modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Snak,
}

#[derive(Debug, Deserialize)]
struct Snak {
    datavalue: Option<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct Sitelink {
    title: String,
}

/// Non-empty `labels` / `descriptions` value in `lang`, or a bare `{value}`.
fn entity_prop(prop: &Value, lang: &str) -> Option<String> {
    prop.get(lang)
        .and_then(|p| p.get("value"))
        .or_else(|| prop.get("value"))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty_value),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// The useful part of a snak value: entity id, monolingual text, time, or
/// the value itself (strings, coordinates, quantities).
fn snak_value(value: &Value) -> Value {
    if let Value::Object(map) = value {
        for key in ["id", "text", "time"] {
            if let Some(v) = map.get(key).filter(|v| !is_empty_value(v)) {
                return v.clone();
            }
        }
    }
    value.clone()
}

/// Selected property values from entity claims, keyed by property id.
fn wikidata_props(claims: &BTreeMap<String, Vec<Claim>>) -> BTreeMap<String, Vec<Value>> {
    let mut props: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    for (property, statements) in claims {
        if property_label(property).is_none() {
            continue;
        }

        for statement in statements {
            let Some(datavalue) = &statement.mainsnak.datavalue else {
                debug!(property = %property, "claim has no value");
                continue;
            };

            let value = snak_value(&datavalue.value);
            if is_empty_value(&value) {
                warn!(property = %property, "skipping empty claim value");
                continue;
            }
            props.entry(property.clone()).or_default().push(value);
        }
    }

    props
}

impl Page {
    /// Store a `wbgetentities` response for the page entity and set the
    /// attributes it carries.
    ///
    /// Entity-valued claims are collected in `claims` for [`Page::get_claims`];
    /// other values go straight into `wikidata`.
    pub fn apply_wikidata(&mut self, response: Response) -> Result<()> {
        let document: Option<EntitiesDocument> = self.decode(&response);
        let query = strip_format(&response.query);
        self.requests.wikidata = Some(response);

        let Some(document) = document else {
            return Ok(());
        };
        let item = document
            .entities
            .into_values()
            .next()
            .ok_or_else(|| WikiError::NotFound(query.clone()))?;

        let Some(id) = item.id.as_deref() else {
            if item.title.is_some() {
                return Err(WikiError::NotFound(query));
            }
            warn!(query = %query, "entity has neither id nor title");
            return Ok(());
        };
        self.set_wikibase(id);

        self.marshal_claims(&item.claims);

        let lang = self.site.lang.clone();
        if let Some(description) = entity_prop(&item.descriptions, &lang) {
            self.description = Some(description);
        }

        self.set_wikidata_image();

        if let Some(label) = entity_prop(&item.labels, &lang) {
            self.label = Some(label);
        }

        if self.title.is_none() {
            let sitelink = item.sitelinks.get(&format!("{}wiki", lang)).map(|s| s.title.clone());
            self.title = sitelink.or_else(|| self.label.clone()).map(|t| underscore(&t));
        }

        self.modified = item.modified;

        Ok(())
    }

    /// Store a claim-label response and resolve each entity to its label
    /// under the property it was claimed for.
    pub fn apply_claims(&mut self, response: Response) -> Result<()> {
        let document: Option<EntitiesDocument> = self.decode(&response);
        self.requests.claims.push(response);

        let Some(document) = document else {
            return Ok(());
        };

        let lang = self.site.lang.clone();
        for (id, entity) in document.entities {
            let Some(property) = self.claims.get(&id).cloned() else {
                continue;
            };
            if let Some(label) = entity_prop(&entity.labels, &lang) {
                self.update_wikidata(&property, Value::String(label));
            }
        }

        Ok(())
    }

    fn marshal_claims(&mut self, claims: &BTreeMap<String, Vec<Claim>>) {
        self.props = wikidata_props(claims);

        let props = self.props.clone();
        for (property, values) in props {
            let Some(label) = property_label(&property) else {
                continue;
            };

            for value in values {
                match value.as_str() {
                    Some(id) if ENTITY_ID.is_match(id) => {
                        self.claims.insert(id.to_string(), label.to_string());
                    }
                    _ => self.update_wikidata(label, value),
                }
            }
        }
    }

    /// P18 file names become Commons URLs in `image` (or `image_wikidata`).
    fn set_wikidata_image(&mut self) {
        let Some(image) = self.wikidata.get("image").cloned() else {
            return;
        };

        let urls: Vec<String> = match &image {
            Value::String(file) => vec![media_url(file, COMMONS)],
            Value::Array(files) => files.iter().filter_map(Value::as_str).map(|f| media_url(f, COMMONS)).collect(),
            _ => Vec::new(),
        };

        let Some(first) = urls.first() else {
            return;
        };
        self.merge_image(first.clone(), ImageSource::Wikidata);

        let wimage = if urls.len() == 1 { Value::String(first.clone()) } else { Value::from(urls) };
        self.images.insert("wimage".to_string(), wimage);
    }
}
