//! Infobox extraction from the XML parse tree returned by `action=parse`.
//!
//! The parse tree models each template as
//! `<template><title>..</title><part><name>..</name><equals>=</equals><value>..</value></part>..</template>`,
//! with positional parameters written as `<name index="1"/>`.

use std::collections::BTreeMap;

/// Infobox parameters, keyed by parameter name (or position).
pub type Infobox = BTreeMap<String, String>;

#[cfg(feature = "infobox")]
use sxd_document::parser;
#[cfg(feature = "infobox")]
use sxd_xpath::{Context, Factory, Value, XPath, nodeset::Node};

#[cfg(feature = "infobox")]
use crate::WikiError;
use crate::Result;

/// XPath evaluator over one parse-tree document.
#[cfg(feature = "infobox")]
struct TreeQuery {
    factory: Factory,
}

#[cfg(feature = "infobox")]
impl TreeQuery {
    fn new() -> Self {
        Self { factory: Factory::new() }
    }

    fn compile(&self, xpath: &str) -> Result<XPath> {
        self.factory
            .build(xpath)
            .map_err(|e| WikiError::ParseTreeError(format!("Invalid XPath '{}': {}", xpath, e)))?
            .ok_or_else(|| WikiError::ParseTreeError(format!("Invalid XPath: {}", xpath)))
    }

    fn nodes<'d>(&self, xpath: &XPath, node: Node<'d>) -> Result<Vec<Node<'d>>> {
        let context = Context::new();
        match xpath.evaluate(&context, node)? {
            Value::Nodeset(nodeset) => Ok(nodeset.document_order()),
            _ => Ok(Vec::new()),
        }
    }

    fn string<'d>(&self, xpath: &XPath, node: Node<'d>) -> Result<String> {
        let context = Context::new();
        Ok(xpath.evaluate(&context, node)?.string())
    }
}

/// Parameters of the first template whose title contains `box`.
#[cfg(feature = "infobox")]
pub fn get_infobox(parsetree: &str) -> Result<Option<Infobox>> {
    let package = parser::parse(parsetree)
        .map_err(|e| WikiError::ParseTreeError(format!("Failed to parse XML parse tree: {}", e)))?;
    let document = package.as_document();

    let query = TreeQuery::new();
    let templates = query.compile("//template")?;
    let title = query.compile("string(title)")?;
    let parts = query.compile("part")?;
    let name = query.compile("string(name)")?;
    let index = query.compile("string(name/@index)")?;
    let value = query.compile("string(value)")?;

    for template in query.nodes(&templates, document.root().into())? {
        if !query.string(&title, template)?.contains("box") {
            continue;
        }

        let mut infobox = Infobox::new();
        for part in query.nodes(&parts, template)? {
            let mut key = query.string(&name, part)?.trim().to_string();
            if key.is_empty() {
                key = query.string(&index, part)?.trim().to_string();
            }
            if key.is_empty() {
                continue;
            }
            infobox.insert(key, query.string(&value, part)?.trim().to_string());
        }

        return Ok(Some(infobox));
    }

    Ok(None)
}

/// Infobox extraction is disabled without the `infobox` feature.
#[cfg(not(feature = "infobox"))]
pub fn get_infobox(_parsetree: &str) -> Result<Option<Infobox>> {
    Ok(None)
}
