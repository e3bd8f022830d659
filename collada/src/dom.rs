//! Read-only accessors over the parsed XML tree.

use std::str::FromStr;

use xmltree::{Element, XMLNode};

use crate::error::ImportError;

pub fn parse_document(text: &str) -> Result<Element, ImportError> {
    Ok(Element::parse(text.as_bytes())?)
}

pub fn children<'a>(element: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    element.children.iter().filter_map(move |node| match node {
        XMLNode::Element(child) if child.name == name => Some(child),
        _ => None,
    })
}

pub fn child<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    element.children.iter().find_map(|node| match node {
        XMLNode::Element(child) if child.name == name => Some(child),
        _ => None,
    })
}

pub fn required_child<'a>(
    element: &'a Element,
    parent: &'static str,
    name: &'static str,
) -> Result<&'a Element, ImportError> {
    match child(element, name) {
        Some(v) => Ok(v),
        None => Err(ImportError::MissingElement(parent, name)),
    }
}

pub fn attribute<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

pub fn required_attribute<'a>(
    element: &'a Element,
    tag: &'static str,
    name: &'static str,
) -> Result<&'a str, ImportError> {
    match attribute(element, name) {
        Some(v) => Ok(v),
        None => Err(ImportError::MissingAttribute(tag, name)),
    }
}

/// Parses a numeric attribute, falling back to `default` when it is absent.
pub fn attribute_or<T: FromStr>(
    element: &Element,
    name: &'static str,
    default: T,
) -> Result<T, ImportError> {
    match attribute(element, name) {
        Some(v) => match v.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => Err(ImportError::InvalidAttribute(name, v.to_string())),
        },
        None => Ok(default),
    }
}

pub fn required_number<T: FromStr>(
    element: &Element,
    tag: &'static str,
    name: &'static str,
) -> Result<T, ImportError> {
    let value = required_attribute(element, tag, name)?;
    match value.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(ImportError::InvalidAttribute(name, value.to_string())),
    }
}

pub fn text(element: &Element) -> String {
    match element.get_text() {
        Some(v) => v.into_owned(),
        None => String::new(),
    }
}

/// Strips the leading `#` of a local URI fragment.
pub fn strip_fragment(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}

#[cfg(test)]
pub(crate) fn fragment(xml: &str) -> Element {
    match Element::parse(xml.trim().as_bytes()) {
        Ok(v) => v,
        Err(e) => panic!("cannot parse fixture {}: {}", xml, e),
    }
}
