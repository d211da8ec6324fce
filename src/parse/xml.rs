use super::{key_column, table_from_records};
use crate::error::{Error, Result};
use crate::table::Table;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

type Record = Vec<(String, String)>;

/// Minimal owned element tree; Valet XML bodies are small enough to hold whole.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Depth-first search for the first element called `name`, self included.
    fn find(&self, name: &str) -> Option<&Element> {
        if self.is(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn content(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(|c| !c.is("terms"))
    }
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::parse("xml", e.to_string())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(xml_err)
}

fn open(start: &BytesStart<'_>) -> Result<Element> {
    let mut el = Element {
        name: utf8(start.local_name().as_ref())?.to_string(),
        ..Element::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = utf8(attr.key.local_name().as_ref())?.to_string();
        let value = quick_xml::escape::unescape(utf8(&attr.value)?).map_err(xml_err)?;
        el.attrs.push((key, value.into_owned()));
    }
    Ok(el)
}

fn read_tree(body: &str) -> Result<Element> {
    let mut reader = Reader::from_str(body);
    // Synthetic document node at the bottom of the stack.
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => stack.push(open(&e)?),
            Event::Empty(e) => {
                let el = open(&e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(el);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(xml_err("unbalanced closing tag"));
                }
                if let Some(mut el) = stack.pop() {
                    el.text = el.text.trim().to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(el);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(utf8(&t)?);
                }
            }
            Event::CData(t) => {
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(utf8(&t)?);
                }
            }
            Event::GeneralRef(r) => {
                let entity = format!("&{};", utf8(&r)?);
                let resolved = quick_xml::escape::unescape(&entity).map_err(xml_err)?;
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(xml_err("unexpected end of document"));
    }
    stack
        .pop()
        .and_then(|doc| doc.children.into_iter().next())
        .ok_or_else(|| xml_err("document has no root element"))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// A child contributes `name -> text` (or `s-attribute -> text` for `<v s="X">`), its
/// other attributes as `name.attr`, and nested children with a dotted prefix.
fn flatten_child(prefix: &str, child: &Element, out: &mut Record) {
    let key = join(prefix, child.attr("s").unwrap_or(child.name.as_str()));
    if child.children.is_empty() {
        out.push((key.clone(), child.text.clone()));
    }
    for (k, v) in child.attrs.iter().filter(|(k, _)| k != "s") {
        out.push((join(&key, k), v.clone()));
    }
    for grandchild in child.content() {
        flatten_child(&key, grandchild, out);
    }
}

fn record(el: &Element, skip: &[&str]) -> Record {
    let mut out: Record = el
        .attrs
        .iter()
        .map(|(k, v)| (key_column(k).to_string(), v.clone()))
        .collect();
    for child in el.content().filter(|c| !skip.iter().any(|s| c.is(s))) {
        flatten_child("", child, &mut out);
    }
    out
}

fn records(container: &Element) -> Table {
    table_from_records(container.content().map(|c| record(c, &[])))
}

pub(super) fn catalog(body: &str) -> Result<Table> {
    Ok(records(&read_tree(body)?))
}

pub(super) fn series_detail(body: &str) -> Result<Table> {
    let root = read_tree(body)?;
    let kids: Vec<&Element> = root.content().collect();
    let row = match kids.as_slice() {
        [only] if !only.children.is_empty() => record(only, &[]),
        _ => record(&root, &[]),
    };
    Ok(table_from_records([row]))
}

pub(super) fn group_detail(body: &str) -> Result<(Table, Table)> {
    let root = read_tree(body)?;
    let series = match root.find("groupSeries") {
        Some(container) => records(container),
        None => Table::new(["name", "label", "link"]),
    };
    let group = match root.content().find(|c| c.is("group")) {
        Some(el) => record(el, &["groupSeries"]),
        None => record(root.find("groupDetails").unwrap_or(&root), &["groupSeries"]),
    };
    Ok((table_from_records([group]), series))
}

pub(super) fn observations(body: &str) -> Result<(Table, Table)> {
    let root = read_tree(body)?;
    let obs = root
        .find("observations")
        .ok_or_else(|| xml_err("missing <observations> element"))?;
    let detail = match root.find("seriesDetail") {
        Some(container) => records(container),
        None => Table::new(["name", "label", "description"]),
    };
    Ok((detail, records(obs)))
}
