// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::{from_utf8, FromStr};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use super::{model, Error};

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads osm [Features](model::Feature) from an XML file.
///
/// Malformed attributes are replaced by zeros (or skipped, for tags),
/// and only [ill-formed XML](quick_xml::Error) or a missing `<osm>` root element
/// are reported as errors.
pub(super) struct Reader<P: Parser> {
    parser: P,
    root_seen: bool,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self {
            parser,
            root_seen: false,
            eof: false,
        }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e.into()));
                }
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"osm" => self.root_seen = true,
                    b"node" => return Some(Ok(model::Feature::Node(parse_node(&start)))),
                    b"way" => return Some(Ok(model::Feature::Way(parse_way(&start)))),
                    b"tag" => {
                        if let Some(tags) = feature_tags(&mut f) {
                            if let Some((k, v)) = parse_tag(&start) {
                                tags.insert(k, v);
                            }
                        }
                    }
                    b"nd" => {
                        if let Some(nodes) = feature_nodes(&mut f) {
                            nodes.push(parse_nd(&start));
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"osm" => self.root_seen = true,
                    b"node" => f = Some(model::Feature::Node(parse_node(&start))),
                    b"way" => f = Some(model::Feature::Way(parse_way(&start))),
                    // Relations are not used - make sure their tags are not picked up
                    b"relation" => f = None,
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                    if !self.root_seen {
                        return Some(Err(Error::MissingRoot));
                    }
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

/// Parses a numeric attribute value, falling back to zero.
fn parse_or_zero<T: FromStr + Default>(element: &str, attr: &Attribute<'_>) -> T {
    let value = from_utf8(&attr.value)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok());

    match value {
        Some(value) => value,
        None => {
            log::warn!(
                "{}: invalid {} attribute {:?} - assuming zero",
                element,
                String::from_utf8_lossy(attr.key.as_ref()),
                String::from_utf8_lossy(&attr.value),
            );
            T::default()
        }
    }
}

/// Parses a coordinate attribute value, treating non-finite numbers as malformed.
fn parse_coord(element: &str, attr: &Attribute<'_>) -> f64 {
    let value: f64 = parse_or_zero(element, attr);
    if value.is_finite() {
        value
    } else {
        log::warn!(
            "{}: non-finite {} attribute {} - assuming zero",
            element,
            String::from_utf8_lossy(attr.key.as_ref()),
            value,
        );
        0.0
    }
}

/// Iterates over well-formed attributes of an element, logging malformed ones.
fn attributes<'a>(
    element: &'a str,
    start: &'a BytesStart<'_>,
) -> impl Iterator<Item = Attribute<'a>> + 'a {
    start.attributes().filter_map(move |attr| match attr {
        Ok(attr) => Some(attr),
        Err(e) => {
            log::warn!("{}: malformed attribute: {}", element, e);
            None
        }
    })
}

fn parse_node(start: &BytesStart<'_>) -> model::Node {
    let mut node = model::Node::default();

    for attr in attributes("node", start) {
        match attr.key.as_ref() {
            b"id" => node.id = parse_or_zero("node", &attr),
            b"lat" => node.lat = parse_coord("node", &attr),
            b"lon" => node.lon = parse_coord("node", &attr),
            _ => {}
        }
    }

    node
}

fn parse_way(start: &BytesStart<'_>) -> model::Way {
    let mut way = model::Way::default();

    for attr in attributes("way", start) {
        if attr.key.as_ref() == b"id" {
            way.id = parse_or_zero("way", &attr);
        }
    }

    way
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in attributes("tag", start) {
        match attr.key.as_ref() {
            b"k" => k = attr.unescape_value().ok().map(|s| s.into_owned()),
            b"v" => v = attr.unescape_value().ok().map(|s| s.into_owned()),
            _ => {}
        }
    }

    match k {
        Some(k) => Some((k, v.unwrap_or_default())),
        None => {
            log::warn!("tag: missing or malformed k attribute - skipping");
            None
        }
    }
}

fn parse_nd(start: &BytesStart<'_>) -> u64 {
    attributes("nd", start)
        .find(|attr| attr.key.as_ref() == b"ref")
        .map(|attr| parse_or_zero("nd", &attr))
        .unwrap_or_default()
}

fn feature_tags(f: &mut Option<model::Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        None => None,
        Some(model::Feature::Node(ref mut n)) => Some(&mut n.tags),
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.tags),
    }
}

fn feature_nodes(f: &mut Option<model::Feature>) -> Option<&mut Vec<u64>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}
