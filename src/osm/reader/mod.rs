// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use index_builder::IndexBuilder;

use crate::MapIndex;

mod index_builder;
mod model;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its first few bytes.
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if head.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for loading OSM data into a [MapIndex].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,
}

/// Error which can occur when loading OSM data. In all cases no [MapIndex] is produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing <osm> root element")]
    MissingRoot,
}

/// Parse OSM data from a reader into a new [MapIndex] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader.
pub fn load_from_io<R: io::Read>(options: &Options, reader: R) -> Result<MapIndex, Error> {
    let mut b = io::BufReader::new(reader);

    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::sniff(b.fill_buf()?),
        f => f,
    };

    match file_format {
        FileFormat::Unknown | FileFormat::Xml => {
            let r = xml::Reader::from_io(b);
            IndexBuilder::default().add_features(r)
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            IndexBuilder::default().add_features(r)
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            IndexBuilder::default().add_features(r)
        }
    }
}

/// Parse OSM data from a file at the provided path into a new [MapIndex]
/// as per the provided [Options].
pub fn load_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<MapIndex, Error> {
    let f = File::open(path)?;
    load_from_io(options, f)
}

/// Parse OSM data from a static buffer into a new [MapIndex] as per the provided [Options].
pub fn load_from_buffer(options: &Options, data: &[u8]) -> Result<MapIndex, Error> {
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::sniff(data),
        f => f,
    };

    if file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        let r = xml::Reader::from_buffer(data);
        IndexBuilder::default().add_features(r)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = Options { file_format };
        load_from_io(&options, io::Cursor::new(data))
    }
}
