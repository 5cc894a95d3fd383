// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading of [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) data
//! (optionally gzip- or bzip2-compressed) into a [MapIndex](crate::MapIndex).
//!
//! Only `node` and `way` elements are used. A node is a building if it has any
//! `building=*` tag. A way is kept only if it is not tagged `area=yes`, has a non-empty
//! `name` or `ref` tag, and references at least 2 nodes.

mod reader;

pub use reader::{load_from_buffer, load_from_file, load_from_io, Error, FileFormat, Options};
