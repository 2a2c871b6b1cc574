// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use region_builder::RegionBuilder;

use crate::loader::RegionData;
use crate::osm::Profile;

mod model;
mod region_builder;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
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
    /// Guesses the format from the first bytes of a file.
    pub fn detect(head: &[u8]) -> Option<Self> {
        if head.starts_with(&[0x1F, 0x8B]) {
            Some(Self::XmlGz)
        } else if head.starts_with(b"BZh") {
            Some(Self::XmlBz2)
        } else if head.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<') {
            Some(Self::Xml)
        } else {
            None
        }
    }
}

/// Additional controls for interpreting OSM data as a region.
#[derive(Debug)]
pub struct Options<'a> {
    /// How OSM features should be interpreted and converted into roads.
    pub profile: &'a Profile<'a>,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Boundary of the region. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ways are cut to the segments with at least one end
    /// inside the boundary, and segments crossing it become transitions to neighboring regions.
    ///
    /// Ignored if all values are set to zero, or at least one of them is not finite;
    /// the region then spans all of the input data and has no transitions.
    pub bbox: [f64; 4],
}

/// Failures of loading a region from OSM data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unrecognized OSM file format")]
    UnsupportedFormat,
}

/// Parse OSM features from a reader into a region named `name`, as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader.
pub fn load_region_from_io<R: io::Read>(
    name: &str,
    options: &Options<'_>,
    reader: R,
) -> Result<RegionData, Error> {
    let mut b = io::BufReader::new(reader);
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?).ok_or(Error::UnsupportedFormat)?,
        format => format,
    };

    let builder = RegionBuilder::new(name, options);
    let region = match format {
        FileFormat::Xml => builder.add_features(xml::features_from_io(b))?,

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            builder.add_features(xml::features_from_io(io::BufReader::new(d)))?
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            builder.add_features(xml::features_from_io(io::BufReader::new(d)))?
        }

        FileFormat::Unknown => return Err(Error::UnsupportedFormat),
    };
    Ok(region)
}

/// Parse OSM features from a file at the provided path into a region, as per the provided [Options].
pub fn load_region_from_file<P: AsRef<Path>>(
    name: &str,
    options: &Options<'_>,
    path: P,
) -> Result<RegionData, Error> {
    let f = File::open(path)?;
    load_region_from_io(name, options, f)
}

/// Parse OSM features from a static buffer into a region, as per the provided [Options].
pub fn load_region_from_buffer(
    name: &str,
    options: &Options<'_>,
    data: &[u8],
) -> Result<RegionData, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data).ok_or(Error::UnsupportedFormat)?,
        format => format,
    };

    if format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        let builder = RegionBuilder::new(name, options);
        Ok(builder.add_features(xml::features_from_buffer(data))?)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        let options = Options {
            file_format: format,
            ..*options
        };
        load_region_from_io(name, &options, cursor)
    }
}
