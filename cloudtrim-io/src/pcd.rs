//! PCD (Point Cloud Data) export
//!
//! Buffers are written as `FIELDS x y z rgb` with one row per point. In the
//! default ASCII layout `rgb` is the packed integer `(r << 16) | (g << 8) | b`
//! printed in decimal. This is a simplification of the PCD convention, which
//! stores the same 32 bits reinterpreted as a float; readers that expect the
//! float-encoded variant should be given [`RgbEncoding::PackedFloat`] output.
//! Binary output always stores the raw 32 bits, which is what both
//! conventions agree on.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use cloudtrim_core::{Color, Error, PointBuffer, Result};

/// File name offered to the user when exporting an edited cloud
pub const DEFAULT_EXPORT_FILE_NAME: &str = "modified.pcd";

/// PCD data section layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PcdDataFormat {
    #[default]
    Ascii,
    Binary,
}

impl PcdDataFormat {
    fn keyword(self) -> &'static str {
        match self {
            PcdDataFormat::Ascii => "ascii",
            PcdDataFormat::Binary => "binary",
        }
    }
}

/// How the `rgb` column is printed in ASCII output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RgbEncoding {
    /// Decimal integer `(r << 16) | (g << 8) | b`
    #[default]
    PackedInteger,
    /// The packed integer's bit pattern reinterpreted as an `f32`
    PackedFloat,
}

/// PCD field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcdField {
    pub name: &'static str,
    pub size: usize,
    pub type_char: char,
    pub count: usize,
}

impl PcdField {
    const fn float(name: &'static str) -> Self {
        Self {
            name,
            size: 4,
            type_char: 'F',
            count: 1,
        }
    }
}

/// Fields written for every buffer
pub const PCD_FIELDS: [PcdField; 4] = [
    PcdField::float("x"),
    PcdField::float("y"),
    PcdField::float("z"),
    PcdField::float("rgb"),
];

/// PCD header information
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    pub version: String,
    pub width: usize,
    pub height: usize,
    pub viewpoint: [f64; 7], // tx, ty, tz, qw, qx, qy, qz
    pub data_format: PcdDataFormat,
}

/// PCD write options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcdWriteOptions {
    pub data_format: PcdDataFormat,
    pub rgb_encoding: RgbEncoding,
    pub version: String,
    pub viewpoint: Option<[f64; 7]>,
}

impl Default for PcdWriteOptions {
    fn default() -> Self {
        Self {
            data_format: PcdDataFormat::Ascii,
            rgb_encoding: RgbEncoding::PackedInteger,
            version: "0.7".to_string(),
            viewpoint: None,
        }
    }
}

impl PcdWriteOptions {
    /// ASCII output with float-encoded `rgb`, for strict PCD readers
    pub fn strict_ascii() -> Self {
        Self {
            rgb_encoding: RgbEncoding::PackedFloat,
            ..Self::default()
        }
    }

    /// Binary little-endian output
    pub fn binary() -> Self {
        Self {
            data_format: PcdDataFormat::Binary,
            ..Self::default()
        }
    }
}

/// Writer turning a [`PointBuffer`] into PCD bytes
pub struct PcdWriter;

impl PcdWriter {
    /// Serialize with default options: ASCII, integer-packed `rgb`
    pub fn serialize(buffer: &PointBuffer) -> Result<String> {
        let bytes = Self::to_bytes(buffer, &PcdWriteOptions::default())?;
        String::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
    }

    /// Serialize into an in-memory byte vector
    pub fn to_bytes(buffer: &PointBuffer, options: &PcdWriteOptions) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Self::write_to_writer(buffer, &mut out, options)?;
        Ok(out)
    }

    /// Write point buffer to a PCD file
    pub fn write_file<P: AsRef<Path>>(
        buffer: &PointBuffer,
        path: P,
        options: &PcdWriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to_writer(buffer, &mut writer, options)?;
        writer.flush()?;
        info!(points = buffer.len(), path = %path.display(), "exported PCD file");
        Ok(())
    }

    /// Write point buffer to writer with options
    pub fn write_to_writer<W: Write>(
        buffer: &PointBuffer,
        writer: &mut W,
        options: &PcdWriteOptions,
    ) -> Result<()> {
        let header = Self::header(buffer, options);
        match options.data_format {
            PcdDataFormat::Ascii => {
                Self::write_ascii(writer, buffer, options.rgb_encoding, &header)
            }
            PcdDataFormat::Binary => Self::write_binary(writer, buffer, &header),
        }
    }

    fn header(buffer: &PointBuffer, options: &PcdWriteOptions) -> PcdHeader {
        PcdHeader {
            version: options.version.clone(),
            width: buffer.len(),
            height: 1,
            viewpoint: options.viewpoint.unwrap_or([0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
            data_format: options.data_format,
        }
    }

    /// Write PCD header
    fn write_header<W: Write>(writer: &mut W, header: &PcdHeader) -> Result<()> {
        writeln!(writer, "# .PCD v{} - Point Cloud Data file format", header.version)?;
        writeln!(writer, "VERSION {}", header.version)?;
        writeln!(writer, "FIELDS {}", PCD_FIELDS.iter().map(|f| f.name).join(" "))?;
        writeln!(writer, "SIZE {}", PCD_FIELDS.iter().map(|f| f.size).join(" "))?;
        writeln!(writer, "TYPE {}", PCD_FIELDS.iter().map(|f| f.type_char).join(" "))?;
        writeln!(writer, "COUNT {}", PCD_FIELDS.iter().map(|f| f.count).join(" "))?;
        writeln!(writer, "WIDTH {}", header.width)?;
        writeln!(writer, "HEIGHT {}", header.height)?;
        writeln!(writer, "VIEWPOINT {}", header.viewpoint.iter().join(" "))?;
        writeln!(writer, "POINTS {}", header.width * header.height)?;
        writeln!(writer, "DATA {}", header.data_format.keyword())?;
        Ok(())
    }

    /// Write ASCII format data
    fn write_ascii<W: Write>(
        writer: &mut W,
        buffer: &PointBuffer,
        rgb_encoding: RgbEncoding,
        header: &PcdHeader,
    ) -> Result<()> {
        Self::write_header(writer, header)?;
        for point in buffer.iter() {
            let p = point.position;
            match rgb_encoding {
                RgbEncoding::PackedInteger => {
                    writeln!(writer, "{} {} {} {}", p.x, p.y, p.z, point.color.to_packed_rgb())?
                }
                RgbEncoding::PackedFloat => {
                    writeln!(writer, "{} {} {} {:e}", p.x, p.y, p.z, packed_float(&point.color))?
                }
            }
        }
        Ok(())
    }

    /// Write binary format data
    fn write_binary<W: Write>(
        writer: &mut W,
        buffer: &PointBuffer,
        header: &PcdHeader,
    ) -> Result<()> {
        Self::write_header(writer, header)?;
        for point in buffer.iter() {
            // Write x, y, z as f32 little endian
            writer.write_all(&point.position.x.to_le_bytes())?;
            writer.write_all(&point.position.y.to_le_bytes())?;
            writer.write_all(&point.position.z.to_le_bytes())?;
            writer.write_all(&point.color.to_packed_rgb().to_le_bytes())?;
        }
        Ok(())
    }
}

fn packed_float(color: &Color) -> f32 {
    f32::from_bits(color.to_packed_rgb())
}
