//! Reader for MAT level-5 files.
//!
//! Only numeric matrices are decoded. Cells, structs, character and sparse
//! arrays are skipped. Compressed elements (MATLAB v7) are inflated with zlib.

use {
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    flate2::read::ZlibDecoder,
    std::{fs, io::Read, path::Path},
    thiserror::Error,
};

const HEADER_LEN: usize = 128;

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const MX_DOUBLE_CLASS: u8 = 6;
const MX_UINT64_CLASS: u8 = 15;

#[derive(Debug, Error)]
pub enum MatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a level 5 MAT file: {0}")]
    InvalidHeader(String),

    #[error("truncated data element at byte {0}")]
    Truncated(usize),

    #[error("unsupported data type {0}")]
    UnsupportedType(u32),

    #[error("malformed matrix: {0}")]
    MalformedMatrix(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    fn numeric(self, data_type: u32, data: &[u8]) -> Result<Vec<f64>, MatError> {
        let endian = self;
        macro_rules! decode {
            ($width:expr, $read:ident) => {
                data.chunks_exact($width)
                    .map(|c| match endian {
                        Endian::Little => LittleEndian::$read(c) as f64,
                        Endian::Big => BigEndian::$read(c) as f64,
                    })
                    .collect()
            };
        }

        Ok(match data_type {
            MI_INT8 => data.iter().map(|&b| b as i8 as f64).collect(),
            MI_UINT8 => data.iter().map(|&b| b as f64).collect(),
            MI_INT16 => decode!(2, read_i16),
            MI_UINT16 => decode!(2, read_u16),
            MI_INT32 => decode!(4, read_i32),
            MI_UINT32 => decode!(4, read_u32),
            MI_SINGLE => decode!(4, read_f32),
            MI_DOUBLE => decode!(8, read_f64),
            MI_INT64 => decode!(8, read_i64),
            MI_UINT64 => decode!(8, read_u64),
            other => return Err(MatError::UnsupportedType(other)),
        })
    }
}

struct Element<'a> {
    data_type: u32,
    data: &'a [u8],
}

/// Named numeric matrix, real part in column-major order
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub name: String,
    pub dims: Vec<usize>,
    pub real: Vec<f64>,
}

impl MatArray {
    pub fn rows(&self) -> usize {
        self.dims.get(0).copied().unwrap_or(0)
    }

    /// Product of the trailing dimensions, zero if it overflows
    pub fn cols(&self) -> usize {
        element_count(self.dims.get(1..).unwrap_or_default()).unwrap_or(0)
    }

    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        let rows = self.rows();
        if i >= rows {
            return None;
        }
        (0..self.cols())
            .map(|j| self.real.get(j * rows + i).copied())
            .collect()
    }

    pub fn column(&self, j: usize) -> Option<Vec<f64>> {
        let rows = self.rows();
        if j >= self.cols() {
            return None;
        }
        self.real.get(j * rows..(j + 1) * rows).map(<[f64]>::to_vec)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatFile {
    arrays: Vec<MatArray>,
}

impl MatFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MatError> {
        Self::parse(&fs::read(path)?)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, MatError> {
        if bytes.len() < HEADER_LEN {
            return Err(MatError::InvalidHeader(format!(
                "{} bytes is shorter than the header",
                bytes.len()
            )));
        }

        let endian = match &bytes[126..128] {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other => {
                return Err(MatError::InvalidHeader(format!(
                    "unknown endian indicator {:?}",
                    other
                )))
            }
        };

        let mut arrays = Vec::new();
        parse_elements(endian, &bytes[HEADER_LEN..], HEADER_LEN, &mut arrays)?;

        Ok(MatFile { arrays })
    }

    pub fn find(&self, name: &str) -> Option<&MatArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn arrays(&self) -> &[MatArray] {
        &self.arrays
    }
}

fn parse_elements(
    endian: Endian,
    buf: &[u8],
    base: usize,
    arrays: &mut Vec<MatArray>,
) -> Result<(), MatError> {
    let mut pos = 0;
    while pos < buf.len() {
        let element = next_element(endian, buf, &mut pos, base)?;
        match element.data_type {
            MI_MATRIX => {
                if let Some(array) = parse_matrix(endian, element.data, base)? {
                    arrays.push(array);
                }
            }
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(element.data).read_to_end(&mut inflated)?;
                parse_elements(endian, &inflated, 0, arrays)?;
            }
            _ => (),
        }
    }
    Ok(())
}

fn next_element<'a>(
    endian: Endian,
    buf: &'a [u8],
    pos: &mut usize,
    base: usize,
) -> Result<Element<'a>, MatError> {
    let start = *pos;
    if buf.len() - start < 8 {
        return Err(MatError::Truncated(base + start));
    }

    let tag = endian.u32(&buf[start..]);

    // Small element: size in the upper half of the tag, data in the next four bytes
    if tag >> 16 != 0 {
        let size = (tag >> 16) as usize;
        if size > 4 {
            return Err(MatError::Truncated(base + start));
        }
        *pos = start + 8;
        return Ok(Element {
            data_type: tag & 0xffff,
            data: &buf[start + 4..start + 4 + size],
        });
    }

    let size = endian.u32(&buf[start + 4..]) as usize;
    let data_start = start + 8;
    let data_end = data_start + size;
    if data_end > buf.len() {
        return Err(MatError::Truncated(base + start));
    }

    *pos = if tag == MI_COMPRESSED {
        data_end
    } else {
        (data_start + padded(size)).min(buf.len())
    };

    Ok(Element {
        data_type: tag,
        data: &buf[data_start..data_end],
    })
}

fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
}

fn padded(size: usize) -> usize {
    (size + 7) / 8 * 8
}

fn parse_matrix(endian: Endian, buf: &[u8], base: usize) -> Result<Option<MatArray>, MatError> {
    if buf.is_empty() {
        return Ok(None);
    }

    let mut pos = 0;

    let flags = next_element(endian, buf, &mut pos, base)?;
    if flags.data.len() < 4 {
        return Err(MatError::MalformedMatrix("short array flags".to_string()));
    }
    let class = (endian.u32(flags.data) & 0xff) as u8;
    if !(MX_DOUBLE_CLASS..=MX_UINT64_CLASS).contains(&class) {
        return Ok(None);
    }

    let dims = next_element(endian, buf, &mut pos, base)?;
    let dims = endian
        .numeric(dims.data_type, dims.data)?
        .into_iter()
        .map(|d| d as usize)
        .collect::<Vec<usize>>();

    let name = next_element(endian, buf, &mut pos, base)?;
    let name = String::from_utf8_lossy(name.data).into_owned();

    let real = next_element(endian, buf, &mut pos, base)?;
    let real = endian.numeric(real.data_type, real.data)?;

    let expected = element_count(&dims).ok_or_else(|| {
        MatError::MalformedMatrix(format!("{} has oversized dimensions {:?}", name, dims))
    })?;
    if real.len() != expected {
        return Err(MatError::MalformedMatrix(format!(
            "{} has {} values for dimensions {:?}",
            name,
            real.len(),
            dims
        )));
    }

    Ok(Some(MatArray { name, dims, real }))
}

/// Writes uncompressed little-endian MAT files holding double matrices
#[cfg(test)]
pub(crate) fn write_mat<P: AsRef<Path>>(path: P, arrays: &[(&str, usize, usize, Vec<f64>)]) {
    use byteorder::WriteBytesExt;

    fn pad(out: &mut Vec<u8>) {
        while out.len() % 8 != 0 {
            out.push(0);
        }
    }

    let mut out = vec![b' '; 116];
    out[..20].copy_from_slice(b"MATLAB 5.0 MAT-file,");
    out.extend_from_slice(&[0; 8]);
    out.write_u16::<LittleEndian>(0x0100).unwrap();
    out.extend_from_slice(b"IM");

    for (name, rows, cols, data) in arrays {
        let mut body = Vec::new();

        body.write_u32::<LittleEndian>(MI_UINT32).unwrap();
        body.write_u32::<LittleEndian>(8).unwrap();
        body.write_u32::<LittleEndian>(MX_DOUBLE_CLASS as u32).unwrap();
        body.write_u32::<LittleEndian>(0).unwrap();

        body.write_u32::<LittleEndian>(MI_INT32).unwrap();
        body.write_u32::<LittleEndian>(8).unwrap();
        body.write_i32::<LittleEndian>(*rows as i32).unwrap();
        body.write_i32::<LittleEndian>(*cols as i32).unwrap();

        body.write_u32::<LittleEndian>(MI_INT8).unwrap();
        body.write_u32::<LittleEndian>(name.len() as u32).unwrap();
        body.extend_from_slice(name.as_bytes());
        pad(&mut body);

        body.write_u32::<LittleEndian>(MI_DOUBLE).unwrap();
        body.write_u32::<LittleEndian>((data.len() * 8) as u32).unwrap();
        for x in data.iter() {
            body.write_f64::<LittleEndian>(*x).unwrap();
        }

        out.write_u32::<LittleEndian>(MI_MATRIX).unwrap();
        out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        out.extend_from_slice(&body);
    }

    fs::write(path, out).unwrap();
}
