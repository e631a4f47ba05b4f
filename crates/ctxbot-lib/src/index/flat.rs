//! Exact (brute-force) vector index stored in the FAISS flat index format.
//!
//! On-disk layout, all little-endian:
//!
//! ```text
//! fourcc      4 bytes   "IxF2" (L2) or "IxFI" (inner product)
//! d           i32       vector dimension
//! ntotal      i64       number of vectors
//! dummy       i64 x 2   unused
//! is_trained  u8
//! metric      i32       0 = inner product, 1 = L2
//! size        u64       number of f32 values that follow (d * ntotal)
//! data        f32 x size
//! ```
//!
//! This is what `faiss.write_index` produces for `IndexFlatL2` and
//! `IndexFlatIP`, so indexes built offline with FAISS load unchanged.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::IndexError;

const FOURCC_L2: [u8; 4] = *b"IxF2";
const FOURCC_IP: [u8; 4] = *b"IxFI";
const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;
const HEADER_DUMMY: i64 = 1 << 20;

/// Distance metric of a flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance.
    L2,
    /// Dot product; larger is closer.
    InnerProduct,
}

impl Metric {
    const fn fourcc(self) -> [u8; 4] {
        match self {
            Self::L2 => FOURCC_L2,
            Self::InnerProduct => FOURCC_IP,
        }
    }

    const fn code(self) -> i32 {
        match self {
            Self::L2 => METRIC_L2,
            Self::InnerProduct => METRIC_INNER_PRODUCT,
        }
    }
}

/// One search hit: index position plus its distance from the query.
///
/// Smaller is always nearer. For inner-product indexes the distance is the
/// negated dot product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Vectors stored contiguously, row `i` at `vectors[i * d..(i + 1) * d]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append one vector at position `len()`.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Return the `min(k, len())` nearest vectors, nearest first.
    ///
    /// Equal distances are ordered by ascending position, so results are
    /// fully deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: self.distance(query, row),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Metric::InnerProduct => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        }
    }

    /// Load an index file.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_from(BufReader::new(file)).map_err(|e| match e {
            IndexError::Io { source, .. } => IndexError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Write the index file, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(io_err)?;
        writer.flush().map_err(io_err)
    }

    /// Decode an index from a FAISS flat index byte stream.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, IndexError> {
        let fourcc: [u8; 4] = read_array(&mut reader)?;
        let dimension = i32::from_le_bytes(read_array(&mut reader)?);
        let ntotal = i64::from_le_bytes(read_array(&mut reader)?);
        let _dummy: [u8; 16] = read_array(&mut reader)?;
        let [_is_trained] = read_array::<_, 1>(&mut reader)?;
        let metric_code = i32::from_le_bytes(read_array(&mut reader)?);

        let metric = match metric_code {
            METRIC_L2 => Metric::L2,
            METRIC_INNER_PRODUCT => Metric::InnerProduct,
            other => return Err(IndexError::UnsupportedMetric { metric: other }),
        };
        if fourcc != metric.fourcc() {
            return Err(IndexError::UnsupportedType {
                fourcc: String::from_utf8_lossy(&fourcc).into_owned(),
            });
        }
        if dimension <= 0 {
            return Err(IndexError::Corrupt {
                message: format!("dimension {dimension} is not positive"),
            });
        }
        if ntotal < 0 {
            return Err(IndexError::Corrupt {
                message: format!("vector count {ntotal} is negative"),
            });
        }

        let dimension = dimension as usize;
        let expected = (ntotal as usize)
            .checked_mul(dimension)
            .ok_or_else(|| IndexError::Corrupt {
                message: "vector count overflows".into(),
            })?;
        let size = u64::from_le_bytes(read_array(&mut reader)?);
        if size != expected as u64 {
            return Err(IndexError::Corrupt {
                message: format!("payload holds {size} values, header implies {expected}"),
            });
        }

        let byte_len = expected.checked_mul(4).ok_or_else(|| IndexError::Corrupt {
            message: "payload size overflows".into(),
        })?;
        let mut bytes = Vec::new();
        reader
            .take(byte_len as u64)
            .read_to_end(&mut bytes)
            .map_err(|source| IndexError::Io {
                path: std::path::PathBuf::new(),
                source,
            })?;
        if bytes.len() != byte_len {
            return Err(IndexError::Truncated);
        }

        let vectors = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            dimension,
            metric,
            vectors,
        })
    }

    /// Encode the index as a FAISS flat index byte stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.metric.fourcc())?;
        writer.write_all(&(self.dimension as i32).to_le_bytes())?;
        writer.write_all(&(self.len() as i64).to_le_bytes())?;
        writer.write_all(&HEADER_DUMMY.to_le_bytes())?;
        writer.write_all(&HEADER_DUMMY.to_le_bytes())?;
        writer.write_all(&[1u8])?;
        writer.write_all(&self.metric.code().to_le_bytes())?;
        writer.write_all(&(self.vectors.len() as u64).to_le_bytes())?;
        for value in &self.vectors {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N], IndexError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            IndexError::Truncated
        } else {
            IndexError::Io {
                path: std::path::PathBuf::new(),
                source: e,
            }
        }
    })?;
    Ok(buf)
}
