use std::fmt;
use std::io::{self, Read, Write};

use crate::error::{FaceIdError, Result};

/// Numeric feature representation of one image.
///
/// Opaque to the index except for its shape, its distance operation and its
/// binary codec. Vectors are immutable once stored.
pub trait FeatureVector: Clone + fmt::Debug + Send + Sync + 'static {
    /// Number of components. All vectors in one store share the same dim.
    fn dim(&self) -> usize;

    /// Non-negative dissimilarity; lower means more similar.
    /// Fails with [`FaceIdError::IncompatibleVector`] on a shape mismatch.
    fn distance(&self, other: &Self) -> Result<f32>;

    /// Serializes the vector to `w`.
    fn write_to(&self, w: &mut dyn Write) -> Result<()>;

    /// Deserializes one vector from `r`, consuming exactly the bytes
    /// [`FeatureVector::write_to`] produced.
    fn read_from(r: &mut dyn Read) -> Result<Self>;

    /// Equality under the vector's own numeric tolerance.
    fn approx_eq(&self, other: &Self, tolerance: f32) -> bool;
}

const FVEC_MAGIC: [u8; 4] = [b'F', b'V', b'E', b'C'];
const FVEC_VERSION: u32 = 1;

/// Upper bound on a decoded dimension, so a corrupt header cannot force a
/// huge allocation.
const MAX_DIM: usize = 1 << 20;

/// DenseVector is a fixed-length f32 feature vector compared by Euclidean
/// distance.
///
/// Binary format (little-endian):
///
/// ```text
/// [4B magic "FVEC"] [4B version=1] [4B dim] [dim x 4B float32]
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseVector {
    values: Vec<f32>,
}

impl DenseVector {
    /// Wraps `values`. Rejects empty input and NaN/infinite components.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(FaceIdError::InvalidFormat("empty vector".into()));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(FaceIdError::InvalidFormat(format!(
                "non-finite value at index {i}"
            )));
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }

    /// Returns a copy scaled to unit L2 norm. Zero vectors are returned as-is.
    pub fn l2_normalized(&self) -> Self {
        let norm: f64 = self
            .values
            .iter()
            .map(|&x| (x as f64) * (x as f64))
            .sum::<f64>()
            .sqrt();
        if norm == 0.0 {
            return self.clone();
        }
        let s = 1.0 / norm;
        Self {
            values: self.values.iter().map(|&x| (x as f64 * s) as f32).collect(),
        }
    }
}

impl fmt::Debug for DenseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseVector")
            .field("dim", &self.values.len())
            .finish()
    }
}

fn read_err(e: io::Error) -> FaceIdError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        FaceIdError::InvalidFormat("truncated vector".into())
    } else {
        FaceIdError::Io(e)
    }
}

impl FeatureVector for DenseVector {
    fn dim(&self) -> usize {
        self.values.len()
    }

    fn distance(&self, other: &Self) -> Result<f32> {
        if self.values.len() != other.values.len() {
            return Err(FaceIdError::IncompatibleVector {
                expected: self.values.len(),
                got: other.values.len(),
            });
        }
        // f64 accumulation keeps equal-distance ties exact for small integers.
        let sum: f64 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| {
                let d = a as f64 - b as f64;
                d * d
            })
            .sum();
        Ok(sum.sqrt() as f32)
    }

    fn write_to(&self, w: &mut dyn Write) -> Result<()> {
        w.write_all(&FVEC_MAGIC)?;
        w.write_all(&FVEC_VERSION.to_le_bytes())?;
        w.write_all(&(self.values.len() as u32).to_le_bytes())?;
        for &v in &self.values {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    fn read_from(r: &mut dyn Read) -> Result<Self> {
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf4).map_err(read_err)?;
        if buf4 != FVEC_MAGIC {
            return Err(FaceIdError::InvalidFormat(format!(
                "invalid magic {buf4:?}"
            )));
        }

        r.read_exact(&mut buf4).map_err(read_err)?;
        let version = u32::from_le_bytes(buf4);
        if version != FVEC_VERSION {
            return Err(FaceIdError::InvalidFormat(format!(
                "unsupported version {version} (want {FVEC_VERSION})"
            )));
        }

        r.read_exact(&mut buf4).map_err(read_err)?;
        let dim = u32::from_le_bytes(buf4) as usize;
        if dim == 0 || dim > MAX_DIM {
            return Err(FaceIdError::InvalidFormat(format!("invalid dimension {dim}")));
        }

        let mut values = vec![0.0f32; dim];
        for v in &mut values {
            r.read_exact(&mut buf4).map_err(read_err)?;
            *v = f32::from_le_bytes(buf4);
        }
        Self::new(values)
    }

    fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> DenseVector {
        DenseVector::new(values.to_vec()).unwrap()
    }

    fn encode(vec: &DenseVector) -> Vec<u8> {
        let mut buf = Vec::new();
        vec.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_distance() {
        let d = v(&[0.0, 0.0]).distance(&v(&[3.0, 4.0])).unwrap();
        assert!((d - 5.0).abs() < 1e-6, "got {d}");
        assert_eq!(v(&[1.0, 2.0]).distance(&v(&[1.0, 2.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let err = v(&[1.0, 0.0]).distance(&v(&[1.0, 0.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            FaceIdError::IncompatibleVector { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn test_new_rejects_bad_values() {
        assert!(DenseVector::new(vec![]).is_err());
        assert!(DenseVector::new(vec![1.0, f32::NAN]).is_err());
        assert!(DenseVector::new(vec![f32::INFINITY]).is_err());
    }

    #[test]
    fn test_codec_layout() {
        let buf = encode(&v(&[1.5, -2.0]));
        assert_eq!(buf.len(), 12 + 8);
        assert_eq!(&buf[..4], b"FVEC");
        assert_eq!(u32::from_le_bytes(buf[8..12].try_into().unwrap()), 2);

        let back = DenseVector::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, v(&[1.5, -2.0]));
    }

    #[test]
    fn test_read_truncated() {
        let buf = encode(&v(&[1.0, 2.0, 3.0]));
        let err = DenseVector::read_from(&mut &buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(err, FaceIdError::InvalidFormat(_)), "got {err}");
        assert!(DenseVector::read_from(&mut &buf[..2]).is_err());
    }

    #[test]
    fn test_read_invalid_header() {
        let bad = b"NOPE\x01\x00\x00\x00";
        assert!(DenseVector::read_from(&mut bad.as_slice()).is_err());

        let mut buf = encode(&v(&[1.0]));
        buf[4] = 9;
        assert!(DenseVector::read_from(&mut buf.as_slice()).is_err());

        let mut buf = encode(&v(&[1.0]));
        buf[8..12].copy_from_slice(&0u32.to_le_bytes());
        assert!(DenseVector::read_from(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_approx_eq() {
        assert!(v(&[1.0, 2.0]).approx_eq(&v(&[1.0005, 2.0]), 1e-3));
        assert!(!v(&[1.0, 2.0]).approx_eq(&v(&[1.1, 2.0]), 1e-3));
        assert!(!v(&[1.0]).approx_eq(&v(&[1.0, 2.0]), 1.0));
    }

    #[test]
    fn test_l2_normalized() {
        let n = v(&[3.0, 4.0]).l2_normalized();
        assert!(n.approx_eq(&v(&[0.6, 0.8]), 1e-6));
        assert_eq!(v(&[0.0, 0.0]).l2_normalized(), v(&[0.0, 0.0]));
    }
}
