//! Sample containers for the forward map.
//!
//! A [`SampleSet`] holds an ordered collection of points in `R^d` together
//! with optional domain bounds and Voronoi cell volume estimates. A
//! [`Discretization`] pairs an input set with the output set produced by
//! pushing those samples through the forward map, index for index.
//!
//! Restriction operations build new sets instead of mutating dimensions in
//! place, so a restricted view can never alias the set it came from.

use std::fmt;

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised by sample container constructors and setters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleError {
    /// A value row does not match the set's dimension.
    DimMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },
    /// Domain bounds do not cover every dimension exactly once.
    DomainLength { expected: usize, got: usize },
    /// A domain interval has `min > max`.
    InvalidBounds { dim: usize },
    /// Volume array length does not match the sample count.
    VolumeLength { expected: usize, got: usize },
    /// A cell volume estimate is negative.
    NegativeVolume { index: usize },
    /// Input and output sample counts differ.
    SampleCountMismatch { inputs: usize, outputs: usize },
    /// A row or column index is out of range.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::DimMismatch { row, expected, got } => {
                write!(f, "row {} has {} entries, expected {}", row, got, expected)
            }
            SampleError::DomainLength { expected, got } => {
                write!(f, "domain has {} intervals, expected {}", got, expected)
            }
            SampleError::InvalidBounds { dim } => {
                write!(f, "domain interval for dimension {} has min > max", dim)
            }
            SampleError::VolumeLength { expected, got } => {
                write!(f, "volume array has {} entries, expected {}", got, expected)
            }
            SampleError::NegativeVolume { index } => {
                write!(f, "volume estimate at index {} is negative", index)
            }
            SampleError::SampleCountMismatch { inputs, outputs } => {
                write!(
                    f,
                    "input set has {} samples but output set has {}",
                    inputs, outputs
                )
            }
            SampleError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// An ordered collection of points in `R^d` with optional domain bounds
/// and cell volume estimates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleSet<F> {
    dim: usize,
    values: Vec<Vec<F>>,
    domain: Option<Vec<(F, F)>>,
    volumes: Option<Vec<F>>,
}

impl<F: Float> SampleSet<F> {
    /// Create an empty sample set of the given dimension.
    pub fn new(dim: usize) -> Self {
        SampleSet {
            dim,
            values: Vec::new(),
            domain: None,
            volumes: None,
        }
    }

    /// Create a sample set from value rows, inferring nothing: every row
    /// must have length `dim`.
    pub fn from_values(dim: usize, values: Vec<Vec<F>>) -> Result<Self, SampleError> {
        let mut set = SampleSet::new(dim);
        set.set_values(values)?;
        Ok(set)
    }

    /// Build a set from rows already known to have length `dim`.
    pub(crate) fn from_rows_unchecked(
        dim: usize,
        values: Vec<Vec<F>>,
        domain: Option<Vec<(F, F)>>,
    ) -> Self {
        debug_assert!(values.iter().all(|row| row.len() == dim));
        SampleSet {
            dim,
            values,
            domain,
            volumes: None,
        }
    }

    /// Dimension of the space the samples live in.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of samples currently stored.
    pub fn num_samples(&self) -> usize {
        self.values.len()
    }

    /// All sample rows.
    pub fn values(&self) -> &[Vec<F>] {
        &self.values
    }

    /// A single sample row.
    pub fn value(&self, index: usize) -> Result<&[F], SampleError> {
        self.values
            .get(index)
            .map(|row| row.as_slice())
            .ok_or(SampleError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    /// Replace the stored values. Invalidates volumes (the Voronoi
    /// decomposition they described no longer exists).
    pub fn set_values(&mut self, values: Vec<Vec<F>>) -> Result<(), SampleError> {
        for (row, v) in values.iter().enumerate() {
            if v.len() != self.dim {
                return Err(SampleError::DimMismatch {
                    row,
                    expected: self.dim,
                    got: v.len(),
                });
            }
        }
        self.values = values;
        self.volumes = None;
        Ok(())
    }

    /// Domain bounds, one `(min, max)` interval per dimension.
    pub fn domain(&self) -> Option<&[(F, F)]> {
        self.domain.as_deref()
    }

    /// Set the domain bounds.
    pub fn set_domain(&mut self, domain: Vec<(F, F)>) -> Result<(), SampleError> {
        if domain.len() != self.dim {
            return Err(SampleError::DomainLength {
                expected: self.dim,
                got: domain.len(),
            });
        }
        for (d, &(lo, hi)) in domain.iter().enumerate() {
            if lo > hi {
                return Err(SampleError::InvalidBounds { dim: d });
            }
        }
        self.domain = Some(domain);
        Ok(())
    }

    /// Voronoi cell volume estimates, if computed.
    pub fn volumes(&self) -> Option<&[F]> {
        self.volumes.as_deref()
    }

    /// Set per-sample cell volume estimates.
    pub fn set_volumes(&mut self, volumes: Vec<F>) -> Result<(), SampleError> {
        if volumes.len() != self.values.len() {
            return Err(SampleError::VolumeLength {
                expected: self.values.len(),
                got: volumes.len(),
            });
        }
        if let Some(i) = volumes.iter().position(|&v| v < F::zero()) {
            return Err(SampleError::NegativeVolume { index: i });
        }
        self.volumes = Some(volumes);
        Ok(())
    }

    /// Per-dimension sample range, `max - min` over the stored values.
    ///
    /// Zero for dimensions with no spread (and for empty sets).
    pub fn value_ranges(&self) -> Vec<F> {
        let mut ranges = vec![F::zero(); self.dim];
        if self.values.is_empty() {
            return ranges;
        }
        for (d, range) in ranges.iter_mut().enumerate() {
            let mut lo = self.values[0][d];
            let mut hi = lo;
            for row in &self.values[1..] {
                let v = row[d];
                if v < lo {
                    lo = v;
                }
                if v > hi {
                    hi = v;
                }
            }
            *range = hi - lo;
        }
        ranges
    }

    /// A new set containing only the selected dimensions, in the given
    /// order. Domain bounds follow the selection; volumes do not survive
    /// (they measured cells of the full-dimensional set).
    pub fn restricted(&self, dims: &[usize]) -> Result<SampleSet<F>, SampleError> {
        for &d in dims {
            if d >= self.dim {
                return Err(SampleError::IndexOutOfRange {
                    index: d,
                    len: self.dim,
                });
            }
        }
        let values = self
            .values
            .iter()
            .map(|row| dims.iter().map(|&d| row[d]).collect())
            .collect();
        let domain = self
            .domain
            .as_ref()
            .map(|b| dims.iter().map(|&d| b[d]).collect());
        Ok(SampleSet {
            dim: dims.len(),
            values,
            domain,
            volumes: None,
        })
    }

    /// A new set containing only the selected sample rows, in the given
    /// order. Dimension and domain carry over; volumes follow the rows.
    pub fn select_rows(&self, rows: &[usize]) -> Result<SampleSet<F>, SampleError> {
        for &r in rows {
            if r >= self.values.len() {
                return Err(SampleError::IndexOutOfRange {
                    index: r,
                    len: self.values.len(),
                });
            }
        }
        let values = rows.iter().map(|&r| self.values[r].clone()).collect();
        let volumes = self
            .volumes
            .as_ref()
            .map(|v| rows.iter().map(|&r| v[r]).collect());
        Ok(SampleSet {
            dim: self.dim,
            values,
            domain: self.domain.clone(),
            volumes,
        })
    }
}

/// An input sample set paired with its image under the forward map.
///
/// Invariant: both sets hold the same number of samples and sample `i` of
/// the output set is the forward image of sample `i` of the input set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Discretization<F> {
    input: SampleSet<F>,
    output: SampleSet<F>,
}

impl<F: Float> Discretization<F> {
    /// Pair an input set with its output set.
    pub fn new(input: SampleSet<F>, output: SampleSet<F>) -> Result<Self, SampleError> {
        if input.num_samples() != output.num_samples() {
            return Err(SampleError::SampleCountMismatch {
                inputs: input.num_samples(),
                outputs: output.num_samples(),
            });
        }
        Ok(Discretization { input, output })
    }

    /// The parameter-space samples.
    pub fn input(&self) -> &SampleSet<F> {
        &self.input
    }

    /// The data-space samples.
    pub fn output(&self) -> &SampleSet<F> {
        &self.output
    }

    /// Shared sample count.
    pub fn num_samples(&self) -> usize {
        self.input.num_samples()
    }

    /// Decompose into the two sets.
    pub fn into_parts(self) -> (SampleSet<F>, SampleSet<F>) {
        (self.input, self.output)
    }
}
