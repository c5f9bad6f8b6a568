use ndarray::Array2;

pub type Matrix = Vec<Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sidedness {
    TwoSided,
    /// Tail chosen by the sign of the observed correlation.
    OneSided,
}

/// Values over a parcellation, optionally labelled by region.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainMap {
    pub values: Vec<f64>,
    pub labels: Option<Vec<String>>,
}

impl BrainMap {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            labels: None,
        }
    }

    pub fn with_labels(values: Vec<f64>, labels: Vec<String>) -> Self {
        Self {
            values,
            labels: Some(labels),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinResult {
    pub r: f64,
    pub p: f64,
    pub null: Option<Vec<f64>>,
    pub rotation_count: usize,
    /// Draws whose nearest-point reassignment left every region in place.
    pub identity_rotations: usize,
    /// Seed of the Haar rotation stream, when one was used.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpicentreResult {
    pub seeds: Vec<String>,
    pub r: Vec<f64>,
    pub p: Vec<f64>,
}

impl EpicentreResult {
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub r: Array2<f64>,
    pub p: Array2<f64>,
}
