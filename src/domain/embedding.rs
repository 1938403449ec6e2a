use serde::Serialize;

/// One embedding vector, serialized as a bare array of floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Builds an embedding scaled to unit length. Zero vectors are kept as-is.
    pub fn normalized(mut values: Vec<f32>) -> Self {
        let length: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if length > 0.0 {
            values.iter_mut().for_each(|x| *x /= length);
        }
        Self { values }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}
