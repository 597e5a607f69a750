use crate::error::EmbedderError;
use sentrygrid_types::{BBox, Embedding, Frame};

/// Appearance-embedding contract: crops a region out of `frame` and
/// returns a fixed-dimension, L2-normalized feature vector.
pub trait Embedder: Send {
    fn embed_dim(&self) -> usize;

    fn embed(&mut self, frame: &Frame, crop: BBox) -> Result<Embedding, EmbedderError>;
}

impl Embedder for Box<dyn Embedder> {
    fn embed_dim(&self) -> usize {
        (**self).embed_dim()
    }

    fn embed(&mut self, frame: &Frame, crop: BBox) -> Result<Embedding, EmbedderError> {
        (**self).embed(frame, crop)
    }
}

/// Returns a constant-direction embedding of the configured dimension,
/// marking it invalid whenever the crop clips to nothing. Good enough for
/// exercising the reID/coordinator plumbing without a real model.
pub struct FixedEmbedder {
    dim: usize,
}

impl FixedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for FixedEmbedder {
    fn embed_dim(&self) -> usize {
        self.dim
    }

    fn embed(&mut self, frame: &Frame, crop: BBox) -> Result<Embedding, EmbedderError> {
        match crop.clip(frame.width, frame.height) {
            Some(_) => {
                let mut values = vec![0.0f32; self.dim];
                values[0] = 1.0;
                Ok(Embedding::new(values, true))
            }
            None => Ok(Embedding::invalid(self.dim)),
        }
    }
}
