use crate::error::{ReidError, Result};
use sentrygrid_adapters::Embedder;
use sentrygrid_types::{Frame, LocalTrack};

/// Wraps an [`Embedder`] with the caching and dimension-consistency
/// policy the appearance model is used under: at most one embedding
/// computation per `(track, sequence_no)`, and every embedding this
/// engine produces carries the same dimension.
pub struct ReidEngine<E: Embedder> {
    embedder: E,
    dim: usize,
}

impl<E: Embedder> ReidEngine<E> {
    pub fn new(embedder: E) -> Self {
        let dim = embedder.embed_dim();
        Self { embedder, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Refreshes `track`'s cached embedding for `seq` if it is stale.
    /// Returns `true` if a new embedding was computed, `false` if the
    /// cached one was already current.
    pub fn ensure_embedding(&mut self, frame: &Frame, track: &mut LocalTrack, seq: u64) -> Result<bool> {
        if track.embedding_seq == Some(seq) {
            return Ok(false);
        }
        let embedding = self.embedder.embed(frame, track.latest_bbox())?;
        if embedding.dim() != self.dim {
            return Err(ReidError::DimMismatch { expected: self.dim, got: embedding.dim() });
        }
        track.embedding = Some(embedding);
        track.embedding_seq = Some(seq);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrygrid_adapters::FixedEmbedder;
    use sentrygrid_types::{BBox, CameraId, ClassId, TrackId};
    use std::sync::Arc;

    fn frame() -> Frame {
        Frame::new(CameraId::new("cam1").unwrap(), 0, 0, 64, 64, Arc::from(vec![0u8; 4]))
    }

    fn track() -> LocalTrack {
        LocalTrack::new(TrackId(1), ClassId(0), BBox { x: 0, y: 0, w: 10, h: 10 }, 0, 16)
    }

    #[test]
    fn computes_once_per_track_sequence() {
        let mut engine = ReidEngine::new(FixedEmbedder::new(32));
        let mut t = track();
        assert!(engine.ensure_embedding(&frame(), &mut t, 5).unwrap());
        assert!(t.embedding.is_some());
        assert!(!engine.ensure_embedding(&frame(), &mut t, 5).unwrap(), "cached result for the same sequence must be reused");
    }

    #[test]
    fn recomputes_on_new_sequence() {
        let mut engine = ReidEngine::new(FixedEmbedder::new(32));
        let mut t = track();
        engine.ensure_embedding(&frame(), &mut t, 5).unwrap();
        assert!(engine.ensure_embedding(&frame(), &mut t, 6).unwrap());
        assert_eq!(t.embedding_seq, Some(6));
    }
}
