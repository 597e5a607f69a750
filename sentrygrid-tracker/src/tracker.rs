use crate::assignment;
use crate::error::{Result, TrackerError};
use crate::kalman::{identity_observation_noise, BBoxMotionModelBuilder, BBoxObservationModel, Observation, State};
use adskalman::{CovarianceUpdateMethod, StateAndCovariance, TransitionModelLinearNoControl};
use nalgebra::core::dimension::U8;
use sentrygrid_types::{BBox, CameraId, Detection, Embedding, LocalTrack, TrackId, TrackState};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Weight on the IoU term of the cost matrix; `1 - appearance_weight`
    /// is applied to the cosine-distance term when an appearance vector
    /// is supplied alongside a detection.
    pub appearance_weight: f64,
    pub match_threshold_confirmed: f64,
    pub match_threshold_tentative: f64,
    pub n_init: u32,
    pub max_age: u32,
    pub max_lost: u32,
    pub motion_noise_scale: f64,
    pub observation_noise_sigma: f64,
    pub history_cap: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            appearance_weight: 0.7,
            match_threshold_confirmed: 0.7,
            match_threshold_tentative: 0.9,
            n_init: 3,
            max_age: 5,
            max_lost: 30,
            motion_noise_scale: 1.0,
            observation_noise_sigma: 1.0,
            history_cap: 64,
        }
    }
}

struct TrackFilter {
    estimate: StateAndCovariance<f64, U8>,
    last_ts_ns: u64,
}

#[derive(Debug, Default, Clone)]
pub struct TrackUpdateSummary {
    pub matched: Vec<TrackId>,
    pub newly_confirmed: Vec<TrackId>,
    pub newly_lost: Vec<TrackId>,
    pub purged: Vec<TrackId>,
    pub spawned: Vec<TrackId>,
}

/// Per-camera multi-object tracker: one Kalman filter per track, two-stage
/// association cascade (confirmed tracks first, then tentative/lost), and
/// the track lifecycle state machine.
pub struct Tracker {
    camera_id: CameraId,
    config: TrackerConfig,
    next_track_id: u64,
    tracks: Vec<LocalTrack>,
    filters: HashMap<TrackId, TrackFilter>,
    builder: BBoxMotionModelBuilder<f64>,
    obs_model: BBoxObservationModel<f64>,
}

fn bbox_to_observation(b: &BBox) -> Observation<f64> {
    let (cx, cy) = b.center();
    let aspect = b.w as f64 / b.h.max(1) as f64;
    Observation::<f64>::from_row_slice(&[cx, cy, aspect, b.h as f64])
}

fn state_to_bbox(state: &State<f64>) -> BBox {
    let cx = state[0];
    let cy = state[1];
    let aspect = state[2].max(0.01);
    let h = state[3].max(1.0);
    let w = aspect * h;
    let x = (cx - w / 2.0).max(0.0);
    let y = (cy - h / 2.0).max(0.0);
    BBox { x: x.round() as u32, y: y.round() as u32, w: w.round().max(1.0) as u32, h: h.round().max(1.0) as u32 }
}

impl Tracker {
    pub fn new(camera_id: CameraId, config: TrackerConfig) -> Self {
        let obs_noise = identity_observation_noise(config.observation_noise_sigma);
        Self {
            camera_id,
            builder: BBoxMotionModelBuilder::new(config.motion_noise_scale),
            obs_model: BBoxObservationModel::new(obs_noise),
            config,
            next_track_id: 1,
            tracks: Vec::new(),
            filters: HashMap::new(),
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut LocalTrack> {
        self.tracks.iter_mut().find(|t| t.track_id == id)
    }

    /// Advance the tracker by one frame. `detections` are in source-frame
    /// pixel coordinates; any whose bbox clips to zero area against
    /// `(width, height)` is dropped before association. `detection_embeddings`,
    /// if present, must align 1:1 with `detections` and supplies the
    /// appearance term of the cost matrix; omit it to match on motion
    /// alone (this tracker runs association before C4 runs per the usual
    /// per-camera pipeline ordering, so the common case has no detection
    /// embeddings available yet).
    pub fn update(
        &mut self,
        seq: u64,
        capture_ts_ns: u64,
        width: u32,
        height: u32,
        detections: &[Detection],
        detection_embeddings: Option<&[Option<Embedding>]>,
    ) -> Result<TrackUpdateSummary> {
        if let Some(embs) = detection_embeddings {
            if embs.len() != detections.len() {
                return Err(TrackerError::DetectionEmbeddingLenMismatch {
                    expected: detections.len(),
                    got: embs.len(),
                });
            }
        }

        let clipped: Vec<(Detection, Option<Embedding>)> = detections
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                d.bbox.clip(width, height).map(|bbox| {
                    let emb = detection_embeddings.and_then(|e| e[i].clone());
                    (Detection { class_id: d.class_id, score: d.score, bbox }, emb)
                })
            })
            .collect();

        for filter in self.filters.values_mut() {
            let dt = ((capture_ts_ns.saturating_sub(filter.last_ts_ns)) as f64 / 1.0e9).max(0.0);
            if dt > 0.0 {
                let model = self.builder.calc_for_dt(dt);
                filter.estimate = model.predict(&filter.estimate);
            }
            filter.last_ts_ns = capture_ts_ns;
        }

        let mut summary = TrackUpdateSummary::default();
        let mut unmatched_det: Vec<usize> = (0..clipped.len()).collect();

        let confirmed_ids: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|t| t.state == TrackState::Confirmed)
            .map(|t| t.track_id)
            .collect();
        self.associate_stage(
            &confirmed_ids,
            &clipped,
            &mut unmatched_det,
            self.config.match_threshold_confirmed,
            seq,
            &mut summary,
        );

        let loose_ids: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|t| t.state != TrackState::Confirmed)
            .map(|t| t.track_id)
            .collect();
        self.associate_stage(
            &loose_ids,
            &clipped,
            &mut unmatched_det,
            self.config.match_threshold_tentative,
            seq,
            &mut summary,
        );

        for &di in &unmatched_det {
            let (det, emb) = &clipped[di];
            let track_id = TrackId(self.next_track_id);
            self.next_track_id += 1;
            let mut track = LocalTrack::new(track_id, det.class_id, det.bbox, seq, self.config.history_cap);
            if let Some(e) = emb {
                track.embedding = Some(e.clone());
                track.embedding_seq = Some(seq);
            }
            self.tracks.push(track);
            let obs = bbox_to_observation(&det.bbox);
            let state = State::<f64>::from_row_slice(&[obs[0], obs[1], obs[2], obs[3], 0.0, 0.0, 0.0, 0.0]);
            let covar = nalgebra::OMatrix::<f64, U8, U8>::identity() * 10.0;
            self.filters.insert(track_id, TrackFilter { estimate: StateAndCovariance::new(state, covar), last_ts_ns: capture_ts_ns });
            summary.spawned.push(track_id);
        }

        let matched_set: std::collections::HashSet<TrackId> = summary.matched.iter().copied().collect();
        let mut purge_ids = Vec::new();
        for track in self.tracks.iter_mut() {
            if matched_set.contains(&track.track_id) {
                if track.state == TrackState::Tentative && track.consecutive_hits() >= self.config.n_init {
                    track.state = TrackState::Confirmed;
                    summary.newly_confirmed.push(track.track_id);
                } else if track.state == TrackState::Lost {
                    // Re-acquired: it already cleared n_init once to reach
                    // Lost, so it goes straight back to Confirmed.
                    track.state = TrackState::Confirmed;
                    summary.newly_confirmed.push(track.track_id);
                }
                continue;
            }
            track.record_miss();
            if track.state == TrackState::Confirmed && track.consecutive_misses() > self.config.max_age {
                track.state = TrackState::Lost;
                summary.newly_lost.push(track.track_id);
            }
            if track.consecutive_misses() > self.config.max_lost {
                purge_ids.push(track.track_id);
            }
        }

        if !purge_ids.is_empty() {
            let purge_set: std::collections::HashSet<TrackId> = purge_ids.iter().copied().collect();
            self.tracks.retain(|t| !purge_set.contains(&t.track_id));
            for id in &purge_ids {
                self.filters.remove(id);
            }
            summary.purged = purge_ids;
        }

        Ok(summary)
    }

    fn associate_stage(
        &mut self,
        candidate_ids: &[TrackId],
        clipped: &[(Detection, Option<Embedding>)],
        unmatched_det: &mut Vec<usize>,
        threshold: f64,
        seq: u64,
        summary: &mut TrackUpdateSummary,
    ) {
        if candidate_ids.is_empty() || unmatched_det.is_empty() {
            return;
        }
        let det_indices = unmatched_det.clone();
        let mut cost = vec![vec![0.0f64; det_indices.len()]; candidate_ids.len()];
        for (r, &tid) in candidate_ids.iter().enumerate() {
            let predicted_bbox = self.filters.get(&tid).map(|f| state_to_bbox(f.estimate.state()));
            let track = self.tracks.iter().find(|t| t.track_id == tid);
            for (c, &di) in det_indices.iter().enumerate() {
                let (det, emb) = &clipped[di];
                let iou = predicted_bbox.map(|p| p.iou(&det.bbox)).unwrap_or(0.0);
                let motion_cost = 1.0 - iou;
                let appearance_cost = match (track.and_then(|t| t.embedding.as_ref()), emb) {
                    (Some(te), Some(de)) => te.cosine_similarity(de).map(|s| 1.0 - s as f64),
                    _ => None,
                };
                let mut c_val = match appearance_cost {
                    Some(ac) => self.config.appearance_weight * motion_cost + (1.0 - self.config.appearance_weight) * ac,
                    None => motion_cost,
                };
                // Tie-break toward the more recently seen track: a
                // vanishingly small nudge that only matters when the real
                // cost is exactly equal.
                if let Some(t) = track {
                    c_val -= 1e-12 * t.last_seen_seq as f64;
                }
                cost[r][c] = c_val.max(0.0);
            }
        }

        let pairs = assignment::solve(&cost, threshold);
        let mut matched_cols = std::collections::HashSet::new();
        for (row, col) in pairs {
            let tid = candidate_ids[row];
            let di = det_indices[col];
            matched_cols.insert(di);
            let (det, emb) = &clipped[di];
            if let Some(filter) = self.filters.get_mut(&tid) {
                let obs = bbox_to_observation(&det.bbox);
                if let Ok(posterior) = self.obs_model.update(&filter.estimate, &obs, CovarianceUpdateMethod::JosephForm) {
                    filter.estimate = posterior;
                }
            }
            if let Some(track) = self.tracks.iter_mut().find(|t| t.track_id == tid) {
                track.record_hit(det.bbox, seq);
                if let Some(e) = emb {
                    track.embedding = Some(e.clone());
                    track.embedding_seq = Some(seq);
                }
            }
            summary.matched.push(tid);
        }
        unmatched_det.retain(|di| !matched_cols.contains(di));
    }
}
