use super::{names::ClassNames, pre::LetterboxTransform};
use crate::types::Detection;
use common::span_debug;
use ndarray::{ArrayViewD, Axis, Ix2};

/// Rows 0..4 of the raw output are `cx, cy, w, h`; class scores follow.
const BOX_FEATURES: usize = 4;

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    class_id: usize,
    confidence: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            max_detections,
        }
    }

    /// Parse a YOLO-style `[1, 4 + num_classes, num_candidates]` output into detections.
    ///
    /// The transposed `[1, num_candidates, 4 + num_classes]` layout is accepted too.
    /// With known `names` it is recognised by the last axis matching the class
    /// count; without them the longer axis is taken as the candidate axis.
    /// Boxes are mapped back through the letterbox, clamped to the source image,
    /// filtered by class-wise NMS, and returned in model output order.
    /// An output of any other shape yields no detections.
    #[tracing::instrument(skip_all)]
    pub fn parse_detections(
        &self,
        output: &ArrayViewD<f32>,
        transform: &LetterboxTransform,
        names: &ClassNames,
    ) -> Vec<Detection> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] == 0 {
            tracing::debug!(shape = ?shape, "Unexpected output rank, no detections");
            return Vec::new();
        }

        let view = match output.index_axis(Axis(0), 0).into_dimensionality::<Ix2>() {
            Ok(view) => view,
            Err(e) => {
                tracing::debug!(error = %e, "Output is not two-dimensional");
                return Vec::new();
            }
        };

        let view = if is_transposed(shape[1], shape[2], names) {
            view.reversed_axes()
        } else {
            view
        };

        if view.shape()[0] <= BOX_FEATURES {
            tracing::debug!(shape = ?shape, "Output carries no class scores, no detections");
            return Vec::new();
        }

        let num_features = view.shape()[0];
        let num_candidates = view.shape()[1];
        let mut candidates = Vec::new();

        for i in 0..num_candidates {
            // Argmax over class scores
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in BOX_FEATURES..num_features {
                let score = view[[c, i]];
                if score > confidence {
                    confidence = score;
                    class_id = c - BOX_FEATURES;
                }
            }

            if !confidence.is_finite() || confidence < self.confidence_threshold {
                continue;
            }

            let (x1, y1, x2, y2) =
                cxcywh_to_xyxy(view[[0, i]], view[[1, i]], view[[2, i]], view[[3, i]]);

            let x1 = unletterbox(x1, transform.offset_x, transform, transform.orig_width);
            let y1 = unletterbox(y1, transform.offset_y, transform, transform.orig_height);
            let x2 = unletterbox(x2, transform.offset_x, transform, transform.orig_width);
            let y2 = unletterbox(y2, transform.offset_y, transform, transform.orig_height);

            candidates.push(Candidate {
                index: i,
                class_id,
                confidence,
                x1,
                y1,
                x2,
                y2,
            });
        }

        let kept = self.non_max_suppression(candidates);

        kept.into_iter()
            .map(|c| {
                Detection::new(
                    names.label(c.class_id),
                    c.confidence as f64,
                    [c.x1 as u32, c.y1 as u32, c.x2 as u32, c.y2 as u32],
                )
            })
            .collect()
    }

    /// Greedy per-class NMS. Survivors are capped at `max_detections` by score
    /// and then restored to candidate order.
    fn non_max_suppression(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        let _s = span_debug!("non_max_suppression");
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut kept: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if kept.len() >= self.max_detections {
                break;
            }
            let suppressed = kept.iter().any(|k| {
                k.class_id == candidate.class_id && iou(k, &candidate) > self.iou_threshold
            });
            if !suppressed {
                kept.push(candidate);
            }
        }

        kept.sort_by_key(|c| c.index);
        kept
    }
}

/// Whether the per-image view is `[candidates, features]` rather than
/// `[features, candidates]`.
fn is_transposed(rows: usize, cols: usize, names: &ClassNames) -> bool {
    if names.is_empty() {
        // Detection heads emit far more candidates than features
        return rows > cols;
    }
    let expected = BOX_FEATURES + names.len();
    cols == expected && rows != expected
}

#[inline]
fn unletterbox(v: f32, offset: f32, transform: &LetterboxTransform, limit: u32) -> f32 {
    ((v - offset) / transform.scale).clamp(0.0, limit as f32)
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;

    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 { 0.0 } else { intersection / union }
}
