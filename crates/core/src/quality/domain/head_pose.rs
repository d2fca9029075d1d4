use ndarray::ArrayView2;

/// Yaw scaling: full face-width eye offset maps to ~60 degrees.
const YAW_SCALE: f64 = 60.0;
/// Pitch scaling: full face-height eye offset maps to ~50 degrees.
const PITCH_SCALE: f64 = 50.0;
/// Expected eye-line height for a frontal face, fraction of bbox height.
const FRONTAL_EYE_LINE: f64 = 0.32;
/// Eye-line slope contributes a roll-derived pitch penalty.
const ROLL_PENALTY_SCALE: f64 = 20.0;
const ROLL_PENALTY_WEIGHT: f64 = 0.3;
/// Eye candidates must sit in the upper half of the face crop.
const UPPER_FACE_FRACTION: f64 = 0.5;
/// Maximum yaw attributed to full left/right asymmetry in the fallback.
const SYMMETRY_YAW_SCALE: f64 = 45.0;

/// Estimated head orientation in degrees, signed. Practically within ±90.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
}

impl HeadPose {
    pub const NEUTRAL: HeadPose = HeadPose {
        yaw: 0.0,
        pitch: 0.0,
    };
}

/// An eye-like box inside a face crop, in crop coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeCandidate {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl EyeCandidate {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Secondary feature detection used by the primary pose path.
///
/// Implementations may be stateful, hence `&mut self`.
pub trait EyeDetector: Send {
    /// Eye-like boxes within a grayscale face crop.
    fn detect(&mut self, face: &ArrayView2<f32>) -> Vec<EyeCandidate>;
}

/// Estimates yaw/pitch of a face crop. Never fails: when eye detection
/// yields fewer than two usable candidates it falls back to a left/right
/// symmetry measure (which cannot estimate pitch and reports 0 for it).
pub struct HeadPoseEstimator {
    eyes: Option<Box<dyn EyeDetector>>,
}

impl HeadPoseEstimator {
    pub fn new(eyes: Option<Box<dyn EyeDetector>>) -> Self {
        Self { eyes }
    }

    pub fn estimate(&mut self, face: &ArrayView2<f32>) -> HeadPose {
        let (h, w) = face.dim();
        if h == 0 || w == 0 {
            return HeadPose::NEUTRAL;
        }
        let face_h = h as f64;

        if let Some(detector) = self.eyes.as_mut() {
            let mut upper: Vec<EyeCandidate> = detector
                .detect(face)
                .into_iter()
                .filter(|e| e.y < face_h * UPPER_FACE_FRACTION)
                .collect();

            if upper.len() >= 2 {
                upper.sort_by(|a, b| a.x.total_cmp(&b.x));
                let (left, right) = widest_pair(&upper);
                return from_eye_geometry(left, right, w as f64, face_h);
            }
        }

        from_symmetry(face)
    }
}

/// The pair with maximum horizontal separation, assumed true left/right eyes.
/// Candidates must be sorted by x; ties keep the earliest pair.
fn widest_pair(candidates: &[EyeCandidate]) -> (EyeCandidate, EyeCandidate) {
    let mut best = (candidates[0], candidates[1]);
    let mut max_sep = (candidates[1].x - candidates[0].x).abs();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let sep = (candidates[j].x - candidates[i].x).abs();
            if sep > max_sep {
                max_sep = sep;
                best = (candidates[i], candidates[j]);
            }
        }
    }
    best
}

fn from_eye_geometry(left: EyeCandidate, right: EyeCandidate, face_w: f64, face_h: f64) -> HeadPose {
    let (lx, ly) = left.center();
    let (rx, ry) = right.center();

    // Frontal faces have eyes symmetric around the face center line.
    let eye_center_x = (lx + rx) / 2.0;
    let yaw = ((eye_center_x - face_w / 2.0) / face_w) * YAW_SCALE;

    // Frontal eye line sits at ~32% of bbox height.
    let eye_center_y = (ly + ry) / 2.0;
    let pitch = ((eye_center_y - face_h * FRONTAL_EYE_LINE) / face_h) * PITCH_SCALE;

    // A tilted eye line indicates roll, which still hurts frontality.
    let eye_slope = (ry - ly) / (rx - lx).max(1.0);
    let roll_penalty = eye_slope.abs() * ROLL_PENALTY_SCALE;

    HeadPose {
        yaw,
        pitch: pitch + roll_penalty * ROLL_PENALTY_WEIGHT,
    }
}

/// Fallback: mirror the right half of the crop and measure mean absolute
/// difference against the left half. A frontal face is roughly symmetric,
/// so asymmetry maps to yaw. Pitch is unknowable here and reported as 0.
fn from_symmetry(face: &ArrayView2<f32>) -> HeadPose {
    let (h, w) = face.dim();
    let half = w / 2;
    if half == 0 {
        return HeadPose::NEUTRAL;
    }

    // Mirrored right-half column x maps to column w-1-x.
    let common = half.min(w - half);
    let mut diff_sum = 0.0f64;
    for y in 0..h {
        for x in 0..common {
            let left = face[[y, x]] as f64;
            let mirrored_right = face[[y, w - 1 - x]] as f64;
            diff_sum += (left - mirrored_right).abs();
        }
    }
    let asymmetry = diff_sum / (h * common) as f64 / 255.0;

    HeadPose {
        yaw: asymmetry.clamp(0.0, 1.0) * SYMMETRY_YAW_SCALE,
        pitch: 0.0,
    }
}
