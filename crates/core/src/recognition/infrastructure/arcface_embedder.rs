/// ArcFace embedding extraction using ONNX Runtime.
///
/// Turns a face crop into an L2-normalized 512-dimension vector whose
/// cosine similarity is meaningful across frames, sessions, and days.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::embedding::Embedding;
use crate::recognition::infrastructure::execution_provider::preferred_execution_providers;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Embeds the face inside `region`. Returns `None` when the region has
    /// no usable overlap with the frame.
    pub fn embed_region(
        &self,
        frame: &Frame,
        region: FaceRegion,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>> {
        let Some((crop, width, height)) = crop_rgb(frame, region) else {
            return Ok(None);
        };
        self.embed(&crop, width, height).map(Some)
    }

    fn embed(
        &self,
        rgb_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(rgb_data, width, height);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        Ok(Embedding::new(embedding_slice.to_vec()).l2_normalized())
    }
}

/// Extracts the clipped region as contiguous RGB bytes.
fn crop_rgb(frame: &Frame, region: FaceRegion) -> Option<(Vec<u8>, u32, u32)> {
    if frame.channels() != 3 {
        return None;
    }
    let clipped = region.clipped(frame.width(), frame.height())?;
    let src = frame.as_ndarray();
    let w = clipped.width() as usize;
    let h = clipped.height() as usize;

    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        let src_y = clipped.y1 as usize + y;
        for x in 0..w {
            let src_x = clipped.x1 as usize + x;
            for c in 0..3 {
                data.push(src[[src_y, src_x, c]]);
            }
        }
    }
    Some((data, w as u32, h as u32))
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}
