use ndarray::ArrayView3;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as read-only. Scoring never mutates a frame in
/// place, so no mutable view is exposed.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Nearest-neighbor resize to `target_width`, preserving aspect ratio.
    ///
    /// Returns a clone when the frame is already at or below the target
    /// width; upscaling a stream frame gains nothing for detection.
    pub fn resize_to_width(&self, target_width: u32) -> Frame {
        if self.width <= target_width || target_width == 0 {
            return self.clone();
        }

        let scale = target_width as f64 / self.width as f64;
        let new_h = ((self.height as f64 * scale).round() as u32).max(1);
        let channels = self.channels as usize;
        let src = self.as_ndarray();
        let src_w = self.width as usize;
        let src_h = self.height as usize;

        let mut data = vec![0u8; target_width as usize * new_h as usize * channels];
        for y in 0..new_h as usize {
            let src_y = (((y as f64 + 0.5) / scale) as usize).min(src_h - 1);
            for x in 0..target_width as usize {
                let src_x = (((x as f64 + 0.5) / scale) as usize).min(src_w - 1);
                let offset = (y * target_width as usize + x) * channels;
                for c in 0..channels {
                    data[offset + c] = src[[src_y, src_x, c]];
                }
            }
        }

        Frame::new(data, target_width, new_h, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.area(), 4);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape_and_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_resize_halves_dimensions() {
        let frame = Frame::new(vec![100u8; 8 * 4 * 3], 8, 4, 3, 7);
        let resized = frame.resize_to_width(4);
        assert_eq!(resized.width(), 4);
        assert_eq!(resized.height(), 2);
        assert_eq!(resized.channels(), 3);
        assert_eq!(resized.index(), 7);
        assert!(resized.data().iter().all(|&b| b == 100));
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let frame = Frame::new(vec![0u8; 640 * 360 * 3], 640, 360, 3, 0);
        let resized = frame.resize_to_width(320);
        assert_eq!(resized.width(), 320);
        assert_eq!(resized.height(), 180);
    }

    #[test]
    fn test_resize_no_upscale() {
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 0);
        let resized = frame.resize_to_width(100);
        assert_eq!(resized.width(), 4);
        assert_eq!(resized.height(), 4);
    }
}
