use crate::shared::frame::Frame;

/// Properties of an opened stream or file.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Abstracts frame acquisition from a camera stream or video file.
///
/// Implementations yield RGB frames in decode order. A live stream never
/// exhausts on its own; file sources end when the container does.
pub trait FrameSource: Send {
    /// Opens the input. `input` is an RTSP/HTTP URL or a filesystem path.
    fn open(&mut self, input: &str) -> Result<StreamInfo, Box<dyn std::error::Error>>;

    /// Iterator over decoded frames. Items are `Err` for decode failures
    /// on individual frames; callers decide whether to skip or abort.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
