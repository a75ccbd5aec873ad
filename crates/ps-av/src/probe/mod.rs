//! Stream probing and corruption checks backed by ffprobe/ffmpeg.
//!
//! [`StreamProber`] reduces ffprobe JSON to a [`StreamInfo`]; the
//! [`corrupt`] module layers the structural and bounded-decode health
//! checks on top of that result.

pub mod corrupt;
pub mod ffprobe;
pub mod types;

pub use self::corrupt::verify_media;
pub use self::ffprobe::StreamProber;
pub use self::types::StreamInfo;
