//! Audio Engine Module
//!
//! Everything below the effects chain:
//! - In-memory clip representation
//! - WAV decode/encode
//! - Compressed preview encoding

pub mod buffer;
pub mod io;
pub mod transcode;

pub use buffer::{db_to_linear, linear_to_db, AudioClip, SampleFormat};
pub use io::{decode_wav, encode_wav, generate_stereo_test_tone, generate_test_tone};
pub use transcode::{encode_mp3, to_compressed};
