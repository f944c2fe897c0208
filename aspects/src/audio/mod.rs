//! Audio collaborators: decoding and spectral transform

pub mod decoder;
pub mod stft;

pub use decoder::{decode_audio_file, AudioTensor, DecodedAudio, Waveform};
pub use stft::{SpectralMatrix, Spectrogram, StftParams};
