//! Decode state: a Vorbis codec setup bound to a packet cursor

pub mod backend;
pub mod packets;
pub mod state;

pub use backend::{CodecSetup, LewtonBackend, LewtonSetup, VorbisBackend};
pub use packets::AudioPacket;
pub use state::{DecodeState, init, init_with};
