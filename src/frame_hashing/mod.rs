pub mod fingerprint;
pub mod frame_hasher;
pub mod threshold;
