pub mod pcm_format;
pub mod sample_buffer;
pub mod sample_codec;
