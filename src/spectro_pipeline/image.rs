//! Image input/output module
//!
//! Decoded 8-bit RGB images, format readers that enforce the pipeline's pixel contract,
//! and a TIFF writer for persisting rotated images.

mod reader;
mod tiff_reader;
mod codec_reader;
mod auto_reader;
mod writer;
mod tiff_writer;
pub mod types;

pub use reader::ImageReader;
pub use tiff_reader::TiffImageReader;
pub use codec_reader::CodecImageReader;
pub use auto_reader::AutoImageReader;
pub use writer::ImageWriter;
pub use tiff_writer::{TiffCompression, TiffImageWriter};
pub use types::{Channel, RgbImage};
