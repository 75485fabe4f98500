//! Pixel pipeline for depth-camera frames: raw-buffer sizing, unpacking of
//! vendor encodings, depth-driven alignment and rectification

pub mod align;
pub mod camera;
pub mod error;
pub mod format;
pub mod frame;
pub mod rectify;
pub mod unpack;

pub use align::{Aligner, align_depth_to_other, align_images, align_other_to_depth};
pub use camera::{DistortionModel, Extrinsics, Geometry, Intrinsics, PinholeGeometry};
pub use error::{PreconditionError, RdpError, Result};
pub use format::{FourCc, NativeEncoding, StandardFormat, image_size};
pub use frame::{ImageView, ImageViewMut};
pub use rectify::{RectificationTable, UNMAPPED, rectify_image};
pub use unpack::{StreamRequest, SubdeviceMode, Unpacker};
