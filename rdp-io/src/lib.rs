//! In-memory interop between pipeline frames and the `image` and `ndarray`
//! ecosystems

pub mod array;
pub mod convert;
pub mod error;

pub use array::{to_array, to_depth_array};
pub use convert::to_dynamic_image;
pub use error::{IoError, Result};
