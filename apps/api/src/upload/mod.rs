//! Size, filename and type policy checks that run
//! before any decoding work is attempted.

pub mod policy;
pub mod validation;

pub use policy::UploadPolicy;
pub use validation::{validate, RawUpload, UploadRejection};
