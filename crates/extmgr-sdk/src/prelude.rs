//! Prelude for convenient imports.

pub use std::os::raw::c_int;

pub use crate::args::InitArgs;
pub use crate::{extension_entry, extension_exit};
