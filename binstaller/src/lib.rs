//! Library surface for `binstaller`: building an `InstallSpec` from upstream
//! release metadata, embedding checksums into it, and rendering it to a
//! POSIX shell installer script. The binary in `main.rs` is a thin CLI shell
//! around these functions.

pub mod adapters;
pub mod checksum;
pub mod errors;
pub mod generator;
pub mod net;
pub mod platform;
pub mod templating;

pub use binstaller_schema::Spec;
pub use errors::{BinstallerError, DistResult};
