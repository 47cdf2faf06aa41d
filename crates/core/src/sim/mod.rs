//! The simulation layer: image loading and the debugger session that ties
//! the execution engine, listing, and breakpoints together.

pub mod debugger;
pub mod loader;

pub use debugger::{Debugger, StopHandle};
pub use loader::{IMAGE_MAGIC, LoadedImage, load_bytes, load_file};
