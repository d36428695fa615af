//! Service layer for raster I/O and output encoding

pub mod format;
pub mod io;

pub use format::OutputEncodingHandler;
pub use io::RasterIO;
