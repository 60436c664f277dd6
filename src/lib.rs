//! A read-only parser for Windows Prefetch (SCCA) files.
//!
//! Supports the three non-compressed wire formats: version 17 (Windows XP/2003),
//! version 23 (Vista/7) and version 26 (8/8.1/10). The compressed format introduced
//! for later Windows 10 builds is out of scope.
//!
//! ```no_run
//! use scca::prefetch::{Access, PrefetchFile};
//!
//! let bytes = std::fs::read("CALC.EXE-DEADBEEF.pf").unwrap();
//! let mut pf = PrefetchFile::new();
//! pf.open(&bytes[..], Access::Read).unwrap();
//! println!("{:?}", pf.executable_name());
//! ```

pub mod byte_source;
pub mod error;
pub mod options;
pub mod prefetch;

pub use byte_source::ByteSource;
pub use error::{Error, Result};
pub use prefetch::PrefetchFile;
