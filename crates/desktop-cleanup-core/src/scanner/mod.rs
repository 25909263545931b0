pub mod list;

pub use list::{scan_roots, EntryFilter};
