//! Pure domain types with minimal dependencies
//!
//! Nothing here touches document formats or pixels; the writers in `docx`,
//! `xlsx` and `render` consume these types read-only.

pub mod annotation;
pub mod catalog;
pub mod field_map;
pub mod fields;
pub mod photo;
pub mod planned_works;
pub mod version;

pub use annotation::*;
pub use catalog::*;
pub use field_map::*;
pub use fields::*;
pub use photo::*;
pub use planned_works::*;
pub use version::*;
