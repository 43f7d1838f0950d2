pub mod catalog;
pub mod categorize;
pub mod error;
pub mod format;
pub mod level;
pub mod market;
pub mod profile;
pub mod progress;
pub mod table;
pub mod vocab;

pub use catalog::{ItemCatalog, ItemCatalogEntry};
pub use categorize::{Bucket, CategorizedGroup, categorize};
pub use error::StatsError;
pub use level::{MAX_LEVEL, MIN_LEVEL, experience_for_level, level_from_experience};
pub use market::*;
pub use profile::*;
pub use progress::{Progress, progress};
pub use table::{SortDirection, SortValue, TableEngine, TablePage, TableQueryState};
pub use vocab::*;
