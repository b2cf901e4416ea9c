//! Address label table built from token and account label feeds.

pub mod table;

pub use table::{AccountLabel, LabelInfo, LabelKind, LabelTable, TokenLabel};
