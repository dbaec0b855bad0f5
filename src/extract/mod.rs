//! Extract Module
//!
//! 分類済みのグリッドから見積書・財務諸表のレコードを抽出する。

mod estimate;
mod financial;

pub use estimate::{extract_estimate, item_total};
pub use financial::{extract_financial_statement, is_section_header};
