//! Parser Module
//!
//! calamineを使用したExcelファイル解析。
//! ワークブックの各シートを`Grid`として読み込みます。

mod workbook;

pub use workbook::WorkbookParser;
