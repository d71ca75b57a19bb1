//! アクションツール関連モジュール
//!
//! アクションカタログの定義、引数検証、ディスパッチ、
//! Tool Call のストリーミング処理を管理する。

pub mod call;
pub mod executor;
pub mod registry;
pub mod validate;
