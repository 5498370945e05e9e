//! # ユースケース層
//!
//! エンドポイント実行コアとハンドラから利用されるアプリケーション
//! サービスを定義する。

pub mod translation;

pub use translation::{TranslateOptions, TranslationService};
