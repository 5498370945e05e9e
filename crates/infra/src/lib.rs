//! # Torii インフラ層
//!
//! エンドポイント実行コアが必要とする外部コラボレータの契約と、
//! その具体的な実装（PostgreSQL / Redis）を提供する。
//!
//! ## 設計方針
//!
//! - **トレイトによる境界**: コアはトレイト（[`TranslationStore`]、
//!   [`ErrorCodeRegistry`]、[`identity::IdentityStore`]、
//!   [`db::TransactionControl`]）のみに依存し、実装は注入される
//! - **読み取り専用**: 翻訳ストアとエラーコード登録簿に対してコアは
//!   一切書き込まない。並行読み取りは各ストアが保証する
//! - **SpanTrace 自動捕捉**: エラー生成時の呼び出し経路を自動記録する
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`db`] - PostgreSQL 接続プールとリクエストスコープのトランザクション
//! - [`translation_store`] - 対訳の一括・単発検索
//! - [`error_code_registry`] - エラーコード → 表示メッセージ/ステータス
//! - [`identity`] - アイデンティティ/セッションストアとなりすまし支援

pub mod db;
pub mod error;
pub mod error_code_registry;
pub mod identity;
pub mod translation_store;

pub use error::{InfraError, InfraErrorKind};
pub use error_code_registry::{ErrorCodeEntry, ErrorCodeRegistry};
pub use translation_store::TranslationStore;
