//! # Torii ドメイン層
//!
//! API ディスパッチと応答翻訳の中核ロジックを定義する。
//!
//! ## 設計方針
//!
//! このクレートは I/O を一切行わない純粋なロジックのみを提供する:
//!
//! - **エラー分類**: HTTP ステータスへ写像可能なドメインエラー型
//! - **バージョンテーブル**: 宣言順を保持する明示的なハンドラ登録表
//! - **翻訳ウォーカー**: 任意のネスト構造に対するキー抽出・置換走査
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、Redis）には一切依存しない。
//! 翻訳ストアやアイデンティティストアへのアクセスは上位層が
//! トレイト経由で注入する。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`user`] - ユーザー識別子と権限ロール
//! - [`version`] - API バージョン登録表と解決ロジック
//! - [`translate`] - オブジェクトツリーの翻訳走査

pub mod error;
pub mod translate;
pub mod user;
pub mod version;

pub use error::DomainError;
