//! # Torii API サーバー
//!
//! バージョン付き API ディスパッチと統一レスポンスエンベロープを提供する
//! 内部 API 層。
//!
//! ## 構成
//!
//! - [`context`] - 1 リクエスト分の入力とアイデンティティ
//! - [`endpoint`] - 実行ループ（なりすまし → バージョン解決 → 実行 → 応答）
//! - [`error`] - エラー分類と HTTP ステータスへの写像
//! - [`params`] - パラメータ値・ページング・日付のヘルパー
//! - [`usecase`] - 翻訳サービス
//! - [`handler`] - axum ルートとの接続
//! - [`config`] - 環境変数からの設定読み込み

pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod params;
pub mod usecase;

pub use error::ApiError;
