//! # Torii 共有ユーティリティ
//!
//! このクレートは、Torii プロジェクト全体で使用される共通の
//! ワイヤ型を提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, api）から依存される
//! - ビジネスロジックを含まない純粋なデータ型のみを配置
//! - 外部クレートへの依存は serde 系に限定する

pub mod envelope;
pub mod health;

pub use envelope::ResponseEnvelope;
pub use health::HealthResponse;
