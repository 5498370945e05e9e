//! # HTTP ハンドラ
//!
//! axum のルートとエンドポイント実行コアをつなぐ薄い層。
//! リクエストごとのコラボレータ組み立てはここで行う。

pub mod health;
pub mod status;

pub use health::health_check;
pub use status::{ApiState, run_status};
