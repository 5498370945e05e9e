//! # 応答構築
//!
//! 成功・失敗を問わず、エンドポイントが返すエンベロープを一箇所で
//! 組み立てる。メッセージの解決は次の順で行われる:
//!
//! 1. エラーコード未指定でエラーがあれば、エラー種別名をコードにする
//! 2. メッセージ未指定でエラーコードがあれば、登録簿から表示メッセージと
//!    推奨ステータスを引く。エントリがなければ `Server Error (<code>)`
//! 3. 言語を解決し、メッセージを翻訳・プレースホルダ置換する
//! 4. 最終エンベロープをログに残して返す
//!
//! 登録簿・翻訳ストアの障害はこの段階では応答を失敗させない
//! （未翻訳・汎用メッセージで劣化継続する）。

use std::collections::HashMap;

use serde_json::Value;
use torii_shared::ResponseEnvelope;

use super::Endpoint;
use crate::{context::RequestContext, error::ApiError};

/// [`Endpoint::respond_with`] の引数一式
///
/// フィールドの多くは省略可能なため、`..Default::default()` と
/// 組み合わせて使う。
#[derive(Default)]
pub struct RespondArgs<'a> {
    /// 利用者向けメッセージ（翻訳前）
    pub message: String,
    /// 構造化ペイロード
    pub data: Option<Value>,
    /// HTTP ステータス。`None` なら登録簿の推奨値、それもなければ 200
    pub code: Option<u16>,
    /// エラーコード。空でエラーが渡されていれば種別名から導出される
    pub error_code: String,
    /// エラーコード導出の元になるエラー
    pub error: Option<&'a ApiError>,
    /// 開発者向けメッセージ。空ならメッセージが複製される（翻訳されない）
    pub developer_message: String,
    /// メッセージに適用するプレースホルダ置換
    pub substitutions: Option<HashMap<String, String>>,
}

impl Endpoint {
    /// エンベロープを組み立てる
    ///
    /// `ctx` が `None` の場合は言語解決にフォールバック言語が使われる。
    pub async fn respond_with(
        &self,
        ctx: Option<&RequestContext>,
        args: RespondArgs<'_>,
    ) -> ResponseEnvelope {
        let RespondArgs {
            mut message,
            data,
            mut code,
            mut error_code,
            error,
            mut developer_message,
            substitutions,
        } = args;

        if error_code.is_empty()
            && let Some(err) = error
        {
            error_code = err.kind_name().to_string();
        }

        if developer_message.is_empty() {
            developer_message = message.clone();
        }

        if message.is_empty() && !error_code.is_empty() {
            match self.deps.error_codes.lookup(&error_code).await {
                Ok(Some(entry)) => {
                    message = entry.message;
                    if code.is_none() {
                        code = Some(entry.http_status);
                    }
                }
                Ok(None) => {
                    message = format!("Server Error ({error_code})");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        code = %error_code,
                        "エラーコード登録簿の検索に失敗しました。汎用メッセージで継続します"
                    );
                    message = format!("Server Error ({error_code})");
                }
            }
        }

        let code = code.unwrap_or(200);
        let language = self
            .deps
            .translator
            .resolve_language(None, ctx.and_then(RequestContext::language));
        let message = self
            .deps
            .translator
            .render_message(&message, &error_code, &language, substitutions.as_ref())
            .await;

        tracing::info!(
            code,
            error_code = %error_code,
            message = %message,
            developer_message = %developer_message,
            "応答エンベロープを作成しました"
        );

        ResponseEnvelope {
            message,
            data,
            error_code,
            code,
            developer_message,
        }
    }
}
