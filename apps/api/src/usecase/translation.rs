//! # 翻訳サービス
//!
//! レスポンスペイロード・メッセージの翻訳を担当するアプリケーション
//! サービス。走査と置換のアルゴリズムはドメイン層
//! （`torii_domain::translate`）が持ち、このサービスはストアへの
//! 問い合わせと言語解決を束ねる。
//!
//! ## 既定フィルタ
//!
//! 除外・包含のどちらも指定されない場合に限り、識別子キー
//! `id` / `name` を除外する既定フィルタが適用される。明示的に
//! 空の除外集合を渡した呼び出しには既定は適用されない。
//!
//! ## 言語解決
//!
//! 明示指定 → リクエストの交渉済み言語 → `en` の順で解決する。
//! 一部クライアントが Accept-Language ヘッダ全体
//! （`en-US,en;q=0.5`）を言語値として送ってくるため、
//! この形だけは `en` に正規化する。

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use serde_json::Value;
use torii_domain::translate::{
    KeyExtractionVisitor, SubstitutionVisitor, TranslationFilter, is_numeric_string, template,
    walk,
};
use torii_infra::{InfraError, TranslationStore};

/// 既定で翻訳から除外される識別子キー
const DEFAULT_EXCLUSIONS: [&str; 2] = ["id", "name"];

/// 言語値として送られてくる Accept-Language ヘッダの既知の形
const ACCEPT_LANGUAGE_HEADER_FORM: &str = "en-US,en;q=0.5";

/// フォールバック言語
const FALLBACK_LANGUAGE: &str = "en";

/// 翻訳呼び出しのオプション
#[derive(Debug, Default)]
pub struct TranslateOptions {
    /// 翻訳後に適用するプレースホルダ置換（文字列入力のみ対象）
    pub substitutions: Option<HashMap<String, String>>,
    /// 除外キー集合（`None` と空は区別される）
    pub exclusions: Option<Vec<String>>,
    /// 包含キー集合（非空なら除外集合を完全に無視する)
    pub inclusions: Option<Vec<String>>,
}

/// 翻訳サービス
#[derive(Clone)]
pub struct TranslationService {
    store: Arc<dyn TranslationStore>,
}

impl TranslationService {
    /// 翻訳ストアを束ねたサービスを作成する
    pub fn new(store: Arc<dyn TranslationStore>) -> Self {
        Self { store }
    }

    /// 応答に使用する言語を解決する
    ///
    /// 明示指定 → 交渉済み言語 → `en`。Accept-Language ヘッダ全体が
    /// そのまま渡された場合は `en` に正規化する。
    pub fn resolve_language(&self, explicit: Option<&str>, negotiated: Option<&str>) -> String {
        let language = explicit.or(negotiated).unwrap_or(FALLBACK_LANGUAGE);

        if language == ACCEPT_LANGUAGE_HEADER_FORM {
            FALLBACK_LANGUAGE.to_string()
        } else {
            language.to_string()
        }
    }

    /// 値を指定言語へその場で翻訳する
    ///
    /// - オブジェクト / 配列: キー抽出 → 一括検索 → 置換の 2 パス走査
    /// - 文字列: 単独の対訳検索とプレースホルダ置換
    /// - その他のスカラー: 変更しない
    ///
    /// ストア自体の障害はエラーとして伝播する。個々の対訳が
    /// 見つからないことはエラーではなく、原文が残る。
    pub async fn translate(
        &self,
        source: &mut Value,
        language: &str,
        options: &TranslateOptions,
    ) -> Result<(), InfraError> {
        match source {
            Value::Object(_) | Value::Array(_) => {
                let filter = Self::filter_from(options);
                self.translate_tree(source, language, filter).await
            }
            Value::String(s) => {
                let translated = self
                    .translate_text(s, language, options.substitutions.as_ref())
                    .await?;
                *source = Value::String(translated);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// 単一の文字列を翻訳し、プレースホルダ置換を適用する
    ///
    /// 数字のみの文字列は翻訳対象外（置換のみ適用される）。
    pub async fn translate_text(
        &self,
        source: &str,
        language: &str,
        substitutions: Option<&HashMap<String, String>>,
    ) -> Result<String, InfraError> {
        let mut result = if is_numeric_string(source) {
            source.to_string()
        } else {
            self.store
                .lookup(source, language)
                .await?
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| source.to_string())
        };

        if let Some(subs) = substitutions {
            result = template::substitute(&result, subs);
        }

        Ok(result)
    }

    /// エンベロープ向けメッセージを描画する
    ///
    /// エラーコードが非空であればエラーコードを翻訳キーとして使い、
    /// 対訳が見つかればプレースホルダ置換を適用して返す。見つからない
    /// 場合は元のメッセージをそのまま返す（置換は適用されない）。
    ///
    /// ストア障害は応答自体を失敗させず、ログを残して未翻訳の
    /// メッセージで継続する。
    pub async fn render_message(
        &self,
        message: &str,
        error_code: &str,
        language: &str,
        substitutions: Option<&HashMap<String, String>>,
    ) -> String {
        if error_code.is_empty() {
            return match self.translate_text(message, language, substitutions).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::error!(error = %e, "メッセージ翻訳に失敗しました。原文で継続します");
                    message.to_string()
                }
            };
        }

        match self.store.lookup(error_code, language).await {
            Ok(Some(translated)) if !translated.is_empty() => match substitutions {
                Some(subs) => template::substitute(&translated, subs),
                None => translated,
            },
            Ok(_) => message.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "エラーコード翻訳に失敗しました。原文で継続します");
                message.to_string()
            }
        }
    }

    /// 日付を言語に応じた長形式で描画する
    ///
    /// 例: `en` → `Saturday, January 31, 2026`
    pub fn localized_date(&self, date: NaiveDate, language: &str) -> String {
        let locale = match language {
            "ar" => chrono::Locale::ar_SA,
            _ => chrono::Locale::en_US,
        };

        date.format_localized("%A, %B %-d, %Y", locale).to_string()
    }

    async fn translate_tree(
        &self,
        source: &mut Value,
        language: &str,
        filter: TranslationFilter,
    ) -> Result<(), InfraError> {
        let mut extractor = KeyExtractionVisitor::new(filter.clone());
        walk(source, &mut extractor);
        let keys = extractor.into_keys();

        if keys.is_empty() {
            tracing::debug!("翻訳対象の文字列がありません");
            return Ok(());
        }

        let translations = self.store.lookup_many(&keys, language).await?;
        let mut substitutor = SubstitutionVisitor::new(translations, filter);
        walk(source, &mut substitutor);

        Ok(())
    }

    /// オプションからキーフィルタを組み立てる
    ///
    /// 除外・包含のどちらも事実上未指定の場合のみ既定の除外集合を使う。
    fn filter_from(options: &TranslateOptions) -> TranslationFilter {
        let inclusions_unset = options.inclusions.as_ref().is_none_or(|i| i.is_empty());

        if options.exclusions.is_none() && inclusions_unset {
            return TranslationFilter::with_exclusions(
                DEFAULT_EXCLUSIONS.iter().map(ToString::to_string),
            );
        }

        TranslationFilter::new(
            options.exclusions.clone().unwrap_or_default(),
            options.inclusions.clone().unwrap_or_default(),
        )
    }
}
