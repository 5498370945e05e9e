//! # アイデンティティ/セッションストア
//!
//! リクエストを実行しているアイデンティティの照会・切り替えを担当する。
//!
//! ## なりすまし（Impersonation）の正しさ要件
//!
//! [`IdentityStore::set_current_user`] はセッション上のユーザー ID を
//! 書き換えるだけでは不十分で、新しいアイデンティティの権限状態
//! （ロール集合）を再読込して初めて完了する。部分的なセッション
//! 書き換えはキャッシュされた旧権限を残すため、正しさ要件として
//! 全体を入れ替える。その際、無関係なセッションデータは保持する。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | 内容 |
//! |-----|-----|------|
//! | `session:{session_id}` | [`SessionState`] (JSON) | アクティブなユーザーとロール集合 |

use std::collections::HashSet;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use torii_domain::user::UserId;

use crate::error::InfraError;

/// アイデンティティストアトレイト
///
/// エンドポイント実行コアが要求するアイデンティティ境界の契約。
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 現在のアクティブユーザーを取得する
    async fn current_user(&self) -> Result<UserId, InfraError>;

    /// アクティブユーザーを切り替える
    ///
    /// 新しいユーザーの権限状態を再読込し、セッション全体を
    /// 入れ替える。無関係なセッションデータは保持される。
    async fn set_current_user(&self, user: &UserId) -> Result<(), InfraError>;

    /// ユーザーが存在するか判定する
    async fn user_exists(&self, user: &UserId) -> Result<bool, InfraError>;

    /// 現在のアクティブユーザーのロール集合を取得する
    async fn current_user_roles(&self) -> Result<HashSet<String>, InfraError>;
}

/// 一時的なアイデンティティ昇格のスコープ付きヘルパー
///
/// `user` に切り替えて `f` を実行し、成功・失敗にかかわらず
/// 元のアイデンティティを復元する。暗黙のコンテキスト出入りではなく、
/// 「このアイデンティティで X を実行する」を明示的に表現する。
pub async fn with_identity<T, E, F, Fut>(
    store: &dyn IdentityStore,
    user: &UserId,
    f: F,
) -> Result<T, E>
where
    E: From<InfraError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let previous = store.current_user().await?;
    store.set_current_user(user).await?;

    let result = f().await;

    // 失敗経路でも必ず元のアイデンティティへ戻す
    let restored = store.set_current_user(&previous).await;

    match (result, restored) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e.into()),
        (Ok(value), Ok(())) => Ok(value),
    }
}

/// Redis セッションに保存される状態
///
/// `user` と `roles` 以外のフィールドは `extra` に集約され、
/// ユーザー切り替え時もそのまま書き戻される。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    user: String,
    roles: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Redis セッション + PostgreSQL ユーザー表のアイデンティティストア
///
/// アクティブユーザーとロール集合は Redis セッションに保持し、
/// ユーザーの存在確認とロール再読込は PostgreSQL に問い合わせる。
/// 1 リクエストにつき 1 インスタンス（セッション ID 固定）。
pub struct SessionIdentityStore {
    conn: ConnectionManager,
    pool: PgPool,
    session_id: String,
}

impl SessionIdentityStore {
    /// セッション ID を固定したストアを作成する
    pub fn new(conn: ConnectionManager, pool: PgPool, session_id: impl Into<String>) -> Self {
        Self {
            conn,
            pool,
            session_id: session_id.into(),
        }
    }

    fn session_key(&self) -> String {
        format!("session:{}", self.session_id)
    }

    async fn load_state(&self) -> Result<SessionState, InfraError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.session_key()).await?;

        let Some(raw) = raw else {
            return Err(InfraError::unexpected(format!(
                "セッションが存在しません: {}",
                self.session_id
            )));
        };

        Ok(serde_json::from_str(&raw)?)
    }

    async fn store_state(&self, state: &SessionState) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(state)?;
        let _: () = conn.set(self.session_key(), json).await?;
        Ok(())
    }

    /// PostgreSQL からユーザーのロール集合を読み込む
    async fn load_roles(&self, user: &UserId) -> Result<Vec<String>, InfraError> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}

#[async_trait]
impl IdentityStore for SessionIdentityStore {
    async fn current_user(&self) -> Result<UserId, InfraError> {
        let state = self.load_state().await?;
        Ok(UserId::new(state.user))
    }

    async fn set_current_user(&self, user: &UserId) -> Result<(), InfraError> {
        let mut state = self.load_state().await?;

        // 権限状態の再読込とセッション全体の入れ替え。
        // user のみの書き換えでは旧ユーザーのロールが残留する
        let roles = self.load_roles(user).await?;
        state.user = user.as_str().to_string();
        state.roles = roles;

        self.store_state(&state).await?;
        tracing::info!(user = %user, "アクティブユーザーを切り替えました");
        Ok(())
    }

    async fn user_exists(&self, user: &UserId) -> Result<bool, InfraError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn current_user_roles(&self) -> Result<HashSet<String>, InfraError> {
        let state = self.load_state().await?;
        Ok(state.roles.into_iter().collect())
    }
}
