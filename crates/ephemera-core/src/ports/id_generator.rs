//! IdGenerator port - ID と保存名の生成
//!
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use std::sync::Arc;

use crate::domain::names::{sanitize_extension, sanitize_tool_id};
use crate::domain::{InternalName, SessionId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はセッション ID と artifact の保存名を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから使える）
pub trait IdGenerator: Send + Sync {
    /// Session ID を生成
    fn generate_session_id(&self) -> SessionId;

    /// 保存名を生成
    ///
    /// 形式: `<tool>_<8 hex>_<unix seconds><ext>`。衝突判定は呼び出し側が行う。
    fn generate_internal_name(&self, tool_id: &str, extension: &str) -> InternalName;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時に FixedClock を使えば、タイムスタンプ部分が決定的になります。
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    /// 新しい UlidGenerator を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_session_id(&self) -> SessionId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        SessionId::from(ulid)
    }

    fn generate_internal_name(&self, tool_id: &str, extension: &str) -> InternalName {
        let tool = sanitize_tool_id(tool_id);
        let ext = sanitize_extension(extension);
        let nonce: u32 = rand::random();
        let timestamp = self.clock.now().timestamp().max(0);
        // tool / ext は sanitize 済み、nonce と timestamp は英数字のみ
        InternalName::from_generated(format!("{tool}_{nonce:08x}_{timestamp}{ext}"))
    }
}
