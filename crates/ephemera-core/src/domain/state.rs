//! State - セッションの期限状態
//!
//! # 状態遷移
//! - open: deadline が未来
//! - expired: deadline を過ぎた、または purge 済み（終端）
//!
//! expired から open へ戻る遷移はありません（TTL は延長できない）。

use serde::{Deserialize, Serialize};

/// ExpiryPhase はセッションの期限状態を表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryPhase {
    Open,
    Expired,
}

