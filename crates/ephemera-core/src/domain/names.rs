//! Names - artifact の内部名・表示名・ダウンロード参照
//!
//! - **InternalName**: 生成時に決まる不変の識別子。ファイルシステム安全な文字のみ。
//! - **display_name**: ユーザーが見る名前（String のまま扱う）。
//! - **DownloadRef**: InternalName からのみ導出されるダウンロード参照。
//!
//! Blob のパスも InternalName だけから決まるので、rename しても
//! 保存先やダウンロード URL は変わりません。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::SessionId;

/// InternalName の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalNameError {
    #[error("internal name is empty")]
    Empty,

    #[error("internal name '{0}' contains characters outside [A-Za-z0-9._-]")]
    Unsafe(String),

    #[error("internal name '{0}' must not start with '.'")]
    Hidden(String),
}

/// InternalName は artifact の不変識別子（保存名）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InternalName(String);

impl InternalName {
    /// 文字列を検証して InternalName を作成
    pub fn parse(raw: impl Into<String>) -> Result<Self, InternalNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InternalNameError::Empty);
        }
        if raw.starts_with('.') {
            return Err(InternalNameError::Hidden(raw));
        }
        if !raw.chars().all(is_safe_char) {
            return Err(InternalNameError::Unsafe(raw));
        }
        Ok(Self(raw))
    }

    /// 生成器が組み立てた名前（構成要素が sanitize 済み）
    pub(crate) fn from_generated(raw: String) -> Self {
        debug_assert!(Self::parse(raw.clone()).is_ok(), "unsafe generated name {raw}");
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 拡張子（先頭の `.` を含む）。拡張子が無ければ空文字列。
    pub fn extension(&self) -> &str {
        extension_of(&self.0)
    }
}

impl fmt::Display for InternalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InternalName {
    type Error = InternalNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<InternalName> for String {
    fn from(name: InternalName) -> Self {
        name.0
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// `name` の拡張子を `.pdf` の形で返す（無ければ空文字列）
///
/// 先頭のドットだけの名前（`.bashrc`）や末尾のドット（`report.`）は拡張子なし扱い。
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) if idx + 1 == name.len() => "",
        Some(idx) => &name[idx..],
    }
}

/// `name` が `ext` で終わるか（ASCII 大文字小文字を無視）
pub fn has_extension(name: &str, ext: &str) -> bool {
    if ext.is_empty() {
        return true;
    }
    name.len() > ext.len()
        && name
            .get(name.len() - ext.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ext))
}

/// ツール ID をファイル名の先頭に使える形へ正規化
///
/// 英数字以外は `-` に置き換え、小文字化します。空になったら "artifact"。
pub fn sanitize_tool_id(tool_id: &str) -> String {
    let cleaned: String = tool_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 拡張子を保存名向けに正規化（小文字・安全な文字のみ）
pub fn sanitize_extension(ext: &str) -> String {
    let body: String = ext
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if body.is_empty() {
        String::new()
    } else {
        format!(".{body}")
    }
}

/// DownloadRef はダウンロード用の決定的な参照
///
/// session と internal_name だけから導出されるため、rename の前後で変わらない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadRef(String);

impl DownloadRef {
    pub fn new(session: SessionId, internal_name: &InternalName) -> Self {
        Self(format!("/download/{session}/{internal_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
