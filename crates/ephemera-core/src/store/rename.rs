//! RenameService - 表示名の検証パイプライン
//!
//! # パイプライン
//! 1. 前後の空白を除去。空なら ValidationError
//! 2. パス区切り（`/`, `\`）・制御文字・`.` / `..` を拒否
//! 3. 元の拡張子を維持（省略されていれば付け足す）
//! 4. バイト長の上限チェック
//! 5. 同じセッションの他の active artifact との一意性（自動サフィックスはしない）
//!
//! 1〜4 は純粋関数、5 はセッションのスナップショットに対して行います。
//! ArtifactStore はセッションの書き込みロックを取った状態で `validate` を呼ぶので、
//! 5 の判定とその後の名前の差し替えの間に他の rename が割り込むことはありません。

use crate::domain::names::has_extension;
use crate::domain::{DownloadRef, InternalName, NameError, RenameReport, Session, StoreError};

#[derive(Debug, Clone)]
pub struct RenameService {
    max_name_bytes: usize,
}

impl RenameService {
    pub fn new(max_name_bytes: usize) -> Self {
        Self { max_name_bytes }
    }

    /// Steps 1-4: turn the requested name into the final display name.
    ///
    /// `extension` is the artifact's internal-name extension (`.pdf`, or empty).
    pub fn sanitize(&self, requested: &str, extension: &str) -> Result<String, NameError> {
        let trimmed = requested.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(NameError::ForbiddenCharacter(c));
        }
        if trimmed == "." || trimmed == ".." {
            return Err(NameError::Reserved(trimmed.to_string()));
        }

        let display_name = if has_extension(trimmed, extension) {
            trimmed.to_string()
        } else {
            format!("{trimmed}{extension}")
        };

        if display_name.len() > self.max_name_bytes {
            return Err(NameError::TooLong {
                len: display_name.len(),
                max: self.max_name_bytes,
            });
        }
        Ok(display_name)
    }

    /// Full pipeline against one session.
    ///
    /// Does not mutate anything; the caller applies the returned name.
    pub fn validate(
        &self,
        session: &Session,
        internal_name: &InternalName,
        requested: &str,
    ) -> Result<RenameReport, StoreError> {
        if session.get(internal_name).is_none() {
            return Err(StoreError::NotFound {
                session: session.id(),
                internal_name: internal_name.clone(),
            });
        }

        let display_name = self.sanitize(requested, internal_name.extension())?;

        if let Some(holder) = session.display_name_holder(&display_name, Some(internal_name)) {
            return Err(StoreError::NameCollision {
                name: display_name,
                holder: holder.clone(),
            });
        }

        Ok(RenameReport {
            display_name,
            download_ref: DownloadRef::new(session.id(), internal_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_NAME_BYTES;
    use crate::domain::{Artifact, NewArtifact, SessionId};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;
    use ulid::Ulid;

    fn service() -> RenameService {
        RenameService::new(DEFAULT_MAX_NAME_BYTES)
    }

    fn session_with(entries: &[(&str, &str)]) -> Session {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut session = Session::new(SessionId::from_ulid(Ulid::new()), t0, Duration::minutes(30));
        for (internal, display) in entries {
            session.insert(Artifact::new(
                InternalName::parse(*internal).unwrap(),
                NewArtifact::new(*display, "merge", "Merge PDF", t0),
                1,
            ));
        }
        session
    }

    #[rstest]
    #[case::appends_extension("Quarterly Report", ".pdf", "Quarterly Report.pdf")]
    #[case::keeps_extension("final.pdf", ".pdf", "final.pdf")]
    #[case::keeps_extension_any_case("final.PDF", ".pdf", "final.PDF")]
    #[case::other_extension_is_not_ours("final.docx", ".pdf", "final.docx.pdf")]
    #[case::trims("  spaced out  ", ".pdf", "spaced out.pdf")]
    #[case::no_extension("notes", "", "notes")]
    #[case::unicode("請求書", ".pdf", "請求書.pdf")]
    fn sanitize_accepts(#[case] requested: &str, #[case] ext: &str, #[case] expected: &str) {
        assert_eq!(service().sanitize(requested, ext).unwrap(), expected);
    }

    #[rstest]
    #[case::empty("", NameError::Empty)]
    #[case::whitespace("   \t ", NameError::Empty)]
    #[case::slash("a/b", NameError::ForbiddenCharacter('/'))]
    #[case::backslash("a\\b", NameError::ForbiddenCharacter('\\'))]
    #[case::control("a\u{7}b", NameError::ForbiddenCharacter('\u{7}'))]
    #[case::newline_inside("a\nb", NameError::ForbiddenCharacter('\n'))]
    #[case::dot(".", NameError::Reserved(".".to_string()))]
    #[case::dotdot("..", NameError::Reserved("..".to_string()))]
    fn sanitize_rejects(#[case] requested: &str, #[case] expected: NameError) {
        assert_eq!(service().sanitize(requested, ".pdf").unwrap_err(), expected);
    }

    #[test]
    fn length_cap_counts_the_appended_extension() {
        let svc = RenameService::new(10);
        assert_eq!(svc.sanitize("123456", ".pdf").unwrap(), "123456.pdf");
        assert_eq!(
            svc.sanitize("1234567", ".pdf").unwrap_err(),
            NameError::TooLong { len: 11, max: 10 }
        );
    }

    #[test]
    fn length_cap_is_in_bytes() {
        let svc = RenameService::new(8);
        // 3 bytes per char
        assert!(svc.sanitize("あい", "").is_ok());
        assert_eq!(
            svc.sanitize("あいう", "").unwrap_err(),
            NameError::TooLong { len: 9, max: 8 }
        );
    }

    #[test]
    fn validate_detects_collision_with_other_artifact() {
        let session = session_with(&[("a_1.pdf", "a.pdf"), ("b_2.pdf", "b.pdf")]);
        let a = InternalName::parse("a_1.pdf").unwrap();

        let err = service().validate(&session, &a, "b").unwrap_err();
        match err {
            StoreError::NameCollision { name, holder } => {
                assert_eq!(name, "b.pdf");
                assert_eq!(holder.as_str(), "b_2.pdf");
            }
            other => panic!("expected NameCollision, got {other:?}"),
        }
    }

    #[test]
    fn validate_allows_current_name() {
        let session = session_with(&[("a_1.pdf", "a.pdf")]);
        let a = InternalName::parse("a_1.pdf").unwrap();

        let report = service().validate(&session, &a, "a").unwrap();
        assert_eq!(report.display_name, "a.pdf");
        assert_eq!(report.download_ref, DownloadRef::new(session.id(), &a));
    }

    #[test]
    fn validate_unknown_artifact_is_not_found() {
        let session = session_with(&[("a_1.pdf", "a.pdf")]);
        let missing = InternalName::parse("zzz.pdf").unwrap();

        let err = service().validate(&session, &missing, "x").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn validation_runs_before_collision_check() {
        let session = session_with(&[("a_1.pdf", "a.pdf"), ("b_2.pdf", "b.pdf")]);
        let a = InternalName::parse("a_1.pdf").unwrap();

        let err = service().validate(&session, &a, "  ").unwrap_err();
        assert!(matches!(err, StoreError::Validation(NameError::Empty)));
    }
}
