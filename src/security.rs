//! Security Module
//!
//! パッケージ展開時のセキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃などへの対策を提供します。

use crate::error::DocSlimError;

/// セキュリティ設定
///
/// パッケージを作業ディレクトリへ展開する際の制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 4GB
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一エントリの最大サイズ（バイト）
    /// デフォルト: 1GB（動画を埋め込んだ文書を想定）
    pub max_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 4_294_967_296, // 4GB
            max_file_count: 10_000,
            max_file_size: 1_073_741_824, // 1GB
        }
    }
}

impl SecurityConfig {
    /// アーカイブのエントリ数を検証
    pub fn check_entry_count(&self, count: usize) -> Result<(), DocSlimError> {
        if count > self.max_file_count {
            return Err(DocSlimError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_file_count
            )));
        }
        Ok(())
    }

    /// エントリサイズを検証し、展開後サイズの累計を更新
    ///
    /// # 引数
    ///
    /// * `name` - エントリ名（エラーメッセージ用）
    /// * `size` - エントリの展開後サイズ
    /// * `total` - これまでの展開後サイズの累計
    pub fn check_entry_size(
        &self,
        name: &str,
        size: u64,
        total: &mut u64,
    ) -> Result<(), DocSlimError> {
        if size > self.max_file_size {
            return Err(DocSlimError::SecurityViolation(format!(
                "Entry '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.max_file_size
            )));
        }

        *total = total.checked_add(size).ok_or_else(|| {
            DocSlimError::SecurityViolation(
                "Total decompressed size calculation overflow".to_string(),
            )
        })?;

        if *total > self.max_decompressed_size {
            return Err(DocSlimError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total, self.max_decompressed_size
            )));
        }
        Ok(())
    }
}

/// ZIPエントリ名の検証
///
/// 作業ディレクトリの外へ書き出されることを防ぐため、エントリ名を検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Unix形式の`/`、Windows形式のドライブレター）
    let bytes = path.as_bytes();
    if path.starts_with('/') || (bytes.len() >= 2 && bytes[1] == b':') {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    // `..`セグメントを拒否（ディレクトリトラバーサル攻撃）
    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_zip_path_valid() {
        assert!(validate_zip_path("[Content_Types].xml").is_ok());
        assert!(validate_zip_path("word/document.xml").is_ok());
        assert!(validate_zip_path("word/_rels/document.xml.rels").is_ok());
        assert!(validate_zip_path("word/media/").is_ok());
    }

    #[test]
    fn test_validate_zip_path_empty() {
        assert!(validate_zip_path("").is_err());
    }

    #[test]
    fn test_validate_zip_path_absolute() {
        assert!(validate_zip_path("/etc/passwd").is_err());
        assert!(validate_zip_path("C:/Windows/system32").is_err());
        assert!(validate_zip_path("c:word/document.xml").is_err());
    }

    #[test]
    fn test_validate_zip_path_traversal() {
        assert!(validate_zip_path("../etc/passwd").is_err());
        assert!(validate_zip_path("word/../../etc/passwd").is_err());
        assert!(validate_zip_path("word/..").is_err());
        assert!(validate_zip_path("..").is_err());
    }

    #[test]
    fn test_validate_zip_path_dots_in_file_name() {
        assert!(validate_zip_path("word/media/image..png").is_ok());
    }

    #[test]
    fn test_validate_zip_path_backslash() {
        assert!(validate_zip_path("word\\document.xml").is_err());
    }

    #[test]
    fn test_entry_count_limit() {
        let config = SecurityConfig {
            max_file_count: 2,
            ..SecurityConfig::default()
        };
        assert!(config.check_entry_count(2).is_ok());
        assert!(matches!(
            config.check_entry_count(3),
            Err(DocSlimError::SecurityViolation(_))
        ));
    }

    #[test]
    fn test_entry_size_limits() {
        let config = SecurityConfig {
            max_decompressed_size: 100,
            max_file_count: 10,
            max_file_size: 60,
        };
        let mut total = 0;

        assert!(config.check_entry_size("a", 50, &mut total).is_ok());
        assert_eq!(total, 50);
        assert!(config.check_entry_size("b", 61, &mut total).is_err());
        assert!(config.check_entry_size("c", 51, &mut total).is_err());
    }
}
