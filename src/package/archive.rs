//! Archive Module
//!
//! パッケージ（ZIPアーカイブ）を作業ディレクトリへ展開し、
//! 書き換え後のディレクトリツリーを元のエントリ順で再圧縮する。

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tempfile::TempDir;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocSlimError;
use crate::security::{validate_zip_path, SecurityConfig};

/// 作業ディレクトリへ展開したパッケージ
///
/// `dir`がドロップされると作業ディレクトリは削除される。
#[derive(Debug)]
pub(crate) struct ExtractedPackage {
    /// 作業ディレクトリ
    pub dir: TempDir,
    /// 元のアーカイブ内のエントリ名（出現順）
    pub entries: Vec<String>,
}

impl ExtractedPackage {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// 作業ディレクトリを作成する親ディレクトリ
///
/// 対象ファイルと同じファイルシステム上に作成する。
fn scratch_parent(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// パッケージを作業ディレクトリへ展開する
///
/// # 戻り値
///
/// * `Ok(ExtractedPackage)` - 展開に成功した場合
/// * `Err(DocSlimError::Archive)` - ZIPとして読み込めない場合
/// * `Err(DocSlimError::SecurityViolation)` - エントリ名・サイズが制限に違反する場合
pub(crate) fn extract_to_scratch(
    path: &Path,
    security: &SecurityConfig,
) -> Result<ExtractedPackage, DocSlimError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    security.check_entry_count(archive.len())?;

    let dir = tempfile::Builder::new()
        .prefix(".docslim-")
        .tempdir_in(scratch_parent(path))?;
    debug!(scratch = %dir.path().display(), entries = archive.len(), "extracting package");

    let mut entries = Vec::with_capacity(archive.len());
    let mut total_size = 0u64;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        validate_zip_path(&name)
            .map_err(|e| DocSlimError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;
        security.check_entry_size(&name, entry.size(), &mut total_size)?;

        let out_path = dir.path().join(&name);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let declared = entry.size();
            let mut out = BufWriter::new(File::create(&out_path)?);
            let written = copy_limited(&name, &mut entry, &mut out, security.max_file_size)?;
            out.flush()?;
            // ヘッダの申告サイズを超えた分も合計に含める
            if written > declared {
                security.check_entry_size(&name, written - declared, &mut total_size)?;
            }
        }

        entries.push(name);
    }

    Ok(ExtractedPackage { dir, entries })
}

/// `limit`バイトまでコピーし、それを超えるデータがあればエラーにする
///
/// ZIPヘッダのサイズは自己申告なので、実際に伸長したバイト数で上限を確かめる。
fn copy_limited<R: Read, W: Write>(
    name: &str,
    reader: R,
    writer: &mut W,
    limit: u64,
) -> Result<u64, DocSlimError> {
    let written = io::copy(&mut reader.take(limit.saturating_add(1)), writer)?;
    if written > limit {
        return Err(DocSlimError::SecurityViolation(format!(
            "Entry '{}' exceeds maximum size: more than {} bytes after decompression",
            name, limit
        )));
    }
    Ok(written)
}

/// 作業ディレクトリのツリーをDeflate圧縮でZIPへ書き戻す
///
/// エントリ名と順序は元のアーカイブのものをそのまま使い、
/// 作業ディレクトリから削除されたエントリは書き出さない。
///
/// # 戻り値
///
/// 書き出したエントリの数
pub(crate) fn repack(root: &Path, entries: &[String], dest: &Path) -> Result<usize, DocSlimError> {
    let file = File::create(dest)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0usize;
    for name in entries {
        let source = root.join(name);

        if name.ends_with('/') {
            if source.is_dir() {
                zip.add_directory(name.as_str(), options)?;
                written += 1;
            }
            continue;
        }

        if !source.is_file() {
            continue;
        }

        zip.start_file(name.as_str(), options)?;
        let mut input = BufReader::new(File::open(&source)?);
        io::copy(&mut input, &mut zip)?;
        written += 1;
    }

    let mut inner = zip.finish()?;
    inner.flush()?;
    debug!(dest = %dest.display(), written, "package repacked");

    Ok(written)
}
