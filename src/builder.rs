//! Builder Module
//!
//! Fluent Builder APIを提供し、`Shrinker`と`ProseConverter`を段階的に構築する。

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};

use crate::api::{BackupPolicy, SheetSelector};
use crate::error::DocSlimError;
use crate::prose::{self, RenderOptions, Table};
use crate::security::SecurityConfig;
use crate::shrink;
use crate::types::{BatchSummary, ConversionReport, FileReport};

/// デフォルトのサイズ閾値（MB）
///
/// このサイズ以下のファイルは書き換えずにスキップされます。
pub const DEFAULT_SIZE_THRESHOLD_MB: f64 = 15.0;

/// 画像削除処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ShrinkConfig {
    /// サイズ閾値（MB）。これを超えるファイルのみ書き換える
    pub size_threshold_mb: f64,

    /// バックアップの方針
    pub backup_policy: BackupPolicy,

    /// ZIP展開時の制限
    pub security: SecurityConfig,
}

impl Default for ShrinkConfig {
    fn default() -> Self {
        Self {
            size_threshold_mb: DEFAULT_SIZE_THRESHOLD_MB,
            backup_policy: BackupPolicy::Keep,
            security: SecurityConfig::default(),
        }
    }
}

/// `Shrinker`を構築するビルダー
///
/// # 使用例
///
/// ```rust,no_run
/// use docslim::{BackupPolicy, ShrinkerBuilder};
///
/// # fn main() -> Result<(), docslim::DocSlimError> {
/// let shrinker = ShrinkerBuilder::new()
///     .with_size_threshold_mb(10.0)
///     .with_backup_policy(BackupPolicy::RemoveOnSuccess)
///     .build()?;
/// let report = shrinker.process_file("report.docx");
/// println!("{:?}", report.outcome);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ShrinkerBuilder {
    /// 内部設定（構築中）
    config: ShrinkConfig,
}

impl Default for ShrinkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShrinkerBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - サイズ閾値: 15 MB
    /// - バックアップ: 作成して残す
    pub fn new() -> Self {
        Self {
            config: ShrinkConfig::default(),
        }
    }

    /// サイズ閾値（MB）を指定する
    ///
    /// 閾値ちょうどのファイルはスキップされます。`0.0`を指定すると
    /// 空でないすべてのファイルが対象になります。
    pub fn with_size_threshold_mb(mut self, threshold_mb: f64) -> Self {
        self.config.size_threshold_mb = threshold_mb;
        self
    }

    /// バックアップの方針を指定する
    pub fn with_backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.config.backup_policy = policy;
        self
    }

    /// 設定を検証し、`Shrinker`を生成する
    ///
    /// # エラー
    ///
    /// * `DocSlimError::Config` - 閾値が負、または有限の値でない場合
    pub fn build(self) -> Result<Shrinker, DocSlimError> {
        let threshold = self.config.size_threshold_mb;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(DocSlimError::Config(format!(
                "Invalid size threshold: {} (must be a finite, non-negative number of MB)",
                threshold
            )));
        }

        Ok(Shrinker {
            config: self.config,
        })
    }
}

/// 画像削除処理のファサード
///
/// 1ファイルの処理では、エラーは`FileOutcome::Failed`として
/// [`FileReport`]に記録され、呼び出し元へは返されません。
#[derive(Debug, Clone)]
pub struct Shrinker {
    config: ShrinkConfig,
}

impl Default for Shrinker {
    fn default() -> Self {
        Self {
            config: ShrinkConfig::default(),
        }
    }
}

impl Shrinker {
    /// サイズ閾値（MB）
    pub fn size_threshold_mb(&self) -> f64 {
        self.config.size_threshold_mb
    }

    /// バックアップの方針
    pub fn backup_policy(&self) -> BackupPolicy {
        self.config.backup_policy
    }

    /// 1ファイルを処理する
    ///
    /// 1. サイズが閾値以下ならスキップ
    /// 2. バックアップを作成（方針による）
    /// 3. 画像を削除して書き換え
    /// 4. 失敗した場合はバックアップから復元
    pub fn process_file(&self, path: impl AsRef<Path>) -> FileReport {
        shrink::process_file(path.as_ref(), &self.config)
    }

    /// ディレクトリ配下の`.docx`を再帰的に処理する
    ///
    /// # エラー
    ///
    /// * `DocSlimError::Io` - ディレクトリが存在しない場合
    ///
    /// 個々のファイルの失敗は[`BatchSummary`]に集計されます。
    pub fn process_directory(&self, dir: impl AsRef<Path>) -> Result<BatchSummary, DocSlimError> {
        shrink::process_directory(dir.as_ref(), &self.config)
    }
}

/// 表データ変換の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ProseConfig {
    /// シート選択方式（Excelのみ）
    pub sheet_selector: SheetSelector,

    /// CSVの文字エンコーディング
    pub encoding: &'static Encoding,

    /// 段落の書式
    pub render: RenderOptions,
}

impl Default for ProseConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::First,
            encoding: UTF_8,
            render: RenderOptions::default(),
        }
    }
}

/// `ProseConverter`を構築するビルダー
///
/// # 使用例
///
/// ```rust,no_run
/// use docslim::{ProseConverterBuilder, SheetSelector};
///
/// # fn main() -> Result<(), docslim::DocSlimError> {
/// let converter = ProseConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("研发计划".to_string()))
///     .with_bullets(false)
///     .build()?;
/// let report = converter.convert_file("plan.xlsx", None)?;
/// println!("{} paragraphs", report.paragraphs);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProseConverterBuilder {
    /// 内部設定（構築中）
    config: ProseConfig,

    /// エンコーディングラベル（`build()`で解決する）
    encoding_label: Option<String>,
}

impl Default for ProseConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProseConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート: 先頭のシート
    /// - エンコーディング: UTF-8（BOMは除去）
    /// - 箇条書き: あり（`- 列名：値`）
    pub fn new() -> Self {
        Self {
            config: ProseConfig::default(),
            encoding_label: None,
        }
    }

    /// 各行の先頭に`- `を付けるかを指定する
    pub fn with_bullets(mut self, bullets: bool) -> Self {
        self.config.render.bullets = bullets;
        self
    }

    /// 列名と値の区切り文字を指定する（デフォルトは全角コロン）
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.render.separator = separator.into();
        self
    }

    /// 読み込むシートを指定する（CSVでは無視される）
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// CSVの文字エンコーディングをラベルで指定する
    ///
    /// 例: `"utf-8"`, `"utf-8-sig"`, `"gbk"`, `"shift_jis"`
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding_label = Some(label.into());
        self
    }

    /// 設定を検証し、`ProseConverter`を生成する
    ///
    /// # エラー
    ///
    /// * `DocSlimError::Encoding` - 不明なエンコーディングラベル
    /// * `DocSlimError::Config` - 区切り文字が空
    pub fn build(mut self) -> Result<ProseConverter, DocSlimError> {
        if let Some(label) = &self.encoding_label {
            self.config.encoding = prose::resolve_encoding(label)?;
        }

        if self.config.render.separator.is_empty() {
            return Err(DocSlimError::Config(
                "Separator must not be empty".to_string(),
            ));
        }

        Ok(ProseConverter {
            config: self.config,
        })
    }
}

/// 表データ変換のファサード
#[derive(Debug, Clone)]
pub struct ProseConverter {
    config: ProseConfig,
}

impl Default for ProseConverter {
    fn default() -> Self {
        Self {
            config: ProseConfig::default(),
        }
    }
}

impl ProseConverter {
    /// 入力ファイルを表として読み込む
    ///
    /// 先頭の空でない行をヘッダーとし、完全に空の行は除外されます。
    pub fn read_table(&self, input: impl AsRef<Path>) -> Result<Table, DocSlimError> {
        prose::read_table(input.as_ref(), &self.config)
    }

    /// 表を段落の一覧へ変換する（空の段落は含まない）
    pub fn render(&self, table: &Table) -> Vec<String> {
        prose::render_table(table, &self.config)
    }

    /// 入力ファイルを変換し、段落を空行で連結した文字列を返す
    pub fn convert_to_string(&self, input: impl AsRef<Path>) -> Result<String, DocSlimError> {
        let table = self.read_table(input)?;
        Ok(prose::render_text(&table, &self.config))
    }

    /// 入力ファイルを変換し、テキストファイルへ書き出す
    ///
    /// 出力先は[`crate::build_output_path`]の規則で決まります。
    /// 段落が1つもない場合はファイルを作成しません。
    pub fn convert_file(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> Result<ConversionReport, DocSlimError> {
        prose::convert_file(input.as_ref(), output, &self.config)
    }
}
