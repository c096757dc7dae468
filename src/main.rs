use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use po_catalog::writer::patch_catalog_text;
use po_catalog::{
    CatalogEditor, CatalogService, EngineConfig, MatchTarget, SearchCriteria, Translation,
    UpdateRequest, SUPPORTED_EXTENSIONS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "po_catalog")]
#[command(about = "加载、搜索、统计并按原格式写回 gettext PO 目录")]
#[command(version = "0.1.0")]
struct Cli {
    /// 输入 PO/POT 文件路径（可多个）
    #[arg(short, long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// 配置文件路径（JSON）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 显示统计信息
    #[arg(long)]
    stats: bool,

    /// 搜索条目
    #[arg(long)]
    search: Option<String>,

    /// 搜索目标
    #[arg(long, value_enum, default_value_t = TargetArg::Both)]
    target: TargetArg,

    /// 区分大小写
    #[arg(long)]
    case_sensitive: bool,

    /// 按正则表达式搜索
    #[arg(long)]
    regex: bool,

    /// 排除已翻译条目
    #[arg(long)]
    exclude_translated: bool,

    /// 排除未翻译条目
    #[arg(long)]
    exclude_untranslated: bool,

    /// 排除 fuzzy 条目
    #[arg(long)]
    exclude_fuzzy: bool,

    /// 最多返回的搜索结果数
    #[arg(long)]
    limit: Option<usize>,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,

    /// 应用翻译模式：从翻译JSON文件应用翻译并写回
    #[arg(long)]
    apply_translations: Option<PathBuf>,

    /// 应用部分翻译：从JSON字符串应用指定的翻译对象
    #[arg(long)]
    apply_partial: Option<String>,

    /// 应用部分翻译：从标准输入读取JSON翻译对象
    #[arg(long)]
    apply_partial_stdin: bool,

    /// 调用一个工具（如 search_entries），结果以 JSON 输出
    #[arg(long)]
    call: Option<String>,

    /// 工具参数（JSON 对象）
    #[arg(long, requires = "call")]
    args: Option<String>,

    /// 测试模式：解析文件后不做修改直接写回，验证往返是否逐字节一致
    #[arg(long)]
    test_rebuild: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    Source,
    Translation,
    Both,
}

impl From<TargetArg> for MatchTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Source => MatchTarget::Source,
            TargetArg::Translation => MatchTarget::Translation,
            TargetArg::Both => MatchTarget::Both,
        }
    }
}

/// 翻译文件中的一条翻译；未指定 filePath 时应用到第一个输入文件
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationItem {
    file_path: Option<PathBuf>,
    msgid: String,
    #[serde(default)]
    msgctxt: Option<String>,
    msgstr: Translation,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.quiet)?;

    for input in &cli.input {
        validate_input(input)?;
    }
    validate_partial_options(&cli)?;

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if cli.test_rebuild {
        return handle_test_rebuild(&cli);
    }

    let mut editor = CatalogEditor::new(config);
    for input in &cli.input {
        editor
            .load(input)
            .with_context(|| format!("加载目录失败: {:?}", input))?;
    }

    if let Some(tool) = &cli.call {
        return handle_tool_call(editor, tool, cli.args.as_deref());
    }

    if cli.apply_partial_stdin {
        return handle_partial_translation_stdin(&cli, &mut editor);
    }

    if let Some(partial_json) = &cli.apply_partial {
        return apply_translation_json(&cli, &mut editor, partial_json);
    }

    if let Some(translation_file) = &cli.apply_translations {
        return handle_translation_application(&cli, &mut editor, translation_file);
    }

    if let Some(query) = &cli.search {
        return handle_search(&cli, &editor, query);
    }

    // 默认模式：统计
    handle_stats(&cli, &editor)
}

fn init_logging(quiet: bool) -> Result<()> {
    let level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .init();
    Ok(())
}

/// 验证输入文件
fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("输入文件不存在: {:?}", input);
    }

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !SUPPORTED_EXTENSIONS
        .iter()
        .any(|&ext| Some(ext) == extension.as_deref())
    {
        bail!("输入文件必须是 PO 或 POT 文件: {:?}", input);
    }

    Ok(())
}

/// 验证部分翻译选项（确保只使用一种方式）
fn validate_partial_options(cli: &Cli) -> Result<()> {
    let partial_count = [
        cli.apply_partial.is_some(),
        cli.apply_partial_stdin,
        cli.apply_translations.is_some(),
    ]
    .iter()
    .filter(|&&x| x)
    .count();

    if partial_count > 1 {
        bail!("只能使用一种翻译方式：--apply-translations、--apply-partial 或 --apply-partial-stdin");
    }

    Ok(())
}

/// 处理测试重建模式
fn handle_test_rebuild(cli: &Cli) -> Result<()> {
    let mut failures = 0;

    for input in &cli.input {
        let original = std::fs::read(input).with_context(|| format!("读取文件失败: {:?}", input))?;
        let catalog = po_catalog::Catalog::from_bytes(input.clone(), &original, chrono::Local::now())?;
        let (text, _) = po_catalog::catalog::decode_catalog_bytes(input, &original)?;
        let rebuilt = patch_catalog_text(&text, &catalog);

        if rebuilt.text == text && rebuilt.patched_entries == 0 {
            if !cli.quiet {
                println!("✓ {:?}: {} 个条目，往返一致", input, catalog.entries.len());
            }
        } else {
            failures += 1;
            eprintln!("✗ {:?}: 重建结果与原文件不一致", input);
        }
    }

    if failures > 0 {
        bail!("{} 个文件重建不一致", failures);
    }
    Ok(())
}

/// 处理工具调用
fn handle_tool_call(editor: CatalogEditor, tool: &str, args: Option<&str>) -> Result<()> {
    let args: serde_json::Value = match args {
        Some(raw) => serde_json::from_str(raw).context("解析工具参数失败")?,
        None => serde_json::Value::Null,
    };

    let mut service = CatalogService::new(editor);
    match service.call(tool, args) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            bail!("工具调用失败: {}", failure)
        }
    }
}

/// 处理部分翻译应用（从标准输入）
fn handle_partial_translation_stdin(cli: &Cli, editor: &mut CatalogEditor) -> Result<()> {
    if !cli.quiet {
        eprintln!("等待从标准输入读取JSON数据... (Ctrl+D结束输入)");
    }

    use std::io::Read;
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("从标准输入读取失败")?;

    apply_translation_json(cli, editor, &buffer)
}

/// 处理翻译文件应用
fn handle_translation_application(
    cli: &Cli,
    editor: &mut CatalogEditor,
    translation_file: &Path,
) -> Result<()> {
    let content = std::fs::read_to_string(translation_file)
        .with_context(|| format!("读取翻译文件失败: {:?}", translation_file))?;
    apply_translation_json(cli, editor, &content)
}

/// 解析翻译JSON并批量应用
fn apply_translation_json(cli: &Cli, editor: &mut CatalogEditor, json: &str) -> Result<()> {
    let items: Vec<TranslationItem> = serde_json::from_str(json).context("解析翻译JSON失败")?;
    if items.is_empty() {
        bail!("翻译数据为空");
    }

    let default_path = cli.input[0].clone();
    let requests: Vec<UpdateRequest> = items
        .into_iter()
        .map(|item| UpdateRequest {
            file_path: item.file_path.unwrap_or_else(|| default_path.clone()),
            msgid: item.msgid,
            msgctxt: item.msgctxt,
            msgstr: item.msgstr,
        })
        .collect();

    if !cli.quiet {
        println!("准备应用 {} 个翻译条目", requests.len());
    }

    let report = editor.update_translations(requests);

    for failure in report.results.iter().filter(|r| !r.success) {
        eprintln!(
            "✗ {}: {}",
            shorten(&failure.msgid),
            failure.error.as_deref().unwrap_or_default()
        );
    }

    if !cli.quiet {
        for save in &report.saves {
            println!(
                "已写回 {:?}：替换 {} 处{}",
                save.path,
                save.patched_entries,
                if save.written { "" } else { "（无变化）" }
            );
            if let Some(warning) = &save.post_save_warning {
                println!("  后处理警告: {}", warning);
            }
        }
        println!("成功 {} 条，失败 {} 条", report.succeeded(), report.failed());
    }

    if report.succeeded() == 0 {
        bail!("没有任何翻译被应用");
    }
    Ok(())
}

/// 处理搜索
fn handle_search(cli: &Cli, editor: &CatalogEditor, query: &str) -> Result<()> {
    let mut criteria = SearchCriteria::new(query)
        .target(cli.target.into())
        .case_sensitive(cli.case_sensitive)
        .regex(cli.regex)
        .include_translated(!cli.exclude_translated)
        .include_untranslated(!cli.exclude_untranslated)
        .include_fuzzy(!cli.exclude_fuzzy);
    criteria.limit = cli.limit.or(editor.config().search_limit);

    let hits = editor.store().search(&criteria)?;

    if cli.quiet {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    for hit in &hits {
        let name = hit
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let context = hit
            .entry
            .context
            .as_deref()
            .map(|ctx| format!("{}|", ctx))
            .unwrap_or_default();
        println!(
            "[{}] {}{} -> \"{}\"",
            name,
            context,
            shorten(&hit.entry.id),
            shorten(hit.entry.translation.primary())
        );
    }
    println!("共找到 {} 个条目", hits.len());
    Ok(())
}

/// 处理统计
fn handle_stats(cli: &Cli, editor: &CatalogEditor) -> Result<()> {
    let store = editor.store();

    if cli.quiet && !cli.stats {
        return Ok(());
    }

    for catalog in store.catalogs() {
        println!("{:?}", catalog.path);
        if let Some(language) = catalog.language() {
            println!("语言: {}", language);
        }
        println!("{}", catalog.stats());
    }

    if store.len() > 1 {
        println!("合计");
        println!("{}", store.stats(None)?);
    }
    Ok(())
}

fn shorten(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}
