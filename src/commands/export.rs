//! # export 命令实现
//!
//! 由记录存储生成 MongoDB 可导入的 JSON 数组。
//!
//! ## 流程
//! 1. 写出前检查（目标已存在且未指定 `--force` 时直接报错，不写入）
//! 2. 打开记录存储与输出，逐条派生、编码并分批写出
//! 3. 失败时按 `FailurePolicy` 处理不完整的输出，并提示查看日志
//! 4. 成功时报告耗时、文件大小与统计表
//!
//! 输出到 `-`（管道）时，所有提示与进度条静默。
//!
//! ## 依赖关系
//! - 使用 `cli/export.rs` 定义的参数
//! - 使用 `store/`, `export/`, `utils/`

use crate::cli::export::ExportArgs;
use crate::error::{CrystexError, Result};
use crate::export::{ExportConfig, ExportOrchestrator, ExportSummary, FailurePolicy, OutputTarget};
use crate::store::JsonlStore;
use crate::utils::interrupt;
use crate::utils::logging::LogDestination;
use crate::utils::output::Console;
use crate::utils::timing::{format_size, ElapsedTime};

use log::{debug, warn};
use tabled::{Table, Tabled};

/// 统计表行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Item")]
    item: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 export 命令
pub fn execute(args: ExportArgs, log: &LogDestination) -> Result<()> {
    let target = OutputTarget::from_arg(&args.filename);
    let console = Console::new(target.is_pipe());

    // 写出前检查：冲突时不产生任何输出
    if target.prepare(args.force)? {
        console.info(&format!("Removed existing file at {}", target));
    }

    console.header("Exporting Structures");
    console.field("File", &target);
    console.field("Batch size", args.batch_size);
    console.field("Store fields as is", args.as_is);

    let config = ExportConfig {
        batch_size: args.batch_size,
        as_is: args.as_is,
        persist_attributes: args.store_attributes,
        on_failure: if args.keep_partial {
            FailurePolicy::Keep
        } else {
            FailurePolicy::Discard
        },
        show_progress: !console.is_quiet(),
    };

    let JsonlStore { cursor, mut extras } = JsonlStore::open(&args.store)?;
    let sink = target.open()?;

    let result = ExportOrchestrator::new(&cursor, &mut extras, config.clone())
        .with_shutdown(interrupt::listen_for_interrupt())
        .export(sink, &target.to_string());

    // 已派生的属性即使导出失败也是有效的
    let stored = if config.persist_attributes {
        extras.flush()
    } else {
        Ok(())
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => return Err(handle_failure(e, &target, &config, log, &console)),
    };
    stored?;

    report(&summary, &target, &config, &console);
    Ok(())
}

/// 按失败策略处理输出；完整错误链由 `main` 记录
fn handle_failure(
    e: CrystexError,
    target: &OutputTarget,
    config: &ExportConfig,
    log: &LogDestination,
    console: &Console,
) -> CrystexError {
    match target.handle_failure(config.on_failure) {
        Ok(true) => console.warning(&format!("Removed the incomplete output {}", target)),
        Ok(false) if !target.is_pipe() => console.warning(&format!(
            "{} may contain a partial result",
            target
        )),
        Ok(false) => {}
        Err(discard_error) => warn!(
            "Could not remove the incomplete output {}: {}",
            target, discard_error
        ),
    }

    if matches!(e, CrystexError::Interrupted) {
        console.warning("Aborted!");
        return e;
    }

    CrystexError::ExportFailed {
        target: target.to_string(),
        log: log.to_string(),
        source: Box::new(e),
    }
}

fn report(summary: &ExportSummary, target: &OutputTarget, config: &ExportConfig, console: &Console) {
    let elapsed = ElapsedTime::from(summary.elapsed);
    debug!(
        "Time taken for 'crystex export': {} s ({} days {} hours {} min {:.1} seconds)",
        elapsed.total, elapsed.days, elapsed.hours, elapsed.minutes, elapsed.seconds
    );

    let OutputTarget::File(path) = target else {
        return;
    };

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    console.success(&format!("Generated {} !", name));
    console.success(&format!("Time taken: {}", elapsed));
    if let Some(size) = target.size() {
        console.success(&format!("Size: {}", format_size(size)));
    }

    let rows = vec![
        SummaryRow {
            item: "Structures",
            value: summary.records.to_string(),
        },
        SummaryRow {
            item: "Fragments",
            value: summary.fragments.to_string(),
        },
        SummaryRow {
            item: "Batch size",
            value: config.batch_size.to_string(),
        },
        SummaryRow {
            item: "Peak buffered",
            value: summary.peak_buffered.to_string(),
        },
    ];
    console.block(Table::new(&rows));
}
