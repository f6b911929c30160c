//! # derive 命令实现
//!
//! 派生记录存储中每条结构的属性并写回附加数据，之后的导出可直接复用。
//! 任何一条记录派生失败都会中止；此前已派生的结果仍会写回。
//!
//! ## 依赖关系
//! - 使用 `cli/derive.rs` 定义的参数
//! - 使用 `store/`, `derive/`, `utils/`

use crate::cli::derive::DeriveArgs;
use crate::derive::AttributeCache;
use crate::error::{CrystexError, Result};
use crate::store::{ExtrasStore, JsonlStore, RecordCursor};
use crate::utils::interrupt::{self, ShutdownSignal};
use crate::utils::output::Console;
use crate::utils::progress;

use indicatif::ProgressBar;
use log::debug;

/// 派生统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DeriveStats {
    structures: usize,
    updated: usize,
}

/// 执行 derive 命令
pub fn execute(args: DeriveArgs) -> Result<()> {
    let console = Console::default();
    console.header("Deriving Structure Attributes");
    console.field("Store", args.store.display());

    let JsonlStore { cursor, mut extras } = JsonlStore::open(&args.store)?;
    let total = cursor.count()?;
    console.info(&format!("Found {} structures", total));

    let shutdown = interrupt::listen_for_interrupt();
    let pb = progress::create_progress_bar(total as u64, "Deriving attributes", true);

    let mut stats = DeriveStats::default();
    let outcome = derive_all(
        &cursor,
        &mut extras,
        args.batch_size.get(),
        Some(&shutdown),
        &pb,
        &mut stats,
    );
    pb.finish_and_clear();

    // 已派生的结果总是写回
    extras.flush()?;
    outcome?;

    console.success(&format!(
        "Derived attributes for {} structures ({} updated)",
        stats.structures, stats.updated
    ));
    Ok(())
}

fn derive_all(
    cursor: &dyn RecordCursor,
    extras: &mut dyn ExtrasStore,
    page_size: usize,
    shutdown: Option<&ShutdownSignal>,
    pb: &ProgressBar,
    stats: &mut DeriveStats,
) -> Result<()> {
    for record in cursor.iterate(page_size)? {
        if interrupt::is_requested(shutdown) {
            return Err(CrystexError::Interrupted);
        }

        let cache = AttributeCache::load(record?, &*extras)?;
        cache.finish()?;
        let fresh = cache.fresh_attributes();
        let id = cache.record().immutable_id.clone();
        cache.store_attributes(&mut *extras)?;

        if !fresh.is_empty() {
            debug!("Derived {} attribute(s) for {}", fresh.len(), id);
            stats.updated += 1;
        }
        stats.structures += 1;
        pb.inc(1);
    }
    Ok(())
}
