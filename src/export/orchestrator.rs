//! # 导出编排
//!
//! ```text
//! 游标（按页拉取） ─▶ AttributeCache ─▶ 十六进制解码 / 质量归一化
//!                 ─▶ 合并身份字段 ─▶ BatchWriter ─▶ 输出
//! ```
//! 单线程、顺序处理，输出顺序即游标顺序。任何一条记录派生或编码失败
//! 都会中止整个导出；写出器的结束符由其 `Drop` 保证写出。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 使用
//! - 使用 `derive/`, `codec/`, `store/`, `export/writer.rs`, `utils/`

use super::sink::FailurePolicy;
use super::writer::BatchWriter;
use crate::codec::{decode_float_fields, normalize_species_mass};
use crate::derive::AttributeCache;
use crate::error::{CrystexError, Result};
use crate::models::{Document, RawStructureRecord};
use crate::store::{ExtrasStore, RecordCursor};
use crate::utils::interrupt::{self, ShutdownSignal};
use crate::utils::progress;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use serde_json::{json, Value};
use std::io::Write;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// 默认批大小
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => unreachable!(),
};

/// 导出配置
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// 游标页大小与写出批大小
    pub batch_size: NonZeroUsize,
    /// 跳过物种质量归一化
    pub as_is: bool,
    /// 将新派生的属性写回附加数据
    pub persist_attributes: bool,
    pub on_failure: FailurePolicy,
    pub show_progress: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            as_is: false,
            persist_attributes: false,
            on_failure: FailurePolicy::default(),
            show_progress: true,
        }
    }
}

/// 导出结果统计
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub records: usize,
    pub fragments: usize,
    pub peak_buffered: usize,
    pub elapsed: Duration,
}

/// MongoDB 扩展 JSON 日期：`{"$date": "2020-05-01T12:00:00.000Z"}`
pub fn extended_json_date(timestamp: &DateTime<Utc>) -> Value {
    json!({ "$date": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

/// 记录的身份字段
fn identity_fields(record: &RawStructureRecord) -> Document {
    let mut identity = Document::new();
    identity.insert("id".to_string(), Value::String(record.id.clone()));
    identity.insert(
        "immutable_id".to_string(),
        Value::String(record.immutable_id.clone()),
    );
    identity.insert(
        "last_modified".to_string(),
        extended_json_date(&record.last_modified),
    );
    identity.insert("ctime".to_string(), extended_json_date(&record.created));
    identity
}

/// 导出编排器
pub struct ExportOrchestrator<'a> {
    cursor: &'a dyn RecordCursor,
    extras: &'a mut dyn ExtrasStore,
    config: ExportConfig,
    shutdown: Option<ShutdownSignal>,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        cursor: &'a dyn RecordCursor,
        extras: &'a mut dyn ExtrasStore,
        config: ExportConfig,
    ) -> Self {
        ExportOrchestrator {
            cursor,
            extras,
            config,
            shutdown: None,
        }
    }

    /// 在记录之间检查的关闭标志
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// 单条记录 → 输出文档
    pub fn document_for(&mut self, record: RawStructureRecord) -> Result<Document> {
        let identity = identity_fields(&record);

        let cache = AttributeCache::load(record, &*self.extras)?;
        let attributes = if self.config.persist_attributes {
            cache.store_attributes(&mut *self.extras)?
        } else {
            cache.finish()?
        };

        let mut document = attributes.to_payload()?;
        decode_float_fields(&mut document)?;
        normalize_species_mass(&mut document, self.config.as_is);
        document.extend(identity);
        Ok(document)
    }

    /// 执行导出，写出完整的 JSON 数组
    pub fn export<W: Write>(&mut self, sink: W, label: &str) -> Result<ExportSummary> {
        let start = Instant::now();
        let batch_size = self.config.batch_size;

        let total = if self.config.show_progress {
            self.cursor.count()? as u64
        } else {
            0
        };
        let pb = progress::create_progress_bar(total, "Writing structures", self.config.show_progress);

        let mut writer = BatchWriter::open(sink, label, batch_size)?;
        let cursor = self.cursor;
        for record in cursor.iterate(batch_size.get())? {
            if interrupt::is_requested(self.shutdown.as_ref()) {
                pb.abandon_with_message("Interrupted");
                return Err(CrystexError::Interrupted);
            }

            let record = record?;
            debug!("Exporting record {} ({})", record.id, record.immutable_id);
            let document = self.document_for(record)?;
            writer.append(document)?;
            pb.inc(1);
        }

        let peak_buffered = writer.peak_buffered();
        let records = writer.written() + writer.buffered();
        let fragments = writer.fragments() + usize::from(writer.buffered() > 0);
        writer.close()?;
        pb.finish_and_clear();

        let summary = ExportSummary {
            records,
            fragments,
            peak_buffered,
            elapsed: start.elapsed(),
        };
        info!(
            "Exported {} structures to {} in {} fragment(s) ({:.1} s)",
            summary.records,
            label,
            summary.fragments,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}
