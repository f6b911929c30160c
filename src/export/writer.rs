//! # 流式分批 JSON 数组写出器
//!
//! 将文档逐条缓冲，凑满一批后序列化为紧凑片段写出，内存峰值只与
//! 批大小有关。状态机：
//! ```text
//! Opened ──append──▶ Writing ──批满──▶ Flushing ──▶ Writing
//!    └──────────────────┴──close / drop──▶ Closed
//! ```
//! 输出格式：
//! ```text
//! [ <片段1> , <片段2> , ... ]      片段 = 一批文档去掉外层方括号
//! ```
//! 分隔符写在每个非首片段之前，因此最后一个片段后不会有多余的逗号。
//! 结束符 `]` 在任何退出路径上都会写出：正常路径由 `close()` 写出，
//! 出错或 panic 展开时由 `Drop` 写出。
//!
//! ## 依赖关系
//! - 被 `export/orchestrator.rs` 使用

use crate::error::{CrystexError, Result};
use crate::models::Document;

use log::{debug, warn};
use std::io::Write;
use std::num::NonZeroUsize;

const ARRAY_START: &[u8] = b"[";
const ARRAY_END: &[u8] = b"]";
const ITEM_SEPARATOR: &[u8] = b",";

/// 写出器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Opened,
    Writing,
    Flushing,
    Closed,
}

/// 分批 JSON 数组写出器
pub struct BatchWriter<W: Write> {
    sink: Option<W>,
    label: String,
    batch: Vec<Document>,
    batch_size: usize,
    state: WriterState,
    fragments: usize,
    written: usize,
    bytes: u64,
    peak_buffered: usize,
}

impl<W: Write> BatchWriter<W> {
    /// 写出数组起始符
    pub fn open(sink: W, label: impl Into<String>, batch_size: NonZeroUsize) -> Result<Self> {
        let mut writer = BatchWriter {
            sink: Some(sink),
            label: label.into(),
            batch: Vec::with_capacity(batch_size.get()),
            batch_size: batch_size.get(),
            state: WriterState::Opened,
            fragments: 0,
            written: 0,
            bytes: 0,
            peak_buffered: 0,
        };
        writer.write_raw(ARRAY_START)?;
        Ok(writer)
    }

    #[cfg(test)]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// 当前缓冲中的文档数
    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    /// 缓冲文档数的历史最大值
    pub fn peak_buffered(&self) -> usize {
        self.peak_buffered
    }

    /// 已写出的文档数
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Err(CrystexError::Other(format!(
                "writer for {} has no sink",
                self.label
            )));
        };
        sink.write_all(data)
            .map_err(|e| CrystexError::FileWriteError {
                path: self.label.clone(),
                source: e,
            })?;
        self.bytes += data.len() as u64;
        Ok(())
    }

    /// 缓冲一个文档，批满时写出
    pub fn append(&mut self, document: Document) -> Result<()> {
        if self.state == WriterState::Closed {
            return Err(CrystexError::Other(format!(
                "cannot append to the closed output {}",
                self.label
            )));
        }

        self.state = WriterState::Writing;
        self.batch.push(document);
        self.peak_buffered = self.peak_buffered.max(self.batch.len());

        if self.batch.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// 将缓冲的文档序列化为一个片段写出
    pub fn flush_batch(&mut self) -> Result<()> {
        if self.batch.is_empty() || self.state == WriterState::Closed {
            return Ok(());
        }

        self.state = WriterState::Flushing;
        let serialized = serde_json::to_string(&self.batch)?;
        // 去掉片段自身的外层方括号
        let fragment = &serialized[1..serialized.len() - 1];

        if self.fragments > 0 {
            self.write_raw(ITEM_SEPARATOR)?;
        }
        self.write_raw(fragment.as_bytes())?;

        self.fragments += 1;
        self.written += self.batch.len();
        debug!(
            "Flushed fragment #{} ({} documents, {} total) to {}",
            self.fragments,
            self.batch.len(),
            self.written,
            self.label
        );
        self.batch.clear();
        self.state = WriterState::Writing;
        Ok(())
    }

    /// 写出结束符并刷新底层输出，只执行一次
    fn finish(&mut self) -> Result<()> {
        if self.state == WriterState::Closed {
            return Ok(());
        }
        self.state = WriterState::Closed;

        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        sink.write_all(ARRAY_END)
            .and_then(|()| sink.flush())
            .map_err(|e| CrystexError::FileWriteError {
                path: self.label.clone(),
                source: e,
            })?;
        self.bytes += ARRAY_END.len() as u64;
        debug!(
            "Closed {} after {} documents ({} bytes)",
            self.label, self.written, self.bytes
        );
        Ok(())
    }

    /// 写出剩余文档与结束符，返回底层输出
    ///
    /// 即使剩余文档写出失败，结束符也会尝试写出；返回第一个错误。
    pub fn close(mut self) -> Result<W> {
        let flushed = self.flush_batch();
        let finished = self.finish();
        flushed?;
        finished?;

        self.sink.take().ok_or_else(|| {
            CrystexError::Other(format!("writer for {} has no sink", self.label))
        })
    }
}

impl<W: Write> Drop for BatchWriter<W> {
    fn drop(&mut self) {
        if self.state == WriterState::Closed {
            return;
        }
        warn!(
            "Output {} was not closed cleanly; {} buffered document(s) discarded",
            self.label,
            self.batch.len()
        );
        if let Err(e) = self.finish() {
            warn!("Failed to terminate {}: {}", self.label, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn document(index: usize) -> Document {
        json!({"id": index.to_string(), "nsites": index})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn write(count: usize, batch_size: usize) -> (Vec<u8>, usize) {
        let mut writer =
            BatchWriter::open(Vec::new(), "memory", NonZeroUsize::new(batch_size).unwrap())
                .unwrap();
        for index in 0..count {
            writer.append(document(index)).unwrap();
            assert!(writer.buffered() < batch_size);
        }
        let peak = writer.peak_buffered();
        (writer.close().unwrap(), peak)
    }

    #[test]
    fn test_valid_json_for_boundary_counts() {
        let batch_size = 4;
        for count in [0, 1, batch_size - 1, batch_size, batch_size + 1, 2 * batch_size] {
            let (output, peak) = write(count, batch_size);
            let parsed: Value = serde_json::from_slice(&output)
                .unwrap_or_else(|e| panic!("count {}: {}", count, e));
            let items = parsed.as_array().unwrap();
            assert_eq!(items.len(), count);
            for (index, item) in items.iter().enumerate() {
                assert_eq!(item["id"], json!(index.to_string()));
            }
            assert!(peak <= batch_size);
        }
    }

    #[test]
    fn test_empty_output() {
        let (output, _) = write(0, 3);
        assert_eq!(output, b"[]");
    }

    #[test]
    fn test_compact_fragments() {
        let (output, _) = write(3, 2);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            r#"[{"id":"0","nsites":0},{"id":"1","nsites":1},{"id":"2","nsites":2}]"#
        );
    }

    #[test]
    fn test_state_transitions() {
        let mut writer =
            BatchWriter::open(Vec::new(), "memory", NonZeroUsize::new(2).unwrap()).unwrap();
        assert_eq!(writer.state(), WriterState::Opened);
        writer.append(document(0)).unwrap();
        assert_eq!(writer.state(), WriterState::Writing);
        writer.append(document(1)).unwrap();
        assert_eq!(writer.state(), WriterState::Writing);
        assert_eq!(writer.fragments(), 1);
        assert_eq!(writer.written(), 2);
        let output = writer.close().unwrap();
        assert_eq!(output.last(), Some(&b']'));
    }

    #[test]
    fn test_drop_writes_closing_token() {
        let mut buffer = Vec::new();
        {
            let mut writer =
                BatchWriter::open(&mut buffer, "memory", NonZeroUsize::new(2).unwrap()).unwrap();
            for index in 0..3 {
                writer.append(document(index)).unwrap();
            }
            // 未调用 close：剩余的一条文档丢弃，但数组仍然闭合
        }
        let parsed: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    struct FailingSink {
        accepted: Vec<u8>,
        fail_after: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            if self.accepted.len() + data.len() > self.fail_after {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.accepted.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let sink = FailingSink {
            accepted: Vec::new(),
            fail_after: 1,
        };
        let mut writer = BatchWriter::open(sink, "full-disk", NonZeroUsize::new(1).unwrap()).unwrap();
        assert!(matches!(
            writer.append(document(0)),
            Err(CrystexError::FileWriteError { .. })
        ));
    }
}
