//! # JSON Lines 记录存储
//!
//! 每行一条 `RawStructureRecord`，空行忽略。附加数据保存在旁边的
//! `<file>.extras.json` 中：
//! ```text
//! { "<immutable_id>": { "<key>": <payload>, ... }, ... }
//! ```
//! 附加数据在打开时整体载入，`flush()` 通过临时文件 + 重命名写回。
//! 写入附加数据时重新核对记录身份：记录文件自上次统计后有变化则重新统计。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 实现 `store::{RecordCursor, ExtrasStore}`

use super::{ExtrasStore, RecordCursor, RecordIter};
use crate::error::{CrystexError, Result};
use crate::models::{Document, RawStructureRecord};

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const FORMAT: &str = "JSON Lines";

/// 打开的 JSON Lines 存储
pub struct JsonlStore {
    pub cursor: JsonlCursor,
    pub extras: JsonlExtras,
}

impl JsonlStore {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CrystexError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let cursor = JsonlCursor {
            path: path.to_path_buf(),
        };
        let extras = JsonlExtras::open(path)?;
        Ok(JsonlStore { cursor, extras })
    }
}

/// `<file>.extras.json`
pub fn extras_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".extras.json");
    PathBuf::from(name)
}

fn open_reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| CrystexError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufReader::new(file))
}

/// 逐行遍历非空行，附带行号（从 1 开始）
fn numbered_lines(
    path: &Path,
    lines: Lines<BufReader<File>>,
) -> impl Iterator<Item = Result<(usize, String)>> + '_ {
    lines
        .enumerate()
        .map(move |(index, line)| {
            line.map(|line| (index + 1, line))
                .map_err(|e| CrystexError::FileReadError {
                    path: path.display().to_string(),
                    source: e,
                })
        })
        .filter(|line| !matches!(line, Ok((_, text)) if text.trim().is_empty()))
}

fn parse_error(path: &Path, line_number: usize, error: serde_json::Error) -> CrystexError {
    CrystexError::ParseError {
        format: FORMAT.to_string(),
        path: path.display().to_string(),
        reason: format!("line {}: {}", line_number, error),
    }
}

// ─────────────────────────────────────────────────────────────
// 记录游标
// ─────────────────────────────────────────────────────────────

pub struct JsonlCursor {
    path: PathBuf,
}

impl RecordCursor for JsonlCursor {
    fn count(&self) -> Result<usize> {
        let reader = open_reader(&self.path)?;
        let mut count = 0;
        for line in numbered_lines(&self.path, reader.lines()) {
            line?;
            count += 1;
        }
        Ok(count)
    }

    fn iterate(&self, page_size: usize) -> Result<RecordIter<'_>> {
        let reader = open_reader(&self.path)?;
        Ok(Box::new(Pages {
            path: &self.path,
            lines: Box::new(numbered_lines(&self.path, reader.lines())),
            page: VecDeque::with_capacity(page_size.max(1)),
            page_size: page_size.max(1),
            exhausted: false,
        }))
    }
}

/// 按页读取的记录序列
struct Pages<'a> {
    path: &'a Path,
    lines: Box<dyn Iterator<Item = Result<(usize, String)>> + 'a>,
    page: VecDeque<Result<RawStructureRecord>>,
    page_size: usize,
    exhausted: bool,
}

impl Pages<'_> {
    fn fetch_page(&mut self) {
        while self.page.len() < self.page_size {
            let Some(line) = self.lines.next() else {
                self.exhausted = true;
                break;
            };
            let record = line.and_then(|(line_number, text)| {
                serde_json::from_str(&text).map_err(|e| parse_error(self.path, line_number, e))
            });
            self.page.push_back(record);
        }
        debug!(
            "Fetched a page of {} record(s) from {}",
            self.page.len(),
            self.path.display()
        );
    }
}

impl Iterator for Pages<'_> {
    type Item = Result<RawStructureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            self.fetch_page();
        }
        self.page.pop_front()
    }
}

// ─────────────────────────────────────────────────────────────
// 附加数据
// ─────────────────────────────────────────────────────────────

/// 只解析记录的身份字段
#[derive(Deserialize)]
struct Identity {
    immutable_id: String,
}

/// 记录文件的长度与修改时间；文件不存在时为 `None`
type FileStamp = Option<(u64, Option<SystemTime>)>;

fn file_stamp(path: &Path) -> Result<FileStamp> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some((metadata.len(), metadata.modified().ok()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CrystexError::FileReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// immutable_id → 记录数
fn count_identities(records_path: &Path, stamp: FileStamp) -> Result<HashMap<String, usize>> {
    let mut identities = HashMap::new();
    if stamp.is_none() {
        return Ok(identities);
    }

    let reader = open_reader(records_path)?;
    for line in numbered_lines(records_path, reader.lines()) {
        let (line_number, text) = line?;
        let identity: Identity = serde_json::from_str(&text)
            .map_err(|e| parse_error(records_path, line_number, e))?;
        *identities.entry(identity.immutable_id).or_insert(0) += 1;
    }
    Ok(identities)
}

pub struct JsonlExtras {
    path: PathBuf,
    records_path: PathBuf,
    /// 统计 `identities` 时记录文件的状态
    stamp: FileStamp,
    identities: HashMap<String, usize>,
    extras: HashMap<String, Document>,
    dirty: bool,
}

impl JsonlExtras {
    fn open(records_path: &Path) -> Result<Self> {
        let stamp = file_stamp(records_path)?;
        let identities = count_identities(records_path, stamp)?;

        let path = extras_path(records_path);
        let extras = if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| CrystexError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            serde_json::from_str(&content).map_err(|e| CrystexError::ParseError {
                format: "extras".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            HashMap::new()
        };

        Ok(JsonlExtras {
            path,
            records_path: records_path.to_path_buf(),
            stamp,
            identities,
            extras,
            dirty: false,
        })
    }

    /// 记录文件有变化时重新统计身份
    fn refresh_identities(&mut self) -> Result<()> {
        let stamp = file_stamp(&self.records_path)?;
        if stamp != self.stamp {
            debug!(
                "{} changed since its identities were counted, recounting",
                self.records_path.display()
            );
            self.identities = count_identities(&self.records_path, stamp)?;
            self.stamp = stamp;
        }
        Ok(())
    }

    /// 有未写回的修改时写回附加数据文件
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let write_error = |e| CrystexError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        };

        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);

        let file = File::create(&temporary).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.extras)?;
        writer.flush().map_err(write_error)?;
        drop(writer);
        fs::rename(&temporary, &self.path).map_err(write_error)?;

        info!(
            "Stored extras of {} record(s) in {}",
            self.extras.len(),
            self.path.display()
        );
        self.dirty = false;
        Ok(())
    }
}

impl ExtrasStore for JsonlExtras {
    fn get(&self, immutable_id: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .extras
            .get(immutable_id)
            .and_then(|extras| extras.get(key))
            .cloned())
    }

    fn set(&mut self, immutable_id: &str, key: &str, value: Value) -> Result<()> {
        self.refresh_identities()?;
        if self.identities.get(immutable_id) != Some(&1) {
            return Err(CrystexError::NotFound {
                immutable_id: immutable_id.to_string(),
            });
        }
        self.extras
            .entry(immutable_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }
}
