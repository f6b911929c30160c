//! # 耗时与文件大小格式化
//!
//! ## 依赖关系
//! - 被 `commands/export.rs` 使用

use std::fmt;
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// 拆分为天 / 小时 / 分钟 / 秒的耗时
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedTime {
    pub total: f64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

impl From<Duration> for ElapsedTime {
    fn from(duration: Duration) -> Self {
        let whole = duration.as_secs();
        let fraction = f64::from(duration.subsec_nanos()) * 1e-9;
        ElapsedTime {
            total: duration.as_secs_f64(),
            days: whole / SECONDS_PER_DAY,
            hours: whole % SECONDS_PER_DAY / SECONDS_PER_HOUR,
            minutes: whole % SECONDS_PER_HOUR / SECONDS_PER_MINUTE,
            seconds: (whole % SECONDS_PER_MINUTE) as f64 + fraction,
        }
    }
}

/// `3725.5 s (1 hours 2 min 5.5 seconds)`；不足一分钟时只显示总秒数
impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} s", self.total)?;
        if self.days == 0 && self.hours == 0 && self.minutes == 0 {
            return Ok(());
        }

        f.write_str(" (")?;
        if self.days > 0 {
            write!(f, "{} days ", self.days)?;
        }
        if self.days > 0 || self.hours > 0 {
            write!(f, "{} hours ", self.hours)?;
        }
        write!(f, "{} min {:.1} seconds)", self.minutes, self.seconds)
    }
}

/// 文件大小：`<bytes> bytes (<x> MB)`，≥ 1e9 字节时使用 GB
pub fn format_size(bytes: u64) -> String {
    const MB: f64 = 1e6;
    const GB: f64 = 1e9;

    let size = bytes as f64;
    if size >= GB {
        format!("{} bytes ({:.1} GB)", bytes, size / GB)
    } else {
        format!("{} bytes ({:.1} MB)", bytes, size / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_durations() {
        let elapsed = ElapsedTime::from(Duration::from_millis(12_340));
        assert_eq!(elapsed.minutes, 0);
        assert_eq!(elapsed.to_string(), "12.3 s");
    }

    #[test]
    fn test_breakdown() {
        let elapsed = ElapsedTime::from(Duration::from_millis(90_061_500));
        assert_eq!(elapsed.days, 1);
        assert_eq!(elapsed.hours, 1);
        assert_eq!(elapsed.minutes, 1);
        assert!((elapsed.seconds - 1.5).abs() < 1e-9);
        assert_eq!(
            elapsed.to_string(),
            "90061.5 s (1 days 1 hours 1 min 1.5 seconds)"
        );
    }

    #[test]
    fn test_hours_without_days() {
        let elapsed = ElapsedTime::from(Duration::from_secs(3_725));
        assert_eq!(elapsed.to_string(), "3725.0 s (1 hours 2 min 5.0 seconds)");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2_500_000), "2500000 bytes (2.5 MB)");
        assert_eq!(format_size(1_000_000_000), "1000000000 bytes (1.0 GB)");
        assert_eq!(format_size(0), "0 bytes (0.0 MB)");
    }
}
