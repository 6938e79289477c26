//! 로그 포매터
//!
//! 로그 레벨, 로그 레코드 정의와 레코드를 바이트열로 변환하는 포매터를 담당합니다.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 레벨 이름 테이블 (rank 순서)
const LEVEL_NAMES: [&str; 5] = ["DEBUG", "INFO", "WARN", "ERROR", "FATAL"];

/// 로그 레벨 열거형
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// 디버깅 정보
    Debug = 0,
    /// 일반 정보
    Info = 1,
    /// 경고 상황
    Warn = 2,
    /// 오류 상황
    Error = 3,
    /// 시스템 중단 수준 오류
    Fatal = 4,
}

impl LogLevel {
    /// 레벨 순위 (Debug = 0 ... Fatal = 4)
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// 순위에서 레벨 복원
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Error),
            4 => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    /// 로그 레벨을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        LEVEL_NAMES[self.rank() as usize]
    }

    /// 임의의 순위 값에 대한 레이블. 범위를 벗어나면 `UNKNOWN`.
    pub fn label_for_rank(rank: i32) -> &'static str {
        usize::try_from(rank)
            .ok()
            .and_then(|idx| LEVEL_NAMES.get(idx).copied())
            .unwrap_or("UNKNOWN")
    }

    /// 전체 레벨 목록 (낮은 순위부터)
    pub fn all() -> [LogLevel; 5] {
        [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
        ]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(()),
        }
    }
}

/// 포매팅 전의 로그 레코드
///
/// 생산자가 풀에서 꺼내 채운 뒤 큐로 이동시키고, 워커가 처리 후 풀에 반환합니다.
/// 소유권 이동으로만 전달되므로 동시에 두 곳에서 참조되지 않습니다.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub message: String,
    /// 호출 위치 파일 (call depth가 0이면 None)
    pub origin_file: Option<&'static str>,
    pub origin_line: Option<u32>,
}

impl LogRecord {
    /// 새 로그 레코드 생성
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
            origin_file: None,
            origin_line: None,
        }
    }

    /// 호출 위치 설정
    pub fn with_origin(mut self, file: &'static str, line: u32) -> Self {
        self.origin_file = Some(file);
        self.origin_line = Some(line);
        self
    }

    /// 풀 반환 전 초기화. 메시지 버퍼 용량은 유지합니다.
    pub(crate) fn reset(&mut self) {
        self.message.clear();
        self.origin_file = None;
        self.origin_line = None;
    }
}

/// 로그 포매터 인터페이스
///
/// 순수 함수여야 합니다: I/O 없이 레코드만으로 결과가 결정됩니다.
pub trait LogFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Vec<u8>;
}

/// 기본 텍스트 포매터
///
/// `2006-01-02 15:04:05 [INFO] [main.rs:90] the log message`
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl LogFormatter for DefaultFormatter {
    fn format(&self, record: &LogRecord) -> Vec<u8> {
        let origin_len = record.origin_file.map_or(0, |f| f.len() + 16);
        let mut buf = String::with_capacity(19 + 8 + origin_len + record.message.len());

        buf.push_str(&record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
        buf.push_str(" [");
        buf.push_str(record.level.as_str());
        buf.push_str("] ");
        if let Some(file) = record.origin_file {
            buf.push('[');
            buf.push_str(file);
            buf.push(':');
            buf.push_str(&record.origin_line.unwrap_or(0).to_string());
            buf.push_str("] ");
        }
        buf.push_str(&record.message);

        buf.into_bytes()
    }
}
