//! 로깅 설정 관리
//!
//! 최소 레벨, 큐 크기, 싱크 구성 등 로거 생성 파라미터를 담당합니다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{LoggingError, Result};
use crate::formatter::{DefaultFormatter, LogLevel};
use crate::rotation::FileSink;
use crate::system::{Logger, LOG_MSG_BUFFER_SIZE};
use crate::writer::{ConsoleSink, LogSink};

/// 로깅 시스템 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 최소 로그 레벨 (기본값: Info)
    pub level: LogLevel,

    /// 호출 위치 수집 깊이, 0이면 수집 안 함 (기본값: 0)
    pub call_depth: u32,

    /// 비동기 큐 크기 (기본값: 1024)
    pub queue_capacity: usize,

    /// 표준 출력 사용 여부 (기본값: true)
    pub console: bool,

    /// 로그 파일 경로 (기본값: 없음)
    pub file_path: Option<PathBuf>,

    /// 날짜별 파일 순환 여부 (기본값: false)
    pub rotate: bool,

    /// 순환 파일 보관 일수 (기본값: 7일)
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            call_depth: 0,
            queue_capacity: LOG_MSG_BUFFER_SIZE,
            console: true,
            file_path: None,
            rotate: false,
            retention_days: 7,
        }
    }
}

impl LoggingConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                config.level = level;
            }
        }

        if let Ok(val) = std::env::var("LOG_CALL_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.call_depth = depth;
            }
        }

        if let Ok(val) = std::env::var("LOG_QUEUE_SIZE") {
            if let Ok(size) = val.parse() {
                config.queue_capacity = size;
            }
        }

        if let Ok(val) = std::env::var("LOG_CONSOLE") {
            config.console = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("LOG_FILE_PATH") {
            if !val.trim().is_empty() {
                config.file_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("LOG_ROTATE") {
            config.rotate = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("LOG_RETENTION_DAYS") {
            if let Ok(days) = val.parse() {
                config.retention_days = days;
            }
        }

        config
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LoggingError::Config(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.rotate && self.file_path.is_none() {
            return Err(LoggingError::Config(
                "rotate requires file_path".to_string(),
            ));
        }

        if self.rotate && self.retention_days == 0 {
            return Err(LoggingError::Config(
                "retention_days must be greater than 0 when rotate is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// 설정에 맞는 싱크 목록 생성 (콘솔 → 파일 순서)
    pub fn build_sinks(&self) -> Vec<Box<dyn LogSink>> {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if self.console {
            sinks.push(Box::new(ConsoleSink::stdout()));
        }
        if let Some(path) = &self.file_path {
            let mut sink = FileSink::new(path);
            if self.rotate {
                sink = sink.with_rotation(self.retention_days);
            }
            sinks.push(Box::new(sink));
        }
        sinks
    }

    /// 정지 상태의 로거 생성
    pub fn build_logger(&self) -> Result<Logger> {
        self.validate()?;
        let logger = Logger::with_capacity(self.queue_capacity);
        logger.configure(
            self.level,
            self.call_depth,
            Arc::new(DefaultFormatter),
            self.build_sinks(),
        );
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.call_depth, 0);
        assert_eq!(config.queue_capacity, 1024);
        assert!(config.console);
        assert!(config.file_path.is_none());
        assert!(!config.rotate);
        assert_eq!(config.retention_days, 7);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.queue_capacity = 0;
        assert!(config.validate().is_err());

        config.queue_capacity = 16;
        config.rotate = true;
        assert!(config.validate().is_err());

        config.file_path = Some(PathBuf::from("/tmp/app.log"));
        assert!(config.validate().is_ok());

        config.retention_days = 0;
        assert!(matches!(config.validate(), Err(LoggingError::Config(_))));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("LOG_LEVEL", "warn");
        std::env::set_var("LOG_CALL_DEPTH", "2");
        std::env::set_var("LOG_QUEUE_SIZE", "64");
        std::env::set_var("LOG_CONSOLE", "false");
        std::env::set_var("LOG_FILE_PATH", "/tmp/env.log");
        std::env::set_var("LOG_ROTATE", "TRUE");
        std::env::set_var("LOG_RETENTION_DAYS", "not-a-number");

        let config = LoggingConfig::from_env();

        for key in [
            "LOG_LEVEL",
            "LOG_CALL_DEPTH",
            "LOG_QUEUE_SIZE",
            "LOG_CONSOLE",
            "LOG_FILE_PATH",
            "LOG_ROTATE",
            "LOG_RETENTION_DAYS",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.call_depth, 2);
        assert_eq!(config.queue_capacity, 64);
        assert!(!config.console);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/env.log")));
        assert!(config.rotate);
        assert_eq!(config.retention_days, 7);
    }

    #[test]
    fn test_build_sinks_order() {
        let config = LoggingConfig {
            console: true,
            file_path: Some(PathBuf::from("/tmp/never-opened.log")),
            ..Default::default()
        };
        assert_eq!(config.build_sinks().len(), 2);

        let config = LoggingConfig {
            console: false,
            ..Default::default()
        };
        assert!(config.build_sinks().is_empty());
    }

    #[test]
    fn test_build_logger_applies_settings() {
        let config = LoggingConfig {
            level: LogLevel::Error,
            call_depth: 1,
            queue_capacity: 8,
            console: false,
            ..Default::default()
        };
        let logger = config.build_logger().expect("Test assertion failed");
        assert_eq!(logger.level(), LogLevel::Error);
        assert_eq!(logger.call_depth(), 1);
        assert_eq!(logger.capacity(), 8);

        let invalid = LoggingConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(invalid.build_logger().is_err());
    }
}
