//! 로깅 에러 정의
//!
//! 싱크 쓰기, 파일 열기/순환, 설정 검증 과정에서 발생하는 에러를 관리합니다.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 로깅 파이프라인 에러
#[derive(Error, Debug)]
pub enum LoggingError {
    /// 파일 I/O 실패 (열기, 쓰기, 이름 변경 등)
    #[error("{}: {}: {}", .context, .path.display(), .source)]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 콘솔 출력 실패
    #[error("콘솔 출력 실패: {0}")]
    Console(#[source] std::io::Error),

    /// 잘못된 설정값
    #[error("설정 오류: {0}")]
    Config(String),
}

impl LoggingError {
    pub(crate) fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        LoggingError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoggingError>;
