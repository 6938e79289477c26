//! 비동기 로깅 파이프라인
//!
//! 호출 스레드는 큐에 넣는 시간만 부담하고, 단일 백그라운드 워커가
//! 포매팅과 싱크(콘솔, 순환 파일 등) 전달을 처리합니다.
//!
//! # 주요 기능
//! - **레벨 필터링**: 최소 레벨 미만의 메시지는 할당 전에 버림
//! - **고정 크기 큐**: 큐가 가득 차면 생산자가 대기 (backpressure)
//! - **안전한 종료**: `stop()`은 큐에 남은 레코드를 모두 전달한 뒤 반환
//! - **날짜별 파일 순환**: `xxx.log.2006-01-02` 보관 및 만료 파일 자동 삭제
//!
//! # 사용 예시
//! ```no_run
//! use logger::{FileSink, LogLevel, Logger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let logger = Logger::with_console();
//!     logger.add_sink(FileSink::new("/tmp/logger_test.log").with_rotation(7));
//!     logger.set_level(LogLevel::Debug);
//!     logger.start();
//!
//!     logger.info("서버 시작").await;
//!     logger::log_warn!(logger, "연결 지연: {}ms", 120);
//!
//!     logger.stop().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod macros;
pub mod pool;
pub mod rotation;
pub mod system;
pub mod writer;

pub use config::LoggingConfig;
pub use error::{LoggingError, Result};
pub use formatter::{DefaultFormatter, LogFormatter, LogLevel, LogRecord};
pub use pool::{PoolStats, RecordPool};
pub use rotation::{Clock, FileSink, ManualClock, SystemClock};
pub use system::{Logger, LoggerState, LOG_MSG_BUFFER_SIZE};
pub use writer::{ConsoleSink, LogSink, MemoryLogHandle, MemorySink};

use std::sync::Arc;
use tracing::info;

/// 로깅 시스템 초기화 함수
///
/// 설정을 검증해 로거를 만들고 워커를 시작합니다. tokio 런타임 안에서 호출해야 합니다.
///
/// # Examples
/// ```no_run
/// use logger::{init_logging, LoggingConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let logger = init_logging(&LoggingConfig::from_env()).await?;
///     logger.info("서버 시작됨").await;
///     logger.stop().await;
///     Ok(())
/// }
/// ```
pub async fn init_logging(config: &LoggingConfig) -> Result<Arc<Logger>> {
    let logger = Arc::new(config.build_logger()?);
    logger.start();

    info!(
        level = %config.level,
        console = config.console,
        file = ?config.file_path,
        "로깅 시스템 초기화 완료"
    );
    Ok(logger)
}
