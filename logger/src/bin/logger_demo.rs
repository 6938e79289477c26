//! 로깅 파이프라인 사용 예제
//!
//! 콘솔 전용, 파일 전용, 콘솔 + 파일 구성을 차례로 실행합니다.
//! `LOG_FILE_PATH`로 파일 경로를 바꿀 수 있습니다 (기본값: /tmp/logger_test.log).

use anyhow::Result;
use logger::{
    init_logging, log_error, log_info, log_warn, FileSink, LogLevel, Logger, LoggingConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 싱크 에러 등 로거 자체의 운영 로그는 stderr로
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let file_path = std::env::var("LOG_FILE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp/logger_test.log"));

    println!("📝 예제 1: 콘솔 로거");
    console_logger_example().await;

    println!("\n📁 예제 2: 파일 로거 ({})", file_path.display());
    file_logger_example(&file_path).await;

    println!("\n🔀 예제 3: 콘솔 + 파일 (설정 기반)");
    both_file_and_console_example(&file_path).await?;

    Ok(())
}

async fn console_logger_example() {
    let logger = Logger::with_console();
    logger.set_call_depth(1);
    logger.set_level(LogLevel::Debug);
    logger.start();

    log_info!(logger, "info Msg, value:{}", 1);
    logger.error("error Msg without any format value").await;
    log_warn!(logger, "warn Msg, Value1:{}, Value2:{}", 100, "stringByFmt");

    logger.stop().await;
}

async fn file_logger_example(path: &std::path::Path) {
    let logger = Logger::new();
    logger.add_sink(FileSink::new(path).with_rotation(7));
    logger.set_call_depth(1);
    logger.set_level(LogLevel::Debug);
    logger.start();

    log_info!(logger, "info Msg, value:{}", 1);
    logger.error("error Msg without any format value").await;
    log_warn!(logger, "warn Msg, Value1:{}, Value2:{}", 100, "stringByFmt");

    logger.stop().await;
}

async fn both_file_and_console_example(path: &std::path::Path) -> Result<()> {
    let config = LoggingConfig {
        level: LogLevel::Debug,
        call_depth: 1,
        console: true,
        file_path: Some(path.to_path_buf()),
        rotate: true,
        ..LoggingConfig::from_env()
    };
    let logger = init_logging(&config).await?;

    log_info!(logger, "info Msg, value:{}", 1);
    log_error!(logger, "error Msg without any format value");
    log_warn!(logger, "warn Msg, Value1:{}, Value2:{}", 100, "stringByFmt");

    logger.flush().await;
    logger.stop().await;
    Ok(())
}
