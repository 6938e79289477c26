//! 로깅 파이프라인 통합 테스트
//!
//! 로거, 싱크, 파일 순환을 함께 묶어 전체 흐름을 검증합니다.

use anyhow::Result;
use chrono::{Duration, Local, TimeZone};
use logger::{
    init_logging, log_debug, log_info, ConsoleSink, FileSink, LogLevel, Logger, LoggerState,
    LoggingConfig, ManualClock, MemorySink,
};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncReadExt;

fn noon(y: i32, m: u32, d: u32) -> chrono::DateTime<Local> {
    Local
        .with_ymd_and_hms(y, m, d, 12, 0, 0)
        .single()
        .expect("Test assertion failed")
}

/// 콘솔 싱크: Info 이상만 한 줄씩 출력되는지 확인
#[tokio::test]
async fn test_console_output_respects_minimum_level() -> Result<()> {
    let (client, mut server) = tokio::io::duplex(4096);
    let logger = Logger::new();
    logger.add_sink(ConsoleSink::with_writer(client));
    logger.set_level(LogLevel::Info);
    logger.set_call_depth(0);
    logger.start();

    logger.debug("x").await;
    log_info!(logger, "y {}", 1);
    logger.stop().await;

    // 싱크를 해제해 쓰기 쪽을 닫음
    logger.clear_sinks();
    let mut output = String::new();
    server.read_to_string(&mut output).await?;

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].ends_with("[INFO] y 1"));
    assert!(!output.contains("] x"));

    Ok(())
}

/// 모든 싱크가 같은 순서로 정확히 한 번씩 받는지 확인
#[tokio::test]
async fn test_every_sink_receives_every_message_once() -> Result<()> {
    let first = MemorySink::new();
    let second = MemorySink::new();
    let (first_logs, second_logs) = (first.handle(), second.handle());

    let logger = Logger::new();
    logger.add_sink(first);
    logger.add_sink(second);
    logger.start();

    for i in 0..64 {
        logger.warn(format!("event {}", i)).await;
    }
    logger.stop().await;

    let expected: Vec<String> = (0..64).map(|i| format!("event {}", i)).collect();
    for logs in [first_logs.get_logs(), second_logs.get_logs()] {
        let messages: Vec<String> = logs
            .iter()
            .map(|line| line.rsplit("] ").next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(messages, expected);
    }
    assert!(first_logs.is_closed());
    assert!(second_logs.is_closed());

    Ok(())
}

/// 파이프라인을 통한 날짜 변경 순환
#[tokio::test]
async fn test_pipeline_rotates_file_on_day_change() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let log_path = temp_dir.path().join("service.log");
    let expired = temp_dir.path().join("service.log.2024-02-20");
    let recent = temp_dir.path().join("service.log.2024-03-07");
    fs::write(&expired, "expired\n").await?;
    fs::write(&recent, "recent\n").await?;

    let clock = Arc::new(ManualClock::new(noon(2024, 3, 9)));
    let logger = Logger::new();
    logger.add_sink(
        FileSink::new(&log_path)
            .with_rotation(5)
            .with_clock(clock.clone()),
    );
    logger.start();

    logger.info("written on day one").await;
    logger.flush().await;

    clock.advance(Duration::days(1));
    logger.info("written on day two").await;

    // stop은 정리 태스크 완료까지 대기
    logger.stop().await;

    let rotated = fs::read_to_string(temp_dir.path().join("service.log.2024-03-09")).await?;
    assert!(rotated.contains("written on day one"));
    assert!(!rotated.contains("written on day two"));

    let active = fs::read_to_string(&log_path).await?;
    assert_eq!(active.lines().count(), 1);
    assert!(active.contains("written on day two"));

    assert!(!expired.exists());
    assert!(recent.exists());

    Ok(())
}

/// 정지 후 재시작이 독립적인 수명 주기로 동작하는지 확인
#[tokio::test]
async fn test_restart_with_file_sink() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let log_path = temp_dir.path().join("restart.log");

    let logger = Logger::new();
    logger.add_sink(FileSink::new(&log_path));

    for round in 0..2 {
        assert!(logger.start());
        assert_eq!(logger.state(), LoggerState::Running);
        logger.error(format!("round {}", round)).await;
        assert!(logger.stop().await);
        assert_eq!(logger.state(), LoggerState::Stopped);

        // 정지 중 기록은 버려짐
        logger.error("dropped").await;
    }

    let content = fs::read_to_string(&log_path).await?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[ERROR] round 0"));
    assert!(lines[1].ends_with("[ERROR] round 1"));

    Ok(())
}

/// 설정 기반 초기화
#[tokio::test]
async fn test_init_logging_from_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let log_path = temp_dir.path().join("logs").join("app.log");

    let config = LoggingConfig {
        level: LogLevel::Warn,
        call_depth: 1,
        queue_capacity: 32,
        console: false,
        file_path: Some(log_path.clone()),
        rotate: true,
        retention_days: 3,
    };
    let logger = init_logging(&config).await?;
    assert!(logger.is_running());

    logger.info("below minimum").await;
    logger.warn("configured warning").await;
    let line = line!() - 1;
    logger.stop().await;

    let content = fs::read_to_string(&log_path).await?;
    assert!(!content.contains("below minimum"));
    assert!(content.contains(&format!("[WARN] [{}:{}] configured warning", file!(), line)));

    Ok(())
}

/// 표시 횟수를 세는 값
struct CountingDisplay(Arc<AtomicUsize>);

impl fmt::Display for CountingDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fetch_add(1, Ordering::SeqCst);
        f.write_str("counted")
    }
}

/// 매크로는 레벨 미달 시 포매팅하지 않음
#[tokio::test]
async fn test_macros_skip_formatting_below_minimum() -> Result<()> {
    let sink = MemorySink::new();
    let logs = sink.handle();
    let logger = Arc::new(Logger::new());
    logger.add_sink(sink);
    logger.set_level(LogLevel::Info);
    logger.start();

    let counter = Arc::new(AtomicUsize::new(0));
    log_debug!(logger, "{}", CountingDisplay(counter.clone()));
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    log_info!(logger, "{}", CountingDisplay(counter.clone()));
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    logger.stop().await;
    assert_eq!(logs.len(), 1);
    assert!(logs.get_logs()[0].ends_with("[INFO] counted"));

    Ok(())
}

/// 실행 전 flush/stop은 아무 일도 하지 않음
#[tokio::test]
async fn test_lifecycle_misuse_is_noop() -> Result<()> {
    let sink = MemorySink::new();
    let logs = sink.handle();
    let logger = Logger::new();
    logger.add_sink(sink);

    logger.flush().await;
    assert!(!logger.stop().await);
    logger.fatal("never delivered").await;

    assert!(logs.is_empty());
    assert_eq!(logs.flush_count(), 0);
    assert!(!logs.is_closed());

    Ok(())
}
