//! 로그 싱크
//!
//! 포매팅된 로그 바이트를 실제 출력 대상으로 전달하는 싱크 인터페이스와
//! 콘솔/메모리 싱크 구현을 제공합니다. 파일 싱크는 `rotation` 모듈에 있습니다.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{LoggingError, Result};

/// 로그 싱크 인터페이스
///
/// 워커 태스크 하나가 등록 순서대로 호출하므로 동시 호출은 발생하지 않습니다.
#[async_trait]
pub trait LogSink: Send {
    /// 포매팅된 로그 한 건 작성
    async fn write_msg(&mut self, msg: &[u8]) -> Result<()>;

    /// 버퍼된 데이터를 출력 대상에 반영
    async fn flush(&mut self);

    /// 리소스 정리
    async fn close(&mut self);
}

/// 콘솔 싱크
pub struct ConsoleSink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl ConsoleSink {
    /// 표준 출력 싱크
    pub fn stdout() -> Self {
        Self::with_writer(tokio::io::stdout())
    }

    /// 표준 에러 싱크
    pub fn stderr() -> Self {
        Self::with_writer(tokio::io::stderr())
    }

    pub fn with_writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Box::new(writer),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn write_msg(&mut self, msg: &[u8]) -> Result<()> {
        self.writer
            .write_all(msg)
            .await
            .map_err(LoggingError::Console)?;
        if msg.last() != Some(&b'\n') {
            self.writer
                .write_all(b"\n")
                .await
                .map_err(LoggingError::Console)?;
        }
        Ok(())
    }

    async fn flush(&mut self) {
        let _ = self.writer.flush().await;
    }

    async fn close(&mut self) {
        let _ = self.writer.flush().await;
    }
}

/// 메모리 내 로그 싱크 (테스트/검사용)
pub struct MemorySink {
    handle: MemoryLogHandle,
}

/// 메모리 싱크 내용을 읽기 위한 핸들
///
/// 싱크를 로거에 넘긴 뒤에도 복제본으로 기록을 확인할 수 있습니다.
#[derive(Clone, Default)]
pub struct MemoryLogHandle {
    entries: Arc<Mutex<Vec<String>>>,
    flushes: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            handle: MemoryLogHandle::default(),
        }
    }

    /// 읽기용 핸들 반환
    pub fn handle(&self) -> MemoryLogHandle {
        self.handle.clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn write_msg(&mut self, msg: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(msg);
        let line = text.strip_suffix('\n').unwrap_or(&*text);
        self.handle.entries.lock().push(line.to_string());
        Ok(())
    }

    async fn flush(&mut self) {
        self.handle.flushes.fetch_add(1, Ordering::SeqCst);
    }

    async fn close(&mut self) {
        self.handle.closed.store(true, Ordering::SeqCst);
    }
}

impl MemoryLogHandle {
    /// 모든 로그 항목 반환
    pub fn get_logs(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// 로그 개수 반환
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 로그가 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// 로그 지우기
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// flush 호출 횟수
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// close 호출 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
