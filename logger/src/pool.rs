//! 로그 레코드 풀
//!
//! 지속적인 부하에서 레코드와 메시지 버퍼의 재할당을 줄이기 위한 고정 크기 free-list입니다.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::formatter::{LogLevel, LogRecord};

/// 풀에 다시 넣을 메시지 버퍼의 최대 용량 (64KB)
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// 레코드 풀 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 새로 할당된 레코드 수
    pub total_allocated: u64,
    /// 재사용된 레코드 수
    pub total_reused: u64,
    /// 현재 풀에 대기 중인 레코드 수
    pub idle: usize,
}

/// 레코드 풀
///
/// 생산자 여러 개와 워커 하나가 동시에 접근해도 안전합니다.
pub struct RecordPool {
    pool: ArrayQueue<LogRecord>,
    total_allocated: AtomicU64,
    total_reused: AtomicU64,
}

impl RecordPool {
    pub fn new(max_idle: usize) -> Self {
        Self {
            pool: ArrayQueue::new(max_idle.max(1)),
            total_allocated: AtomicU64::new(0),
            total_reused: AtomicU64::new(0),
        }
    }

    /// 레코드 대여
    ///
    /// 풀이 비어 있으면 새로 할당합니다. 반환된 레코드는 호출자가 단독 소유합니다.
    pub fn acquire(&self) -> LogRecord {
        match self.pool.pop() {
            Some(record) => {
                self.total_reused.fetch_add(1, Ordering::Relaxed);
                record
            }
            None => {
                self.total_allocated.fetch_add(1, Ordering::Relaxed);
                LogRecord::new(LogLevel::Info, String::new())
            }
        }
    }

    /// 레코드 반환
    ///
    /// 풀이 가득 찼거나 버퍼가 너무 크면 폐기합니다.
    pub fn release(&self, mut record: LogRecord) {
        if record.message.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        record.reset();
        // 풀이 가득 찬 경우 레코드 폐기
        let _ = self.pool.push(record);
    }

    /// 풀 통계 조회
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            idle: self.pool.len(),
        }
    }
}
