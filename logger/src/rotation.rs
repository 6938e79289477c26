//! 로그 파일 싱크 및 순환 관리
//!
//! 날짜가 바뀌면 현재 파일을 `xxx.log.2006-01-02` 형태로 보관하고 새 파일을 엽니다.
//! 순환이 일어날 때마다 보관 기간이 지난 파일을 백그라운드에서 정리합니다.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{LoggingError, Result};
use crate::writer::LogSink;

/// 순환 파일 이름에 붙는 날짜 형식
pub const ROTATE_DATE_FORMAT: &str = "%Y-%m-%d";

/// 현재 시각 공급자
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 수동으로 조작하는 시계 (테스트용)
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// 로그 파일 싱크
pub struct FileSink {
    /// 활성 로그 파일 경로
    path: PathBuf,
    /// 열린 파일 핸들 (첫 쓰기 시점에 열림)
    file: Option<File>,
    /// 현재 핸들을 연 시각
    opened_at: DateTime<Local>,
    /// 날짜별 순환 여부
    rotate_enabled: bool,
    /// 순환 파일 보관 일수 (0이면 순환하지 않음)
    retention_days: u32,
    /// 진행 중인 정리 태스크
    cleanup_tasks: Vec<JoinHandle<usize>>,
    clock: Arc<dyn Clock>,
}

impl FileSink {
    /// 새 파일 싱크 생성 (순환 비활성)
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            path: path.into(),
            file: None,
            opened_at: clock.now(),
            rotate_enabled: false,
            retention_days: 0,
            cleanup_tasks: Vec::new(),
            clock,
        }
    }

    /// 순환을 켜고 보관 일수 설정
    pub fn with_rotation(mut self, retention_days: u32) -> Self {
        self.rotate_enabled = true;
        self.retention_days = retention_days;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn enable_rotate(&mut self) {
        self.rotate_enabled = true;
    }

    pub fn disable_rotate(&mut self) {
        self.rotate_enabled = false;
    }

    pub fn set_rotate_max_days(&mut self, days: u32) {
        self.retention_days = days;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 지정한 날짜의 순환 파일 경로 (`<path>.YYYY-MM-DD`)
    pub fn rotated_path(&self, date: NaiveDate) -> PathBuf {
        rotated_path_for(&self.path, date)
    }

    /// 로그 파일 열기 (디렉토리 포함)
    async fn open_log_file(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LoggingError::io("로그 디렉토리 생성 실패", parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o660);

        let file = options
            .open(&self.path)
            .await
            .map_err(|e| LoggingError::io("로그 파일 열기 실패", &self.path, e))?;

        self.file = Some(file);
        self.opened_at = self.clock.now();
        Ok(())
    }

    fn is_need_rotate(&self) -> bool {
        if !self.rotate_enabled || self.retention_days == 0 || self.file.is_none() {
            return false;
        }
        self.clock.now().date_naive() != self.opened_at.date_naive()
    }

    /// 로그 파일 순환
    ///
    /// 현재 파일을 닫고 연 날짜를 붙여 이름을 바꾼 뒤 새 파일을 엽니다.
    /// 어느 단계든 실패하면 핸들 없이 에러를 반환하고, 다음 쓰기에서 다시 엽니다.
    pub async fn rotate(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| LoggingError::io("로그 파일 플러시 실패", &self.path, e))?;
        }

        let rotated = self.rotated_path(self.opened_at.date_naive());
        fs::rename(&self.path, &rotated)
            .await
            .map_err(|e| LoggingError::io("로그 파일 순환 실패", &self.path, e))?;

        self.open_log_file().await?;

        if self.retention_days > 0 {
            self.cleanup_tasks.retain(|task| !task.is_finished());
            let task = tokio::spawn(cleanup_expired(
                self.path.clone(),
                self.retention_days,
                self.clock.now(),
            ));
            self.cleanup_tasks.push(task);
        }

        debug!(
            path = %self.path.display(),
            rotated = %rotated.display(),
            "로그 파일 순환 완료"
        );
        Ok(())
    }

    /// 진행 중인 정리 태스크가 모두 끝날 때까지 대기
    ///
    /// 삭제된 파일 수의 합을 반환합니다.
    pub async fn wait_cleanup(&mut self) -> usize {
        let mut deleted = 0;
        for task in self.cleanup_tasks.drain(..) {
            match task.await {
                Ok(count) => deleted += count,
                Err(e) => warn!(error = %e, "로그 정리 태스크 비정상 종료"),
            }
        }
        deleted
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn write_msg(&mut self, msg: &[u8]) -> Result<()> {
        if msg.is_empty() {
            return Ok(());
        }

        if self.file.is_none() {
            self.open_log_file().await?;
        }

        if self.is_need_rotate() {
            self.rotate().await?;
        }

        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        // 파일에는 한 줄에 레코드 하나
        let result = if msg.ends_with(b"\n") {
            file.write_all(msg).await
        } else {
            let mut line = Vec::with_capacity(msg.len() + 1);
            line.extend_from_slice(msg);
            line.push(b'\n');
            file.write_all(&line).await
        };
        result.map_err(|e| LoggingError::io("로그 데이터 작성 실패", &self.path, e))
    }

    async fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush().await {
                warn!(path = %self.path.display(), error = %e, "로그 파일 플러시 실패");
                return;
            }
            if let Err(e) = file.sync_all().await {
                warn!(path = %self.path.display(), error = %e, "로그 파일 동기화 실패");
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush().await {
                warn!(path = %self.path.display(), error = %e, "로그 파일 닫기 전 플러시 실패");
            }
        }
        self.wait_cleanup().await;
    }
}

fn rotated_path_for(path: &Path, date: NaiveDate) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(date.format(ROTATE_DATE_FORMAT).to_string());
    PathBuf::from(name)
}

/// 보관 기간이 지난 순환 파일 정리
///
/// 로그 파일과 같은 디렉토리의 일반 파일 중 마지막 확장자가 `YYYY-MM-DD`로
/// 해석되는 파일을 검사합니다. 하위 디렉토리는 보지 않으며 개별 항목의 실패는 무시합니다.
async fn cleanup_expired(path: PathBuf, retention_days: u32, now: DateTime<Local>) -> usize {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "로그 디렉토리 읽기 실패");
            return 0;
        }
    };

    let mut deleted = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "디렉토리 항목 읽기 실패");
                break;
            }
        };

        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let entry_path = entry.path();
        let Some(date) = entry_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| NaiveDate::parse_from_str(ext, ROTATE_DATE_FORMAT).ok())
        else {
            continue;
        };

        if !is_expired(date, retention_days, now) {
            continue;
        }

        match fs::remove_file(&entry_path).await {
            Ok(()) => {
                deleted += 1;
                debug!(path = %entry_path.display(), "오래된 로그 파일 삭제됨");
            }
            Err(e) => debug!(path = %entry_path.display(), error = %e, "로그 파일 삭제 실패"),
        }
    }

    deleted
}

/// 파일 날짜 자정 + 보관 일수가 현재 시각보다 이전이면 만료
fn is_expired(date: NaiveDate, retention_days: u32, now: DateTime<Local>) -> bool {
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return false;
    };
    let start = start_of_day(Local.from_local_datetime(&midnight), midnight);
    start + Duration::days(i64::from(retention_days)) < now
}

/// 현지 자정이 존재하지 않으면 (서머타임 전환 구간) UTC 자정으로 대체
fn start_of_day(local: LocalResult<DateTime<Local>>, midnight: NaiveDateTime) -> DateTime<Local> {
    local
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}
