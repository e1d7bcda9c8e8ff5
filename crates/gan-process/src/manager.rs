//! Bounded-concurrency subprocess pool: admission against
//! `maxConcurrent`, FIFO queueing with `queueTimeoutMs`, two-phase
//! termination (`SIGTERM` → `cleanupGraceMs` → `SIGKILL`), rolling
//! health metrics, and cooperative shutdown.

use crate::error::ProcessError;
use crate::exec::{ExecuteOutcome, ExecuteSpec, send_force_kill, send_graceful_terminate, spawn_child};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::{Semaphore, watch};
use tracing::{debug, warn};

/// Lifecycle state of one tracked process. `Exited` and `Killed` are
/// terminal; both release the call's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Queued,
    Starting,
    Running,
    Exited,
    TimingOut,
    Killing,
    Killed,
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessManagerConfig {
    pub max_concurrent: usize,
    pub default_timeout_ms: u64,
    pub cleanup_grace_ms: u64,
    pub queue_timeout_ms: u64,
    pub health_check_interval_ms: u64,
}

impl Default for ProcessManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            default_timeout_ms: 30_000,
            cleanup_grace_ms: 5_000,
            queue_timeout_ms: 30_000,
            health_check_interval_ms: 30_000,
        }
    }
}

const METRICS_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct Metrics {
    total: u64,
    successes: u64,
    failures: u64,
    durations_ms: VecDeque<u64>,
    last_execution: Option<DateTime<Utc>>,
}

impl Metrics {
    fn record(&mut self, success: bool, duration_ms: u64) {
        self.total += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.durations_ms.push_back(duration_ms);
        if self.durations_ms.len() > METRICS_WINDOW {
            self.durations_ms.pop_front();
        }
        self.last_execution = Some(Utc::now());
    }

    fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.successes as f64 / self.total as f64
    }

    fn average_duration_ms(&self) -> f64 {
        if self.durations_ms.is_empty() {
            return 0.0;
        }
        self.durations_ms.iter().sum::<u64>() as f64 / self.durations_ms.len() as f64
    }
}

/// Point-in-time health/metrics read, suitable for a status endpoint.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_duration_ms: f64,
    pub last_execution: Option<DateTime<Utc>>,
    pub healthy: bool,
    pub active: usize,
    pub queued: usize,
}

/// Sole owner of subprocess spawning for the judge.
pub struct ProcessManager {
    config: ProcessManagerConfig,
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    active: Arc<Mutex<HashMap<u64, ProcessState>>>,
    next_id: AtomicU64,
    metrics: Arc<Mutex<Metrics>>,
    shutdown_tx: watch::Sender<bool>,
}

impl ProcessManager {
    pub fn new(config: ProcessManagerConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            queued: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            metrics: Arc::new(Mutex::new(Metrics::default())),
            shutdown_tx,
            config,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn queued_count(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> HealthSnapshot {
        let metrics = self.metrics.lock().unwrap();
        HealthSnapshot {
            total: metrics.total,
            successes: metrics.successes,
            failures: metrics.failures,
            average_duration_ms: metrics.average_duration_ms(),
            last_execution: metrics.last_execution,
            healthy: metrics.total < 5 || metrics.success_rate() >= 0.80,
            active: self.active_count(),
            queued: self.queued_count(),
        }
    }

    /// Execute one subprocess call, queueing if the pool is saturated.
    pub async fn execute(&self, spec: ExecuteSpec) -> Result<ExecuteOutcome, ProcessError> {
        if self.is_shutdown() {
            return Err(ProcessError::ShutDown);
        }

        self.queued.fetch_add(1, Ordering::SeqCst);
        let queue_wait = Duration::from_millis(self.config.queue_timeout_ms);
        let acquired = tokio::time::timeout(queue_wait, self.semaphore.clone().acquire_owned()).await;
        self.queued.fetch_sub(1, Ordering::SeqCst);

        let permit = match acquired {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(ProcessError::ShutDown),
            Err(_) => return Err(ProcessError::QueueTimeout(queue_wait)),
        };

        if self.is_shutdown() {
            drop(permit);
            return Err(ProcessError::ShutDown);
        }

        let call_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.active.lock().unwrap().insert(call_id, ProcessState::Starting);

        let started = Instant::now();
        let mut child = match spawn_child(&spec).await {
            Ok(child) => child,
            Err(e) => {
                self.active.lock().unwrap().remove(&call_id);
                return Err(e);
            }
        };
        let pid = child.id();
        self.set_state(call_id, ProcessState::Running);

        let shutdown_rx = self.shutdown_tx.subscribe();
        let timeout = if spec.timeout.is_zero() {
            Duration::from_millis(self.config.default_timeout_ms)
        } else {
            spec.timeout
        };
        let cleanup_grace = Duration::from_millis(self.config.cleanup_grace_ms);

        let (stdout, stderr, exit_code, timed_out) =
            capture_with_deadline(&mut child, timeout, cleanup_grace, shutdown_rx, |s| {
                self.set_state(call_id, s)
            })
            .await;

        self.active.lock().unwrap().remove(&call_id);
        drop(permit);

        let duration = started.elapsed();
        let success = !timed_out && exit_code == 0;
        self.metrics
            .lock()
            .unwrap()
            .record(success, duration.as_millis() as u64);

        Ok(ExecuteOutcome {
            stdout,
            stderr,
            exit_code,
            duration,
            timed_out,
            pid,
        })
    }

    fn set_state(&self, call_id: u64, state: ProcessState) {
        if let Some(entry) = self.active.lock().unwrap().get_mut(&call_id) {
            *entry = state;
        }
    }

    /// Close the manager: reject new/queued calls, two-phase-terminate
    /// every active process concurrently, and resolve only once all of
    /// them have exited.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(true).is_err() {
            return;
        }
        self.semaphore.close();
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Byte-level capture loop: reads stdout/stderr until EOF while racing
/// against the call deadline and the manager-wide shutdown signal. On
/// either firing, sends `SIGTERM`, waits `cleanup_grace`, then `SIGKILL`
/// if the process is still alive, and resolves with whatever bytes were
/// captured so far.
async fn capture_with_deadline(
    child: &mut tokio::process::Child,
    timeout: Duration,
    cleanup_grace: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    mut on_state: impl FnMut(ProcessState),
) -> (Vec<u8>, Vec<u8>, i32, bool) {
    let mut stdout_reader = child.stdout.take().map(BufReader::new);
    let mut stderr_reader = child.stderr.take().map(BufReader::new);
    let mut stdout_done = stdout_reader.is_none();
    let mut stderr_done = stderr_reader.is_none();

    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];
    let mut watchdog = gan_resource::OutputWatchdog::new();

    let start = Instant::now();
    let mut killing = false;
    let mut timed_out = false;
    let mut kill_deadline = Instant::now();

    if *shutdown_rx.borrow() {
        killing = true;
        timed_out = true;
        on_state(ProcessState::TimingOut);
        send_graceful_terminate(child);
        on_state(ProcessState::Killing);
        kill_deadline = Instant::now() + cleanup_grace;
    }

    while !stdout_done || !stderr_done {
        let remaining = timeout.saturating_sub(start.elapsed());

        tokio::select! {
            biased;

            res = async { stdout_reader.as_mut().unwrap().read(&mut out_buf).await }, if !stdout_done => {
                match res {
                    Ok(0) | Err(_) => stdout_done = true,
                    Ok(n) => {
                        out.extend_from_slice(&out_buf[..n]);
                        watchdog.record_activity(n);
                    }
                }
            }
            res = async { stderr_reader.as_mut().unwrap().read(&mut err_buf).await }, if !stderr_done => {
                match res {
                    Ok(0) | Err(_) => stderr_done = true,
                    Ok(n) => {
                        err.extend_from_slice(&err_buf[..n]);
                        watchdog.record_activity(n);
                    }
                }
            }
            _ = shutdown_rx.changed(), if !killing => {
                // handled by the unconditional check below
            }
            _ = tokio::time::sleep(remaining), if !killing && remaining > Duration::ZERO => {
                killing = true;
                timed_out = true;
                let snap = watchdog.snapshot();
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    idle_for_ms = snap.idle_for.as_millis() as u64,
                    bytes_captured = snap.total_bytes,
                    "call deadline exceeded; sending SIGTERM"
                );
                on_state(ProcessState::TimingOut);
                send_graceful_terminate(child);
                on_state(ProcessState::Killing);
                kill_deadline = Instant::now() + cleanup_grace;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)), if killing => {
                if Instant::now() >= kill_deadline {
                    debug!("cleanup grace elapsed; sending SIGKILL");
                    send_force_kill(child);
                    on_state(ProcessState::Killed);
                }
            }
        }

        if !killing && *shutdown_rx.borrow() {
            killing = true;
            timed_out = true;
            on_state(ProcessState::TimingOut);
            send_graceful_terminate(child);
            on_state(ProcessState::Killing);
            kill_deadline = Instant::now() + cleanup_grace;
        }
    }

    let status = child.wait().await;
    let exit_code = if timed_out {
        124
    } else {
        status
            .ok()
            .and_then(|s| s.code())
            .unwrap_or_else(|| {
                warn!("process terminated by signal; reporting exit code 1");
                1
            })
    };
    if !timed_out {
        on_state(ProcessState::Exited);
    }

    (out, err, exit_code, timed_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn spec(program: &str, args: &[&str]) -> ExecuteSpec {
        ExecuteSpec {
            executable: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: None,
            env: Map::new(),
            stdin: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_execute_captures_stdout_and_exit_code() {
        let manager = ProcessManager::new(ProcessManagerConfig::default());
        let outcome = manager
            .execute(spec("/bin/echo", &["hello"]))
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(!outcome.timed_out);
        assert_eq!(String::from_utf8_lossy(&outcome.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_execute_reports_nonzero_exit_without_erroring() {
        let manager = ProcessManager::new(ProcessManagerConfig::default());
        let outcome = manager.execute(spec("/bin/false", &[])).await.unwrap();
        assert_ne!(outcome.exit_code, 0);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_deadline_triggers_timeout_and_kills_process() {
        let manager = ProcessManager::new(ProcessManagerConfig::default());
        let mut call = spec("/bin/sleep", &["5"]);
        call.timeout = Duration::from_millis(100);
        let outcome = manager.execute(call).await.unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.exit_code, 124);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_max_concurrent() {
        let manager = Arc::new(ProcessManager::new(ProcessManagerConfig {
            max_concurrent: 2,
            queue_timeout_ms: 10_000,
            ..Default::default()
        }));
        let mut handles = Vec::new();
        for _ in 0..6 {
            let m = manager.clone();
            handles.push(tokio::spawn(async move {
                let mut call = spec("/bin/sleep", &["0.2"]);
                call.timeout = Duration::from_secs(5);
                m.execute(call).await
            }));
        }
        // active_count is observable while the batch is in flight.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(manager.active_count() <= 2);
        for h in handles {
            h.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_queue_timeout_when_pool_saturated() {
        let manager = Arc::new(ProcessManager::new(ProcessManagerConfig {
            max_concurrent: 1,
            queue_timeout_ms: 50,
            ..Default::default()
        }));
        let m2 = manager.clone();
        let blocker = tokio::spawn(async move {
            let mut call = spec("/bin/sleep", &["0.5"]);
            call.timeout = Duration::from_secs(5);
            m2.execute(call).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = manager.execute(spec("/bin/echo", &["late"])).await;
        assert!(matches!(result, Err(ProcessError::QueueTimeout(_))));
        blocker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_health_predicate_true_below_sample_floor() {
        let manager = ProcessManager::new(ProcessManagerConfig::default());
        manager.execute(spec("/bin/false", &[])).await.unwrap();
        assert!(manager.health().healthy);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_calls() {
        let manager = ProcessManager::new(ProcessManagerConfig::default());
        manager.shutdown().await;
        let result = manager.execute(spec("/bin/echo", &["x"])).await;
        assert!(matches!(result, Err(ProcessError::ShutDown)));
    }
}
