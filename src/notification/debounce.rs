// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Debounced policy persistence
//!
//! One background task per pipeline holds the latest policy snapshot and
//! writes it once edits have been quiet for the debounce window. Every new
//! snapshot restarts the window. Failed writes are reported, never retried.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::NotificationPolicies;
use crate::config::NotificationConfig;
use crate::errors::{StagegraphError, StagegraphResult};

/// Quiescence window used when none is configured
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Destination of flushed policy snapshots
#[async_trait]
pub trait PolicySink: Send + Sync {
    async fn save_policies(
        &self,
        pipeline_id: &str,
        policies: &NotificationPolicies,
    ) -> StagegraphResult<()>;
}

/// Outcome of a timed flush
#[derive(Debug)]
pub struct FlushReport {
    pub pipeline_id: String,
    /// Number of node policies in the snapshot
    pub policies: usize,
    /// Snapshot matched the last successful write and was not sent
    pub skipped: bool,
    pub result: StagegraphResult<()>,
}

enum Command {
    Stage(NotificationPolicies),
    Flush(oneshot::Sender<StagegraphResult<()>>),
}

/// Handle to a pipeline's debounced saver
pub struct PolicySaver {
    pipeline_id: String,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PolicySaver {
    /// Start the saver task with the window from project configuration
    pub fn from_config(
        pipeline_id: impl Into<String>,
        sink: Arc<dyn PolicySink>,
        config: &NotificationConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FlushReport>) {
        Self::spawn(pipeline_id, sink, config.debounce_window())
    }

    /// Start the saver task for one pipeline
    ///
    /// Timed flush outcomes arrive on the returned receiver.
    pub fn spawn(
        pipeline_id: impl Into<String>,
        sink: Arc<dyn PolicySink>,
        window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FlushReport>) {
        let pipeline_id = pipeline_id.into();
        let (commands, rx) = mpsc::unbounded_channel();
        let (reports, reports_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            pipeline_id: pipeline_id.clone(),
            sink,
            reports,
            last_written: None,
        };
        let task = tokio::spawn(worker.run(rx, window));

        (
            Self {
                pipeline_id,
                commands,
                task,
            },
            reports_rx,
        )
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Queue the latest snapshot and restart the quiescence window
    pub fn schedule(&self, policies: NotificationPolicies) -> StagegraphResult<()> {
        self.commands
            .send(Command::Stage(policies))
            .map_err(|_| self.stopped())
    }

    /// Write any pending snapshot immediately
    pub async fn flush_now(&self) -> StagegraphResult<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| self.stopped())?;
        response.await.map_err(|_| self.stopped())?
    }

    /// Stop the task, writing any pending snapshot first
    pub async fn shutdown(self) -> StagegraphResult<()> {
        let Self { commands, task, .. } = self;
        drop(commands);
        task.await.map_err(|e| StagegraphError::Store {
            message: format!("policy saver task failed: {}", e),
        })
    }

    fn stopped(&self) -> StagegraphError {
        StagegraphError::Store {
            message: format!("policy saver for '{}' has stopped", self.pipeline_id),
        }
    }
}

struct Worker {
    pipeline_id: String,
    sink: Arc<dyn PolicySink>,
    reports: mpsc::UnboundedSender<FlushReport>,
    last_written: Option<blake3::Hash>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, window: Duration) {
        let mut pending: Option<NotificationPolicies> = None;

        loop {
            let command = if pending.is_some() {
                tokio::select! {
                    command = commands.recv() => command,
                    _ = tokio::time::sleep(window) => {
                        if let Some(snapshot) = pending.take() {
                            self.flush(snapshot).await;
                        }
                        continue;
                    }
                }
            } else {
                commands.recv().await
            };

            match command {
                Some(Command::Stage(snapshot)) => pending = Some(snapshot),
                Some(Command::Flush(reply)) => {
                    let result = match pending.take() {
                        Some(snapshot) => self.write(&snapshot).await.map(|_| ()),
                        None => Ok(()),
                    };
                    let _ = reply.send(result);
                }
                None => {
                    if let Some(snapshot) = pending.take() {
                        self.flush(snapshot).await;
                    }
                    break;
                }
            }
        }

        tracing::debug!(pipeline = %self.pipeline_id, "policy saver stopped");
    }

    /// Timed flush: write and report
    async fn flush(&mut self, snapshot: NotificationPolicies) {
        let (skipped, result) = match self.write(&snapshot).await {
            Ok(written) => (!written, Ok(())),
            Err(e) => {
                tracing::warn!(pipeline = %self.pipeline_id, error = %e, "failed to save notification policies");
                (false, Err(e))
            }
        };

        let _ = self.reports.send(FlushReport {
            pipeline_id: self.pipeline_id.clone(),
            policies: snapshot.len(),
            skipped,
            result,
        });
    }

    /// Returns whether the sink was called
    async fn write(&mut self, snapshot: &NotificationPolicies) -> StagegraphResult<bool> {
        let fingerprint = blake3::hash(&serde_json::to_vec(snapshot)?);
        if self.last_written == Some(fingerprint) {
            tracing::debug!(pipeline = %self.pipeline_id, "policies unchanged, skipping save");
            return Ok(false);
        }

        self.sink.save_policies(&self.pipeline_id, snapshot).await?;
        self.last_written = Some(fingerprint);
        tracing::debug!(pipeline = %self.pipeline_id, policies = snapshot.len(), "saved notification policies");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Channel, NotificationPolicy, Outcome, PolicyUpdate};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, NotificationPolicies)>>,
    }

    impl RecordingSink {
        fn writes(&self) -> Vec<(String, NotificationPolicies)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PolicySink for RecordingSink {
        async fn save_policies(
            &self,
            pipeline_id: &str,
            policies: &NotificationPolicies,
        ) -> StagegraphResult<()> {
            self.writes
                .lock()
                .unwrap()
                .push((pipeline_id.to_string(), policies.clone()));
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl PolicySink for FailingSink {
        async fn save_policies(&self, _: &str, _: &NotificationPolicies) -> StagegraphResult<()> {
            Err(StagegraphError::Store {
                message: "backend unavailable".into(),
            })
        }
    }

    fn snapshot(slack: bool) -> NotificationPolicies {
        let mut policies = NotificationPolicies::new();
        policies.update(
            &"node-1".into(),
            PolicyUpdate::Channel {
                outcome: Outcome::Success,
                channel: Channel::Slack,
                enabled: slack,
            },
        );
        policies
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_write() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, mut reports) = PolicySaver::spawn("web", sink.clone(), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(false)).unwrap();
        saver.schedule(NotificationPolicies::new()).unwrap();
        saver.schedule(snapshot(true)).unwrap();

        tokio::time::sleep(ms(1100)).await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "web");
        assert_eq!(writes[0].1, snapshot(true));

        let report = reports.recv().await.unwrap();
        assert!(report.result.is_ok());
        assert_eq!(report.policies, 1);
        assert!(!report.skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_edit_restarts_window() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, _reports) = PolicySaver::spawn("web", sink.clone(), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(false)).unwrap();
        tokio::time::sleep(ms(600)).await;
        saver.schedule(snapshot(true)).unwrap();
        tokio::time::sleep(ms(600)).await;

        assert!(sink.writes().is_empty(), "window must restart on each edit");

        tokio::time::sleep(ms(500)).await;
        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, snapshot(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_is_reported() {
        let (saver, mut reports) = PolicySaver::spawn("web", Arc::new(FailingSink), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(true)).unwrap();
        let report = reports.recv().await.unwrap();

        assert_eq!(report.pipeline_id, "web");
        assert!(matches!(report.result, Err(StagegraphError::Store { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_writes_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, _reports) = PolicySaver::spawn("web", sink.clone(), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(true)).unwrap();
        saver.flush_now().await.unwrap();
        assert_eq!(sink.writes().len(), 1);

        // Nothing left pending after an explicit flush
        tokio::time::sleep(ms(2000)).await;
        assert_eq!(sink.writes().len(), 1);

        // Flushing with nothing pending is a no-op
        saver.flush_now().await.unwrap();
        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_surfaces_errors() {
        let (saver, _reports) = PolicySaver::spawn("web", Arc::new(FailingSink), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(true)).unwrap();
        assert!(saver.flush_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_snapshot() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, _reports) = PolicySaver::spawn("web", sink.clone(), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(true)).unwrap();
        saver.shutdown().await.unwrap();

        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_snapshot_is_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, mut reports) = PolicySaver::spawn("web", sink.clone(), DEFAULT_DEBOUNCE);

        saver.schedule(snapshot(true)).unwrap();
        tokio::time::sleep(ms(1100)).await;
        saver.schedule(snapshot(true)).unwrap();
        tokio::time::sleep(ms(1100)).await;

        assert_eq!(sink.writes().len(), 1);
        assert!(!reports.recv().await.unwrap().skipped);
        assert!(reports.recv().await.unwrap().skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_window() {
        let sink = Arc::new(RecordingSink::default());
        let (saver, _reports) = PolicySaver::spawn("web", sink.clone(), ms(200));

        saver
            .schedule({
                let mut p = NotificationPolicies::new();
                p.set("node-3".into(), NotificationPolicy::default());
                p
            })
            .unwrap();
        tokio::time::sleep(ms(250)).await;

        assert_eq!(sink.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_window_sets_flush_timing() {
        let config: NotificationConfig = serde_yaml::from_str("debounce_ms: 200").unwrap();
        let fast = Arc::new(RecordingSink::default());
        let (fast_saver, _fast_reports) = PolicySaver::from_config("fast", fast.clone(), &config);

        let slow = Arc::new(RecordingSink::default());
        let (slow_saver, _slow_reports) =
            PolicySaver::from_config("slow", slow.clone(), &NotificationConfig::default());

        fast_saver.schedule(snapshot(true)).unwrap();
        slow_saver.schedule(snapshot(true)).unwrap();
        tokio::time::sleep(ms(250)).await;

        assert_eq!(fast.writes().len(), 1);
        assert!(slow.writes().is_empty(), "default window is one second");

        tokio::time::sleep(ms(800)).await;
        assert_eq!(slow.writes().len(), 1);
    }
}
