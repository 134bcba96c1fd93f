// Batch Purge Submitter: partitions the sorted file list and submits it batch by batch.

use std::ops::Range;

use tracing::{debug, error, info, warn};

use super::{AuditLog, PurgeApi, PurgeRequest};
use crate::config::PurgeOptions;
use crate::error::{BatchError, ConfigError};

/// Batch boundaries for a list of `len` files.
///
/// There are always `len / batch_size + 1` batch indices. Batch `i` covers the
/// half-open range `[i * batch_size, (i + 1) * batch_size)` clamped to `len`,
/// so when `len` is a multiple of `batch_size` the last index is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    len: usize,
    batch_size: usize,
}

impl BatchPlan {
    pub fn new(len: usize, batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self { len, batch_size })
    }

    pub fn batch_count(&self) -> usize {
        self.len / self.batch_size + 1
    }

    pub fn range(&self, index: usize) -> Range<usize> {
        let start = index.saturating_mul(self.batch_size).min(self.len);
        let end = start.saturating_add(self.batch_size).min(self.len);
        start..end
    }

    pub fn ranges(&self) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        (0..self.batch_count()).map(|index| (index, self.range(index)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    pub batches_total: usize,
    pub batches_submitted: usize,
    pub batches_skipped: usize,
    pub objects_purged: usize,
}

/// Sends batches to a [`PurgeApi`] one at a time, stopping at the first failure.
pub struct BatchSubmitter<A> {
    api: A,
    options: PurgeOptions,
    audit: Option<AuditLog>,
}

impl<A: PurgeApi> BatchSubmitter<A> {
    pub fn new(api: A, options: PurgeOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let audit = options.log_file.clone().map(AuditLog::new);
        Ok(Self {
            api,
            options,
            audit,
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &PurgeOptions {
        &self.options
    }

    /// Submit `files` (already sorted) in batches.
    ///
    /// Batches below `resume_from_batch` are skipped without being sent. The
    /// first failing batch ends the run; its index is the point to resume from.
    pub async fn submit(&self, files: &[String]) -> Result<SubmitSummary, BatchError> {
        let plan = BatchPlan {
            len: files.len(),
            batch_size: self.options.batch_size,
        };
        let resume_from = self.options.resume_from_batch.unwrap_or(0);
        let mut summary = SubmitSummary {
            batches_total: plan.batch_count(),
            ..Default::default()
        };

        if resume_from >= summary.batches_total && resume_from > 0 {
            warn!(
                resume_from,
                batches = summary.batches_total,
                "Resume point is past the last batch, nothing to submit"
            );
        }

        for (index, range) in plan.ranges() {
            if index < resume_from {
                debug!(batch = index, "Skipping batch before resume point");
                summary.batches_skipped += 1;
                continue;
            }
            if range.is_empty() {
                debug!(batch = index, "Batch is empty, nothing to submit");
                continue;
            }

            let request = PurgeRequest::urls(
                self.options.network,
                self.options.method,
                files[range].to_vec(),
            );
            info!(
                batch = index,
                batches = summary.batches_total,
                objects = request.objects.len(),
                method = %request.method,
                network = %request.network,
                "Submitting batch"
            );

            let response = match self.api.purge(&request).await {
                Ok(response) => response,
                Err(cause) => {
                    error!(batch = index, error = %cause, resume_from = index, "Batch failed, stopping");
                    return Err(BatchError {
                        batch_index: index,
                        cause,
                    });
                }
            };

            info!(
                batch = index,
                http_status = response.http_status,
                purge_id = response.purge_id.as_deref().unwrap_or("-"),
                detail = %response.detail,
                "Batch accepted"
            );
            summary.batches_submitted += 1;
            summary.objects_purged += request.objects.len();

            if let Some(audit) = &self.audit
                && let Err(e) = audit.record(index, &request, &response).await
            {
                warn!(path = %audit.path().display(), error = %e, "Failed to write purge log");
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PurgeError;
    use crate::purge::{Network, PurgeMethod, PurgeResponse};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Records every request; fails the call whose first object matches `fail_on`.
    #[derive(Default)]
    struct RecordingApi {
        requests: Mutex<Vec<PurgeRequest>>,
        fail_on: Option<String>,
    }

    impl RecordingApi {
        fn failing_on(object: &str) -> Self {
            Self {
                fail_on: Some(object.to_string()),
                ..Default::default()
            }
        }

        fn batches(&self) -> Vec<Vec<String>> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.objects.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PurgeApi for RecordingApi {
        async fn purge(&self, request: &PurgeRequest) -> Result<PurgeResponse, PurgeError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_on.as_deref() == request.objects.first().map(String::as_str) {
                return Err(PurgeError::http_status(StatusCode::TOO_MANY_REQUESTS, "slow down"));
            }
            Ok(PurgeResponse {
                http_status: 201,
                detail: "Request accepted".into(),
                ..Default::default()
            })
        }
    }

    fn files(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://cdn/f{i:02}.ts")).collect()
    }

    fn options(batch_size: usize, resume: Option<usize>) -> PurgeOptions {
        PurgeOptions {
            batch_size,
            resume_from_batch: resume,
            ..Default::default()
        }
    }

    #[test]
    fn plan_covers_every_file_once() {
        let plan = BatchPlan::new(10, 3).unwrap();
        assert_eq!(plan.batch_count(), 4);
        let ranges: Vec<_> = plan.ranges().map(|(_, r)| r).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn plan_for_exact_multiple_has_trailing_empty_batch() {
        let plan = BatchPlan::new(3, 3).unwrap();
        assert_eq!(plan.batch_count(), 2);
        assert_eq!(plan.range(0), 0..3);
        assert!(plan.range(1).is_empty());
    }

    #[test]
    fn plan_rejects_zero_batch_size() {
        assert!(matches!(BatchPlan::new(5, 0), Err(ConfigError::ZeroBatchSize)));
    }

    #[test]
    fn plan_is_a_pure_function_of_inputs() {
        let a: Vec<_> = BatchPlan::new(17, 4).unwrap().ranges().collect();
        let b: Vec<_> = BatchPlan::new(17, 4).unwrap().ranges().collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn submits_all_batches_in_order() {
        let submitter = BatchSubmitter::new(RecordingApi::default(), options(3, None)).unwrap();
        let summary = submitter.submit(&files(10)).await.unwrap();

        assert_eq!(summary.batches_total, 4);
        assert_eq!(summary.batches_submitted, 4);
        assert_eq!(summary.objects_purged, 10);
        let batches = submitter.api().batches();
        assert_eq!(batches[0], files(10)[0..3].to_vec());
        assert_eq!(batches[3], vec!["https://cdn/f09.ts".to_string()]);
    }

    #[tokio::test]
    async fn resume_skips_earlier_batches() {
        let submitter =
            BatchSubmitter::new(RecordingApi::default(), options(3, Some(2))).unwrap();
        let summary = submitter.submit(&files(10)).await.unwrap();

        assert_eq!(summary.batches_skipped, 2);
        assert_eq!(summary.batches_submitted, 2);
        let batches = submitter.api().batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0], "https://cdn/f06.ts");
        assert_eq!(batches[1], vec!["https://cdn/f09.ts".to_string()]);
    }

    #[tokio::test]
    async fn exact_multiple_sends_one_request() {
        let submitter = BatchSubmitter::new(RecordingApi::default(), options(3, None)).unwrap();
        let summary = submitter.submit(&files(3)).await.unwrap();

        assert_eq!(summary.batches_total, 2);
        assert_eq!(summary.batches_submitted, 1);
        assert_eq!(submitter.api().batches().len(), 1);
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let api = RecordingApi::failing_on("https://cdn/f03.ts");
        let submitter = BatchSubmitter::new(api, options(3, None)).unwrap();
        let err = submitter.submit(&files(10)).await.unwrap_err();

        assert_eq!(err.batch_index, 1);
        assert!(err.cause.is_rate_limited());
        // Batch 0 succeeded, batch 1 failed, nothing after it was attempted.
        assert_eq!(submitter.api().batches().len(), 2);
    }

    #[tokio::test]
    async fn resuming_at_failed_batch_completes_the_run() {
        let all = files(10);
        let failing = BatchSubmitter::new(
            RecordingApi::failing_on("https://cdn/f06.ts"),
            options(3, None),
        )
        .unwrap();
        let err = failing.submit(&all).await.unwrap_err();
        assert_eq!(err.batch_index, 2);

        let resumed = BatchSubmitter::new(
            RecordingApi::default(),
            options(3, Some(err.batch_index)),
        )
        .unwrap();
        resumed.submit(&all).await.unwrap();

        let mut sent: Vec<String> = failing.api().batches()[..2].concat();
        sent.extend(resumed.api().batches().concat());
        assert_eq!(sent, all);
    }

    #[tokio::test]
    async fn method_and_network_are_forwarded() {
        let opts = PurgeOptions {
            batch_size: 5,
            network: Network::Staging,
            method: PurgeMethod::Invalidate,
            ..Default::default()
        };
        let submitter = BatchSubmitter::new(RecordingApi::default(), opts).unwrap();
        submitter.submit(&files(2)).await.unwrap();

        let requests = submitter.api().requests.lock().unwrap();
        assert_eq!(requests[0].network, Network::Staging);
        assert_eq!(requests[0].method, PurgeMethod::Invalidate);
    }

    #[tokio::test]
    async fn audit_log_failure_does_not_fail_batch() {
        let dir = tempfile::tempdir().unwrap();
        let opts = PurgeOptions {
            batch_size: 2,
            // A directory cannot be opened for appending.
            log_file: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let submitter = BatchSubmitter::new(RecordingApi::default(), opts).unwrap();
        let summary = submitter.submit(&files(3)).await.unwrap();
        assert_eq!(summary.batches_submitted, 2);
    }

    #[tokio::test]
    async fn audit_log_records_successful_batches() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("purge.log");
        let opts = PurgeOptions {
            batch_size: 2,
            log_file: Some(log.clone()),
            ..Default::default()
        };
        let submitter = BatchSubmitter::new(
            RecordingApi::failing_on("https://cdn/f02.ts"),
            opts,
        )
        .unwrap();
        submitter.submit(&files(4)).await.unwrap_err();

        let content = tokio::fs::read_to_string(&log).await.unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("f02.ts"));
    }
}
