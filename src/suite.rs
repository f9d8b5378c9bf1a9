//! Route check suite
//!
//! Probes every configured router address for the same external port and
//! backend identity. Probes run concurrently and each one is bounded by the
//! suite's check timeout, since a probe on its own can wait forever on a
//! backend that accepts but never answers.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::Config,
    probe::{ProbeError, ProbeReport, ProbeRequest, RouteProbe, RouteVerifier},
    types::CheckStatus,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;

/// Why a single route check did not pass
#[derive(Error, Debug)]
pub enum CheckFailure {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("no result within {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// Result of checking one router address
#[derive(Debug)]
pub struct CheckOutcome {
    pub request: ProbeRequest,
    pub elapsed: Duration,
    pub result: std::result::Result<ProbeReport, CheckFailure>,
}

impl CheckOutcome {
    pub fn status(&self) -> CheckStatus {
        match &self.result {
            Ok(_) => CheckStatus::Passed,
            Err(CheckFailure::Probe(_)) => CheckStatus::Failed,
            Err(CheckFailure::TimedOut(_)) => CheckStatus::TimedOut,
        }
    }

    pub fn address(&self) -> String {
        self.request.target_address()
    }
}

/// Aggregate of one suite run
#[derive(Debug)]
pub struct SuiteReport {
    pub backend_id: String,
    pub external_port: u16,
    pub outcomes: Vec<CheckOutcome>,
    pub total_duration: Duration,
}

impl SuiteReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Failed)
    }

    pub fn timed_out(&self) -> usize {
        self.count(CheckStatus::TimedOut)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status() == status).count()
    }

    /// True when at least one address was checked and all of them passed
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.passed() == self.total()
    }

    /// Turn a failing report into the error the CLI exits with
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        if self.outcomes.is_empty() {
            return Err(AppError::test_execution("no router addresses were checked"));
        }
        Err(AppError::test_execution(format!(
            "{} of {} route checks failed for backend '{}' on port {}",
            self.total() - self.passed(),
            self.total(),
            self.backend_id,
            self.external_port
        )))
    }
}

/// Runs route checks against a fleet of routers
pub struct RouteCheckSuite {
    verifier: Arc<dyn RouteVerifier>,
    check_timeout: Duration,
    logger: Logger,
}

impl RouteCheckSuite {
    pub fn new(verifier: Arc<dyn RouteVerifier>, check_timeout: Duration) -> Self {
        Self {
            verifier,
            check_timeout,
            logger: Logger::new("SUITE".to_string()),
        }
    }

    /// Suite backed by a real TCP probe configured from `config`
    ///
    /// Suite and probe loggers are derived from `logger`, so they share its
    /// session id.
    pub fn from_config(config: &Config, logger: &Logger) -> Self {
        let probe = RouteProbe::new(config.probe_config()).with_logger(logger.named("PROBE"));
        Self::new(Arc::new(probe), config.check_timeout()).with_logger(logger.named("SUITE"))
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    /// Validate `config` and check every address in it
    pub async fn run_config(&self, config: &Config) -> Result<SuiteReport> {
        config.validate()?;
        let external_port = config
            .external_port
            .ok_or_else(|| AppError::config("External port is not set"))?;
        Ok(self.run(&config.backend_id, &config.addresses, external_port).await)
    }

    /// Check every address concurrently; outcomes keep the input order
    pub async fn run(&self, backend_id: &str, addresses: &[String], external_port: u16) -> SuiteReport {
        let started = Instant::now();
        self.logger.info(&format!(
            "Checking {} router address(es) for backend '{}' on port {}",
            addresses.len(), backend_id, external_port
        ))
            .field("check_timeout_secs", self.check_timeout.as_secs_f64())
            .log()
            .await;

        let checks = addresses
            .iter()
            .map(|address| self.check(ProbeRequest::new(backend_id, address.as_str(), external_port)));
        let outcomes = join_all(checks).await;

        SuiteReport {
            backend_id: backend_id.to_string(),
            external_port,
            outcomes,
            total_duration: started.elapsed(),
        }
    }

    async fn check(&self, request: ProbeRequest) -> CheckOutcome {
        let operation = format!("route check {}", request.target_address());
        let correlation_id = self.logger.start_operation(&operation).await;
        let request = request.with_correlation_id(correlation_id.as_str());
        let started = Instant::now();

        let result = match timeout(self.check_timeout, self.verifier.verify(&request)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(CheckFailure::Probe(e)),
            Err(_) => Err(CheckFailure::TimedOut(self.check_timeout)),
        };
        let elapsed = started.elapsed();

        match &result {
            Err(CheckFailure::Probe(e)) => {
                self.logger.warn(&format!("Route check failed: {}", e))
                    .correlation_id(&correlation_id)
                    .probe_error(e)
                    .log()
                    .await;
            }
            Err(CheckFailure::TimedOut(limit)) => {
                self.logger.warn(&format!("Route check timed out after {:?}", limit))
                    .correlation_id(&correlation_id)
                    .field("address", request.target_address())
                    .log()
                    .await;
            }
            Ok(_) => {}
        }
        self.logger.end_operation(&correlation_id, &operation, result.is_ok()).await;

        CheckOutcome { request, elapsed, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Verifier whose behavior is picked by router address
    struct ScriptedVerifier;

    #[async_trait]
    impl RouteVerifier for ScriptedVerifier {
        async fn verify(&self, request: &ProbeRequest) -> std::result::Result<ProbeReport, ProbeError> {
            match request.router_address.as_str() {
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    unreachable!("check timeout should fire first")
                }
                "refused" => Err(ProbeError::Connection {
                    address: request.target_address(),
                    reason: "Connection refused".to_string(),
                }),
                "wrong" => Err(ProbeError::Mismatch {
                    actual: "server2:Time is 1".to_string(),
                    expected: format!("{}:Time is 1", request.backend_id),
                }),
                _ => Ok(ProbeReport {
                    address: request.target_address(),
                    backend_id: request.backend_id.clone(),
                    message: "Time is 1".to_string(),
                    response: format!("{}:Time is 1", request.backend_id),
                    connect_time: Duration::from_millis(1),
                    round_trip: Duration::from_millis(2),
                }),
            }
        }
    }

    fn suite(limit: Duration) -> RouteCheckSuite {
        RouteCheckSuite::new(Arc::new(ScriptedVerifier), limit)
    }

    fn addresses(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_pass() {
        let report = suite(Duration::from_secs(5))
            .run("server1", &addresses(&["10.0.0.1", "10.0.0.2"]), 61000)
            .await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.passed(), 2);
        assert!(report.is_success());
        assert!(report.into_result().is_ok());
    }

    #[tokio::test]
    async fn test_outcomes_keep_address_order() {
        let report = suite(Duration::from_secs(5))
            .run("server1", &addresses(&["wrong", "10.0.0.1", "refused"]), 61000)
            .await;

        let order: Vec<String> = report.outcomes.iter().map(|o| o.request.router_address.clone()).collect();
        assert_eq!(order, vec!["wrong", "10.0.0.1", "refused"]);
        assert_eq!(report.outcomes[0].status(), CheckStatus::Failed);
        assert_eq!(report.outcomes[1].status(), CheckStatus::Passed);
        assert_eq!(report.outcomes[2].status(), CheckStatus::Failed);
    }

    #[tokio::test]
    async fn test_one_failure_fails_suite() {
        let report = suite(Duration::from_secs(5))
            .run("server1", &addresses(&["10.0.0.1", "wrong"]), 61000)
            .await;

        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        let err = report.into_result().unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("1 of 2 route checks failed"));
    }

    #[tokio::test]
    async fn test_hung_backend_times_out() {
        let started = Instant::now();
        let report = suite(Duration::from_millis(100))
            .run("server1", &addresses(&["hang", "10.0.0.1"]), 61000)
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report.timed_out(), 1);
        assert_eq!(report.passed(), 1);
        match &report.outcomes[0].result {
            Err(CheckFailure::TimedOut(limit)) => assert_eq!(*limit, Duration::from_millis(100)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_fleet_is_not_success() {
        let report = suite(Duration::from_secs(1)).run("server1", &[], 61000).await;
        assert!(!report.is_success());
        assert!(report.into_result().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_checks_keep_their_own_ids() {
        use crate::logging::LogEntry;
        use crate::receiver::IdentityEchoServer;
        use std::collections::HashMap;

        let server = IdentityEchoServer::bind("127.0.0.1:0", "server1").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = server.spawn();

        let config = Config {
            addresses: addresses(&["127.0.0.1", "127.0.0.1", "127.0.0.1"]),
            external_port: Some(port),
            ..Config::default()
        };
        let (logger, sink) = Logger::capturing("APP");
        let report = RouteCheckSuite::from_config(&config, &logger).run_config(&config).await.unwrap();
        assert!(report.is_success());
        handle.abort();

        let entries: Vec<LogEntry> = sink.lock().unwrap().clone();
        let started: Vec<String> = entries
            .iter()
            .filter(|e| e.logger == "SUITE" && e.fields.get("operation_type").map_or(false, |t| t == "start"))
            .filter_map(|e| e.correlation_id.clone())
            .collect();
        assert_eq!(started.len(), 3);

        let mut per_check: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries.iter().filter(|e| e.logger == "PROBE") {
            let id = entry.correlation_id.clone().expect("route entry without a check id");
            let state = entry.fields["state"].as_str().unwrap_or_default().to_string();
            per_check.entry(id).or_default().push(state);
        }

        // Every check's route entries carry that check's id, and only that one
        assert_eq!(per_check.len(), 3);
        for id in &started {
            assert_eq!(
                per_check[id],
                vec!["Connecting", "Sending", "AwaitingResponse", "Comparing", "Success", "Closed"],
                "entries for check {}",
                id
            );
        }
    }

    #[tokio::test]
    async fn test_verifier_receives_check_id() {
        use std::sync::Mutex;

        /// Records the id each request arrives with
        struct RecordingVerifier(Mutex<Vec<Option<String>>>);

        #[async_trait]
        impl RouteVerifier for RecordingVerifier {
            async fn verify(&self, request: &ProbeRequest) -> std::result::Result<ProbeReport, ProbeError> {
                self.0.lock().unwrap().push(request.correlation_id.clone());
                ScriptedVerifier.verify(request).await
            }
        }

        let verifier = Arc::new(RecordingVerifier(Mutex::new(Vec::new())));
        let report = RouteCheckSuite::new(verifier.clone(), Duration::from_secs(5))
            .run("server1", &addresses(&["10.0.0.1", "10.0.0.2"]), 61000)
            .await;

        let seen = verifier.0.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(Option::is_some));
        assert_ne!(seen[0], seen[1]);
        let mut stamped: Vec<Option<String>> = report.outcomes.iter().map(|o| o.request.correlation_id.clone()).collect();
        let mut seen_sorted = seen.clone();
        stamped.sort();
        seen_sorted.sort();
        assert_eq!(stamped, seen_sorted);
    }

    #[tokio::test]
    async fn test_run_config_validates_first() {
        let err = suite(Duration::from_secs(1))
            .run_config(&Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_config() {
        let config = Config {
            addresses: addresses(&["10.0.0.1"]),
            external_port: Some(61000),
            backend_id: "server9".to_string(),
            ..Config::default()
        };
        let report = suite(Duration::from_secs(1)).run_config(&config).await.unwrap();
        assert_eq!(report.backend_id, "server9");
        assert_eq!(report.external_port, 61000);
        assert!(report.is_success());
    }
}
