// registrytool/src/sync/logic.rs
use super::d1_client::D1Client;
use super::statement::build_upsert_statement;
use crate::descriptor::LoadedDescriptor;
use crate::errors::RegistryError;

/// Where statements go: nowhere (dry run) or a live D1 database.
#[derive(Debug)]
pub enum SyncTarget {
    DryRun,
    Remote(D1Client),
}

/// What happened to one descriptor during a sync run.
#[derive(Debug)]
pub enum RecordOutcome {
    DryRun { uuid: String },
    Synced { uuid: String },
    /// Remote store answered with `success: false`.
    Rejected { uuid: String, errors: String },
    /// Transport, protocol, or load failure.
    Failed { label: String, error: RegistryError },
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::DryRun { .. } | RecordOutcome::Synced { .. })
    }

    pub fn status_line(&self) -> String {
        match self {
            RecordOutcome::DryRun { uuid } => format!("[DRY RUN] Would sync: {}", uuid),
            RecordOutcome::Synced { uuid } => format!("Synced: {}", uuid),
            RecordOutcome::Rejected { uuid, errors } => format!("Failed: {} - {}", uuid, errors),
            RecordOutcome::Failed { label, error } if is_load_failure(error) => {
                format!("Error loading {}: {}", label, error)
            }
            RecordOutcome::Failed { label, error } => format!("Error syncing {}: {}", label, error),
        }
    }
}

fn is_load_failure(error: &RegistryError) -> bool {
    matches!(
        error,
        RegistryError::Io { .. } | RegistryError::Parse(_) | RegistryError::InvalidDescriptor(_)
    )
}

/// Success/failure counts for a sync run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncTally {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Syncs a single loaded descriptor. Never returns an error: every failure
/// becomes a [`RecordOutcome`] so the batch can continue.
pub async fn sync_one(entry: LoadedDescriptor, target: &SyncTarget) -> RecordOutcome {
    let module = match entry.descriptor {
        Ok(module) => module,
        Err(error) => {
            return RecordOutcome::Failed {
                label: entry.file_name,
                error,
            };
        }
    };

    let statement = build_upsert_statement(&module);
    let client = match target {
        SyncTarget::DryRun => {
            tracing::debug!(
                uuid = %module.uuid,
                params = statement.params.len(),
                sql = %statement.sql,
                "dry run statement"
            );
            return RecordOutcome::DryRun { uuid: module.uuid };
        }
        SyncTarget::Remote(client) => client,
    };

    match client.execute(&statement).await {
        Ok(response) if response.success => RecordOutcome::Synced { uuid: module.uuid },
        Ok(response) => RecordOutcome::Rejected {
            errors: response.error_summary(),
            uuid: module.uuid,
        },
        Err(error) => RecordOutcome::Failed {
            label: module.uuid,
            error,
        },
    }
}

/// Runs every descriptor through [`sync_one`] strictly in order, printing a
/// status line per record.
pub async fn sync_descriptors(entries: Vec<LoadedDescriptor>, target: &SyncTarget) -> SyncTally {
    let mut tally = SyncTally::default();
    for entry in entries {
        let outcome = sync_one(entry, target).await;
        if !outcome.is_success() {
            tracing::warn!(outcome = ?outcome, "record failed to sync");
        }
        println!("{}", outcome.status_line());
        tally.record(&outcome);
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::D1Config;
    use crate::descriptor::tests::{weather_module, write_module};
    use crate::descriptor::{ModuleDescriptor, load_descriptors};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loaded(uuid: &str) -> LoadedDescriptor {
        let mut document = weather_module();
        document["uuid"] = json!(uuid);
        let module: ModuleDescriptor = serde_json::from_value(document).expect("descriptor");
        LoadedDescriptor {
            file_name: format!("{uuid}.json"),
            descriptor: Ok(module),
        }
    }

    fn remote_target(server: &MockServer) -> SyncTarget {
        let config = D1Config {
            account_id: "acct".into(),
            database_id: "db".into(),
            api_token: "token".into(),
            api_base: server.uri(),
        };
        SyncTarget::Remote(D1Client::new(&config).expect("client"))
    }

    #[tokio::test]
    async fn test_dry_run_counts_every_record_without_network() {
        let entries = vec![loaded("a@x"), loaded("b@x"), loaded("c@x")];
        let tally = sync_descriptors(entries, &SyncTarget::DryRun).await;
        assert_eq!(tally, SyncTally { succeeded: 3, failed: 0 });
    }

    #[tokio::test]
    async fn test_dry_run_status_line() {
        let outcome = sync_one(loaded("a@x"), &SyncTarget::DryRun).await;
        assert_eq!(outcome.status_line(), "[DRY RUN] Would sync: a@x");
    }

    #[tokio::test]
    async fn test_mixed_failures_do_not_abort_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"ok@x\""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "errors": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"rejected@x\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": [{"code": 1, "message": "constraint failed"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"down@x\""))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .expect(1)
            .mount(&server)
            .await;

        let target = remote_target(&server);
        let entries = vec![loaded("down@x"), loaded("ok@x"), loaded("rejected@x")];
        let tally = sync_descriptors(entries, &target).await;
        assert_eq!(tally, SyncTally { succeeded: 1, failed: 2 });
    }

    #[tokio::test]
    async fn test_outcome_lines_distinguish_failure_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": [{"code": 1, "message": "constraint failed"}]
            })))
            .mount(&server)
            .await;
        let target = remote_target(&server);

        let rejected = sync_one(loaded("r@x"), &target).await;
        assert_eq!(rejected.status_line(), "Failed: r@x - [1: constraint failed]");
        assert!(!rejected.is_success());

        let unreachable = SyncTarget::Remote(
            D1Client::new(&D1Config {
                account_id: "acct".into(),
                database_id: "db".into(),
                api_token: "token".into(),
                api_base: "http://127.0.0.1:9".into(),
            })
            .expect("client"),
        );
        let failed = sync_one(loaded("t@x"), &unreachable).await;
        assert!(
            failed
                .status_line()
                .starts_with("Error syncing t@x: HTTP request error")
        );
    }

    #[tokio::test]
    async fn test_load_failures_are_counted_and_labelled_by_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_module(dir.path(), "weather-wttr@community.json", &weather_module());
        fs::write(dir.path().join("broken.json"), "{")?;

        let entries = load_descriptors(dir.path())?;
        let broken = entries
            .iter()
            .position(|e| e.file_name == "broken.json")
            .expect("broken entry");
        assert!(entries[broken].descriptor.is_err());

        let tally = sync_descriptors(entries, &SyncTarget::DryRun).await;
        assert_eq!(tally, SyncTally { succeeded: 1, failed: 1 });

        let outcome = RecordOutcome::Failed {
            label: "broken.json".into(),
            error: RegistryError::InvalidDescriptor(
                serde_json::from_str::<ModuleDescriptor>("{}").unwrap_err(),
            ),
        };
        assert!(
            outcome
                .status_line()
                .starts_with("Error loading broken.json: Invalid descriptor")
        );
        Ok(())
    }
}
