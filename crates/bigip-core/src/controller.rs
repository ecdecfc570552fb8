// ── License lifecycle controller ──
//
// Converges one device's license to a desired state. Every remote call is
// awaited in sequence. The removal path restores the account shell before
// returning, whatever happened in between.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};
use url::Url;

use crate::capability::{
    AccountDirectory, ActivationService, Capability, CommandChannel, DeviceManagement,
    FileRemoval, ShellConnector,
};
use crate::config::{ActivationEndpoints, PollSettings};
use crate::error::CoreError;
use crate::model::{
    AccountShell, ActivationEndpoint, ActivationStatus, DesiredState, LicenseMetadata,
    LicenseOutcome, LicenseRequest, LicenseTransaction, RemovalReport, ServiceDescriptor,
    select_endpoint,
};
use crate::poll::{PollOutcome, poll_until};

/// Where the accepted EULA is stored on the device.
const EULA_PATH: &str = "/LICENSE.F5";
const LICENSE_FILES: [&str; 2] = ["/config/bigip.license", "/config/bigiq.license"];
const RELOAD_COMMAND: &str = "reloadlic";
const ELEVATED_SHELL: AccountShell = AccountShell::Bash;

/// Everything the controller needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// The account the session authenticates as; its shell is switched
    /// during removal.
    pub username: String,
    pub endpoints: ActivationEndpoints,
    pub poll: PollSettings,
}

/// The license state machine.
///
/// Generic over its collaborators so the sequencing can be exercised
/// without a device. `DeviceSession` wires in the real clients.
pub struct LicenseController<D, A, U, S> {
    device: D,
    activation: A,
    accounts: Capability<U>,
    shell: Capability<S>,
    settings: ControllerSettings,
}

impl<D, A, U, S> LicenseController<D, A, U, S>
where
    D: DeviceManagement,
    A: ActivationService,
    U: AccountDirectory,
    S: ShellConnector,
{
    pub fn new(
        device: D,
        activation: A,
        accounts: Capability<U>,
        shell: Capability<S>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            device,
            activation,
            accounts,
            shell,
            settings,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Current activation status.
    pub async fn status(&self) -> Result<ActivationStatus, CoreError> {
        self.device.activation_status().await
    }

    /// Converge the device to `request.state`.
    pub async fn apply(&self, request: &LicenseRequest) -> Result<LicenseOutcome, CoreError> {
        info!(state = %request.state, "applying license state");
        match request.state {
            DesiredState::Present | DesiredState::Latest => self.issue(request).await,
            DesiredState::Absent => self.revoke(request).await,
        }
    }

    /// The activation service a request would use.
    ///
    /// A service descriptor wins over key-based selection.
    pub async fn resolve_endpoint(
        &self,
        request: &LicenseRequest,
    ) -> Result<ActivationEndpoint, CoreError> {
        let descriptor = match &request.service_descriptor {
            None => return select_endpoint(&request.registration_key, &self.settings.endpoints),
            Some(ServiceDescriptor::Path(path)) => read_local(path, "Service descriptor").await?,
            Some(ServiceDescriptor::Url(url)) => self.activation.fetch_descriptor(url).await?,
        };
        let url = bigip_api::endpoint_from_descriptor(&descriptor)?;
        Ok(ActivationEndpoint::Custom(url))
    }

    // ── Issuance ─────────────────────────────────────────────────────

    async fn issue(&self, request: &LicenseRequest) -> Result<LicenseOutcome, CoreError> {
        let status = self.device.activation_status().await?;
        if request.state == DesiredState::Present && status.is_enabled() {
            info!("license already active");
            return Ok(LicenseOutcome::unchanged(request.state, status));
        }

        if let Some(path) = &request.license_file {
            info!(path = %path.display(), "installing supplied license");
            let license = read_local(path, "License file").await?;
            let status = self.install(&license).await?;
            return Ok(LicenseOutcome::changed(request.state, status));
        }

        let endpoint = self.resolve_endpoint(request).await?;
        info!(%endpoint, "using activation service");

        if !self.activation.ping(endpoint.url()).await {
            if !status.is_enabled() {
                return Err(CoreError::UnreachableActivationServer {
                    url: endpoint.url().to_string(),
                });
            }
            let message = format!(
                "activation service {} is unreachable; kept the installed license",
                endpoint.url()
            );
            warn!("{message}");
            let mut outcome = LicenseOutcome::unchanged(request.state, status).with_endpoint(endpoint);
            outcome.warnings.push(message);
            return Ok(outcome);
        }

        let dossier = match &request.dossier_file {
            Some(path) => read_local(path, "Dossier file").await?,
            None => {
                debug!("requesting system dossier");
                self.device
                    .system_dossier(&request.registration_key)
                    .await?
            }
        };
        let dossier = dossier.trim();
        if dossier.is_empty() {
            return Err(CoreError::DossierNotGenerated);
        }

        let (license, eula) = self
            .negotiate(endpoint.url(), dossier, &request.metadata)
            .await?;
        debug!(empty = eula.is_empty(), "storing EULA");
        self.device.upload_file(EULA_PATH, eula.as_bytes()).await?;
        let status = self.install(&license).await?;
        Ok(LicenseOutcome::changed(request.state, status).with_endpoint(endpoint))
    }

    /// Request a license, accepting an offered EULA once.
    ///
    /// Returns the license text and the EULA to store with it.
    async fn negotiate(
        &self,
        endpoint: &Url,
        dossier: &str,
        metadata: &LicenseMetadata,
    ) -> Result<(String, String), CoreError> {
        let mut eula = String::new();
        let mut transaction = self
            .activation
            .request_license(endpoint, dossier, &eula, metadata)
            .await?;

        if let LicenseTransaction::EulaRequired { eula: offered } = &transaction {
            info!("accepting the offered EULA");
            eula.clone_from(offered);
            transaction = self
                .activation
                .request_license(endpoint, dossier, &eula, metadata)
                .await?;
        }

        match transaction {
            LicenseTransaction::LicenseReturned {
                license,
                eula: returned,
            } => {
                let eula = if returned.is_empty() { eula } else { returned };
                Ok((license, eula))
            }
            other => Err(CoreError::NoLicenseReturned {
                state: other.state_name().to_owned(),
                fault: other.describe(),
            }),
        }
    }

    /// Install a license and confirm the device reports `ENABLED`.
    async fn install(&self, license: &str) -> Result<ActivationStatus, CoreError> {
        info!("installing license");
        self.device.install_license(license).await?;
        let status = self.device.activation_status().await?;
        if !status.is_enabled() {
            return Err(CoreError::OperationFailed {
                message: format!("license installed but the device reports {status}"),
            });
        }
        Ok(status)
    }

    // ── Removal ──────────────────────────────────────────────────────

    async fn revoke(&self, request: &LicenseRequest) -> Result<LicenseOutcome, CoreError> {
        let status = self.device.activation_status().await?;
        if !status.is_enabled() {
            info!("no license installed");
            return Ok(LicenseOutcome::unchanged(request.state, status));
        }

        let accounts = self.accounts.require("license removal")?;
        let connector = self.shell.require("license removal")?;

        let username = self.settings.username.as_str();
        let account = accounts.account(username).await?;
        if !account.is_privileged() {
            return Err(CoreError::UnprivilegedAccount {
                username: username.to_owned(),
                role: account.role_summary(),
            });
        }

        let original = account.shell;
        let switched = original != ELEVATED_SHELL;
        if switched {
            info!(from = %original, "switching account shell to bash");
            if let Err(e) = accounts.set_shell(username, ELEVATED_SHELL).await {
                warn!(error = %e, "could not switch account shell; continuing");
            }
        }

        let removal = self.remove_and_reload(connector).await;
        let shell_restore = if switched {
            Some(self.restore_shell(accounts, original).await)
        } else {
            None
        };
        let disable = removal?;

        let strict = request.strict_removal;
        let mut warnings = Vec::new();
        confirm("license removal", &disable, strict, &mut warnings)?;
        if let Some(restore) = &shell_restore {
            confirm("shell restoration", restore, strict, &mut warnings)?;
        }

        let status = if disable.is_confirmed() {
            ActivationStatus::Disabled
        } else {
            ActivationStatus::Enabled
        };
        let mut outcome = LicenseOutcome::changed(request.state, status);
        outcome.removal = Some(RemovalReport {
            disable,
            shell_restore,
        });
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Delete the license files, reload, and wait for `DISABLED`.
    ///
    /// The channel is closed before returning on every path.
    async fn remove_and_reload(&self, connector: &S) -> Result<PollOutcome, CoreError> {
        let mut channel = connector.open().await?;
        let result = self.delete_and_reload(&mut channel).await;
        if let Err(e) = channel.close().await {
            debug!(error = %e, "closing command channel failed");
        }
        result?;

        info!("waiting for the device to report DISABLED");
        let device = &self.device;
        let poll = self.settings.poll;
        Ok(
            poll_until(poll.disable_interval, poll.disable_timeout, || async move {
                Ok::<_, CoreError>(!device.activation_status().await?.is_enabled())
            })
            .await,
        )
    }

    async fn delete_and_reload(&self, channel: &mut S::Channel) -> Result<(), CoreError> {
        for path in LICENSE_FILES {
            match self.device.delete_file(path).await? {
                FileRemoval::Deleted => info!(path, "license file deleted"),
                FileRemoval::NotFound => debug!(path, "license file not present"),
            }
        }
        let output = channel.run(RELOAD_COMMAND).await?;
        if output.succeeded() {
            debug!("reload finished");
        } else {
            // Not trusted either way; the status poll decides.
            warn!(
                exit_status = ?output.exit_status,
                stderr = %output.stderr.trim(),
                "reload reported failure"
            );
        }
        Ok(())
    }

    /// Reapply the original shell until the device reports it.
    async fn restore_shell(&self, accounts: &U, original: AccountShell) -> PollOutcome {
        info!(shell = %original, "restoring account shell");
        let username = self.settings.username.as_str();
        let device = &self.device;
        let poll = self.settings.poll;
        poll_until(poll.restore_interval, poll.restore_timeout, || async move {
            if let Err(e) = accounts.set_shell(username, original).await {
                warn!(error = %e, "shell restore request failed");
            }
            let observed = device.login_shell(username).await?;
            Ok::<_, CoreError>(original.is_restored_by(observed))
        })
        .await
    }
}

/// Turn an unconfirmed poll into a warning, or an error when strict.
fn confirm(
    step: &str,
    outcome: &PollOutcome,
    strict: bool,
    warnings: &mut Vec<String>,
) -> Result<(), CoreError> {
    if outcome.is_confirmed() {
        return Ok(());
    }
    let message = format!("{step} {}", outcome.describe());
    if strict {
        return Err(CoreError::OperationFailed { message });
    }
    warn!("{message}");
    warnings.push(message);
    Ok(())
}

/// Read an operator-supplied input file; `what` names it in errors.
async fn read_local(path: &Path, what: &'static str) -> Result<String, CoreError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CoreError::InputFileMissing {
                what,
                path: path.display().to_string(),
            },
            _ => CoreError::OperationFailed {
                message: format!("cannot read {}: {e}", path.display()),
            },
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use bigip_api::CommandOutput;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::AccountRecord;
    use crate::poll::PollStatus;

    // ── Doubles ─────────────────────────────────────────────────────

    type Journal = Arc<Mutex<Vec<String>>>;

    fn note(journal: &Journal, entry: impl Into<String>) {
        journal.lock().unwrap().push(entry.into());
    }

    /// Pop the next scripted value, repeating the last one forever.
    fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> T {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }

    struct FakeDevice {
        journal: Journal,
        statuses: Mutex<VecDeque<ActivationStatus>>,
        dossier: String,
        login_shells: Mutex<VecDeque<AccountShell>>,
        missing_files: Vec<&'static str>,
        failing_deletes: Vec<&'static str>,
    }

    #[async_trait]
    impl DeviceManagement for FakeDevice {
        async fn activation_status(&self) -> Result<ActivationStatus, CoreError> {
            Ok(next(&self.statuses))
        }

        async fn system_dossier(&self, _key: &str) -> Result<String, CoreError> {
            Ok(self.dossier.clone())
        }

        async fn install_license(&self, license: &str) -> Result<(), CoreError> {
            note(&self.journal, format!("install_license {license}"));
            Ok(())
        }

        async fn upload_file(&self, path: &str, contents: &[u8]) -> Result<(), CoreError> {
            let text = String::from_utf8_lossy(contents);
            note(&self.journal, format!("upload_file {path} {text}"));
            Ok(())
        }

        async fn delete_file(&self, path: &str) -> Result<FileRemoval, CoreError> {
            note(&self.journal, format!("delete_file {path}"));
            if self.failing_deletes.contains(&path) {
                return Err(CoreError::Api {
                    message: "Common::AccessDenied".into(),
                    code: Some("SOAP-ENV:Server".into()),
                    status: None,
                });
            }
            if self.missing_files.contains(&path) {
                Ok(FileRemoval::NotFound)
            } else {
                Ok(FileRemoval::Deleted)
            }
        }

        async fn login_shell(&self, _username: &str) -> Result<AccountShell, CoreError> {
            Ok(next(&self.login_shells))
        }
    }

    struct FakeActivation {
        journal: Journal,
        reachable: bool,
        transactions: Mutex<VecDeque<LicenseTransaction>>,
    }

    #[async_trait]
    impl ActivationService for FakeActivation {
        async fn ping(&self, _endpoint: &Url) -> bool {
            self.reachable
        }

        async fn request_license(
            &self,
            _endpoint: &Url,
            dossier: &str,
            eula: &str,
            _metadata: &LicenseMetadata,
        ) -> Result<LicenseTransaction, CoreError> {
            note(
                &self.journal,
                format!("request_license dossier={dossier} eula={eula}"),
            );
            Ok(next(&self.transactions))
        }

        async fn fetch_descriptor(&self, location: &Url) -> Result<String, CoreError> {
            Err(CoreError::ConnectionFailed {
                url: location.to_string(),
                reason: "offline".into(),
            })
        }
    }

    struct FakeAccounts {
        journal: Journal,
        record: AccountRecord,
        set_shell_fails: bool,
    }

    #[async_trait]
    impl AccountDirectory for FakeAccounts {
        async fn account(&self, _username: &str) -> Result<AccountRecord, CoreError> {
            Ok(self.record.clone())
        }

        async fn set_shell(&self, _username: &str, shell: AccountShell) -> Result<(), CoreError> {
            note(&self.journal, format!("set_shell {}", shell.as_rest_value()));
            if self.set_shell_fails {
                return Err(CoreError::Api {
                    message: "transaction in progress".into(),
                    code: None,
                    status: Some(409),
                });
            }
            Ok(())
        }
    }

    struct FakeConnector {
        journal: Journal,
        reload_status: Option<u32>,
    }

    struct FakeChannel {
        journal: Journal,
        reload_status: Option<u32>,
    }

    #[async_trait]
    impl ShellConnector for FakeConnector {
        type Channel = FakeChannel;

        async fn open(&self) -> Result<FakeChannel, CoreError> {
            note(&self.journal, "open");
            Ok(FakeChannel {
                journal: Arc::clone(&self.journal),
                reload_status: self.reload_status,
            })
        }
    }

    #[async_trait]
    impl CommandChannel for FakeChannel {
        async fn run(&mut self, command: &str) -> Result<CommandOutput, CoreError> {
            note(&self.journal, format!("run {command}"));
            Ok(CommandOutput {
                exit_status: self.reload_status,
                ..CommandOutput::default()
            })
        }

        async fn close(self) -> Result<(), CoreError> {
            note(&self.journal, "close");
            Ok(())
        }
    }

    // ── Fixture ─────────────────────────────────────────────────────

    type TestController = LicenseController<FakeDevice, FakeActivation, FakeAccounts, FakeConnector>;

    struct Fixture {
        statuses: Vec<ActivationStatus>,
        dossier: &'static str,
        login_shells: Vec<AccountShell>,
        missing_files: Vec<&'static str>,
        failing_deletes: Vec<&'static str>,
        reachable: bool,
        transactions: Vec<LicenseTransaction>,
        account: AccountRecord,
        set_shell_fails: bool,
        ssh: bool,
        reload_status: Option<u32>,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                statuses: vec![ActivationStatus::Disabled, ActivationStatus::Enabled],
                dossier: "dossier-1",
                login_shells: vec![AccountShell::Tmsh],
                missing_files: Vec::new(),
                failing_deletes: Vec::new(),
                reachable: true,
                transactions: vec![LicenseTransaction::LicenseReturned {
                    license: "LICENSE".into(),
                    eula: "EULA".into(),
                }],
                account: AccountRecord {
                    name: "admin".into(),
                    shell: AccountShell::Tmsh,
                    roles: vec!["admin".into()],
                },
                set_shell_fails: false,
                ssh: true,
                reload_status: Some(0),
            }
        }
    }

    impl Fixture {
        /// A device with a license installed, ready for removal.
        fn licensed() -> Self {
            Self {
                statuses: vec![ActivationStatus::Enabled, ActivationStatus::Disabled],
                ..Self::default()
            }
        }

        fn build(self) -> (TestController, Journal) {
            let journal = Journal::default();
            let device = FakeDevice {
                journal: Arc::clone(&journal),
                statuses: Mutex::new(self.statuses.into()),
                dossier: self.dossier.into(),
                login_shells: Mutex::new(self.login_shells.into()),
                missing_files: self.missing_files,
                failing_deletes: self.failing_deletes,
            };
            let activation = FakeActivation {
                journal: Arc::clone(&journal),
                reachable: self.reachable,
                transactions: Mutex::new(self.transactions.into()),
            };
            let accounts = Capability::Available(FakeAccounts {
                journal: Arc::clone(&journal),
                record: self.account,
                set_shell_fails: self.set_shell_fails,
            });
            let shell = if self.ssh {
                Capability::Available(FakeConnector {
                    journal: Arc::clone(&journal),
                    reload_status: self.reload_status,
                })
            } else {
                Capability::unavailable("SSH access")
            };
            let settings = ControllerSettings {
                username: "admin".into(),
                endpoints: ActivationEndpoints::default(),
                poll: PollSettings::default(),
            };
            let controller = LicenseController::new(device, activation, accounts, shell, settings);
            (controller, journal)
        }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    fn request(state: DesiredState) -> LicenseRequest {
        LicenseRequest::new(state, "ABCDE-FGHIJ-KLMNO-PQRST-UVWXYZZ")
    }

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    // ── Idempotence ─────────────────────────────────────────────────

    #[tokio::test]
    async fn present_on_licensed_device_changes_nothing() {
        let (controller, journal) = Fixture {
            statuses: vec![ActivationStatus::Enabled],
            ..Fixture::default()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Present)).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.status, ActivationStatus::Enabled);
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn absent_on_unlicensed_device_changes_nothing() {
        let (controller, journal) = Fixture {
            statuses: vec![ActivationStatus::Disabled],
            ..Fixture::default()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(!outcome.changed);
        assert!(outcome.removal.is_none());
        assert!(entries(&journal).is_empty());
    }

    // ── Issuance ────────────────────────────────────────────────────

    #[tokio::test]
    async fn present_issues_stores_eula_and_installs() {
        let (controller, journal) = Fixture::default().build();

        let outcome = controller.apply(&request(DesiredState::Present)).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.status, ActivationStatus::Enabled);
        assert_eq!(outcome.endpoint.as_ref().map(ActivationEndpoint::kind), Some("external"));
        assert_eq!(
            entries(&journal),
            vec![
                "request_license dossier=dossier-1 eula=",
                "upload_file /LICENSE.F5 EULA",
                "install_license LICENSE",
            ]
        );
    }

    #[tokio::test]
    async fn latest_reissues_on_licensed_device() {
        let (controller, journal) = Fixture {
            statuses: vec![ActivationStatus::Enabled],
            ..Fixture::default()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Latest)).await.unwrap();

        assert!(outcome.changed);
        assert!(entries(&journal).contains(&"install_license LICENSE".to_owned()));
    }

    #[tokio::test]
    async fn eula_is_accepted_exactly_once() {
        let (controller, journal) = Fixture {
            transactions: vec![
                LicenseTransaction::EulaRequired {
                    eula: "TERMS".into(),
                },
                LicenseTransaction::LicenseReturned {
                    license: "LICENSE".into(),
                    eula: String::new(),
                },
            ],
            ..Fixture::default()
        }
        .build();

        controller.apply(&request(DesiredState::Present)).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec![
                "request_license dossier=dossier-1 eula=",
                "request_license dossier=dossier-1 eula=TERMS",
                "upload_file /LICENSE.F5 TERMS",
                "install_license LICENSE",
            ]
        );
    }

    #[tokio::test]
    async fn repeated_eula_demand_fails_after_two_requests() {
        let (controller, journal) = Fixture {
            transactions: vec![LicenseTransaction::EulaRequired {
                eula: "TERMS".into(),
            }],
            ..Fixture::default()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Present))
            .await
            .unwrap_err();

        assert!(
            matches!(err, CoreError::NoLicenseReturned { ref state, .. } if state == "EULA_REQUIRED"),
            "got {err:?}"
        );
        let requests = entries(&journal)
            .iter()
            .filter(|e| e.starts_with("request_license"))
            .count();
        assert_eq!(requests, 2);
        assert!(!entries(&journal).iter().any(|e| e.starts_with("install_license")));
    }

    #[tokio::test]
    async fn fault_text_is_reported() {
        let (controller, _) = Fixture {
            transactions: vec![LicenseTransaction::FaultReturned {
                number: Some("51092".into()),
                text: "Registration key already in use".into(),
            }],
            ..Fixture::default()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Present))
            .await
            .unwrap_err();

        match err {
            CoreError::NoLicenseReturned { state, fault } => {
                assert_eq!(state, "FAULT_RETURNED");
                assert!(fault.contains("already in use"));
            }
            other => panic!("expected NoLicenseReturned, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_on_unlicensed_device_fails() {
        let (controller, journal) = Fixture {
            reachable: false,
            ..Fixture::default()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Present))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::UnreachableActivationServer { .. }));
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_on_licensed_device_warns() {
        let (controller, journal) = Fixture {
            statuses: vec![ActivationStatus::Enabled],
            reachable: false,
            ..Fixture::default()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Latest)).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn empty_dossier_fails() {
        let (controller, _) = Fixture {
            dossier: "  \n",
            ..Fixture::default()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Present))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DossierNotGenerated));
    }

    #[tokio::test]
    async fn install_must_leave_device_enabled() {
        let (controller, journal) = Fixture {
            statuses: vec![ActivationStatus::Disabled],
            ..Fixture::default()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Present))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::OperationFailed { .. }), "got {err:?}");
        assert!(entries(&journal).contains(&"install_license LICENSE".to_owned()));
    }

    #[tokio::test]
    async fn supplied_license_skips_negotiation() {
        let license = temp_file("Auth vers : 5b");
        let (controller, journal) = Fixture::default().build();
        let mut req = request(DesiredState::Present);
        req.license_file = Some(license.path().to_path_buf());

        let outcome = controller.apply(&req).await.unwrap();

        assert!(outcome.changed);
        assert!(outcome.endpoint.is_none());
        assert_eq!(entries(&journal), vec!["install_license Auth vers : 5b"]);
    }

    #[tokio::test]
    async fn missing_license_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, journal) = Fixture::default().build();
        let mut req = request(DesiredState::Present);
        req.license_file = Some(dir.path().join("bigip.license"));

        let err = controller.apply(&req).await.unwrap_err();

        assert!(matches!(err, CoreError::InputFileMissing { what: "License file", .. }));
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn missing_service_descriptor_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, journal) = Fixture::default().build();
        let mut req = request(DesiredState::Present);
        req.service_descriptor = Some(ServiceDescriptor::Path(dir.path().join("license.wsdl")));

        let err = controller.apply(&req).await.unwrap_err();

        assert!(
            matches!(err, CoreError::InputFileMissing { what: "Service descriptor", .. }),
            "got {err:?}"
        );
        assert!(err.to_string().starts_with("Service descriptor not found"));
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn license_without_eula_still_writes_eula_file() {
        let (controller, journal) = Fixture {
            transactions: vec![LicenseTransaction::LicenseReturned {
                license: "LICENSE".into(),
                eula: String::new(),
            }],
            ..Fixture::default()
        }
        .build();

        controller.apply(&request(DesiredState::Present)).await.unwrap();

        assert_eq!(
            entries(&journal),
            vec![
                "request_license dossier=dossier-1 eula=",
                "upload_file /LICENSE.F5 ",
                "install_license LICENSE",
            ]
        );
    }

    #[tokio::test]
    async fn supplied_dossier_replaces_device_dossier() {
        let dossier = temp_file("  from-file\n");
        let (controller, journal) = Fixture::default().build();
        let mut req = request(DesiredState::Present);
        req.dossier_file = Some(dossier.path().to_path_buf());

        controller.apply(&req).await.unwrap();

        assert_eq!(
            entries(&journal).first().map(String::as_str),
            Some("request_license dossier=from-file eula=")
        );
    }

    #[tokio::test]
    async fn service_descriptor_overrides_endpoint() {
        let wsdl = temp_file(
            r#"<definitions><service><port>
                 <soap:address xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                   location="https://alt.example.net/license/services/Activation"/>
               </port></service></definitions>"#,
        );
        let (controller, _) = Fixture::default().build();
        let mut req = request(DesiredState::Present);
        req.service_descriptor = Some(ServiceDescriptor::Path(wsdl.path().to_path_buf()));

        let outcome = controller.apply(&req).await.unwrap();

        let endpoint = outcome.endpoint.unwrap();
        assert_eq!(endpoint.kind(), "custom");
        assert_eq!(endpoint.url().host_str(), Some("alt.example.net"));
    }

    #[tokio::test]
    async fn interior_digit_key_uses_internal_service() {
        let (controller, _) = Fixture::default().build();
        let req = LicenseRequest::new(DesiredState::Present, "ABCDE-FGH1J-KLMNO-PQRST-UVWXYZZ");

        let outcome = controller.apply(&req).await.unwrap();

        assert_eq!(outcome.endpoint.as_ref().map(ActivationEndpoint::kind), Some("internal"));
    }

    // ── Removal ─────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn absent_removes_license_and_restores_shell() {
        let (controller, journal) = Fixture {
            statuses: vec![
                ActivationStatus::Enabled,
                ActivationStatus::Enabled,
                ActivationStatus::Disabled,
            ],
            ..Fixture::default()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.status, ActivationStatus::Disabled);
        assert!(outcome.warnings.is_empty());
        assert_eq!(
            entries(&journal),
            vec![
                "set_shell bash",
                "open",
                "delete_file /config/bigip.license",
                "delete_file /config/bigiq.license",
                "run reloadlic",
                "close",
                "set_shell tmsh",
            ]
        );
        let report = outcome.removal.unwrap();
        assert!(report.disable.is_confirmed());
        assert_eq!(report.disable.attempts, 2);
        assert!(report.shell_restore.unwrap().is_confirmed());
    }

    #[tokio::test(start_paused = true)]
    async fn bash_account_keeps_its_shell() {
        let (controller, journal) = Fixture {
            account: AccountRecord {
                name: "admin".into(),
                shell: AccountShell::Bash,
                roles: vec!["admin".into()],
            },
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.removal.unwrap().shell_restore.is_none());
        assert!(!entries(&journal).iter().any(|e| e.starts_with("set_shell")));
    }

    #[tokio::test]
    async fn unprivileged_account_is_refused() {
        let (controller, journal) = Fixture {
            account: AccountRecord {
                name: "admin".into(),
                shell: AccountShell::Tmsh,
                roles: vec!["operator".into()],
            },
            ..Fixture::licensed()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Absent))
            .await
            .unwrap_err();

        assert!(
            matches!(err, CoreError::UnprivilegedAccount { ref role, .. } if role == "operator"),
            "got {err:?}"
        );
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test]
    async fn removal_requires_command_channel() {
        let (controller, journal) = Fixture {
            ssh: false,
            ..Fixture::licensed()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Absent))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Unsupported { .. }));
        assert!(entries(&journal).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_license_files_are_tolerated() {
        let (controller, _) = Fixture {
            missing_files: vec!["/config/bigip.license", "/config/bigiq.license"],
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();
        assert!(outcome.changed);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_fault_propagates_after_shell_restore() {
        let (controller, journal) = Fixture {
            failing_deletes: vec!["/config/bigip.license"],
            ..Fixture::licensed()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Absent))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { .. }), "got {err:?}");
        let journal = entries(&journal);
        assert!(!journal.contains(&"run reloadlic".to_owned()));
        assert!(journal.contains(&"close".to_owned()));
        assert_eq!(journal.last().map(String::as_str), Some("set_shell tmsh"));
    }

    #[tokio::test(start_paused = true)]
    async fn bigiq_delete_fault_aborts_before_reload() {
        let (controller, journal) = Fixture {
            failing_deletes: vec!["/config/bigiq.license"],
            ..Fixture::licensed()
        }
        .build();

        let err = controller
            .apply(&request(DesiredState::Absent))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { .. }), "got {err:?}");
        assert_eq!(
            entries(&journal),
            vec![
                "set_shell bash",
                "open",
                "delete_file /config/bigip.license",
                "delete_file /config/bigiq.license",
                "close",
                "set_shell tmsh",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn absent_bigiq_license_still_reloads() {
        let (controller, journal) = Fixture {
            missing_files: vec!["/config/bigiq.license"],
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.changed);
        assert!(outcome.removal.unwrap().disable.is_confirmed());
        let journal = entries(&journal);
        assert!(journal.contains(&"delete_file /config/bigip.license".to_owned()));
        assert!(journal.contains(&"delete_file /config/bigiq.license".to_owned()));
        assert!(journal.contains(&"run reloadlic".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_exit_status_is_not_trusted() {
        let (controller, journal) = Fixture {
            reload_status: Some(1),
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.status, ActivationStatus::Disabled);
        assert!(outcome.warnings.is_empty());
        assert!(entries(&journal).contains(&"set_shell tmsh".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn shell_restore_confirmed_on_third_poll() {
        let (controller, journal) = Fixture {
            login_shells: vec![AccountShell::Bash, AccountShell::Bash, AccountShell::Tmsh],
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        let restore = outcome.removal.unwrap().shell_restore.unwrap();
        assert!(restore.is_confirmed());
        assert_eq!(restore.attempts, 3);
        assert!(restore.elapsed >= Duration::from_secs(10));
        let restores = entries(&journal)
            .iter()
            .filter(|e| *e == "set_shell tmsh")
            .count();
        assert_eq!(restores, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_restore_is_a_warning() {
        let (controller, _) = Fixture {
            login_shells: vec![AccountShell::Bash],
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        let restore = outcome.removal.unwrap().shell_restore.unwrap();
        assert_eq!(restore.status, PollStatus::TimedOut);
        assert_eq!(restore.elapsed, Duration::from_secs(60));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("shell restoration"));
    }

    #[tokio::test(start_paused = true)]
    async fn strict_removal_fails_on_unconfirmed_restore() {
        let (controller, _) = Fixture {
            login_shells: vec![AccountShell::Bash],
            ..Fixture::licensed()
        }
        .build();
        let mut req = request(DesiredState::Absent);
        req.strict_removal = true;

        let err = controller.apply(&req).await.unwrap_err();
        assert!(matches!(err, CoreError::OperationFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn device_that_stays_enabled_is_reported() {
        let (controller, _) = Fixture {
            statuses: vec![ActivationStatus::Enabled],
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.status, ActivationStatus::Enabled);
        let report = outcome.removal.unwrap();
        assert_eq!(report.disable.status, PollStatus::TimedOut);
        assert!(outcome.warnings[0].starts_with("license removal"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_shell_switch_does_not_stop_removal() {
        let (controller, journal) = Fixture {
            set_shell_fails: true,
            ..Fixture::licensed()
        }
        .build();

        let outcome = controller.apply(&request(DesiredState::Absent)).await.unwrap();

        assert!(outcome.changed);
        assert!(entries(&journal).contains(&"run reloadlic".to_owned()));
        assert!(outcome.removal.unwrap().shell_restore.unwrap().is_confirmed());
    }
}
