//! Actions the runner performs against a module.

use crate::config::RunnerConfig;
use crate::{RunnerError, RunnerResult};
use eltest_at_protocol::{terminate_command, Command, ConfKey};
use eltest_engine::{ConsoleObserver, DeviceInfo, ProtocolEngine};
use eltest_transport::{SerialTransport, Transport};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Module identity plus run context, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    /// Host platform from the configuration.
    pub platform: Option<String>,
    /// Time taken by the reset sequence, if one ran.
    pub sync_elapsed_ms: Option<u64>,
    /// What the module reported.
    #[serde(flatten)]
    pub device: DeviceInfo,
}

/// Open the configured serial port and wrap it in an engine.
///
/// Echoed exchanges are printed to standard output.
pub fn open_engine(config: &RunnerConfig) -> RunnerResult<ProtocolEngine<SerialTransport>> {
    let transport = SerialTransport::open(&config.serial)?;
    let engine = ProtocolEngine::new(transport, config.engine.clone())?
        .with_observer(ConsoleObserver::stdout());
    Ok(engine)
}

/// Synchronize with the module and read its identity.
pub fn reset<T: Transport>(
    engine: &mut ProtocolEngine<T>,
    platform: Option<String>,
) -> RunnerResult<DeviceReport> {
    info!("resetting device");
    let sync = engine.reset_device()?;
    let device = engine.device_info()?;
    Ok(DeviceReport {
        platform,
        sync_elapsed_ms: Some(u64::try_from(sync.elapsed.as_millis()).unwrap_or(u64::MAX)),
        device,
    })
}

/// Read the identity of an already running module.
pub fn info<T: Transport>(
    engine: &mut ProtocolEngine<T>,
    platform: Option<String>,
) -> RunnerResult<DeviceReport> {
    let device = engine.device_info()?;
    Ok(DeviceReport {
        platform,
        sync_elapsed_ms: None,
        device,
    })
}

/// Send one raw command with echo, adding `\r\n` if the text has no line
/// ending.
pub fn send<T: Transport>(
    engine: &mut ProtocolEngine<T>,
    payload: &str,
    timeout: Option<Duration>,
) -> RunnerResult<String> {
    let timeout = timeout.unwrap_or(engine.config().command_timeout);
    Ok(engine.send_command(&terminate_command(payload), timeout, true)?)
}

/// Upload the server root CA and/or OTA signing certificate.
///
/// Returns the number of certificates installed.
pub fn install_certs<T: Transport>(
    engine: &mut ProtocolEngine<T>,
    root_ca: Option<&str>,
    ota_cert: Option<&str>,
) -> RunnerResult<usize> {
    let uploads = [(ConfKey::RootCa, root_ca), (ConfKey::OtaCertificate, ota_cert)];
    let mut installed = 0;
    for (key, pem) in uploads {
        let Some(pem) = pem else { continue };
        let command = Command::conf_pem(key, pem)?;
        engine.write_conf(&command, true)?;
        info!(key = key.as_str(), "installed certificate");
        installed += 1;
    }
    if installed == 0 {
        return Err(RunnerError::ConfigError(
            "no certificate given (use --root-ca and/or --ota-cert)".to_string(),
        ));
    }
    Ok(installed)
}
