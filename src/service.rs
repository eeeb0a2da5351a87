//! Windows service hosting.
//!
//! The agent normally runs under the service control manager so it is
//! already polling by the time the MDM agent provisions enrollment
//! entries at user logon. SCM stop events raise the same shutdown
//! signal the foreground path wires to Ctrl+C.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::time::Duration;

use windows_service::{
    define_windows_service,
    service::{
        ServiceAccess, ServiceControl, ServiceControlAccept, ServiceErrorControl, ServiceExitCode,
        ServiceInfo, ServiceStartType, ServiceState, ServiceStatus, ServiceType,
    },
    service_control_handler::{self, ServiceControlHandlerResult},
    service_dispatcher,
    service_manager::{ServiceManager, ServiceManagerAccess},
};

use crate::agent;
use crate::registry::WindowsRegistry;

/// Service name as registered with the SCM.
pub const SERVICE_NAME: &str = "ScepSanPatcher";

/// Display name shown in services.msc.
pub const SERVICE_DISPLAY_NAME: &str = "MDM SCEP SAN Patcher";

const SERVICE_DESCRIPTION: &str = "Rewrites the SAN type on MobileIron SCEP enrollment entries \
                                   so issued certificates carry a UPN subject alternative name";

const SERVICE_TYPE: ServiceType = ServiceType::OWN_PROCESS;

/// Hand the process over to the service dispatcher.
///
/// Blocks until the service is stopped; must be called from a process
/// launched by the SCM.
pub fn run() -> Result<()> {
    service_dispatcher::start(SERVICE_NAME, ffi_service_main)
        .context("Failed to start service dispatcher")
}

define_windows_service!(ffi_service_main, service_main);

fn service_main(_arguments: Vec<OsString>) {
    if let Err(e) = run_service() {
        tracing::error!("Service failed: {:#}", e);
    }
}

fn run_service() -> Result<()> {
    let (handle, signal) = agent::shutdown_pair();

    let event_handler = move |control_event| -> ServiceControlHandlerResult {
        match control_event {
            ServiceControl::Stop | ServiceControl::Shutdown | ServiceControl::Preshutdown => {
                tracing::info!("Received stop control event");
                handle.trigger();
                ServiceControlHandlerResult::NoError
            }
            ServiceControl::Interrogate => ServiceControlHandlerResult::NoError,
            _ => ServiceControlHandlerResult::NotImplemented,
        }
    };

    let status_handle = service_control_handler::register(SERVICE_NAME, event_handler)
        .context("Failed to register control handler")?;

    let report = |state: ServiceState, controls: ServiceControlAccept, wait_hint: Duration| {
        let status = ServiceStatus {
            service_type: SERVICE_TYPE,
            current_state: state,
            controls_accepted: controls,
            exit_code: ServiceExitCode::Win32(0),
            checkpoint: 0,
            wait_hint,
            process_id: None,
        };
        if let Err(e) = status_handle.set_service_status(status) {
            tracing::error!("Failed to set service status: {}", e);
        }
    };

    report(
        ServiceState::StartPending,
        ServiceControlAccept::empty(),
        Duration::from_secs(10),
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create runtime")?;

    report(
        ServiceState::Running,
        ServiceControlAccept::STOP
            | ServiceControlAccept::PRESHUTDOWN
            | ServiceControlAccept::SHUTDOWN,
        Duration::ZERO,
    );

    let result = runtime.block_on(agent::run_patch_daemon(WindowsRegistry, signal));

    report(ServiceState::Stopped, ServiceControlAccept::empty(), Duration::ZERO);

    result
}

/// Register the agent with the SCM as an auto-start service.
pub fn install() -> Result<()> {
    let manager =
        ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CREATE_SERVICE)
            .context("Failed to open service manager")?;

    let service_info = ServiceInfo {
        name: SERVICE_NAME.into(),
        display_name: SERVICE_DISPLAY_NAME.into(),
        service_type: SERVICE_TYPE,
        start_type: ServiceStartType::AutoStart,
        error_control: ServiceErrorControl::Normal,
        executable_path: std::env::current_exe().context("Failed to get executable path")?,
        launch_arguments: vec!["service".into(), "run".into()],
        dependencies: vec![],
        account_name: None, // LocalSystem
        account_password: None,
    };

    let service = manager
        .create_service(&service_info, ServiceAccess::CHANGE_CONFIG)
        .context("Failed to create service")?;
    service
        .set_description(SERVICE_DESCRIPTION)
        .context("Failed to set service description")?;

    tracing::info!("Service '{}' installed", SERVICE_NAME);
    Ok(())
}

/// Remove the agent from the SCM.
pub fn uninstall() -> Result<()> {
    let manager = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
        .context("Failed to open service manager")?;

    let service = manager
        .open_service(SERVICE_NAME, ServiceAccess::DELETE)
        .context("Failed to open service")?;
    service.delete().context("Failed to delete service")?;

    tracing::info!("Service '{}' uninstalled", SERVICE_NAME);
    Ok(())
}
