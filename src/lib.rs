pub mod addr;
pub mod cli;
pub mod control;
pub mod dscp;
pub mod error;
pub mod logger;
pub mod net;
pub mod padding;
pub mod reflector;
pub mod report;
pub mod role;
pub mod sender;
pub mod stats;

use cli::{Cli, Role};

/// Dispatches a parsed `Cli` to its role driver. Exposed as a library entry
/// point (mirroring the teacher's `server_main`) so integration tests can
/// drive the binary's behavior without a subprocess.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.role {
        Role::Responder { local, timer: _, endpoint } => {
            role::run_responder(&local, &endpoint).await
        }
        Role::Sender { remote, local, interval, count, endpoint } => {
            role::run_sender(&remote, &local, interval, count, &endpoint).await
        }
        Role::Controller { remote, local, interval, count, endpoint } => {
            role::run_controller(&remote, &local, interval, count, &endpoint).await
        }
        Role::ControlClient { sender, server, count, endpoint } => {
            role::run_control_client(&sender, &server, count, &endpoint).await
        }
        Role::DscpTable => {
            dscp::print_table();
            Ok(())
        }
    }
}
