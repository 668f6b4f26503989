use clap::{Parser, Subcommand};

/// TWAMP / TWAMP-Light (RFC 5357) one-way and round-trip delay, jitter and
/// loss measurement tool.
#[derive(Parser)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub role: Role,

    /// suppress all but warning/error log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// verbose (info-level) log output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// debug-level log output.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// write log output to this file instead of stderr.
    #[arg(long, global = true)]
    pub logfile: Option<String>,
}

/// Socket options shared by every role that opens a UDP or TCP endpoint.
#[derive(Parser, Clone)]
pub struct EndpointArgs {
    /// IP_TOS / IPv6_TCLASS byte, as hex (e.g. "0xb8").
    #[arg(long)]
    pub tos: Option<String>,

    /// DSCP name (see `dscptable`); overrides `--tos` when both are given.
    #[arg(long)]
    pub dscp: Option<String>,

    /// IP_TTL / IPv6 hop limit.
    #[arg(long)]
    pub ttl: Option<u32>,

    /// trailing pad length in bytes; omit for the default IMIX mix.
    #[arg(long, allow_hyphen_values = true)]
    pub padding: Option<i64>,

    /// request the do-not-fragment MTU-discovery mode.
    #[arg(long)]
    pub do_not_fragment: bool,
}

#[derive(Subcommand)]
pub enum Role {
    /// Session-Reflector: receive test packets and reflect them.
    Responder {
        /// local bind address; `:PORT` binds any interface.
        #[arg(default_value = ":20001")]
        local: String,

        /// reserved for a future per-session reset override; currently
        /// accepted but unused.
        #[arg(long)]
        timer: Option<u64>,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Session-Sender: emit a timed stream of test packets.
    Sender {
        /// reflector address to send test packets to.
        #[arg(default_value = "127.0.0.1:20001")]
        remote: String,

        /// local bind address; `:PORT` binds any interface.
        #[arg(default_value = ":20000")]
        local: String,

        /// inter-packet interval, milliseconds.
        #[arg(short = 'i', long, default_value_t = 100)]
        interval: u64,

        /// number of test packets to send.
        #[arg(short = 'c', long, default_value_t = 100)]
        count: u32,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Combined Control-Client and Session-Sender.
    Controller {
        /// TWAMP server's control-channel address.
        remote: String,

        /// local bind address for the control connection and test session.
        local: String,

        /// inter-packet interval, milliseconds.
        #[arg(short = 'i', long, default_value_t = 100)]
        interval: u64,

        /// number of test packets to send.
        #[arg(short = 'c', long, default_value_t = 100)]
        count: u32,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Control-Client only: negotiate and start/stop a session, then block.
    ControlClient {
        /// address of the TWAMP-Light session sender/reflector to request.
        sender: String,

        /// TWAMP server's control-channel address.
        server: String,

        /// number of test packets the requested session should run.
        #[arg(short = 'c', long, default_value_t = 100)]
        count: u32,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Print the fixed DSCP name -> TOS mapping and exit.
    DscpTable,
}
