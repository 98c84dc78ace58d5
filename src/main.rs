use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fastly-debug",
    about = "Collects Fastly edge network-path diagnostics into an encoded support report",
    version,
    long_about = None
)]
struct Cli {
    /// Turn on debugging information (probe headers, raw payloads)
    #[arg(short = 'D', long)]
    debug: bool,

    /// Filename to write the encoded output into
    #[arg(short, long)]
    out: Option<String>,

    /// Do not display the data to be encoded
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the report on stdout.
    let default_filter = if cli.debug {
        "fastly_debug=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let report = fastly_debug::collect_report(cli.debug).await?;
    let json = serde_json::to_string_pretty(&report)?;
    fastly_debug::output::send_out(&json, cli.quiet, cli.out.as_deref())?;

    Ok(())
}
