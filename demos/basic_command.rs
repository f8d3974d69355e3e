//! Basic command execution example

use multiexpect::matcher::{contains, eof};
use multiexpect::{EchoWriter, Expect};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("multiexpect - Basic Command Example");
    println!("{}", "=".repeat(50));

    // Spawn a simple command on a PTY, mirroring its output to stderr
    let mut expect = Expect::builder()
        .timeout(Duration::from_secs(5))
        .echo(EchoWriter::new(std::io::stderr()))
        .spawn(if cfg!(windows) {
            "cmd /C echo Hello from multiexpect!"
        } else {
            "echo Hello from multiexpect!"
        })?;

    // Wait for the output to contain "Hello"
    let result = expect.expect(contains("Hello")).await?;
    println!("Matched: {}", result.group()?);
    println!("Before match: {:?}", result.before()?);

    // Everything else up to the end of the stream
    let rest = expect.expect(eof()).await?;
    println!("Rest: {:?}", rest.before()?);

    let status = expect.wait().await?;
    println!("Exit code: {}", status.exit_code());

    expect.close().await?;
    println!("\n✓ Example complete!");

    Ok(())
}
