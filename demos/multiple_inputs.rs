//! Watching stdout and stderr of a child process at the same time

use multiexpect::filter::strip_ansi;
use multiexpect::matcher::{contains, eof};
use multiexpect::{Expect, ExpectEvent};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg("read name; echo \"hello $name\"; echo oops >&2")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdin = child.stdin.take().ok_or_else(|| anyhow::anyhow!("no stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| anyhow::anyhow!("no stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| anyhow::anyhow!("no stderr"))?;

    let mut expect = Expect::builder()
        .output(stdin)
        .input(stdout)
        .input(stderr)
        .input_filter(strip_ansi())
        .timeout(Duration::from_secs(5))
        .observer(|event| {
            if let ExpectEvent::Matched { input, matcher, .. } = event {
                tracing::info!(input, %matcher, "matched");
            }
        })
        .build()?;

    expect.send_line("world").await?;

    let greeting = expect.expect_in(0, contains("hello")).await?;
    println!("stdout matched: {}", greeting.group()?);

    let error = expect.expect_in(1, contains("oops")).await?;
    println!("stderr matched: {}", error.group()?);

    let rest = expect.expect_in(0, eof()).await?;
    println!("stdout rest: {:?}", rest.before()?);

    expect.close().await?;
    let status = child.wait().await?;
    println!("exit: {}", status);
    Ok(())
}
