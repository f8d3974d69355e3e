//! Interact loop example: answer prompts until the shell is ready
//!
//! The far end is simulated with an in-memory stream.

use multiexpect::matcher::{contains, regexp};
use multiexpect::{Expect, InteractAction};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (ours, theirs) = tokio::io::duplex(1024);
    let (reader, writer) = tokio::io::split(ours);

    // A fake login server
    let server = tokio::spawn(async move {
        let (server_reader, mut server_writer) = tokio::io::split(theirs);
        let mut lines = BufReader::new(server_reader).lines();

        server_writer.write_all(b"Warning: insecure line\nlogin: ").await?;
        let user = lines.next_line().await?.unwrap_or_default();
        server_writer.write_all(b"password: ").await?;
        let _password = lines.next_line().await?;
        server_writer
            .write_all(format!("Welcome {}\nuser@host$ ", user).as_bytes())
            .await?;
        anyhow::Ok(())
    });

    let mut expect = Expect::builder()
        .output(writer)
        .input(reader)
        .timeout(Duration::from_secs(5))
        .build()?;

    let mut warnings = 0;
    let result = expect
        .interact()
        .when(regexp(r"Warning: (.*)\n")?)
        .then(|r| {
            warnings += 1;
            println!("warning: {:?}", r.group_at(1));
            InteractAction::Continue
        })
        .when(contains("login: "))
        .then(|_| InteractAction::send_line("user"))
        .when(contains("password: "))
        .then(|_| InteractAction::send_line("hunter2"))
        .until(contains("$ "))
        .await?;

    println!("Logged in after {} warning(s): {:?}", warnings, result.before()?);

    expect.close().await?;
    server.await??;
    Ok(())
}
