//! Integration tests for multiexpect

use multiexpect::filter::{strip_ansi, FilterChain, Switch, Toggle};
use multiexpect::matcher::{any_of, contains, eof, regexp, times, MatcherExt};
use multiexpect::{Expect, ExpectBuilder, ExpectError, ExpectEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Facade over an in-memory stream; the returned half plays the far end.
fn connect(builder: ExpectBuilder) -> (Expect, DuplexStream) {
    let (ours, theirs) = duplex(8192);
    let (reader, writer) = split(ours);
    let expect = builder
        .output(writer)
        .input(reader)
        .build()
        .expect("Failed to build");
    (expect, theirs)
}

#[tokio::test]
async fn test_streaming_match() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    for _ in 0..3 {
        peer.write_all(b"a1b2c3_").await.unwrap();
    }

    let result = expect.expect(contains("b2")).await.expect("No match");
    assert_eq!(result.before().unwrap(), "a1");
    assert_eq!(result.group().unwrap(), "b2");

    // The rest of the buffer is still there for the next call.
    let next = expect.expect(contains("a1")).await.expect("No match");
    assert_eq!(next.before().unwrap(), "c3_");
}

#[tokio::test]
async fn test_regex_groups() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"a1b2c3").await.unwrap();

    let result = expect
        .expect(regexp("a(.)b(.)c(.)").expect("Invalid regex"))
        .await
        .expect("No match");
    assert_eq!(result.group_count().unwrap(), 3);
    assert_eq!(result.group_at(1).unwrap(), Some("1"));
    assert_eq!(result.group_at(3).unwrap(), Some("3"));
}

#[tokio::test]
async fn test_all_of_selects_greatest_end() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"a1b2c3_a1b2").await.unwrap();

    let result = expect
        .expect_all(vec![
            contains("a").boxed(),
            contains("b").boxed(),
            regexp("a(.*)").unwrap().boxed(),
        ])
        .await
        .expect("No match");
    assert_eq!(result.results().len(), 3);
    assert_eq!(result.end().unwrap(), "a1b2c3_a1b2".len());
    assert_eq!(result.group_at(1).unwrap(), Some("1b2c3_a1b2"));
}

#[tokio::test]
async fn test_all_of_tie_goes_to_smallest_index() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"a1b2c3_").await.unwrap();

    let result = expect
        .expect_all(vec![
            contains("c3").boxed(),
            regexp("b2c3").unwrap().boxed(),
            contains("a1").boxed(),
        ])
        .await
        .expect("No match");
    assert_eq!(result.end().unwrap(), 6);
    // Index 0 wins the tie, so `before` stops at "c3".
    assert_eq!(result.before().unwrap(), "a1b2");

    let rest = expect.expect(contains("_")).await.expect("No match");
    assert_eq!(rest.before().unwrap(), "");
}

#[tokio::test]
async fn test_any_of_without_success() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_millis(100)));
    peer.write_all(b"nothing here").await.unwrap();

    let result = expect
        .expect(any_of(vec![contains("x"), contains("y")]).unwrap())
        .await
        .expect("Unsuccessful results are not errors by default");
    assert!(!result.is_successful());
    assert_eq!(result.results().len(), 2);
    assert_eq!(result.input(), result.results()[0].input());
    assert!(matches!(result.before(), Err(ExpectError::NoResult)));
}

#[tokio::test]
async fn test_times() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"ok ok ok done").await.unwrap();

    let result = expect
        .expect(times(3, contains("ok")).unwrap())
        .await
        .expect("No match");
    assert_eq!(result.results().len(), 3);
    assert_eq!(result.end().unwrap(), 8);

    let done = expect.expect(contains("done")).await.unwrap();
    assert_eq!(done.before().unwrap(), " ");
}

#[tokio::test]
async fn test_eof_after_consumed_input() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"x").await.unwrap();
    expect.expect(contains("x")).await.unwrap();
    drop(peer);

    let err = expect.expect(contains("y")).await.unwrap_err();
    assert!(err.is_eof());
    assert!(err.is_io());
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_eof_with_pending_text() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    peer.write_all(b"x").await.unwrap();
    drop(peer);

    let err = expect.expect(contains("y")).await.unwrap_err();
    assert!(err.is_eof());

    let rest = expect.expect(eof()).await.expect("eof() matches at end of stream");
    assert_eq!(rest.before().unwrap(), "x");
}

#[tokio::test]
async fn test_timeout_then_late_data() {
    let (mut expect, mut peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));

    let missed = expect
        .expect_timeout(Duration::from_millis(50), contains("ready"))
        .await
        .unwrap();
    assert!(!missed.is_successful());

    peer.write_all(b"ready").await.unwrap();
    let result = expect.expect(contains("ready")).await.unwrap();
    assert!(result.is_successful());
}

#[tokio::test]
async fn test_deadline_with_steady_unmatched_output() {
    let (mut expect, peer) = connect(Expect::builder().timeout(Duration::from_secs(5)));
    let (_peer_reader, mut peer_writer) = split(peer);
    let chatter = tokio::spawn(async move {
        while peer_writer.write_all(b"noise ").await.is_ok() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let started = std::time::Instant::now();
    let missed = expect
        .expect_timeout(Duration::from_millis(100), contains("never"))
        .await
        .unwrap();
    assert!(!missed.is_successful());
    assert!(missed.input().starts_with("noise"));
    assert!(started.elapsed() < Duration::from_secs(1));

    expect.close().await.unwrap();
    chatter.abort();
}

#[tokio::test]
async fn test_error_on_timeout() {
    let (mut expect, mut peer) = connect(
        Expect::builder()
            .timeout(Duration::from_millis(100))
            .error_on_timeout(true),
    );
    peer.write_all(b"prompt> ").await.unwrap();

    let err = expect.expect(contains("never")).await.unwrap_err();
    assert!(err.is_timeout());
    match err {
        ExpectError::Timeout { duration, input } => {
            assert_eq!(duration, Duration::from_millis(100));
            assert_eq!(input, "prompt> ");
        }
        other => panic!("Unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_exception_on_failure_covers_timeouts() {
    let (mut expect, _peer) = connect(
        Expect::builder()
            .timeout(Duration::from_millis(50))
            .exception_on_failure(true),
    );
    let err = expect.expect(contains("never")).await.unwrap_err();
    assert!(matches!(err, ExpectError::Unsuccessful { .. }));
}

#[tokio::test]
async fn test_send_variants() {
    let (mut expect, mut peer) = connect(Expect::builder());
    expect.send("abc").await.unwrap();
    expect.send_line("def").await.unwrap();
    expect.send_bytes(&[0x03]).await.unwrap();
    expect.send_line("").await.unwrap();

    let mut buf = [0u8; 9];
    peer.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"abcdef\n\x03\n");
}

#[tokio::test]
async fn test_multiple_inputs() {
    let (out, _out_peer) = duplex(64);
    let (stdout, mut stdout_peer) = duplex(1024);
    let (stderr, mut stderr_peer) = duplex(1024);

    let mut expect = Expect::builder()
        .output(out)
        .input(stdout)
        .input(stderr)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    assert_eq!(expect.input_count(), 2);

    stderr_peer.write_all(b"warning: disk").await.unwrap();
    stdout_peer.write_all(b"result=42").await.unwrap();

    let warning = expect.expect_in(1, contains("warning")).await.unwrap();
    assert_eq!(warning.group().unwrap(), "warning");
    let out = expect.expect(regexp(r"result=(\d+)").unwrap()).await.unwrap();
    assert_eq!(out.group_at(1).unwrap(), Some("42"));

    // Each input keeps its own buffer.
    let missed = expect
        .expect_in_timeout(0, Duration::from_millis(50), contains("disk"))
        .await
        .unwrap();
    assert!(!missed.is_successful());
    let disk = expect.expect_in(1, contains("disk")).await.unwrap();
    assert_eq!(disk.before().unwrap(), ": ");

    assert!(matches!(
        expect.expect_in(2, contains("x")).await,
        Err(ExpectError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_input_filter_with_switch() {
    let switch = Switch::new();
    let (mut expect, mut peer) = connect(
        Expect::builder()
            .timeout(Duration::from_secs(5))
            .input_filter(Toggle::with_switch(strip_ansi(), switch.clone())),
    );

    peer.write_all(b"\x1b[1mbold\x1b[0m;").await.unwrap();
    expect.expect(contains("bold;")).await.unwrap();

    switch.disable();
    peer.write_all(b"\x1b[1mraw;").await.unwrap();
    let raw = expect.expect(contains("raw;")).await.unwrap();
    assert_eq!(raw.before().unwrap(), "\x1b[1m");
}

#[tokio::test]
async fn test_filter_chain_per_input() {
    let chain = FilterChain::new().with(strip_ansi());
    let (out, _out_peer) = duplex(64);
    let (first, mut first_peer) = duplex(1024);
    let (second, mut second_peer) = duplex(1024);
    let mut expect = Expect::builder()
        .output(out)
        .input(first)
        .input(second)
        .input_filter(chain)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    // An escape sequence split on one input must not leak into the other.
    first_peer.write_all(b"one \x1b[3").await.unwrap();
    second_peer.write_all(b"two \x1b[32mgreen").await.unwrap();
    let second = expect.expect_in(1, contains("two green")).await.unwrap();
    assert!(second.is_successful());

    first_peer.write_all(b"1mitalic").await.unwrap();
    let first = expect.expect_in(0, contains("one italic")).await.unwrap();
    assert!(first.is_successful());
}

#[tokio::test]
async fn test_observer_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    let (mut expect, mut peer) = connect(
        Expect::builder()
            .timeout(Duration::from_secs(5))
            .observer(move |e| seen.lock().unwrap().push(e.clone())),
    );

    expect.send("hi").await.unwrap();
    peer.write_all(b"hello").await.unwrap();
    expect.expect(contains("hell")).await.unwrap();
    expect.close().await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events[0], ExpectEvent::Sent { bytes: 2 });
    assert!(events.contains(&ExpectEvent::Matched {
        input: 0,
        matcher: "contains(\"hell\")".to_string(),
        consumed: 4,
    }));
    assert_eq!(events.last(), Some(&ExpectEvent::Closed));
}

#[tokio::test]
async fn test_set_timeout() {
    let (mut expect, _peer) = connect(Expect::builder());
    expect.set_timeout(Duration::from_millis(30)).unwrap();
    assert_eq!(expect.timeout(), Duration::from_millis(30));

    let started = std::time::Instant::now();
    let missed = expect.expect(contains("x")).await.unwrap();
    assert!(!missed.is_successful());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut expect, _peer) = connect(Expect::builder());
    expect.close().await.unwrap();
    expect.close().await.unwrap();
    assert!(matches!(
        expect.send_line("late").await,
        Err(ExpectError::Closed)
    ));
}

#[test]
fn test_build_without_runtime() {
    let (ours, _theirs) = duplex(16);
    let (reader, writer) = split(ours);
    let result = Expect::builder().output(writer).input(reader).build();
    assert!(matches!(result, Err(ExpectError::Runtime(_))));
}

#[cfg(unix)]
mod pty {
    use super::*;

    #[tokio::test]
    async fn test_basic_command_execution() {
        let mut expect = Expect::builder()
            .timeout(Duration::from_secs(5))
            .spawn("echo Hello World")
            .expect("Failed to spawn command");

        let result = expect
            .expect(contains("Hello"))
            .await
            .expect("Failed to find 'Hello'");
        assert_eq!(result.group().unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let mut expect = Expect::builder()
            .timeout(Duration::from_secs(5))
            .spawn("cat")
            .expect("Failed to spawn cat");

        expect.send_line("ping").await.unwrap();
        let result = expect.expect(contains("ping")).await.unwrap();
        assert!(result.is_successful());

        expect.close().await.unwrap();
        assert!(matches!(expect.is_alive(), Err(ExpectError::ProcessExited)));
    }

    #[tokio::test]
    async fn test_is_alive_and_wait() {
        let mut expect = Expect::builder()
            .timeout(Duration::from_secs(5))
            .spawn("echo done")
            .expect("Failed to spawn");

        expect.expect(contains("done")).await.unwrap();
        let status = expect.wait().await.unwrap();
        assert!(status.success());
        assert!(matches!(expect.wait().await, Err(ExpectError::ProcessExited)));
    }

    #[tokio::test]
    async fn test_eof_after_exit() {
        let mut expect = Expect::builder()
            .timeout(Duration::from_secs(5))
            .spawn("echo bye")
            .expect("Failed to spawn");

        let result = expect.expect(eof()).await.unwrap();
        assert!(result.before().unwrap().contains("bye"));
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_command() {
        let result = Expect::spawn("definitely-not-a-real-command-xyz");
        assert!(matches!(result, Err(ExpectError::SpawnError(_))));
    }
}
