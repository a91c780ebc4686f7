//! Integration tests for uexpect

use std::time::{Duration, Instant};
use uexpect::{Error, LifecycleState, Pattern, Session, SessionRegistry, Shell, Signal};

fn sh(script: &str) -> Session {
    Session::builder()
        .timeout(Duration::from_secs(5))
        .arg("-c")
        .arg(script)
        .spawn("sh")
        .expect("Failed to spawn sh")
}

#[tokio::test]
async fn test_literal_matches_first_occurrence() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'world hello there hello'");

    let result = session
        .expect(Pattern::exact("hello"))
        .await
        .expect("Pattern not found");

    assert_eq!(result.matched, "hello");
    assert_eq!(result.before, "world ");
    assert_eq!(result.end - result.start, "hello".len());
}

#[tokio::test]
async fn test_declaration_order_breaks_ties() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'abcdef'");

    // both patterns can match at the same offset; the first declared wins
    let patterns = [Pattern::exact("abc"), Pattern::exact("abcdef")];
    let result = session
        .expect_any(&patterns)
        .await
        .expect("No pattern matched");

    assert_eq!(result.pattern_index, 0);
    assert_eq!(result.matched, "abc");
}

#[tokio::test]
async fn test_earliest_offset_wins_over_declaration() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'xx early then later'");

    let patterns = [Pattern::exact("later"), Pattern::exact("early")];
    let result = session
        .expect_any(&patterns)
        .await
        .expect("No pattern matched");

    assert_eq!(result.pattern_index, 1);
    assert_eq!(result.matched, "early");
}

#[tokio::test]
async fn test_consumed_bytes_never_rematch() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'one two one'; sleep 1");

    let first = session
        .expect(Pattern::exact("one"))
        .await
        .expect("First occurrence not found");
    assert_eq!(first.before, "");

    let second = session
        .expect(Pattern::exact("one"))
        .await
        .expect("Second occurrence not found");
    assert_eq!(second.before, " two ");

    // both occurrences are consumed now
    let third = session
        .expect_with_timeout(Pattern::exact("one"), Some(Duration::from_millis(200)))
        .await;
    assert!(matches!(third, Err(Error::Timeout { .. })));
}

#[tokio::test]
async fn test_timeout_window() {
    if cfg!(windows) {
        return;
    }

    let session = sh("sleep 2");
    let timeout = Duration::from_millis(300);

    let started = Instant::now();
    let result = session
        .expect_with_timeout(Pattern::exact("NEVER_APPEARS"), Some(timeout))
        .await;
    let elapsed = started.elapsed();

    match result {
        Err(Error::Timeout { duration, .. }) => assert_eq!(duration, timeout),
        other => panic!("Expected timeout, got {other:?}"),
    }
    // never early; late by at most the poll quantum plus scheduling slack
    assert!(elapsed >= timeout, "returned early: {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_millis(700), "overshot: {elapsed:?}");
}

#[tokio::test]
async fn test_timeout_sentinel_resolves_as_match() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf pending; sleep 2");

    let patterns = [Pattern::exact("NEVER"), Pattern::Timeout];
    let result = session
        .expect_any_with_timeout(&patterns, Some(Duration::from_millis(200)))
        .await
        .expect("Timeout sentinel should resolve as a match");

    assert_eq!(result.pattern_index, 1);
    assert_eq!(result.matched, "");
    assert_eq!(result.before, "pending");

    // the soft timeout left the buffer unconsumed
    let again = session
        .expect(Pattern::exact("pending"))
        .await
        .expect("Unconsumed data should still match");
    assert_eq!(again.before, "");
}

#[tokio::test]
async fn test_second_expect_fails_busy() {
    if cfg!(windows) {
        return;
    }

    let session = sh("sleep 2");

    let background = session.clone();
    let pending = tokio::spawn(async move {
        background
            .expect_with_timeout(Pattern::exact("NEVER"), Some(Duration::from_secs(1)))
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let second = session
        .expect_with_timeout(Pattern::exact("ALSO_NEVER"), Some(Duration::from_secs(1)))
        .await;

    assert!(matches!(second, Err(Error::SessionBusy)));
    // fail-fast, not queued behind the pending call
    assert!(started.elapsed() < Duration::from_millis(100));

    assert!(matches!(
        pending.await.unwrap(),
        Err(Error::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_login_prompt_scenario() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'login: '; read user; printf 'Password: '; read pass");

    let login = session
        .expect(Pattern::exact("login: "))
        .await
        .expect("Login prompt not found");
    assert_eq!(login.before, "");
    assert_eq!(login.matched, "login: ");

    session.send_line("user").await.expect("Failed to send");

    let password = session
        .expect(Pattern::exact("Password: "))
        .await
        .expect("Password prompt not found");
    assert_eq!(password.matched, "Password: ");
    // the PTY echo of what we typed is the "before" text
    assert!(password.before.contains("user"), "before = {:?}", password.before);

    session.close().await;
}

#[tokio::test]
async fn test_overflow_reported_not_hung() {
    if cfg!(windows) {
        return;
    }

    let session = Session::builder()
        .timeout(Duration::from_secs(5))
        .buffer_limit(10)
        .arg("-c")
        .arg("for i in $(seq 1 20); do printf aaaaaaaaaa; done; sleep 2")
        .spawn("sh")
        .expect("Failed to spawn sh");

    let result = session.expect(Pattern::exact("zzz")).await;

    match result {
        Err(Error::BufferOverflow { limit, before }) => {
            assert_eq!(limit, 10);
            assert!(before.len() <= 10);
        }
        other => panic!("Expected buffer overflow, got {other:?}"),
    }
}

#[tokio::test]
async fn test_clean_exit_eof_scenario() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf done");

    let patterns = [Pattern::exact("done"), Pattern::Eof];
    let result = session
        .expect_any(&patterns)
        .await
        .expect("No pattern matched");
    assert_eq!(result.pattern_index, 0);
    assert_eq!(result.matched, "done");

    let eof = session
        .expect_any(&[Pattern::Eof])
        .await
        .expect("EOF not matched");
    assert_eq!(eof.pattern_index, 0);
    assert_eq!(eof.before, "");
}

#[tokio::test]
async fn test_unexpected_eof_carries_before_text() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'partial output'");

    let result = session.expect(Pattern::exact("NEVER")).await;

    match result {
        Err(Error::UnexpectedEof { before }) => {
            assert!(before.contains("partial output"));
        }
        other => panic!("Expected unexpected EOF, got {other:?}"),
    }
}

#[tokio::test]
async fn test_close_cancels_inflight_expect() {
    if cfg!(windows) {
        return;
    }

    let session = Session::builder()
        .timeout(Duration::from_secs(10))
        .close_grace_period(Duration::from_millis(100))
        .arg("-c")
        .arg("sleep 5")
        .spawn("sh")
        .expect("Failed to spawn sh");

    let background = session.clone();
    let pending = tokio::spawn(async move {
        background.expect(Pattern::exact("NEVER")).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    session.close().await;
    let outcome = pending.await.unwrap();

    assert!(matches!(outcome, Err(Error::SessionClosed)));
    // resolved promptly, not after the expect's own 10s timeout
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(session.status(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf done");
    session.close().await;
    session.close().await;
    assert_eq!(session.status(), LifecycleState::Closed);

    assert!(matches!(
        session.send(b"late").await,
        Err(Error::SessionClosed)
    ));
    assert!(matches!(
        session.expect(Pattern::exact("x")).await,
        Err(Error::SessionClosed)
    ));
}

#[tokio::test]
async fn test_send_while_expect_in_flight() {
    if cfg!(windows) {
        return;
    }

    let session = Session::spawn("cat").expect("Failed to spawn cat");

    let background = session.clone();
    let pending = tokio::spawn(async move {
        background.expect(Pattern::exact("marco")).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // the write path is independent of the pending read loop
    session.send_line("marco").await.expect("Failed to send");

    let result = pending.await.unwrap().expect("Echo not matched");
    assert_eq!(result.matched, "marco");

    session.close().await;
}

#[tokio::test]
async fn test_wait_reports_exit_code() {
    if cfg!(windows) {
        return;
    }

    let session = sh("exit 7");
    let state = session.wait().await.expect("Wait failed");
    assert_eq!(state, LifecycleState::Exited(7));
}

#[tokio::test]
async fn test_terminate_reports_signaled() {
    if cfg!(windows) {
        return;
    }

    let session = sh("sleep 30");
    assert!(session.is_alive());

    session.terminate(Signal::Kill).expect("Failed to signal");
    let state = session.wait().await.expect("Wait failed");
    assert_eq!(state, LifecycleState::Signaled(9));
}

#[tokio::test]
async fn test_regex_with_captures() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'Email: user@example.com is valid'");

    let result = session
        .expect(Pattern::regex(r"(\w+)@(\w+)\.(\w+)").expect("Invalid regex"))
        .await
        .expect("Pattern not found");

    assert_eq!(result.captures[0], "user@example.com");
    assert_eq!(result.captures[1], "user");
    assert_eq!(result.captures[2], "example");
    assert_eq!(result.captures[3], "com");
}

#[tokio::test]
async fn test_ansi_stripping() {
    if cfg!(windows) {
        return;
    }

    let session = Session::builder()
        .timeout(Duration::from_secs(5))
        .strip_ansi(true)
        .arg("-c")
        .arg(r#"printf '\033[31mRED\033[0m plain'"#)
        .spawn("sh")
        .expect("Failed to spawn sh");

    let result = session
        .expect(Pattern::exact("RED plain"))
        .await
        .expect("Pattern not found");
    assert_eq!(result.matched, "RED plain");
}

#[tokio::test]
async fn test_before_field_excludes_trailing_output() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'BEFORE_TEXT MARKER AFTER_TEXT'; sleep 1");

    let result = session
        .expect(Pattern::exact("MARKER"))
        .await
        .expect("Pattern not found");

    assert_eq!(result.matched, "MARKER");
    assert!(result.before.contains("BEFORE_TEXT"));
    assert!(!result.before.contains("AFTER_TEXT"));
}

#[tokio::test]
async fn test_custom_line_separator() {
    if cfg!(windows) {
        return;
    }

    let session = Session::builder()
        .timeout(Duration::from_secs(5))
        .line_separator("\r")
        .spawn("cat")
        .expect("Failed to spawn cat");

    session.send_line("polo").await.expect("Failed to send");

    let result = session
        .expect(Pattern::exact("polo"))
        .await
        .expect("Echo not matched");
    assert_eq!(result.matched, "polo");

    session.close().await;
}

#[tokio::test]
async fn test_utf8_output() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf 'Hello 世界!'");

    let result = session
        .expect(Pattern::exact("世界"))
        .await
        .expect("Pattern not found");
    assert_eq!(result.matched, "世界");
}

#[tokio::test]
async fn test_spawn_invalid_command() {
    let result = Session::builder().spawn("definitely_not_a_real_command_12345");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_empty_pattern_rejected() {
    if cfg!(windows) {
        return;
    }

    let session = sh("printf x; sleep 1");
    let result = session.expect(Pattern::exact("")).await;
    assert!(matches!(result, Err(Error::Pattern(_))));
    session.close().await;
}

#[tokio::test]
async fn test_registry_closes_everything() {
    if cfg!(windows) {
        return;
    }

    let registry = SessionRegistry::new();
    let first = Session::spawn("cat").expect("Failed to spawn cat");
    let second = Session::spawn("cat").expect("Failed to spawn cat");

    registry.register(&first);
    registry.register(&second);
    assert_eq!(registry.len(), 2);

    registry.close_all().await;
    assert!(registry.is_empty());
    assert_eq!(first.status(), LifecycleState::Closed);
    assert_eq!(second.status(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_shell_runs_commands() {
    if cfg!(windows) || !std::path::Path::new("/bin/bash").exists() {
        return;
    }

    let shell = Shell::builder()
        .timeout(Duration::from_secs(10))
        .spawn()
        .await
        .expect("Failed to open shell");

    let hello = shell.run("echo hello").await.expect("Command failed");
    assert_eq!(hello.output, "hello");
    assert_eq!(hello.exit_code, Some(0));

    let failing = shell.run("false").await.expect("Command failed");
    assert_eq!(failing.exit_code, Some(1));

    shell.close().await;
}

#[tokio::test]
async fn test_shell_reports_multiline_output() {
    if cfg!(windows) || !std::path::Path::new("/bin/bash").exists() {
        return;
    }

    let shell = Shell::builder()
        .timeout(Duration::from_secs(10))
        .spawn()
        .await
        .expect("Failed to open shell");

    let result = shell
        .run("printf 'first\\nsecond\\n'")
        .await
        .expect("Command failed");
    assert_eq!(result.output, "first\nsecond");
    assert_eq!(result.exit_code, Some(0));

    shell.close().await;
}
