use super::*;

#[cfg(unix)]
fn sh(script: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[cfg(unix)]
#[test]
fn captures_output_and_status() {
    let out = run_with_timeout(&mut sh("echo out; echo err >&2; exit 3"), Duration::from_secs(10))
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(out.stdout.trim(), "out");
    assert_eq!(out.diagnostic(), "err");
}

#[cfg(unix)]
#[test]
fn diagnostic_falls_back_to_stdout_then_status() {
    let out = run_with_timeout(&mut sh("echo only-stdout; exit 1"), Duration::from_secs(10)).unwrap();
    assert_eq!(out.diagnostic(), "only-stdout");
    let out = run_with_timeout(&mut sh("exit 2"), Duration::from_secs(10)).unwrap();
    assert!(out.diagnostic().starts_with("pipeline exited with"));
}

#[cfg(unix)]
#[test]
fn slow_children_are_killed() {
    let start = Instant::now();
    let err = run_with_timeout(&mut sh("exec sleep 10"), Duration::from_millis(200)).unwrap_err();
    assert!(matches!(err, ChartError::TimeoutExceeded(d) if d == Duration::from_millis(200)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // A zombie has exited; it only waits for its new parent to reap it.
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        Err(_) if std::path::Path::new("/proc/self").exists() => false,
        Err(_) => sh(&format!("kill -0 {pid} 2>/dev/null"))
            .status()
            .is_ok_and(|s| s.success()),
    }
}

#[cfg(unix)]
#[test]
fn timeouts_kill_forked_helpers_too() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("helper.pid");
    let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());
    let err = run_with_timeout(&mut sh(&script), Duration::from_millis(500)).unwrap_err();
    assert!(matches!(err, ChartError::TimeoutExceeded(_)));

    let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    let deadline = Instant::now() + Duration::from_secs(3);
    while process_alive(pid) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(!process_alive(pid), "helper {pid} outlived the timed-out pipeline");
}

#[test]
fn spawn_failures_are_reported() {
    let mut cmd = Command::new("/definitely/not/a/program");
    let err = run_with_timeout(&mut cmd, Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Other);
}
