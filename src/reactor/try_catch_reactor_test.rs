use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tracing_test::traced_test;

use super::*;
use crate::Error;
use crate::ReactorError;
use crate::Watcher;

const WAIT: Duration = Duration::from_secs(5);

#[test]
#[traced_test]
fn submitted_task_runs_on_named_worker() {
    let reactor = TryCatchReactor::new("test-reactor", 2).unwrap();
    let (tx, rx) = mpsc::channel();

    reactor
        .submit(Box::new(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }))
        .unwrap();

    let name = rx.recv_timeout(WAIT).unwrap().unwrap();
    assert!(name.starts_with("test-reactor-"), "unexpected thread name {}", name);
}

#[test]
#[traced_test]
fn panicking_task_does_not_stop_later_work() {
    let reactor = TryCatchReactor::new("panicky", 1).unwrap();
    let (tx, rx) = mpsc::channel();

    reactor.submit(Box::new(|| panic!("boom"))).unwrap();
    reactor.submit(Box::new(move || tx.send(()).unwrap())).unwrap();

    assert!(rx.recv_timeout(WAIT).is_ok());
    assert!(!reactor.is_shut_down());
}

#[test]
fn scheduled_task_waits_for_delay() {
    let reactor = TryCatchReactor::new("scheduler", 1).unwrap();
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    reactor
        .schedule(Box::new(move || tx.send(Instant::now()).unwrap()), Duration::from_millis(50))
        .unwrap();

    let ran_at = rx.recv_timeout(WAIT).unwrap();
    assert!(ran_at.duration_since(started) >= Duration::from_millis(50));
}

#[test]
#[traced_test]
fn work_is_refused_after_shutdown() {
    let reactor = TryCatchReactor::new("stopped", 1).unwrap();
    reactor.shut_down_now();

    assert!(reactor.is_shut_down());
    assert!(matches!(
        reactor.submit(Box::new(|| {})),
        Err(Error::Reactor(ReactorError::ShutDown(_)))
    ));
    assert!(reactor.schedule(Box::new(|| {}), Duration::from_millis(1)).is_err());

    // Idempotent
    reactor.shut_down_now();
}

#[test]
fn current_time_is_wall_clock_millis() {
    let reactor = TryCatchReactor::new("clock", 1).unwrap();
    // 2020-01-01T00:00:00Z
    assert!(reactor.current_time_millis() > 1_577_836_800_000);
}

#[test]
fn from_config_uses_identifier() {
    let config = crate::ReactorConfig {
        identifier: "configured".to_string(),
        threads: 1,
    };
    let reactor = TryCatchReactor::from_config(&config).unwrap();
    assert_eq!(reactor.identifier(), "configured");
}

#[test]
#[traced_test]
fn dispatched_watcher_runs_on_reactor() {
    let reactor: Arc<dyn Reactor> = Arc::new(TryCatchReactor::new("watch-reactor", 1).unwrap());
    let (tx, rx) = mpsc::channel();
    let tx = parking_lot::Mutex::new(tx);

    let watcher = Watcher::dispatched(reactor.clone(), move || {
        let name = std::thread::current().name().map(str::to_string);
        tx.lock().send(name).unwrap();
    });
    assert!(watcher.notify());

    let name = rx.recv_timeout(WAIT).unwrap().unwrap();
    assert!(name.starts_with("watch-reactor-"));
}
