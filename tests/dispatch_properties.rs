mod common;
use crate::common::init_tracing;
use crate::common::recording::{Journal, Outcome, RecordingWatcher};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use watchpipe::types::FileEvent;
use watchpipe::watcher::{PathFilter, PatternWatcher, Watcher, WatcherRegistry};
use watchpipe::{DispatchEnd, Dispatcher};

type TestResult = Result<(), Box<dyn Error>>;

fn dispatcher_with(watchers: Vec<Arc<dyn Watcher>>) -> Dispatcher {
    Dispatcher::new(Arc::new(WatcherRegistry::from_watchers(watchers)))
}

#[test]
fn watchers_run_in_registration_order() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![]);
    for name in ["A", "B", "C"] {
        dispatcher
            .registry()
            .append(RecordingWatcher::new(name, &journal).into_arc());
    }

    let report = dispatcher.dispatch(&FileEvent::created("/root/x.txt"));

    assert_eq!(journal.names(), ["A", "B", "C"]);
    assert_eq!(report.invoked, ["A", "B", "C"]);
    assert_eq!(report.end, DispatchEnd::Exhausted);
    Ok(())
}

#[test]
fn replace_all_defines_the_new_order() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![RecordingWatcher::new("old", &journal).into_arc()]);

    dispatcher.registry().replace_all([
        RecordingWatcher::new("Y", &journal).into_arc(),
        RecordingWatcher::new("X", &journal).into_arc(),
    ]);
    dispatcher.dispatch(&FileEvent::updated("/root/a"));

    assert_eq!(journal.names(), ["Y", "X"]);
    Ok(())
}

#[test]
fn stop_short_circuits_the_chain() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("A", &journal).into_arc(),
        RecordingWatcher::new("B", &journal)
            .with_outcome(Outcome::Stop)
            .into_arc(),
        RecordingWatcher::new("C", &journal).into_arc(),
    ]);

    let report = dispatcher.dispatch(&FileEvent::created("/root/x"));

    assert_eq!(journal.names(), ["A", "B"]);
    assert_eq!(report.end, DispatchEnd::StoppedBy("B".to_string()));
    Ok(())
}

#[test]
fn non_accepting_watcher_is_skipped_without_stopping() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("A", &journal).into_arc(),
        RecordingWatcher::new("B", &journal)
            .rejecting()
            .with_outcome(Outcome::Stop)
            .into_arc(),
        RecordingWatcher::new("C", &journal).into_arc(),
    ]);

    let report = dispatcher.dispatch(&FileEvent::deleted("/root/x"));

    assert_eq!(journal.names(), ["A", "C"]);
    assert_eq!(report.end, DispatchEnd::Exhausted);
    Ok(())
}

#[test]
fn accept_is_consulted_per_path() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("less", &journal)
            .with_accept(|p: &Path| p.extension().is_some_and(|e| e == "less"))
            .into_arc(),
    ]);

    dispatcher.dispatch(&FileEvent::updated("/root/site.css"));
    dispatcher.dispatch(&FileEvent::updated("/root/site.less"));

    assert_eq!(
        journal.events_for("less"),
        [FileEvent::updated("/root/site.less")]
    );
    Ok(())
}

#[test]
fn pattern_gate_narrows_an_inner_watcher() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let inner = RecordingWatcher::new("java", &journal)
        .with_accept(|p: &Path| !p.ends_with("Skip.java"))
        .into_arc();
    let filter = PathFilter::new("/root", &["**/*.java".to_string()], &[])?;
    let dispatcher = dispatcher_with(vec![Arc::new(PatternWatcher::new(filter, inner))]);

    dispatcher.dispatch(&FileEvent::created("/root/app/Main.java"));
    dispatcher.dispatch(&FileEvent::created("/root/app/Skip.java"));
    dispatcher.dispatch(&FileEvent::created("/root/app/notes.md"));
    dispatcher.dispatch(&FileEvent::created("/outside/Other.java"));

    assert_eq!(
        journal.events_for("java"),
        [FileEvent::created("/root/app/Main.java")]
    );
    Ok(())
}

#[test]
fn failure_aborts_only_the_current_event() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("A", &journal)
            .with_script([Outcome::Fail("boom".into())])
            .into_arc(),
        RecordingWatcher::new("B", &journal).into_arc(),
    ]);

    let first = dispatcher.dispatch(&FileEvent::created("/root/one"));
    let second = dispatcher.dispatch(&FileEvent::created("/root/two"));

    assert_eq!(first.end, DispatchEnd::FailedAt("A".to_string()));
    assert_eq!(second.end, DispatchEnd::Exhausted);
    assert_eq!(journal.names(), ["A", "A", "B"]);
    assert_eq!(journal.events_for("B"), [FileEvent::created("/root/two")]);
    Ok(())
}

#[test]
fn panicking_watcher_is_treated_as_a_failure() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("A", &journal)
            .with_script([Outcome::Panic("watcher blew up".into())])
            .into_arc(),
        RecordingWatcher::new("B", &journal).into_arc(),
    ]);

    let first = dispatcher.dispatch(&FileEvent::updated("/root/one"));
    let second = dispatcher.dispatch(&FileEvent::updated("/root/two"));

    assert_eq!(first.end, DispatchEnd::FailedAt("A".to_string()));
    assert_eq!(second.invoked, ["A", "B"]);
    Ok(())
}

#[test]
fn panicking_accept_is_treated_as_a_failure() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let dispatcher = dispatcher_with(vec![
        RecordingWatcher::new("picky", &journal)
            .with_accept(|p: &Path| {
                if p.ends_with("boom.txt") {
                    panic!("accept blew up");
                }
                true
            })
            .into_arc(),
        RecordingWatcher::new("B", &journal).into_arc(),
    ]);

    let first = dispatcher.dispatch(&FileEvent::created("/root/boom.txt"));
    let second = dispatcher.dispatch(&FileEvent::created("/root/fine.txt"));

    assert_eq!(first.end, DispatchEnd::FailedAt("picky".to_string()));
    assert!(first.invoked.is_empty());
    assert_eq!(second.end, DispatchEnd::Exhausted);
    assert_eq!(journal.names(), ["picky", "B"]);
    Ok(())
}

#[test]
fn removing_an_unknown_watcher_changes_nothing() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let a = RecordingWatcher::new("A", &journal).into_arc();
    let stranger = RecordingWatcher::new("A", &journal).into_arc();
    let registry = WatcherRegistry::from_watchers([Arc::clone(&a)]);

    assert!(!registry.remove(&stranger));
    assert_eq!(registry.names(), ["A"]);

    assert!(registry.remove(&a));
    assert!(registry.is_empty());
    assert!(!registry.remove(&a));
    Ok(())
}

#[test]
fn chain_mutation_during_dispatch_applies_to_the_next_event() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let registry = Arc::new(WatcherRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let late = RecordingWatcher::new("late", &journal).into_arc();
    let hook_registry = Arc::clone(&registry);
    let hook_late = Arc::clone(&late);
    registry.append(
        RecordingWatcher::new("first", &journal)
            .with_hook(move |_| hook_registry.append(Arc::clone(&hook_late)))
            .into_arc(),
    );

    let first = dispatcher.dispatch(&FileEvent::created("/root/a"));
    assert_eq!(first.invoked, ["first"]);

    let second = dispatcher.dispatch(&FileEvent::created("/root/b"));
    assert_eq!(second.invoked, ["first", "late"]);
    Ok(())
}

#[test]
fn concurrent_registration_never_exposes_a_partial_chain() -> TestResult {
    init_tracing();
    let journal = Journal::new();
    let registry = Arc::new(WatcherRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let pair: Vec<Arc<dyn Watcher>> = vec![
        RecordingWatcher::new("P", &journal).into_arc(),
        RecordingWatcher::new("Q", &journal).into_arc(),
    ];

    let writer = {
        let registry = Arc::clone(&registry);
        let pair = pair.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                registry.replace_all(pair.iter().cloned());
                registry.replace_all(Vec::<Arc<dyn Watcher>>::new());
            }
        })
    };

    for i in 0..200 {
        let report = dispatcher.dispatch(&FileEvent::updated(format!("/root/{i}")));
        assert!(
            report.invoked.is_empty() || report.invoked == ["P", "Q"],
            "unexpected chain {:?}",
            report.invoked
        );
    }

    writer.join().map_err(|_| "writer thread panicked")?;
    Ok(())
}
