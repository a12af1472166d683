//! Grammar and evaluation properties
//!
//! These drive the public Dispatcher with small hand-made Definition tables
//! and check counting, action repetition, escape and register behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vimode::config::Config;
use vimode::core::definition::{Argument, Definition, DefinitionTable};
use vimode::core::dispatcher::{Dispatcher, KeyResult};
use vimode::core::error::ActionResult;
use vimode::core::grammar::State;
use vimode::core::input::{Key, parse_keys};
use vimode::core::register::{LineEnding, RegisterMode, RegisterStore, UNNAMED};
use vimode::core::rope_view::RopeView;
use vimode::core::view::{Ui, View};

#[derive(Default)]
struct RecordingUi {
    status: Vec<String>,
    prompts: Vec<String>,
}

impl Ui for RecordingUi {
    fn status(&mut self, text: &str) {
        self.status.push(text.to_string());
    }

    fn open_prompt(&mut self, label: &str) {
        self.prompts.push(label.to_string());
    }
}

fn feed(
    dispatcher: &mut Dispatcher,
    view: &mut RopeView,
    ui: &mut RecordingUi,
    script: &str,
) -> Vec<KeyResult> {
    parse_keys(script)
        .unwrap()
        .into_iter()
        .map(|key| dispatcher.feed(key, view, ui))
        .collect()
}

fn builtin() -> Dispatcher {
    let mut dispatcher = Dispatcher::new(&Config::default());
    dispatcher.activate();
    dispatcher
}

fn custom(commands: DefinitionTable) -> Dispatcher {
    let mut dispatcher = Dispatcher::with_tables(commands, DefinitionTable::new());
    dispatcher.activate();
    dispatcher
}

// =============================================================================
// COUNTS
// =============================================================================

#[test]
fn test_digits_accumulate_into_the_count() {
    let seen = Arc::new(AtomicUsize::new(0));
    let mut commands = DefinitionTable::new();
    let sink = Arc::clone(&seen);
    commands.insert(
        "q",
        Definition::new("record count")
            .once()
            .before(move |cmd, _, _| {
                sink.store(cmd.count(), Ordering::SeqCst);
                Ok(Argument::None)
            })
            .action(|_, _| Ok(None)),
    );
    let mut dispatcher = custom(commands);
    let mut view = RopeView::from_string("");
    let mut ui = RecordingUi::default();

    for n in [1usize, 9, 10, 42, 907, 1_000_000, 31_415_926] {
        feed(&mut dispatcher, &mut view, &mut ui, &format!("{}q", n));
        assert_eq!(seen.load(Ordering::SeqCst), n);
    }
    feed(&mut dispatcher, &mut view, &mut ui, "q");
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_huge_counts_saturate() {
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    let mut commands = DefinitionTable::new();
    commands.insert(
        "q",
        Definition::new("record count")
            .once()
            .before(move |cmd, _, _| {
                sink.store(cmd.count(), Ordering::SeqCst);
                Ok(Argument::None)
            })
            .action(|_, _| Ok(None)),
    );
    let mut dispatcher = custom(commands);
    let mut view = RopeView::from_string("");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, &format!("{}0q", usize::MAX));
    assert_eq!(seen.load(Ordering::SeqCst), usize::MAX);
}

// =============================================================================
// ACTION REPETITION
// =============================================================================

#[test]
fn test_last_action_repeats_count_times() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let step = |name: &'static str| {
        let log = Arc::clone(&log);
        move |_: &mut dyn View, _: &Argument| -> ActionResult {
            log.lock().unwrap().push(name);
            Ok(None)
        }
    };
    let mut commands = DefinitionTable::new();
    commands.insert(
        "q",
        Definition::new("three steps")
            .action(step("first"))
            .action(step("second"))
            .action(step("last"))
            .after(step("after")),
    );
    let mut dispatcher = custom(commands);
    let mut view = RopeView::from_string("");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, "4q");
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first", "second", "last", "last", "last", "last", "after"]
    );
}

#[test]
fn test_three_j_moves_down_three_times() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut commands = DefinitionTable::new();
    commands.insert(
        "j",
        Definition::new("move-line-down").action(move |view, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            view.line_down();
            Ok(None)
        }),
    );
    let mut dispatcher = custom(commands);
    let mut view = RopeView::from_string("0\n1\n2\n3\n4");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, "3j");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(view.current_line(), 3);
}

// =============================================================================
// ESCAPE
// =============================================================================

#[test]
fn test_escape_in_any_parse_state_leaves_no_trace() {
    for prefix in ["\"", "\"a", "3", "\"a3", "d", "d3", "2d", "f", "df", "r", "c"] {
        let mut dispatcher = builtin();
        let mut view = RopeView::from_string("alpha beta\ngamma\n");
        let mut ui = RecordingUi::default();

        feed(&mut dispatcher, &mut view, &mut ui, prefix);
        assert_ne!(dispatcher.state(), State::Start, "prefix {prefix:?}");
        let results = feed(&mut dispatcher, &mut view, &mut ui, "<Esc>");
        assert_eq!(results, vec![KeyResult::Consumed]);

        assert_eq!(dispatcher.state(), State::Start, "prefix {prefix:?}");
        assert_eq!(view.to_string(), "alpha beta\ngamma\n", "prefix {prefix:?}");
        assert!(dispatcher.registers().names().is_empty(), "prefix {prefix:?}");
    }
}

// =============================================================================
// REGISTERS
// =============================================================================

#[test]
fn test_register_round_trip_and_mode() {
    let mut store = RegisterStore::new();
    store.write('a', "plain text");
    assert_eq!(
        store.read('a', LineEnding::Lf),
        ("plain text".to_string(), RegisterMode::Char)
    );

    store.write('b', "one\ntwo");
    assert_eq!(store.read('b', LineEnding::Lf).1, RegisterMode::Line);
}

#[test]
fn test_terminator_is_not_doubled() {
    let mut store = RegisterStore::new();
    store.write('a', "line\r\n");
    assert_eq!(
        store.read('a', LineEnding::CrLf),
        ("line\r\n".to_string(), RegisterMode::Line)
    );
    store.write('a', "line\n");
    assert_eq!(store.read('a', LineEnding::Lf).0, "line\n");
}

#[test]
fn test_uppercase_register_appends() {
    let mut store = RegisterStore::new();
    store.write('a', "foo");
    store.write('A', "bar");
    assert_eq!(
        store.read('a', LineEnding::Lf),
        ("foobar".to_string(), RegisterMode::Char)
    );

    store.write('A', "baz\n");
    assert_eq!(
        store.read('a', LineEnding::Lf),
        ("foobar\nbaz\n".to_string(), RegisterMode::Line)
    );
}

#[test]
fn test_named_yank_mirrors_into_unnamed() {
    let mut dispatcher = builtin();
    let mut view = RopeView::from_string("one\ntwo\nthree\n");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, "\"a2y_");
    assert_eq!(dispatcher.state(), State::Start);
    assert_eq!(view.to_string(), "one\ntwo\nthree\n");

    let registers = dispatcher.registers();
    let a = registers.get('a').unwrap();
    assert_eq!(a.mode(), RegisterMode::Line);
    assert_eq!(a.text(LineEnding::Lf), "one\ntwo\n");
    assert_eq!(registers.get(UNNAMED), Some(a));
    assert!(registers.get('0').is_none());
}

#[test]
fn test_failed_command_writes_nothing() {
    let mut dispatcher = builtin();
    let mut view = RopeView::from_string("abc\n");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, "9rx");
    assert_eq!(view.to_string(), "abc\n");
    assert!(dispatcher.registers().names().is_empty());
    assert!(ui.status.iter().any(|s| s.contains("Too few characters")));
}

// =============================================================================
// UNHANDLED KEYS
// =============================================================================

#[test]
fn test_unmapped_key_is_unhandled_unless_prefixed() {
    let mut dispatcher = builtin();
    let mut view = RopeView::from_string("abc");
    let mut ui = RecordingUi::default();

    assert_eq!(
        feed(&mut dispatcher, &mut view, &mut ui, "Z"),
        vec![KeyResult::Unhandled]
    );
    assert!(ui.status.is_empty());

    let results = feed(&mut dispatcher, &mut view, &mut ui, "\"aZ");
    assert_eq!(results.last(), Some(&KeyResult::Consumed));
    assert_eq!(ui.status.last().map(String::as_str), Some("No command for \"aZ"));
    assert_eq!(dispatcher.state(), State::Start);
}

#[test]
fn test_keys_are_ignored_while_inactive() {
    let mut dispatcher = Dispatcher::new(&Config::default());
    let mut view = RopeView::from_string("abc");
    let mut ui = RecordingUi::default();

    assert_eq!(
        dispatcher.feed(Key::Char('x'), &mut view, &mut ui),
        KeyResult::Unhandled
    );
    assert_eq!(view.to_string(), "abc");
}

#[test]
fn test_prompt_is_requested_and_resumed() {
    let mut dispatcher = builtin();
    let mut view = RopeView::from_string("a\nb\nc\n");
    let mut ui = RecordingUi::default();

    feed(&mut dispatcher, &mut view, &mut ui, ":");
    assert_eq!(ui.prompts, vec![":"]);
    assert_eq!(dispatcher.state(), State::PromptWait);

    dispatcher.prompt_closed(Some("3".into()), &mut view, &mut ui);
    assert_eq!(dispatcher.state(), State::Start);
    assert_eq!(view.current_line(), 2);
}
