//! End-to-end use of the facade prelude.

use std::cell::Cell;
use std::rc::Rc;

use memoflow::prelude::*;

#[test]
fn mixed_sources_through_prelude() {
    let ticks = Rc::new(Cell::new(0_i64));
    let counter = Rc::clone(&ticks);
    let flow = FlowController::new(move || {
        counter.set(counter.get() + 1);
        Some(counter.get())
    });
    let base = Property::new(100_i64);
    let pusher = Pusher::<i64>::new();

    let entries: Vec<(&'static str, Rc<dyn Access<i64>>)> = vec![
        ("base", Rc::new(base.clone())),
        ("pushed", Rc::new(pusher.clone())),
        ("flow", Rc::new(flow.clone())),
    ];
    let total = MemoCell::with_sources(
        FnComputer::new(|inputs: &Snapshot<&'static str, i64>| inputs.values().sum::<i64>()),
        entries,
    )
    .expect("every source is readable")
    .label("total");

    assert_eq!(total.query(), Ok(100));

    pusher.set(5);
    assert_eq!(total.query(), Ok(105));

    assert!(flow.transfer());
    assert_eq!(total.query(), Ok(106));
    assert_eq!(total.query(), Ok(106));
    assert_eq!(total.version(), 3);

    base.set(0);
    assert_eq!(total.query(), Ok(6));
}

#[test]
fn sink_is_rejected() {
    let sink: Rc<dyn Access<Value>> = Rc::new(Sink::new(|_: Option<Value>| {}));
    let err = MemoCell::<&'static str, Value, usize>::with_sources(
        FnComputer::new(|inputs: &Snapshot<&'static str, Value>| inputs.len()),
        [("out", sink)],
    )
    .expect_err("sink has no readable capability");
    assert!(matches!(err, MemoError::UnsupportedSourceKind { .. }));
    assert_eq!(err.to_string(), "source \"out\" exposes no pull, push or generate capability");
}

#[test]
fn readable_flow_controller_is_pulled_by_cell() {
    let level = Rc::new(Cell::new(4_i64));
    let reader = Rc::clone(&level);
    let flow = ReadableFlowController::new(move || Some(reader.get()));

    let entries: Vec<(&'static str, Rc<dyn Access<i64>>)> = vec![("level", Rc::new(flow.clone()))];
    let doubled = MemoCell::with_sources(
        FnComputer::new(|inputs: &Snapshot<&'static str, i64>| {
            inputs.get("level").map_or(-1, |v| v * 2)
        }),
        entries,
    )
    .expect("pull capable");

    assert_eq!(doubled.query(), Ok(-1));
    flow.transfer();
    assert_eq!(doubled.query(), Ok(8));

    level.set(10);
    assert_eq!(doubled.query(), Ok(8));
    flow.transfer();
    assert_eq!(doubled.query(), Ok(20));
    assert_eq!(doubled.version(), 3);
}
