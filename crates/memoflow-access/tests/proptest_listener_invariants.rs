//! Property-based invariant tests for `ListenerSet` and push sources.
//!
//! 1. A notification reaches exactly the listeners whose subscription is
//!    still alive, in subscription order.
//! 2. Dropped subscriptions are pruned: `len` never counts them after a
//!    notification.
//! 3. A `ReactiveProperty` listener always sees the value just stored.

use std::cell::RefCell;
use std::rc::Rc;

use memoflow_access::{ListenerSet, Pull, Push, ReactiveProperty, Subscription};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Subscribe,
    /// Drop the n-th live subscription (modulo the live count).
    Drop(usize),
    Notify(Option<i32>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Subscribe),
        any::<usize>().prop_map(Op::Drop),
        proptest::option::of(any::<i32>()).prop_map(Op::Notify),
    ]
}

proptest! {
    #[test]
    fn notify_reaches_live_listeners_in_order(ops in proptest::collection::vec(op_strategy(), 1..50)) {
        let set = ListenerSet::<i32>::new();
        let log: Rc<RefCell<Vec<(usize, Option<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
        let mut live: Vec<(usize, Subscription)> = Vec::new();
        let mut next_id = 0;

        for op in ops {
            match op {
                Op::Subscribe => {
                    let id = next_id;
                    next_id += 1;
                    let log = Rc::clone(&log);
                    let subscription =
                        set.subscribe(Box::new(move |v: Option<&i32>| log.borrow_mut().push((id, v.copied()))));
                    live.push((id, subscription));
                }
                Op::Drop(n) => {
                    if !live.is_empty() {
                        let index = n % live.len();
                        live.remove(index);
                    }
                }
                Op::Notify(value) => {
                    log.borrow_mut().clear();
                    set.notify(value.as_ref());
                    let expected: Vec<(usize, Option<i32>)> =
                        live.iter().map(|(id, _)| (*id, value)).collect();
                    prop_assert_eq!(&*log.borrow(), &expected);
                    prop_assert_eq!(set.len(), live.len());
                }
            }
        }
    }

    #[test]
    fn reactive_property_listener_sees_stored_value(values in proptest::collection::vec(proptest::option::of(-100i32..100), 1..20)) {
        let property = ReactiveProperty::<i32>::new(None);
        let seen: Rc<RefCell<Vec<Option<i32>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = property.subscribe(Box::new(move |v: Option<&i32>| sink.borrow_mut().push(v.copied())));

        for value in &values {
            property.set(*value);
            prop_assert_eq!(property.get(), *value);
        }
        prop_assert_eq!(&*seen.borrow(), &values);
    }
}
