/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

use std::sync::{Arc,Mutex};
use odin_rid::{Aircraft, AircraftId, Location, entity::Stream, entity_set::{EntitySet,SetDiff}};

// run with "cargo test --test test_entity_set -- --nocapture"

fn id (s: &str)->AircraftId { AircraftId::new(s) }
fn ac (s: &str)->Aircraft { Aircraft::new( id(s)) }

type DiffLog = Arc<Mutex<Vec<(Vec<AircraftId>,Vec<AircraftId>)>>>;

fn record_diffs (set: &mut EntitySet)->DiffLog {
    let log: DiffLog = Arc::new( Mutex::new( Vec::new()));
    let l = log.clone();
    set.subscribe_diff( move |diff: &SetDiff| -> odin_rid::Result<()> {
        println!("diff: +{:?} -{:?}", diff.added, diff.removed_ids());
        l.lock().unwrap().push( (diff.added.clone(), diff.removed_ids()));
        Ok(())
    });
    log
}

#[test]
fn test_incremental_diffs() {
    let mut set = EntitySet::new();
    let log = record_diffs( &mut set);

    let diff = set.insert( ac("A"));
    assert_eq!( diff.added, vec![id("A")]);
    assert!( diff.removed.is_empty());
    assert_eq!( diff.size, 1);

    let diff = set.insert( ac("A")); // already known, no membership change
    assert!( diff.is_empty());

    let diff = set.remove( &id("X"));
    assert!( diff.is_empty());

    set.insert( ac("B"));
    let diff = set.remove( &id("A"));
    assert_eq!( diff.removed_ids(), vec![id("A")]);
    assert_eq!( diff.size, 1);

    let log = log.lock().unwrap();
    assert_eq!( log.len(), 3); // only membership changing mutations are notified
    assert_eq!( log[0], (vec![id("A")], vec![]));
    assert_eq!( log[1], (vec![id("B")], vec![]));
    assert_eq!( log[2], (vec![], vec![id("A")]));
}

#[test]
fn test_replace_all_by_set_difference() {
    let mut set = EntitySet::new();
    set.replace_all( vec![ ac("A"), ac("B"), ac("C")]);
    assert_eq!( set.ids(), vec![id("A"), id("B"), id("C")]);

    // B has a listener on the current instance, which has to survive the replace
    let sub = set.get_mut( &id("B")).unwrap().subscribe( Stream::Location);
    let log = record_diffs( &mut set);

    let replacement = vec![ ac("D"), ac("C"), ac("B").with_location( Location::new( 10.0, 20.0))];
    let diff = set.replace_all( replacement);

    assert_eq!( diff.added, vec![id("D")]);
    assert_eq!( diff.removed_ids(), vec![id("A")]);
    assert_eq!( diff.size, 3);

    let b = set.get( &id("B")).unwrap();
    assert!( b.location.has_listener( sub.id));
    assert!( b.location().is_none()); // retained instance is not overwritten

    // re-applying the same set does not change membership
    let diff = set.replace_all( vec![ ac("B"), ac("C"), ac("D")]);
    assert!( diff.is_empty());
    assert_eq!( log.lock().unwrap().len(), 1);
}

#[test]
fn test_added_and_removed_are_disjoint() {
    let mut set = EntitySet::new();
    set.replace_all( vec![ ac("A"), ac("B")]);

    let diff = set.replace_all( vec![ ac("B"), ac("C"), ac("C")]);
    for a in &diff.added {
        assert!( !diff.removed_ids().contains(a));
    }
    assert_eq!( diff.added, vec![id("C")]);
    assert_eq!( set.len(), 2);
}

#[test]
fn test_clear_and_unsubscribe() {
    let mut set = EntitySet::new();
    let log: Arc<Mutex<usize>> = Arc::new( Mutex::new(0));
    let l = log.clone();
    let handle = set.subscribe_diff( move |_: &SetDiff| -> odin_rid::Result<()> { *l.lock().unwrap() += 1; Ok(()) });

    set.insert( ac("A"));
    set.insert( ac("B"));
    let diff = set.clear();
    assert_eq!( diff.removed_ids(), vec![id("A"), id("B")]);
    assert!( set.is_empty());
    assert_eq!( *log.lock().unwrap(), 3);

    let diff = set.clear();
    assert!( diff.is_empty());
    assert_eq!( *log.lock().unwrap(), 3);

    assert!( set.unsubscribe_diff( handle));
    assert!( !set.unsubscribe_diff( handle));
    set.insert( ac("C"));
    assert_eq!( *log.lock().unwrap(), 3);
}

#[test]
fn test_failing_listener_does_not_block_others() {
    let mut set = EntitySet::new();
    set.subscribe_diff( |_: &SetDiff| -> odin_rid::Result<()> { Err( odin_rid::errors::action_error("boom")) });
    let log = record_diffs( &mut set);

    let diff = set.insert( ac("A"));
    assert_eq!( diff.added.len(), 1);
    assert_eq!( log.lock().unwrap().len(), 1);
}
