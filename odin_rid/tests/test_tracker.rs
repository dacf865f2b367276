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

use std::{sync::{Arc,Mutex}, time::Duration};
use chrono::{TimeDelta,Utc};
use rand::{Rng,SeedableRng,rngs::StdRng};
use odin_rid::{
    Aircraft, AircraftId, AircraftUpdate, GeoPos, Location, RidConfig, SystemData, TrackerContext,
    DIM_OPACITY, FULL_OPACITY,
    context::ConnectionStatus,
    entity::{BasicId,Connection,IdType,OperatorLocationType,Stream,Transport},
    entity_set::{EntitySet,SetDiff},
    errors::OdinRidError,
    registry::SessionRegistry,
    render::{Anchor,HeadlessMap,MapRenderer,MarkerTag},
    session::{LocationOutcome,ObservationSession,TrackState},
};

// run with "cargo test --test test_tracker -- --nocapture"

fn id (s: &str)->AircraftId { AircraftId::new(s) }

fn context ()->TrackerContext<HeadlessMap> {
    TrackerContext::new( HeadlessMap::new(15.0), &RidConfig::default())
}

fn loc (lat: f64, lon: f64)->AircraftUpdate { AircraftUpdate::Location( Some( Location::new( lat, lon))) }

fn sys (lat: f64, lon: f64)->AircraftUpdate {
    AircraftUpdate::System( Some( SystemData::new( lat, lon, OperatorLocationType::TakeOff)))
}

fn assert_registry_matches (ctx: &TrackerContext<HeadlessMap>) {
    assert_eq!( ctx.registry().ids(), ctx.entities().ids());
}

#[test]
fn test_location_lifecycle() {
    let mut ctx = context();
    let e1 = id("E1");
    ctx.update( &e1, AircraftUpdate::Identification( BasicId::new( "UAS-E1", IdType::SerialNumber))).unwrap();
    assert_registry_matches( &ctx);

    let out = ctx.update( &e1, loc( 0.0, 0.0)).unwrap();
    assert_eq!( out, LocationOutcome::Ignored);
    assert_eq!( ctx.renderer().marker_count(), 0);
    assert_eq!( ctx.registry().get( &e1).unwrap().aircraft_state(), TrackState::NoFix);

    let out = ctx.update( &e1, loc( 47.6, -122.3)).unwrap();
    assert_eq!( out, LocationOutcome::Created);
    let handle = ctx.registry().get( &e1).unwrap().marker().unwrap();
    let marker = ctx.renderer().marker( handle).unwrap();
    println!("created: {:?}", marker);
    assert_eq!( marker.position, GeoPos::new( 47.6, -122.3));
    assert_eq!( marker.opacity, DIM_OPACITY);
    assert_eq!( marker.anchor, Anchor::BOTTOM_CENTER);
    assert_eq!( marker.tag, MarkerTag::Aircraft( e1.clone()));
    assert!( marker.label.contains("E1"));

    // first fix recenters on the new position without changing zoom
    let scene = ctx.renderer().last_scene().unwrap();
    assert_eq!( scene.position, GeoPos::new( 47.6, -122.3));
    assert_eq!( scene.zoom, None);
    assert!( !scene.animated);

    let out = ctx.update( &e1, loc( 47.61, -122.31)).unwrap();
    assert_eq!( out, LocationOutcome::Moved);
    assert_eq!( ctx.registry().get( &e1).unwrap().marker(), Some(handle));
    let marker = ctx.renderer().marker( handle).unwrap();
    assert_eq!( marker.position, GeoPos::new( 47.61, -122.31));
    assert_eq!( marker.opacity, DIM_OPACITY);
    assert_eq!( ctx.renderer().n_created(), 1);
    assert_eq!( ctx.renderer().scenes().len(), 1); // moving does not recenter

    // zero sentinel does not move an existing marker
    let out = ctx.update( &e1, loc( 0.0, 0.0)).unwrap();
    assert_eq!( out, LocationOutcome::Ignored);
    assert_eq!( ctx.renderer().marker( handle).unwrap().position, GeoPos::new( 47.61, -122.31));

    // null location is no update at all
    let out = ctx.update( &e1, AircraftUpdate::Location(None)).unwrap();
    assert_eq!( out, LocationOutcome::Ignored);
}

#[test]
fn test_label_fallback() {
    let mut ctx = context();
    let e = id("anonymous");
    ctx.update( &e, loc( 10.0, 10.0)).unwrap();
    let handle = ctx.registry().get( &e).unwrap().marker().unwrap();
    assert_eq!( ctx.renderer().marker( handle).unwrap().label, "aircraft ID missing");
}

#[test]
fn test_operator_marker() {
    let mut ctx = context();
    let e = id("E2");
    ctx.update( &e, AircraftUpdate::Identification( BasicId::new( "UAS-E2", IdType::CaaRegistration))).unwrap();

    assert_eq!( ctx.update( &e, sys( 0.0, 0.0)).unwrap(), LocationOutcome::Ignored);
    assert_eq!( ctx.registry().get( &e).unwrap().operator_state(), TrackState::NoFix);

    assert_eq!( ctx.update( &e, sys( 37.0, -122.0)).unwrap(), LocationOutcome::Created);
    let handle = ctx.registry().get( &e).unwrap().operator_marker().unwrap();
    let marker = ctx.renderer().marker( handle).unwrap();
    assert_eq!( marker.label, "TakeOff: UAS-E2");
    assert_eq!( marker.opacity, DIM_OPACITY);
    assert_eq!( marker.tag, MarkerTag::Operator( e.clone()));
    assert!( ctx.renderer().scenes().is_empty()); // operator markers do not recenter

    assert_eq!( ctx.update( &e, sys( 37.1, -122.1)).unwrap(), LocationOutcome::Moved);
    assert_eq!( ctx.renderer().marker( handle).unwrap().position, GeoPos::new( 37.1, -122.1));
    assert_eq!( ctx.registry().get( &e).unwrap().aircraft_state(), TrackState::NoFix);
}

#[test]
fn test_new_session_replays_current_state() {
    let mut ctx = context();
    let ac = Aircraft::new( id("R1"))
        .with_location( Location::new( 40.0, -105.0))
        .with_system( SystemData::new( 40.01, -105.01, OperatorLocationType::LiveGnss));
    ctx.add( ac).unwrap();

    let session = ctx.registry().get( &id("R1")).unwrap();
    assert_eq!( session.aircraft_state(), TrackState::Tracking);
    assert_eq!( session.operator_state(), TrackState::Tracking);
    assert_eq!( ctx.renderer().marker_count(), 2);

    // aircraft without fix get a session but no markers
    ctx.add( Aircraft::new( id("R2")).with_location( Location::new( 0.0, 0.0))).unwrap();
    assert_eq!( ctx.renderer().marker_count(), 2);
    assert_registry_matches( &ctx);
}

#[test]
fn test_clear_stops_all_sessions_once() {
    let mut ctx = context();
    for (i,name) in ["A","B","C"].iter().enumerate() {
        let e = id(name);
        ctx.update( &e, loc( 10.0 + i as f64, 20.0)).unwrap();
        ctx.update( &e, sys( 10.5 + i as f64, 20.5)).unwrap();
    }
    assert_eq!( ctx.renderer().marker_count(), 6);
    assert_eq!( ctx.registry().n_started(), 3);

    ctx.clear().unwrap();
    assert!( ctx.registry().is_empty());
    assert!( ctx.entities().is_empty());
    assert_eq!( ctx.renderer().marker_count(), 0);
    assert_eq!( ctx.renderer().n_removed(), 6);
    assert_eq!( ctx.registry().n_stopped(), 3);

    ctx.clear().unwrap();
    assert_eq!( ctx.registry().n_stopped(), 3);
    assert_eq!( ctx.renderer().n_removed(), 6);
}

#[test]
fn test_loss_of_contact() {
    let mut ctx = context();
    ctx.update( &id("A"), loc( 1.0, 1.0)).unwrap();
    ctx.update( &id("B"), loc( 2.0, 2.0)).unwrap();

    assert!( ctx.remove( &id("A")).unwrap());
    assert!( !ctx.remove( &id("A")).unwrap());
    assert_registry_matches( &ctx);
    assert_eq!( ctx.renderer().marker_count(), 1);
    assert_eq!( ctx.registry().n_stopped(), 1);
}

#[test]
fn test_session_stop_is_idempotent() {
    let mut map = HeadlessMap::default();
    let mut ac = Aircraft::new( id("S")).with_location( Location::new( 5.0, 5.0));
    let mut session = ObservationSession::start( &mut ac);
    assert_eq!( ac.n_listeners(), 2);
    session.replay( &ac, &mut map);
    assert_eq!( map.marker_count(), 1);

    assert!( session.stop( &mut ac, &mut map));
    assert!( session.is_stopped());
    assert_eq!( ac.n_listeners(), 0);
    assert_eq!( map.marker_count(), 0);
    assert_eq!( session.marker(), None);

    assert!( !session.stop( &mut ac, &mut map));
    assert_eq!( map.n_removed(), 1);

    // a stopped session does not react to updates anymore
    assert_eq!( session.on_location( &ac, &mut map), LocationOutcome::Ignored);
    assert_eq!( map.marker_count(), 0);
}

#[test]
fn test_duplicate_session() {
    let mut map = HeadlessMap::default();
    let mut registry = SessionRegistry::new();
    let mut ac = Aircraft::new( id("D"));

    registry.track( &mut ac, &mut map).unwrap();
    let res = registry.track( &mut ac, &mut map);
    println!("second track: {:?}", res);
    assert!( matches!( res, Err(OdinRidError::DuplicateSession(_))));
    assert_eq!( registry.len(), 1);
    assert_eq!( ac.n_listeners(), 2);

    // a duplicate within a diff only aborts that one add
    let mut set = EntitySet::new();
    let mut diff = set.replace_all( vec![ Aircraft::new( id("D")), Aircraft::new( id("E"))]);
    let mut registry = SessionRegistry::new();
    registry.track( set.get_mut( &id("D")).unwrap(), &mut map).unwrap();

    let res = registry.reconcile( &mut diff, &mut set, &mut map);
    assert!( matches!( res, Err(OdinRidError::DuplicateSession(_))));
    assert_eq!( registry.ids(), vec![ id("D"), id("E")]);
    assert_eq!( registry.n_started(), 2);
}

#[test]
fn test_missing_session_on_remove() {
    let mut map = HeadlessMap::default();
    let mut registry = SessionRegistry::new();
    let mut ac = Aircraft::new( id("X"));
    assert!( !registry.untrack( &mut ac, &mut map));
    assert_eq!( registry.n_stopped(), 0);
}

#[test]
fn test_registry_follows_membership() {
    let mut rng = StdRng::seed_from_u64( 4711);
    let mut ctx = context();
    let pool: Vec<AircraftId> = (0..8).map( |i| id( &format!("AC{i}"))).collect();

    for step in 0..500 {
        let target = pool[ rng.random_range( 0..pool.len())].clone();
        match rng.random_range( 0..10) {
            0..=4 => {
                let (lat,lon) = if rng.random_bool(0.2) { (0.0,0.0) } else { (rng.random_range(-60.0..60.0), rng.random_range(-170.0..170.0)) };
                ctx.update( &target, loc( lat, lon)).unwrap();
            }
            5 => { ctx.update( &target, sys( 1.0, 1.0)).unwrap(); }
            6 | 7 => { ctx.remove( &target).unwrap(); }
            8 => {
                let snapshot: Vec<Aircraft> = pool.iter().filter( |_| rng.random_bool(0.5)).map( |id| Aircraft::new( id.clone())).collect();
                ctx.replace_all( snapshot).unwrap();
            }
            _ => {
                if rng.random_bool(0.1) { ctx.clear().unwrap(); } else { ctx.select( &target); }
            }
        }

        assert_registry_matches( &ctx);
        let reg = ctx.registry();
        assert_eq!( reg.n_started() - reg.n_stopped(), reg.len() as u64, "session leak at step {step}");
        assert!( ctx.renderer().marker_count() <= 2 * reg.len());

        let n_full = ctx.renderer().markers().filter( |(_,m)| m.opacity == FULL_OPACITY && matches!( m.tag, MarkerTag::Aircraft(_))).count();
        assert!( n_full <= 1);
    }
    println!("sessions started: {}, stopped: {}", ctx.registry().n_started(), ctx.registry().n_stopped());

    ctx.clear().unwrap();
    assert_eq!( ctx.registry().n_started(), ctx.registry().n_stopped());
    assert_eq!( ctx.renderer().marker_count(), 0);
}

#[test]
fn test_tap_routing() {
    let mut ctx = context();
    let e = id("T1");
    ctx.update( &e, loc( 30.0, 30.0)).unwrap();
    ctx.update( &e, sys( 30.1, 30.1)).unwrap();

    let op_handle = ctx.registry().get( &e).unwrap().operator_marker().unwrap();
    let op_tag = ctx.renderer().tap( op_handle).unwrap();
    assert!( !ctx.tap( &op_tag));
    assert!( ctx.selection().selected().is_none());

    let handle = ctx.registry().get( &e).unwrap().marker().unwrap();
    let tag = ctx.renderer().tap( handle).unwrap();
    assert!( ctx.tap( &tag));
    assert_eq!( ctx.selection().selected(), Some(&e));
    assert_eq!( ctx.renderer().marker( handle).unwrap().opacity, FULL_OPACITY);
    assert_eq!( ctx.renderer().marker( op_handle).unwrap().opacity, FULL_OPACITY);
}

#[test]
fn test_heartbeat() {
    let mut ctx = context();
    let statuses: Arc<Mutex<Vec<ConnectionStatus>>> = Arc::new( Mutex::new( Vec::new()));
    let s = statuses.clone();
    ctx.subscribe_connection( move |status: &ConnectionStatus| -> odin_rid::Result<()> {
        s.lock().unwrap().push( status.clone());
        Ok(())
    });

    let now = Utc::now();
    let e = id("H1");
    ctx.update( &e, AircraftUpdate::Connection( Connection::new( Transport::BluetoothLongRange, -70, now))).unwrap();
    ctx.update( &id("H2"), loc( 1.0, 2.0)).unwrap(); // no connection yet, not reported
    assert_eq!( statuses.lock().unwrap().len(), 1);

    ctx.update( &e, AircraftUpdate::Identification( BasicId::new( "PRIMARY", IdType::SerialNumber))).unwrap();
    ctx.update( &e, AircraftUpdate::Identification( BasicId::new( "SECONDARY", IdType::UtmAssigned))).unwrap();
    assert_eq!( ctx.entities().get( &e).unwrap().shadow_basic_id().unwrap().basic_id.uas_id, "SECONDARY");

    ctx.heartbeat( Utc::now() + TimeDelta::seconds(3));
    ctx.heartbeat( Utc::now() + TimeDelta::seconds(4));
    {
        let statuses = statuses.lock().unwrap();
        assert_eq!( statuses.len(), 3); // unchanged connections are re-emitted on every beat
        assert_eq!( statuses[2].shadow_id.as_deref(), Some("SECONDARY"));
        assert!( !statuses[1].is_stale);
    }

    let late = Utc::now() + TimeDelta::seconds(11);
    ctx.heartbeat( late);
    let statuses = statuses.lock().unwrap();
    assert_eq!( statuses.len(), 4);
    assert_eq!( statuses[3].shadow_id, None);
    assert!( statuses[3].is_stale);
    assert!( ctx.entities().get( &e).unwrap().shadow_basic_id().is_none());
    assert_eq!( ctx.entities().get( &e).unwrap().connection().unwrap().msg_count, 1);
}

#[test]
fn test_connection_listeners() {
    let mut ctx = context();
    let n_reported = Arc::new( Mutex::new( 0usize));
    let n = n_reported.clone();
    let handle = ctx.subscribe_connection( move |_status: &ConnectionStatus| -> odin_rid::Result<()> {
        *n.lock().unwrap() += 1;
        Ok(())
    });

    let e = id("C1");
    ctx.update( &e, loc( 3.0, 4.0)).unwrap();
    assert_eq!( ctx.entities().get( &e).unwrap().n_listeners(), 2); // location and system of the session

    ctx.update( &e, AircraftUpdate::Connection( Connection::new( Transport::WifiBeacon, -60, Utc::now()))).unwrap();
    ctx.heartbeat( Utc::now());
    ctx.heartbeat( Utc::now());
    println!("connection states reported: {}", *n_reported.lock().unwrap());
    assert_eq!( *n_reported.lock().unwrap(), 3);
    assert_eq!( ctx.entities().get( &e).unwrap().n_listeners(), 2);

    assert!( ctx.unsubscribe_connection( handle));
    ctx.heartbeat( Utc::now());
    assert_eq!( *n_reported.lock().unwrap(), 3);

    ctx.remove( &e).unwrap();
    assert_eq!( ctx.registry().len(), 0);
}
