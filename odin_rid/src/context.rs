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

use std::time::Duration;
use chrono::{DateTime,Utc};
use serde::Serialize;
use tracing::{debug,error,trace};
use crate::{
    actions::{ActionHandle,DataRefAction,DataRefActionList},
    config::RidConfig,
    entity::{Aircraft,AircraftId,BasicId,Connection,Location,SystemData},
    entity_set::{EntitySet,SetDiff},
    errors::Result,
    registry::SessionRegistry,
    render::{MapRenderer,MarkerTag},
    selection::SelectionController,
    session::LocationOutcome,
};

/// a single telemetry update for a known (or first seen) aircraft. `None` values mean "no update"
#[derive(Debug,Clone)]
pub enum AircraftUpdate {
    Location(Option<Location>),
    System(Option<SystemData>),
    Identification(BasicId),
    Connection(Connection),
}

/// what connection listeners get on every connection update and on every heartbeat
#[derive(Debug,Clone,Serialize)]
pub struct ConnectionStatus {
    pub aircraft: AircraftId,
    pub connection: Connection,
    pub shadow_id: Option<String>,
    pub is_stale: bool,
}

/// all state that is mutated from the presentation context. There is exactly one of these per running tracker
pub struct TrackerContext<R: MapRenderer> {
    entities: EntitySet,
    registry: SessionRegistry,
    selection: SelectionController,
    renderer: R,
    connection_actions: DataRefActionList<ConnectionStatus>,
    shadow_id_timeout: Duration,
    stale_after: Duration,
}

impl<R: MapRenderer> TrackerContext<R> {
    pub fn new (renderer: R, config: &RidConfig)->Self {
        TrackerContext {
            entities: EntitySet::new(),
            registry: SessionRegistry::new(),
            selection: SelectionController::new(),
            renderer,
            connection_actions: DataRefActionList::new_infallible(),
            shadow_id_timeout: config.shadow_id_timeout,
            stale_after: config.stale_after,
        }
    }

    pub fn entities (&self)->&EntitySet { &self.entities }
    pub fn registry (&self)->&SessionRegistry { &self.registry }
    pub fn selection (&self)->&SelectionController { &self.selection }
    pub fn renderer (&self)->&R { &self.renderer }
    pub fn renderer_mut (&mut self)->&mut R { &mut self.renderer }

    pub fn subscribe_diff (&mut self, action: impl DataRefAction<SetDiff> + 'static)->ActionHandle {
        self.entities.subscribe_diff( action)
    }
    pub fn unsubscribe_diff (&mut self, handle: ActionHandle)->bool {
        self.entities.unsubscribe_diff( handle)
    }

    pub fn subscribe_connection (&mut self, action: impl DataRefAction<ConnectionStatus> + 'static)->ActionHandle {
        self.connection_actions.subscribe( action)
    }
    pub fn unsubscribe_connection (&mut self, handle: ActionHandle)->bool {
        self.connection_actions.unsubscribe( handle)
    }

    //--- membership changes

    /// add an aircraft we see for the first time. Returns false if it is already known
    pub fn add (&mut self, aircraft: Aircraft)->Result<bool> {
        let diff = self.entities.insert( aircraft);
        let is_added = !diff.added.is_empty();
        self.reconcile( diff)?;
        Ok(is_added)
    }

    /// loss of contact
    pub fn remove (&mut self, id: &AircraftId)->Result<bool> {
        let diff = self.entities.remove( id);
        let is_removed = !diff.removed.is_empty();
        self.reconcile( diff)?;
        Ok(is_removed)
    }

    pub fn clear (&mut self)->Result<()> {
        let diff = self.entities.clear();
        self.reconcile( diff)
    }

    pub fn replace_all (&mut self, aircraft: impl IntoIterator<Item=Aircraft>)->Result<()> {
        let diff = self.entities.replace_all( aircraft);
        self.reconcile( diff)
    }

    fn reconcile (&mut self, mut diff: SetDiff)->Result<()> {
        let drops_selected = self.selection.selected()
            .map( |sel| diff.removed.iter().any( |ac| ac.id() == sel))
            .unwrap_or(false);
        if drops_selected { self.selection.clear() }

        // removed aircraft get dropped with the diff, after their sessions have been stopped
        self.registry.reconcile( &mut diff, &mut self.entities, &mut self.renderer)
    }

    //--- telemetry

    /// apply an update for aircraft `id`, creating the aircraft first if we have not seen it yet. Duplicate
    /// session errors of the creation are reported but do not prevent the update itself
    pub fn update (&mut self, id: &AircraftId, update: AircraftUpdate)->Result<LocationOutcome> {
        let mut res = Ok(());
        if !self.entities.contains(id) {
            res = self.add( Aircraft::new( id.clone())).map(|_| ());
        }

        let outcome = match self.entities.get_mut(id) {
            Some(ac) => match update {
                AircraftUpdate::Location(Some(loc)) => {
                    ac.location.set( loc);
                    self.registry.deliver_location( ac, &mut self.renderer)
                }
                AircraftUpdate::System(Some(sys)) => {
                    ac.system.set( sys);
                    self.registry.deliver_system( ac, &mut self.renderer)
                }
                AircraftUpdate::Location(None) | AircraftUpdate::System(None) => LocationOutcome::Ignored,
                AircraftUpdate::Identification(basic_id) => {
                    ac.set_basic_id( basic_id, Utc::now());
                    LocationOutcome::Ignored
                }
                AircraftUpdate::Connection(conn) => {
                    ac.update_connection( conn);
                    if let Some(status) = connection_status( ac, Utc::now(), self.stale_after) {
                        let _ = self.connection_actions.execute( &status);
                    }
                    LocationOutcome::Ignored
                }
            }
            None => LocationOutcome::Ignored
        };

        res.map( |_| outcome)
    }

    //--- selection

    pub fn select (&mut self, id: &AircraftId)->bool {
        self.selection.select( self.entities.get(id), &self.registry, &mut self.renderer)
    }

    pub fn tap (&mut self, tag: &MarkerTag)->bool {
        let entities = &self.entities;
        self.selection.tap( tag, |id| entities.get(id), &self.registry, &mut self.renderer)
    }

    //--- periodic

    /// recompute time dependent aircraft fields and re-emit all connection states, changed or not
    pub fn heartbeat (&mut self, now: DateTime<Utc>) {
        let mut states: Vec<ConnectionStatus> = Vec::with_capacity( self.entities.len());

        for ac in self.entities.iter_mut() {
            if ac.update_shadow_basic_id( now, self.shadow_id_timeout) {
                debug!("shadow id of {} expired", ac.id());
            }
            if let Some(status) = connection_status( ac, now, self.stale_after) {
                states.push( status);
            }
        }

        trace!("heartbeat for {} aircraft", states.len());
        for status in &states {
            if let Err(e) = self.connection_actions.execute( status) {
                error!("connection action failed: {}", e);
            }
        }
    }
}

fn connection_status (ac: &Aircraft, now: DateTime<Utc>, stale_after: Duration)->Option<ConnectionStatus> {
    ac.connection().map( |conn| ConnectionStatus {
        aircraft: ac.id().clone(),
        connection: conn.clone(),
        shadow_id: ac.shadow_basic_id().map( |s| s.basic_id.uas_id.clone()),
        is_stale: conn.is_stale( now, stale_after),
    })
}
