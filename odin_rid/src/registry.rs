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

use std::collections::HashMap;
use tracing::{error,info};
use crate::{
    entity::{Aircraft,AircraftId,Stream},
    entity_set::{EntitySet,SetDiff},
    errors::{OdinRidError,Result},
    render::MapRenderer,
    session::{LocationOutcome,ObservationSession},
};

/// keeps exactly one ObservationSession per member of the EntitySet
#[derive(Debug,Default)]
pub struct SessionRegistry {
    sessions: HashMap<AircraftId,ObservationSession>,
    n_started: u64,
    n_stopped: u64,
}

impl SessionRegistry {
    pub fn new ()->Self { SessionRegistry::default() }

    pub fn len (&self)->usize { self.sessions.len() }
    pub fn is_empty (&self)->bool { self.sessions.is_empty() }
    pub fn contains (&self, id: &AircraftId)->bool { self.sessions.contains_key(id) }
    pub fn get (&self, id: &AircraftId)->Option<&ObservationSession> { self.sessions.get(id) }

    pub fn n_started (&self)->u64 { self.n_started }
    pub fn n_stopped (&self)->u64 { self.n_stopped }

    pub fn ids (&self)->Vec<AircraftId> {
        let mut ids: Vec<AircraftId> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// start a new session for `aircraft` and replay its current state into it. There must not be
    /// a session for this aircraft yet
    pub fn track<R: MapRenderer> (&mut self, aircraft: &mut Aircraft, renderer: &mut R)->Result<()> {
        if self.sessions.contains_key( aircraft.id()) {
            return Err( OdinRidError::DuplicateSession( aircraft.id().to_string()))
        }

        let mut session = ObservationSession::start( aircraft);
        session.replay( aircraft, renderer);
        self.sessions.insert( aircraft.id().clone(), session);
        self.n_started += 1;
        Ok(())
    }

    /// stop and drop the session for `aircraft`. Not having one is not an error
    pub fn untrack<R: MapRenderer> (&mut self, aircraft: &mut Aircraft, renderer: &mut R)->bool {
        if let Some(mut session) = self.sessions.remove( aircraft.id()) {
            session.stop( aircraft, renderer);
            self.n_stopped += 1;
            true
        } else {
            false
        }
    }

    /// bring sessions in sync with a membership change of `entities`. Removals are processed first, then additions.
    /// A duplicate session aborts only the add of the respective aircraft, all others are still processed
    pub fn reconcile<R: MapRenderer> (&mut self, diff: &mut SetDiff, entities: &mut EntitySet, renderer: &mut R)->Result<()> {
        let mut duplicates: Vec<String> = Vec::new();

        for ac in diff.removed.iter_mut() {
            self.untrack( ac, renderer);
        }

        for id in &diff.added {
            if let Some(ac) = entities.get_mut(id) {
                if let Err(e) = self.track( ac, renderer) {
                    error!("failed to track {}: {}", id, e);
                    duplicates.push( id.to_string());
                }
            }
        }

        if !diff.is_empty() {
            info!("tracking {} aircraft", self.sessions.len());
        }

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err( OdinRidError::DuplicateSession( duplicates.join(",")))
        }
    }

    /// route a location change of `aircraft` to the session that listens on it
    pub fn deliver_location<R: MapRenderer> (&mut self, aircraft: &Aircraft, renderer: &mut R)->LocationOutcome {
        match self.sessions.get_mut( aircraft.id()) {
            Some(session) if aircraft.location.listeners().iter().any( |l| session.is_listening( Stream::Location, *l)) => {
                session.on_location( aircraft, renderer)
            }
            _ => LocationOutcome::Ignored
        }
    }

    pub fn deliver_system<R: MapRenderer> (&mut self, aircraft: &Aircraft, renderer: &mut R)->LocationOutcome {
        match self.sessions.get_mut( aircraft.id()) {
            Some(session) if aircraft.system.listeners().iter().any( |l| session.is_listening( Stream::System, *l)) => {
                session.on_system( aircraft, renderer)
            }
            _ => LocationOutcome::Ignored
        }
    }
}
