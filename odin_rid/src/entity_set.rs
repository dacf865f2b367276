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

use std::collections::{HashMap,hash_map};
use tracing::debug;
use crate::{actions::{ActionHandle,DataRefAction,DataRefActionList}, entity::{Aircraft,AircraftId}};

/// membership delta of a single EntitySet mutation. Aircraft that are in both the old and the new set
/// are never reported, no matter if their fields changed
#[derive(Debug,Default)]
pub struct SetDiff {
    pub added: Vec<AircraftId>,
    pub removed: Vec<Aircraft>, // moved out of the set
    pub size: usize, // set size after the mutation
}

impl SetDiff {
    pub fn is_empty (&self)->bool { self.added.is_empty() && self.removed.is_empty() }

    pub fn removed_ids (&self)->Vec<AircraftId> {
        self.removed.iter().map( |ac| ac.id().clone()).collect()
    }

    fn sort (&mut self) {
        self.added.sort();
        self.removed.sort_by( |a,b| a.id().cmp( b.id()));
    }
}

/// the canonical set of known aircraft
pub struct EntitySet {
    aircraft: HashMap<AircraftId,Aircraft>,
    diff_actions: DataRefActionList<SetDiff>,
}

impl EntitySet {
    pub fn new ()->Self {
        EntitySet { aircraft: HashMap::new(), diff_actions: DataRefActionList::new_infallible() }
    }

    pub fn subscribe_diff (&mut self, action: impl DataRefAction<SetDiff> + 'static)->ActionHandle {
        self.diff_actions.subscribe( action)
    }

    pub fn unsubscribe_diff (&mut self, handle: ActionHandle)->bool {
        self.diff_actions.unsubscribe( handle)
    }

    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }
    pub fn contains (&self, id: &AircraftId)->bool { self.aircraft.contains_key(id) }
    pub fn get (&self, id: &AircraftId)->Option<&Aircraft> { self.aircraft.get(id) }
    pub fn get_mut (&mut self, id: &AircraftId)->Option<&mut Aircraft> { self.aircraft.get_mut(id) }
    pub fn iter (&self)->hash_map::Values<'_,AircraftId,Aircraft> { self.aircraft.values() }
    pub fn iter_mut (&mut self)->hash_map::ValuesMut<'_,AircraftId,Aircraft> { self.aircraft.values_mut() }

    pub fn ids (&self)->Vec<AircraftId> {
        let mut ids: Vec<AircraftId> = self.aircraft.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// add a new aircraft. If there already is one with the same id the set is left unchanged and the
    /// returned diff is empty
    pub fn insert (&mut self, aircraft: Aircraft)->SetDiff {
        let mut diff = SetDiff::default();
        if let hash_map::Entry::Vacant(e) = self.aircraft.entry( aircraft.id().clone()) {
            diff.added.push( e.key().clone());
            e.insert( aircraft);
        }
        self.notify( diff)
    }

    pub fn remove (&mut self, id: &AircraftId)->SetDiff {
        let mut diff = SetDiff::default();
        if let Some(ac) = self.aircraft.remove(id) {
            diff.removed.push(ac);
        }
        self.notify( diff)
    }

    pub fn clear (&mut self)->SetDiff {
        let mut diff = SetDiff::default();
        diff.removed.extend( self.aircraft.drain().map( |(_,ac)| ac));
        self.notify( diff)
    }

    /// replace the whole set. The diff is computed by id set difference. Aircraft that are in both sets keep
    /// their current instance (and hence all subscriptions on it), the respective new instance is discarded
    pub fn replace_all (&mut self, new_set: impl IntoIterator<Item=Aircraft>)->SetDiff {
        let mut incoming: HashMap<AircraftId,Aircraft> = HashMap::new();
        for ac in new_set {
            incoming.insert( ac.id().clone(), ac);
        }

        let mut diff = SetDiff::default();

        let gone: Vec<AircraftId> = self.aircraft.keys().filter( |id| !incoming.contains_key(*id)).cloned().collect();
        for id in gone {
            if let Some(ac) = self.aircraft.remove(&id) {
                diff.removed.push(ac);
            }
        }

        for (id,ac) in incoming {
            if let hash_map::Entry::Vacant(e) = self.aircraft.entry(id) {
                diff.added.push( e.key().clone());
                e.insert(ac);
            }
        }

        self.notify( diff)
    }

    fn notify (&mut self, mut diff: SetDiff)->SetDiff {
        diff.size = self.aircraft.len();
        if !diff.is_empty() {
            diff.sort();
            debug!("entity set changed: +{} -{} = {}", diff.added.len(), diff.removed.len(), diff.size);
            let _ = self.diff_actions.execute( &diff); // infallible list, failures are logged
        }
        diff
    }
}

impl Default for EntitySet {
    fn default ()->Self { Self::new() }
}
