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

use tracing::{debug,trace};
use crate::{
    DIM_OPACITY,
    entity::{Aircraft,AircraftId,Stream,Subscription,SubscriptionId},
    render::{Anchor,MapRenderer,MarkerHandle,MarkerSpec,MarkerTag},
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum TrackState { NoFix, Tracking }

/// what a location or system delivery did to the session
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum LocationOutcome {
    Ignored,  // no value, "no fix yet" sentinel or stopped session
    Created,  // first fix, marker got created
    Moved,
}

/// per-aircraft observer that turns location and system updates into map markers.
/// The session exclusively owns the markers it created, only opacity is changed from outside
#[derive(Debug)]
pub struct ObservationSession {
    aircraft: AircraftId,
    location_sub: Option<Subscription>,
    system_sub: Option<Subscription>,
    marker: Option<MarkerHandle>,
    operator_marker: Option<MarkerHandle>,
}

impl ObservationSession {

    /// create session and subscribe to the location and system streams of `aircraft`
    pub fn start (aircraft: &mut Aircraft)->Self {
        let location_sub = Some( aircraft.subscribe( Stream::Location));
        let system_sub = Some( aircraft.subscribe( Stream::System));
        debug!("start observing {}", aircraft.id());

        ObservationSession { aircraft: aircraft.id().clone(), location_sub, system_sub, marker: None, operator_marker: None }
    }

    pub fn aircraft_id (&self)->&AircraftId { &self.aircraft }
    pub fn marker (&self)->Option<MarkerHandle> { self.marker }
    pub fn operator_marker (&self)->Option<MarkerHandle> { self.operator_marker }
    pub fn is_stopped (&self)->bool { self.location_sub.is_none() && self.system_sub.is_none() }

    pub fn aircraft_state (&self)->TrackState {
        if self.marker.is_some() { TrackState::Tracking } else { TrackState::NoFix }
    }

    pub fn operator_state (&self)->TrackState {
        if self.operator_marker.is_some() { TrackState::Tracking } else { TrackState::NoFix }
    }

    pub fn is_listening (&self, stream: Stream, id: SubscriptionId)->bool {
        let sub = match stream {
            Stream::Location => &self.location_sub,
            Stream::System => &self.system_sub,
        };
        sub.as_ref().map( |s| s.id == id).unwrap_or(false)
    }

    /// deliver the current values of the aircraft. This is what every new listener gets
    pub fn replay<R: MapRenderer> (&mut self, aircraft: &Aircraft, renderer: &mut R) {
        self.on_location( aircraft, renderer);
        self.on_system( aircraft, renderer);
    }

    pub fn on_location<R: MapRenderer> (&mut self, aircraft: &Aircraft, renderer: &mut R)->LocationOutcome {
        if self.location_sub.is_none() { return LocationOutcome::Ignored }

        let Some(loc) = aircraft.location() else { return LocationOutcome::Ignored };
        let pos = loc.position();
        if pos.is_no_fix() { return LocationOutcome::Ignored }

        if let Some(marker) = self.marker {
            trace!("update {} position {}", self.aircraft, pos);
            renderer.update_marker_position( marker, pos);
            LocationOutcome::Moved

        } else {
            let spec = MarkerSpec {
                position: pos,
                label: format!("aircraft {}", aircraft.display_id()),
                opacity: DIM_OPACITY,
                anchor: Anchor::BOTTOM_CENTER,
                tag: MarkerTag::Aircraft( self.aircraft.clone()),
            };
            self.marker = Some( renderer.create_marker( spec));
            renderer.set_camera_scene( pos, None, false); // recenter on new aircraft, keep zoom
            LocationOutcome::Created
        }
    }

    pub fn on_system<R: MapRenderer> (&mut self, aircraft: &Aircraft, renderer: &mut R)->LocationOutcome {
        if self.system_sub.is_none() { return LocationOutcome::Ignored }

        let Some(sys) = aircraft.system() else { return LocationOutcome::Ignored };
        let pos = sys.operator_position();
        if pos.is_no_fix() { return LocationOutcome::Ignored }

        if let Some(marker) = self.operator_marker {
            renderer.update_marker_position( marker, pos);
            LocationOutcome::Moved

        } else {
            let spec = MarkerSpec {
                position: pos,
                label: format!("{}: {}", sys.operator_location_type, aircraft.display_id()),
                opacity: DIM_OPACITY,
                anchor: Anchor::BOTTOM_CENTER,
                tag: MarkerTag::Operator( self.aircraft.clone()),
            };
            self.operator_marker = Some( renderer.create_marker( spec));
            LocationOutcome::Created
        }
    }

    pub fn set_opacity<R: MapRenderer> (&self, renderer: &mut R, opacity: f32) {
        if let Some(marker) = self.marker { renderer.set_marker_opacity( marker, opacity) }
        if let Some(marker) = self.operator_marker { renderer.set_marker_opacity( marker, opacity) }
    }

    /// unsubscribe from both streams and remove both markers. Calling this more than once has no effect.
    /// Returns true if anything was released
    pub fn stop<R: MapRenderer> (&mut self, aircraft: &mut Aircraft, renderer: &mut R)->bool {
        let mut released = false;

        if let Some(sub) = self.location_sub.take() {
            aircraft.unsubscribe( &sub);
            released = true;
        }
        if let Some(sub) = self.system_sub.take() {
            aircraft.unsubscribe( &sub);
            released = true;
        }
        if let Some(marker) = self.marker.take() {
            renderer.remove_marker( marker);
            released = true;
        }
        if let Some(marker) = self.operator_marker.take() {
            renderer.remove_marker( marker);
            released = true;
        }

        if released { debug!("stopped observing {}", self.aircraft) }
        released
    }
}
