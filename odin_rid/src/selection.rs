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
    ALLOWED_ZOOM_MARGIN, DESIRED_ZOOM, DIM_OPACITY, FULL_OPACITY,
    entity::{Aircraft,AircraftId},
    registry::SessionRegistry,
    render::{MapRenderer,MarkerTag},
};

/// zoom level to use when jumping to a selected aircraft. We keep the current zoom if it is close enough
/// to the desired one so that the user does not lose a manually adjusted view
pub fn target_zoom (current: f64)->f64 {
    if current < DESIRED_ZOOM - ALLOWED_ZOOM_MARGIN || current > DESIRED_ZOOM + ALLOWED_ZOOM_MARGIN {
        DESIRED_ZOOM
    } else {
        current
    }
}

/// keeps track of the (single) active aircraft. Only the selected aircraft has fully opaque markers
#[derive(Debug,Default)]
pub struct SelectionController {
    selected: Option<AircraftId>,
}

impl SelectionController {
    pub fn new ()->Self { SelectionController { selected: None } }

    pub fn selected (&self)->Option<&AircraftId> { self.selected.as_ref() }

    pub fn clear (&mut self) {
        if let Some(id) = self.selected.take() {
            debug!("selection of {} cleared", id);
        }
    }

    /// make `aircraft` the active one and jump the camera to it. Aircraft without a valid location
    /// or without observation session are ignored. Returns true if the selection was performed
    pub fn select<R: MapRenderer> (&mut self, aircraft: Option<&Aircraft>, registry: &SessionRegistry, renderer: &mut R)->bool {
        let Some(aircraft) = aircraft else { return false };
        let Some(loc) = aircraft.location() else { return false };
        let Some(session) = registry.get( aircraft.id()) else { return false };
        let pos = loc.position();
        if pos.is_no_fix() { return false }

        if let Some(prev_id) = &self.selected {
            if prev_id != aircraft.id() {
                if let Some(prev) = registry.get( prev_id) {
                    trace!("dim {}", prev_id);
                    prev.set_opacity( renderer, DIM_OPACITY);
                }
            }
        }

        session.set_opacity( renderer, FULL_OPACITY);
        self.selected = Some( aircraft.id().clone());

        let zoom = target_zoom( renderer.current_zoom());
        renderer.set_camera_scene( pos, Some(zoom), false);
        debug!("selected {} at {} zoom {}", aircraft.id(), pos, zoom);
        true
    }

    /// route a marker tap. Only aircraft markers select, operator markers are not handled
    pub fn tap<'a,R,F> (&mut self, tag: &MarkerTag, lookup: F, registry: &SessionRegistry, renderer: &mut R)->bool
        where R: MapRenderer, F: FnOnce(&AircraftId)->Option<&'a Aircraft>
    {
        match tag {
            MarkerTag::Aircraft(id) => self.select( lookup(id), registry, renderer),
            MarkerTag::Operator(_) => false
        }
    }
}
