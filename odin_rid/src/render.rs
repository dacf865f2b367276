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

//! the interface to the map rendering collaborator, plus a headless in-memory implementation of it

use std::collections::HashMap;
use tracing::{debug,trace};
use crate::entity::{AircraftId,GeoPos};

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct MarkerHandle(pub u64);

/// what a map marker stands for. This is what tap events get resolved to
#[derive(Debug,Clone,PartialEq,Eq,Hash)]
pub enum MarkerTag {
    Aircraft(AircraftId),
    Operator(AircraftId),
}

impl MarkerTag {
    pub fn aircraft_id (&self)->&AircraftId {
        match self {
            MarkerTag::Aircraft(id) | MarkerTag::Operator(id) => id
        }
    }
}

/// marker anchor in normalized icon coordinates
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Anchor { pub x: f32, pub y: f32 }

impl Anchor {
    pub const BOTTOM_CENTER: Anchor = Anchor { x: 0.5, y: 1.0 };
}

#[derive(Debug,Clone,PartialEq)]
pub struct MarkerSpec {
    pub position: GeoPos,
    pub label: String,
    pub opacity: f32,
    pub anchor: Anchor,
    pub tag: MarkerTag,
}

/// the rendering collaborator. Implementations have to be called from the tracker context only
pub trait MapRenderer: Send {
    fn create_marker (&mut self, spec: MarkerSpec)->MarkerHandle;
    fn update_marker_position (&mut self, marker: MarkerHandle, position: GeoPos);
    fn set_marker_opacity (&mut self, marker: MarkerHandle, opacity: f32);
    fn remove_marker (&mut self, marker: MarkerHandle);

    /// jump (or animate) the camera. A `None` zoom keeps the current zoom level
    fn set_camera_scene (&mut self, position: GeoPos, zoom: Option<f64>, animated: bool);
    fn current_zoom (&self)->f64;
}

#[derive(Debug,Clone,PartialEq)]
pub struct CameraScene {
    pub position: GeoPos,
    pub zoom: Option<f64>,
    pub animated: bool,
}

#[derive(Debug,Clone,PartialEq)]
pub struct MapMarker {
    pub position: GeoPos,
    pub label: String,
    pub opacity: f32,
    pub anchor: Anchor,
    pub tag: MarkerTag,
}

/// how many camera scenes a HeadlessMap remembers
pub const MAX_SCENES: usize = 32;

/// a MapRenderer that just keeps markers and camera state in memory. Used for monitoring without a display
/// and for testing
#[derive(Debug)]
pub struct HeadlessMap {
    markers: HashMap<MarkerHandle,MapMarker>,
    next_handle: u64,
    zoom: f64,
    scenes: Vec<CameraScene>, // the most recent MAX_SCENES only
    n_scenes: usize,
    n_created: usize,
    n_removed: usize,
}

impl HeadlessMap {
    pub fn new (zoom: f64)->Self {
        HeadlessMap { markers: HashMap::new(), next_handle: 0, zoom, scenes: Vec::new(), n_scenes: 0, n_created: 0, n_removed: 0 }
    }

    pub fn set_zoom (&mut self, zoom: f64) { self.zoom = zoom }

    pub fn marker (&self, handle: MarkerHandle)->Option<&MapMarker> { self.markers.get(&handle) }
    pub fn markers (&self)->impl Iterator<Item=(&MarkerHandle,&MapMarker)> { self.markers.iter() }
    pub fn marker_count (&self)->usize { self.markers.len() }

    pub fn find_marker (&self, tag: &MarkerTag)->Option<MarkerHandle> {
        self.markers.iter().find( |(_,m)| m.tag == *tag).map( |(h,_)| *h)
    }

    /// resolve a tap on a marker to its tag
    pub fn tap (&self, handle: MarkerHandle)->Option<MarkerTag> {
        self.markers.get(&handle).map( |m| m.tag.clone())
    }

    pub fn last_scene (&self)->Option<&CameraScene> { self.scenes.last() }
    pub fn scenes (&self)->&[CameraScene] { self.scenes.as_slice() }

    /// total number of camera scene changes, including the ones no longer kept in `scenes()`
    pub fn n_scenes (&self)->usize { self.n_scenes }

    pub fn n_created (&self)->usize { self.n_created }
    pub fn n_removed (&self)->usize { self.n_removed }
}

impl Default for HeadlessMap {
    fn default ()->Self { HeadlessMap::new( crate::DESIRED_ZOOM) }
}

impl MapRenderer for HeadlessMap {
    fn create_marker (&mut self, spec: MarkerSpec)->MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        debug!("create marker {:?} '{}' at {}", handle, spec.label, spec.position);

        let MarkerSpec { position, label, opacity, anchor, tag } = spec;
        self.markers.insert( handle, MapMarker { position, label, opacity, anchor, tag });
        self.n_created += 1;
        handle
    }

    fn update_marker_position (&mut self, marker: MarkerHandle, position: GeoPos) {
        if let Some(m) = self.markers.get_mut(&marker) {
            trace!("move marker {:?} to {}", marker, position);
            m.position = position;
        }
    }

    fn set_marker_opacity (&mut self, marker: MarkerHandle, opacity: f32) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.opacity = opacity;
        }
    }

    fn remove_marker (&mut self, marker: MarkerHandle) {
        if self.markers.remove(&marker).is_some() {
            debug!("remove marker {:?}", marker);
            self.n_removed += 1;
        }
    }

    fn set_camera_scene (&mut self, position: GeoPos, zoom: Option<f64>, animated: bool) {
        debug!("camera scene {} zoom {:?}", position, zoom);
        if let Some(z) = zoom { self.zoom = z }
        if self.scenes.len() >= MAX_SCENES { self.scenes.remove(0); }
        self.scenes.push( CameraScene { position, zoom, animated });
        self.n_scenes += 1;
    }

    fn current_zoom (&self)->f64 { self.zoom }
}
