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

//! live tracking of Remote ID aircraft that are reported by several independent scan sources.
//!
//! The main parts are
//! - [`entity_set::EntitySet`] - the set of known aircraft, notifying add/remove diffs
//! - [`registry::SessionRegistry`] - keeps exactly one [`session::ObservationSession`] per known aircraft,
//!   which turns location and system updates into map markers
//! - [`selection::SelectionController`] - the single active aircraft and camera recenter
//! - [`fusion::LocationFuser`] - the receiver position from gps and network providers
//! - [`sources::SourceLifecycleManager`] - start/stop and record logging of the scan sources
//!
//! All mutable state lives in a [`context::TrackerContext`] that is owned by the [`actor::TrackerActor`] task.
//! Producers send their events through a [`actor::TrackerHandle`].

use std::time::Duration;

pub mod errors;
pub mod actions;
pub mod config;
pub mod entity;
pub mod entity_set;
pub mod render;
pub mod session;
pub mod registry;
pub mod selection;
pub mod fusion;
pub mod sources;
pub mod context;
pub mod actor;
pub mod sim;

pub use errors::{OdinRidError,Result};
pub use config::{RidConfig,load_config};
pub use entity::{Aircraft,AircraftId,GeoPos,Location,SystemData};
pub use context::{AircraftUpdate,TrackerContext};
pub use actor::{TrackerActor,TrackerHandle,TrackerMsg,WeakTrackerHandle};

/// zoom level we jump to when selecting an aircraft
pub const DESIRED_ZOOM: f64 = 17.0;

/// how far the current zoom can be off from DESIRED_ZOOM before we reset it on selection
pub const ALLOWED_ZOOM_MARGIN: f64 = 2.0;

pub const DIM_OPACITY: f32 = 0.5;
pub const FULL_OPACITY: f32 = 1.0;

/// interval in which connection states are re-emitted (not configurable)
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// label fallback for aircraft that have not sent a basic id yet
pub const ID_MISSING: &str = "ID missing";
