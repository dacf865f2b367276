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

//! lifecycle of the (independently optional) radio scan sources and their record logging

use std::{fmt, sync::{Arc, atomic::{AtomicU32,Ordering}}};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::{debug,info,warn};
use crate::{entity::AircraftId, errors::Result, fusion::FusedPosition};

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum SourceKind { Bluetooth, WifiNan, WifiBeacon }

impl SourceKind {
    pub const ALL: [SourceKind;3] = [SourceKind::Bluetooth, SourceKind::WifiNan, SourceKind::WifiBeacon];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Bluetooth => "bluetooth",
            SourceKind::WifiNan => "wifi-nan",
            SourceKind::WifiBeacon => "wifi-beacon",
        };
        f.write_str(s)
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ScanState { Stopped, Running }

/// what scan sources write to an attached logging sink
#[derive(Debug,Clone,Serialize)]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub session: u32,
    pub source: SourceKind,
    pub aircraft: AircraftId,
    pub rssi: i32,
    pub receiver: Option<FusedPosition>,
    pub msg: String,
}

/// the logging collaborator for scan records
pub trait RecordSink: Send + Sync {
    fn write_record (&self, record: &ScanRecord)->Result<()>;

    /// start a new log session (e.g. after the user cleared the aircraft list)
    fn bump_session (&self);
    fn session (&self)->u32;
}

pub type SharedRecordSink = Arc<dyn RecordSink>;

/// a RecordSink that emits records as JSON through tracing
#[derive(Debug,Default)]
pub struct TracingRecordSink {
    session: AtomicU32,
}

impl TracingRecordSink {
    pub fn new ()->Self { TracingRecordSink { session: AtomicU32::new(0) } }
}

impl RecordSink for TracingRecordSink {
    fn write_record (&self, record: &ScanRecord)->Result<()> {
        let json = serde_json::to_string( record)?;
        info!(target: "odin_rid::records", "{}", json);
        Ok(())
    }

    fn bump_session (&self) {
        let session = self.session.fetch_add( 1, Ordering::Relaxed) + 1;
        info!(target: "odin_rid::records", "log session {}", session);
    }

    fn session (&self)->u32 { self.session.load( Ordering::Relaxed) }
}

/// the radio scanning collaborator. Start and stop have to release/acquire their resources synchronously
pub trait ScanSource: Send {
    fn kind (&self)->SourceKind;
    fn start (&mut self)->Result<()>;
    fn stop (&mut self)->Result<()>;

    /// takes effect with the next emitted record, independent of run state
    fn set_logger (&mut self, sink: Option<SharedRecordSink>);
}

struct SourceSlot {
    kind: SourceKind,
    source: Option<Box<dyn ScanSource>>, // None if not available on this runtime
    state: ScanState,
}

/// starts and stops all available scan sources together. Failures of individual sources are logged and
/// never affect the other sources
pub struct SourceLifecycleManager {
    slots: Vec<SourceSlot>,
    sink: Option<SharedRecordSink>,
}

impl SourceLifecycleManager {
    pub fn new ()->Self {
        let slots = SourceKind::ALL.iter().map( |kind| SourceSlot { kind: *kind, source: None, state: ScanState::Stopped }).collect();
        SourceLifecycleManager { slots, sink: None }
    }

    /// construct the slot for the source kind. The source gets the currently attached logger. Replacing an
    /// existing source stops it first
    pub fn install (&mut self, mut source: Box<dyn ScanSource>) {
        let kind = source.kind();
        source.set_logger( self.sink.clone());

        if let Some(slot) = self.slots.iter_mut().find( |s| s.kind == kind) {
            if let Some(mut old) = slot.source.take() {
                if slot.state == ScanState::Running {
                    if let Err(e) = old.stop() { warn!("failed to stop replaced {} source: {}", kind, e) }
                }
            }
            slot.source = Some(source);
            slot.state = ScanState::Stopped;
            debug!("installed {} source", kind);
        }
    }

    pub fn is_available (&self, kind: SourceKind)->bool {
        self.slots.iter().any( |s| s.kind == kind && s.source.is_some())
    }

    /// None if the source is not available
    pub fn state (&self, kind: SourceKind)->Option<ScanState> {
        self.slots.iter().find( |s| s.kind == kind && s.source.is_some()).map( |s| s.state)
    }

    pub fn logger (&self)->Option<&SharedRecordSink> { self.sink.as_ref() }

    /// start all available sources that are not running yet. Returns the number of running sources
    pub fn start_all (&mut self)->usize {
        let mut n_running = 0;
        for slot in self.slots.iter_mut() {
            let Some(source) = slot.source.as_mut() else { continue };
            if slot.state == ScanState::Stopped {
                match source.start() {
                    Ok(()) => {
                        info!("started {} scan", slot.kind);
                        slot.state = ScanState::Running;
                    }
                    Err(e) => warn!("failed to start {} scan: {}", slot.kind, e)
                }
            }
            if slot.state == ScanState::Running { n_running += 1 }
        }
        n_running
    }

    /// stop all running sources. A failing source is still considered stopped
    pub fn stop_all (&mut self) {
        for slot in self.slots.iter_mut() {
            let Some(source) = slot.source.as_mut() else { continue };
            if slot.state == ScanState::Running {
                match source.stop() {
                    Ok(()) => info!("stopped {} scan", slot.kind),
                    Err(e) => warn!("failed to stop {} scan: {}", slot.kind, e)
                }
                slot.state = ScanState::Stopped;
            }
        }
    }

    /// set or clear the logging sink on all constructed sources
    pub fn attach_logger (&mut self, sink: Option<SharedRecordSink>) {
        for slot in self.slots.iter_mut() {
            if let Some(source) = slot.source.as_mut() {
                source.set_logger( sink.clone());
            }
        }
        info!("record logging {}", if sink.is_some() { "enabled" } else { "disabled" });
        self.sink = sink;
    }

    pub fn bump_log_session (&self) {
        if let Some(sink) = &self.sink { sink.bump_session() }
    }
}

impl Default for SourceLifecycleManager {
    fn default ()->Self { SourceLifecycleManager::new() }
}
