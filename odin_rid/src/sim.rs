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

//! simulated scan sources and geolocation providers for running the tracker without radios

use std::{f64::consts::PI, sync::{Arc,Mutex}, time::Duration};
use chrono::Utc;
use rand::Rng;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle, time};
use tracing::{debug,warn};
use crate::{
    actor::{TrackerHandle,TrackerMsg,WeakTrackerHandle},
    context::AircraftUpdate,
    entity::{AircraftId,BasicId,Connection,GeoPos,IdType,Location,OperatorLocationType,SystemData,Transport},
    errors::{Result,source_error},
    fusion::{FusedPosition,ProviderKind,ProviderReading},
    sources::{ScanRecord,ScanSource,SharedRecordSink,SourceKind},
};

const METERS_PER_DEG: f64 = 111_320.0;

/// a drone that flies a circle around its operator
#[derive(Debug,Clone)]
pub struct SimDrone {
    pub id: AircraftId,
    pub uas_id: String,
    pub operator: GeoPos,
    pub radius: f64, // meters
    pub period: Duration, // for one full circle
}

impl SimDrone {
    pub fn position_at (&self, elapsed: Duration)->GeoPos {
        let theta = 2.0 * PI * (elapsed.as_secs_f64() / self.period.as_secs_f64().max(1.0));
        let dlat = self.radius * theta.cos() / METERS_PER_DEG;
        let dlon = self.radius * theta.sin() / (METERS_PER_DEG * self.operator.latitude.to_radians().cos());
        GeoPos::new( self.operator.latitude + dlat, self.operator.longitude + dlon)
    }
}

/// `n` drones spread out around `center`
pub fn sim_drones (prefix: &str, n: usize, center: GeoPos)->Vec<SimDrone> {
    (0..n).map( |i| {
        let offset = 0.002 * i as f64;
        SimDrone {
            id: AircraftId::new( format!("{prefix}-{i:02}")),
            uas_id: format!("SIM{:04}{prefix}", 1000 + i),
            operator: GeoPos::new( center.latitude + offset, center.longitude - offset),
            radius: 80.0 + 40.0 * i as f64,
            period: Duration::from_secs( 60 + 15 * i as u64),
        }
    }).collect()
}

fn transport_of (kind: SourceKind)->Transport {
    match kind {
        SourceKind::Bluetooth => Transport::BluetoothLegacy,
        SourceKind::WifiNan => Transport::WifiNan,
        SourceKind::WifiBeacon => Transport::WifiBeacon,
    }
}

/// a ScanSource that reports synthetic sightings of its drones to the tracker. Since the source is owned
/// by the tracker it only holds a weak handle to it
pub struct SimulatedSource {
    kind: SourceKind,
    hself: WeakTrackerHandle,
    receiver: watch::Receiver<Option<FusedPosition>>,
    drones: Arc<Vec<SimDrone>>,
    interval: Duration,
    logger: Arc<Mutex<Option<SharedRecordSink>>>, // shared with the emitter task
    task: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    pub fn new (kind: SourceKind, hself: WeakTrackerHandle, receiver: watch::Receiver<Option<FusedPosition>>,
                drones: Vec<SimDrone>, interval: Duration)->Self {
        SimulatedSource {
            kind, hself, receiver, drones: Arc::new(drones), interval,
            logger: Arc::new( Mutex::new(None)),
            task: None,
        }
    }

    pub fn is_running (&self)->bool { self.task.is_some() }
}

impl ScanSource for SimulatedSource {
    fn kind (&self)->SourceKind { self.kind }

    fn start (&mut self)->Result<()> {
        if self.task.is_some() { return Ok(()) }
        if self.interval.is_zero() { return Err( source_error!( self.kind, "zero report interval")) }
        let rt = Handle::try_current().map_err( |e| source_error!( self.kind, "no runtime: {}", e))?;

        let emitter = Emitter {
            kind: self.kind,
            hself: self.hself.clone(),
            receiver: self.receiver.clone(),
            drones: self.drones.clone(),
            interval: self.interval,
            logger: self.logger.clone(),
        };
        self.task = Some( rt.spawn( emitter.run()));
        Ok(())
    }

    fn stop (&mut self)->Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("{} simulation stopped", self.kind);
        }
        Ok(())
    }

    fn set_logger (&mut self, sink: Option<SharedRecordSink>) {
        match self.logger.lock() {
            Ok(mut logger) => *logger = sink,
            Err(e) => warn!("cannot set {} logger: {}", self.kind, e)
        }
    }
}

impl Drop for SimulatedSource {
    fn drop (&mut self) {
        if let Some(task) = self.task.take() { task.abort() }
    }
}

struct Emitter {
    kind: SourceKind,
    hself: WeakTrackerHandle,
    receiver: watch::Receiver<Option<FusedPosition>>,
    drones: Arc<Vec<SimDrone>>,
    interval: Duration,
    logger: Arc<Mutex<Option<SharedRecordSink>>>,
}

impl Emitter {
    async fn run (self) {
        let mut timer = time::interval( self.interval);
        let mut step: u32 = 0;

        loop {
            timer.tick().await;
            for drone in self.drones.iter() {
                if let Err(e) = self.emit( drone, step).await {
                    debug!("{} simulation ends: {}", self.kind, e);
                    return
                }
            }
            step = step.saturating_add(1);
        }
    }

    async fn emit (&self, drone: &SimDrone, step: u32)->Result<()> {
        let now = Utc::now();
        let rssi: i32 = rand::rng().random_range( -95..-40);
        let id = drone.id.clone();

        self.hself.update( id.clone(), AircraftUpdate::Connection( Connection::new( transport_of(self.kind), rssi, now))).await?;

        let pos = if step == 0 {
            self.hself.update( id.clone(), AircraftUpdate::Identification( BasicId::new( &drone.uas_id, IdType::SerialNumber))).await?;
            GeoPos::new( 0.0, 0.0) // receivers report this before they have a fix
        } else {
            drone.position_at( self.interval * step)
        };
        self.hself.update( id.clone(), AircraftUpdate::Location( Some( Location::new( pos.latitude, pos.longitude)))).await?;

        if step % 5 == 1 {
            let sys = SystemData::new( drone.operator.latitude, drone.operator.longitude, OperatorLocationType::TakeOff);
            self.hself.update( id.clone(), AircraftUpdate::System( Some(sys))).await?;
        }

        self.log_record( id, rssi, pos);
        Ok(())
    }

    fn log_record (&self, aircraft: AircraftId, rssi: i32, pos: GeoPos) {
        let sink = self.logger.lock().ok().and_then( |logger| logger.clone());
        if let Some(sink) = sink {
            let record = ScanRecord {
                timestamp: Utc::now(),
                session: sink.session(),
                source: self.kind,
                aircraft,
                rssi,
                receiver: self.receiver.borrow().clone(),
                msg: format!("location {}", pos),
            };
            if let Err(e) = sink.write_record( &record) { warn!("failed to log {} record: {}", self.kind, e) }
        }
    }
}

/// periodically report readings of a geolocation provider with some jitter. Ends when the tracker is gone
pub fn spawn_simulated_provider (hself: TrackerHandle, kind: ProviderKind, position: GeoPos, accuracy: f64, interval: Duration)->JoinHandle<()> {
    tokio::spawn( async move {
        let mut timer = time::interval( interval);
        loop {
            timer.tick().await;
            let (jitter, acc) = {
                let mut rng = rand::rng();
                (rng.random_range( -0.00005..0.00005), accuracy * rng.random_range( 0.8..1.2))
            };
            let pos = GeoPos::new( position.latitude + jitter, position.longitude + jitter);
            let reading = ProviderReading::new( kind, pos, acc, Utc::now());

            if let Err(e) = hself.send_msg( TrackerMsg::Receiver { kind, reading: Some(reading) }).await {
                debug!("{} provider ends: {}", kind, e);
                break
            }
        }
    })
}

