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

//! the presentation task that owns all tracker state, and the handle producers use to talk to it

use chrono::Utc;
use serde::Serialize;
use tokio::{sync::{mpsc,oneshot}, task::JoinHandle, time::{self,MissedTickBehavior}};
use tracing::{debug,error,info,warn};
use crate::{
    HEARTBEAT_INTERVAL,
    context::{AircraftUpdate,TrackerContext},
    entity::{Aircraft,AircraftId},
    errors::{OdinRidError,Result},
    fusion::{FusedPosition,LocationFuser,ProviderKind,ProviderReading},
    render::{MapRenderer,MarkerTag},
    sources::{ScanState,SharedRecordSink,SourceKind,SourceLifecycleManager},
};

/// everything producers (scan sources, geolocation providers, UI) can send to the tracker
pub enum TrackerMsg {
    Update { id: AircraftId, update: AircraftUpdate },
    Lost(AircraftId),
    Clear,
    Snapshot(Vec<Aircraft>),
    Select(AircraftId),
    Tap(MarkerTag),
    Receiver { kind: ProviderKind, reading: Option<ProviderReading> },
    StartSources,
    StopSources,
    AttachLogger(Option<SharedRecordSink>),
    Status(oneshot::Sender<TrackerStatus>),
    Terminate,
}

/// snapshot of the tracker state for monitoring
#[derive(Debug,Clone,Serialize)]
pub struct TrackerStatus {
    pub aircraft: Vec<AircraftId>,
    pub n_sessions: usize,
    pub n_sessions_started: u64,
    pub n_sessions_stopped: u64,
    pub selected: Option<AircraftId>,
    pub receiver: Option<FusedPosition>,
    pub running_sources: Vec<SourceKind>,
}

/// cloneable handle to send messages to the tracker task
#[derive(Clone,Debug)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerMsg>,
}

impl TrackerHandle {
    /// create the handle before the tracker so that producers can be constructed with it
    pub fn new (bounds: usize)->(TrackerHandle, mpsc::Receiver<TrackerMsg>) {
        let (tx,rx) = mpsc::channel( bounds.max(1));
        (TrackerHandle { tx }, rx)
    }

    pub async fn send_msg (&self, msg: TrackerMsg)->Result<()> {
        self.tx.send( msg).await.map_err( |_| OdinRidError::ChannelClosed("tracker".to_string()))
    }

    /// non-blocking send for producers that are not async
    pub fn try_send_msg (&self, msg: TrackerMsg)->Result<()> {
        self.tx.try_send( msg).map_err( |e| match e {
            mpsc::error::TrySendError::Full(_) => OdinRidError::OpFailedError("tracker queue full".to_string()),
            mpsc::error::TrySendError::Closed(_) => OdinRidError::ChannelClosed("tracker".to_string()),
        })
    }

    pub async fn update (&self, id: AircraftId, update: AircraftUpdate)->Result<()> {
        self.send_msg( TrackerMsg::Update { id, update }).await
    }

    pub async fn query_status (&self)->Result<TrackerStatus> {
        let (tx,rx) = oneshot::channel();
        self.send_msg( TrackerMsg::Status(tx)).await?;
        rx.await.map_err( |_| OdinRidError::ChannelClosed("tracker status".to_string()))
    }

    pub async fn terminate (&self)->Result<()> {
        self.send_msg( TrackerMsg::Terminate).await
    }

    pub fn is_closed (&self)->bool { self.tx.is_closed() }

    /// a handle that does not keep the tracker alive. This is what producers owned by the tracker itself use
    pub fn downgrade (&self)->WeakTrackerHandle {
        WeakTrackerHandle { tx: self.tx.downgrade() }
    }
}

/// non-owning version of [`TrackerHandle`]. Sends fail with `ChannelClosed` once all strong handles are dropped
#[derive(Clone)]
pub struct WeakTrackerHandle {
    tx: mpsc::WeakSender<TrackerMsg>,
}

impl WeakTrackerHandle {
    pub fn upgrade (&self)->Option<TrackerHandle> {
        self.tx.upgrade().map( |tx| TrackerHandle { tx })
    }

    fn strong (&self)->Result<TrackerHandle> {
        self.upgrade().ok_or_else( || OdinRidError::ChannelClosed("tracker".to_string()))
    }

    pub async fn send_msg (&self, msg: TrackerMsg)->Result<()> {
        self.strong()?.send_msg( msg).await
    }

    pub async fn update (&self, id: AircraftId, update: AircraftUpdate)->Result<()> {
        self.strong()?.update( id, update).await
    }
}

/// owner of all tracker state. Runs as a single tokio task that processes producer messages in arrival
/// order and drives the connection heartbeat
pub struct TrackerActor<R: MapRenderer> {
    pub ctx: TrackerContext<R>,
    pub fuser: LocationFuser,
    pub sources: SourceLifecycleManager,
}

impl<R> TrackerActor<R> where R: MapRenderer + 'static {
    pub fn new (ctx: TrackerContext<R>, fuser: LocationFuser, sources: SourceLifecycleManager)->Self {
        TrackerActor { ctx, fuser, sources }
    }

    /// run the tracker until it gets terminated or all strong handles are dropped. The join handle returns the
    /// final (torn down) actor state. Producers that are owned by the actor (e.g. installed scan sources) have
    /// to hold a [`WeakTrackerHandle`], otherwise the tracker never sees its handles go away
    pub fn spawn (self, rx: mpsc::Receiver<TrackerMsg>)->JoinHandle<Self> {
        tokio::spawn( self.run( rx))
    }

    pub async fn run (mut self, mut rx: mpsc::Receiver<TrackerMsg>)->Self {
        let mut heartbeat = time::interval( HEARTBEAT_INTERVAL);
        heartbeat.set_missed_tick_behavior( MissedTickBehavior::Skip);
        info!("tracker started");

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => if !self.receive( msg) { break },
                    None => {
                        debug!("all tracker handles dropped");
                        break
                    }
                },
                _ = heartbeat.tick() => self.ctx.heartbeat( Utc::now())
            }
        }

        self.shutdown();
        self
    }

    /// process a single message. Returns false if the tracker should terminate
    pub fn receive (&mut self, msg: TrackerMsg)->bool {
        match msg {
            TrackerMsg::Update { id, update } => {
                if let Err(e) = self.ctx.update( &id, update) { error!("update of {} failed: {}", id, e) }
            }
            TrackerMsg::Lost(id) => {
                if let Err(e) = self.ctx.remove( &id) { error!("removal of {} failed: {}", id, e) }
            }
            TrackerMsg::Clear => {
                if let Err(e) = self.ctx.clear() { error!("clear failed: {}", e) }
                self.sources.bump_log_session();
            }
            TrackerMsg::Snapshot(aircraft) => {
                if let Err(e) = self.ctx.replace_all( aircraft) { error!("snapshot failed: {}", e) }
            }
            TrackerMsg::Select(id) => {
                if !self.ctx.select( &id) { debug!("selection of {} ignored", id) }
            }
            TrackerMsg::Tap(tag) => { self.ctx.tap( &tag); }
            TrackerMsg::Receiver { kind, reading } => { self.fuser.update( kind, reading); }
            TrackerMsg::StartSources => { self.sources.start_all(); }
            TrackerMsg::StopSources => self.sources.stop_all(),
            TrackerMsg::AttachLogger(sink) => self.sources.attach_logger( sink),
            TrackerMsg::Status(tx) => {
                if tx.send( self.status()).is_err() { warn!("status requester gone") }
            }
            TrackerMsg::Terminate => return false
        }
        true
    }

    pub fn status (&self)->TrackerStatus {
        let registry = self.ctx.registry();
        TrackerStatus {
            aircraft: self.ctx.entities().ids(),
            n_sessions: registry.len(),
            n_sessions_started: registry.n_started(),
            n_sessions_stopped: registry.n_stopped(),
            selected: self.ctx.selection().selected().cloned(),
            receiver: self.fuser.fused(),
            running_sources: SourceKind::ALL.iter()
                .filter( |k| self.sources.state(**k) == Some(ScanState::Running))
                .copied().collect(),
        }
    }

    fn shutdown (&mut self) {
        self.sources.stop_all();
        if let Err(e) = self.ctx.clear() { error!("tracker teardown failed: {}", e) }
        info!("tracker terminated");
    }
}
