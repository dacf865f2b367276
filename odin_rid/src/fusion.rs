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

//! fusion of the receiver geolocation providers into a single receiver position

use std::fmt;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tokio::sync::watch;
use tracing::{debug,warn};
use uom::si::{f64::Length, length::meter};
use crate::entity::GeoPos;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum ProviderKind { Gps, Network }

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gps => f.write_str("gps"),
            ProviderKind::Network => f.write_str("network"),
        }
    }
}

/// a single reading of a geolocation provider. `accuracy` is the radius reported by the provider
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct ProviderReading {
    pub kind: ProviderKind,
    pub position: GeoPos,
    pub accuracy: Length,
    pub altitude: Option<Length>,
    pub timestamp: DateTime<Utc>,
}

impl ProviderReading {
    pub fn new (kind: ProviderKind, position: GeoPos, accuracy_meters: f64, timestamp: DateTime<Utc>)->Self {
        ProviderReading { kind, position, accuracy: Length::new::<meter>(accuracy_meters), altitude: None, timestamp }
    }

    pub fn accuracy_meters (&self)->f64 { self.accuracy.get::<meter>() }
}

/// the receiver position, which is always one of the provider readings
pub type FusedPosition = ProviderReading;

/// decides between two available readings
pub trait AccuracyPolicy: Send + Sync + fmt::Debug {
    fn prefer_gps (&self, gps: &ProviderReading, network: &ProviderReading)->bool;
}

/// the historical rule: gps wins if its accuracy value is *larger* than the network one, ties go to network
#[derive(Debug,Clone,Copy,Default)]
pub struct LegacyAccuracyPolicy;

impl AccuracyPolicy for LegacyAccuracyPolicy {
    fn prefer_gps (&self, gps: &ProviderReading, network: &ProviderReading)->bool {
        gps.accuracy > network.accuracy
    }
}

/// treat accuracy as an error radius - the smaller one wins, ties go to gps
#[derive(Debug,Clone,Copy,Default)]
pub struct SmallerRadiusPolicy;

impl AccuracyPolicy for SmallerRadiusPolicy {
    fn prefer_gps (&self, gps: &ProviderReading, network: &ProviderReading)->bool {
        gps.accuracy <= network.accuracy
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Default,Serialize,Deserialize)]
pub enum AccuracyPolicyKind { #[default] Legacy, SmallerRadius }

impl AccuracyPolicyKind {
    pub fn policy (&self)->Box<dyn AccuracyPolicy> {
        match self {
            AccuracyPolicyKind::Legacy => Box::new(LegacyAccuracyPolicy),
            AccuracyPolicyKind::SmallerRadius => Box::new(SmallerRadiusPolicy),
        }
    }
}

/// combines the latest gps and network readings. The fused value is published through a watch channel so that
/// any number of readers can access it without going through the tracker
pub struct LocationFuser {
    gps: Option<ProviderReading>,
    network: Option<ProviderReading>,
    policy: Box<dyn AccuracyPolicy>,
    tx: watch::Sender<Option<FusedPosition>>,
}

impl LocationFuser {
    pub fn new (policy: Box<dyn AccuracyPolicy>)->Self {
        let (tx,_) = watch::channel(None);
        LocationFuser { gps: None, network: None, policy, tx }
    }

    pub fn subscribe (&self)->watch::Receiver<Option<FusedPosition>> { self.tx.subscribe() }

    pub fn fused (&self)->Option<FusedPosition> { self.tx.borrow().clone() }
    pub fn reading (&self, kind: ProviderKind)->Option<&ProviderReading> {
        match kind {
            ProviderKind::Gps => self.gps.as_ref(),
            ProviderKind::Network => self.network.as_ref(),
        }
    }

    /// set (or clear with `None`) the reading of provider `kind` and recompute the fused position.
    /// Readings without a fix are rejected. Returns the current fused position
    pub fn update (&mut self, kind: ProviderKind, reading: Option<ProviderReading>)->Option<FusedPosition> {
        if let Some(r) = &reading {
            if r.position.is_no_fix() {
                warn!("ignoring {} reading without fix", kind);
                return self.fused()
            }
        }

        match kind {
            ProviderKind::Gps => self.gps = reading,
            ProviderKind::Network => self.network = reading,
        }

        let candidate = match (&self.gps, &self.network) {
            (Some(gps), Some(network)) => {
                if self.policy.prefer_gps( gps, network) { Some(gps.clone()) } else { Some(network.clone()) }
            }
            (Some(gps), None) => Some(gps.clone()),
            (None, Some(network)) => Some(network.clone()),
            (None, None) => None // keep what we had
        };

        if let Some(fused) = candidate {
            debug!("receiver position {} from {} ({:.1}m)", fused.position, fused.kind, fused.accuracy_meters());
            self.tx.send_replace( Some(fused));
        }
        self.fused()
    }
}

impl Default for LocationFuser {
    fn default ()->Self { LocationFuser::new( Box::new(LegacyAccuracyPolicy)) }
}
