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

//! the tracked Remote ID aircraft and its observable telemetry fields

use std::{fmt, sync::{Arc, atomic::{AtomicU64,Ordering}}, time::Duration};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use uom::si::f64::Length;

/// stable identity key of a tracked aircraft (usually the transport address of the broadcasting device)
#[derive(Debug,Clone,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
pub struct AircraftId(Arc<String>);

impl AircraftId {
    pub fn new (id: impl ToString)->Self { AircraftId( Arc::new(id.to_string())) }
    pub fn as_str (&self)->&str { self.0.as_str() }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AircraftId {
    fn from (s: &str)->Self { AircraftId::new(s) }
}

/* #region positions ************************************************************************************/

/// a plain lat/lon position in degrees
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct GeoPos {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPos {
    pub fn new (latitude: f64, longitude: f64)->Self { GeoPos { latitude, longitude } }

    /// producer side constructor that maps the (0,0) "no fix yet" sentinel to None
    pub fn fix (latitude: f64, longitude: f64)->Option<Self> {
        let pos = GeoPos { latitude, longitude };
        if pos.is_no_fix() { None } else { Some(pos) }
    }

    /// both coordinates exactly zero is what receivers report before they have a fix
    pub fn is_no_fix (&self)->bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5},{:.5})", self.latitude, self.longitude)
    }
}

/// aircraft location as reported by Remote ID location messages
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<Length>, // geodetic
}

impl Location {
    pub fn new (latitude: f64, longitude: f64)->Self { Location { latitude, longitude, altitude: None } }

    pub fn from_raw (latitude: f64, longitude: f64, altitude: Option<Length>)->Option<Self> {
        GeoPos::fix( latitude, longitude).map( |_| Location { latitude, longitude, altitude })
    }

    pub fn with_altitude (mut self, altitude: Length)->Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn position (&self)->GeoPos { GeoPos::new( self.latitude, self.longitude) }
    pub fn is_no_fix (&self)->bool { self.position().is_no_fix() }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum OperatorLocationType {
    TakeOff,
    LiveGnss,
    FixedLocation,
    Invalid,
}

impl fmt::Display for OperatorLocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperatorLocationType::TakeOff => "TakeOff",
            OperatorLocationType::LiveGnss => "LiveGNSS",
            OperatorLocationType::FixedLocation => "FixedLocation",
            OperatorLocationType::Invalid => "Invalid",
        };
        f.write_str(s)
    }
}

/// Remote ID system message data (we only track the operator related fields)
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct SystemData {
    pub operator_latitude: f64,
    pub operator_longitude: f64,
    pub operator_location_type: OperatorLocationType,
}

impl SystemData {
    pub fn new (operator_latitude: f64, operator_longitude: f64, operator_location_type: OperatorLocationType)->Self {
        SystemData { operator_latitude, operator_longitude, operator_location_type }
    }

    pub fn operator_position (&self)->GeoPos { GeoPos::new( self.operator_latitude, self.operator_longitude) }
}

/* #endregion positions */

/* #region identification and connection ****************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum IdType {
    None,
    SerialNumber,
    CaaRegistration,
    UtmAssigned,
    SpecificSession,
}

#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct BasicId {
    pub uas_id: String,
    pub id_type: IdType,
}

impl BasicId {
    pub fn new (uas_id: impl ToString, id_type: IdType)->Self { BasicId { uas_id: uas_id.to_string(), id_type } }
}

/// secondary basic id an aircraft might broadcast, together with the time we last received it
#[derive(Debug,Clone,PartialEq)]
pub struct ShadowBasicId {
    pub basic_id: BasicId,
    pub received: DateTime<Utc>,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
pub enum Transport {
    BluetoothLegacy,
    BluetoothLongRange,
    WifiNan,
    WifiBeacon,
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Connection {
    pub transport: Transport,
    pub rssi: i32, // dBm
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub msg_count: u64,
}

impl Connection {
    pub fn new (transport: Transport, rssi: i32, now: DateTime<Utc>)->Self {
        Connection { transport, rssi, first_seen: now, last_seen: now, msg_count: 1 }
    }

    pub fn age (&self, now: DateTime<Utc>)->Duration {
        (now - self.last_seen).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_stale (&self, now: DateTime<Utc>, stale_after: Duration)->bool {
        self.age(now) > stale_after
    }
}

/* #endregion identification and connection */

/* #region observable fields ****************************************************************************/

pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum Stream { Location, System }

/// explicit registration of a listener on one of the observable streams of an aircraft.
/// This is what has to be handed back to [`Aircraft::unsubscribe`] before the listener goes away
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Subscription {
    pub aircraft: AircraftId,
    pub stream: Stream,
    pub id: SubscriptionId,
}

/// a telemetry value slot that keeps track of who is listening to it.
/// Emission itself is done by the owner of the listeners, this only records registrations
#[derive(Debug)]
pub struct Observed<T> {
    value: Option<T>,
    listeners: Vec<SubscriptionId>,
}

impl<T> Observed<T> {
    pub fn new ()->Self { Observed { value: None, listeners: Vec::new() } }

    pub fn get (&self)->Option<&T> { self.value.as_ref() }
    pub fn is_set (&self)->bool { self.value.is_some() }

    pub fn set (&mut self, v: T) { self.value = Some(v) }

    pub fn listeners (&self)->&[SubscriptionId] { self.listeners.as_slice() }
    pub fn has_listener (&self, id: SubscriptionId)->bool { self.listeners.contains(&id) }

    fn add_listener (&mut self)->SubscriptionId {
        let id = NEXT_SUBSCRIPTION.fetch_add( 1, Ordering::Relaxed);
        self.listeners.push(id);
        id
    }

    fn remove_listener (&mut self, id: SubscriptionId)->bool {
        let len = self.listeners.len();
        self.listeners.retain( |l| *l != id);
        self.listeners.len() < len
    }
}

impl<T> Default for Observed<T> {
    fn default ()->Self { Self::new() }
}

/* #endregion observable fields */

/// a tracked Remote ID aircraft
#[derive(Debug)]
pub struct Aircraft {
    id: AircraftId,
    basic_id: Option<BasicId>,
    shadow_basic_id: Option<ShadowBasicId>,

    pub location: Observed<Location>,
    pub system: Observed<SystemData>,
    connection: Option<Connection>, // reported through the tracker connection actions, not per aircraft listeners
}

impl Aircraft {
    pub fn new (id: AircraftId)->Self {
        Aircraft {
            id,
            basic_id: None,
            shadow_basic_id: None,
            location: Observed::new(),
            system: Observed::new(),
            connection: None,
        }
    }

    pub fn with_location (mut self, loc: Location)->Self { self.location.set(loc); self }
    pub fn with_system (mut self, sys: SystemData)->Self { self.system.set(sys); self }
    pub fn with_basic_id (mut self, basic_id: BasicId)->Self { self.basic_id = Some(basic_id); self }

    pub fn id (&self)->&AircraftId { &self.id }
    pub fn basic_id (&self)->Option<&BasicId> { self.basic_id.as_ref() }
    pub fn shadow_basic_id (&self)->Option<&ShadowBasicId> { self.shadow_basic_id.as_ref() }
    pub fn location (&self)->Option<&Location> { self.location.get() }
    pub fn system (&self)->Option<&SystemData> { self.system.get() }
    pub fn connection (&self)->Option<&Connection> { self.connection.as_ref() }

    /// the label id shown for markers of this aircraft
    pub fn display_id (&self)->&str {
        self.basic_id.as_ref().map( |b| b.uas_id.as_str()).unwrap_or( crate::ID_MISSING)
    }

    /// set identification. The first basic id we get is the primary one, a different one is kept as shadow id
    pub fn set_basic_id (&mut self, basic_id: BasicId, now: DateTime<Utc>) {
        match &self.basic_id {
            None => self.basic_id = Some(basic_id),
            Some(primary) if *primary == basic_id => {}
            Some(_) => self.shadow_basic_id = Some( ShadowBasicId { basic_id, received: now })
        }
    }

    /// drop the shadow id once we haven't seen it for `timeout`. Returns true if it was dropped
    pub fn update_shadow_basic_id (&mut self, now: DateTime<Utc>, timeout: Duration)->bool {
        let is_expired = match &self.shadow_basic_id {
            Some(shadow) => (now - shadow.received).to_std().map( |age| age > timeout).unwrap_or(false),
            None => false
        };
        if is_expired { self.shadow_basic_id = None; }
        is_expired
    }

    /// update the connection status, keeping first_seen and counting messages
    pub fn update_connection (&mut self, mut conn: Connection) {
        if let Some(prev) = &self.connection {
            conn.first_seen = prev.first_seen;
            conn.msg_count = prev.msg_count + 1;
        }
        self.connection = Some(conn);
    }

    pub fn subscribe (&mut self, stream: Stream)->Subscription {
        let id = match stream {
            Stream::Location => self.location.add_listener(),
            Stream::System => self.system.add_listener(),
        };
        Subscription { aircraft: self.id.clone(), stream, id }
    }

    pub fn unsubscribe (&mut self, sub: &Subscription)->bool {
        if sub.aircraft != self.id { return false }
        match sub.stream {
            Stream::Location => self.location.remove_listener(sub.id),
            Stream::System => self.system.remove_listener(sub.id),
        }
    }

    pub fn n_listeners (&self)->usize {
        self.location.listeners().len() + self.system.listeners().len()
    }
}
