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

use std::{fs, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize,Serializer,Deserializer,de::DeserializeOwned};
use tracing::debug;
use crate::{errors::{OdinRidError,Result}, fusion::AccuracyPolicyKind, sources::SourceKind};

/// env var that can be used to override where config files are looked up
pub const CONFIG_DIR_ENV: &str = "ODIN_RID_CONFIGS";

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct RidConfig {
    pub station: String, // receiver station name
    pub channel_bounds: usize, // tracker message queue capacity

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub shadow_id_timeout: Duration,

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub stale_after: Duration,

    pub accuracy_policy: AccuracyPolicyKind,
    pub sources: Vec<SourceKind>, // the sources that are available on this runtime
    pub log_records: bool,
}

impl Default for RidConfig {
    fn default ()->Self {
        RidConfig {
            station: "local".to_string(),
            channel_bounds: 256,
            shadow_id_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(5),
            accuracy_policy: AccuracyPolicyKind::Legacy,
            sources: SourceKind::ALL.to_vec(),
            log_records: false,
        }
    }
}

impl RidConfig {
    pub fn has_source (&self, kind: SourceKind)->bool { self.sources.contains(&kind) }
}

pub fn deserialize_duration <'a,D>(deserializer: D)->std::result::Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse_duration::parse( string.as_str())
            .map_err( |e| serde::de::Error::custom( format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S)->std::result::Result<S::Ok,S::Error> {
    s.serialize_str( &format!("{}ms", dur.as_millis()))
}

/// the directory from which we load config files: `$ODIN_RID_CONFIGS` if set, otherwise the crate `configs/` dir
pub fn config_dir ()->PathBuf {
    match std::env::var( CONFIG_DIR_ENV) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => Path::new( env!("CARGO_MANIFEST_DIR")).join("configs")
    }
}

/// load a RON config from a file name (looked up in [`config_dir`]) or an explicit path
pub fn load_config<C: DeserializeOwned> (filename: impl AsRef<Path>)->Result<C> {
    let filename = filename.as_ref();
    let path = if filename.is_absolute() || filename.exists() { filename.to_path_buf() } else { config_dir().join(filename) };
    debug!("loading config {:?}", path);

    let s = fs::read_to_string( &path)
        .map_err( |e| OdinRidError::ConfigError( format!("cannot read {:?}: {}", path, e)))?;
    config_from_str( &s)
}

pub fn config_from_str<C: DeserializeOwned> (s: &str)->Result<C> {
    Ok( ron::from_str(s)? )
}
