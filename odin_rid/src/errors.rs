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

use thiserror::Error;
use crate::sources::SourceKind;

pub type Result<T> = std::result::Result<T,OdinRidError>;

#[derive(Error,Debug)]
pub enum OdinRidError {

    /// the only error that is visible to callers of the tracking core - sessions are strictly 1:1 with aircraft
    #[error("observation session already exists for {0}")]
    DuplicateSession(String),

    #[error("scan source {kind} failed: {msg}")]
    SourceError { kind: SourceKind, msg: String },

    #[error("config error {0}")]
    ConfigError(String),

    #[error("RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("action error {0}")]
    ActionError( String ),

    #[error("channel closed {0}")]
    ChannelClosed(String),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

macro_rules! source_error {
    ($kind:expr, $fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinRidError::SourceError{ kind: $kind, msg: format!( $fmt $(, $arg)* ) }
    };
}
pub (crate) use source_error;

pub fn action_error (msg: impl ToString)->OdinRidError {
    OdinRidError::ActionError( msg.to_string())
}
