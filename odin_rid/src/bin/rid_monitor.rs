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

use std::{sync::Arc, time::Duration};
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use tokio::time::{self,sleep};
use tracing::{info,warn};
use tracing_subscriber::EnvFilter;
use odin_rid::{
    RidConfig, load_config, GeoPos, TrackerActor, TrackerContext, TrackerHandle, TrackerMsg,
    entity_set::SetDiff,
    fusion::{LocationFuser,ProviderKind},
    render::HeadlessMap,
    sim::{SimulatedSource,sim_drones,spawn_simulated_provider},
    sources::{SourceKind,SourceLifecycleManager,TracingRecordSink},
};

#[derive(Parser,Debug)]
#[command(about="monitor simulated Remote ID aircraft")]
struct CliOpts {
    /// config file (file name in config dir or path)
    #[arg(long, default_value="rid.ron")]
    config: String,

    /// number of simulated drones per scan source
    #[arg(long, default_value_t=2)]
    drones: usize,

    /// run time in seconds (0: until ctrl-c)
    #[arg(long, default_value_t=0)]
    secs: u64,

    /// simulate a runtime without WiFi NaN support
    #[arg(long)]
    no_nan: bool,

    /// log scan records
    #[arg(long)]
    log: bool,
}

lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }

const CENTER: GeoPos = GeoPos { latitude: 37.4125, longitude: -122.0583 };

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())  // use RUST_LOG to set max level
        .init();

    let config: RidConfig = match load_config( &ARGS.config) {
        Ok(config) => config,
        Err(e) => {
            warn!("using default config ({})", e);
            RidConfig::default()
        }
    };
    info!("station '{}' with sources {:?}", config.station, config.sources);

    let (hself, rx) = TrackerHandle::new( config.channel_bounds);

    let fuser = LocationFuser::new( config.accuracy_policy.policy());
    let mut sources = SourceLifecycleManager::new();
    for kind in SourceKind::ALL {
        if config.has_source(kind) && !(ARGS.no_nan && kind == SourceKind::WifiNan) {
            let prefix = match kind { SourceKind::Bluetooth => "bt", SourceKind::WifiNan => "nan", SourceKind::WifiBeacon => "bcn" };
            let drones = sim_drones( prefix, ARGS.drones, CENTER);
            let source = SimulatedSource::new( kind, hself.downgrade(), fuser.subscribe(), drones, Duration::from_secs(1));
            sources.install( Box::new(source));
        }
    }

    let mut ctx = TrackerContext::new( HeadlessMap::default(), &config);
    ctx.subscribe_diff( |diff: &SetDiff| -> odin_rid::Result<()> {
        println!("{} drones", diff.size);
        Ok(())
    });

    let tracker = TrackerActor::new( ctx, fuser, sources).spawn( rx);

    spawn_simulated_provider( hself.clone(), ProviderKind::Gps, CENTER, 8.0, Duration::from_secs(2));
    spawn_simulated_provider( hself.clone(), ProviderKind::Network, CENTER, 25.0, Duration::from_secs(5));

    if config.log_records || ARGS.log {
        hself.send_msg( TrackerMsg::AttachLogger( Some( Arc::new( TracingRecordSink::new())))).await?;
    }
    hself.send_msg( TrackerMsg::StartSources).await?;

    tokio::select! {
        res = monitor( &hself) => res?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = sleep( Duration::from_secs( ARGS.secs)), if ARGS.secs > 0 => info!("run time expired")
    }

    hself.terminate().await?;
    let actor = tracker.await?;
    info!("{} sessions started, {} stopped", actor.ctx.registry().n_started(), actor.ctx.registry().n_stopped());
    Ok(())
}

/// periodically print the tracker status and cycle the selection through the known aircraft
async fn monitor (hself: &TrackerHandle)->Result<()> {
    let mut timer = time::interval( Duration::from_secs(5));
    let mut n = 0usize;
    loop {
        timer.tick().await;
        let status = hself.query_status().await?;
        println!("{}", serde_json::to_string_pretty( &status)?);

        if !status.aircraft.is_empty() {
            let id = status.aircraft[n % status.aircraft.len()].clone();
            hself.send_msg( TrackerMsg::Select(id)).await?;
            n += 1;
        }
    }
}
