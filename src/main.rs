// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Countchart Desktop Application

mod ui;

use anyhow::Result;
use gtk4::prelude::*;
use libadwaita as adw;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countchart_desktop::config::Config;
use countchart_desktop::state::AppState;
use countchart_desktop::storage::RecordStore;

const APP_ID: &str = "org.countchart.Desktop";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("countchart_desktop=info".parse()?),
        )
        .init();

    info!(
        "Starting Countchart Desktop v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded (device {}, {:?} frames)",
        config.bluetooth.device_address, config.reader.frame_mode
    );

    // Initialize storage
    let store = RecordStore::new(&config.data_dir)?;
    info!("Record store initialized");

    // Create application state
    let state = AppState::new();

    // The read loop runs here; GTK keeps the main thread.
    let runtime = tokio::runtime::Runtime::new()?;

    let app = adw::Application::builder().application_id(APP_ID).build();

    let shell = ui::Shell {
        config,
        store,
        state: state.clone(),
        runtime: runtime.handle().clone(),
    };
    app.connect_activate(move |app| ui::show_main_window(app, &shell));

    // Teardown releases the transport
    app.connect_shutdown(move |_| {
        state.close_connection();
    });

    info!("Ready.");
    let exit_code = app.run();

    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("Countchart Desktop stopped ({:?})", exit_code);
    Ok(())
}
