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

//! Main window: connect button, status line and chart.

use gtk4::prelude::*;
use gtk4::{ApplicationWindow, Box as GtkBox, Button, Label, Orientation};
use libadwaita as adw;
use std::sync::Arc;
use tracing::info;

use countchart_desktop::bluetooth::{BluetoothConnector, ConnectionEvent, ConnectionHandler};
use countchart_desktop::chart::ChartRenderer;
use countchart_desktop::config::Config;
use countchart_desktop::events::{EventProcessor, Notifier};
use countchart_desktop::state::{AppState, ConnectionStatus};
use countchart_desktop::storage::RecordStore;

use super::bar_chart::BarChartWidget;

/// Everything the window needs from the application.
#[derive(Clone)]
pub struct Shell {
    pub config: Config,
    pub store: RecordStore,
    pub state: Arc<AppState>,
    pub runtime: tokio::runtime::Handle,
}

/// Shows notices as toasts.
struct ToastNotifier {
    overlay: adw::ToastOverlay,
}

impl Notifier for ToastNotifier {
    fn notify(&self, message: &str) {
        self.overlay.add_toast(adw::Toast::new(message));
    }
}

/// Create and show the main window.
pub fn show_main_window(app: &adw::Application, shell: &Shell) {
    if let Some(window) = app.active_window() {
        window.present();
        return;
    }

    let window = ApplicationWindow::builder()
        .application(app)
        .title("Countchart")
        .default_width(640)
        .default_height(480)
        .build();

    let main_box = GtkBox::new(Orientation::Vertical, 8);
    main_box.set_margin_top(8);
    main_box.set_margin_bottom(8);
    main_box.set_margin_start(8);
    main_box.set_margin_end(8);

    // Connect button and status
    let header_box = GtkBox::new(Orientation::Horizontal, 8);
    let connect_button = Button::with_label("Connect");
    connect_button.add_css_class("suggested-action");
    let status_label = Label::new(None);
    status_label.set_hexpand(true);
    status_label.set_halign(gtk4::Align::Start);
    status_label.add_css_class("dim-label");

    header_box.append(&connect_button);
    header_box.append(&status_label);
    main_box.append(&header_box);

    let chart = BarChartWidget::new(&shell.config.chart.label);
    main_box.append(chart.widget());

    let overlay = adw::ToastOverlay::new();
    overlay.set_child(Some(&main_box));
    window.set_child(Some(&overlay));

    let processor = EventProcessor::new(
        shell.store.clone(),
        shell.state.clone(),
        ChartRenderer::new(shell.config.chart.label.clone(), Box::new(chart.clone())),
        Box::new(ToastNotifier {
            overlay: overlay.clone(),
        }),
    );

    // Initial chart from whatever was stored last time
    processor.refresh_chart();
    update_status(&status_label, &shell.state);

    let (event_tx, event_rx) = async_channel::unbounded::<ConnectionEvent>();

    // Events arrive from the runtime; apply them on the GTK thread.
    let status_events = status_label.clone();
    let state_events = shell.state.clone();
    glib::MainContext::default().spawn_local(async move {
        while let Ok(event) = event_rx.recv().await {
            processor.process_event(event);
            update_status(&status_events, &state_events);
        }
    });

    // Connect handler
    let shell_connect = shell.clone();
    let status_connect = status_label.clone();
    connect_button.connect_clicked(move |_| {
        let shell = &shell_connect;
        let Some(close_rx) = shell.state.begin_connect() else {
            info!("Connection already in progress");
            return;
        };
        update_status(&status_connect, &shell.state);

        let handler = ConnectionHandler::new(
            BluetoothConnector::new(shell.config.bluetooth.connect_timeout()),
            shell.config.bluetooth.device_address.clone(),
            shell.store.clone(),
            shell.config.reader.frame_reader(),
            event_tx.clone(),
        );
        shell.runtime.spawn(handler.run(close_rx));
    });

    // Window close handler
    let state_close = shell.state.clone();
    window.connect_close_request(move |_| {
        state_close.close_connection();
        glib::Propagation::Proceed
    });

    window.present();
}

/// Refresh the status line from state.
fn update_status(label: &Label, state: &AppState) {
    let status = state.get_status();
    let mut text = match (status, state.get_device_name()) {
        (ConnectionStatus::Reading, Some(device)) => format!("Connected to {}", device),
        _ => status.as_str().to_string(),
    };

    if let Some(at) = state.get_last_update() {
        text.push_str(&format!(" · Last update {}", at.format("%Y-%m-%d %H:%M:%S")));
    }

    label.set_text(&text);
}
