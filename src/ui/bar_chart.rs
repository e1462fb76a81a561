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

//! Bar chart drawn with cairo on a GTK4 drawing area.

use gtk4::cairo;
use gtk4::prelude::*;
use gtk4::DrawingArea;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

use countchart_desktop::chart::{ChartData, ChartView};

const MARGIN: f64 = 24.0;
const LEGEND_HEIGHT: f64 = 20.0;

/// Drawing area showing the latest chart data.
#[derive(Clone)]
pub struct BarChartWidget {
    area: DrawingArea,
    data: Rc<RefCell<ChartData>>,
}

impl BarChartWidget {
    pub fn new(label: &str) -> Self {
        let area = DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .content_width(480)
            .content_height(320)
            .build();
        let data = Rc::new(RefCell::new(ChartData::empty(label)));

        let data_draw = data.clone();
        area.set_draw_func(move |_, cr, width, height| {
            if let Err(e) = draw(cr, width as f64, height as f64, &data_draw.borrow()) {
                warn!("Chart draw failed: {}", e);
            }
        });

        Self { area, data }
    }

    pub fn widget(&self) -> &DrawingArea {
        &self.area
    }
}

impl ChartView for BarChartWidget {
    fn show(&self, data: &ChartData) {
        *self.data.borrow_mut() = data.clone();
        self.area.queue_draw();
    }
}

fn draw(
    cr: &cairo::Context,
    width: f64,
    height: f64,
    data: &ChartData,
) -> Result<(), cairo::Error> {
    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.paint()?;

    let plot_width = (width - 2.0 * MARGIN).max(0.0);
    let plot_height = (height - 2.0 * MARGIN - LEGEND_HEIGHT).max(0.0);
    cr.set_font_size(11.0);

    if data.is_empty() {
        cr.set_source_rgb(0.5, 0.5, 0.5);
        cr.move_to(MARGIN, MARGIN + plot_height / 2.0);
        cr.show_text("No chart data available")?;
    } else {
        // Zero line
        let (y_min, y_max) = data.y_range();
        let baseline = MARGIN + plot_height * y_max / (y_max - y_min);
        cr.set_source_rgb(0.6, 0.6, 0.6);
        cr.set_line_width(1.0);
        cr.move_to(MARGIN, baseline);
        cr.line_to(MARGIN + plot_width, baseline);
        cr.stroke()?;

        let bars = data.layout(plot_width, plot_height);

        cr.set_source_rgb(0.29, 0.56, 0.89);
        for bar in &bars {
            cr.rectangle(MARGIN + bar.x, MARGIN + bar.y, bar.width, bar.height);
        }
        cr.fill()?;

        cr.set_source_rgb(0.2, 0.2, 0.2);
        for (bar, point) in bars.iter().zip(&data.points) {
            cr.move_to(MARGIN + bar.x, MARGIN + bar.y - 4.0);
            cr.show_text(&format!("{:.1}", point.y))?;
            cr.move_to(MARGIN + bar.x, baseline + 14.0);
            cr.show_text(&format!("{}", point.x))?;
        }
    }

    // Legend
    cr.set_source_rgb(0.29, 0.56, 0.89);
    cr.rectangle(MARGIN, height - MARGIN - 8.0, 10.0, 10.0);
    cr.fill()?;
    cr.set_source_rgb(0.2, 0.2, 0.2);
    cr.move_to(MARGIN + 16.0, height - MARGIN + 1.0);
    cr.show_text(&data.label)?;

    Ok(())
}
