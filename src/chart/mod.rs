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

//! Bar chart model.
//!
//! Turns a record set into plotted points (`x = time`, `y = count / time`)
//! and bar geometry. Drawing itself is left to a [`ChartView`].

use tracing::debug;

use crate::record::RecordSet;

/// Default data set label.
pub const DEFAULT_LABEL: &str = "Count per Minute";

/// Bar width in x-axis units.
const BAR_WIDTH: f64 = 0.85;

/// One plotted bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPoint {
    pub x: f32,
    pub y: f32,
}

/// Bar rectangle in pixel space, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Plotted data for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub label: String,
    pub points: Vec<BarPoint>,
}

impl ChartData {
    /// An empty chart.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            points: Vec::new(),
        }
    }

    /// Map records to points in input order.
    ///
    /// Records with `time == 0` have no defined rate and are skipped.
    pub fn from_records(label: impl Into<String>, records: Option<&RecordSet>) -> Self {
        let mut data = Self::empty(label);

        for record in records.into_iter().flatten() {
            match record.rate() {
                Some(rate) => data.points.push(BarPoint {
                    x: record.time as f32,
                    y: rate,
                }),
                None => debug!("Skipping record with zero time (count {})", record.count),
            }
        }

        data
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value range of the y axis: always includes zero, never narrower than 1.
    pub fn y_range(&self) -> (f64, f64) {
        let mut min = 0.0f64;
        let mut max = 0.0f64;
        for p in &self.points {
            min = min.min(p.y as f64);
            max = max.max(p.y as f64);
        }
        if max - min < 1.0 {
            max = min + 1.0;
        }
        (min, max)
    }

    /// Value range of the x axis, padded by half a unit on both sides.
    pub fn x_range(&self) -> (f64, f64) {
        let mut iter = self.points.iter().map(|p| p.x as f64);
        let Some(first) = iter.next() else {
            return (0.0, 1.0);
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
        (min - 0.5, max + 0.5)
    }

    /// Bar rectangles for a plot area of `width` x `height` pixels.
    pub fn layout(&self, width: f64, height: f64) -> Vec<BarRect> {
        if self.is_empty() || width <= 0.0 || height <= 0.0 {
            return Vec::new();
        }

        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();
        let x_scale = width / (x_max - x_min);
        let y_scale = height / (y_max - y_min);
        let baseline = height - (0.0 - y_min) * y_scale;

        self.points
            .iter()
            .map(|p| {
                let center = (p.x as f64 - x_min) * x_scale;
                let bar_width = BAR_WIDTH * x_scale;
                let top = height - (p.y as f64 - y_min) * y_scale;
                BarRect {
                    x: center - bar_width / 2.0,
                    y: top.min(baseline),
                    width: bar_width,
                    height: (baseline - top).abs(),
                }
            })
            .collect()
    }
}

/// Something that can display chart data.
pub trait ChartView {
    fn show(&self, data: &ChartData);
}

/// Renders record sets to a view.
pub struct ChartRenderer {
    label: String,
    view: Box<dyn ChartView>,
}

impl ChartRenderer {
    pub fn new(label: impl Into<String>, view: Box<dyn ChartView>) -> Self {
        Self {
            label: label.into(),
            view,
        }
    }

    /// Render a record set. `None` renders an empty chart.
    pub fn render(&self, records: Option<&RecordSet>) {
        let data = ChartData::from_records(self.label.clone(), records);
        debug!("Rendering {} points", data.points.len());
        self.view.show(&data);
    }
}
