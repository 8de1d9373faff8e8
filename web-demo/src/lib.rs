use ink_stream::{
    svg, Delta, DrawEvent, Phase, Pipeline, PipelineConfig, ToolEvent, ToolStyle, TouchEvent,
    TouchType,
};
use kurbo::{stroke, Cap, Join, Point, Stroke, StrokeOpts};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// A stroke pipeline driven from browser pointer events.
///
/// Queue the samples of one pointer callback (coalesced samples first, then
/// predicted ones) with the `touch_*` methods, then call `flush` once to run
/// them through the pipeline as a single batch.
#[wasm_bindgen]
pub struct WebInkPipeline {
    pipeline: Pipeline,
    pending: Vec<DrawEvent>,
}

#[wasm_bindgen]
impl WebInkPipeline {
    /// Create a pipeline from a JSON config, or the defaults when none is given.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebInkPipeline, JsValue> {
        let config = match config_json {
            Some(json) => {
                let config: PipelineConfig = serde_json::from_str(&json).map_err(|e| {
                    console_log!("Invalid pipeline config: {}", e);
                    JsValue::from_str(&e.to_string())
                })?;
                config
                    .validate()
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                config
            }
            None => PipelineConfig::default(),
        };
        Ok(WebInkPipeline {
            pipeline: Pipeline::new(config),
            pending: Vec::new(),
        })
    }

    fn push_touch(&mut self, touch_id: &str, phase: Phase, x: f64, y: f64, force: f64, stylus: bool) {
        let mut event = TouchEvent::new(touch_id, phase, Point::new(x, y)).with_force(force);
        if stylus {
            event.touch_type = TouchType::Stylus;
        }
        self.pending.push(event.into());
    }

    pub fn touch_began(&mut self, touch_id: &str, x: f64, y: f64, force: f64, stylus: bool) {
        self.push_touch(touch_id, Phase::Began, x, y, force, stylus);
    }

    pub fn touch_moved(&mut self, touch_id: &str, x: f64, y: f64, force: f64, stylus: bool) {
        self.push_touch(touch_id, Phase::Moved, x, y, force, stylus);
    }

    pub fn touch_ended(&mut self, touch_id: &str, x: f64, y: f64, force: f64, stylus: bool) {
        self.push_touch(touch_id, Phase::Ended, x, y, force, stylus);
    }

    pub fn touch_cancelled(&mut self, touch_id: &str, x: f64, y: f64) {
        self.push_touch(touch_id, Phase::Cancelled, x, y, 1.0, false);
    }

    /// A predicted sample from `getPredictedEvents()`.
    pub fn touch_predicted(&mut self, touch_id: &str, x: f64, y: f64) {
        let event = TouchEvent::new(touch_id, Phase::Moved, Point::new(x, y)).predicted();
        self.pending.push(event.into());
    }

    /// Switch tool. Curves started after this use the new style; a missing
    /// color selects the eraser.
    pub fn set_tool(&mut self, width: f64, color: Option<String>) {
        let style = ToolStyle::new(width, color.as_deref());
        self.pending.push(ToolEvent::new(style).into());
    }

    /// Process everything queued since the last flush and return the indexes
    /// of the curves that changed.
    pub fn flush(&mut self) -> Vec<u32> {
        let events = std::mem::take(&mut self.pending);
        let deltas = self.pipeline.process(&events);
        let mut changed: Vec<u32> = deltas
            .iter()
            .filter(|delta| matches!(delta, Delta::Added(_) | Delta::Updated(..)))
            .filter_map(Delta::index)
            .map(|index| index as u32)
            .collect();
        changed.sort_unstable();
        changed.dedup();
        changed
    }

    pub fn curve_count(&self) -> usize {
        self.pipeline.curves().len()
    }

    /// SVG path data of curve `index`'s centre line.
    pub fn curve_path(&self, index: usize) -> String {
        self.pipeline
            .curves()
            .get(index)
            .map(|curve| svg::path_data(curve.path()))
            .unwrap_or_default()
    }

    /// SVG path data of the filled outline of curve `index`, stroked with
    /// the width of its tool.
    pub fn curve_outline(&self, index: usize, tolerance: f64) -> String {
        let styled = self.pipeline.styled();
        let (Some(curve), Some(tool)) = (styled.curves.get(index), styled.styles.get(index)) else {
            return String::new();
        };
        let style = Stroke::new(tool.width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        stroke(curve.path().iter(), &style, &StrokeOpts::default(), tolerance).to_svg()
    }

    /// CSS color of curve `index`, or `None` for eraser strokes.
    pub fn curve_color(&self, index: usize) -> Option<String> {
        self.pipeline
            .styled()
            .styles
            .get(index)
            .and_then(|style| style.color.clone())
    }

    pub fn curve_width(&self, index: usize) -> f64 {
        self.pipeline
            .styled()
            .styles
            .get(index)
            .map_or(0.0, |style| style.width)
    }

    pub fn svg_document(&self) -> String {
        svg::document(&self.pipeline.styled(), None)
    }

    pub fn set_simplify_enabled(&mut self, enabled: bool) {
        self.pipeline.set_simplify_enabled(enabled);
    }

    pub fn set_smoothing_enabled(&mut self, enabled: bool) {
        self.pipeline.set_smoothing_enabled(enabled);
    }

    /// Every event processed so far, as JSON, for replay.
    pub fn export_events(&self) -> Result<String, JsValue> {
        self.pipeline
            .events_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.pipeline.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_reports_changed_curves() {
        let mut ink = WebInkPipeline::new(None).unwrap();
        ink.touch_began("p", 10.0, 10.0, 0.5, true);
        ink.touch_moved("p", 20.0, 12.0, 0.5, true);
        ink.touch_predicted("p", 30.0, 14.0);
        assert_eq!(ink.flush(), vec![0]);

        ink.touch_moved("p", 28.0, 15.0, 0.5, true);
        ink.touch_ended("p", 40.0, 20.0, 0.5, true);
        assert_eq!(ink.flush(), vec![0]);
        assert_eq!(ink.curve_count(), 1);
        assert!(ink.curve_path(0).starts_with("M10,10"));
        assert!(!ink.curve_outline(0, 0.1).is_empty());
        assert_eq!(ink.curve_color(0).as_deref(), Some("#000000"));
        assert!(ink.flush().is_empty());
    }

    #[test]
    fn test_tool_applies_to_next_curve() {
        let mut ink = WebInkPipeline::new(None).unwrap();
        ink.set_tool(12.0, None);
        ink.touch_began("e", 0.0, 0.0, 1.0, false);
        ink.touch_ended("e", 5.0, 5.0, 1.0, false);
        ink.flush();
        assert_eq!(ink.curve_color(0), None);
        assert_eq!(ink.curve_width(0), 12.0);

        ink.reset();
        assert_eq!(ink.curve_count(), 0);
    }
}
