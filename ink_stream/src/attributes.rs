//! Attaching tool styles to curves
//!
//! Tool events travel down the pipeline as unhandled deltas. This stage
//! picks them up, remembers the most recent style and stamps it onto every
//! curve added after it. Tool events are consumed here and not forwarded.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::bezier_stream::{Curve, CurveOutput};
use crate::event::{DrawEvent, ToolStyle};
use crate::stream::{Consumers, Delta, Stream};

/// Curves paired index for index with the style each was drawn with.
#[derive(Debug, Clone, Default)]
pub struct StyledOutput {
    pub curves: Vec<Rc<Curve>>,
    pub styles: Vec<ToolStyle>,
    pub deltas: Vec<Delta>,
}

impl StyledOutput {
    pub fn styled(&self) -> impl Iterator<Item = (&Curve, &ToolStyle)> + '_ {
        self.curves
            .iter()
            .map(Rc::as_ref)
            .zip(self.styles.iter())
    }
}

pub type StyleOverride = Box<dyn FnMut(&Delta) -> Option<ToolStyle>>;

pub struct AttributesStream {
    initial: ToolStyle,
    current: ToolStyle,
    styles: Vec<ToolStyle>,
    /// Consulted for every added curve before the current style
    style_override: Option<StyleOverride>,
    produced: StyledOutput,
    consumers: Consumers<StyledOutput>,
}

impl fmt::Debug for AttributesStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributesStream")
            .field("current", &self.current)
            .field("styles", &self.styles.len())
            .field("style_override", &self.style_override.is_some())
            .finish()
    }
}

impl Default for AttributesStream {
    fn default() -> Self {
        Self::new(ToolStyle::default())
    }
}

impl AttributesStream {
    pub fn new(style: ToolStyle) -> Self {
        Self {
            initial: style.clone(),
            current: style,
            styles: Vec::new(),
            style_override: None,
            produced: StyledOutput::default(),
            consumers: Consumers::new(),
        }
    }

    pub fn current_style(&self) -> &ToolStyle {
        &self.current
    }

    pub fn set_style_override<F>(&mut self, style_override: F)
    where
        F: FnMut(&Delta) -> Option<ToolStyle> + 'static,
    {
        self.style_override = Some(Box::new(style_override));
    }

    pub fn clear_style_override(&mut self) {
        self.style_override = None;
    }

    pub fn styles(&self) -> &[ToolStyle] {
        &self.styles
    }

    pub fn produced(&self) -> &StyledOutput {
        &self.produced
    }
}

impl Stream for AttributesStream {
    type Consumes = CurveOutput;
    type Produces = StyledOutput;

    fn produce(&mut self, input: &CurveOutput) -> StyledOutput {
        let mut deltas = Vec::with_capacity(input.deltas.len());
        for delta in &input.deltas {
            match delta {
                Delta::Unhandled(DrawEvent::Tool(tool)) => {
                    debug!("tool style is now {:?}", tool.style);
                    self.current = tool.style.clone();
                }
                Delta::Added(index) => {
                    let style = self
                        .style_override
                        .as_mut()
                        .and_then(|style_override| style_override(delta))
                        .unwrap_or_else(|| self.current.clone());
                    if *index >= self.styles.len() {
                        self.styles.resize(*index + 1, self.current.clone());
                    }
                    self.styles[*index] = style;
                    deltas.push(delta.clone());
                }
                other => deltas.push(other.clone()),
            }
        }

        let output = StyledOutput {
            curves: input.items.clone(),
            styles: self.styles.clone(),
            deltas,
        };
        self.consumers.notify(&output);
        self.produced = output.clone();
        output
    }

    fn reset(&mut self) {
        self.current = self.initial.clone();
        self.styles.clear();
        self.produced = StyledOutput::default();
        self.consumers.reset();
    }

    fn consumers_mut(&mut self) -> &mut Consumers<StyledOutput> {
        &mut self.consumers
    }
}
