//! JSON-driven replay cases
//!
//! A replay case carries a recorded event log (or a compact script), the
//! pipeline config to run it with and the points at which to split it into
//! batches. [`ReplayRunner`] runs the events in one batch and again split,
//! checks that every stage ended up in the same state and writes the final
//! curves as SVG.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::event::DrawEvent;
use crate::pipeline::Pipeline;
use crate::simple_event::{to_touch_events, SimpleEvent};
use crate::svg;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayCase {
    /// Name of the case, also the default SVG file name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub config: PipelineConfig,

    /// Recorded events. Mutually exclusive with `script`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<DrawEvent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<SimpleEvent>,

    /// Event offsets to split delivery at; empty tries every offset
    #[serde(default)]
    pub splits: Vec<usize>,

    /// SVG file name, without directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ReplayCase {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The events to replay, expanding the script if there is one.
    pub fn draw_events(&self) -> Result<Vec<DrawEvent>> {
        match (self.events.is_empty(), self.script.is_empty()) {
            (false, false) => Err(self.invalid("has both events and a script")),
            (true, true) => Err(self.invalid("has no events")),
            (false, true) => Ok(self.events.clone()),
            (true, false) => Ok(to_touch_events(&self.script)
                .into_iter()
                .map(DrawEvent::from)
                .collect()),
        }
    }

    fn invalid(&self, message: &str) -> Error {
        Error::InvalidReplay {
            name: self.name.clone(),
            message: message.to_string(),
        }
    }
}

/// Summary of one successful replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub name: String,
    pub events: usize,
    pub curves: usize,
    /// Split layouts that were checked against single-batch delivery
    pub layouts: usize,
    pub svg: Option<PathBuf>,
}

pub struct ReplayRunner {
    verbose: bool,
    output_dir: Option<PathBuf>,
    /// Replaces each case's own config when set
    config: Option<PipelineConfig>,
    /// Split offsets added to each case's own
    splits: Vec<usize>,
}

impl ReplayRunner {
    pub fn new(verbose: bool, output_dir: Option<PathBuf>) -> Self {
        Self {
            verbose,
            output_dir,
            config: None,
            splits: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_splits(mut self, splits: Vec<usize>) -> Self {
        self.splits = splits;
        self
    }

    pub fn run(&self, case: &ReplayCase) -> Result<ReplayReport> {
        println!("\n=== Replaying: {} ===", case.name);
        if !case.description.is_empty() {
            println!("Description: {}", case.description);
        }

        let config = self.config.clone().unwrap_or_else(|| case.config.clone());
        config.validate()?;
        let events = case.draw_events()?;

        let mut splits: Vec<usize> = case.splits.iter().chain(&self.splits).copied().collect();
        if let Some(&bad) = splits.iter().find(|&&split| split > events.len()) {
            return Err(case.invalid(&format!(
                "split {bad} is past the last of {} events",
                events.len()
            )));
        }
        splits.sort_unstable();
        splits.dedup();

        let mut whole = Pipeline::new(config.clone());
        whole.process(&events);
        info!(
            "{}: {} events, {} curves",
            case.name,
            events.len(),
            whole.curves().len()
        );

        let layouts: Vec<Vec<usize>> = if splits.is_empty() {
            (1..events.len()).map(|split| vec![split]).collect()
        } else {
            vec![splits]
        };
        for layout in &layouts {
            let mut split = Pipeline::new(config.clone());
            let mut start = 0;
            for &end in layout.iter().chain(std::iter::once(&events.len())) {
                split.process(&events[start..end]);
                start = end;
            }
            compare(&case.name, &whole, &split, layout)?;
            debug!("{}: split at {layout:?} matches", case.name);
        }
        println!("  → {} split layouts match", layouts.len());

        let svg = match &self.output_dir {
            Some(dir) => {
                let file = case
                    .output
                    .clone()
                    .unwrap_or_else(|| format!("{}.svg", case.name));
                let path = dir.join(file);
                fs::write(&path, svg::document(&whole.styled(), None))?;
                println!("    Written: {}", path.display());
                Some(path)
            }
            None => None,
        };

        if self.verbose {
            for (index, line) in whole.smoothed().iter().enumerate() {
                println!("    line {index}: {line}");
            }
        }

        println!("✓ Replay completed successfully");
        let curves = whole.curves().len();
        Ok(ReplayReport {
            name: case.name.clone(),
            events: events.len(),
            curves,
            layouts: layouts.len(),
            svg,
        })
    }
}

fn compare(name: &str, whole: &Pipeline, split: &Pipeline, splits: &[usize]) -> Result<()> {
    let diverged = |stage: &'static str| Error::Diverged {
        name: name.to_string(),
        stage,
        splits: splits.to_vec(),
    };
    if *whole.paths() != *split.paths() {
        return Err(diverged("paths"));
    }
    if *whole.lines() != *split.lines() {
        return Err(diverged("polylines"));
    }
    if *whole.simplified() != *split.simplified() {
        return Err(diverged("simplification"));
    }
    if *whole.smoothed() != *split.smoothed() {
        return Err(diverged("smoothing"));
    }
    if *whole.curves() != *split.curves() {
        return Err(diverged("curves"));
    }
    if whole.styled().styles != split.styled().styles {
        return Err(diverged("styles"));
    }
    Ok(())
}
