//! SVG output for styled curves

use kurbo::{BezPath, PathEl, Rect};

use crate::attributes::StyledOutput;

const MARGIN: f64 = 10.0;

/// Path data (`d` attribute) for a kurbo path.
pub fn path_data(path: &BezPath) -> String {
    let mut data = String::new();
    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                data.push_str(&format!("M{},{}", p.x, p.y));
            }
            PathEl::LineTo(p) => {
                data.push_str(&format!("L{},{}", p.x, p.y));
            }
            PathEl::QuadTo(p1, p2) => {
                data.push_str(&format!("Q{},{} {},{}", p1.x, p1.y, p2.x, p2.y));
            }
            PathEl::CurveTo(p1, p2, p3) => {
                data.push_str(&format!(
                    "C{},{} {},{} {},{}",
                    p1.x, p1.y, p2.x, p2.y, p3.x, p3.y
                ));
            }
            PathEl::ClosePath => {
                data.push('Z');
            }
        }
    }
    data
}

/// Bounding box of every non-empty curve, grown by a small margin.
pub fn bounds(output: &StyledOutput) -> Option<Rect> {
    output
        .curves
        .iter()
        .filter_map(|curve| curve.bounds())
        .reduce(|all, rect| all.union(rect))
        .map(|rect| rect.inflate(MARGIN, MARGIN))
}

/// A standalone SVG document with one `<path>` per curve.
///
/// The view box covers `view` when given, otherwise the curves' own bounds.
/// Eraser strokes are painted in the background color.
pub fn document(output: &StyledOutput, view: Option<Rect>) -> String {
    let view = view
        .or_else(|| bounds(output))
        .unwrap_or(Rect::new(0.0, 0.0, 1000.0, 1000.0));

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" width=\"{}\" height=\"{}\">\n",
        view.x0,
        view.y0,
        view.width(),
        view.height(),
        view.width(),
        view.height()
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        view.x0,
        view.y0,
        view.width(),
        view.height()
    ));

    for (curve, style) in output.styled() {
        if curve.is_empty() {
            continue;
        }
        let color = style.color.as_deref().unwrap_or("white");
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n",
            path_data(curve.path()),
            color,
            style.width
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::event::{DrawEvent, ToolEvent, ToolStyle};
    use crate::simple_event::{to_touch_events, SimpleEvent};

    fn styled(events: Vec<DrawEvent>) -> StyledOutput {
        let mut pipeline = Pipeline::default();
        pipeline.process(&events);
        let output = pipeline.styled().clone();
        output
    }

    #[test]
    fn test_path_data() {
        let mut path = BezPath::new();
        path.move_to((1.0, 2.0));
        path.line_to((3.0, 4.0));
        path.curve_to((5.0, 6.0), (7.0, 8.0), (9.0, 10.0));
        path.close_path();
        assert_eq!(path_data(&path), "M1,2L3,4C5,6 7,8 9,10Z");
    }

    #[test]
    fn test_empty_document() {
        let svg = document(&StyledOutput::default(), None);
        assert!(svg.contains("viewBox=\"0 0 1000 1000\""));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_one_path_per_curve() {
        let mut events: Vec<DrawEvent> = to_touch_events(&[
            SimpleEvent::new("a", 10.0, 10.0),
            SimpleEvent::new("a", 90.0, 10.0),
        ])
        .into_iter()
        .map(DrawEvent::from)
        .collect();
        events.push(ToolEvent::new(ToolStyle::new(8.0, None)).into());
        events.extend(
            to_touch_events(&[SimpleEvent::new("b", 10.0, 50.0), SimpleEvent::new("b", 90.0, 50.0)])
                .into_iter()
                .map(DrawEvent::from),
        );

        let output = styled(events);
        let svg = document(&output, None);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("stroke=\"#000000\" stroke-width=\"1.5\""));
        assert!(svg.contains("stroke=\"white\" stroke-width=\"8\""));
        assert!(svg.contains("viewBox=\"0 0 100 60\""));
    }
}
