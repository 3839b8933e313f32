//! Drawing helpers layered on the engine primitives.
//!
//! Each helper is a fixed composition of surface calls; none of them keeps
//! state beyond what lives in [`Shim`].

use std::time::{SystemTime, UNIX_EPOCH};

use glam::DVec2;

use super::surface::{Color, Surface};
use super::value::{format_number, ObjectId, Value};
use super::{CallError, CoordinateMode, Object, Shim};

/// Options for [`Shim::draw_tick_axes`]. Lengths are in screen pixels and
/// divided by `scale_factor` before drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct TickAxes {
    pub scale_factor: f64,
    pub spacing: f64,
    pub axis_color: Color,
    pub grid_color: Color,
    pub label_color: Color,
    pub label_size: f64,
    pub axis_thickness: f64,
    pub tick_thickness: f64,
    pub grid_thickness: f64,
}

impl Default for TickAxes {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            spacing: 50.0,
            axis_color: Color::css("rgb(20,45,217)"),
            grid_color: Color::css("rgba(255,255,255,0.6)"),
            label_color: Color::css("white"),
            label_size: 12.0,
            axis_thickness: 5.0,
            tick_thickness: 3.0,
            grid_thickness: 0.25,
        }
    }
}

/// A circle the user can drag with the mouse.
#[derive(Debug, Clone, PartialEq)]
pub struct MovableCircle {
    pub x: f64,
    pub y: f64,
    pub d: f64,
    /// Fill used while hovered or dragged.
    pub color: Color,
    pub is_movable: bool,
    pub locked_x: Option<f64>,
    pub locked_y: Option<f64>,
}

impl MovableCircle {
    pub fn new(x: f64, y: f64, d: f64, color: Color) -> Self {
        Self {
            x,
            y,
            d,
            color,
            is_movable: false,
            locked_x: None,
            locked_y: None,
        }
    }

    /// Pin one coordinate to `value`.
    pub fn lock(&mut self, axis: &str, value: f64) -> Result<(), CallError> {
        match axis {
            "x" => {
                self.locked_x = Some(value);
                self.x = value;
            }
            "y" => {
                self.locked_y = Some(value);
                self.y = value;
            }
            _ => return Err(bad_axis(axis)),
        }
        Ok(())
    }

    pub fn unlock(&mut self, axis: &str) -> Result<(), CallError> {
        match axis {
            "x" => self.locked_x = None,
            "y" => self.locked_y = None,
            _ => return Err(bad_axis(axis)),
        }
        Ok(())
    }
}

fn bad_axis(axis: &str) -> CallError {
    CallError::Value(format!("axis must be 'x' or 'y', not '{axis}'"))
}

/// Slider widget state. The engine owns the DOM element; the shim owns the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub value: f64,
    /// Zero means continuous.
    pub step: f64,
}

impl Slider {
    pub fn new(min: f64, max: f64, value: f64, step: f64) -> Self {
        let mut s = Self {
            min,
            max,
            value: min,
            step,
        };
        s.set(value);
        s
    }

    /// Clamp to `[min, max]` and snap to the nearest step from `min`.
    ///
    /// Bounds are expected in order; see [`Slider::check_bounds`].
    pub fn set(&mut self, value: f64) -> f64 {
        let mut v = value.max(self.min).min(self.max);
        if self.step > 0.0 {
            v = self.min + ((v - self.min) / self.step).round() * self.step;
            v = v.min(self.max);
        }
        self.value = v;
        v
    }
}

impl Slider {
    /// Reject bounds a slider cannot hold: NaN anywhere, or `min > max`.
    pub fn check_bounds(min: f64, max: f64, value: f64, step: f64) -> Result<(), CallError> {
        if min.is_nan() || max.is_nan() || value.is_nan() || step.is_nan() {
            return Err(CallError::Value("createSlider() arguments must be numbers, not NaN".into()));
        }
        if min > max {
            return Err(CallError::Value(format!(
                "createSlider() min ({}) is greater than max ({})",
                format_number(min),
                format_number(max)
            )));
        }
        Ok(())
    }
}

/// Re-map `value` from one range to another.
pub fn linmap(value: f64, start1: f64, stop1: f64, start2: f64, stop2: f64, within_bounds: bool) -> f64 {
    let mapped = (value - start1) / (stop1 - start1) * (stop2 - start2) + start2;
    if !within_bounds {
        return mapped;
    }
    // min/max rather than clamp: a NaN bound leaves the value unbounded on that side.
    let (lo, hi) = if start2 < stop2 { (start2, stop2) } else { (stop2, start2) };
    mapped.max(lo).min(hi)
}

/// Current UNIX time in whole seconds.
pub fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_millis() as f64 / 1000.0).round() as u64)
        .unwrap_or(0)
}

const ARROW_SIZE: f64 = 7.0;
const PIP: f64 = 15.0;

impl<S: Surface> Shim<S> {
    /// Draw text that reads upright whatever the orientation of the y-axis.
    pub fn responsive_text(&mut self, val: &str, x: f64, y: f64) {
        if self.text_upright() {
            self.surface.text(val, x, y);
        } else {
            self.surface.push();
            self.surface.scale(1.0, -1.0);
            self.surface.text(val, x, -y);
            self.surface.pop();
        }
    }

    /// Draw x and y axes with tick marks, labels and grid lines.
    pub fn draw_tick_axes(&mut self, opts: &TickAxes) -> Result<(), CallError> {
        let sf = opts.scale_factor;
        if !(sf > 0.0) || !(opts.spacing > 0.0) {
            return Err(CallError::Value(
                "drawTickAxes() needs a positive scale factor and spacing".into(),
            ));
        }
        let (w, h) = (self.surface.width(), self.surface.height());
        let ts = opts.label_size / sf;
        let step = opts.spacing / sf;
        let tick = 5.0 / sf;

        self.surface.push();
        self.surface.text_size(ts);
        self.surface.text_align("center", Some("center"));

        let mut y = 0.0;
        while y < h / sf {
            self.surface.stroke(&opts.axis_color);
            self.surface.stroke_weight(opts.tick_thickness / sf);
            self.surface.line(tick, y, -tick, y);
            self.surface.line(tick, -y, -tick, -y);

            if y != 0.0 {
                self.surface.fill(&opts.label_color);
                self.surface.no_stroke();
                self.responsive_text(&format_number(y), 2.0 * ts, y);
                self.responsive_text(&format_number(-y), 2.0 * ts, -y);
            }

            self.surface.stroke_weight(opts.grid_thickness / sf);
            self.surface.stroke(&opts.grid_color);
            self.surface.line(-w / sf, y, w / sf, y);
            self.surface.line(-w / sf, -y, w / sf, -y);
            y += step;
        }

        let mut x = 0.0;
        while x < w / sf {
            self.surface.stroke(&opts.axis_color);
            self.surface.stroke_weight(opts.tick_thickness / sf);
            self.surface.line(x, tick, x, -tick);
            self.surface.line(-x, tick, -x, -tick);

            if x != 0.0 {
                self.surface.fill(&opts.label_color);
                self.surface.no_stroke();
                self.responsive_text(&format_number(x), x, 1.5 * ts);
                self.responsive_text(&format_number(-x), -x, 1.5 * ts);
            }

            self.surface.stroke_weight(opts.grid_thickness / sf);
            self.surface.stroke(&opts.grid_color);
            self.surface.line(x, -h, x, h);
            self.surface.line(-x, -h, -x, h);
            x += step;
        }

        self.surface.stroke(&opts.axis_color);
        self.surface.stroke_weight(opts.axis_thickness / sf);
        self.surface.line(-w / sf, 0.0, w / sf, 0.0);
        self.surface.line(0.0, h / sf, 0.0, -h / sf);

        self.surface.fill(&opts.label_color);
        self.surface.no_stroke();
        self.responsive_text("0", ts, ts);
        self.surface.pop();
        Ok(())
    }

    /// Draw an arrow from tail to head with a fixed-size triangular head.
    pub fn arrow(&mut self, tail_x: f64, tail_y: f64, head_x: f64, head_y: f64) {
        let x = head_x - tail_x;
        let y = head_y - tail_y;

        self.surface.push();
        self.surface.translate(tail_x, tail_y);
        self.surface.line(0.0, 0.0, x, y);
        self.surface.rotate(self.angle_from_radians(y.atan2(x)));
        self.surface.translate(x.hypot(y) - ARROW_SIZE, 0.0);
        self.surface.triangle(
            0.0,
            ARROW_SIZE / 2.0,
            0.0,
            -ARROW_SIZE / 2.0,
            ARROW_SIZE,
            0.0,
        );
        self.surface.pop();
    }

    /// Draw one die face showing `roll`.
    pub fn die(
        &mut self,
        roll: i64,
        x: f64,
        y: f64,
        primary: &Color,
        secondary: &Color,
    ) -> Result<(), CallError> {
        if !(1..=6).contains(&roll) {
            return Err(CallError::Value("roll must be an integer from 1 to 6".into()));
        }
        let s = PIP;
        let pips: &[(f64, f64)] = match roll {
            1 => &[(0.0, 0.0)],
            2 => &[(s, -s), (-s, s)],
            3 => &[(0.0, 0.0), (s, -s), (-s, s)],
            4 => &[(s, -s), (-s, s), (s, s), (-s, -s)],
            5 => &[(0.0, 0.0), (s, -s), (-s, s), (s, s), (-s, -s)],
            _ => &[
                (s, -s * 6.0 / 5.0),
                (-s, s * 6.0 / 5.0),
                (s, s * 6.0 / 5.0),
                (-s, -s * 6.0 / 5.0),
                (-s, 0.0),
                (s, 0.0),
            ],
        };

        self.surface.push();
        self.surface.fill(primary);
        self.surface.no_stroke();
        self.surface.rect_mode("center");
        self.surface.square(x, y, 4.0 * s, Some(6.0));
        self.surface.fill(secondary);
        for (dx, dy) in pips {
            self.surface.circle(x + dx, y + dy, s);
        }
        self.surface.pop();
        Ok(())
    }

    /// Draw a bar graph with its origin at the current basis origin.
    ///
    /// Missing `width`/`height` fill the canvas up to a 16px margin; bars are
    /// `data[i] * bar_scale` tall.
    pub fn draw_bar_graph(
        &mut self,
        data: &[f64],
        labels: Option<&[String]>,
        width: Option<f64>,
        height: Option<f64>,
        bar_scale: Option<f64>,
    ) {
        let origin = self.basis.z_axis;
        let width = width.unwrap_or(self.surface.width() - origin.x - 16.0);
        let height = height.unwrap_or(origin.y - 16.0);
        let bar_scale = bar_scale.unwrap_or(5.0);

        self.surface.push();
        self.surface.text_align("center", Some("center"));

        self.surface.push();
        self.surface.no_fill();
        self.surface.line(0.0, 0.0, width, 0.0);
        self.surface.triangle(width, 10.0, width, -10.0, width + 15.0, 0.0);
        self.surface.line(0.0, 0.0, 0.0, height);
        self.surface.triangle(-10.0, height, 10.0, height, 0.0, height + 15.0);
        self.surface.pop();

        if !data.is_empty() {
            let bar_width = (width - 2.0) / (2.0 * data.len() as f64);

            self.surface.no_stroke();
            let label_y = -self.surface.current_text_size();
            for i in 0..data.len() {
                let x = bar_width + 2.0 * i as f64 * bar_width;
                let label = labels
                    .and_then(|l| l.get(i).cloned())
                    .unwrap_or_else(|| (i + 1).to_string());
                self.surface.text(&label, x, label_y);
            }

            self.surface.push();
            self.surface.no_stroke();
            for (i, v) in data.iter().enumerate() {
                let x = 2.0 * i as f64 * bar_width + 1.0;
                self.surface.rect(x, 1.0, 2.0 * bar_width, v * bar_scale);
            }
            self.surface.pop();
        }

        self.surface.pop();
    }

    /// Mouse position in the current local coordinates.
    pub fn mouse(&self) -> Result<DVec2, CallError> {
        let mut m = DVec2::new(self.surface.mouse_x(), self.surface.mouse_y());
        if self.coordinate_mode == CoordinateMode::RightHand {
            m.y = self.surface.height() - m.y;
        }
        if self.basis.determinant() == 0.0 {
            return Err(CallError::Value("current transform is not invertible".into()));
        }
        Ok(self.basis.inverse().transform_point2(m))
    }

    pub fn create_movable_circle(&mut self, x: f64, y: f64, d: f64, color: Color) -> ObjectId {
        self.insert(Object::Circle(MovableCircle::new(x, y, d, color)))
    }

    pub fn create_slider(&mut self, min: f64, max: f64, value: f64, step: f64) -> ObjectId {
        let slider = Slider::new(min, max, value, step);
        self.surface.create_slider(min, max, slider.value, step);
        self.insert(Object::Slider(slider))
    }

    pub(crate) fn is_hovering(&self, circle: &MovableCircle) -> Result<bool, CallError> {
        let m = self.mouse()?;
        Ok(m.distance(DVec2::new(circle.x, circle.y)) < circle.d / 2.0)
    }

    /// Draw a movable circle, following the mouse while it is being dragged.
    ///
    /// Only one circle can be picked up at a time; the latch is released by
    /// [`Shim::mouse_released`].
    pub fn draw_movable_circle(&mut self, id: ObjectId) -> Result<(), CallError> {
        let mut c = self.circle(id)?.clone();

        self.surface.push();
        if c.is_movable || self.is_hovering(&c)? {
            self.surface.fill(&c.color);
        }
        if c.is_movable {
            let m = self.mouse()?;
            c.x = c.locked_x.unwrap_or(m.x);
            c.y = c.locked_y.unwrap_or(m.y);
        }
        self.surface.circle(c.x, c.y, c.d);

        if !self.any_moving && self.surface.mouse_is_pressed() && self.is_hovering(&c)? {
            self.any_moving = true;
            c.is_movable = true;
        }
        self.surface.pop();

        *self.circle_mut(id)? = c;
        Ok(())
    }
}

/// Render any value the way `text()` would print it.
pub fn display_text(v: &Value) -> String {
    v.to_string()
}
