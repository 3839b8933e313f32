//! The forwarding table: exposed name → conversion + engine call.

use std::collections::BTreeMap;

use super::helpers::{display_text, linmap, unix_time, Slider, TickAxes};
use super::surface::{Color, Surface};
use super::value::{Args, ObjectId, Value};
use super::{CallError, Shim};

type Forward<S> = fn(&mut Shim<S>, Args<'_>) -> Result<Value, CallError>;

/// One forwarding entry.
pub struct Binding<S: Surface> {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    forward: Forward<S>,
}

impl<S: Surface> Clone for Binding<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Surface> Copy for Binding<S> {}

impl<S: Surface> Binding<S> {
    /// Check arity, then forward.
    pub fn invoke(self, shim: &mut Shim<S>, values: &[Value]) -> Result<Value, CallError> {
        let got = values.len();
        if got < self.min_args || got > self.max_args {
            return Err(CallError::Arity {
                name: self.name.to_string(),
                min: self.min_args,
                max: self.max_args,
                got,
            });
        }
        (self.forward)(shim, Args::new(self.name, values))
    }
}

/// Name-keyed forwarding entries.
pub struct Registry<S: Surface> {
    bindings: BTreeMap<&'static str, Binding<S>>,
}

impl<S: Surface> Default for Registry<S> {
    fn default() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }
}

fn none() -> Result<Value, CallError> {
    Ok(Value::None)
}

impl<S: Surface> Registry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, min_args: usize, max_args: usize, forward: Forward<S>) {
        self.bindings.insert(
            name,
            Binding {
                name,
                min_args,
                max_args,
                forward,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Binding<S>> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Exposed names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.keys().copied()
    }

    /// `(name, min_args, max_args)` for every binding, in name order.
    pub fn arities(&self) -> impl Iterator<Item = (&'static str, usize, usize)> + '_ {
        self.bindings
            .iter()
            .map(|(name, b)| (*name, b.min_args, b.max_args))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every primitive and helper the shim exposes.
    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register_primitives();
        r.register_helpers();
        r
    }

    fn register_primitives(&mut self) {
        // ── Canvas & style ────────────────────────────────────────────
        self.register("createCanvas", 2, 2, |sh, a| {
            let [w, h] = a.nums()?;
            sh.surface.create_canvas(w, h);
            none()
        });
        self.register("background", 1, 4, |sh, a| {
            sh.surface.background(&Color::from_args(&a, 0)?);
            none()
        });
        self.register("fill", 1, 4, |sh, a| {
            sh.surface.fill(&Color::from_args(&a, 0)?);
            none()
        });
        self.register("stroke", 1, 4, |sh, a| {
            sh.surface.stroke(&Color::from_args(&a, 0)?);
            none()
        });
        self.register("noFill", 0, 0, |sh, _| {
            sh.surface.no_fill();
            none()
        });
        self.register("noStroke", 0, 0, |sh, _| {
            sh.surface.no_stroke();
            none()
        });
        self.register("strokeWeight", 1, 1, |sh, a| {
            sh.surface.stroke_weight(a.num(0)?);
            none()
        });
        self.register("textSize", 0, 1, |sh, a| match a.opt::<f64>(0)? {
            Some(size) => {
                sh.surface.text_size(size);
                none()
            }
            None => Ok(Value::Float(sh.surface.current_text_size())),
        });
        self.register("textAlign", 1, 2, |sh, a| {
            let h: String = a.get(0)?;
            let v: Option<String> = a.opt(1)?;
            sh.surface.text_align(&h, v.as_deref());
            none()
        });
        self.register("rectMode", 1, 1, |sh, a| {
            let mode: String = a.get(0)?;
            sh.surface.rect_mode(&mode);
            none()
        });
        self.register("angleMode", 1, 1, |sh, a| {
            let mode: String = a.get(0)?;
            sh.set_angle_mode(&mode);
            none()
        });
        self.register("coordinateMode", 1, 1, |sh, a| {
            let mode: String = a.get(0)?;
            sh.set_coordinate_mode(&mode);
            none()
        });
        self.register("frameRate", 1, 1, |sh, a| {
            sh.surface.frame_rate(a.num(0)?);
            none()
        });

        // ── Transforms (basis-tracked) ────────────────────────────────
        self.register("push", 0, 0, |sh, _| {
            sh.push();
            none()
        });
        self.register("pop", 0, 0, |sh, _| {
            sh.pop();
            none()
        });
        self.register("translate", 2, 2, |sh, a| {
            let [x, y] = a.nums()?;
            sh.translate(x, y);
            none()
        });
        self.register("rotate", 1, 1, |sh, a| {
            sh.rotate(a.num(0)?);
            none()
        });
        self.register("scale", 1, 2, |sh, a| {
            let x = a.num(0)?;
            let y = a.or(1, x)?;
            sh.scale(x, y);
            none()
        });

        // ── Shapes ────────────────────────────────────────────────────
        self.register("point", 2, 2, |sh, a| {
            let [x, y] = a.nums()?;
            sh.surface.point(x, y);
            none()
        });
        self.register("line", 4, 4, |sh, a| {
            let [x1, y1, x2, y2] = a.nums()?;
            sh.surface.line(x1, y1, x2, y2);
            none()
        });
        self.register("circle", 3, 3, |sh, a| {
            let [x, y, d] = a.nums()?;
            sh.surface.circle(x, y, d);
            none()
        });
        self.register("ellipse", 3, 4, |sh, a| {
            let [x, y, w] = a.nums()?;
            let h = a.or(3, w)?;
            sh.surface.ellipse(x, y, w, h);
            none()
        });
        self.register("rect", 4, 4, |sh, a| {
            let [x, y, w, h] = a.nums()?;
            sh.surface.rect(x, y, w, h);
            none()
        });
        self.register("square", 3, 4, |sh, a| {
            let [x, y, s] = a.nums()?;
            sh.surface.square(x, y, s, a.opt(3)?);
            none()
        });
        self.register("triangle", 6, 6, |sh, a| {
            let [x1, y1, x2, y2, x3, y3] = a.nums()?;
            sh.surface.triangle(x1, y1, x2, y2, x3, y3);
            none()
        });
        self.register("text", 3, 3, |sh, a| {
            let s = display_text(&a.values[0]);
            let x = a.num(1)?;
            let y = a.num(2)?;
            sh.surface.text(&s, x, y);
            none()
        });
    }

    fn register_helpers(&mut self) {
        self.register("responsiveText", 3, 3, |sh, a| {
            let s = display_text(&a.values[0]);
            let x = a.num(1)?;
            let y = a.num(2)?;
            sh.responsive_text(&s, x, y);
            none()
        });
        self.register("drawTickAxes", 0, 9, |sh, a| {
            let d = TickAxes::default();
            let opts = TickAxes {
                scale_factor: a.or(0, d.scale_factor)?,
                spacing: a.or(1, d.spacing)?,
                axis_color: opt_color(&a, 2)?.unwrap_or(d.axis_color),
                grid_color: opt_color(&a, 3)?.unwrap_or(d.grid_color),
                label_color: opt_color(&a, 4)?.unwrap_or(d.label_color),
                label_size: a.or(5, d.label_size)?,
                axis_thickness: a.or(6, d.axis_thickness)?,
                tick_thickness: a.or(7, d.tick_thickness)?,
                grid_thickness: a.or(8, d.grid_thickness)?,
            };
            sh.draw_tick_axes(&opts)?;
            none()
        });
        self.register("arrow", 4, 4, |sh, a| {
            let [tx, ty, hx, hy] = a.nums()?;
            sh.arrow(tx, ty, hx, hy);
            none()
        });
        self.register("die", 3, 5, |sh, a| {
            let roll: i64 = a.get(0).map_err(|_| {
                CallError::Value("roll must be an integer from 1 to 6".into())
            })?;
            let x = a.num(1)?;
            let y = a.num(2)?;
            let primary = opt_color(&a, 3)?.unwrap_or_else(|| Color::css("white"));
            let secondary = opt_color(&a, 4)?.unwrap_or_else(|| Color::css("black"));
            sh.die(roll, x, y, &primary, &secondary)?;
            none()
        });
        self.register("drawBarGraph", 1, 5, |sh, a| {
            let data: Vec<f64> = a.get(0)?;
            let labels: Option<Vec<String>> = match a.raw(1) {
                Some(Value::List(items)) => Some(items.iter().map(display_text).collect()),
                Some(other) => {
                    return Err(CallError::Type {
                        name: a.name.to_string(),
                        index: 1,
                        expected: "list",
                        got: other.type_name(),
                    })
                }
                None => None,
            };
            let width = nonzero(a.opt(2)?);
            let height = nonzero(a.opt(3)?);
            let bar_scale = nonzero(a.opt(4)?);
            sh.draw_bar_graph(&data, labels.as_deref(), width, height, bar_scale);
            none()
        });
        self.register("mouse", 0, 0, |sh, _| {
            let m = sh.mouse()?;
            Ok(Value::point(m.x, m.y))
        });
        self.register("linmap", 5, 6, |_, a| {
            let [v, s1, e1, s2, e2] = a.nums()?;
            let within: bool = a.or(5, false)?;
            Ok(Value::Float(linmap(v, s1, e1, s2, e2, within)))
        });
        self.register("unixTime", 0, 0, |_, _| Ok(Value::from(unix_time())));
        self.register("createMovableCircle", 3, 4, |sh, a| {
            let [x, y, d] = a.nums()?;
            let color = opt_color(&a, 3)?.unwrap_or_else(|| Color::css("red"));
            Ok(sh.create_movable_circle(x, y, d, color).into())
        });
        self.register("createSlider", 2, 4, |sh, a| {
            let min = a.num(0)?;
            let max = a.num(1)?;
            let value = a.or(2, min)?;
            let step = a.or(3, 0.0)?;
            Slider::check_bounds(min, max, value, step)?;
            Ok(sh.create_slider(min, max, value, step).into())
        });
        // Method-call forms for hosts that cannot carry object methods.
        self.register("drawMovableCircle", 1, 1, |sh, a| {
            let id: ObjectId = a.get(0)?;
            sh.draw_movable_circle(id)?;
            none()
        });
        self.register("sliderValue", 1, 1, |sh, a| {
            let id: ObjectId = a.get(0)?;
            sh.call_method(id, "value", &[])
        });
    }
}

/// A color argument at `index`, if present.
fn opt_color(a: &Args<'_>, index: usize) -> Result<Option<Color>, CallError> {
    match a.raw(index) {
        None => Ok(None),
        Some(v) => {
            let one = std::slice::from_ref(v);
            Color::from_args(&Args::new(a.name, one), 0)
                .map(Some)
                .map_err(|_| CallError::Type {
                    name: a.name.to_string(),
                    index,
                    expected: "color",
                    got: v.type_name(),
                })
        }
    }
}

/// Zero means "use the default", matching the engine's falsy checks.
fn nonzero(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0)
}
