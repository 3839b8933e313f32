//! The integration shim: exposes engine primitives to sketches.
//!
//! A [`Shim`] owns the single active drawing surface. Sketch calls arrive by
//! name through [`Shim::call`], are looked up in the forwarding table
//! ([`registry::Registry`]), converted, and applied to the surface. The shim
//! also tracks the state its helpers need on top of the engine: coordinate
//! mode, angle mode, and the basis matrix of user transforms.
//!
//! - `value`: embedded-language values and argument conversion
//! - `surface`: the engine contract and a recording implementation
//! - `registry`: the forwarding table
//! - `helpers`: axes, arrows, dice, bar graphs, movable circles, sliders
//! - `emit`: JavaScript rendering of the shim for the bundle

use std::collections::BTreeMap;

use glam::{DMat3, DVec2};
use thiserror::Error;

pub mod emit;
pub mod helpers;
pub mod registry;
pub mod surface;
pub mod value;

pub use helpers::{MovableCircle, Slider, TickAxes};
pub use registry::Registry;
pub use surface::{Color, Command, RecordingSurface, Surface};
pub use value::{Args, FromValue, ObjectId, Value};

/// Errors raised back into the sketch by a forwarded call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("name '{0}' is not defined")]
    Unknown(String),

    #[error("{name}() takes {} ({got} given)", arity_text(.min, .max))]
    Arity {
        name: String,
        min: usize,
        max: usize,
        got: usize,
    },

    #[error("{name}() argument {} must be {expected}, not {got}", .index + 1)]
    Type {
        name: String,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0}")]
    Value(String),

    #[error("object {0} does not exist")]
    NoSuchObject(usize),

    #[error("'{class}' object has no attribute '{attr}'")]
    NoAttribute { class: &'static str, attr: String },
}

fn arity_text(min: &usize, max: &usize) -> String {
    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    if min == max {
        format!("{min} {}", plural(*min))
    } else {
        format!("{min} to {max} {}", plural(*max))
    }
}

pub const RIGHT_HAND: &str = "right-hand";
pub const LEFT_HAND: &str = "left-hand";

/// Names readable as globals from a sketch.
pub const GLOBALS: &[&str] = &[
    "mouseX",
    "mouseY",
    "mouseIsPressed",
    "frameCount",
    "width",
    "height",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateMode {
    /// Origin bottom-left, y up. The default.
    RightHand,
    /// The engine's native layout: origin top-left, y down.
    LeftHand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleMode {
    Degrees,
    Radians,
}

/// Objects created through the shim and handed to sketches as handles.
#[derive(Debug, Clone)]
pub enum Object {
    Circle(MovableCircle),
    Slider(Slider),
}

impl Object {
    fn class(&self) -> &'static str {
        match self {
            Object::Circle(_) => "MovableCircle",
            Object::Slider(_) => "Slider",
        }
    }
}

/// Owner of the active drawing surface and the state layered on top of it.
pub struct Shim<S: Surface> {
    surface: S,
    registry: Registry<S>,
    coordinate_mode: CoordinateMode,
    angle_mode: AngleMode,
    basis: DMat3,
    basis_stack: Vec<DMat3>,
    objects: Vec<Object>,
    any_moving: bool,
}

impl<S: Surface> Shim<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            registry: Registry::standard(),
            coordinate_mode: CoordinateMode::RightHand,
            angle_mode: AngleMode::Degrees,
            basis: DMat3::IDENTITY,
            basis_stack: Vec::new(),
            objects: Vec::new(),
            any_moving: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Call an exposed name with positional arguments.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        let binding = *self
            .registry
            .get(name)
            .ok_or_else(|| CallError::Unknown(name.to_string()))?;
        binding.invoke(self, args)
    }

    /// Current value of every readable global.
    pub fn globals(&self) -> BTreeMap<&'static str, Value> {
        GLOBALS
            .iter()
            .map(|&name| (name, self.global(name).unwrap_or(Value::None)))
            .collect()
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        let s = &self.surface;
        let v = match name {
            "mouseX" => Value::Float(s.mouse_x()),
            "mouseY" => Value::Float(s.mouse_y()),
            "mouseIsPressed" => Value::Bool(s.mouse_is_pressed()),
            "frameCount" => Value::from(s.frame_count()),
            "width" => Value::Float(s.width()),
            "height" => Value::Float(s.height()),
            _ => return None,
        };
        Some(v)
    }

    // ── Frame hooks ───────────────────────────────────────────────────

    /// Runs before each `draw`: flips the canvas in right-hand mode.
    pub fn begin_frame(&mut self) {
        if self.coordinate_mode == CoordinateMode::RightHand {
            let h = self.surface.height();
            self.surface.scale(1.0, -1.0);
            self.surface.translate(0.0, -h);
        }
    }

    /// Runs after each `draw`: the engine resets its transform, so does the basis.
    pub fn end_frame(&mut self) {
        self.basis = DMat3::IDENTITY;
        self.basis_stack.clear();
    }

    /// Host mouse-up: release whichever circle was being dragged.
    pub fn mouse_released(&mut self) {
        self.any_moving = false;
        for obj in &mut self.objects {
            if let Object::Circle(c) = obj {
                c.is_movable = false;
            }
        }
    }

    // ── Modes ─────────────────────────────────────────────────────────

    pub fn coordinate_mode(&self) -> CoordinateMode {
        self.coordinate_mode
    }

    /// Unrecognised modes are ignored.
    pub fn set_coordinate_mode(&mut self, mode: &str) {
        match mode {
            RIGHT_HAND => self.coordinate_mode = CoordinateMode::RightHand,
            LEFT_HAND => self.coordinate_mode = CoordinateMode::LeftHand,
            _ => {}
        }
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    pub fn set_angle_mode(&mut self, mode: &str) {
        let parsed = match mode.to_ascii_lowercase().as_str() {
            "degrees" => AngleMode::Degrees,
            "radians" => AngleMode::Radians,
            _ => return,
        };
        self.angle_mode = parsed;
        self.surface.angle_mode(mode);
    }

    /// Convert an angle in the current mode to radians.
    pub fn to_radians(&self, angle: f64) -> f64 {
        match self.angle_mode {
            AngleMode::Degrees => angle.to_radians(),
            AngleMode::Radians => angle,
        }
    }

    /// Convert radians to the current angle mode.
    pub fn angle_from_radians(&self, rad: f64) -> f64 {
        match self.angle_mode {
            AngleMode::Degrees => rad.to_degrees(),
            AngleMode::Radians => rad,
        }
    }

    // ── Basis-tracked transforms ──────────────────────────────────────

    pub fn basis(&self) -> DMat3 {
        self.basis
    }

    pub fn push(&mut self) {
        self.basis_stack.push(self.basis);
        self.surface.push();
    }

    pub fn pop(&mut self) {
        if let Some(b) = self.basis_stack.pop() {
            self.basis = b;
        }
        self.surface.pop();
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.basis *= DMat3::from_translation(DVec2::new(x, y));
        self.surface.translate(x, y);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.basis *= DMat3::from_angle(self.to_radians(angle));
        self.surface.rotate(angle);
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.basis *= DMat3::from_scale(DVec2::new(x, y));
        self.surface.scale(x, y);
    }

    /// Whether local +y points down the screen, i.e. text drawn as-is reads upright.
    pub fn text_upright(&self) -> bool {
        let y = self.basis.y_axis.y;
        match self.coordinate_mode {
            CoordinateMode::LeftHand => y >= 0.0,
            CoordinateMode::RightHand => y <= 0.0,
        }
    }

    // ── Objects ───────────────────────────────────────────────────────

    pub(crate) fn insert(&mut self, obj: Object) -> ObjectId {
        self.objects.push(obj);
        ObjectId(self.objects.len() - 1)
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object, CallError> {
        self.objects.get(id.0).ok_or(CallError::NoSuchObject(id.0))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, CallError> {
        self.objects.get_mut(id.0).ok_or(CallError::NoSuchObject(id.0))
    }

    /// Read an attribute of a shim object.
    pub fn get_attr(&self, id: ObjectId, attr: &str) -> Result<Value, CallError> {
        let obj = self.object(id)?;
        let v = match (obj, attr) {
            (Object::Circle(c), "x") => Value::Float(c.x),
            (Object::Circle(c), "y") => Value::Float(c.y),
            (Object::Circle(c), "d") => Value::Float(c.d),
            (Object::Circle(c), "isMovable") => Value::Bool(c.is_movable),
            (Object::Slider(s), "value") => Value::Float(s.value),
            _ => {
                return Err(CallError::NoAttribute {
                    class: obj.class(),
                    attr: attr.to_string(),
                })
            }
        };
        Ok(v)
    }

    /// Invoke a method on a shim object.
    pub fn call_method(
        &mut self,
        id: ObjectId,
        method: &str,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let class = self.object(id)?.class();
        let args = Args::new(method, args);
        match (class, method) {
            ("MovableCircle", "draw") => {
                self.draw_movable_circle(id)?;
                Ok(Value::None)
            }
            ("MovableCircle", "isMouseHovering") => {
                let circle = self.circle(id)?.clone();
                Ok(Value::Bool(self.is_hovering(&circle)?))
            }
            ("MovableCircle", "lock") => {
                let axis: String = args.get(0)?;
                let value = args.num(1)?;
                self.circle_mut(id)?.lock(&axis, value)?;
                Ok(Value::None)
            }
            ("MovableCircle", "unlock") => {
                let axis: String = args.get(0)?;
                self.circle_mut(id)?.unlock(&axis)?;
                Ok(Value::None)
            }
            ("Slider", "value") => match self.object(id)? {
                Object::Slider(s) => Ok(Value::Float(s.value)),
                Object::Circle(_) => Err(CallError::NoSuchObject(id.0)),
            },
            _ => Err(CallError::NoAttribute {
                class,
                attr: method.to_string(),
            }),
        }
    }

    pub(crate) fn circle(&self, id: ObjectId) -> Result<&MovableCircle, CallError> {
        match self.object(id)? {
            Object::Circle(c) => Ok(c),
            other => Err(CallError::NoAttribute {
                class: other.class(),
                attr: "draw".into(),
            }),
        }
    }

    pub(crate) fn circle_mut(&mut self, id: ObjectId) -> Result<&mut MovableCircle, CallError> {
        match self.object_mut(id)? {
            Object::Circle(c) => Ok(c),
            other => Err(CallError::NoAttribute {
                class: other.class(),
                attr: "draw".into(),
            }),
        }
    }

    /// Host widget input: move a slider, clamped and snapped to its step.
    pub fn set_slider(&mut self, id: ObjectId, value: f64) -> Result<f64, CallError> {
        match self.object_mut(id)? {
            Object::Slider(s) => Ok(s.set(value)),
            other => Err(CallError::NoAttribute {
                class: other.class(),
                attr: "value".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shim() -> Shim<RecordingSurface> {
        let mut s = RecordingSurface::new();
        s.create_canvas(400.0, 400.0);
        s.drain();
        Shim::new(s)
    }

    #[test]
    fn unknown_name_is_not_defined() {
        let mut sh = shim();
        let err = sh.call("nope", &[]).unwrap_err();
        assert_eq!(err.to_string(), "name 'nope' is not defined");
    }

    #[test]
    fn arity_error_message() {
        let err = CallError::Arity {
            name: "line".into(),
            min: 4,
            max: 4,
            got: 2,
        };
        assert_eq!(err.to_string(), "line() takes 4 arguments (2 given)");
    }

    #[test]
    fn right_hand_frame_flips_canvas() {
        let mut sh = shim();
        sh.begin_frame();
        assert_eq!(
            sh.surface().commands,
            vec![Command::Scale(1.0, -1.0), Command::Translate(0.0, -400.0)]
        );

        sh.set_coordinate_mode(LEFT_HAND);
        sh.surface_mut().drain();
        sh.begin_frame();
        assert!(sh.surface().commands.is_empty());
    }

    #[test]
    fn invalid_coordinate_mode_ignored() {
        let mut sh = shim();
        sh.set_coordinate_mode("sideways");
        assert_eq!(sh.coordinate_mode(), CoordinateMode::RightHand);
    }

    #[test]
    fn push_pop_restores_basis_and_end_frame_resets() {
        let mut sh = shim();
        sh.translate(10.0, 20.0);
        sh.push();
        sh.scale(2.0, 2.0);
        sh.pop();
        assert_eq!(sh.basis(), DMat3::from_translation(DVec2::new(10.0, 20.0)));

        sh.end_frame();
        assert_eq!(sh.basis(), DMat3::IDENTITY);
    }

    #[test]
    fn globals_read_surface_state() {
        let mut sh = shim();
        sh.surface_mut().set_mouse(12.0, 34.0, true);
        sh.surface_mut().advance_frame();
        let g = sh.globals();
        assert_eq!(g["mouseX"], Value::Float(12.0));
        assert_eq!(g["mouseIsPressed"], Value::Bool(true));
        assert_eq!(g["frameCount"], Value::Int(1));
        assert_eq!(g["width"], Value::Float(400.0));
        assert_eq!(g.len(), GLOBALS.len());
    }

    #[test]
    fn text_upright_follows_flip() {
        let mut sh = shim();
        assert!(!sh.text_upright());
        sh.scale(1.0, -1.0);
        assert!(sh.text_upright());
        sh.set_coordinate_mode(LEFT_HAND);
        assert!(!sh.text_upright());
    }
}
