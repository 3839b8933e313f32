//! The drawing surface: the engine instance every forwarded call lands on.

use super::value::{Args, Value};
use super::CallError;

/// A color argument in any of the forms the engine accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// CSS name or color string, e.g. `"hotpink"` or `"rgba(255,255,255,0.6)"`.
    Css(String),
    Gray(f64),
    GrayAlpha(f64, f64),
    Rgb(f64, f64, f64),
    Rgba(f64, f64, f64, f64),
}

impl Color {
    pub fn css(s: &str) -> Self {
        Color::Css(s.to_string())
    }

    /// Read a color from the arguments starting at `start`: one string, or
    /// one to four numbers.
    pub fn from_args(args: &Args<'_>, start: usize) -> Result<Self, CallError> {
        let rest = args.rest(start);
        match rest {
            [Value::Str(s)] => Ok(Color::Css(s.clone())),
            [Value::List(items)] => {
                let nested = Args::new(args.name, items);
                Color::from_args(&nested, 0)
            }
            _ => {
                let nums = rest
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        v.as_f64().ok_or_else(|| CallError::Type {
                            name: args.name.to_string(),
                            index: start + i,
                            expected: "color",
                            got: v.type_name(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                match nums.as_slice() {
                    [g] => Ok(Color::Gray(*g)),
                    [g, a] => Ok(Color::GrayAlpha(*g, *a)),
                    [r, g, b] => Ok(Color::Rgb(*r, *g, *b)),
                    [r, g, b, a] => Ok(Color::Rgba(*r, *g, *b, *a)),
                    _ => Err(CallError::Arity {
                        name: args.name.to_string(),
                        min: start + 1,
                        max: start + 4,
                        got: args.len(),
                    }),
                }
            }
        }
    }
}

/// Engine-side operations reachable from sketches.
///
/// Angles are in the engine's current angle mode. Every method mutates the
/// single active canvas in place.
pub trait Surface {
    fn create_canvas(&mut self, width: f64, height: f64);
    fn background(&mut self, color: &Color);

    fn fill(&mut self, color: &Color);
    fn no_fill(&mut self);
    fn stroke(&mut self, color: &Color);
    fn no_stroke(&mut self);
    fn stroke_weight(&mut self, weight: f64);
    fn text_size(&mut self, size: f64);
    fn text_align(&mut self, horizontal: &str, vertical: Option<&str>);
    fn rect_mode(&mut self, mode: &str);
    fn angle_mode(&mut self, mode: &str);
    fn frame_rate(&mut self, fps: f64);

    fn push(&mut self);
    fn pop(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, x: f64, y: f64);

    fn point(&mut self, x: f64, y: f64);
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    fn circle(&mut self, x: f64, y: f64, d: f64);
    fn ellipse(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn square(&mut self, x: f64, y: f64, s: f64, corner: Option<f64>);
    fn triangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);
    fn text(&mut self, s: &str, x: f64, y: f64);

    fn create_slider(&mut self, min: f64, max: f64, value: f64, step: f64);

    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn current_text_size(&self) -> f64;
    fn mouse_x(&self) -> f64;
    fn mouse_y(&self) -> f64;
    fn mouse_is_pressed(&self) -> bool;
    fn frame_count(&self) -> u64;
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateCanvas(f64, f64),
    Background(Color),
    Fill(Color),
    NoFill,
    Stroke(Color),
    NoStroke,
    StrokeWeight(f64),
    TextSize(f64),
    TextAlign(String, Option<String>),
    RectMode(String),
    AngleMode(String),
    FrameRate(f64),
    Push,
    Pop,
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    Point(f64, f64),
    Line(f64, f64, f64, f64),
    Circle(f64, f64, f64),
    Ellipse(f64, f64, f64, f64),
    Rect(f64, f64, f64, f64),
    Square(f64, f64, f64, Option<f64>),
    Triangle(f64, f64, f64, f64, f64, f64),
    Text(String, f64, f64),
    CreateSlider(f64, f64, f64, f64),
}

/// A surface that records every call instead of drawing.
///
/// Input state (mouse, frame count) is set by the caller.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<Command>,
    width: f64,
    height: f64,
    text_size: f64,
    text_size_stack: Vec<f64>,
    mouse: (f64, f64),
    pressed: bool,
    frame: u64,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            width: 100.0,
            height: 100.0,
            text_size: 12.0,
            text_size_stack: Vec::new(),
            mouse: (0.0, 0.0),
            pressed: false,
            frame: 0,
        }
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mouse(&mut self, x: f64, y: f64, pressed: bool) {
        self.mouse = (x, y);
        self.pressed = pressed;
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Take and clear the recorded commands.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn record(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }
}

impl Surface for RecordingSurface {
    fn create_canvas(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.record(Command::CreateCanvas(width, height));
    }

    fn background(&mut self, color: &Color) {
        self.record(Command::Background(color.clone()));
    }

    fn fill(&mut self, color: &Color) {
        self.record(Command::Fill(color.clone()));
    }

    fn no_fill(&mut self) {
        self.record(Command::NoFill);
    }

    fn stroke(&mut self, color: &Color) {
        self.record(Command::Stroke(color.clone()));
    }

    fn no_stroke(&mut self) {
        self.record(Command::NoStroke);
    }

    fn stroke_weight(&mut self, weight: f64) {
        self.record(Command::StrokeWeight(weight));
    }

    fn text_size(&mut self, size: f64) {
        self.text_size = size;
        self.record(Command::TextSize(size));
    }

    fn text_align(&mut self, horizontal: &str, vertical: Option<&str>) {
        self.record(Command::TextAlign(
            horizontal.to_string(),
            vertical.map(str::to_string),
        ));
    }

    fn rect_mode(&mut self, mode: &str) {
        self.record(Command::RectMode(mode.to_string()));
    }

    fn angle_mode(&mut self, mode: &str) {
        self.record(Command::AngleMode(mode.to_string()));
    }

    fn frame_rate(&mut self, fps: f64) {
        self.record(Command::FrameRate(fps));
    }

    fn push(&mut self) {
        self.text_size_stack.push(self.text_size);
        self.record(Command::Push);
    }

    fn pop(&mut self) {
        if let Some(size) = self.text_size_stack.pop() {
            self.text_size = size;
        }
        self.record(Command::Pop);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.record(Command::Translate(x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.record(Command::Rotate(angle));
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.record(Command::Scale(x, y));
    }

    fn point(&mut self, x: f64, y: f64) {
        self.record(Command::Point(x, y));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.record(Command::Line(x1, y1, x2, y2));
    }

    fn circle(&mut self, x: f64, y: f64, d: f64) {
        self.record(Command::Circle(x, y, d));
    }

    fn ellipse(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.record(Command::Ellipse(x, y, w, h));
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.record(Command::Rect(x, y, w, h));
    }

    fn square(&mut self, x: f64, y: f64, s: f64, corner: Option<f64>) {
        self.record(Command::Square(x, y, s, corner));
    }

    fn triangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.record(Command::Triangle(x1, y1, x2, y2, x3, y3));
    }

    fn text(&mut self, s: &str, x: f64, y: f64) {
        self.record(Command::Text(s.to_string(), x, y));
    }

    fn create_slider(&mut self, min: f64, max: f64, value: f64, step: f64) {
        self.record(Command::CreateSlider(min, max, value, step));
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn current_text_size(&self) -> f64 {
        self.text_size
    }

    fn mouse_x(&self) -> f64 {
        self.mouse.0
    }

    fn mouse_y(&self) -> f64 {
        self.mouse.1
    }

    fn mouse_is_pressed(&self) -> bool {
        self.pressed
    }

    fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_forms() {
        let s = [Value::Str("hotpink".into())];
        assert_eq!(
            Color::from_args(&Args::new("fill", &s), 0).unwrap(),
            Color::css("hotpink")
        );

        let rgb = [Value::Int(255), Value::Int(0), Value::Float(10.5)];
        assert_eq!(
            Color::from_args(&Args::new("fill", &rgb), 0).unwrap(),
            Color::Rgb(255.0, 0.0, 10.5)
        );

        let five = vec![Value::Int(1); 5];
        assert!(matches!(
            Color::from_args(&Args::new("fill", &five), 0),
            Err(CallError::Arity { .. })
        ));
    }

    #[test]
    fn push_pop_restores_text_size() {
        let mut s = RecordingSurface::new();
        s.text_size(20.0);
        s.push();
        s.text_size(8.0);
        s.pop();
        assert_eq!(s.current_text_size(), 20.0);
    }
}
