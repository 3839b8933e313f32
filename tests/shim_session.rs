use strive_build::shim::{Command, RecordingSurface, Shim, Value};

fn f(v: f64) -> Value {
    Value::Float(v)
}

#[test]
fn right_hand_frame_maps_mouse_through_transforms() {
    let mut sh = Shim::new(RecordingSurface::new());
    sh.call("createCanvas", &[Value::Int(200), Value::Int(100)]).unwrap();
    sh.call("coordinateMode", &["right-hand".into()]).unwrap();

    sh.begin_frame();
    sh.call("translate", &[f(50.0), f(0.0)]).unwrap();
    sh.surface_mut().set_mouse(60.0, 30.0, false);

    let m = sh.call("mouse", &[]).unwrap();
    assert_eq!(m.get("x"), Some(&f(10.0)));
    assert_eq!(m.get("y"), Some(&f(70.0)));

    sh.end_frame();
    let m = sh.call("mouse", &[]).unwrap();
    assert_eq!(m.get("x"), Some(&f(60.0)));

    let commands = sh.into_surface().drain();
    assert_eq!(
        &commands[..4],
        &[
            Command::CreateCanvas(200.0, 100.0),
            Command::Scale(1.0, -1.0),
            Command::Translate(0.0, -100.0),
            Command::Translate(50.0, 0.0),
        ]
    );
}

#[test]
fn globals_follow_the_surface() {
    let mut sh = Shim::new(RecordingSurface::new());
    sh.call("createCanvas", &[Value::Int(320), Value::Int(240)]).unwrap();
    sh.surface_mut().set_mouse(5.0, 6.0, true);
    sh.surface_mut().advance_frame();

    let g = sh.globals();
    assert_eq!(g["width"], f(320.0));
    assert_eq!(g["height"], f(240.0));
    assert_eq!(g["mouseIsPressed"], Value::Bool(true));
    assert_eq!(g["mouseX"], f(5.0));
    assert_eq!(g.len(), 6);
}

#[test]
fn every_registered_name_is_emitted() {
    let sh = Shim::new(RecordingSurface::new());
    let js = strive_build::shim::emit::render_shim();
    for name in sh.registry().names() {
        assert!(js.contains(&format!("\"{name}\"")), "{name} missing from shim");
    }
}

#[test]
fn unknown_name_reads_like_a_name_error() {
    let mut sh = Shim::new(RecordingSurface::new());
    let err = sh.call("blendMode", &[]).unwrap_err();
    assert_eq!(err.to_string(), "name 'blendMode' is not defined");
}
