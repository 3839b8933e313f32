//! Renders the integration shim as JavaScript for the bundle.
//!
//! The list of forwarded names comes from the registry, so the emitted shim
//! and the typed model cannot drift apart.

use std::collections::BTreeMap;

use super::registry::Registry;
use super::surface::RecordingSurface;
use super::GLOBALS;

/// Engine functions forwarded by name without a typed binding.
pub const PASSTHROUGH: &[&str] = &[
    "assetsLoaded",
    "atan",
    "atan2",
    "cone",
    "constrain",
    "cos",
    "createManager",
    "dist",
    "draw3DAxes",
    "drawVector",
    "image",
    "loadFont",
    "loadImage",
    "loadSound",
    "loop",
    "millis",
    "noLoop",
    "plane",
    "random",
    "rotateX",
    "rotateY",
    "rotateZ",
    "sin",
    "sphere",
    "sqrt",
    "tan",
    "textFont",
];

/// Engine constants and containers copied into the sketch's globals.
pub const CONSTANTS: &[&str] = &[
    "BOTTOM",
    "CENTER",
    "DEGREES",
    "LEFT",
    "LEFT_HAND",
    "PI",
    "RADIANS",
    "RIGHT",
    "RIGHT_HAND",
    "TOP",
    "TWO_PI",
    "assets",
];

/// Where console reference links are redirected.
const REFERENCE_FROM: &str = "http://p5js.org/reference/#/p5/";
const REFERENCE_TO: &str = "https://p5.strivemath.com/reference/";

/// Names with a typed binding, in sorted order.
pub fn exposed_names() -> Vec<&'static str> {
    Registry::<RecordingSurface>::standard().names().collect()
}

/// Every name a sketch can call through the shim.
pub fn callable_names() -> Vec<&'static str> {
    let mut names = exposed_names();
    names.extend_from_slice(PASSTHROUGH);
    names.sort_unstable();
    names.dedup();
    names
}

/// Argument count ranges of the typed bindings, as a JSON object of `[min, max]`.
fn arity_table() -> String {
    let table: BTreeMap<&str, [usize; 2]> = Registry::<RecordingSurface>::standard()
        .arities()
        .map(|(name, min, max)| (name, [min, max]))
        .collect();
    serde_json::to_string(&table).unwrap_or_else(|_| "{}".to_string())
}

fn js_array(names: &[&str]) -> String {
    // Names are plain identifiers; serde_json gives correct quoting regardless.
    serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string())
}

/// The full shim script.
pub fn render_shim() -> String {
    let exposed = js_array(&exposed_names());
    let passthrough = js_array(PASSTHROUGH);
    let mut globals: Vec<&str> = GLOBALS.to_vec();
    globals.extend_from_slice(CONSTANTS);
    let globals = js_array(&globals);
    let arity = arity_table();

    format!(
        r##"// ── Strive integration shim ───────────────────────────────────────
// Generated by strive-build. Do not edit; change the forwarding table instead.

function outf(text) {{
  console.log(text);
}}

function builtinRead(x) {{
  if (
    Sk.builtinFiles === undefined ||
    Sk.builtinFiles["files"][x] === undefined
  )
    throw "File not found: '" + x + "'";
  return Sk.builtinFiles["files"][x];
}}

function uncaught(pythonException) {{
  const lineno = pythonException.traceback[0].lineno;
  const msg = pythonException.args.v[0].v;
  console.error(msg + " on line " + lineno);
  throw new Error("");
}}

const STRIVE_EXPOSED = {exposed};
const STRIVE_PASSTHROUGH = {passthrough};
const STRIVE_GLOBALS = {globals};
const STRIVE_ARITY = {arity};

// Method-call forms of the object helpers.
window.drawMovableCircle = function (circle) {{
  return circle.draw();
}};
window.sliderValue = function (slider) {{
  return slider.value();
}};

function striveArityText(min, max) {{
  const plural = function (n) {{
    return n === 1 ? "argument" : "arguments";
  }};
  if (min === max) return min + " " + plural(min);
  return min + " to " + max + " " + plural(max);
}}

function striveForward(name) {{
  const arity = STRIVE_ARITY[name];
  return new Sk.builtin.func(function () {{
    if (arity && (arguments.length < arity[0] || arguments.length > arity[1])) {{
      throw new Sk.builtin.TypeError(
        name + "() takes " + striveArityText(arity[0], arity[1]) +
          " (" + arguments.length + " given)"
      );
    }}
    const fn = window[name];
    if (typeof fn !== "function") {{
      throw new Sk.builtin.NameError("name '" + name + "' is not defined");
    }}
    const args = Array.prototype.map.call(arguments, function (a) {{
      return Sk.ffi.remapToJs(a);
    }});
    return Sk.ffi.remapToPy(fn.apply(window, args));
  }});
}}

function striveInstall() {{
  STRIVE_EXPOSED.concat(STRIVE_PASSTHROUGH).forEach(function (name) {{
    Sk.builtins[name] = striveForward(name);
  }});
  striveSyncGlobals();
}}

function striveSyncGlobals() {{
  STRIVE_GLOBALS.forEach(function (name) {{
    if (window[name] !== undefined) {{
      Sk.builtins[name] = Sk.ffi.remapToPy(window[name]);
    }}
  }});
}}

p5.prototype.registerMethod("pre", striveSyncGlobals);

function runCode(filename = "sketch.py") {{
  $("#sketch-holder").text("");
  $.get(
    filename,
    function (prog) {{
      Sk.pre = "output";
      Sk.configure({{
        output: outf,
        read: builtinRead,
        uncaughtException: uncaught,
      }});
      Sk.canvas = "sketch-holder";
      striveInstall();
      Sk.misceval
        .asyncToPromise(function () {{
          return Sk.importMainWithBody("<stdin>", false, prog.trim() + "\nrun()", true);
        }})
        .then(
          function () {{
            console.log(" ");
          }},
          function (err) {{
            console.log(err.toString());
          }}
        );
    }},
    "text"
  );
}}

console._log = console.log;
console.log = function () {{
  if (typeof arguments[0] === "string")
    arguments[0] = arguments[0].replace("{REFERENCE_FROM}", "{REFERENCE_TO}");
  console._log(...arguments);
}};

runCode();
"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_exposed_name_appears_once() {
        let js = render_shim();
        let line = js
            .lines()
            .find(|l| l.starts_with("const STRIVE_EXPOSED"))
            .expect("exposed list present");
        for name in exposed_names() {
            let quoted = format!("\"{name}\"");
            assert_eq!(line.matches(&quoted).count(), 1, "{name}");
        }
    }

    #[test]
    fn arity_table_covers_every_typed_binding() {
        let js = render_shim();
        let line = js
            .lines()
            .find(|l| l.starts_with("const STRIVE_ARITY = "))
            .expect("arity table present");
        let json = line
            .trim_start_matches("const STRIVE_ARITY = ")
            .trim_end_matches(';');
        let table: BTreeMap<String, [usize; 2]> = serde_json::from_str(json).unwrap();

        assert_eq!(table.len(), exposed_names().len());
        assert_eq!(table["line"], [4, 4]);
        assert_eq!(table["createSlider"], [2, 4]);
        for name in PASSTHROUGH {
            assert!(!table.contains_key(*name), "{name}");
        }
    }

    #[test]
    fn forwarder_rejects_wrong_argument_counts() {
        let js = render_shim();
        assert!(js.contains("arguments.length < arity[0] || arguments.length > arity[1]"));
        assert!(js.contains("throw new Sk.builtin.TypeError("));
        assert!(js.contains(r#"" (" + arguments.length + " given)""#));
    }

    #[test]
    fn render_is_deterministic() {
        assert_eq!(render_shim(), render_shim());
    }

    #[test]
    fn passthrough_does_not_shadow_typed_bindings() {
        let exposed = exposed_names();
        for name in PASSTHROUGH {
            assert!(!exposed.contains(name), "{name} is both typed and passthrough");
        }
    }

    #[test]
    fn shim_wires_the_interpreter() {
        let js = render_shim();
        assert!(js.contains("Sk.configure("));
        assert!(js.contains("striveInstall();"));
        assert!(js.contains(r#"registerMethod("pre", striveSyncGlobals)"#));
        assert!(js.contains("https://p5.strivemath.com/reference/"));
        assert!(js.trim_end().ends_with("runCode();"));
    }

    #[test]
    fn callable_names_cover_helpers_and_passthrough() {
        let names = callable_names();
        for n in ["drawTickAxes", "createMovableCircle", "mouse", "loadImage", "random"] {
            assert!(names.contains(&n), "{n}");
        }
    }
}
