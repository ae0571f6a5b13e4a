use std::rc::Rc;
use nalgebra::Vector3;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement};
use crate::error::{AppError, AppResult};
use crate::solar::state::{
    Axis, ControlEvent, FocusSelection, SimulationState, CAMERA_AXIS_LIMIT, REVOLUTION_SPEED_MAX,
    ROTATION_SPEED_MAX,
};

/// Receives every event a widget produces.
pub type EventSink = Rc<dyn Fn(ControlEvent)>;

/// Sliders, toggles and the focus dropdown. Widgets only emit events; `sync` writes the
/// current state back so keyboard shortcuts and resets stay reflected.
pub struct ControlPanel {
    rotation: HtmlInputElement,
    revolution: HtmlInputElement,
    camera: [HtmlInputElement; 3],
    labels: HtmlInputElement,
    orbits: HtmlInputElement,
    focus: HtmlSelectElement,
}

impl ControlPanel {
    pub fn new(
        document: &Document,
        parent: &Element,
        sink: EventSink,
        state: &SimulationState,
        camera: &Vector3<f32>,
    ) -> AppResult<Self> {
        let root = create::<HtmlElement>(document, "div")?;
        root.set_class_name("control-panel");
        let style = root.style();
        style.set_property("position", "fixed")?;
        style.set_property("top", "8px")?;
        style.set_property("right", "8px")?;
        style.set_property("padding", "8px")?;
        style.set_property("background", "rgba(0, 0, 0, 0.6)")?;
        style.set_property("color", "#ddd")?;
        style.set_property("font", "12px sans-serif")?;
        parent.append_child(&root)?;

        let speed = section(document, &root, "Speed")?;
        let rotation = slider(document, &speed, "Rotation", 0.0, ROTATION_SPEED_MAX, 0.001, state.earth_rot, {
            let sink = sink.clone();
            move |v| sink(ControlEvent::SetRotationSpeed(v))
        })?;
        let revolution = slider(document, &speed, "Revolution", 0.0, REVOLUTION_SPEED_MAX, 0.0001, state.earth_rev, {
            let sink = sink.clone();
            move |v| sink(ControlEvent::SetRevolutionSpeed(v))
        })?;
        button(document, &speed, "Reset speeds", sink.clone(), ControlEvent::ResetSpeeds)?;

        let view = section(document, &root, "Camera")?;
        let mut axes = Vec::with_capacity(3);
        for (axis, name, value) in [(Axis::X, "X", camera.x), (Axis::Y, "Y", camera.y), (Axis::Z, "Z", camera.z)] {
            let sink = sink.clone();
            axes.push(slider(document, &view, name, -CAMERA_AXIS_LIMIT, CAMERA_AXIS_LIMIT, 1.0, value, move |v| {
                sink(ControlEvent::SetCameraAxis(axis, v))
            })?);
        }
        let camera: [HtmlInputElement; 3] = axes
            .try_into()
            .map_err(|_| AppError::Js("camera sliders".into()))?;
        button(document, &view, "Reset camera", sink.clone(), ControlEvent::ResetCamera)?;

        let display = section(document, &root, "Display")?;
        let labels = checkbox(document, &display, "Labels", state.show_labels, {
            let sink = sink.clone();
            move |on| sink(ControlEvent::ShowLabels(on))
        })?;
        let orbits = checkbox(document, &display, "Orbits", state.show_orbits, {
            let sink = sink.clone();
            move |on| sink(ControlEvent::ShowOrbits(on))
        })?;
        let focus = focus_select(document, &display, state.focus, sink)?;

        Ok(ControlPanel { rotation, revolution, camera, labels, orbits, focus })
    }

    pub fn sync(&self, state: &SimulationState, camera: &Vector3<f32>) {
        self.rotation.set_value_as_number(state.earth_rot as f64);
        self.revolution.set_value_as_number(state.earth_rev as f64);
        for (input, value) in self.camera.iter().zip([camera.x, camera.y, camera.z]) {
            input.set_value_as_number(value.clamp(-CAMERA_AXIS_LIMIT, CAMERA_AXIS_LIMIT) as f64);
        }
        self.labels.set_checked(state.show_labels);
        self.orbits.set_checked(state.show_orbits);
        self.focus.set_value(state.focus.as_str());
    }
}

fn create<T: JsCast>(document: &Document, tag: &str) -> AppResult<T> {
    document
        .create_element(tag)?
        .dyn_into::<T>()
        .map_err(|_| AppError::Js(format!("<{tag}> has an unexpected type")))
}

fn section(document: &Document, parent: &HtmlElement, title: &str) -> AppResult<HtmlElement> {
    let fieldset = create::<HtmlElement>(document, "fieldset")?;
    let legend = create::<HtmlElement>(document, "legend")?;
    legend.set_text_content(Some(title));
    fieldset.append_child(&legend)?;
    parent.append_child(&fieldset)?;
    Ok(fieldset)
}

fn row(document: &Document, parent: &HtmlElement, text: &str) -> AppResult<HtmlElement> {
    let label = create::<HtmlElement>(document, "label")?;
    label.style().set_property("display", "block")?;
    label.set_text_content(Some(text));
    parent.append_child(&label)?;
    Ok(label)
}

fn listen(target: &web_sys::EventTarget, event: &str, handler: impl FnMut(Event) + 'static) -> AppResult<()> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn slider(
    document: &Document,
    parent: &HtmlElement,
    text: &str,
    min: f32,
    max: f32,
    step: f32,
    value: f32,
    on_input: impl Fn(f32) + 'static,
) -> AppResult<HtmlInputElement> {
    let label = row(document, parent, text)?;
    let input = create::<HtmlInputElement>(document, "input")?;
    input.set_type("range");
    input.set_min(&min.to_string());
    input.set_max(&max.to_string());
    input.set_step(&step.to_string());
    input.set_value_as_number(value as f64);
    label.append_child(&input)?;

    let source = input.clone();
    listen(&input, "input", move |_| {
        let v = source.value_as_number();
        if v.is_finite() {
            on_input(v as f32);
        }
    })?;
    Ok(input)
}

fn checkbox(
    document: &Document,
    parent: &HtmlElement,
    text: &str,
    checked: bool,
    on_change: impl Fn(bool) + 'static,
) -> AppResult<HtmlInputElement> {
    let label = row(document, parent, text)?;
    let input = create::<HtmlInputElement>(document, "input")?;
    input.set_type("checkbox");
    input.set_checked(checked);
    label.append_child(&input)?;

    let source = input.clone();
    listen(&input, "change", move |_| on_change(source.checked()))?;
    Ok(input)
}

fn button(document: &Document, parent: &HtmlElement, text: &str, sink: EventSink, event: ControlEvent) -> AppResult<()> {
    let button = create::<HtmlElement>(document, "button")?;
    button.set_text_content(Some(text));
    parent.append_child(&button)?;
    listen(&button, "click", move |_| sink(event))
}

fn focus_select(
    document: &Document,
    parent: &HtmlElement,
    current: FocusSelection,
    sink: EventSink,
) -> AppResult<HtmlSelectElement> {
    let label = row(document, parent, "Focus")?;
    let select = create::<HtmlSelectElement>(document, "select")?;
    for option in FocusSelection::OPTIONS {
        let text = match option {
            FocusSelection::Overview => "Default",
            FocusSelection::Planet(p) => p.display_name(),
        };
        let element = HtmlOptionElement::new_with_text_and_value(text, option.as_str())?;
        select.append_child(&element)?;
    }
    select.set_value(current.as_str());
    label.append_child(&select)?;

    let source = select.clone();
    listen(&select, "change", move |_| match source.value().parse::<FocusSelection>() {
        Ok(focus) => sink(ControlEvent::Focus(focus)),
        Err(err) => log::warn!("ignoring focus option: {err}"),
    })?;
    Ok(select)
}
