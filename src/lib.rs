pub mod config;
pub mod engine;
pub mod error;
pub mod solar;
pub mod ui;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlCanvasElement, KeyboardEvent, MouseEvent, Request, RequestInit, RequestMode, Response, WebGlRenderingContext, WheelEvent, Window};
use std::cell::RefCell;
use std::rc::Rc;
use crate::config::SolarConfig;
use crate::engine::labels::LabelLayer;
use crate::engine::renderer::Renderer;
use crate::error::{AppError, AppResult};
use crate::solar::state::{key_event, ControlEvent, FocusSelection};
use crate::solar::system::SolarSystem;
use crate::ui::panel::{ControlPanel, EventSink};

const CONFIG_URL: &str = "/assets/solar.json";

struct App {
    system: SolarSystem,
    renderer: Renderer,
    labels: LabelLayer,
    panel: ControlPanel,
    canvas: HtmlCanvasElement,
}

impl App {
    fn frame(&mut self, device_pixel_ratio: f64) {
        let camera_moved = self.system.tick();

        let css_width = self.canvas.client_width().max(1);
        let css_height = self.canvas.client_height().max(1);
        let width = (css_width as f64 * device_pixel_ratio) as u32;
        let height = (css_height as f64 * device_pixel_ratio) as u32;
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }

        if camera_moved {
            self.panel.sync(self.system.state(), &self.system.camera.position);
        }

        self.renderer.draw_scene(&self.system.scene, &self.system.camera, width as i32, height as i32);
        if let Err(err) = self.labels.render(&self.system.scene, &self.system.camera, css_width as f32, css_height as f32) {
            log::error!("label layer: {err}");
        }
    }

    fn dispatch(&mut self, event: ControlEvent) {
        self.system.dispatch(event);
        self.panel.sync(self.system.state(), &self.system.camera.position);
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

fn with_app(f: impl FnOnce(&mut App)) {
    APP.with(|app| {
        if let Some(app) = app.borrow_mut().as_mut() {
            f(app);
        }
    });
}

fn dispatch(event: ControlEvent) {
    with_app(|app| app.dispatch(event));
}

#[wasm_bindgen]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) { log::Level::Debug } else { log::Level::Info };
    // A second call only finds the logger already installed.
    let _ = console_log::init_with_level(level);

    run().await.map_err(|err| {
        log::error!("startup failed: {err}");
        JsValue::from(err)
    })
}

async fn run() -> AppResult<()> {
    let window = web_sys::window().ok_or(AppError::MissingElement("window"))?;
    let document = window.document().ok_or(AppError::MissingElement("document"))?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or(AppError::MissingElement("#canvas"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| AppError::MissingElement("#canvas"))?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or(AppError::MissingElement("webgl context"))?
        .dyn_into::<WebGlRenderingContext>()
        .map_err(|_| AppError::MissingElement("webgl context"))?;

    // The drawing buffer follows the CSS size, so the CSS size must not follow the buffer.
    let style = canvas.style();
    style.set_property("display", "block")?;
    style.set_property("width", "100vw")?;
    style.set_property("height", "100vh")?;

    let mut renderer = Renderer::new(gl)?;
    let config = load_config(&window).await;
    let system = SolarSystem::new(config)?;
    renderer.load_textures(&system.scene.texture_paths())?;

    let overlay: Element = canvas
        .parent_element()
        .or_else(|| document.body().map(Element::from))
        .ok_or(AppError::MissingElement("canvas parent"))?;
    let labels = LabelLayer::new(&document, &overlay, &system.scene)?;
    let sink: EventSink = Rc::new(dispatch);
    let panel = ControlPanel::new(&document, &overlay, sink, system.state(), &system.camera.position)?;

    log::info!("solar system ready: {} textures, {} labels", system.scene.texture_paths().len(), system.scene.labels().len());
    APP.with(|app| *app.borrow_mut() = Some(App { system, renderer, labels, panel, canvas: canvas.clone() }));

    install_input(&window, &canvas)?;
    start_loop(window);
    Ok(())
}

/// Reads the JSON config, falling back to built-in values when it is missing or invalid.
async fn load_config(window: &Window) -> SolarConfig {
    match fetch_config(window).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!("no {CONFIG_URL}, using built-in configuration");
            SolarConfig::default()
        }
        Err(err) => {
            log::warn!("ignoring {CONFIG_URL}: {err}");
            SolarConfig::default()
        }
    }
}

async fn fetch_config(window: &Window) -> AppResult<Option<SolarConfig>> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(CONFIG_URL, &opts)?;
    let resp_value = match JsFuture::from(window.fetch_with_request(&request)).await {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| AppError::Config("fetch did not return a Response".into()))?;
    if !resp.ok() {
        return Ok(None);
    }

    let json = JsFuture::from(resp.json()?).await?;
    let config: SolarConfig = serde_wasm_bindgen::from_value(json)?;
    config.validate()?;
    Ok(Some(config))
}

fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(target: &web_sys::EventTarget, name: &str, handler: impl FnMut(E) + 'static) -> AppResult<()> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn install_input(window: &Window, canvas: &HtmlCanvasElement) -> AppResult<()> {
    listen(canvas, "mousedown", |event: MouseEvent| {
        with_app(|app| app.system.pointer_down(event.client_x(), event.client_y()));
    })?;
    listen(window, "mousemove", |event: MouseEvent| {
        with_app(|app| app.system.pointer_move(event.client_x(), event.client_y()));
    })?;
    listen(window, "mouseup", |_: MouseEvent| {
        with_app(|app| app.system.pointer_up());
    })?;
    listen(canvas, "wheel", |event: WheelEvent| {
        event.prevent_default();
        with_app(|app| app.system.wheel(event.delta_y() as f32));
    })?;

    listen(window, "keydown", |event: KeyboardEvent| {
        let mut handled = false;
        with_app(|app| {
            if let Some(control) = key_event(&event.key(), app.system.state()) {
                app.dispatch(control);
                handled = true;
            }
        });
        if handled {
            event.prevent_default();
        }
    })?;
    Ok(())
}

fn start_loop(window: Window) {
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let ratio_window = window.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let ratio = ratio_window.device_pixel_ratio();
        with_app(|app| app.frame(ratio));
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(&ratio_window, callback);
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(&window, callback);
    };
}

fn request_animation_frame(window: &Window, f: &Closure<dyn FnMut()>) {
    if let Err(err) = window.request_animation_frame(f.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {err:?}");
    }
}

/// Focuses a body by dropdown value (`default`, `earth`, ...).
#[wasm_bindgen]
pub fn focus(name: &str) -> Result<(), JsValue> {
    let selection = name.parse::<FocusSelection>().map_err(|err| JsValue::from_str(&err))?;
    dispatch(ControlEvent::Focus(selection));
    Ok(())
}

#[wasm_bindgen]
pub fn reset_camera() {
    dispatch(ControlEvent::ResetCamera);
}

#[wasm_bindgen]
pub fn reset_speeds() {
    dispatch(ControlEvent::ResetSpeeds);
}

#[wasm_bindgen]
pub fn set_speeds(rotation: f32, revolution: f32) {
    dispatch(ControlEvent::SetRotationSpeed(rotation));
    dispatch(ControlEvent::SetRevolutionSpeed(revolution));
}
