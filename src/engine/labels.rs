use nalgebra::{Matrix4, Point3};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};
use crate::engine::camera::Camera;
use crate::engine::scene::{Label, Scene};
use crate::error::{AppError, AppResult};

/// Maps a world point to CSS pixels, top-left origin. `None` when it falls outside the
/// view volume or behind the camera.
pub fn project_to_screen(
    world: &Point3<f32>,
    view_projection: &Matrix4<f32>,
    width: f32,
    height: f32,
) -> Option<[f32; 2]> {
    let clip = view_projection * world.to_homogeneous();
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    if !(-1.0..=1.0).contains(&ndc.z) {
        return None;
    }
    Some([(ndc.x * 0.5 + 0.5) * width, (0.5 - ndc.y * 0.5) * height])
}

/// Labels float over the canvas independently of their anchor's mesh, so opacity alone
/// decides whether one is drawn.
pub fn is_displayed(label: &Label) -> bool {
    label.opacity > 0.0
}

/// One absolutely positioned `div` per scene label, laid over the canvas.
pub struct LabelLayer {
    elements: Vec<HtmlElement>,
}

impl LabelLayer {
    pub fn new(document: &Document, parent: &Element, scene: &Scene) -> AppResult<Self> {
        let container = create_div(document, "labels")?;
        let style = container.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", "0")?;
        style.set_property("top", "0")?;
        style.set_property("pointer-events", "none")?;
        parent.append_child(&container)?;

        let mut elements = Vec::with_capacity(scene.labels().len());
        for label in scene.labels() {
            let element = create_div(document, "label")?;
            element.set_text_content(Some(&label.text));
            let style = element.style();
            style.set_property("position", "absolute")?;
            style.set_property("color", "#fff")?;
            style.set_property("font", "12px sans-serif")?;
            style.set_property("white-space", "nowrap")?;
            style.set_property("display", "none")?;
            container.append_child(&element)?;
            elements.push(element);
        }

        Ok(LabelLayer { elements })
    }

    /// Places every label over its anchor for the current camera.
    pub fn render(&self, scene: &Scene, camera: &Camera, width: f32, height: f32) -> AppResult<()> {
        let view_projection = camera.view_projection(width.max(1.0) / height.max(1.0));
        for (label, element) in scene.labels().iter().zip(&self.elements) {
            let style = element.style();
            let screen = if is_displayed(label) {
                project_to_screen(&scene.world_position(label.anchor), &view_projection, width, height)
            } else {
                None
            };

            match screen {
                Some([x, y]) => {
                    style.set_property("display", "block")?;
                    style.set_property("opacity", &label.opacity.to_string())?;
                    style.set_property(
                        "transform",
                        &format!("translate(-50%, -50%) translate({x:.1}px, {y:.1}px)"),
                    )?;
                }
                None => style.set_property("display", "none")?,
            }
        }
        Ok(())
    }
}

fn create_div(document: &Document, class: &str) -> AppResult<HtmlElement> {
    let element = document
        .create_element("div")?
        .dyn_into::<HtmlElement>()
        .map_err(|_| AppError::Js("div is not an HtmlElement".into()))?;
    element.set_class_name(class);
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn camera() -> Camera {
        let mut camera = Camera::new(Vector3::new(0.0, 0.0, 100.0));
        camera.look_at(Point3::origin());
        camera
    }

    #[test]
    fn target_projects_to_the_centre() {
        let vp = camera().view_projection(2.0);
        let [x, y] = project_to_screen(&Point3::origin(), &vp, 800.0, 400.0).unwrap();
        assert_relative_eq!(x, 400.0, epsilon = 1e-2);
        assert_relative_eq!(y, 200.0, epsilon = 1e-2);
    }

    #[test]
    fn screen_y_grows_downwards() {
        let vp = camera().view_projection(1.0);
        let [_, y] = project_to_screen(&Point3::new(0.0, 10.0, 0.0), &vp, 500.0, 500.0).unwrap();
        assert!(y < 250.0);
    }

    #[test]
    fn points_behind_the_camera_are_dropped() {
        let vp = camera().view_projection(1.0);
        assert_eq!(project_to_screen(&Point3::new(0.0, 0.0, 200.0), &vp, 500.0, 500.0), None);
    }
}
