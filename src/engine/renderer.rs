use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlImageElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext, WebGlTexture, WebGlUniformLocation};
use nalgebra::Point3;
use crate::engine::camera::Camera;
use crate::engine::mesh::VERTEX_STRIDE;
use crate::engine::scene::{DrawItem, Geometry, GeometryId, Material, Scene};
use crate::error::{AppError, AppResult};

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    attribute vec2 aTexCoord;
    uniform mat4 uModel;
    uniform mat4 uViewProjection;
    uniform float uPointSize;
    varying vec3 vColor;
    varying vec2 vTexCoord;
    varying vec3 vNormal;
    varying vec3 vWorldPos;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        gl_Position = uViewProjection * world;
        gl_PointSize = uPointSize;
        vWorldPos = world.xyz;
        // Unit sphere: the position is the normal.
        vNormal = (uModel * vec4(aPosition, 0.0)).xyz;
        vColor = aColor;
        vTexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    varying vec2 vTexCoord;
    varying vec3 vNormal;
    varying vec3 vWorldPos;
    uniform sampler2D uTexture;
    uniform int uUseTexture;
    uniform vec3 uUniformColor;
    uniform bool uUseUniformColor;
    uniform float uOpacity;
    uniform bool uLit;
    uniform vec3 uLightPosition;

    void main() {
        vec3 color;
        if (uUseUniformColor) {
            color = uUniformColor;
        } else {
            color = vColor;
        }

        float alpha = uOpacity;
        if (uUseTexture == 1) {
            vec4 texColor = texture2D(uTexture, vTexCoord);
            color *= texColor.rgb;
            alpha *= texColor.a;
        }

        if (uLit) {
            vec3 n = normalize(vNormal);
            vec3 l = normalize(uLightPosition - vWorldPos);
            float diffuse = max(dot(n, l), 0.0);
            color *= 0.08 + 0.92 * diffuse;
        }

        gl_FragColor = vec4(color, alpha);
    }
"#;

const STAR_POINT_SIZE: f32 = 1.5;

struct GpuGeometry {
    vertex_buffer: WebGlBuffer,
    index_buffer: Option<WebGlBuffer>,
    count: i32,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    program: WebGlProgram,
    model_location: WebGlUniformLocation,
    view_projection_location: WebGlUniformLocation,
    point_size_location: WebGlUniformLocation,
    u_uniform_color_location: WebGlUniformLocation,
    u_use_uniform_color_location: WebGlUniformLocation,
    u_use_texture_location: WebGlUniformLocation,
    opacity_location: WebGlUniformLocation,
    lit_location: WebGlUniformLocation,
    light_position_location: WebGlUniformLocation,
    geometries: HashMap<GeometryId, GpuGeometry>,
    textures: HashMap<String, WebGlTexture>,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> AppResult<Self> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let uniform = |name: &'static str| -> AppResult<WebGlUniformLocation> {
            gl.get_uniform_location(&program, name)
                .ok_or_else(|| AppError::Js(format!("Failed to get {name} location")))
        };

        let renderer = Renderer {
            model_location: uniform("uModel")?,
            view_projection_location: uniform("uViewProjection")?,
            point_size_location: uniform("uPointSize")?,
            u_uniform_color_location: uniform("uUniformColor")?,
            u_use_uniform_color_location: uniform("uUseUniformColor")?,
            u_use_texture_location: uniform("uUseTexture")?,
            opacity_location: uniform("uOpacity")?,
            lit_location: uniform("uLit")?,
            light_position_location: uniform("uLightPosition")?,
            gl,
            program,
            geometries: HashMap::new(),
            textures: HashMap::new(),
        };

        // The sun is the only light.
        renderer.gl.uniform3f(Some(&renderer.light_position_location), 0.0, 0.0, 0.0);
        renderer.gl.uniform1f(Some(&renderer.point_size_location), STAR_POINT_SIZE);
        Ok(renderer)
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(WebGlRenderingContext::DEPTH_TEST);
    }

    pub fn enable_blend(&self) {
        self.gl.enable(WebGlRenderingContext::BLEND);
        self.gl.blend_func(WebGlRenderingContext::SRC_ALPHA, WebGlRenderingContext::ONE_MINUS_SRC_ALPHA);
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    /// Starts loading every texture the scene references. Bodies draw untextured until
    /// their image decodes.
    pub fn load_textures(&mut self, urls: &[String]) -> AppResult<()> {
        for url in urls {
            if !self.textures.contains_key(url) {
                let texture = self.create_texture(url)?;
                self.textures.insert(url.clone(), texture);
            }
        }
        log::debug!("loading {} textures", self.textures.len());
        Ok(())
    }

    pub fn draw_scene(&mut self, scene: &Scene, camera: &Camera, width: i32, height: i32) {
        self.resize(width, height);
        self.clear(0.0, 0.0, 0.0);
        self.enable_depth_test();
        self.enable_blend();

        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let view_projection = camera.view_projection(aspect);
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.view_projection_location), false, view_projection.as_slice());

        let (transparent, opaque): (Vec<DrawItem>, Vec<DrawItem>) = scene
            .visible_drawables()
            .into_iter()
            .filter(|item| item.material.opacity > 0.0)
            .partition(|item| item.material.transparent);

        for item in &opaque {
            self.draw_item(scene, item);
        }

        // Back to front so overlapping shells blend correctly.
        let eye = Point3::from(camera.position);
        let mut transparent = transparent;
        transparent.sort_by(|a, b| {
            let da = (a.world.transform_point(&Point3::origin()) - eye).norm_squared();
            let db = (b.world.transform_point(&Point3::origin()) - eye).norm_squared();
            db.total_cmp(&da)
        });
        self.gl.depth_mask(false);
        for item in &transparent {
            self.draw_item(scene, item);
        }
        self.gl.depth_mask(true);
    }

    fn draw_item(&mut self, scene: &Scene, item: &DrawItem) {
        let geometry_id = match scene.node(item.node).drawable.as_ref() {
            Some(drawable) => drawable.geometry,
            None => return,
        };
        if let Err(err) = self.upload_geometry(geometry_id, item.geometry) {
            log::warn!("skipping {}: {}", scene.node(item.node).name, err);
            return;
        }
        let Some(gpu) = self.geometries.get(&geometry_id) else {
            return;
        };

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&gpu.vertex_buffer));
        let pos_loc = self.gl.get_attrib_location(&self.program, "aPosition") as u32;
        let col_loc = self.gl.get_attrib_location(&self.program, "aColor") as u32;
        let tex_loc = self.gl.get_attrib_location(&self.program, "aTexCoord") as u32;

        let interleaved = matches!(item.geometry, Geometry::Triangles(_));
        if interleaved {
            let stride = (VERTEX_STRIDE * 4) as i32;
            self.gl.vertex_attrib_pointer_with_i32(pos_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
            self.gl.enable_vertex_attrib_array(pos_loc);
            self.gl.vertex_attrib_pointer_with_i32(col_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 12);
            self.gl.enable_vertex_attrib_array(col_loc);
            self.gl.vertex_attrib_pointer_with_i32(tex_loc, 2, WebGlRenderingContext::FLOAT, false, stride, 24);
            self.gl.enable_vertex_attrib_array(tex_loc);
        } else {
            self.gl.vertex_attrib_pointer_with_i32(pos_loc, 3, WebGlRenderingContext::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(pos_loc);
            self.gl.disable_vertex_attrib_array(col_loc);
            self.gl.disable_vertex_attrib_array(tex_loc);
        }

        self.set_material(item.material, interleaved);
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.model_location), false, item.world.as_slice());

        match item.geometry {
            Geometry::Triangles(_) => {
                self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, gpu.index_buffer.as_ref());
                self.gl.draw_elements_with_i32(
                    WebGlRenderingContext::TRIANGLES,
                    gpu.count,
                    WebGlRenderingContext::UNSIGNED_SHORT,
                    0,
                );
            }
            Geometry::LineLoop(_) => self.gl.draw_arrays(WebGlRenderingContext::LINE_LOOP, 0, gpu.count),
            Geometry::Points(_) => self.gl.draw_arrays(WebGlRenderingContext::POINTS, 0, gpu.count),
        }
    }

    fn set_material(&self, material: &Material, interleaved: bool) {
        let texture = material.texture.as_ref().and_then(|url| self.textures.get(url));
        match (texture, interleaved) {
            (Some(tex), true) => {
                self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
                self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
                self.gl.uniform1i(Some(&self.u_use_texture_location), 1);
            }
            _ => self.gl.uniform1i(Some(&self.u_use_texture_location), 0),
        }
        let [r, g, b] = material.color;
        self.gl.uniform1i(Some(&self.u_use_uniform_color_location), 1);
        self.gl.uniform3f(Some(&self.u_uniform_color_location), r, g, b);
        self.gl.uniform1f(Some(&self.opacity_location), material.opacity);
        self.gl.uniform1i(Some(&self.lit_location), material.lit as i32);
    }

    fn upload_geometry(&mut self, id: GeometryId, geometry: &Geometry) -> AppResult<()> {
        if self.geometries.contains_key(&id) {
            return Ok(());
        }
        let vertex_buffer = self.gl.create_buffer().ok_or(AppError::Js("Failed to create buffer".into()))?;
        let (vertices, indices): (&[f32], Option<&[u16]>) = match geometry {
            Geometry::Triangles(mesh) => (&mesh.vertices, Some(&mesh.indices)),
            Geometry::LineLoop(points) | Geometry::Points(points) => (points, None),
        };

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        let (index_buffer, count) = match indices {
            Some(indices) => {
                let buffer = self.gl.create_buffer().ok_or(AppError::Js("Failed to create index buffer".into()))?;
                self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&buffer));
                unsafe {
                    let idx_array = js_sys::Uint16Array::view(indices);
                    self.gl.buffer_data_with_array_buffer_view(
                        WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
                        &idx_array,
                        WebGlRenderingContext::STATIC_DRAW
                    );
                }
                (Some(buffer), indices.len() as i32)
            }
            None => (None, (vertices.len() / 3) as i32),
        };

        self.geometries.insert(id, GpuGeometry { vertex_buffer, index_buffer, count });
        Ok(())
    }

    fn create_texture(&self, url: &str) -> AppResult<WebGlTexture> {
        let texture = self.gl.create_texture().ok_or(AppError::Js("Failed to create texture".into()))?;
        self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));

        // White placeholder until the image arrives; a failed load leaves it in place.
        let pixel = [255u8, 255, 255, 255];
        self.gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            WebGlRenderingContext::TEXTURE_2D, 0, WebGlRenderingContext::RGBA as i32, 1, 1, 0,
            WebGlRenderingContext::RGBA, WebGlRenderingContext::UNSIGNED_BYTE, Some(&pixel)
        )?;

        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let gl = self.gl.clone();
        let texture_clone = texture.clone();
        let img_clone = img.clone();
        let loaded_url = url.to_string();

        let onload = Closure::wrap(Box::new(move || {
            gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture_clone));
            if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_image(
                WebGlRenderingContext::TEXTURE_2D, 0, WebGlRenderingContext::RGBA as i32, WebGlRenderingContext::RGBA, WebGlRenderingContext::UNSIGNED_BYTE, &img_clone
            ) {
                log::warn!("could not upload texture {loaded_url}: {err:?}");
                return;
            }

            if is_power_of_2(img_clone.width()) && is_power_of_2(img_clone.height()) {
                gl.generate_mipmap(WebGlRenderingContext::TEXTURE_2D);
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR_MIPMAP_LINEAR as i32);
            } else {
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
                gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR as i32);
            }
            log::debug!("texture ready: {loaded_url}");
        }) as Box<dyn FnMut()>);

        let failed_url = url.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            log::warn!("failed to load texture {failed_url}, drawing untextured");
        }) as Box<dyn FnMut()>);

        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        img.set_src(url);

        Ok(texture)
    }
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::is_power_of_2;

    #[test]
    fn power_of_two_detection() {
        assert!(is_power_of_2(1024));
        assert!(is_power_of_2(1));
        assert!(!is_power_of_2(0));
        assert!(!is_power_of_2(1000));
    }
}
