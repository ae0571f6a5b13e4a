pub mod camera;
pub mod labels;
pub mod mesh;
pub mod renderer;
pub mod scene;
