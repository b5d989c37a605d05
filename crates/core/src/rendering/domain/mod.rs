pub mod render_surface;
pub mod result_renderer;
