//! Built-in drawables that do not come from an imported model

mod solid_sphere;
mod test_plane;

pub use solid_sphere::SolidSphere;
pub use test_plane::TestPlane;
