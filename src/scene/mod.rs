pub mod builder;
pub mod light;
pub mod material;
pub mod mesh;
pub mod model;
pub mod primitive;
pub mod shape;
pub mod texture;

pub use builder::SceneBuilder;
pub use light::Lights;
pub use material::Material;
pub use model::{Model, Transform};
pub use shape::{Shape, ShapeKind};

use crate::assets::{AssetHandle, AssetRegistry};

/// Everything that gets drawn: lights, spinning shapes in insertion order,
/// loaded models and an optional panoramic background.
#[derive(Default)]
pub struct Scene {
    pub lights: Lights,
    pub shapes: Vec<Shape>,
    pub models: Vec<Model>,
    pub background: Option<AssetHandle>,
    pub registry: AssetRegistry,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn add_model(&mut self, model: Model) {
        log::info!("Added model {} with {} meshes", model.name, model.meshes.len());
        self.models.push(model);
    }

    /// Advances every shape by its per-frame rotation, in insertion order.
    pub fn advance(&mut self) {
        self.shapes.iter_mut().for_each(Shape::advance);
    }
}
