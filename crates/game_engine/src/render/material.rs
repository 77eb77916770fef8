//! Material system for rendering

use std::collections::HashMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::assets::TextureHandle;

bitflags! {
    /// Render state switches carried by a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MaterialFlags: u32 {
        /// Alpha blended, drawn after opaque geometry
        const TRANSPARENT = 1 << 0;
        /// Ignores scene lighting
        const UNLIT = 1 << 1;
        /// Back faces are not culled
        const DOUBLE_SIDED = 1 << 2;
    }
}

/// Unique identifier for materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Material properties for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Name, unique within a library
    pub name: String,

    /// Base (diffuse) color (RGB)
    pub base_color: [f32; 3],

    /// Specular color (RGB)
    pub specular: [f32; 3],

    /// Specular exponent
    pub shininess: f32,

    /// Emitted color (RGB)
    pub emissive: [f32; 3],

    /// Opacity (0.0 = transparent, 1.0 = opaque)
    pub opacity: f32,

    /// Diffuse texture path as written in the source file
    pub diffuse_texture_path: Option<String>,

    /// Loaded diffuse texture
    pub diffuse_texture: Option<TextureHandle>,

    /// Shader program used to draw this material
    pub shader: String,

    /// Render state flags
    pub flags: MaterialFlags,
}

impl Material {
    /// Default shader for lit materials
    pub const DEFAULT_SHADER: &'static str = "standard";

    /// Create a new material with default properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0, 1.0, 1.0],
            specular: [0.5, 0.5, 0.5],
            shininess: 32.0,
            emissive: [0.0, 0.0, 0.0],
            opacity: 1.0,
            diffuse_texture_path: None,
            diffuse_texture: None,
            shader: Self::DEFAULT_SHADER.to_string(),
            flags: MaterialFlags::empty(),
        }
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b];
        self
    }

    /// Set the opacity; anything below 1 marks the material transparent
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.flags.set(MaterialFlags::TRANSPARENT, self.opacity < 1.0);
        self
    }

    /// Set the shader program name
    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.shader = shader.into();
        self
    }

    /// Add flags
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether the material needs blending
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSPARENT) || self.opacity < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Registry of materials addressed by [`MaterialId`]
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material; a material with the same name is replaced in place
    pub fn add(&mut self, material: Material) -> MaterialId {
        if let Some(&id) = self.by_name.get(&material.name) {
            self.materials[id.0 as usize] = material;
            return id;
        }
        let id = MaterialId(self.materials.len() as u32);
        self.by_name.insert(material.name.clone(), id);
        self.materials.push(material);
        id
    }

    /// Get a material
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// Get a material mutably
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0 as usize)
    }

    /// Look up a material id by name
    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate `(id, material)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i as u32), m))
    }
}
