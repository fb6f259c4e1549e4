//! Surface materials and the per-asset material library.

use serde::{Deserialize, Serialize};

/// Handle to a material in a [`MaterialLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub(crate) u32);

impl MaterialHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Surface description of a renderable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// Linear RGB emissive color.
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub double_sided: bool,
    /// Draw triangle edges instead of filled faces.
    pub wireframe: bool,
}

impl Material {
    pub fn new(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_emissive(mut self, emissive: [f32; 3]) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    /// Build a material from `0xRRGGBB` color literals.
    pub fn from_hex(color: u32, emissive: u32) -> Self {
        let rgb = hex_to_rgb(color);
        Self::new([rgb[0], rgb[1], rgb[2], 1.0]).with_emissive(hex_to_rgb(emissive))
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [0.8, 0.8, 0.8, 1.0],
            emissive: [0.0; 3],
            metallic: 0.0,
            roughness: 0.5,
            double_sided: false,
            wireframe: false,
        }
    }
}

/// Convert a `0xRRGGBB` literal to linear-ish RGB in `[0, 1]`.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// All materials referenced by one loaded asset.
///
/// Materials are shared by handle; changing a material through the library is
/// seen by every renderable that references it.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.materials.len() as u32);
        self.materials.push(material);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle.index())
    }

    pub fn contains(&self, handle: MaterialHandle) -> bool {
        handle.index() < self.materials.len()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialHandle(i as u32), m))
    }

    /// Flip the wireframe flag of every material exactly once.
    pub fn toggle_wireframe(&mut self) {
        for material in &mut self.materials {
            material.wireframe = !material.wireframe;
        }
    }

    /// Set the wireframe flag of every material.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        for material in &mut self.materials {
            material.wireframe = wireframe;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        let material = Material::from_hex(0xffaa00, 0x553300);
        assert_eq!(material.base_color, [1.0, 170.0 / 255.0, 0.0, 1.0]);
        assert_eq!(material.emissive, [85.0 / 255.0, 51.0 / 255.0, 0.0]);
    }

    #[test]
    fn test_toggle_wireframe_twice_is_identity() {
        let mut library = MaterialLibrary::new();
        library.add(Material::default());
        let mut wire = Material::default();
        wire.wireframe = true;
        library.add(wire);

        let before: Vec<bool> = library.iter().map(|(_, m)| m.wireframe).collect();
        library.toggle_wireframe();
        let flipped: Vec<bool> = library.iter().map(|(_, m)| m.wireframe).collect();
        library.toggle_wireframe();
        let after: Vec<bool> = library.iter().map(|(_, m)| m.wireframe).collect();

        assert_eq!(flipped, vec![true, false]);
        assert_eq!(before, after);
    }
}
