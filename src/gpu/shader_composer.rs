use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage, ShaderType,
};

use crate::error::SnapPickError;

/// Every picking shader the crate composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shader {
    /// Point snaps as screen-space squares.
    PickPoints,
    /// Axes and edges as screen-width quads.
    PickLines,
    /// Plane snaps as world-space quads.
    PickPlanes,
    /// Visible faces.
    PickMesh,
}

impl Shader {
    /// All shaders, for exhaustive composition checks.
    pub const ALL: [Self; 4] =
        [Self::PickPoints, Self::PickLines, Self::PickPlanes, Self::PickMesh];

    const fn source(self) -> &'static str {
        match self {
            Self::PickPoints => include_str!("../../assets/shaders/picking/points.wgsl"),
            Self::PickLines => include_str!("../../assets/shaders/picking/lines.wgsl"),
            Self::PickPlanes => include_str!("../../assets/shaders/picking/planes.wgsl"),
            Self::PickMesh => include_str!("../../assets/shaders/picking/mesh.wgsl"),
        }
    }

    const fn file_path(self) -> &'static str {
        match self {
            Self::PickPoints => "picking/points.wgsl",
            Self::PickLines => "picking/lines.wgsl",
            Self::PickPlanes => "picking/planes.wgsl",
            Self::PickMesh => "picking/mesh.wgsl",
        }
    }
}

/// Wraps `naga_oil::compose::Composer` to provide shader composition with `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Picking shaders
/// use `#import snappick::camera::{...}` to pull in shared code. The
/// composer produces `naga::Module` IR directly, skipping WGSL re-parse at
/// runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

impl ShaderComposer {
    /// Composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if a shared module fails to parse.
    pub fn new() -> Result<Self, SnapPickError> {
        let mut composer = Composer::default();

        let modules: &[ModuleDef] = &[ModuleDef {
            source: include_str!("../../assets/shaders/modules/camera.wgsl"),
            file_path: "modules/camera.wgsl",
        }];

        for m in modules {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    SnapPickError::Shader(format!(
                        "failed to register shader module '{}': {e:?}",
                        m.file_path
                    ))
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose `shader` into a `wgpu::ShaderModule` ready for pipeline
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        shader: Shader,
    ) -> Result<wgpu::ShaderModule, SnapPickError> {
        let naga_module = self.compose_naga(shader)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.file_path()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose `shader` into a `naga::Module` without creating a wgpu shader
    /// module. Useful for testing shader composition without a GPU device.
    ///
    /// # Errors
    ///
    /// Returns [`SnapPickError::Shader`] if composition fails.
    pub fn compose_naga(&mut self, shader: Shader) -> Result<naga::Module, SnapPickError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: shader.source(),
                file_path: shader.file_path(),
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| {
                SnapPickError::Shader(format!(
                    "failed to compose shader '{}': {e}",
                    shader.file_path()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in Shader::ALL {
            let _ = composer
                .compose_naga(shader)
                .unwrap_or_else(|e| panic!("{e}"));
        }
    }

    #[test]
    fn point_shader_exposes_nearby_entry() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer.compose_naga(Shader::PickPoints).unwrap();
        let entries: Vec<&str> =
            module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(entries.contains(&"vs_main"));
        assert!(entries.contains(&"fs_main"));
        assert!(entries.contains(&"fs_nearby"));
    }
}
