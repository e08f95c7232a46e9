//! Headless picking demo.
//!
//! Opens a wgpu device without a window, registers a few snaps, then
//! resolves the cursor at a handful of pixels and logs what each one hits.
//! The same pixels are resolved again after tilting the camera.
//! Pass a TOML options file as the first argument to override defaults.

use std::path::Path;
use std::sync::Arc;

use glam::{UVec2, Vec2, Vec3};
use snappick::cache::GeometryCache;
use snappick::camera::core::{pixel_to_ndc, Camera};
use snappick::codec::{GeometryId, TopologyKind};
use snappick::error::SnapPickError;
use snappick::gpu::render_context::RenderContext;
use snappick::interaction::context::{DomainObject, GeometryDatabase, PickContext, TopologyItem};
use snappick::interaction::model::PointPickerModel;
use snappick::interaction::InteractionAdapter;
use snappick::options::Options;
use snappick::proxy::{ProxyGeometry, ProxySet};
use snappick::registry::SnapList;
use snappick::renderer::picking::GpuViewport;
use snappick::snap::model::SurfaceModel;
use snappick::snap::Snap;
use snappick::viewport::PickViewport;

const SIZE: UVec2 = UVec2::new(800, 600);

/// Physical pixels per logical pixel, as on a typical high-density display.
const DPR: f32 = 2.0;

const PIXELS: [Vec2; 4] = [
    Vec2::new(400.0, 300.0),
    Vec2::new(450.0, 300.0),
    Vec2::new(500.0, 200.0),
    Vec2::new(20.0, 20.0),
];

/// Horizontal floor at `z`.
struct Floor(f32);

impl SurfaceModel for Floor {
    fn closest_point(&self, point: Vec3) -> (Vec3, Vec3) {
        (Vec3::new(point.x, point.y, self.0), Vec3::Z)
    }
}

/// A single solid whose top face is a floor square.
struct DemoScene {
    floor: Arc<dyn SurfaceModel>,
    pickers: Vec<ProxySet>,
}

impl DemoScene {
    fn new(viewport: &dyn PickViewport) -> Result<Self, SnapPickError> {
        let face = GeometryId::face(1, 0);
        let id = face.encode().ok_or(SnapPickError::InvalidSnapTarget(face))?;
        let corners = [
            Vec3::new(-100.0, -100.0, -5.0),
            Vec3::new(100.0, -100.0, -5.0),
            Vec3::new(100.0, 100.0, -5.0),
            Vec3::new(-100.0, 100.0, -5.0),
        ];
        let mut geometry = ProxyGeometry::default();
        geometry.push_triangle([corners[0], corners[1], corners[2]], id);
        geometry.push_triangle([corners[0], corners[2], corners[3]], id);
        Ok(Self {
            floor: Arc::new(Floor(-5.0)),
            pickers: vec![ProxySet::new("floor", geometry, viewport)],
        })
    }
}

impl GeometryDatabase for DemoScene {
    fn lookup(&self, id: GeometryId) -> Option<DomainObject> {
        (id.object == 1).then_some(DomainObject::Solid)
    }

    fn lookup_topology_item(&self, id: GeometryId) -> Option<TopologyItem> {
        (id.object == 1 && id.kind == TopologyKind::Face)
            .then(|| TopologyItem::Face(self.floor.clone()))
    }

    fn visible_pickers(&self) -> Vec<&ProxySet> {
        self.pickers.iter().collect()
    }
}

fn run(options: &Options) -> Result<(), SnapPickError> {
    let context = pollster::block_on(RenderContext::new())?;
    let camera = Camera::new(
        &options.camera,
        Vec3::new(0.0, 0.0, 100.0),
        Vec3::ZERO,
        SIZE.x as f32 / SIZE.y as f32,
    );
    let mut viewport =
        GpuViewport::new(context, options, camera, SIZE)?.with_device_pixel_ratio(DPR);

    let registry = SnapList::new(vec![
        Snap::point(Vec3::ZERO),
        Snap::point(Vec3::new(40.0, 30.0, 0.0)),
        Snap::axis(Vec3::ZERO, Vec3::X),
    ]);
    let codec = options.codec();
    let mut cache = GeometryCache::new(&registry, &viewport, codec, options.extents())?;
    let _ = cache.sync(&registry, &viewport)?;
    let scene = DemoScene::new(&viewport)?;
    let model = PointPickerModel::new();
    let mut adapter = InteractionAdapter::new(codec, options);

    let mut ctx = PickContext {
        viewport: &mut viewport,
        cache: &cache,
        interaction: &model,
        db: &scene,
    };
    log::info!("top view");
    pick_pixels(&mut adapter, &mut ctx)?;

    viewport.camera_mut().eye = Vec3::new(0.0, -80.0, 60.0);
    let mut ctx = PickContext {
        viewport: &mut viewport,
        cache: &cache,
        interaction: &model,
        db: &scene,
    };
    log::info!("tilted view");
    pick_pixels(&mut adapter, &mut ctx)?;

    adapter.dispose();
    cache.dispose();
    Ok(())
}

/// Resolve every demo pixel and log the exact hit and the nearby points.
fn pick_pixels(
    adapter: &mut InteractionAdapter,
    ctx: &mut PickContext<'_>,
) -> Result<(), SnapPickError> {
    for pixel in PIXELS {
        adapter.set_cursor(ctx, pixel_to_ndc(pixel, SIZE));
        match adapter.intersect(ctx)? {
            Some(result) => log::info!(
                "pixel {pixel}: {} at {}",
                result.snap.kind(),
                result.position
            ),
            None => log::info!("pixel {pixel}: nothing"),
        }
        // Nearby answers arrive one query later; ask twice per cursor.
        let _ = adapter.nearby(ctx)?;
        let nearby = adapter.nearby(ctx)?;
        log::info!("pixel {pixel}: {} nearby points", nearby.len());
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    if let Err(e) = run(&options) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
