//! partview main entry point

use partview_core::DocumentRef;

fn main() -> eframe::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "partview_frontend=debug,partview_renderer=info,partview_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let initial = std::env::args().nth(1).map(|arg| DocumentRef::parse(&arg));
    match &initial {
        Some(reference) => tracing::info!("Starting partview with {}", reference),
        None => tracing::info!("Starting partview"),
    }

    // Downlevel limits so software adapters can still open a device
    let wgpu_options = egui_wgpu::WgpuConfiguration {
        wgpu_setup: egui_wgpu::WgpuSetup::CreateNew {
            supported_backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            power_preference: wgpu::PowerPreference::LowPower,
            device_descriptor: std::sync::Arc::new(|_adapter| wgpu::DeviceDescriptor {
                label: Some("partview device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
            }),
        },
        ..Default::default()
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("partview"),
        wgpu_options,
        ..Default::default()
    };

    eframe::run_native(
        "partview",
        native_options,
        Box::new(move |cc| {
            let app = partview_frontend::PartviewApp::new(cc, initial)?;
            Ok(Box::new(app))
        }),
    )
}
