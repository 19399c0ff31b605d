use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::Context as _;
use cgmath::Vector2;
use clap::Parser;
use eframe::egui;
use particle_sandbox::config::TICKS_PER_SECOND;
use particle_sandbox::{
    EmissionConfig, ParticleSandbox, Preset, RedrawSink, Rgb, SandboxSettings, Surface,
};
use tracing_subscriber::EnvFilter;

const SIDE_PANEL_WIDTH: f32 = 280.0;

const SPEED_RANGE: RangeInclusive<f32> = 0.01..=5.0;
const ANGLE_RANGE: RangeInclusive<f32> = 1.0..=360.0;
const FORCE_RANGE: RangeInclusive<f32> = -2.5..=2.5;
const AMOUNT_RANGE: RangeInclusive<u32> = 1..=1000;
const LIFE_RANGE: RangeInclusive<i32> = 1..=15 * TICKS_PER_SECOND;
const CYCLE_RANGE: RangeInclusive<u32> = 1..=500;
const INTERVAL_RANGE: RangeInclusive<u64> = 25..=500;

#[derive(Parser)]
#[command(name = "particle-sandbox")]
#[command(about = "Interactive 2D particle effects sandbox", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a preset: firework, firework-single, fountain, meteor, snow
    #[arg(long)]
    preset: Option<Preset>,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Canvas height in pixels
    #[arg(long)]
    height: Option<f32>,

    /// Simulation tick in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
}

/// Posts redraw requests to the UI thread once eframe hands us a context.
/// Requests made before that are dropped; the first frame paints anyway.
#[derive(Clone, Default)]
struct Repaint(Arc<OnceLock<egui::Context>>);

impl Repaint {
    fn attach(&self, ctx: egui::Context) {
        let _ = self.0.set(ctx);
    }
}

impl RedrawSink for Repaint {
    fn request_redraw(&self) -> particle_sandbox::Result<()> {
        if let Some(ctx) = self.0.get() {
            ctx.request_repaint();
        }
        Ok(())
    }
}

/// Plots particles as 1x1 rects relative to the canvas origin
struct PainterSurface {
    painter: egui::Painter,
    origin: egui::Pos2,
}

impl Surface for PainterSurface {
    fn plot(&mut self, x: i32, y: i32, color: Rgb) {
        let min = self.origin + egui::vec2(x as f32, y as f32);
        self.painter.rect_filled(
            egui::Rect::from_min_size(min, egui::vec2(1.0, 1.0)),
            0.0,
            egui::Color32::from_rgb(color.r, color.g, color.b),
        );
    }
}

struct SandboxApp {
    sandbox: ParticleSandbox,
    draft: EmissionConfig,
    preset: Option<Preset>,
    canvas: Vector2<f32>,
    last_error: Option<String>,
}

impl SandboxApp {
    fn new(sandbox: ParticleSandbox, settings: &SandboxSettings) -> Self {
        Self {
            draft: sandbox.config(),
            sandbox,
            preset: settings.preset,
            canvas: settings.canvas_size(),
            last_error: None,
        }
    }

    fn apply_preset(&mut self, preset: Preset) {
        self.preset = Some(preset);
        self.draft = preset.config(self.canvas);
        self.push_config();
    }

    fn push_config(&mut self) {
        match self.sandbox.set_config(self.draft.clone()) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                tracing::warn!("rejected config edit: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn start_emission(&mut self) {
        match self.sandbox.start_emission() {
            Ok(true) => {}
            Ok(false) => tracing::debug!("already emitting"),
            Err(err) => {
                tracing::error!("could not start emission: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Particles: {}", self.sandbox.particle_count()));
        ui.label(if self.sandbox.is_emitting() {
            "Emitting"
        } else {
            "Idle"
        });
        if ui.button("Start").clicked() {
            self.start_emission();
        }
        ui.separator();

        let mut selected = self.preset;
        egui::ComboBox::from_label("Preset")
            .selected_text(selected.map_or("custom", |p| p.name()))
            .show_ui(ui, |ui| {
                for preset in Preset::ALL {
                    ui.selectable_value(&mut selected, Some(preset), preset.name());
                }
            });
        if let Some(preset) = selected.filter(|&p| Some(p) != self.preset) {
            self.apply_preset(preset);
        }
        ui.separator();

        let mut changed = false;
        let (w, h) = ((self.canvas.x - 1.0).max(1.0), (self.canvas.y - 1.0).max(1.0));
        let draft = &mut self.draft;

        // min sliders are capped by max, max sliders start at min
        ui.heading("Position");
        let (min_x, max_x) = (draft.min_pos[0], draft.max_pos[0]);
        changed |= slider(ui, "Min X", &mut draft.min_pos[0], 1.0..=max_x.max(1.0));
        changed |= slider(ui, "Max X", &mut draft.max_pos[0], min_x..=w.max(min_x));
        let (min_y, max_y) = (draft.min_pos[1], draft.max_pos[1]);
        changed |= slider(ui, "Min Y", &mut draft.min_pos[1], 1.0..=max_y.max(1.0));
        changed |= slider(ui, "Max Y", &mut draft.max_pos[1], min_y..=h.max(min_y));

        ui.heading("Motion");
        changed |= slider(ui, "Speed", &mut draft.speed, SPEED_RANGE);
        changed |= slider(ui, "Angle", &mut draft.angle_range, ANGLE_RANGE);
        changed |= slider(ui, "Wind", &mut draft.wind, FORCE_RANGE);
        changed |= slider(ui, "Gravity", &mut draft.gravity, FORCE_RANGE);

        ui.heading("Emission");
        changed |= slider(ui, "Particles", &mut draft.particle_amount, AMOUNT_RANGE);
        changed |= slider(ui, "Life (ticks)", &mut draft.life, LIFE_RANGE);
        changed |= slider(ui, "Cycles", &mut draft.cycle_count, CYCLE_RANGE);
        changed |= slider(ui, "Interval (ms)", &mut draft.interval_ms, INTERVAL_RANGE);

        ui.heading("Colour");
        for (i, channel) in ["R", "G", "B"].into_iter().enumerate() {
            let (lo, hi) = (draft.color_min[i], draft.color_max[i]);
            changed |= slider(ui, &format!("Min {channel}"), &mut draft.color_min[i], 0..=hi);
            changed |= slider(ui, &format!("Max {channel}"), &mut draft.color_max[i], lo..=255);
        }

        if changed {
            self.preset = None;
            self.push_config();
        }

        if let Some(err) = &self.last_error {
            ui.colored_label(egui::Color32::RED, err.as_str());
        }
    }
}

fn slider<N: egui::emath::Numeric>(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut N,
    range: RangeInclusive<N>,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::Slider::new(value, range)).changed()
    })
    .inner
}

impl eframe::App for SandboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("Control Panel")
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_ui_panel(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click());
                let canvas = Vector2::new(rect.width(), rect.height());
                if canvas != self.canvas {
                    self.canvas = canvas;
                    if self.draft.fit_to_canvas(canvas) {
                        self.push_config();
                    }
                }

                if response.clicked() {
                    self.start_emission();
                }

                let mut surface = PainterSurface {
                    painter: ui.painter_at(rect),
                    origin: rect.min,
                };
                self.sandbox.draw(&mut surface);
            });
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<SandboxSettings> {
    let mut settings = match &cli.config {
        Some(path) => SandboxSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SandboxSettings::default(),
    };

    if let Some(width) = cli.width {
        settings.canvas[0] = width;
    }
    if let Some(height) = cli.height {
        settings.canvas[1] = height;
    }
    if let Some(tick_ms) = cli.tick_ms {
        settings.tick_interval_ms = tick_ms;
    }

    match cli.preset.or(settings.preset) {
        Some(preset) => settings.apply_preset(preset),
        None if cli.config.is_none() => settings.apply_preset(Preset::Firework),
        None => {}
    }

    settings.validate()?;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let repaint = Repaint::default();
    let sandbox = ParticleSandbox::start(settings.clone(), Arc::new(repaint.clone()))?;

    let canvas = settings.canvas_size();
    eframe::run_native(
        "Particle Sandbox",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(egui::vec2(canvas.x + SIDE_PANEL_WIDTH, canvas.y)),
            ..Default::default()
        },
        Box::new(move |cc| {
            repaint.attach(cc.egui_ctx.clone());
            Box::new(SandboxApp::new(sandbox, &settings))
        }),
    )
    .map_err(|err| anyhow::anyhow!("eframe: {err}"))
}
