use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::metrics::StatsAccumulator;
use super::rendering::Viewport;
use super::viewer::{KeyOutcome, ViewerApp, ViewerSetup};
use super::{Renderer, SpriteLoadError};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Village".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to start sprite loader: {0}")]
    SpriteLoader(#[source] SpriteLoadError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and runs the viewer until it is closed. The simulation
/// advances on a fixed step; each redraw runs the owed steps and then
/// paints one frame.
pub fn run_app(config: LoopConfig, setup: ViewerSetup) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    let mut viewer =
        ViewerApp::new(setup, renderer.viewport()).map_err(AppError::SpriteLoader)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut stats = StatsAccumulator::new(metrics_log_interval, last_frame_instant);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    resize(&mut renderer, &mut viewer, size.width, size.height);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    resize(&mut renderer, &mut viewer, size.width, size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    viewer.cursor_moved(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => viewer.cursor_left(),
                WindowEvent::MouseInput { state, button, .. } => {
                    viewer.mouse_button(button, state);
                }
                WindowEvent::MouseWheel { delta, .. } => viewer.wheel(delta),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    let text = event.text.as_ref().map(|text| text.as_str());
                    if viewer.key_pressed(event.physical_key, text) == KeyOutcome::Quit {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                    let plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..plan.ticks_to_run {
                        viewer.step(fixed_dt);
                    }
                    accumulator = plan.remaining_accumulator;
                    stats.record_ticks(plan.ticks_to_run);
                    if plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let latest = stats.latest();
                    let drawn = renderer.draw(|surface, draw_order| {
                        viewer.paint(surface, draw_order, latest);
                    });
                    if let Err(error) = drawn {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    stats.record_frame(raw_frame_dt);

                    if let Some(snapshot) = stats.maybe_snapshot(now) {
                        let simulation = viewer.simulation();
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            entity_count = simulation.map_or(0, |sim| sim.entity_count()),
                            talking = simulation.map_or(0, |sim| sim.talking_count()),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => info!("shutdown"),
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn resize(renderer: &mut Renderer, viewer: &mut ViewerApp, width: u32, height: u32) {
    if let Err(error) = renderer.resize(width, height) {
        warn!(error = %error, width, height, "renderer_resize_failed");
        return;
    }
    if width > 0 && height > 0 {
        viewer.resize(Viewport { width, height });
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

/// Spends whole fixed steps from `accumulator`, at most
/// `max_ticks_per_frame` of them. Backlog beyond that is dropped.
fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator -= fixed_dt;
        ticks_to_run += 1;
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_frames_are_capped() {
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(900), Duration::from_millis(250)),
            Duration::from_millis(250)
        );
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(10), Duration::from_millis(250)),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn whole_steps_run_and_remainder_carries() {
        let plan = plan_sim_steps(Duration::from_millis(50), Duration::from_millis(16), 5);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(2));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn backlog_past_the_tick_cap_is_dropped() {
        let plan = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn default_loop_runs_at_sixty_hertz() {
        let config = LoopConfig::default();
        assert_eq!(config.target_tps, 60);
        assert!(config.max_ticks_per_frame >= 1);
    }
}
