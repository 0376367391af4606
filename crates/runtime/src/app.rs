use std::time::{Duration, Instant};

use stagehand_coroutine::{
    Coroutine, CoroutineExit, CoroutineId, Scheduler, SchedulerError, StopToken, TickReport,
};
use stagehand_render::{FrameRenderer, ListRenderer, RenderError, RenderList};
use stagehand_scene::SceneTree;

use crate::config::{ConfigError, RuntimeConfig};
use crate::timer::FrameTimer;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

/// What happened during one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub frame: u64,
    pub tick: TickReport,
    pub draws: usize,
    pub elapsed: Duration,
}

/// Owns the scene, the coroutine scheduler and the renderer, and drives them
/// one frame at a time.
///
/// Coroutines receive the scene as their context, so application logic
/// mutates the tree during the update step only.
pub struct App {
    config: RuntimeConfig,
    scene: SceneTree,
    scheduler: Scheduler<SceneTree>,
    renderer: ListRenderer,
    timer: FrameTimer,
    last_frame: RenderList,
    frame: u64,
}

impl App {
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::with_renderer(config, ListRenderer::default())
    }

    pub fn with_renderer(config: RuntimeConfig, renderer: ListRenderer) -> Result<Self, RuntimeError> {
        config.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(config.scheduler.clone()),
            timer: FrameTimer::new(config.timer_history),
            config,
            scene: SceneTree::new(),
            renderer,
            last_frame: RenderList::default(),
            frame: 0,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    /// Mutable scene access for setup between frames.
    pub fn scene_mut(&mut self) -> &mut SceneTree {
        &mut self.scene
    }

    pub fn scheduler(&self) -> &Scheduler<SceneTree> {
        &self.scheduler
    }

    pub fn renderer_mut(&mut self) -> &mut ListRenderer {
        &mut self.renderer
    }

    pub fn spawn<C>(&mut self, coroutine: C) -> Result<CoroutineId, RuntimeError>
    where
        C: Coroutine<SceneTree> + 'static,
    {
        Ok(self.scheduler.spawn(coroutine)?)
    }

    pub fn spawn_with_stop<C>(
        &mut self,
        coroutine: C,
        token: StopToken,
    ) -> Result<CoroutineId, RuntimeError>
    where
        C: Coroutine<SceneTree> + 'static,
    {
        Ok(self.scheduler.spawn_with_stop(coroutine, token)?)
    }

    pub fn drain_exits(&mut self) -> Vec<CoroutineExit> {
        self.scheduler.drain_exits()
    }

    /// Render output of the most recent frame.
    pub fn last_frame(&self) -> &RenderList {
        &self.last_frame
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame: update step (coroutines), then render step.
    pub fn tick(&mut self) -> Result<FrameReport, RuntimeError> {
        let _span = tracing::info_span!("frame", frame = self.frame).entered();
        let start = Instant::now();

        let tick = self.scheduler.tick(&mut self.scene);
        self.last_frame = self.renderer.render(&self.scene)?;

        let elapsed = start.elapsed();
        self.timer.record(elapsed);
        let report = FrameReport {
            frame: self.frame,
            tick,
            draws: self.last_frame.len(),
            elapsed,
        };
        self.frame += 1;
        Ok(report)
    }

    /// Tick until `max_frames` is reached or no coroutine is left, pacing to
    /// `target_fps`. Returns the number of frames run.
    pub fn run_headless(&mut self) -> Result<u64, RuntimeError> {
        let interval = self.config.frame_interval();
        let mut ran = 0u64;
        tracing::info!(
            fps = self.config.target_fps,
            max_frames = ?self.config.max_frames,
            "headless loop starting"
        );

        loop {
            if self.config.max_frames.is_some_and(|max| ran >= max) {
                break;
            }
            let report = self.tick()?;
            ran += 1;
            if self.scheduler.is_idle() {
                break;
            }
            if let Some(rest) = interval.checked_sub(report.elapsed) {
                std::thread::sleep(rest);
            }
        }

        tracing::info!(
            frames = ran,
            avg = ?self.timer.average(),
            max = ?self.timer.max(),
            "headless loop finished"
        );
        Ok(ran)
    }
}
