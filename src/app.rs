use crate::assets;
use crate::config::{self, Config, WINDOW_TITLE};
use crate::core::events::{Lifetime, ListenerId, ScreenEvents};
use crate::core::file_drop::{FileDropDispatcher, ReplayFileReader};
use crate::core::scheduler::{UiQueue, UiTask, ui_channel};
use crate::core::stable::{self, StableStorage};
use crate::core::track::WorkingSession;
use crate::gameplay::beatmaps::BeatmapManager;
use crate::gameplay::replay::Score;
use crate::screens::{replay, Screen, ScreenAction, ScreenChange, ScreenStack};
use crate::ui::actors::{self, Actor};
use crate::ui::components::version_overlay::{VersionOverlay, Visibility};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use log::{debug, error, info, trace, warn};
use std::{
    cell::RefCell,
    error::Error,
    path::PathBuf,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

const INTRO_DURATION: f32 = 2.0;
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

pub struct RunOptions {
    pub config_path: PathBuf,
    pub windowed: bool,
    pub files: Vec<PathBuf>,
}

pub struct App {
    window: Option<Arc<Window>>,
    config: Config,
    stable: Option<StableStorage>,
    session: WorkingSession,
    screens: ScreenStack,
    screen_events: ScreenEvents,
    overlay_listener: Option<ListenerId>,
    version_overlay: Rc<RefCell<VersionOverlay>>,
    replay_state: Option<replay::State>,
    dispatcher: FileDropDispatcher,
    ui_queue: UiQueue,
    pending_files: Vec<PathBuf>,
    cursor: [f32; 2],
    window_size: [f32; 2],
    intro_elapsed: f32,
    last_frame_time: Instant,
    frame: Vec<Actor>,
}

impl App {
    fn new(config: Config, stable: Option<StableStorage>, pending_files: Vec<PathBuf>) -> Self {
        let (scheduler, ui_queue) = ui_channel();
        let dispatcher = FileDropDispatcher::new(
            Arc::new(BeatmapManager::new(config.library_path.clone())),
            Arc::new(ReplayFileReader),
            scheduler,
        );

        let version_overlay = Rc::new(RefCell::new(VersionOverlay::new(
            WINDOW_TITLE,
            env!("CARGO_PKG_VERSION"),
        )));
        let mut screen_events = ScreenEvents::new();
        let overlay = Rc::clone(&version_overlay);
        let overlay_listener = screen_events.subscribe(Lifetime::Persistent, move |change| {
            if change.screen == Screen::Intro && !change.has_child {
                overlay.borrow_mut().set_state(Visibility::Visible);
            }
        });
        screen_events.subscribe(Lifetime::Once, |change| {
            debug!("First screen: {:?}", change.screen);
        });

        let window_size = [config.display_width as f32, config.display_height as f32];
        Self {
            window: None,
            config,
            stable,
            session: WorkingSession::new(),
            screens: ScreenStack::new(Screen::Intro),
            screen_events,
            overlay_listener: Some(overlay_listener),
            version_overlay,
            replay_state: None,
            dispatcher,
            ui_queue,
            pending_files,
            cursor: [0.0, 0.0],
            window_size,
            intro_elapsed: 0.0,
            last_frame_time: Instant::now(),
            frame: Vec::new(),
        }
    }

    fn emit_screen_change(&mut self, change: ScreenChange) {
        info!(
            "Screen changed to {:?} (has child: {}, depth: {}).",
            change.screen,
            change.has_child,
            self.screens.depth()
        );
        self.screen_events.emit(&change);
    }

    fn push_screen(&mut self, screen: Screen) {
        let change = self.screens.push(screen);
        self.emit_screen_change(change);
    }

    fn exit_screen(&mut self) {
        if self.screens.current() == Screen::ReplayPlayer {
            self.replay_state = None;
            self.session.unbind();
        }
        if let Some(change) = self.screens.exit() {
            self.emit_screen_change(change);
        }
    }

    fn load_score(&mut self, score: Score) {
        if self.screens.current() == Screen::ReplayPlayer {
            self.exit_screen();
        }
        self.replay_state = Some(replay::init(score, &self.session, self.config.graph_columns));
        self.push_screen(Screen::ReplayPlayer);
    }

    fn drain_ui_tasks(&mut self) {
        let tasks: Vec<UiTask> = self.ui_queue.drain().collect();
        for task in tasks {
            match task {
                UiTask::LoadScore(score) => self.load_score(score),
            }
        }
    }

    fn handle_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::Back => self.exit_screen(),
            ScreenAction::None => {}
        }
    }

    fn update(&mut self, delta_time: f32) {
        self.drain_ui_tasks();

        if self.screens.current() == Screen::Intro && !self.screens.has_child(Screen::Intro) {
            self.intro_elapsed += delta_time;
            if self.intro_elapsed >= INTRO_DURATION {
                self.version_overlay.borrow_mut().set_state(Visibility::Hidden);
                self.push_screen(Screen::MainMenu);
            }
        }

        if let Some(state) = &mut self.replay_state {
            replay::update(state);
        }
        self.version_overlay.borrow_mut().update(delta_time);
    }

    fn build_frame(&mut self) {
        let [w, h] = self.window_size;
        let mut frame = match (self.screens.current(), &self.replay_state) {
            (Screen::ReplayPlayer, Some(state)) => replay::get_actors(state, w, h),
            _ => Vec::new(),
        };
        frame.extend(self.version_overlay.borrow().build(w, h));
        actors::sort_for_draw(&mut frame);
        self.frame = frame;
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let mut window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_resizable(true)
            .with_window_icon(assets::window_icon());

        if self.config.windowed {
            window_attributes = window_attributes
                .with_inner_size(PhysicalSize::new(self.config.display_width, self.config.display_height));
        } else {
            let monitor = event_loop.primary_monitor();
            if monitor.is_none() {
                warn!("No primary monitor reported; using BORDERLESS fullscreen.");
            }
            window_attributes = window_attributes.with_fullscreen(Some(winit::window::Fullscreen::Borderless(monitor)));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        if self.config.hide_cursor {
            window.set_cursor_visible(false);
        }
        let sz = window.inner_size();
        self.window_size = [sz.width as f32, sz.height as f32];
        self.window = Some(window);

        match &self.stable {
            Some(storage) => info!(
                "osu!stable install at '{}', songs in '{}'.",
                storage.base_path().display(),
                storage.songs_path().display()
            ),
            None => debug!("Running without an osu!stable install."),
        }

        let library = BeatmapManager::new(self.config.library_path.clone());
        info!("Beatmap library '{}' holds {} archives.", library.library_path().display(), library.archives().len());

        let change = self.screens.change();
        self.emit_screen_change(change);

        let pending = std::mem::take(&mut self.pending_files);
        self.dispatcher.on_files_dropped(&pending);

        self.last_frame_time = Instant::now();
        info!("Starting event loop...");
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref().cloned() else { return; };
        if window_id != window.id() { return; }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.window_size = [new_size.width as f32, new_size.height as f32];
                }
            }
            WindowEvent::DroppedFile(path) => {
                let kind = self.dispatcher.on_file_dropped(&path);
                debug!("Dropped '{}' ({:?}).", path.display(), kind);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [position.x as f32, position.y as f32];
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                let [x, y] = self.cursor;
                let [w, h] = self.window_size;
                if let Some(state) = &mut self.replay_state {
                    if replay::handle_pointer_press(state, x, y, w, h) {
                        debug!("Seek from pointer at x={:.0}.", x);
                    }
                }
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state != ElementState::Pressed { return; }
                match self.screens.current() {
                    Screen::ReplayPlayer => {
                        let action = match &mut self.replay_state {
                            Some(state) => replay::handle_key_press(state, &key_event),
                            None => ScreenAction::Back,
                        };
                        self.handle_action(action);
                    }
                    Screen::MainMenu | Screen::Intro => {
                        if let PhysicalKey::Code(KeyCode::Escape) = key_event.physical_key {
                            info!("Exit requested from {:?}.", self.screens.current());
                            event_loop.exit();
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_time = now.duration_since(self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;

                self.update(delta_time);
                self.build_frame();
                trace!("Frame built with {} actors.", self.frame.len());
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::wait_duration(FRAME_INTERVAL));
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(id) = self.overlay_listener.take() {
            self.screen_events.unsubscribe(id);
        }
        if !self.screen_events.is_empty() {
            debug!("Screen listeners still registered at exit.");
        }
        self.replay_state = None;
        self.session.unbind();
    }
}

pub fn run(options: RunOptions) -> Result<(), Box<dyn Error>> {
    config::load(&options.config_path);
    if options.windowed {
        config::update(|c| c.windowed = true);
    }
    let config = config::get();
    let stable = stable::storage_for_stable_install();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, stable, options.files);
    event_loop.run_app(&mut app)?;
    Ok(())
}
