//! Headless server bootstrap and event loop
//!
//! Owns the Wayland display, the listening socket and the calloop loop that
//! drives them. The shell's deferred reconciliation runs as a calloop idle,
//! after every request and engine event queued in the same iteration.

use anyhow::{Context, Result};
use calloop::generic::Generic;
use calloop::{EventLoop, Interest, LoopSignal, Mode, PostAction};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wayland_server::backend::{ClientData, ClientId, DisconnectReason, GlobalId};
use wayland_server::protocol::{wl_compositor, wl_shm};
use wayland_server::{Display, DisplayHandle, ListeningSocket};

use crate::config::HeadlessConfig;
use crate::debug::DebugTracker;
use crate::engine::HeadlessCompositor;
use crate::input::InputRouter;
use crate::protocol::tizen::tizen_policy;
use crate::protocol::xdg_v6::zxdg_shell_v6;
use crate::shell::{LoopIdle, Shell};

const WL_COMPOSITOR_VERSION: u32 = 4;
const WL_SHM_VERSION: u32 = 1;

/// Everything request handlers can reach.
pub struct ServerState {
    pub display_handle: DisplayHandle,
    pub engine: HeadlessCompositor,
    pub shell: Shell,
    pub input: Rc<RefCell<InputRouter>>,
    pub debug: Rc<RefCell<DebugTracker>>,
    started: Instant,
    serial: u32,
}

impl ServerState {
    /// Feed queued engine events to the shell.
    pub fn dispatch_engine_events(&mut self) {
        self.shell.dispatch_engine_events(&mut self.engine);
    }

    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    /// Milliseconds since startup, for frame callbacks.
    pub fn elapsed_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    fn run_reconciliation(&mut self) {
        self.shell.reconcile(&mut self.engine);
        self.dispatch_engine_events();
    }
}

#[derive(Debug, Default)]
struct ClientState;

impl ClientData for ClientState {
    fn initialized(&self, client_id: ClientId) {
        debug!("Client {:?} connected", client_id);
    }

    fn disconnected(&self, client_id: ClientId, reason: DisconnectReason) {
        debug!("Client {:?} disconnected: {:?}", client_id, reason);
    }
}

pub struct HeadlessServer {
    event_loop: EventLoop<'static, ServerState>,
    state: ServerState,
    globals: Vec<GlobalId>,
    socket_path: PathBuf,
}

impl HeadlessServer {
    pub fn new(config: &HeadlessConfig) -> Result<Self> {
        info!("🚀 Creating headless server...");

        let event_loop: EventLoop<'static, ServerState> =
            EventLoop::try_new().context("Failed to create event loop")?;
        let display = Display::<ServerState>::new().context("Failed to create Wayland display")?;
        let display_handle = display.handle();

        let mut engine = HeadlessCompositor::new();
        for output in &config.outputs {
            engine.add_output(output.to_info());
        }

        let input = Rc::new(RefCell::new(InputRouter::new(&config.seat)));
        let debug = Rc::new(RefCell::new(DebugTracker::new()));
        let mut shell = Shell::new(Box::new(LoopIdle::new(
            event_loop.handle(),
            ServerState::run_reconciliation,
        )));
        shell.add_observer(Box::new(input.clone()));
        shell.add_observer(Box::new(debug.clone()));

        let globals = vec![
            display_handle.create_global::<ServerState, wl_compositor::WlCompositor, _>(
                WL_COMPOSITOR_VERSION,
                (),
            ),
            display_handle.create_global::<ServerState, wl_shm::WlShm, _>(WL_SHM_VERSION, ()),
            display_handle.create_global::<ServerState, zxdg_shell_v6::ZxdgShellV6, _>(
                config.shell.xdg_shell_version,
                (),
            ),
            display_handle.create_global::<ServerState, tizen_policy::TizenPolicy, _>(
                config.shell.policy_version,
                (),
            ),
        ];

        let socket_path = config.general.runtime_dir.join(&config.general.socket_name);
        let listening = ListeningSocket::bind_absolute(socket_path.clone())
            .with_context(|| format!("Failed to bind Wayland socket {}", socket_path.display()))?;
        info!("✅ Wayland socket created: {}", socket_path.display());

        let handle = event_loop.handle();
        handle
            .insert_source(
                Generic::new(listening, Interest::READ, Mode::Level),
                |_, socket, state| {
                    while let Some(stream) = socket.accept()? {
                        if let Err(err) = state
                            .display_handle
                            .insert_client(stream, Arc::new(ClientState))
                        {
                            warn!("Failed to insert client: {}", err);
                        }
                    }
                    Ok(PostAction::Continue)
                },
            )
            .map_err(|err| anyhow::anyhow!("Failed to register listening socket: {}", err.error))?;

        handle
            .insert_source(
                Generic::new(display, Interest::READ, Mode::Level),
                |_, display, state| {
                    // Safety: the display is never dropped while its source is registered
                    unsafe {
                        display.get_mut().dispatch_clients(state)?;
                    }
                    Ok(PostAction::Continue)
                },
            )
            .map_err(|err| anyhow::anyhow!("Failed to register display source: {}", err.error))?;

        let state = ServerState {
            display_handle,
            engine,
            shell,
            input,
            debug,
            started: Instant::now(),
            serial: 0,
        };

        Ok(Self {
            event_loop,
            state,
            globals,
            socket_path,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ServerState {
        &mut self.state
    }

    pub fn loop_signal(&self) -> LoopSignal {
        self.event_loop.get_signal()
    }

    /// Run one loop iteration, then flush clients.
    pub fn dispatch(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.event_loop
            .dispatch(timeout, &mut self.state)
            .context("Event loop dispatch failed")?;
        if let Err(err) = self.state.display_handle.flush_clients() {
            warn!("Failed to flush clients: {}", err);
        }
        Ok(())
    }

    /// Run until Ctrl-C, then tear down.
    pub fn run(mut self) -> Result<()> {
        let signal = self.loop_signal();
        ctrlc::set_handler(move || {
            signal.stop();
            signal.wakeup();
        })
        .context("Failed to install Ctrl-C handler")?;

        info!("🎬 Headless server running on {}", self.socket_path.display());
        self.event_loop
            .run(None, &mut self.state, |state| {
                if let Err(err) = state.display_handle.flush_clients() {
                    warn!("Failed to flush clients: {}", err);
                }
            })
            .context("Event loop failed")?;

        self.shutdown();
        Ok(())
    }

    /// Tear down in dependency order: shell, input, engine.
    pub fn shutdown(&mut self) {
        info!("🛑 Shutting down headless server");

        self.state.shell.shutdown();
        for global in self.globals.drain(..) {
            self.state
                .display_handle
                .remove_global::<ServerState>(global);
        }

        self.state.input.borrow_mut().shutdown();

        debug!(
            "Engine released with {} surfaces, {} views",
            self.state.engine.surface_count(),
            self.state.engine.view_count()
        );
    }
}
