//! Core compositor objects backed by the headless engine
//!
//! Buffers are tracked as objects only. Pixel data is never mapped; a
//! committed buffer is released straight away.

use log::{debug, trace};
use std::sync::Mutex;
use wayland_server::protocol::{
    wl_buffer, wl_callback, wl_compositor, wl_region, wl_shm, wl_shm_pool, wl_surface,
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::engine::SurfaceId;
use crate::server::ServerState;

/// User data of every `wl_surface`.
#[derive(Debug)]
pub struct SurfaceData {
    pub id: SurfaceId,
    pending: Mutex<PendingState>,
}

#[derive(Debug, Default)]
struct PendingState {
    buffer: Option<wl_buffer::WlBuffer>,
    frame_callbacks: Vec<wl_callback::WlCallback>,
}

impl SurfaceData {
    fn new(id: SurfaceId) -> Self {
        Self {
            id,
            pending: Mutex::new(PendingState::default()),
        }
    }
}

impl GlobalDispatch<wl_compositor::WlCompositor, ()> for ServerState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_compositor::WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for ServerState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_compositor::WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                let surface = state.engine.create_surface();
                data_init.init(id, SurfaceData::new(surface));
                state.dispatch_engine_events();
                debug!("🪟 Created {}", surface);
            }
            wl_compositor::Request::CreateRegion { id } => {
                data_init.init(id, ());
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_surface::WlSurface, SurfaceData> for ServerState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_surface::WlSurface,
        request: wl_surface::Request,
        data: &SurfaceData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_surface::Request::Attach { buffer, .. } => {
                state.engine.attach_buffer(data.id, buffer.is_some());
                if let Ok(mut pending) = data.pending.lock() {
                    pending.buffer = buffer;
                }
            }
            wl_surface::Request::Frame { callback } => {
                let callback = data_init.init(callback, ());
                if let Ok(mut pending) = data.pending.lock() {
                    pending.frame_callbacks.push(callback);
                }
            }
            wl_surface::Request::Commit => {
                state.engine.commit_surface(data.id);
                state.dispatch_engine_events();

                // Nothing is drawn, so buffers and frame callbacks complete
                // on commit.
                if let Ok(mut pending) = data.pending.lock() {
                    if let Some(buffer) = pending.buffer.take() {
                        buffer.release();
                    }
                    let time = state.elapsed_ms();
                    for callback in pending.frame_callbacks.drain(..) {
                        callback.done(time);
                    }
                }
                trace!("Commit on {}", data.id);
            }
            // Damage, regions, transform and scale have no effect headless
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &wl_surface::WlSurface,
        data: &SurfaceData,
    ) {
        state.engine.destroy_surface(data.id);
        state.dispatch_engine_events();
        debug!("Destroyed {}", data.id);
    }
}

impl Dispatch<wl_region::WlRegion, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_region::WlRegion,
        _request: wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_callback::WlCallback,
        _request: wl_callback::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl GlobalDispatch<wl_shm::WlShm, ()> for ServerState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_shm::WlShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        shm.format(wl_shm::Format::Argb8888);
        shm.format(wl_shm::Format::Xrgb8888);
    }
}

impl Dispatch<wl_shm::WlShm, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &wl_shm::WlShm,
        request: wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm::Request::CreatePool { id, size, .. } = request {
            // The fd is dropped here; pool memory is never mapped
            trace!("SHM pool of {} bytes on {}", size, resource.id());
            data_init.init(id, ());
        }
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_shm_pool::WlShmPool,
        request: wl_shm_pool::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm_pool::Request::CreateBuffer { id, .. } = request {
            data_init.init(id, ());
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_buffer::WlBuffer,
        _request: wl_buffer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
