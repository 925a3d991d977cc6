//! Generated server bindings for the tizen window policy protocol.

#![allow(non_upper_case_globals, non_camel_case_types, unused_imports, clippy::all)]

use wayland_server;
use wayland_server::protocol::*;

pub mod __interfaces {
    use wayland_server::protocol::__interfaces::*;
    wayland_scanner::generate_interfaces!("protocols/tizen-extension.xml");
}
use self::__interfaces::*;

wayland_scanner::generate_server_code!("protocols/tizen-extension.xml");
