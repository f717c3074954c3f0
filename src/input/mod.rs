//! Keyboard input: collaborator traits and the X11 implementation

pub mod backend;
pub mod x11_backend;

pub use x11_backend::X11Session;
