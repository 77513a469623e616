// Adapters layer: concrete implementations of the domain ports (terminal host, HTTP, ComfyUI).

pub mod comfyui;
pub mod console;
pub mod document;
pub mod http;
