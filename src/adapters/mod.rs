// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod console;
pub mod http;
pub mod probe;

pub use console::ConsolePrompt;
pub use http::HttpSession;
pub use probe::FfprobeProbe;
