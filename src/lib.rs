//! AgentCanvas: a layered raster canvas driven by structured drawing
//! commands.
//!
//! | module       | role                                                   |
//! |--------------|--------------------------------------------------------|
//! | `canvas`     | chunked pixel surfaces, layers, compositing            |
//! | `ops`        | rasterisation of shapes and the bucket fill            |
//! | `components` | palette and brush, layer stack, action log             |
//! | `engine`     | the drawing engine: validation, history, replay        |
//! | `actions`    | JSON command records, permission gate, dispatch        |
//! | `config`     | `config.json` settings and permissions                 |
//! | `io`         | image export                                           |
//! | `cli`        | headless script runner                                 |
//! | `logger`     | session log                                            |

pub mod actions;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;

pub use actions::{Command, Outcome, dispatch, dispatch_json};
pub use canvas::Point;
pub use config::Config;
pub use engine::{CanvasEngine, EngineSettings};
pub use error::CanvasError;
pub use io::SaveFormat;
