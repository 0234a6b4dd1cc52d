//! Rectangle annotation editor engine.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! editing side of an image annotation tool: the annotation store, camera
//! state for pan/zoom, the click-to-select protocol, move/resize/rotate
//! gestures, and rendering the image with its labeled rectangles. The host
//! JavaScript layer wires DOM events to the engine and reacts to the
//! resulting [`engine::Action`]s. Export goes through the `voc` crate.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Annotation store: rectangles and the attribute vocabulary |
//! | [`selection`] | Click-to-select protocol |
//! | [`image`] | Background image slot and its load lifecycle |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`geometry`] | Rotated-box math and the resize floor |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against rectangles and handles |
//! | [`render`] | Scene rendering |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod image;
pub mod input;
pub mod render;
pub mod selection;
